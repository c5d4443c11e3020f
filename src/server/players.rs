//! Player session registry: the boundary to the external identity
//! component. That component issues ids and bearer tokens, registers them
//! here, and the transport resolves tokens against this registry before any
//! engine event is emitted.

use std::collections::HashMap;
use std::sync::RwLock;

/// An authenticated player identity, as issued externally.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub id: String,
    pub token: String,
    pub nickname: String,
}

/// In-memory token and id lookup, safe for concurrent use.
#[derive(Default)]
pub struct PlayerRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    by_token: HashMap<String, PlayerSession>,
    by_id: HashMap<String, PlayerSession>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        PlayerRegistry::default()
    }

    pub fn register(&self, session: PlayerSession) {
        let mut inner = self.inner.write().expect("player registry poisoned");
        inner.by_token.insert(session.token.clone(), session.clone());
        inner.by_id.insert(session.id.clone(), session);
    }

    /// Resolves a bearer token to a session.
    pub fn authenticate(&self, token: &str) -> Option<PlayerSession> {
        self.inner.read().expect("player registry poisoned").by_token.get(token).cloned()
    }

    pub fn get_by_id(&self, player_id: &str) -> Option<PlayerSession> {
        self.inner.read().expect("player registry poisoned").by_id.get(player_id).cloned()
    }

    pub fn remove(&self, token: &str) {
        let mut inner = self.inner.write().expect("player registry poisoned");
        if let Some(session) = inner.by_token.remove(token) {
            inner.by_id.remove(&session.id);
        }
    }

    pub fn count(&self) -> usize {
        self.inner.read().expect("player registry poisoned").by_token.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, token: &str) -> PlayerSession {
        PlayerSession { id: id.into(), token: token.into(), nickname: format!("nick_{id}") }
    }

    #[test]
    fn register_and_authenticate() {
        let registry = PlayerRegistry::new();
        registry.register(session("p1", "tok-1"));

        let found = registry.authenticate("tok-1").unwrap();
        assert_eq!(found.id, "p1");
        assert_eq!(found.nickname, "nick_p1");
        assert!(registry.authenticate("bogus").is_none());
        assert_eq!(registry.count(), 1);

        registry.remove("tok-1");
        assert!(registry.authenticate("tok-1").is_none());
        assert!(registry.get_by_id("p1").is_none());
    }

    #[test]
    fn reregistering_replaces_the_session() {
        let registry = PlayerRegistry::new();
        registry.register(session("p1", "tok-1"));
        registry.register(session("p1", "tok-2"));

        assert_eq!(registry.get_by_id("p1").unwrap().token, "tok-2");
        assert_eq!(registry.authenticate("tok-2").unwrap().id, "p1");
    }

    #[test]
    fn lookup_by_id() {
        let registry = PlayerRegistry::new();
        registry.register(session("p2", "tok-9"));
        assert_eq!(registry.get_by_id("p2").unwrap().token, "tok-9");
        assert!(registry.get_by_id("p1").is_none());
    }
}
