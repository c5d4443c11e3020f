use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::server::registry::CountEngines;
use crate::server::session::ws_game;
use crate::server::state::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/healthz").route(web::get().to(healthz)))
        .service(web::resource("/ws/game").to(ws_game));
}

async fn healthz(state: web::Data<AppState>) -> impl Responder {
    let active_games = state.registry.send(CountEngines).await.unwrap_or(0);
    let store_ok = state.store.ping().await.is_ok();
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "active_games": active_games,
        "store_connected": store_ok,
        "sessions": state.players.count(),
    }))
}
