use std::sync::Arc;
use std::time::Instant;

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::{error, info, warn};

use ironhex::config::{Balance, ServerConfig};
use ironhex::server::players::PlayerRegistry;
use ironhex::server::registry::{drain_all, restore_active_games, EngineRegistry};
use ironhex::server::router;
use ironhex::server::state::AppState;
use ironhex::store::Store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Arc::new(ServerConfig::from_env());

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.clone()),
    )
    .init();

    info!(
        "[Main] starting server port={} balance_file={} redis_url={}",
        config.port, config.balance_file, config.redis_url
    );

    let balance = match Balance::load(&config.balance_file) {
        Ok(balance) => Arc::new(balance),
        Err(e) => {
            error!("[Main] {e}");
            std::process::exit(1);
        }
    };
    info!("[Main] balance catalog loaded file={}", config.balance_file);

    let store = match Store::connect(&config.redis_url).await {
        Ok(store) => store,
        Err(e) => {
            warn!("[Main] {e}; running with in-memory snapshots only");
            Store::memory()
        }
    };

    let players = Arc::new(PlayerRegistry::new());
    let registry = EngineRegistry::new().start();

    let restored = restore_active_games(&registry, &store, &balance, config.reconnect_window).await;
    if restored > 0 {
        info!("[Main] resumed {restored} games; both players have reconnect windows running");
    }

    let state = web::Data::new(AppState {
        registry: registry.clone(),
        players,
        store: store.clone(),
        balance,
        config: config.clone(),
        started_at: Instant::now(),
    });

    let cors_origins = config.cors_origins.join(",");
    let port = config.port;

    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", cors_origins.clone()))
                    .add(("Access-Control-Allow-Headers", "*")),
            )
            .app_data(state.clone())
            .configure(router::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    // SIGINT/SIGTERM stopped the listener; snapshot every game before exit.
    info!("[Main] shutdown signal received, draining engines");
    drain_all(&registry, &store, config.shutdown_drain_timeout).await;
    info!("[Main] server stopped");
    Ok(())
}
