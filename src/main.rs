use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use charity_invites::{config::Config, cors, routes, service::log::{init_logger, LoggerMiddleware}, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    init_logger();

    let config = Config::from_env().map_err(|e| {
        error!("configuration error: {e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let state = AppState::from_config(&config).await.map_err(|e| {
        error!("startup failed: {e}");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let store = state.store.clone();

    info!("listening on {}:{}", config.host, config.port);
    let origins = config.allowed_origins.clone();
    HttpServer::new(move || {
        let tokens = state.tokens.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors(&origins))
            .wrap(LoggerMiddleware)
            .configure(|cfg| routes(cfg, tokens))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    info!("server stopped, releasing storage");
    store.close().await;
    Ok(())
}
