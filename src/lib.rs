pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod money;
pub mod service;

use std::{sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{http::header, web};
use sqlx::{postgres::Postgres, Pool};

use config::Config;
use db::Store;
use service::{
    auth::{jwt::TokenKeys, AuthMiddleware},
    notify::{LogMailer, Mailer, Notifier, ResendMailer},
    payment::{PaymentGateway, StripeGateway},
};

pub type PGPool = Pool<Postgres>;

/// Everything a request handler may touch. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentGateway>,
    pub notifier: Notifier,
    pub tokens: Arc<TokenKeys>,
    pub currency: String,
    pub payment_timeout: Duration,
}

#[derive(Debug, derive_more::Display)]
pub enum StartupError {
    #[display(fmt = "storage: {}", _0)]
    Storage(db::StoreError),

    #[display(fmt = "http client: {}", _0)]
    HttpClient(reqwest::Error),
}

impl std::error::Error for StartupError {}

impl AppState {
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let store = db::connect(&config.database_url, config.database_max_connections)
            .await
            .map_err(StartupError::Storage)?;
        let payments = StripeGateway::new(&config.stripe_api_base, &config.stripe_secret_key, config.external_timeout)
            .map_err(StartupError::HttpClient)?;
        let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
            Some(key) => Arc::new(
                ResendMailer::new(&config.resend_api_base, key, config.external_timeout)
                    .map_err(StartupError::HttpClient)?,
            ),
            None => {
                log::warn!("RESEND_API_KEY not set, emails will only be logged");
                Arc::new(LogMailer)
            }
        };
        Ok(Self {
            store,
            payments: Arc::new(payments),
            notifier: Notifier::new(mailer, &config.resend_from_email, &config.frontend_url),
            tokens: Arc::new(TokenKeys::new(&config.jwt_secret)),
            currency: config.currency.clone(),
            payment_timeout: config.external_timeout,
        })
    }
}

/// Mounts the whole API under `/api`.
pub fn routes(cfg: &mut web::ServiceConfig, tokens: Arc<TokenKeys>) {
    let auth = AuthMiddleware::new(tokens);
    let (users_auth, invitations_auth, email_auth) = (auth.clone(), auth.clone(), auth);
    cfg.app_data(web::JsonConfig::default().error_handler(errors::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(errors::path_error_handler))
        .service(
            web::scope("/api")
                .service(handlers::health::health)
                .service(
                    web::scope("/users")
                        .configure(handlers::auth::config)
                        .configure(|cfg| handlers::user::config(cfg, users_auth)),
                )
                .service(
                    web::scope("/invitations")
                        .configure(|cfg| handlers::invitation::config(cfg, invitations_auth)),
                )
                .service(web::scope("/donations").configure(handlers::donation::config))
                .service(
                    web::scope("/test")
                        .configure(|cfg| handlers::health::config(cfg, email_auth)),
                ),
        );
}

pub fn cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .max_age(3600)
}
