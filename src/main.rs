use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use todoforge::auth::{PasswordHasher, TokenSigner};
use todoforge::config::Config;
use todoforge::routes;
use todoforge::state::AppState;
use todoforge::store::{postgres, PgStore};

fn io_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// Any origin with credentials in development; only the configured origins in production.
fn cors(is_production: bool, allowed_origins: &[String]) -> Cors {
    if !is_production {
        return Cors::permissive();
    }
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(io_error)?;

    let pool = postgres::connect(&config.database).await.map_err(io_error)?;
    postgres::migrate(&pool).await.map_err(io_error)?;
    log::info!("database ready");

    let hasher = PasswordHasher::new(config.auth.bcrypt_cost).map_err(io_error)?;
    let tokens = TokenSigner::new(
        config.auth.algorithm,
        config.auth.secret.as_bytes(),
        config.auth.token_ttl,
    )
    .map_err(io_error)?;
    let state = web::Data::new(AppState::new(
        Arc::new(PgStore::new(pool.clone())),
        tokens,
        hasher,
    ));

    let is_production = config.is_production();
    let allowed_origins = config.cors_allowed_origins.clone();

    log::info!("starting todoforge ({}) at {}", config.app_env, config.server_url());
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(cors(is_production, &allowed_origins))
            .wrap(Logger::default())
            .configure(move |cfg| routes::config(cfg, state))
    })
    .client_request_timeout(config.request_timeout)
    .shutdown_timeout(config.shutdown_timeout)
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    pool.close().await;
    log::info!("server stopped");
    Ok(())
}
