//! HTTP server wiring.
//!
//! This module owns the actix-web application: shared state, CORS,
//! request logging, and route registration.

pub mod routes;

use crate::config::Config;
use crate::slither::{RunnerConfig, SlitherRunner};
use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// State shared by all request handlers.
///
/// Everything here is immutable configuration or a concurrency primitive;
/// per-request state (workspaces, analyzer children) never lands in it.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Arc<Config>,
    /// Analyzer subprocess driver.
    pub runner: Arc<SlitherRunner>,
    /// Admission limit for concurrent analyzer subprocesses.
    pub scan_permits: Arc<Semaphore>,
}

impl AppState {
    /// Build the shared state from loaded configuration.
    pub fn new(config: Config) -> Self {
        let runner = SlitherRunner::new(RunnerConfig::from(&config.analyzer));
        let scan_permits = Arc::new(Semaphore::new(config.analyzer.max_concurrent_scans));

        Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
            scan_permits,
        }
    }
}

/// Run the HTTP server until it is shut down.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let cors_origin = config.server.cors_origin.clone();

    if cors_origin.is_none() || cors_origin.as_deref() == Some("*") {
        warn!("CORS: allowing any origin (dev mode). Set [server].cors_origin for production.");
    } else {
        info!("CORS: restricted to {}", cors_origin.as_deref().unwrap_or("*"));
    }

    info!(
        "Analyzer: {} ({} concurrent scans max)",
        config.analyzer.binary, config.analyzer.max_concurrent_scans
    );
    info!("Binding to {}:{}", host, port);

    let state = AppState::new(config);

    HttpServer::new(move || {
        let cors = match cors_origin.as_deref() {
            Some(origin) if origin != "*" => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
            _ => Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
        };

        // Malformed JSON bodies get the same error shape as every other
        // validation failure.
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            let body = serde_json::json!({
                "success": false,
                "error": err.to_string(),
                "error_kind": "validation_error",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });
            actix_web::error::InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(body),
            )
            .into()
        });

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config)
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .route("/", web::get().to(routes::health))
            .route("/debug", web::post().to(routes::debug_echo))
            .route("/analyze", web::post().to(routes::analyze_contract))
            .route(
                "/analyze/repository",
                web::post().to(routes::analyze_repository),
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
