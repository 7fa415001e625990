//! Service entry-point: loads settings, connects to MongoDB and serves the
//! student records API with its OpenAPI docs.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{AppSettings, ServerConfig, create_server, drain};
use student_records::domain::StudentService;
use student_records::inbound::http::health::HealthState;
use student_records::inbound::http::state::HttpState;
use student_records::outbound::persistence::{MongoStudentRepository, StoreClient};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| io::Error::other(format!("failed to load configuration: {err}")))?;
    let bind_addr = settings.bind_addr()?;
    let allowed_origins = settings.allowed_origins()?;

    let store = StoreClient::connect(&settings.store_config())
        .await
        .map_err(io::Error::other)?;
    let repository = MongoStudentRepository::new(&store);
    repository.ensure_indexes().await.map_err(io::Error::other)?;

    let service = Arc::new(StudentService::new(Arc::new(repository)));
    let http_state = HttpState::new(service.clone(), service);
    let config = ServerConfig::new(bind_addr, http_state)
        .with_allowed_origins(allowed_origins)
        .with_requests_per_minute(settings.requests_per_minute());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let handle = server.handle();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        drain(&health_state, handle).await;
    });
    info!(%bind_addr, "student records service listening");
    server.await?;

    store.shutdown().await;
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
