mod cleanup;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{
    HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use refuge_api::AppStateInner;
use refuge_api::storage::Storage;
use refuge_db::Database;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "refuge_server=debug,refuge_api=debug,refuge_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("REFUGE_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: REFUGE_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let host = std::env::var("REFUGE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("REFUGE_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("REFUGE_DB_PATH")
        .unwrap_or_else(|_| "refuge.db".into())
        .into();
    let upload_dir: PathBuf = std::env::var("REFUGE_UPLOAD_DIR")
        .unwrap_or_else(|_| "./uploads".into())
        .into();
    let extended_fields: bool = std::env::var("REFUGE_EXTENDED_FIELDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(true);

    // Init database and upload storage
    let db = Database::open(&db_path)?;
    let storage = Storage::new(upload_dir).await?;

    let state = Arc::new(AppStateInner {
        db,
        storage,
        jwt_secret,
        extended_fields,
    });

    // Background cleanup task (runs every hour)
    tokio::spawn(cleanup::run_cleanup_loop(state.clone(), 3600));

    // CORS — explicit origin list when configured, permissive otherwise
    let cors = match std::env::var("REFUGE_ALLOWED_ORIGINS") {
        Ok(origins) if !origins.trim().is_empty() => {
            let list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(list))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_credentials(true)
        }
        _ => CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(false),
    };

    let app = refuge_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Refuge server listening on {}", addr);
    if extended_fields {
        info!("Extended intake fields: required");
    } else {
        info!("Extended intake fields: optional");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
