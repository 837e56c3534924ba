use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use eventdesk_api::config::{self, GatewayKind};
use eventdesk_api::gateway::{LocalGateway, SharedGateway, SupabaseGateway};
use eventdesk_api::handlers;
use eventdesk_api::handlers::profile::AvatarDir;
use eventdesk_api::helpers::session_manager::SessionManager;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("eventdesk-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Load config
    let (config, config_path) = config::ApiConfig::load().context("Failed to load config")?;
    tracing::info!("Loaded config from {}", config_path.display());

    // Get server config or use defaults
    let (host, port) = if let Some(server_config) = &config.server {
        (server_config.host.clone(), server_config.port)
    } else {
        ("127.0.0.1".to_string(), 8080)
    };

    // Initialize gateway
    let mut avatar_dir: Option<AvatarDir> = None;
    let gateway: SharedGateway = match config.gateway.kind {
        GatewayKind::Supabase => {
            tracing::info!("Using hosted gateway at {:?}", config.gateway.url);
            Arc::new(SupabaseGateway::new(&config.gateway)?)
        }
        GatewayKind::Local => {
            let local_config = config.local.clone().unwrap_or_default();
            let local = LocalGateway::open(&local_config)?;
            if local_config.seed_demo_user {
                local.seed_demo_user().await?;
            }
            tracing::info!("Using local gateway, avatars in {}", local.avatar_dir().display());
            avatar_dir = Some(AvatarDir(local.avatar_dir().to_path_buf()));
            Arc::new(local)
        }
    };

    let sessions = web::Data::new(SessionManager::new(config.session_ttl()));

    // Spawn periodic session cleanup (every 10 minutes)
    let sessions_for_cleanup = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            let purged = sessions_for_cleanup.purge_expired().await;
            if purged > 0 {
                tracing::info!("Purged {} expired sessions", purged);
            }
        }
    });

    tracing::info!("Server will listen on {}:{}", host, port);

    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if let Some(cors_config) = &config.cors {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        let mut app = App::new()
            .wrap(cors)
            .app_data(web::Data::new(gateway.clone()))
            .app_data(sessions.clone())
            .configure(handlers::configure);

        if let Some(dir) = &avatar_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .route("/avatars/{file}", web::get().to(handlers::profile::serve_avatar));
        }

        app
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    server.await?;
    Ok(())
}
