use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use std::io;
use std::sync::Arc;
use supabase_client::SupabaseClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wall_service::db::SupabaseBackend;
use wall_service::services::PostService;
use wall_service::{handlers, AppState, Config};

struct HealthState {
    client: SupabaseClient,
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.client.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "wall-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("Supabase REST check failed: {}", e),
            "service": "wall-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Wall Service
///
/// Serves the wall page, the posts JSON API and a server-sent event stream
/// of new posts. Rows, media and change events live in a hosted Supabase
/// project configured through `SUPABASE_URL` / `SUPABASE_ANON_KEY`.
///
/// # Routes
///
/// - `/` - wall page; `/posts` and `/posts/{id}/delete` accept its forms
/// - `/api/v1/posts` - list, create, delete posts
/// - `/api/v1/posts/stream` - live `post` events
/// - `/api/v1/profile` - profile sidebar data
/// - `/api/v1/health`, `/api/v1/health/live`, `/metrics`
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Support container healthchecks via CLI subcommand
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" || cmd == "healthcheck-http" {
                let port = std::env::var("WALL_SERVICE_PORT").unwrap_or_else(|_| "8080".to_string());
                let url = format!("http://127.0.0.1:{}/api/v1/health", port);
                match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    if let Err(err) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("ERROR: failed to install rustls crypto provider: {:?}", err);
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "failed to install rustls crypto provider",
        ));
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting wall-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let supabase = match SupabaseClient::new(config.supabase.clone()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Supabase client initialization failed: {}", e);
            eprintln!("ERROR: Failed to initialize Supabase client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = supabase.health_check().await {
        tracing::warn!("Supabase REST endpoint not reachable yet: {}", e);
    }

    let backend = Arc::new(SupabaseBackend::new(supabase.clone(), config.media.clone()));
    let repo = Arc::new(PostService::new(backend));
    let app_state = web::Data::new(AppState::new(repo));
    let health_state = web::Data::new(HealthState { client: supabase });

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(
        bucket = %config.media.bucket,
        "Starting HTTP server at {}",
        http_bind_address
    );

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(wall_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .configure(handlers::configure)
    })
    .bind(&http_bind_address)?
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            return match result {
                Ok(result) => result,
                Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            };
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    server_handle.stop(true).await;
    match server_task.await {
        Ok(result) => result,
        Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
    }
}
