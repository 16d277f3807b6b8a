use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing::info;

use routewald::handlers::HandlerRegistry;
use routewald::{config, logging, RouteLoader, RouterMiddleware, RouterOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (embedded defaults -> routewald.toml -> env/.env)
    let app_cfg = config::load()?;

    // Logging (stdout + optional daily file rotation); guards must outlive the server
    let _log_guards = logging::init_tracing(&app_cfg.logging)?;

    let registry = HandlerRegistry::with_builtins(&app_cfg);
    info!(?registry, "Handler registry ready");
    let loader = RouteLoader::new(registry);
    let mut router = RouterMiddleware::new(RouterOptions { prefix: app_cfg.router.prefix.clone() });
    let root = &app_cfg.routes.root;
    let count = loader.load_routes(&mut router, root, &app_cfg.routes.load_options()).await?;
    info!(
        files = count,
        routes = router.registrations().len(),
        root = %root.display(),
        "Route files loaded"
    );

    let app = router.routes().layer(TraceLayer::new_for_http());

    let port: u16 = app_cfg.server.port;
    let host: String = app_cfg.server.host.clone();
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen addr {}:{} - {}", host, port, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("RouteWald listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
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
    info!("Shutdown signal received. Stopping server...");
}
