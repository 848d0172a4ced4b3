//! # DigiCart
//!
//! Digital product storefront backed by Razorpay.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export RAZORPAY_KEY_ID=rzp_test_...
//! export RAZORPAY_KEY_SECRET=...
//! export DOWNLOAD_SECRET=...
//!
//! # Optional admin login
//! export ADMIN_USERNAME=seller ADMIN_PASSWORD=... SESSION_SECRET=...
//!
//! # Run the server
//! digicart
//! ```

use digicart_api::{routes, state::AppState};
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.catalog.len());
    info!(
        "Payment gateway: {} ({})",
        state.gateway.gateway_name(),
        state.gateway.public_key_id()
    );
    info!("Admin pages: {}", if state.admin.is_some() { "enabled" } else { "disabled" });

    let app = routes::create_router(state);

    info!("🛒 DigiCart starting on http://{}", addr);

    if !is_prod {
        info!("📦 Products: GET http://{}/api/products", addr);
        info!("💳 Order: POST http://{}/api/order", addr);
        info!("🔐 Admin: http://{}/admin/login", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `LOG_FORMAT=json` switches to JSON lines; `RUST_LOG` overrides the level
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

fn print_banner() {
    println!(
        r#"
  🛒 DigiCart 🛒
  ━━━━━━━━━━━━━━━━━━━━━━━
  Digital downloads, signed links
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
