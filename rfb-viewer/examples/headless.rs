//! Headless VNC client: connect, keep the framebuffer current, print
//! events.
//!
//! ```text
//! cargo run --example headless -- <host> [port]
//! VNC_PASSWORD=secret cargo run --example headless -- 192.168.1.20 5901
//! ```

use anyhow::Result;
use rfb_viewer::{Config, ServerEvent, Session};
use std::time::Duration;
use tracing::info;

/// How often to ask the server for changes. Update pacing is the host's
/// job; the session itself never looks at a clock.
const REQUEST_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = args.next().map(|p| p.parse()).transpose()?.unwrap_or(5900);

    let mut builder = Config::builder().host(host).port(port);
    if let Ok(password) = std::env::var("VNC_PASSWORD") {
        builder = builder.password(password);
    }
    let config = builder.build()?;

    let mut session = Session::connect(&config).await?;
    info!(
        name = session.desktop_name(),
        width = session.width(),
        height = session.height(),
        "session up"
    );

    session.request_update(false).await?;

    let mut ticker = tokio::time::interval(REQUEST_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                session.close().await?;
                return Ok(());
            }
            _ = ticker.tick() => {
                session.request_update(true).await?;
                while let Some(event) = session.poll().await? {
                    match event {
                        ServerEvent::FramebufferUpdated { rectangles } => {
                            info!(rectangles = rectangles.len(), "framebuffer updated");
                        }
                        ServerEvent::Bell => info!("bell"),
                        ServerEvent::Clipboard(text) => {
                            info!(bytes = text.len(), "server clipboard: {text}");
                        }
                    }
                }
            }
        }
    }
}
