//! VNC client session engine.
//!
//! This crate ties the protocol, decoder and framebuffer layers into one
//! [`Session`]: connect, handshake, advertise encodings, then let the host
//! drive the event loop by alternating [`Session::request_update`] and
//! [`Session::poll`] while reading pixels out of
//! [`Session::pixel_data`].
//!
//! # Quick start
//!
//! ```no_run
//! use rfb_viewer::{Config, ServerEvent, Session};
//!
//! # async fn example() -> Result<(), rfb_viewer::ClientError> {
//! let config = Config::builder().host("localhost").port(5900).build()?;
//! let mut session = Session::connect(&config).await?;
//!
//! session.request_update(false).await?;
//! loop {
//!     match session.poll().await? {
//!         Some(ServerEvent::FramebufferUpdated { .. }) => {
//!             // render session.pixel_data()
//!         }
//!         Some(ServerEvent::Bell) => {}
//!         Some(ServerEvent::Clipboard(text)) => println!("clipboard: {text}"),
//!         None => break, // nothing pending; do other work
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency model
//!
//! Single-threaded and cooperative. The session has no internal tasks; it
//! blocks only inside the calls the host makes. `poll` returns `None`
//! immediately when the server has nothing queued, but once it starts a
//! message it reads it to completion. The framebuffer is only mutated
//! inside `poll`, so the host may freely read it between calls.

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod events;
pub mod session;

pub use config::Config;
pub use errors::ClientError;
pub use events::ServerEvent;
pub use rfb_encodings::CursorShape;
pub use session::Session;
