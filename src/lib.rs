//! A small widget toolkit built around a dynamic widget registry.
//!
//! A [`WidgetRegistry`](registry::WidgetRegistry) owns the buttons that are
//! created at runtime: every time a trigger [`Button`](widgets::Button)
//! emits its label, the registry appends a new button with that label to its
//! [`Layout`](layout::Layout). Clicking one of those buttons removes it from
//! the layout and destroys it.
//!
//! Widgets communicate through [`Event`](event::Event)s. Subscribing returns
//! a [`CallbackHandle`](event::CallbackHandle) that disconnects the callback
//! when dropped, unless it has been
//! [persisted](event::CallbackHandle::persist).
//!
//! The `fighter` binary shows the demo window using the
//! [`terminal`] frontend. With the `requests` feature enabled, the window also
//! has GET and POST buttons that send requests on a background `tokio`
//! runtime.

#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod demo;
pub mod dialog;
pub mod event;
pub mod layout;
pub mod registry;
#[cfg(feature = "requests")]
pub mod requests;
pub mod settings;
pub mod terminal;
pub mod widget;
pub mod widgets;
pub mod window;

use std::io;

pub use self::app::EventLoopClosed;
#[cfg(feature = "requests")]
pub use self::requests::NetworkError;

/// An error that stops the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The HTTP client could not be created.
    #[cfg(feature = "requests")]
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The event loop stopped before work could be handed to it.
    #[error(transparent)]
    EventLoopClosed(#[from] EventLoopClosed),
}

/// A result alias that defaults to the crate's [`Error`].
pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Installs a `tracing` subscriber that writes to the terminal.
///
/// The filter is read from `RUST_LOG`, falling back to `INFO` in debug builds
/// and `ERROR` in release builds. Does nothing if a global subscriber has
/// already been set, or if the `tracing-output` feature is disabled.
pub fn initialize_tracing() {
    #[cfg(feature = "tracing-output")]
    {
        use tracing::Level;
        use tracing_subscriber::filter::LevelFilter;
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;
        use tracing_subscriber::EnvFilter;

        #[cfg(debug_assertions)]
        const MAX_LEVEL: Level = Level::INFO;
        #[cfg(not(debug_assertions))]
        const MAX_LEVEL: Level = Level::ERROR;

        let _result = tracing_subscriber::fmt::fmt()
            .with_max_level(MAX_LEVEL)
            .with_writer(std::io::stderr)
            .finish()
            .with(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::from_level(MAX_LEVEL).into())
                    .from_env_lossy(),
            )
            .try_init();
    }
}
