//! In-memory REST backend for taskboard.
//!
//! Serves `projects` and `users` collections with json-server style
//! filtering, plus a `/login` endpoint that accepts a single demo account.
//! Used by the taskboard integration tests and for local development.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskboard_mock::{Database, serve};
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
//! let address = listener.local_addr()?;
//! tokio::spawn(serve(listener, Database::seeded(), std::future::pending()));
//! println!("mock backend on http://{address}");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod routes;
pub mod store;

use std::future::Future;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use error::MockError;
pub use routes::{AppState, DEMO_PASSWORD, DEMO_USERNAME, ISSUED_TOKEN, create_router};
pub use store::{Database, ListQuery, Record, SortOrder};

/// Serves `database` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve<S>(listener: TcpListener, database: Database, shutdown: S) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppState::new(database)).layer(TraceLayer::new_for_http());
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}
