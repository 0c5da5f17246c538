//! Shared setup for tests that talk to the mock backend.

#![allow(dead_code)]

use std::sync::Arc;

use reqwest::Url;
use taskboard::auth::MemoryTokenStore;
use taskboard::http::{ClientConfig, HttpClient};
use taskboard_mock::Database;
use tokio::net::TcpListener;

/// Starts a seeded mock backend on an ephemeral port and returns its URL.
pub async fn spawn_backend() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(taskboard_mock::serve(
        listener,
        Database::seeded(),
        std::future::pending(),
    ));
    Url::parse(&format!("http://{address}")).unwrap()
}

/// A logged-out client for `base`.
pub fn client(base: Url) -> HttpClient {
    HttpClient::new(ClientConfig::new(base), Arc::new(MemoryTokenStore::new())).unwrap()
}

/// Page location of the project list.
pub fn projects_location() -> Url {
    Url::parse("http://taskboard.local/projects").unwrap()
}
