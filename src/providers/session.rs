//! Session cookie handling for marketplace requests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Supplies the session cookie presented on every marketplace request.
///
/// Login and credential storage are external concerns; the core only needs a
/// cookie value that may be swapped mid-run when a session is refreshed.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current `Cookie` header value.
    async fn cookie(&self) -> String;

    /// Replaces the session cookie after an external re-authentication.
    async fn refresh(&self, cookie: String);
}

/// A [`SessionProvider`] backed by a shared, swappable cookie value.
#[derive(Debug, Default)]
pub struct SharedSession {
    cookie: Arc<RwLock<String>>,
}

impl SharedSession {
    /// Creates a session seeded with an initial cookie.
    pub fn new(cookie: impl Into<String>) -> Self {
        Self { cookie: Arc::new(RwLock::new(cookie.into())) }
    }
}

#[async_trait]
impl SessionProvider for SharedSession {
    async fn cookie(&self) -> String {
        self.cookie.read().await.clone()
    }

    async fn refresh(&self, cookie: String) {
        *self.cookie.write().await = cookie;
    }
}
