use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Document load failed: {0}")]
    Load(String),

    #[error("Web surface is gone")]
    Detached,
}

/// A web-rendering surface the player page runs in.
///
/// One implementation per platform, picked at build time. Inbound
/// notifications do not go through this trait: the surface forwards them to
/// the [`InboundSender`](super::inbound::InboundSender) it was built with.
#[async_trait]
pub trait WebSurface: Send + Sync {
    /// Replace the current document.
    async fn load_html(&self, html: &str, base_url: &str) -> Result<(), SurfaceError>;

    /// Run a script in the page and return its completion value, if any.
    async fn evaluate_script(&self, script: &str) -> Result<Option<Value>, SurfaceError>;
}
