use thiserror::Error;

/// Errors raised by the player bridge.
///
/// Only `ConfigEncoding`, `TemplateLoad` and `Surface` interrupt a load call.
/// The event variants are produced at the bridge boundary, logged and dropped.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to encode player configuration: {0}")]
    ConfigEncoding(#[from] serde_json::Error),

    #[error("Player template error: {0}")]
    TemplateLoad(String),

    #[error("Unknown event command: {0}")]
    UnknownEventCommand(String),

    #[error("Undecodable payload for {event}: {reason}")]
    UndecodableEventPayload { event: String, reason: String },

    #[error("Web surface error: {0}")]
    Surface(String),

    #[error("No video id found in URL: {0}")]
    InvalidVideoUrl(String),

    #[error("Player controller disconnected")]
    ControllerDisconnected,
}

pub type BridgeResult<T> = Result<T, BridgeError>;
