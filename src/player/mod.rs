pub mod bridge;
pub mod commands;
pub mod controller;
pub mod inbound;
pub mod parameters;
pub mod traits;
pub mod types;
pub mod video_url;

pub use bridge::{
    BridgeSession, EventDecodeError, Notification, PlayerDelegate, SessionSnapshot,
    decode_event_url, decode_inbound, decode_script_message,
};
pub use commands::{PlayerCommand, ScriptLiteral, seconds_from_value};
pub use controller::{PlayerController, PlayerHandle, PlayerRequest};
pub use inbound::{InboundMessage, InboundReceiver, InboundSender, NavigationPolicy};
pub use parameters::{
    DisplayFlags, EventCallbacks, ListType, MediaSource, PlayerConfiguration, PlayerTemplate,
};
pub use traits::{SurfaceError, WebSurface};
pub use types::{EventName, PlaybackQuality, PlayerErrorKind, PlayerEvent, PlayerState};
pub use video_url::video_id_from_url;
