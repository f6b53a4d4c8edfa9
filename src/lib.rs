// Control and event bridge for the YouTube IFrame player hosted in a web surface.
// Platform surfaces live under `platforms`; everything else is portable.

#![allow(clippy::result_large_err)]

pub mod config;
pub mod constants;
pub mod models;
pub mod platforms;
pub mod player;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{BridgeConfig, CommandPolicy, Config, PlayerConfig, Transport};
pub use models::{PlaylistId, VideoId};
pub use player::{
    DisplayFlags, MediaSource, Notification, PlaybackQuality, PlayerCommand, PlayerConfiguration,
    PlayerController, PlayerDelegate, PlayerErrorKind, PlayerHandle, PlayerState, PlayerTemplate,
    WebSurface,
};
pub use utils::{BridgeError, BridgeResult};
