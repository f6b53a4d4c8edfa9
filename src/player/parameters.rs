use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::constants::{PLAYER_FRAME_SIZE, TEMPLATE_PLACEHOLDER};
use crate::models::{PlaylistId, VideoId};
use crate::utils::{BridgeError, BridgeResult};

/// What a load call plays. One id per load, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Video(VideoId),
    Playlist(PlaylistId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Playlist,
}

/// Display flags forwarded to the player as `playerVars`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayFlags {
    pub plays_inline: bool,
    pub show_controls: bool,
    pub show_info: bool,
    pub autoplay: bool,
    pub disable_keyboard: bool,
    pub show_related: bool,
    pub modest_branding: bool,
}

/// Names of the page functions the IFrame API calls back into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCallbacks {
    #[serde(rename = "onReady")]
    ready: &'static str,
    #[serde(rename = "onStateChange")]
    state_change: &'static str,
    #[serde(rename = "onPlaybackQualityChange")]
    quality_change: &'static str,
    #[serde(rename = "onError")]
    error: &'static str,
}

impl Default for EventCallbacks {
    fn default() -> Self {
        Self {
            ready: "onReady",
            state_change: "onStateChange",
            quality_change: "onPlaybackQualityChange",
            error: "onPlayerError",
        }
    }
}

/// Everything the page needs to create the player.
///
/// The host mutates it between loads; a load serializes a snapshot of it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerConfiguration {
    pub source: Option<MediaSource>,
    pub display: DisplayFlags,
    pub start_offset_seconds: Option<u32>,
    events: EventCallbacks,
}

impl PlayerConfiguration {
    pub fn new(display: DisplayFlags) -> Self {
        Self {
            display,
            ..Default::default()
        }
    }

    pub fn with_video(mut self, video_id: impl Into<VideoId>) -> Self {
        self.source = Some(MediaSource::Video(video_id.into()));
        self
    }

    pub fn with_playlist(mut self, playlist_id: impl Into<PlaylistId>) -> Self {
        self.source = Some(MediaSource::Playlist(playlist_id.into()));
        self
    }

    pub fn with_start_offset(mut self, seconds: u32) -> Self {
        self.start_offset_seconds = Some(seconds);
        self
    }

    pub fn events(&self) -> &EventCallbacks {
        &self.events
    }

    pub fn list_type(&self) -> Option<ListType> {
        match self.source {
            Some(MediaSource::Playlist(_)) => Some(ListType::Playlist),
            _ => None,
        }
    }

    /// Serialize for the page. See [`encode`].
    pub fn encode(&self) -> BridgeResult<String> {
        encode(self)
    }
}

#[derive(Serialize)]
struct PlayerParameters<'a> {
    height: &'static str,
    width: &'static str,
    #[serde(rename = "videoId", skip_serializing_if = "Option::is_none")]
    video_id: Option<&'a str>,
    events: &'a EventCallbacks,
    #[serde(rename = "playerVars")]
    player_vars: PlayerVars<'a>,
}

// The page expects every flag as a "0"/"1" string.
#[derive(Serialize)]
struct PlayerVars<'a> {
    playsinline: &'static str,
    controls: &'static str,
    showinfo: &'static str,
    autoplay: &'static str,
    disablekb: &'static str,
    rel: &'static str,
    modestbranding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(rename = "listType", skip_serializing_if = "Option::is_none")]
    list_type: Option<ListType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    list: Option<&'a str>,
}

pub fn flag_to_wire(flag: bool) -> &'static str {
    if flag { "1" } else { "0" }
}

pub fn flag_from_wire(value: &str) -> bool {
    value == "1"
}

/// Serialize a configuration into the JSON object handed to `new YT.Player`.
///
/// Output is deterministic for equal input: field order is fixed by the
/// structs above, not by a hash map.
pub fn encode(config: &PlayerConfiguration) -> BridgeResult<String> {
    let (video_id, list) = match &config.source {
        Some(MediaSource::Video(id)) => (Some(id.as_str()), None),
        Some(MediaSource::Playlist(id)) => (None, Some(id.as_str())),
        None => (None, None),
    };

    let flags = &config.display;
    let parameters = PlayerParameters {
        height: PLAYER_FRAME_SIZE,
        width: PLAYER_FRAME_SIZE,
        video_id,
        events: &config.events,
        player_vars: PlayerVars {
            playsinline: flag_to_wire(flags.plays_inline),
            controls: flag_to_wire(flags.show_controls),
            showinfo: flag_to_wire(flags.show_info),
            autoplay: flag_to_wire(flags.autoplay),
            disablekb: flag_to_wire(flags.disable_keyboard),
            rel: flag_to_wire(flags.show_related),
            modestbranding: flag_to_wire(flags.modest_branding),
            start: config.start_offset_seconds.map(|seconds| seconds.to_string()),
            list_type: config.list_type(),
            list,
        },
    };

    let payload = serde_json::to_string_pretty(&parameters)?;
    debug!("Encoded player parameters ({} bytes)", payload.len());
    Ok(payload)
}

const BUNDLED_TEMPLATE: &str = include_str!("../../assets/player.html");

/// Page template with a single placeholder for the encoded parameters.
#[derive(Debug, Clone)]
pub struct PlayerTemplate {
    source: String,
}

impl PlayerTemplate {
    /// The page shipped with the crate. It reports events on the default
    /// message handler and event scheme.
    pub fn bundled() -> Self {
        Self {
            source: BUNDLED_TEMPLATE.to_string(),
        }
    }

    pub fn new(source: impl Into<String>) -> BridgeResult<Self> {
        let source = source.into();
        match source.matches(TEMPLATE_PLACEHOLDER).count() {
            0 => {
                return Err(BridgeError::TemplateLoad(format!(
                    "template has no {} placeholder",
                    TEMPLATE_PLACEHOLDER
                )));
            }
            1 => {}
            n => warn!(
                "Template has {} placeholders, only the first will be replaced",
                n
            ),
        }
        Ok(Self { source })
    }

    pub fn from_path(path: &Path) -> BridgeResult<Self> {
        debug!("Loading player template from {:?}", path);
        let source = fs::read_to_string(path).map_err(|e| {
            BridgeError::TemplateLoad(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::new(source)
    }

    /// Substitute the payload for the placeholder.
    pub fn render(&self, payload: &str) -> String {
        self.source.replacen(TEMPLATE_PLACEHOLDER, payload, 1)
    }

    /// Encode the configuration and produce the document to load.
    pub fn render_configuration(&self, config: &PlayerConfiguration) -> BridgeResult<String> {
        let payload = encode(config)?;
        Ok(self.render(&payload))
    }
}
