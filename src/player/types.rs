//! Typed model of what the IFrame API reports across the page boundary.
use std::fmt;
use thiserror::Error;

/// Player state as reported by `onStateChange`.
///
/// The page decides the order of transitions; nothing here assumes any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerState {
    #[default]
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Queued,
}

impl PlayerState {
    pub fn from_wire_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            4 => Some(Self::Queued),
            _ => None,
        }
    }

    /// Parse the numeric string form (`"-1"` .. `"4"`).
    pub fn from_wire(value: &str) -> Option<Self> {
        value
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::from_wire_code)
    }

    pub fn wire_code(&self) -> i64 {
        match self {
            Self::Unstarted => -1,
            Self::Ended => 0,
            Self::Playing => 1,
            Self::Paused => 2,
            Self::Buffering => 3,
            Self::Queued => 4,
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unstarted => "unstarted",
            Self::Ended => "ended",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Queued => "queued",
        };
        f.write_str(name)
    }
}

/// Playback quality as reported by `onPlaybackQualityChange`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PlaybackQuality {
    #[default]
    Small,
    Medium,
    Large,
    Hd720,
    Hd1080,
    HighResolution,
    /// Quality label the player reported that has no variant here
    Other(String),
}

impl PlaybackQuality {
    /// Empty labels are not a quality; anything else decodes.
    pub fn from_wire(value: &str) -> Option<Self> {
        let value = value.trim();
        let quality = match value {
            "" => return None,
            "small" => Self::Small,
            "medium" => Self::Medium,
            "large" => Self::Large,
            "hd720" => Self::Hd720,
            "hd1080" => Self::Hd1080,
            "highres" => Self::HighResolution,
            other => Self::Other(other.to_string()),
        };
        Some(quality)
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Hd720 => "hd720",
            Self::Hd1080 => "hd1080",
            Self::HighResolution => "highres",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for PlaybackQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Error reported by the page through `onError`.
///
/// Messages follow the IFrame API reference.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerErrorKind {
    #[error("Incorrect video or playlist id.")]
    InvalidParameter,

    #[error("The content cannot be played using this player.")]
    Html5Error,

    #[error("The video requested was not found: it's either removed or made private.")]
    VideoNotFound,

    #[error("The owner of the requested video does not allow it to be played in embedded players")]
    EmbeddingNotAllowed,

    #[error("The owner of the requested video does not allow it to be played in embedded players")]
    EmbeddingNotAllowedInDisguise,

    /// Code outside the documented set, or no usable code at all
    #[error("Unexpected request error.")]
    Unexpected(Option<i64>),
}

impl PlayerErrorKind {
    pub fn from_wire_code(code: i64) -> Self {
        match code {
            2 => Self::InvalidParameter,
            5 => Self::Html5Error,
            100 => Self::VideoNotFound,
            101 | 150 => Self::EmbeddingNotAllowed,
            105 => Self::EmbeddingNotAllowedInDisguise,
            other => Self::Unexpected(Some(other)),
        }
    }

    pub fn from_wire(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(code) => Self::from_wire_code(code),
            Err(_) => Self::Unexpected(None),
        }
    }

    /// True for every kind caused by the owner's embedding restrictions.
    pub fn is_embedding_restriction(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingNotAllowed | Self::EmbeddingNotAllowedInDisguise
        )
    }
}

/// Event names the page uses on both transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    IframeApiReady,
    Ready,
    StateChange,
    PlaybackQualityChange,
    PlayerError,
}

impl EventName {
    pub fn from_wire(name: &str) -> Option<Self> {
        const NAMES: [(&str, EventName); 7] = [
            ("onYouTubeIframeAPIReady", EventName::IframeApiReady),
            ("onReady", EventName::Ready),
            ("onStateChange", EventName::StateChange),
            ("onPlayerStateChange", EventName::StateChange),
            ("onPlaybackQualityChange", EventName::PlaybackQualityChange),
            ("onPlayerError", EventName::PlayerError),
            ("onError", EventName::PlayerError),
        ];

        NAMES
            .iter()
            .find(|(wire, _)| wire.eq_ignore_ascii_case(name))
            .map(|(_, event)| *event)
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::IframeApiReady => "onYouTubeIframeAPIReady",
            Self::Ready => "onReady",
            Self::StateChange => "onStateChange",
            Self::PlaybackQualityChange => "onPlaybackQualityChange",
            Self::PlayerError => "onPlayerError",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A decoded notification from the page. Consumed once by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Bootstrap signal: the IFrame API script finished loading
    IframeApiReady,
    Ready,
    StateChange(PlayerState),
    QualityChange(PlaybackQuality),
    Error(PlayerErrorKind),
}

impl PlayerEvent {
    pub fn name(&self) -> EventName {
        match self {
            Self::IframeApiReady => EventName::IframeApiReady,
            Self::Ready => EventName::Ready,
            Self::StateChange(_) => EventName::StateChange,
            Self::QualityChange(_) => EventName::PlaybackQualityChange,
            Self::Error(_) => EventName::PlayerError,
        }
    }
}
