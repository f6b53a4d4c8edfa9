use serde_json::Value;
use std::fmt;

use crate::constants::PLAYER_OBJECT;

/// Commands understood by the page's global `player` object.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Mute,
    UnMute,
    Play,
    Pause,
    Stop,
    Clear,
    SeekTo { seconds: f64, allow_seek_ahead: bool },
    GetDuration,
    GetCurrentTime,
    PreviousVideo,
    NextVideo,
    Destroy,
}

impl PlayerCommand {
    /// Method name on the IFrame API player.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mute => "mute",
            Self::UnMute => "unMute",
            Self::Play => "playVideo",
            Self::Pause => "pauseVideo",
            Self::Stop => "stopVideo",
            Self::Clear => "clearVideo",
            Self::SeekTo { .. } => "seekTo",
            Self::GetDuration => "getDuration",
            Self::GetCurrentTime => "getCurrentTime",
            Self::PreviousVideo => "previousVideo",
            Self::NextVideo => "nextVideo",
            Self::Destroy => "destroy",
        }
    }

    pub fn arguments(&self) -> Vec<ScriptLiteral> {
        match self {
            Self::SeekTo {
                seconds,
                allow_seek_ahead,
            } => vec![
                ScriptLiteral::Number(*seconds),
                ScriptLiteral::Bool(*allow_seek_ahead),
            ],
            _ => Vec::new(),
        }
    }

    /// Only the time queries return something worth reading.
    pub fn returns_value(&self) -> bool {
        matches!(self, Self::GetDuration | Self::GetCurrentTime)
    }

    pub fn to_script(&self) -> String {
        script_call(self.name(), &self.arguments())
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal argument rendered into command text.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLiteral {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for ScriptLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.is_finite() => write!(f, "{}", n),
            Self::Number(_) => f.write_str("NaN"),
            Self::Bool(b) => write!(f, "{}", b),
            // JSON string literals are valid JavaScript string literals
            Self::Text(s) => write!(f, "{}", Value::String(s.clone())),
        }
    }
}

/// `player.<name>(<args>);`
pub fn script_call(name: &str, args: &[ScriptLiteral]) -> String {
    let args = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}.{}({});", PLAYER_OBJECT, name, args)
}

/// Read a time reply, which engines hand back either as a number or as its
/// string form.
pub fn seconds_from_value(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    seconds.is_finite().then_some(seconds)
}
