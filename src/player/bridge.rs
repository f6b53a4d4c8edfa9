use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

use super::inbound::InboundMessage;
use super::types::{EventName, PlaybackQuality, PlayerErrorKind, PlayerEvent, PlayerState};
use crate::constants::EVENT_DATA_PARAM;
use crate::utils::BridgeError;

/// Why an inbound notification did not become a [`PlayerEvent`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventDecodeError {
    #[error("malformed notification: {0}")]
    MalformedEnvelope(String),

    #[error("unknown event command {0:?}")]
    UnknownCommand(String),

    #[error("malformed {event} payload: {reason}")]
    MalformedPayload { event: EventName, reason: String },

    /// Well-formed payload carrying a value with no typed counterpart
    #[error("unrecognized {event} value {value:?}")]
    UnrecognizedValue { event: EventName, value: String },
}

impl From<EventDecodeError> for BridgeError {
    fn from(err: EventDecodeError) -> Self {
        match err {
            EventDecodeError::MalformedEnvelope(reason) => BridgeError::UnknownEventCommand(reason),
            EventDecodeError::UnknownCommand(command) => BridgeError::UnknownEventCommand(command),
            EventDecodeError::MalformedPayload { event, reason } => {
                BridgeError::UndecodableEventPayload {
                    event: event.to_string(),
                    reason,
                }
            }
            EventDecodeError::UnrecognizedValue { event, value } => {
                BridgeError::UndecodableEventPayload {
                    event: event.to_string(),
                    reason: format!("unrecognized value {:?}", value),
                }
            }
        }
    }
}

// Engines differ on whether numbers arrive as numbers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Int(i64),
    Text(String),
}

impl WireValue {
    fn into_text(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    command: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatePayload {
    Wrapped { state: WireValue },
    Bare(WireValue),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QualityPayload {
    Wrapped { quality: String },
    Bare(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Wrapped { exception: WireValue },
    Bare(WireValue),
}

/// Decode whichever transport the message came through.
pub fn decode_inbound(message: &InboundMessage, scheme: &str) -> Result<PlayerEvent, EventDecodeError> {
    match message {
        InboundMessage::EventUrl(url) => decode_event_url(url, scheme),
        InboundMessage::ScriptMessage(body) => decode_script_message(body),
    }
}

/// Decode `<scheme>://<eventName>?data=<value>`.
pub fn decode_event_url(raw: &str, scheme: &str) -> Result<PlayerEvent, EventDecodeError> {
    let url = Url::parse(raw)
        .map_err(|e| EventDecodeError::MalformedEnvelope(format!("{}: {}", raw, e)))?;

    if !url.scheme().eq_ignore_ascii_case(scheme) {
        return Err(EventDecodeError::MalformedEnvelope(format!(
            "unexpected scheme {:?}",
            url.scheme()
        )));
    }

    let command = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| EventDecodeError::MalformedEnvelope(format!("{}: no event name", raw)))?;
    let event = EventName::from_wire(command)
        .ok_or_else(|| EventDecodeError::UnknownCommand(command.to_string()))?;

    let data = url
        .query_pairs()
        .find(|(key, _)| key == EVENT_DATA_PARAM)
        .map(|(_, value)| value.into_owned());

    trace!("Event URL decoded: {} data={:?}", event, data);
    event_from_text(event, data)
}

fn event_from_text(event: EventName, data: Option<String>) -> Result<PlayerEvent, EventDecodeError> {
    let require = |data: Option<String>| {
        data.ok_or_else(|| EventDecodeError::MalformedPayload {
            event,
            reason: format!("missing {} parameter", EVENT_DATA_PARAM),
        })
    };

    match event {
        EventName::IframeApiReady => Ok(PlayerEvent::IframeApiReady),
        EventName::Ready => Ok(PlayerEvent::Ready),
        EventName::StateChange => state_event(require(data)?),
        EventName::PlaybackQualityChange => quality_event(require(data)?),
        EventName::PlayerError => Ok(PlayerEvent::Error(PlayerErrorKind::from_wire(&require(data)?))),
    }
}

fn state_event(value: String) -> Result<PlayerEvent, EventDecodeError> {
    PlayerState::from_wire(&value)
        .map(PlayerEvent::StateChange)
        .ok_or(EventDecodeError::UnrecognizedValue {
            event: EventName::StateChange,
            value,
        })
}

fn quality_event(value: String) -> Result<PlayerEvent, EventDecodeError> {
    PlaybackQuality::from_wire(&value)
        .map(PlayerEvent::QualityChange)
        .ok_or(EventDecodeError::UnrecognizedValue {
            event: EventName::PlaybackQualityChange,
            value,
        })
}

/// Decode `{"command": <name>, "data": <payload>}` from the message channel.
pub fn decode_script_message(body: &str) -> Result<PlayerEvent, EventDecodeError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| EventDecodeError::MalformedEnvelope(e.to_string()))?;

    let event = EventName::from_wire(&envelope.command)
        .ok_or_else(|| EventDecodeError::UnknownCommand(envelope.command.clone()))?;

    trace!("Script message decoded: {} data={:?}", event, envelope.data);
    match event {
        EventName::IframeApiReady => Ok(PlayerEvent::IframeApiReady),
        EventName::Ready => Ok(PlayerEvent::Ready),
        EventName::StateChange => {
            let payload: StatePayload = payload(event, envelope.data)?;
            let value = match payload {
                StatePayload::Wrapped { state } | StatePayload::Bare(state) => state,
            };
            state_event(value.into_text())
        }
        EventName::PlaybackQualityChange => {
            let payload: QualityPayload = payload(event, envelope.data)?;
            let value = match payload {
                QualityPayload::Wrapped { quality } | QualityPayload::Bare(quality) => quality,
            };
            quality_event(value)
        }
        EventName::PlayerError => {
            let payload: ErrorPayload = payload(event, envelope.data)?;
            let code = match payload {
                ErrorPayload::Wrapped { exception } | ErrorPayload::Bare(exception) => exception,
            };
            let kind = match code {
                WireValue::Int(code) => PlayerErrorKind::from_wire_code(code),
                WireValue::Text(text) => PlayerErrorKind::from_wire(&text),
            };
            Ok(PlayerEvent::Error(kind))
        }
    }
}

fn payload<T: for<'de> Deserialize<'de>>(
    event: EventName,
    data: Option<Value>,
) -> Result<T, EventDecodeError> {
    let data = data.ok_or_else(|| EventDecodeError::MalformedPayload {
        event,
        reason: "missing data".to_string(),
    })?;
    serde_json::from_value(data).map_err(|e| EventDecodeError::MalformedPayload {
        event,
        reason: e.to_string(),
    })
}

/// What the delegate hears about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Ready,
    StateChanged(PlayerState),
    QualityChanged(PlaybackQuality),
    Error(PlayerErrorKind),
}

/// Snapshot of what the session currently knows about the player.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub ready: bool,
    pub player_state: PlayerState,
    pub playback_quality: PlaybackQuality,
    pub generation: u64,
}

/// Tracked player state for the current document.
#[derive(Debug, Clone, Default)]
pub struct BridgeSession {
    ready: bool,
    player_state: PlayerState,
    playback_quality: PlaybackQuality,
    generation: u64,
}

impl BridgeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(&self) -> bool {
        self.ready
    }

    pub fn player_state(&self) -> PlayerState {
        self.player_state
    }

    pub fn playback_quality(&self) -> &PlaybackQuality {
        &self.playback_quality
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A new document is about to load: the player is not ready until the new
    /// page says so, and work tagged with the old generation is stale.
    pub fn reset_for_load(&mut self) -> u64 {
        self.ready = false;
        self.generation += 1;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Fold one event into the tracked state and return what to tell the
    /// delegate, if anything.
    pub fn apply(&mut self, event: PlayerEvent) -> Option<Notification> {
        match event {
            PlayerEvent::IframeApiReady => {
                debug!("IFrame API ready (generation {})", self.generation);
                self.ready = true;
                None
            }
            PlayerEvent::Ready => Some(Notification::Ready),
            PlayerEvent::StateChange(state) => {
                self.player_state = state;
                Some(Notification::StateChanged(state))
            }
            PlayerEvent::QualityChange(quality) => {
                self.playback_quality = quality.clone();
                Some(Notification::QualityChanged(quality))
            }
            PlayerEvent::Error(kind) => Some(Notification::Error(kind)),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            ready: self.ready,
            player_state: self.player_state,
            playback_quality: self.playback_quality.clone(),
            generation: self.generation,
        }
    }
}

type Handler<T> = Box<dyn FnMut(T) + Send>;

/// Host callbacks. Each one is optional; a missing handler just means the
/// notification goes nowhere.
///
/// Handlers run on the player controller's task, not on the host UI thread.
/// Hosts that update UI from a handler must hand the work to their UI thread
/// themselves.
#[derive(Default)]
pub struct PlayerDelegate {
    on_ready: Option<Box<dyn FnMut() + Send>>,
    on_state_changed: Option<Handler<PlayerState>>,
    on_quality_changed: Option<Handler<PlaybackQuality>>,
    on_error: Option<Handler<PlayerErrorKind>>,
}

impl fmt::Debug for PlayerDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerDelegate")
            .field("on_ready", &self.on_ready.is_some())
            .field("on_state_changed", &self.on_state_changed.is_some())
            .field("on_quality_changed", &self.on_quality_changed.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl PlayerDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_ready(mut self, handler: impl FnMut() + Send + 'static) -> Self {
        self.on_ready = Some(Box::new(handler));
        self
    }

    pub fn on_state_changed(mut self, handler: impl FnMut(PlayerState) + Send + 'static) -> Self {
        self.on_state_changed = Some(Box::new(handler));
        self
    }

    pub fn on_quality_changed(
        mut self,
        handler: impl FnMut(PlaybackQuality) + Send + 'static,
    ) -> Self {
        self.on_quality_changed = Some(Box::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl FnMut(PlayerErrorKind) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Returns whether a handler ran.
    pub fn deliver(&mut self, notification: Notification) -> bool {
        match notification {
            Notification::Ready => self.on_ready.as_mut().map(|handler| handler()).is_some(),
            Notification::StateChanged(state) => self
                .on_state_changed
                .as_mut()
                .map(|handler| handler(state))
                .is_some(),
            Notification::QualityChanged(quality) => self
                .on_quality_changed
                .as_mut()
                .map(|handler| handler(quality))
                .is_some(),
            Notification::Error(kind) => self.on_error.as_mut().map(|handler| handler(kind)).is_some(),
        }
    }
}
