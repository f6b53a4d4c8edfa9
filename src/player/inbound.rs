use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Raw notification from the page, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Navigation to the reserved event scheme
    EventUrl(String),
    /// JSON text posted on the native message channel
    ScriptMessage(String),
}

/// Answer for a navigation the page attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    Allow,
    Cancel,
}

/// Surface-side end of the notification queue.
#[derive(Clone)]
pub struct InboundSender {
    sender: mpsc::UnboundedSender<InboundMessage>,
    scheme: Arc<str>,
}

impl std::fmt::Debug for InboundSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundSender")
            .field("scheme", &self.scheme)
            .field("sender", &"<UnboundedSender>")
            .finish()
    }
}

impl InboundSender {
    /// Decide a navigation. Event URLs are queued for the bridge and must not
    /// load; everything else goes through untouched.
    pub fn navigation(&self, url: &str) -> NavigationPolicy {
        if !is_event_url(url, &self.scheme) {
            return NavigationPolicy::Allow;
        }

        trace!("Intercepted event navigation: {}", url);
        self.forward(InboundMessage::EventUrl(url.to_string()));
        NavigationPolicy::Cancel
    }

    /// Queue a message posted on the native channel.
    pub fn script_message(&self, body: impl Into<String>) {
        self.forward(InboundMessage::ScriptMessage(body.into()));
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn forward(&self, message: InboundMessage) {
        if self.sender.send(message).is_err() {
            debug!("Player controller gone, dropping inbound message");
        }
    }
}

/// Controller-side end of the notification queue.
pub struct InboundReceiver {
    receiver: mpsc::UnboundedReceiver<InboundMessage>,
    scheme: Arc<str>,
}

impl InboundReceiver {
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        self.receiver.recv().await
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

/// Create the queue that carries page notifications to the controller.
pub fn channel(event_scheme: &str) -> (InboundSender, InboundReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let scheme: Arc<str> = Arc::from(event_scheme);
    (
        InboundSender {
            sender,
            scheme: scheme.clone(),
        },
        InboundReceiver { receiver, scheme },
    )
}

pub fn is_event_url(url: &str, scheme: &str) -> bool {
    url.trim_start()
        .split_once(':')
        .is_some_and(|(candidate, _)| candidate.eq_ignore_ascii_case(scheme))
}
