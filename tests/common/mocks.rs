use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ytplayer::player::{InboundSender, SurfaceError, WebSurface};

/// How the simulated page reports events back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTransport {
    UrlScheme,
    MessageChannel,
}

#[derive(Default)]
struct ScriptBehavior {
    reply: Option<Value>,
    delay: Duration,
    emits: Vec<(String, Option<String>)>,
}

/// Surface that behaves like a loaded player page: it announces the IFrame
/// API after each load and can answer scripts or emit events when a script
/// runs.
pub struct ScriptedSurface {
    page: InboundSender,
    transport: PageTransport,
    bootstrap_on_load: Mutex<bool>,
    behaviors: Mutex<HashMap<String, ScriptBehavior>>,
    documents: Mutex<Vec<String>>,
    evaluated: Mutex<Vec<String>>,
}

impl ScriptedSurface {
    pub fn new(page: InboundSender, transport: PageTransport) -> Arc<Self> {
        Arc::new(Self {
            page,
            transport,
            bootstrap_on_load: Mutex::new(true),
            behaviors: Mutex::new(HashMap::new()),
            documents: Mutex::new(Vec::new()),
            evaluated: Mutex::new(Vec::new()),
        })
    }

    /// Keep the page silent after loads; tests then drive the bootstrap.
    pub fn without_bootstrap(self: Arc<Self>) -> Arc<Self> {
        *self.bootstrap_on_load.lock().unwrap() = false;
        self
    }

    pub fn answer(&self, script: &str, value: Value, delay: Duration) {
        let mut behaviors = self.behaviors.lock().unwrap();
        let behavior = behaviors.entry(script.to_string()).or_default();
        behavior.reply = Some(value);
        behavior.delay = delay;
    }

    /// Emit `command` (with optional payload) whenever `script` runs.
    pub fn emit_on(&self, script: &str, command: &str, data: Option<&str>) {
        self.behaviors
            .lock()
            .unwrap()
            .entry(script.to_string())
            .or_default()
            .emits
            .push((command.to_string(), data.map(str::to_string)));
    }

    /// Send an event the way the page would.
    pub fn emit(&self, command: &str, data: Option<&str>) {
        match self.transport {
            PageTransport::UrlScheme => {
                let mut url = format!("{}://{}", self.page.scheme(), command);
                if let Some(data) = data {
                    url.push_str("?data=");
                    url.push_str(data);
                }
                self.page.navigation(&url);
            }
            PageTransport::MessageChannel => {
                let key = match command {
                    "onStateChange" => "state",
                    "onPlaybackQualityChange" => "quality",
                    _ => "exception",
                };
                let message = match data {
                    Some(data) => serde_json::json!({ "command": command, "data": { key: data } }),
                    None => serde_json::json!({ "command": command }),
                };
                self.page.script_message(message.to_string());
            }
        }
    }

    pub fn documents(&self) -> Vec<String> {
        self.documents.lock().unwrap().clone()
    }

    pub fn evaluated(&self) -> Vec<String> {
        self.evaluated.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSurface for ScriptedSurface {
    async fn load_html(&self, html: &str, _base_url: &str) -> Result<(), SurfaceError> {
        self.documents.lock().unwrap().push(html.to_string());
        if *self.bootstrap_on_load.lock().unwrap() {
            self.emit("onYouTubeIframeAPIReady", None);
            self.emit("onReady", None);
        }
        Ok(())
    }

    async fn evaluate_script(&self, script: &str) -> Result<Option<Value>, SurfaceError> {
        self.evaluated.lock().unwrap().push(script.to_string());

        let (reply, delay, emits) = match self.behaviors.lock().unwrap().get(script) {
            Some(behavior) => (behavior.reply.clone(), behavior.delay, behavior.emits.clone()),
            None => (None, Duration::ZERO, Vec::new()),
        };

        for (command, data) in &emits {
            self.emit(command, data.as_deref());
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(reply)
    }
}
