#![cfg(test)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::player::{SurfaceError, WebSurface};

/// Minimal page template with the single parameter placeholder.
pub const TEST_TEMPLATE: &str = r#"<html><body><div id="player"></div>
<script>var player = new YT.Player('player', %@);</script></body></html>"#;

#[derive(Default)]
struct FakeSurfaceState {
    loads: Vec<(String, String)>,
    scripts: Vec<String>,
    replies: HashMap<String, (Value, Duration)>,
    failing_scripts: HashSet<String>,
    fail_loads: bool,
}

/// In-memory surface that records what the controller sends it and answers
/// scripts from a reply table. Unknown scripts complete with no value.
#[derive(Default)]
pub struct FakeSurface {
    state: Mutex<FakeSurfaceState>,
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, script: &str, value: Value) {
        self.reply_after(script, value, Duration::ZERO);
    }

    pub fn reply_after(&self, script: &str, value: Value, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(script.to_string(), (value, delay));
    }

    pub fn fail_script(&self, script: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_scripts
            .insert(script.to_string());
    }

    pub fn fail_loads(&self) {
        self.state.lock().unwrap().fail_loads = true;
    }

    /// `(html, base_url)` per load, oldest first
    pub fn loads(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().loads.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().unwrap().scripts.clone()
    }
}

#[async_trait]
impl WebSurface for FakeSurface {
    async fn load_html(&self, html: &str, base_url: &str) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_loads {
            return Err(SurfaceError::Load("fake surface refuses loads".to_string()));
        }
        state.loads.push((html.to_string(), base_url.to_string()));
        Ok(())
    }

    async fn evaluate_script(&self, script: &str) -> Result<Option<Value>, SurfaceError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.scripts.push(script.to_string());
            if state.failing_scripts.contains(script) {
                return Err(SurfaceError::Script(format!("{} threw", script)));
            }
            state.replies.get(script).cloned()
        };

        match reply {
            Some((value, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
