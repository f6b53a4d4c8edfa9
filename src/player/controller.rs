use futures::FutureExt;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, trace, warn};

use super::bridge::{
    BridgeSession, EventDecodeError, PlayerDelegate, SessionSnapshot, decode_inbound,
};
use super::commands::{PlayerCommand, seconds_from_value};
use super::inbound::{InboundMessage, InboundReceiver};
use super::parameters::{MediaSource, PlayerConfiguration, PlayerTemplate};
use super::traits::{SurfaceError, WebSurface};
use super::video_url::video_id_from_url;
use crate::config::{CommandPolicy, Config};
use crate::models::{PlaylistId, VideoId};
use crate::utils::{BridgeError, BridgeResult};

/// Requests that can be sent to the player controller
pub enum PlayerRequest {
    /// Replace the configuration used by the next load
    Configure {
        configuration: PlayerConfiguration,
        respond_to: oneshot::Sender<()>,
    },
    /// Get the current configuration
    GetConfiguration {
        respond_to: oneshot::Sender<PlayerConfiguration>,
    },
    /// Render the page for a source and load it into the surface
    Load {
        source: MediaSource,
        respond_to: oneshot::Sender<BridgeResult<()>>,
    },
    /// Run a command against the page's player
    Dispatch {
        command: PlayerCommand,
        respond_to: oneshot::Sender<Option<Value>>,
    },
    /// Install or remove the host delegate
    SetDelegate {
        delegate: Option<PlayerDelegate>,
        respond_to: oneshot::Sender<()>,
    },
    /// Get tracked session state
    Snapshot {
        respond_to: oneshot::Sender<SessionSnapshot>,
    },
}

impl std::fmt::Debug for PlayerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configure { configuration, .. } => {
                f.debug_tuple("Configure").field(configuration).finish()
            }
            Self::GetConfiguration { .. } => f.write_str("GetConfiguration"),
            Self::Load { source, .. } => f.debug_tuple("Load").field(source).finish(),
            Self::Dispatch { command, .. } => f.debug_tuple("Dispatch").field(command).finish(),
            Self::SetDelegate { delegate, .. } => {
                f.debug_tuple("SetDelegate").field(delegate).finish()
            }
            Self::Snapshot { .. } => f.write_str("Snapshot"),
        }
    }
}

struct QueuedCommand {
    command: PlayerCommand,
    respond_to: oneshot::Sender<Option<Value>>,
}

struct Completion {
    generation: u64,
    command: PlayerCommand,
    result: Result<Option<Value>, SurfaceError>,
    respond_to: oneshot::Sender<Option<Value>>,
}

/// Owns the web surface and the bridge session. All session state is touched
/// from this task only.
pub struct PlayerController {
    surface: Arc<dyn WebSurface>,
    template: PlayerTemplate,
    base_url: String,
    policy: CommandPolicy,
    ready_timeout: Duration,
    configuration: PlayerConfiguration,
    session: BridgeSession,
    delegate: Option<PlayerDelegate>,
    receiver: mpsc::UnboundedReceiver<PlayerRequest>,
    inbound: InboundReceiver,
    queued: VecDeque<QueuedCommand>,
    // Set while commands are held for a page that has not signalled readiness
    ready_deadline: Option<Instant>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl PlayerController {
    /// Create a new player controller for a surface whose notifications
    /// arrive on `inbound`
    pub fn new(
        config: &Config,
        template: PlayerTemplate,
        surface: Arc<dyn WebSurface>,
        inbound: InboundReceiver,
    ) -> (PlayerHandle, PlayerController) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let controller = PlayerController {
            surface,
            template,
            base_url: config.player.base_url.clone(),
            policy: config.bridge.command_policy,
            ready_timeout: config.bridge.ready_timeout(),
            configuration: PlayerConfiguration::new(config.display),
            session: BridgeSession::new(),
            delegate: None,
            receiver,
            inbound,
            queued: VecDeque::new(),
            ready_deadline: None,
            in_flight: FuturesUnordered::new(),
        };
        let handle = PlayerHandle { sender };

        (handle, controller)
    }

    /// Run the controller event loop
    pub async fn run(mut self) {
        debug!("PlayerController event loop started");

        loop {
            let ready_deadline = self.ready_deadline;

            tokio::select! {
                biased;

                Some(message) = self.inbound.recv() => {
                    self.handle_inbound(message);
                }
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(completion);
                }
                _ = sleep_until(ready_deadline.unwrap_or_else(Instant::now)), if ready_deadline.is_some() => {
                    self.expire_queued();
                }
                request = self.receiver.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => break,
                },
            }
        }

        self.abandon_queued();
        debug!("PlayerController event loop stopped");
    }

    async fn handle_request(&mut self, request: PlayerRequest) {
        match request {
            PlayerRequest::Configure {
                configuration,
                respond_to,
            } => {
                trace!("Updating player configuration");
                self.configuration = configuration;
                let _ = respond_to.send(());
            }
            PlayerRequest::GetConfiguration { respond_to } => {
                let _ = respond_to.send(self.configuration.clone());
            }
            PlayerRequest::Load { source, respond_to } => {
                trace!("Loading {:?}", source);
                let result = self.load(source).await;
                let _ = respond_to.send(result);
            }
            PlayerRequest::Dispatch {
                command,
                respond_to,
            } => {
                self.dispatch(command, respond_to);
            }
            PlayerRequest::SetDelegate {
                delegate,
                respond_to,
            } => {
                trace!("Delegate set: {:?}", delegate);
                self.delegate = delegate;
                let _ = respond_to.send(());
            }
            PlayerRequest::Snapshot { respond_to } => {
                let _ = respond_to.send(self.session.snapshot());
            }
        }
    }

    async fn load(&mut self, source: MediaSource) -> BridgeResult<()> {
        let mut configuration = self.configuration.clone();
        configuration.source = Some(source);

        // Nothing changes if the page cannot be rendered
        let html = self.template.render_configuration(&configuration)?;

        let generation = self.session.reset_for_load();
        self.abandon_queued();
        self.configuration = configuration;

        self.surface
            .load_html(&html, &self.base_url)
            .await
            .map_err(|e| BridgeError::Surface(e.to_string()))?;

        info!("Player page loaded (generation {})", generation);
        Ok(())
    }

    fn dispatch(&mut self, command: PlayerCommand, respond_to: oneshot::Sender<Option<Value>>) {
        if !self.session.ready() && self.policy == CommandPolicy::QueueUntilReady {
            trace!("Player not ready, queueing {}", command);
            if self.ready_deadline.is_none() {
                self.ready_deadline = Some(Instant::now() + self.ready_timeout);
            }
            self.queued.push_back(QueuedCommand {
                command,
                respond_to,
            });
            return;
        }

        self.send_to_page(command, respond_to);
    }

    fn send_to_page(&mut self, command: PlayerCommand, respond_to: oneshot::Sender<Option<Value>>) {
        let surface = self.surface.clone();
        let generation = self.session.generation();
        let script = command.to_script();
        trace!("Evaluating {}", script);

        self.in_flight.push(
            async move {
                let result = surface.evaluate_script(&script).await;
                Completion {
                    generation,
                    command,
                    result,
                    respond_to,
                }
            }
            .boxed(),
        );
    }

    fn complete(&mut self, completion: Completion) {
        let Completion {
            generation,
            command,
            result,
            respond_to,
        } = completion;

        if !self.session.is_current(generation) {
            debug!(
                "Discarding {} reply from superseded page (generation {})",
                command, generation
            );
            let _ = respond_to.send(None);
            return;
        }

        let value = match result {
            Ok(value) if command.returns_value() => value,
            Ok(_) => None,
            Err(e) => {
                warn!("{} failed: {}", command, e);
                None
            }
        };
        let _ = respond_to.send(value);
    }

    fn flush_queued(&mut self) {
        self.ready_deadline = None;
        if !self.queued.is_empty() {
            debug!("Player ready, sending {} queued commands", self.queued.len());
        }
        while let Some(QueuedCommand {
            command,
            respond_to,
        }) = self.queued.pop_front()
        {
            self.send_to_page(command, respond_to);
        }
    }

    fn expire_queued(&mut self) {
        warn!(
            "Page not ready after {:?}, resolving {} held commands to nothing",
            self.ready_timeout,
            self.queued.len()
        );
        self.abandon_queued();
    }

    fn abandon_queued(&mut self) {
        self.ready_deadline = None;
        for QueuedCommand { command, respond_to } in self.queued.drain(..) {
            debug!("Dropping queued {} for a page that never became ready", command);
            let _ = respond_to.send(None);
        }
    }

    fn handle_inbound(&mut self, message: InboundMessage) {
        let event = match decode_inbound(&message, self.inbound.scheme()) {
            Ok(event) => event,
            Err(err @ EventDecodeError::UnrecognizedValue { .. }) => {
                debug!("Ignoring inbound notification: {}", err);
                return;
            }
            Err(err) => {
                warn!("Discarding inbound notification: {}", BridgeError::from(err));
                return;
            }
        };

        trace!("Inbound event: {:?}", event);
        let was_ready = self.session.ready();
        let notification = self.session.apply(event);

        if !was_ready && self.session.ready() {
            self.flush_queued();
        }

        if let Some(notification) = notification {
            match self.delegate.as_mut() {
                Some(delegate) => {
                    if !delegate.deliver(notification.clone()) {
                        trace!("No handler for {:?}", notification);
                    }
                }
                None => trace!("No delegate, dropping {:?}", notification),
            }
        }
    }
}

/// Handle to send requests to the player controller
#[derive(Clone)]
pub struct PlayerHandle {
    sender: mpsc::UnboundedSender<PlayerRequest>,
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("sender", &"<UnboundedSender>")
            .finish()
    }
}

impl PlayerHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> PlayerRequest,
    ) -> BridgeResult<T> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .map_err(|_| BridgeError::ControllerDisconnected)?;
        response
            .await
            .map_err(|_| BridgeError::ControllerDisconnected)
    }

    /// Replace the configuration used by subsequent loads
    pub async fn configure(&self, configuration: PlayerConfiguration) -> BridgeResult<()> {
        self.request(|respond_to| PlayerRequest::Configure {
            configuration,
            respond_to,
        })
        .await
    }

    pub async fn configuration(&self) -> BridgeResult<PlayerConfiguration> {
        self.request(|respond_to| PlayerRequest::GetConfiguration { respond_to })
            .await
    }

    pub async fn load(&self, source: MediaSource) -> BridgeResult<()> {
        self.request(|respond_to| PlayerRequest::Load { source, respond_to })
            .await?
    }

    pub async fn load_video_id(&self, video_id: impl Into<VideoId>) -> BridgeResult<()> {
        self.load(MediaSource::Video(video_id.into())).await
    }

    pub async fn load_playlist_id(&self, playlist_id: impl Into<PlaylistId>) -> BridgeResult<()> {
        self.load(MediaSource::Playlist(playlist_id.into())).await
    }

    /// Load the video a YouTube link points at
    pub async fn load_video_url(&self, url: &str) -> BridgeResult<()> {
        let video_id =
            video_id_from_url(url).ok_or_else(|| BridgeError::InvalidVideoUrl(url.to_string()))?;
        self.load_video_id(video_id).await
    }

    pub async fn set_delegate(&self, delegate: Option<PlayerDelegate>) -> BridgeResult<()> {
        self.request(|respond_to| PlayerRequest::SetDelegate {
            delegate,
            respond_to,
        })
        .await
    }

    pub async fn snapshot(&self) -> BridgeResult<SessionSnapshot> {
        self.request(|respond_to| PlayerRequest::Snapshot { respond_to })
            .await
    }

    /// Queue a command and return the receiver its reply arrives on.
    ///
    /// Replies are `None` for commands without a value, for script errors and
    /// for commands whose page was replaced before they completed.
    pub fn submit(&self, command: PlayerCommand) -> BridgeResult<oneshot::Receiver<Option<Value>>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PlayerRequest::Dispatch {
                command,
                respond_to,
            })
            .map_err(|_| BridgeError::ControllerDisconnected)?;
        Ok(response)
    }

    pub async fn dispatch(&self, command: PlayerCommand) -> BridgeResult<Option<Value>> {
        self.submit(command)?
            .await
            .map_err(|_| BridgeError::ControllerDisconnected)
    }

    /// Dispatch and block the calling thread until the reply arrives.
    ///
    /// For callers outside the runtime only: calling this from async code
    /// panics.
    pub fn dispatch_blocking(&self, command: PlayerCommand) -> BridgeResult<Option<Value>> {
        self.submit(command)?
            .blocking_recv()
            .map_err(|_| BridgeError::ControllerDisconnected)
    }

    pub async fn mute(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::Mute).await.map(drop)
    }

    pub async fn unmute(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::UnMute).await.map(drop)
    }

    pub async fn play(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::Play).await.map(drop)
    }

    pub async fn pause(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::Pause).await.map(drop)
    }

    pub async fn stop(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::Stop).await.map(drop)
    }

    pub async fn clear(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::Clear).await.map(drop)
    }

    pub async fn seek_to(&self, seconds: f64, allow_seek_ahead: bool) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::SeekTo {
            seconds,
            allow_seek_ahead,
        })
        .await
        .map(drop)
    }

    pub async fn previous_video(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::PreviousVideo).await.map(drop)
    }

    pub async fn next_video(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::NextVideo).await.map(drop)
    }

    pub async fn destroy(&self) -> BridgeResult<()> {
        self.dispatch(PlayerCommand::Destroy).await.map(drop)
    }

    /// Duration of the current video in seconds
    pub async fn duration(&self) -> BridgeResult<Option<f64>> {
        let reply = self.dispatch(PlayerCommand::GetDuration).await?;
        Ok(reply.as_ref().and_then(seconds_from_value))
    }

    /// Elapsed playback time in seconds
    pub async fn current_time(&self) -> BridgeResult<Option<f64>> {
        let reply = self.dispatch(PlayerCommand::GetCurrentTime).await?;
        Ok(reply.as_ref().and_then(seconds_from_value))
    }
}
