// Values shared by the page template contract and the bridge.

/// Placeholder in the page template replaced by the serialized player parameters.
pub const TEMPLATE_PLACEHOLDER: &str = "%@";

/// Base URL the rendered document is loaded against.
pub const DEFAULT_BASE_URL: &str = "about:blank";

/// Scheme the page navigates to when it reports an event.
pub const DEFAULT_EVENT_SCHEME: &str = "ytplayer";

/// Name of the native message channel the page posts to.
pub const DEFAULT_MESSAGE_HANDLER: &str = "ytPlayer";

/// Held commands resolve to nothing if the page is not ready within this.
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 10_000;

/// Query parameter carrying the event payload on reserved-scheme URLs.
pub const EVENT_DATA_PARAM: &str = "data";

/// Player frame size handed to the IFrame API; the host view does the layout.
pub const PLAYER_FRAME_SIZE: &str = "100%";

/// Global the page exposes for player commands.
pub const PLAYER_OBJECT: &str = "player";
