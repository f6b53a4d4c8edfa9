pub mod identifiers;

pub use identifiers::{PlaylistId, VideoId};
