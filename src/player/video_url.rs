use tracing::debug;
use url::Url;

use crate::models::VideoId;

/// Extract a video id from a YouTube link.
///
/// Rules, in order: the `v` query parameter; the first path segment of a
/// `youtu.be` link; the last path segment of a path containing `embed`.
/// Links without a scheme are read as `https`.
pub fn video_id_from_url(candidate: &str) -> Option<VideoId> {
    let url = parse_lenient(candidate.trim())?;

    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v")
        && !id.is_empty()
    {
        return Some(VideoId::new(id.into_owned()));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let is_short_link = url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case("youtu.be") || host.ends_with(".youtu.be"));
    if is_short_link {
        return segments.first().map(|id| VideoId::new(*id));
    }

    if segments.contains(&"embed") {
        return segments
            .last()
            .filter(|id| **id != "embed")
            .map(|id| VideoId::new(*id));
    }

    None
}

fn parse_lenient(candidate: &str) -> Option<Url> {
    match Url::parse(candidate) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", candidate)).ok()
        }
        Err(e) => {
            debug!("Not a URL {:?}: {}", candidate, e);
            None
        }
    }
}
