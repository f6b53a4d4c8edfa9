#[cfg(test)]
mod video_url_tests {
    use crate::common::fixtures::Fixtures;
    use ytplayer::player::video_id_from_url;

    #[test]
    fn test_fixture_links() {
        for (link, expected) in Fixtures::video_links() {
            let found = video_id_from_url(link);
            assert_eq!(
                found.as_ref().map(|id| id.as_str()),
                expected,
                "link {:?}",
                link
            );
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let id = video_id_from_url("  https://youtu.be/ABC123\n").unwrap();
        assert_eq!(id.as_str(), "ABC123");
    }
}
