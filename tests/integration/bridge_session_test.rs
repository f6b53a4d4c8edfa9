#[cfg(test)]
mod bridge_session_tests {
    use crate::common::TestPlayer;
    use crate::common::fixtures::Fixtures;
    use crate::common::mocks::PageTransport;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use ytplayer::{
        CommandPolicy, PlaybackQuality, PlayerDelegate, PlayerErrorKind, PlayerState, Transport,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Heard {
        Ready,
        State(PlayerState),
        Quality(PlaybackQuality),
        Error(PlayerErrorKind),
    }

    fn listening_delegate() -> (PlayerDelegate, Arc<Mutex<Vec<Heard>>>) {
        let heard = Arc::new(Mutex::new(Vec::new()));
        let (ready, state, quality, error) =
            (heard.clone(), heard.clone(), heard.clone(), heard.clone());

        let delegate = PlayerDelegate::new()
            .on_ready(move || ready.lock().unwrap().push(Heard::Ready))
            .on_state_changed(move |s| state.lock().unwrap().push(Heard::State(s)))
            .on_quality_changed(move |q| quality.lock().unwrap().push(Heard::Quality(q)))
            .on_error(move |e| error.lock().unwrap().push(Heard::Error(e)));

        (delegate, heard)
    }

    async fn bootstrap_scenario(transport: PageTransport, config_transport: Transport) {
        let config = Fixtures::config(config_transport, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, transport);
        let (delegate, heard) = listening_delegate();
        player.handle.set_delegate(Some(delegate)).await.unwrap();

        player.handle.load_video_id("KvtT3UyhibQ").await.unwrap();
        player.surface.emit("onStateChange", Some("1"));

        let snapshot = player.handle.snapshot().await.unwrap();
        assert!(snapshot.ready);
        assert_eq!(snapshot.player_state, PlayerState::Playing);
        assert_eq!(
            *heard.lock().unwrap(),
            vec![Heard::Ready, Heard::State(PlayerState::Playing)]
        );
    }

    #[tokio::test]
    async fn test_bootstrap_over_url_scheme() {
        bootstrap_scenario(PageTransport::UrlScheme, Transport::UrlScheme).await;
    }

    #[tokio::test]
    async fn test_bootstrap_over_message_channel() {
        bootstrap_scenario(PageTransport::MessageChannel, Transport::MessageChannel).await;
    }

    #[tokio::test]
    async fn test_rendered_document_carries_configuration() {
        let config = Fixtures::config(Transport::MessageChannel, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, PageTransport::MessageChannel);

        player
            .handle
            .load_video_url("https://www.youtube.com/watch?v=KvtT3UyhibQ")
            .await
            .unwrap();

        let documents = player.surface.documents();
        assert_eq!(documents.len(), 1);
        let document = &documents[0];
        assert!(document.contains("new YT.Player('player', {"));
        assert!(document.contains("\"videoId\": \"KvtT3UyhibQ\""));
        assert!(document.contains("\"playsinline\": \"1\""));
        assert!(document.contains("\"controls\": \"1\""));
        assert!(document.contains("\"autoplay\": \"0\""));
        assert!(!document.contains("%@"));
    }

    #[tokio::test]
    async fn test_playlist_document() {
        let config = Fixtures::config(Transport::UrlScheme, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, PageTransport::UrlScheme);

        player.handle.load_playlist_id("RDe-ORhEE9VVg").await.unwrap();

        let document = &player.surface.documents()[0];
        assert!(document.contains("\"listType\": \"playlist\""));
        assert!(document.contains("\"list\": \"RDe-ORhEE9VVg\""));
        assert!(!document.contains("videoId"));
    }

    #[tokio::test]
    async fn test_commands_reach_page_and_page_answers() {
        let config = Fixtures::config(Transport::UrlScheme, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, PageTransport::UrlScheme);
        player
            .surface
            .emit_on("player.playVideo();", "onStateChange", Some("1"));
        player
            .surface
            .emit_on("player.pauseVideo();", "onStateChange", Some("2"));
        player.handle.load_video_id("abc").await.unwrap();

        player.handle.play().await.unwrap();
        assert_eq!(
            player.handle.snapshot().await.unwrap().player_state,
            PlayerState::Playing
        );

        player.handle.pause().await.unwrap();
        player.handle.seek_to(42.5, true).await.unwrap();
        player.handle.mute().await.unwrap();
        assert_eq!(
            player.handle.snapshot().await.unwrap().player_state,
            PlayerState::Paused
        );

        assert_eq!(
            player.surface.evaluated(),
            vec![
                "player.playVideo();",
                "player.pauseVideo();",
                "player.seekTo(42.5, true);",
                "player.mute();",
            ]
        );
    }

    #[tokio::test]
    async fn test_time_queries_resolve_independently() {
        let config = Fixtures::config(Transport::MessageChannel, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, PageTransport::MessageChannel);
        player.surface.answer(
            "player.getDuration();",
            json!("125.4"),
            Duration::from_millis(50),
        );
        player.surface.answer(
            "player.getCurrentTime();",
            json!(3.25),
            Duration::from_millis(1),
        );
        player.handle.load_video_id("abc").await.unwrap();

        let (duration, current_time) =
            tokio::join!(player.handle.duration(), player.handle.current_time());
        assert_eq!(duration.unwrap(), Some(125.4));
        assert_eq!(current_time.unwrap(), Some(3.25));
    }

    #[tokio::test]
    async fn test_commands_before_bootstrap_are_held() {
        let config = Fixtures::config(Transport::UrlScheme, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start_with(&config, PageTransport::UrlScheme, |surface| {
            surface.without_bootstrap()
        });
        player
            .surface
            .answer("player.getDuration();", json!(125.4), Duration::ZERO);
        player.handle.load_video_id("abc").await.unwrap();

        let handle = player.handle.clone();
        let pending = tokio::spawn(async move { handle.duration().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(player.surface.evaluated().is_empty());
        assert!(!player.handle.snapshot().await.unwrap().ready);

        player.surface.emit("onYouTubeIframeAPIReady", None);
        let duration = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("queued command should run once the page is ready")
            .unwrap()
            .unwrap();
        assert_eq!(duration, Some(125.4));
    }

    #[tokio::test]
    async fn test_quality_and_errors_reach_delegate() {
        let config = Fixtures::config(Transport::MessageChannel, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, PageTransport::MessageChannel);
        let (delegate, heard) = listening_delegate();
        player.handle.load_video_id("abc").await.unwrap();
        player.handle.set_delegate(Some(delegate)).await.unwrap();

        player.surface.emit("onPlaybackQualityChange", Some("hd1080"));
        player.surface.emit("onPlayerError", Some("150"));
        player.surface.emit("onPlayerError", Some("105"));
        player.surface.emit("onStateChange", Some("99"));

        let snapshot = player.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.playback_quality, PlaybackQuality::Hd1080);
        assert_eq!(snapshot.player_state, PlayerState::Unstarted);
        assert_eq!(
            *heard.lock().unwrap(),
            vec![
                Heard::Quality(PlaybackQuality::Hd1080),
                Heard::Error(PlayerErrorKind::EmbeddingNotAllowed),
                Heard::Error(PlayerErrorKind::EmbeddingNotAllowedInDisguise),
            ]
        );
    }

    #[tokio::test]
    async fn test_valid_event_after_malformed_ones_is_applied() {
        let config = Fixtures::config(Transport::MessageChannel, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, PageTransport::MessageChannel);
        let (delegate, heard) = listening_delegate();
        player.handle.load_video_id("abc").await.unwrap();
        player.handle.set_delegate(Some(delegate)).await.unwrap();

        player.surface.emit("onStateChange", Some("not-a-state"));
        player.surface.emit("onMysteryEvent", Some("1"));
        player.surface.emit("onStateChange", Some("3"));

        let snapshot = player.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.player_state, PlayerState::Buffering);
        assert_eq!(
            *heard.lock().unwrap(),
            vec![Heard::State(PlayerState::Buffering)]
        );
    }

    #[tokio::test]
    async fn test_reload_requires_new_bootstrap() {
        let config = Fixtures::config(Transport::UrlScheme, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, PageTransport::UrlScheme);

        player.handle.load_video_id("first").await.unwrap();
        let first = player.handle.snapshot().await.unwrap();
        assert!(first.ready);
        assert_eq!(first.generation, 1);

        player.handle.load_video_id("second").await.unwrap();
        let second = player.handle.snapshot().await.unwrap();
        assert!(second.ready);
        assert_eq!(second.generation, 2);
        assert_eq!(player.surface.documents().len(), 2);
    }

    #[tokio::test]
    async fn test_removing_delegate_silences_notifications() {
        let config = Fixtures::config(Transport::UrlScheme, CommandPolicy::QueueUntilReady);
        let player = TestPlayer::start(&config, PageTransport::UrlScheme);
        let (delegate, heard) = listening_delegate();
        player.handle.set_delegate(Some(delegate)).await.unwrap();
        player.handle.load_video_id("abc").await.unwrap();

        player.handle.set_delegate(None).await.unwrap();
        player.surface.emit("onStateChange", Some("0"));

        let snapshot = player.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.player_state, PlayerState::Ended);
        assert_eq!(*heard.lock().unwrap(), vec![Heard::Ready]);
    }
}
