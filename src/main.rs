use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ytplayer::player::video_id_from_url;
use ytplayer::{Config, PlayerConfiguration, PlayerTemplate};

/// Render the player page for a video link or a playlist.
#[derive(Debug, Parser)]
#[command(name = "ytplayer-page", version)]
struct Args {
    /// YouTube link to play
    #[arg(required_unless_present = "playlist", conflicts_with = "playlist")]
    url: Option<String>,

    /// Play a playlist instead of a single video
    #[arg(long)]
    playlist: Option<String>,

    /// Page template with a single %@ placeholder
    #[arg(long)]
    template: Option<PathBuf>,

    /// Config file to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start offset in seconds
    #[arg(long)]
    start: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ytplayer=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let template = match args.template.as_ref().or(config.player.template_path.as_ref()) {
        Some(path) => PlayerTemplate::from_path(path)
            .with_context(|| format!("Failed to load template {}", path.display()))?,
        None => {
            debug!("Using bundled player template");
            PlayerTemplate::bundled()
        }
    };

    let mut configuration = PlayerConfiguration::new(config.display);
    if let Some(seconds) = args.start {
        configuration = configuration.with_start_offset(seconds);
    }

    configuration = match (&args.playlist, &args.url) {
        (Some(playlist), _) => configuration.with_playlist(playlist.as_str()),
        (None, Some(url)) => match video_id_from_url(url) {
            Some(video_id) => configuration.with_video(video_id),
            None => bail!("No video id found in {}", url),
        },
        (None, None) => bail!("Nothing to play"),
    };

    let document = template
        .render_configuration(&configuration)
        .context("Failed to render player page")?;
    info!(
        "Rendered player page for {:?} ({} bytes)",
        configuration.source,
        document.len()
    );

    println!("{}", document);
    Ok(())
}
