use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tvmaze_resolver::{
    DEFAULT_BASE_URL, EpisodeMetadata, ItemKind, LocalEpisodeSignal, MetadataService,
    ProviderIds, Resolution, ResolverConfig, ResolverError, SeriesInfo, TVMAZE_PROVIDER,
    TvMazeClient, external_url, parse_episode_numbers, scan_for_videos, tvmaze_service,
};

/// Resolve local TV episode files against the TVMaze catalog
#[derive(Debug, Parser)]
#[command(name = "tvmaze-resolver", version, about)]
struct Cli {
    /// Base URL of the TVMaze API
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Seconds a cached episode list lives at most
    #[arg(long, global = true)]
    absolute_ttl_secs: Option<u64>,

    /// Seconds a cached episode list lives without being read
    #[arg(long, global = true)]
    sliding_ttl_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a video file, or every video file below a directory
    Episode {
        /// TVMaze id of the show the files belong to
        #[arg(long)]
        series_id: u32,

        /// Season number; read from the filename when omitted
        #[arg(long)]
        season: Option<u32>,

        /// Episode number; read from the filename when omitted (single files only)
        #[arg(long)]
        episode: Option<u32>,

        /// Video file or directory
        path: PathBuf,
    },

    /// Identify a series by name, e.g. "Doctor Who (2005)"
    Series {
        name: String,

        /// Premiere year hint
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show the metadata of one season of a series
    Season {
        /// TVMaze id of the show
        #[arg(long)]
        series_id: u32,

        /// Season number
        number: u32,
    },
}

impl Cli {
    fn config(&self) -> ResolverConfig {
        let defaults = ResolverConfig::default();
        ResolverConfig {
            base_url: self.base_url.clone(),
            absolute_ttl: self
                .absolute_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.absolute_ttl),
            sliding_ttl: self
                .sliding_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.sliding_ttl),
            ..defaults
        }
    }
}

/// Builds the signal for one file, preferring numbers given on the command line
fn signal_for(
    series_id: u32,
    path: &Path,
    season: Option<u32>,
    episode: Option<u32>,
) -> LocalEpisodeSignal {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let (parsed_season, parsed_episode) = parse_episode_numbers(&file_name);

    LocalEpisodeSignal::new(series_id, path)
        .with_numbers(season.or(parsed_season), episode.or(parsed_episode))
}

fn print_episode(episode: &EpisodeMetadata) {
    match (episode.season_number, episode.episode_number) {
        (Some(season), Some(number)) => {
            println!("  Episode: S{:02}E{:02} - {}", season, number, episode.name)
        }
        _ => println!("  Episode: {}", episode.name),
    }

    if let Some(season) = episode.position.airs_before_season {
        match episode.position.airs_before_episode {
            Some(number) => println!("  Airs before: S{:02}E{:02}", season, number),
            None => println!("  Airs before: season {}", season),
        }
    }
    if let Some(season) = episode.position.airs_after_season {
        println!("  Airs after: season {}", season);
    }
    if let Some(date) = episode.premiere_date {
        println!("  Aired: {}", date);
    }
    if let Some(runtime) = episode.runtime {
        println!("  Runtime: {} min", runtime.as_secs() / 60);
    }
    if let Some(overview) = &episode.overview {
        println!("  Summary: {}", overview);
    }
    println!(
        "  URL: {}",
        external_url(ItemKind::Episode, &episode.tvmaze_id.to_string())
    );
}

async fn resolve_episodes(
    service: &MetadataService<TvMazeClient>,
    series_id: u32,
    season: Option<u32>,
    episode: Option<u32>,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<(), ResolverError> {
    let signals: Vec<LocalEpisodeSignal> = if path.is_dir() {
        println!("Scanning for video files in {}...", path.display());
        scan_for_videos(path)?
            .iter()
            .map(|video| signal_for(series_id, &video.path, season, None))
            .collect()
    } else {
        vec![signal_for(series_id, path, season, episode)]
    };

    if signals.is_empty() {
        println!("No video files found.");
        return Ok(());
    }

    let mut matched = 0;
    for (index, signal) in signals.iter().enumerate() {
        println!(
            "[{}/{}] Resolving: {}",
            index + 1,
            signals.len(),
            signal.path.display()
        );

        match service.episode_metadata(signal, cancel).await? {
            Resolution::Matched(episode) => {
                matched += 1;
                print_episode(&episode);
            }
            Resolution::NoMatch => println!("  No matching episode found."),
            Resolution::Ambiguous(ambiguity) => println!("  {}", ambiguity),
        }
        println!();
    }

    println!("Resolved {} of {} file(s).", matched, signals.len());
    Ok(())
}

async fn identify_series(
    service: &MetadataService<TvMazeClient>,
    name: String,
    year: Option<i32>,
    cancel: &CancellationToken,
) -> Result<(), ResolverError> {
    let info = SeriesInfo {
        name,
        year,
        provider_ids: ProviderIds::new(),
    };

    let Some(series) = service.series_metadata(&info, cancel).await? else {
        println!("No series found for '{}'.", info.name);
        return Ok(());
    };

    println!("=== {} ===", series.name);
    if let Some(date) = series.premiere_date {
        println!("Premiered: {}", date);
    }
    if let Some(status) = series.status {
        println!("Status: {:?}", status);
    }
    if !series.studios.is_empty() {
        println!("Network: {}", series.studios.join(", "));
    }
    if !series.genres.is_empty() {
        println!("Genres: {}", series.genres.join(", "));
    }
    if let Some(rating) = series.community_rating {
        println!("Rating: {:.1}", rating);
    }

    let mut ids: Vec<_> = series.provider_ids.iter().collect();
    ids.sort();
    for (provider, id) in ids {
        println!("{}: {}", provider, id);
    }
    if let Some(id) = series.provider_ids.get(TVMAZE_PROVIDER) {
        println!("URL: {}", external_url(ItemKind::Series, id));
    }
    if let Some(overview) = &series.overview {
        println!("\n{}", overview);
    }

    if !series.people.is_empty() {
        println!("\nCast:");
        for person in &series.people {
            println!("  {} as {}", person.name, person.role);
        }
    }

    Ok(())
}

async fn describe_season(
    service: &MetadataService<TvMazeClient>,
    series_id: u32,
    number: u32,
    cancel: &CancellationToken,
) -> Result<(), ResolverError> {
    let ids = ProviderIds::from([(TVMAZE_PROVIDER.to_string(), series_id.to_string())]);

    let Some(season) = service.season_metadata(&ids, Some(number), cancel).await? else {
        println!("Season {} not found.", number);
        return Ok(());
    };

    println!("Season {}", season.season_number);
    if let Some(name) = &season.name {
        println!("  Name: {}", name);
    }
    if let Some(date) = season.premiere_date {
        println!("  Premiered: {}", date);
    }
    println!(
        "  URL: {}",
        external_url(ItemKind::Season, &season.tvmaze_id.to_string())
    );

    Ok(())
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<(), ResolverError> {
    let service = tvmaze_service(&cli.config())?;

    match cli.command {
        Command::Episode {
            series_id,
            season,
            episode,
            path,
        } => resolve_episodes(&service, series_id, season, episode, &path, cancel).await,
        Command::Series { name, year } => identify_series(&service, name, year, cancel).await,
        Command::Season { series_id, number } => {
            describe_season(&service, series_id, number, cancel).await
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    if let Err(e) = run(cli, &cancel).await {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
