use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use slideshower::config::Configuration;
use slideshower::events::PlaybackEvent;
use slideshower::library::{self, Library};
use slideshower::scan::ScanOptions;
use slideshower::tasks;
use slideshower::{SessionController, playback};

#[derive(Debug, Parser)]
#[command(
    name = "slideshower",
    version,
    about = "headless slideshow and photo-grid player"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Override the per-image delay (e.g. "5s", "1500ms")
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    delay: Option<Duration>,
    /// Visit images in shuffled order
    #[arg(long)]
    shuffle: bool,
    /// Start over after the last image instead of stopping
    #[arg(long = "loop")]
    loop_playback: bool,
    /// Run the auto-refreshing grid instead of the slideshow
    #[arg(long)]
    grid: bool,
    /// Deterministic RNG seed for shuffles and grid refreshes
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Print the planned display order for N ticks without playing
    #[arg(long = "dry-run", value_name = "ITERATIONS")]
    dry_run: Option<usize>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(
            format!("slideshower={level}")
                .parse()
                .context("invalid log directive")?,
        );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let result = runtime.block_on(run(args));
    // A stdin read may still be parked on a blocking thread; don't wait for it.
    runtime.shutdown_timeout(Duration::from_millis(250));
    result
}

async fn run(args: Args) -> Result<()> {
    let mut cfg = Configuration::from_yaml_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;
    if let Some(delay) = args.delay {
        cfg.delay = delay;
    }
    cfg.shuffle |= args.shuffle;
    cfg.loop_playback |= args.loop_playback;
    cfg.grid.enabled |= args.grid;
    cfg.seed = args.seed.or(cfg.seed);
    let cfg = cfg.validated().context("invalid configuration values")?;
    tracing::info!("Loaded configuration from {}:\n{:#?}", args.config.display(), cfg);

    let scan = ScanOptions {
        recursive: cfg.recursive,
        ..ScanOptions::default()
    };
    let images = library::load_library(cfg.photo_library_paths.clone(), scan)
        .await
        .context("failed to load image library")?;
    if images.is_empty() {
        bail!("no images found in the configured photo library paths");
    }

    if let Some(iterations) = args.dry_run {
        return run_dry_run(&cfg, &images, iterations);
    }

    run_session(&cfg, images).await
}

fn run_dry_run(cfg: &Configuration, images: &Library, iterations: usize) -> Result<()> {
    let settings = cfg.playback();
    let plan = playback::simulate(images.len(), &settings, iterations)?;

    println!(
        "# dry run\n# images: {}\n# mode: {}\n# iterations: {}\n# seed: {}\n",
        images.len(),
        if settings.grid_mode {
            format!("grid {}x{}", settings.rows, settings.columns)
        } else {
            "slideshow".to_string()
        },
        iterations,
        settings
            .seed
            .map_or_else(|| "(random)".to_string(), |s| s.to_string())
    );
    for (step, update) in plan.iter().enumerate() {
        let name = &images[update.image_index].filename;
        match update.cell {
            Some(cell) => println!("  {:>4}: cell {:>2} <- {}", step + 1, cell, name),
            None => println!("  {:>4}: {}", step + 1, name),
        }
    }
    Ok(())
}

async fn run_session(cfg: &Configuration, images: Library) -> Result<()> {
    let session = SessionController::new();
    session.start().context("failed to start playback session")?;

    let (events_tx, events_rx) = mpsc::channel::<PlaybackEvent>(32); // Sequencer -> Presenter
    let handle = playback::start_playback(&images, cfg.playback(), &session, events_tx)
        .context("failed to start playback")?;

    let cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();

    // Presenter
    tasks.spawn({
        let images = images.clone();
        async move {
            tasks::presenter::run(events_rx, images)
                .await
                .map(|_| ())
                .context("presenter task failed")
        }
    });

    // Keys from stdin
    tasks.spawn({
        let control = handle.control();
        let cancel = cancel.clone();
        async move {
            let stdin = BufReader::new(tokio::io::stdin());
            tasks::keys::run(stdin, control, cancel)
                .await
                .context("key reader failed")
        }
    });

    // Ctrl-C lowers the session flag; the sequencer observes it and stops.
    {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        tracing::warn!("ctrl-c handler failed: {err}");
                        return;
                    }
                    tracing::info!("ctrl-c received; stopping playback");
                    session.request_stop();
                }
            }
        });
    }

    let summary = handle.finished().await?;
    tracing::info!(
        mode = ?summary.mode,
        displayed = summary.displayed,
        reason = ?summary.reason,
        "session finished"
    );
    cancel.cancel();

    // Drain JoinSet (presenter exits on Closed, key reader on cancel)
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}
