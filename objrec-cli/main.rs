use clap::Parser;
use objrec_cli::{annotate, init_thread_pool, period_from_hz, DirectorySource, LocatorConfig, Node, ObjectLocator};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "objrec", about = "Locate a planar reference object in a stream of frames")]
struct Cli {
    /// Calibration image of the object
    #[arg(long)]
    calibration: PathBuf,

    /// Directory of frames, replayed in name order
    #[arg(long)]
    frames: PathBuf,

    /// Locator configuration (.toml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write annotated frames into this directory
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Frame arrival rate of the replay
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Override the polling rate from the configuration
    #[arg(long)]
    tick_hz: Option<f64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run(Cli::parse()) {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = match &cli.config {
        Some(path) => LocatorConfig::load(path)?,
        None => LocatorConfig::default(),
    };
    if let Some(tick_hz) = cli.tick_hz {
        config.node.tick_hz = tick_hz;
    }
    config.validate()?;

    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    let frame_interval = period_from_hz(cli.fps).map_err(|err| format!("--fps: {}", err))?;

    tracing::info!("{}", config.summary());
    init_thread_pool(config.features.n_threads)?;

    let t0 = Instant::now();
    let locator = ObjectLocator::open(&cli.calibration, &config)?;
    tracing::info!(
        keypoints = locator.reference().features().len(),
        elapsed = ?t0.elapsed(),
        "calibration image {} loaded",
        cli.calibration.display()
    );

    let source = DirectorySource::open(&cli.frames)?;
    if source.is_empty() {
        tracing::warn!("no image files in {}", cli.frames.display());
    }
    if let Some(dir) = &cli.annotate {
        std::fs::create_dir_all(dir)?;
    }

    let node = Node::new(locator, config.node.tick_hz)?;
    let t0 = Instant::now();
    let stats = node.run(source, frame_interval, |processed| {
        let Some(dir) = &cli.annotate else {
            return;
        };
        let name = PathBuf::from(&processed.source)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());
        let out = dir.join(format!("{}_located.png", name));
        if let Err(err) = annotate(&processed.frame, &processed.localization).save(&out) {
            tracing::warn!(path = %out.display(), %err, "failed to save annotated frame");
        }
    });

    println!("Time taken: {:.2?}", t0.elapsed());
    println!("{}", stats);
    Ok(())
}
