use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use announcer::config::{Config, ConfigError, ConfigHandle, Snapshot};
use announcer::directory::RosterDirectory;
use announcer::dispatch::ConsoleTransport;
use announcer::format::{self, LegacyFormatter, TextFormatter};
use announcer::metrics;
use announcer::scheduler::{
    CycleScheduler, RotationIndex, Select, Selector, TickDriver, TickEvent,
};

#[derive(Parser)]
#[command(
    name = "announcer",
    version,
    about = "Rotating per-server announcements for multi-backend proxies",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the config file's setting
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration file
    Check {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Render one announcement by name
        #[arg(long)]
        show: Option<String>,
    },

    /// Show which announcements destinations would receive
    Preview {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Destination to preview (repeatable)
        #[arg(short, long = "destination", required = true)]
        destinations: Vec<String>,

        /// Number of cycles to simulate
        #[arg(short = 'n', long, default_value = "10")]
        cycles: usize,

        /// Seed for random selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the scheduler against a roster, logging deliveries
    Run {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Roster file with connected users
        #[arg(short, long)]
        roster: PathBuf,

        /// Tick period in milliseconds
        #[arg(long, default_value = "1000")]
        tick_ms: u64,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Print Prometheus metrics on exit
        #[arg(long, default_value = "false")]
        metrics: bool,
    },
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Self::Check { config, .. }
            | Self::Preview { config, .. }
            | Self::Run { config, .. } => {
                config
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.command.config_path();
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Check { config: path, show } => {
            tracing::info!(path = %path.display(), show = ?show, "Starting check command");
            check(&config, show.as_deref())?;
        }

        Commands::Preview {
            destinations,
            cycles,
            seed,
            ..
        } => {
            tracing::info!(
                destinations = ?destinations,
                cycles = %cycles,
                seed = ?seed,
                "Starting preview command"
            );
            preview(&config, &destinations, cycles, seed);
        }

        Commands::Run {
            config: path,
            roster,
            tick_ms,
            ticks,
            metrics,
        } => {
            tracing::info!(
                config = %path.display(),
                roster = %roster.display(),
                tick_ms = %tick_ms,
                ticks = ?ticks,
                "Starting run command"
            );
            run(config, path, roster, tick_ms, ticks, metrics).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let directives = if verbose {
        "announcer=debug,info".to_string()
    } else {
        format!("announcer={level},warn")
    };
    let env_filter = tracing_subscriber::EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log level '{level}'"))?;

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

fn check(config: &Config, show: Option<&str>) -> announcer::Result<()> {
    let snapshot = Snapshot::from_config(config);
    let settings = &snapshot.settings;

    println!("Configuration OK");
    println!("  Delay: {} ticks", settings.delay);
    println!("  Method: {}", settings.method);
    println!("  Display: {}", settings.display);
    println!("  Announcements: {}", snapshot.catalog.len());

    for announcement in snapshot.catalog.iter() {
        let destinations: Vec<&str> = announcement
            .destinations
            .iter()
            .map(String::as_str)
            .collect();
        println!("    {:<24} {}", announcement.name, destinations.join(", "));
    }

    let warnings = snapshot.catalog.warnings();
    if !warnings.is_empty() {
        println!(
            "  Pattern warnings ({} invalid pattern(s)):",
            snapshot.catalog.invalid_patterns()
        );
        for warning in warnings {
            println!("    {warning}");
        }
    }

    match show {
        Some(name) => show_announcement(&snapshot, name),
        None => Ok(()),
    }
}

/// Render one announcement the way a cycle would
fn show_announcement(snapshot: &Snapshot, name: &str) -> announcer::Result<()> {
    let announcement = snapshot
        .catalog
        .find(name)
        .ok_or_else(|| ConfigError::invalid("show", format!("no announcement named '{name}'")))?;

    let formatter = LegacyFormatter::new();
    let prefix = formatter.colorize(&snapshot.settings.prefix);
    let rendered = format::render(&formatter, &prefix, &announcement.text);

    let kind = if announcement.looks_like_rich_text() {
        "json component"
    } else {
        "legacy text"
    };
    println!();
    println!("  {} ({kind})", announcement.name);
    println!("    {}", rendered.message.plain_text());

    match rendered.fallback {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn preview(config: &Config, destinations: &[String], cycles: usize, seed: Option<u64>) {
    let snapshot = Snapshot::from_config(config);
    let mut selector = match seed {
        Some(seed) => Selector::with_seed(seed),
        None => Selector::new(),
    };
    let mut cursors = RotationIndex::new();

    println!(
        "Preview: {} cycle(s), method {}",
        cycles, snapshot.settings.method
    );

    for cycle in 1..=cycles {
        let picks: Vec<String> = destinations
            .iter()
            .map(|destination| {
                cursors.observe(destination);
                let name = selector
                    .select_for(
                        destination,
                        &snapshot.catalog,
                        snapshot.settings.method,
                        &mut cursors,
                    )
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| "-".to_string());
                format!("{destination}={name}")
            })
            .collect();

        println!("  {cycle:>3}: {}", picks.join("  "));
    }
}

async fn run(
    config: Config,
    config_path: PathBuf,
    roster_path: PathBuf,
    tick_ms: u64,
    ticks: Option<u64>,
    print_metrics: bool,
) -> announcer::Result<()> {
    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    let roster = Arc::new(RosterDirectory::from_file(&roster_path)?);
    let handle = ConfigHandle::new(&config);
    for warning in handle.load().catalog.warnings() {
        tracing::warn!(%warning, "Announcement pattern will never match");
    }

    let transport = ConsoleTransport::new().with_directory(roster.clone());
    let mut scheduler = CycleScheduler::new(
        handle.clone(),
        roster,
        Arc::new(LegacyFormatter::new()),
        Arc::new(transport),
    );

    let driver = TickDriver::new(Duration::from_millis(tick_ms))?;
    let mut events = driver.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TickEvent::CycleFired(report)) => println!("{report}"),
                Ok(TickEvent::Stopped { ticks }) => {
                    tracing::info!(ticks, "Scheduler stopped");
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Cycle report listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    #[cfg(unix)]
    let reloader = spawn_reload_on_hangup(handle, config_path)?;
    #[cfg(not(unix))]
    let _ = (handle, config_path);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let total = driver.run(&mut scheduler, ticks, shutdown).await;
    drop(driver);

    if let Err(e) = listener.await {
        tracing::error!(error = %e, "Cycle report listener panicked");
    }

    #[cfg(unix)]
    reloader.abort();

    println!("Stopped after {total} tick(s)");

    if print_metrics && metrics::metrics_initialized() {
        match metrics::gather_metrics() {
            Ok(text) => print!("{text}"),
            Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
        }
    }

    Ok(())
}

/// Wait before retrying a reload whose file could not be read
#[cfg(unix)]
const RELOAD_RETRY_DELAY: Duration = Duration::from_millis(250);

#[cfg(unix)]
fn spawn_reload_on_hangup(
    handle: ConfigHandle,
    path: PathBuf,
) -> announcer::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            let mut result = handle.reload_from_file(&path);

            // Editors often replace the file in two steps
            if let Err(e) = &result {
                if e.is_recoverable() {
                    tracing::warn!(error = %e, "Reload failed, retrying once");
                    tokio::time::sleep(RELOAD_RETRY_DELAY).await;
                    result = handle.reload_from_file(&path);
                }
            }

            match result {
                Ok(warnings) => {
                    for warning in warnings {
                        tracing::warn!(%warning, "Announcement pattern will never match");
                    }
                }
                Err(e) => {
                    tracing::error!(
                        category = e.category().as_str(),
                        error = %e,
                        "Reload failed, keeping current configuration"
                    );
                }
            }
        }
    }))
}
