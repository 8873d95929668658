//! grouplog demo application.
//!
//! Loads a cascade of configuration documents (or the fallback topology),
//! reports the outcome and emits a few records through a logger.
//!
//! ```text
//! grouplog [CONFIG...] [--group G] [--watch] [--metrics-address ADDR]
//!     → CascadingConfigurator::from_paths | FallbackConfigurator
//!     → LoggingSystem::configure → exit 1 on error
//!     → demo records on logger "demo"
//!     → --watch: hot reload until Ctrl-C
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grouplog::config::watcher::{reload_loop, ConfigWatcher};
use grouplog::{
    log_debug, log_info, log_trace, log_warn, CascadingConfigurator, Configurator,
    FallbackConfigurator, Level, LoggingSystem,
};

#[derive(Parser, Debug)]
#[command(name = "grouplog")]
#[command(about = "Demo application for group-based logging", long_about = None)]
struct Args {
    /// Configuration documents (.toml/.json); later files override earlier ones
    configs: Vec<PathBuf>,

    /// Root level of the fallback topology when no document is given
    #[arg(long, default_value = "info")]
    fallback_level: Level,

    /// Colored console output for the fallback topology
    #[arg(long)]
    color: bool,

    /// Group the demo logger is bound to
    #[arg(long, default_value = "*")]
    group: String,

    /// Reload the documents when they change, until Ctrl-C
    #[arg(long)]
    watch: bool,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grouplog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Some(addr) = args.metrics_address {
        grouplog::observability::metrics::init_metrics(addr);
    }

    let configurator: Box<dyn Configurator> = if args.configs.is_empty() {
        Box::new(
            FallbackConfigurator::new()
                .with_level(args.fallback_level)
                .with_color(args.color),
        )
    } else {
        match CascadingConfigurator::from_paths(&args.configs) {
            Ok(cascade) => Box::new(cascade),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    };

    let system = Arc::new(LoggingSystem::new());
    let result = system.configure(configurator.as_ref());
    println!("{}", result.message);
    if result.has_error {
        std::process::exit(1);
    }

    let logger = system.get_logger("demo", &args.group)?;
    tracing::info!(
        group = %logger.group(),
        level = %logger.effective_level(),
        sink = %logger.effective_sink(),
        "Demo logger bound"
    );

    log_info!(logger, "grouplog v{} started", env!("CARGO_PKG_VERSION"));
    log_warn!(logger, "bound to group '{}'", logger.group());
    log_debug!(logger, "topology: {}", describe(&system));
    log_trace!(logger, "loggers: {:?}", system.loggers());

    if args.watch && !args.configs.is_empty() {
        let (watcher, updates) = ConfigWatcher::new(&args.configs);
        let _watcher = watcher.run()?;
        tokio::spawn(reload_loop(system.clone(), updates));

        let mut ticker = tokio::time::interval(Duration::from_secs(2));
        let mut beat = 0u64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    beat += 1;
                    for level in Level::ALL.iter().copied().filter(|l| *l != Level::Off) {
                        logger.log_with(level, || format!("heartbeat {} at {}", beat, level));
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
    }

    let stats = system.delivery_stats();
    if stats.failures > 0 {
        tracing::warn!(
            failures = stats.failures,
            last_error = ?stats.last_error,
            "Some records could not be delivered"
        );
    }

    system.shutdown();
    Ok(())
}

fn describe(system: &LoggingSystem) -> String {
    match system.topology() {
        Some(topology) => format!(
            "root '{}', {} groups, {} sinks",
            topology.root_name(),
            topology.groups().len(),
            topology.sinks().len()
        ),
        None => "inactive".to_string(),
    }
}
