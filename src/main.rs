//! Loggable Demo
//!
//! Runs a handful of instrumented calls against the `tracing` sink so the
//! message formats and the slow-call monitor can be seen in action.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          loggable demo                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │  Inventory   │───▶│ Interceptor  │───▶│ TracingSink  │       │
//! │  │   (calls)    │    │              │    │              │       │
//! │  └──────────────┘    └──────┬───────┘    └──────▲───────┘       │
//! │                             │                   │               │
//! │                      ┌──────▼───────┐    ┌──────┴───────┐       │
//! │                      │ CallRegistry │◀───│   Monitor    │       │
//! │                      └──────────────┘    └──────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::future::join_all;
use once_cell::sync::Lazy;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loggable::classify::FILE_NOT_FOUND;
use loggable::{
    template, CallSite, Error, Interceptor, Invocation, LogLevel, LogSpec, LoggerFormats,
    MonitorConfig, TracingSink, WarnUnit,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Loggable demo - call logging with slow-call warnings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML or JSON file overriding message formats
    #[arg(long, env = "LOGGABLE_FORMATS")]
    formats: Option<PathBuf>,

    /// Period of the slow-call monitor in milliseconds
    #[arg(long, env = "MONITOR_PERIOD_MS", default_value = "1000")]
    monitor_period_ms: u64,

    /// Level the demo calls log at (trace, debug, info, warn, error, fatal, off)
    #[arg(long, env = "CALL_LEVEL", default_value = "info")]
    call_level: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Demo Call Sites
// =============================================================================

const LOOKUP: CallSite = CallSite::new("demo::Inventory", "lookup");
const RESERVE: CallSite = CallSite::new("demo::Inventory", "reserve");
const OPEN_MANIFEST: CallSite = CallSite::new("demo::Inventory", "openManifest");

static SLOW_SPEC: Lazy<Arc<LogSpec>> = Lazy::new(|| {
    Arc::new(
        LogSpec::new(LogLevel::Info)
            .with_entered(true)
            .with_warn_over(1, WarnUnit::Seconds),
    )
});

static QUIET_MISSING_SPEC: Lazy<Arc<LogSpec>> = Lazy::new(|| {
    Arc::new(
        LogSpec::new(LogLevel::Debug)
            .with_name("demo.manifests")
            .with_ignore(&FILE_NOT_FOUND),
    )
});

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    info!("Starting Loggable demo");
    info!("  Monitor period: {} ms", args.monitor_period_ms);
    info!("  Call level: {}", args.call_level);

    if args.monitor_period_ms == 0 {
        return Err(Error::Config("monitor period must be positive".to_string()).into());
    }
    let call_level: LogLevel = args.call_level.parse()?;

    if let Some(path) = &args.formats {
        info!("  Formats file: {}", path.display());
        template::install(LoggerFormats::from_file(path)?)?;
    }

    let interceptor = Interceptor::new(Arc::new(TracingSink));

    let monitor = interceptor.monitor(MonitorConfig {
        period: Duration::from_millis(args.monitor_period_ms),
    });
    let monitor_handle = monitor.spawn()?;

    // Fast call at the requested level
    let lookup = Invocation::new(LOOKUP, Arc::new(LogSpec::new(call_level)))
        .with_args(loggable::call_args!["sku-1042", Some(3u32)]);
    let stock: Result<Vec<u32>, std::io::Error> =
        interceptor.intercept(&lookup, || Ok(vec![12, 0, 7]));
    info!("Stock levels: {:?}", stock?);

    // Concurrent slow calls, watched by the monitor
    let reservations = (1..=3u64).map(|n| {
        let interceptor = interceptor.clone();
        async move {
            let invocation = Invocation::new(RESERVE, Arc::clone(&SLOW_SPEC))
                .with_args(loggable::call_args![format!("order-{}", n), n]);
            interceptor
                .intercept_async(&invocation, async {
                    tokio::time::sleep(Duration::from_millis(800 * n)).await;
                    Ok::<_, std::io::Error>(n * 100)
                })
                .await
        }
    });
    let reserved: Vec<u64> = join_all(reservations)
        .await
        .into_iter()
        .collect::<std::result::Result<Vec<_>, std::io::Error>>()?;
    info!("Reserved: {:?}", reserved);

    // Ignored error: logged without its trace
    let manifest = Invocation::new(OPEN_MANIFEST, Arc::clone(&QUIET_MISSING_SPEC))
        .with_args(loggable::call_args!["/var/lib/demo/manifest.yaml"]);
    let opened: Result<String, std::io::Error> = interceptor.intercept(&manifest, || {
        std::fs::read_to_string("/var/lib/demo/manifest.yaml")
    });
    if let Err(e) = opened {
        info!("Manifest not available: {}", e);
    }

    monitor.shutdown();
    monitor_handle
        .join()
        .map_err(|_| anyhow::anyhow!("warning monitor thread panicked"))?;

    info!(
        "Demo finished, {} in-flight warnings emitted",
        monitor.warnings_emitted()
    );
    Ok(())
}

// =============================================================================
// Logging
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
