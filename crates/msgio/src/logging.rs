use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Target of the per-call `writev` events (partial writes, would-block waits).
const TRANSPORT_TARGET: &str = "msgio_transport";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Build the event filter for one run.
///
/// `level` applies to every target. The transport's per-call events are
/// capped at debug unless `targets` names `msgio_transport` explicitly.
pub fn log_filter(level: LogLevel, targets: Option<Targets>) -> Targets {
    let targets = targets.unwrap_or_default();
    let transport_named = targets.iter().any(|(target, _)| target == TRANSPORT_TARGET);

    let mut filter = targets.with_default(level.as_filter());
    if !transport_named {
        filter = filter.with_target(TRANSPORT_TARGET, level.as_filter().min(LevelFilter::DEBUG));
    }
    filter
}

/// Install the stderr subscriber. Stdout carries message bytes and must stay clean.
pub fn init_logging(format: LogFormat, level: LogLevel, targets: Option<Targets>) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);
    let registry = tracing_subscriber::registry().with(log_filter(level, targets));

    match format {
        LogFormat::Text => {
            let _ = registry.with(layer).try_init();
        }
        LogFormat::Json => {
            let _ = registry.with(layer.json()).try_init();
        }
    }
}
