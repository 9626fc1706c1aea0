use std::{fs::File, path::Path, sync::Arc};

use tracing::{subscriber, trace, Level};
use tracing_subscriber::{
    fmt::{
        format::{Compact, DefaultFields, Format, Json, JsonFields, Pretty},
        SubscriberBuilder,
    },
    EnvFilter, FmtSubscriber,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Info,
    Debug,
    Trace,
}

impl From<u8> for Verbosity {
    fn from(v: u8) -> Self {
        match v {
            0 => Verbosity::Info,
            1 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }
}

impl From<Verbosity> for Level {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Info => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Trace => Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    Full,
    Json,
    Compact,
}

fn standard_fmt(level: Level) -> SubscriberBuilder {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
}

fn compact_fmt(level: Level) -> SubscriberBuilder<DefaultFields, Format<Compact>> {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
}

fn full_fmt(level: Level) -> SubscriberBuilder<Pretty, Format<Pretty>> {
    standard_fmt(level).pretty()
}

fn json_fmt(level: Level) -> SubscriberBuilder<JsonFields, Format<Json>> {
    standard_fmt(level).json().flatten_event(true)
}

fn open_log_file(path: Option<&Path>) -> Option<Arc<File>> {
    let path = path?;
    match File::create(path) {
        Ok(file) => Some(Arc::new(file)),
        Err(err) => {
            eprintln!("Failed to create log file {}: {err}", path.display());
            None
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable, or to `log_file` when it can be created.
pub fn log(verbosity: Verbosity, mode: LoggingMode, log_file: Option<&Path>) -> anyhow::Result<()> {
    let level: Level = verbosity.into();
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env()?;
    let file = open_log_file(log_file);

    macro_rules! install {
        ($builder:expr) => {{
            let builder = $builder.with_env_filter(env_filter);
            match file {
                Some(file) => subscriber::set_global_default(builder.with_writer(file).with_ansi(false).finish()),
                None => subscriber::set_global_default(builder.with_writer(std::io::stderr).finish()),
            }
        }};
    }

    match mode {
        LoggingMode::Compact => install!(compact_fmt(level)),
        LoggingMode::Json => install!(json_fmt(level)),
        LoggingMode::Full => install!(full_fmt(level)),
    }?;
    trace!(set_level = %level, "log level set");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_debug_count() {
        assert_eq!(Verbosity::from(0), Verbosity::Info);
        assert_eq!(Verbosity::from(1), Verbosity::Debug);
        assert_eq!(Verbosity::from(7), Verbosity::Trace);
        assert_eq!(Level::from(Verbosity::Debug), Level::DEBUG);
    }
}
