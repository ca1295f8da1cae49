// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{TracingConfig, WriterConfig, rolling_file_appender_impl};
use miette::IntoDiagnostic;
use tracing_core::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt, registry::LookupSpan,
                         util::SubscriberInitExt};

/// Type alias for a boxed layer.
pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Returns the layers, or [`None`] when `tracing_config` turns logging off. This does
/// not initialize the tracing system, see [`TracingConfig::install_global()`] for that.
///
/// # Errors
///
/// If the log file can't be created.
pub fn try_create_layers(
    tracing_config: &TracingConfig,
) -> miette::Result<Option<Vec<Box<DynLayer<tracing_subscriber::Registry>>>>> {
    if !tracing_config.is_enabled() {
        return Ok(None);
    }

    let mut return_it: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];

    // Set the level filter from the tracing configuration. This is needed if you add
    // more layers which don't have a level filter.
    return_it.push(Box::new(tracing_config.level_filter));

    if let Some(layer) = try_create_writer_layer(
        tracing_config.level_filter,
        &tracing_config.writer_config,
    )? {
        return_it.push(layer);
    }

    Ok(Some(return_it))
}

/// This erases the concrete type of the writer, and returns a boxed layer.
///
/// # Errors
///
/// If the log file can't be created.
pub fn try_create_writer_layer<S>(
    level_filter: LevelFilter,
    writer_config: &WriterConfig,
) -> miette::Result<Option<Box<DynLayer<S>>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    Ok(match writer_config {
        WriterConfig::None => None,
        WriterConfig::Stderr => Some(Box::new(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(level_filter),
        )),
        WriterConfig::File(path) => {
            let file = rolling_file_appender_impl::try_create(path.as_str())?;
            Some(Box::new(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(file)
                    .with_filter(level_filter),
            ))
        }
    })
}

impl TracingConfig {
    /// Installs the layers as the global default subscriber. Does nothing when logging
    /// is turned off.
    ///
    /// # Errors
    ///
    /// If the log file can't be created, or a global subscriber is already set.
    pub fn install_global(&self) -> miette::Result<()> {
        let Some(layers) = try_create_layers(self)? else {
            return Ok(());
        };
        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .into_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn off_creates_nothing() {
        assert!(try_create_layers(&TracingConfig::default()).unwrap().is_none());
        let no_writer = TracingConfig {
            writer_config: WriterConfig::None,
            level_filter: LevelFilter::DEBUG,
        };
        assert!(try_create_layers(&no_writer).unwrap().is_none());
        let off = TracingConfig::new_stderr(LevelFilter::OFF);
        assert!(try_create_layers(&off).unwrap().is_none());
    }

    #[test]
    fn stderr_layers() {
        let layers = try_create_layers(&TracingConfig::new_stderr(LevelFilter::DEBUG))
            .unwrap()
            .unwrap();
        assert_eq!(layers.len(), 2);
    }

    #[test]
    fn file_layers_create_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("rawterm_events.log");
        let file_path = file_path.to_str().unwrap().to_string();

        let config = TracingConfig::new_file(file_path.clone(), LevelFilter::TRACE);
        let layers = try_create_layers(&config).unwrap().unwrap();

        assert_eq!(layers.len(), 2);
        assert!(std::path::Path::new(&file_path).exists());
    }
}
