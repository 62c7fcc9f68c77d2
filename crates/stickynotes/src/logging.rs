//! Logging for stickynotes.
//!
//! Log lines go to stderr. Stdout belongs to the JSON-lines channel while
//! `stickies serve` runs, so nothing else may write there.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How chatty the note service is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Note lifecycle and window changes.
    #[default]
    Normal,
    /// Every request and event delivery.
    Verbose,
    /// Everything, including SQL from dependencies.
    Trace,
}

impl Verbosity {
    /// Map the `-v` count and `-q` flag. Quiet wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directives(self) -> String {
        let (ours, deps) = match self {
            Self::Quiet => ("error", "error"),
            Self::Normal => ("info", "warn"),
            Self::Verbose => ("debug", "warn"),
            Self::Trace => ("trace", "debug"),
        };
        format!("{deps},stickynotes={ours},stickies={ours}")
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `verbosity`.
///
/// ```no_run
/// use stickynotes::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbosity == Verbosity::Trace),
    );

    // A second call keeps the first subscriber
    let _ = subscriber.try_init();
}
