//! Configuration for the builtin classes

use std::fmt;
use std::sync::Arc;

use crate::sink::{SharedSink, StdoutSink};

/// Settings the catalog builds its classes with
///
/// The defaults match a normal VM launch: console output goes to the
/// process's stdout and random generators seed themselves from the clock.
#[derive(Clone)]
pub struct StdlibOptions {
    /// Sink behind `System.out`
    pub stdout: SharedSink,
    /// Fixed seed for `new Random()`; `None` seeds from the clock
    pub random_seed: Option<u64>,
}

impl StdlibOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `System.out` to `sink`
    pub fn with_stdout(mut self, sink: SharedSink) -> Self {
        self.stdout = sink;
        self
    }

    /// Make every `new Random()` start from `seed`
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

impl Default for StdlibOptions {
    fn default() -> Self {
        Self {
            stdout: Arc::new(StdoutSink),
            random_seed: None,
        }
    }
}

impl fmt::Debug for StdlibOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdlibOptions")
            .field("stdout", &self.stdout.name())
            .field("random_seed", &self.random_seed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{same_sink, CaptureSink};

    #[test]
    fn test_defaults() {
        let options = StdlibOptions::default();
        assert_eq!(options.stdout.name(), "stdout");
        assert_eq!(options.random_seed, None);
    }

    #[test]
    fn test_builder_setters() {
        let sink: SharedSink = CaptureSink::shared();
        let options = StdlibOptions::new()
            .with_stdout(Arc::clone(&sink))
            .with_random_seed(7);
        assert!(same_sink(&options.stdout, &sink));
        assert_eq!(options.random_seed, Some(7));
    }
}
