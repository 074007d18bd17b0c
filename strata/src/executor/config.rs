/// Default number of nodes of one level run at the same time.
const DEFAULT_MAX_CONCURRENCY: usize = 1;

/// Knobs shared by the forward and rollback executors
///
/// ```
/// use strata::executor::ExecutorConfig;
///
/// let config = ExecutorConfig::default().with_max_concurrency(4);
/// assert_eq!(config.max_concurrency(), 4);
/// assert!(!config.dry_run());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    max_concurrency: usize,
    dry_run: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            dry_run: false,
        }
    }
}

impl ExecutorConfig {
    /// Runs up to `max` nodes of a level concurrently (0 is treated as 1).
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Walks the plan without invoking tasks or writing history; nodes that
    /// would run are reported as skipped.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}
