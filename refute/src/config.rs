//! Configuration for the counterexample search.

use crate::context::NOMINAL_SIZE;
use crate::error::ConfigError;

/// Bounds for one counterexample search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of test cases to run.
    pub trials: usize,
    /// Upper bound of the size progression across trials.
    pub size_limit: usize,
    /// Maximum number of committed shrink steps.
    pub shrink_limit: usize,
    /// Maximum number of discarded cases before giving up.
    pub discard_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            trials: 100,
            size_limit: NOMINAL_SIZE,
            shrink_limit: 1000,
            discard_limit: 100,
        }
    }
}

impl Config {
    /// Set the number of trials.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Set the upper bound of the size progression.
    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Set the shrink-step limit.
    pub fn with_shrink_limit(mut self, shrink_limit: usize) -> Self {
        self.shrink_limit = shrink_limit;
        self
    }

    /// Set the discard limit.
    pub fn with_discard_limit(mut self, discard_limit: usize) -> Self {
        self.discard_limit = discard_limit;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::InvalidTrials(self.trials));
        }
        if self.shrink_limit == 0 {
            return Err(ConfigError::InvalidShrinkLimit(self.shrink_limit));
        }
        Ok(())
    }

    /// The size for a given trial: grows linearly toward the size limit.
    pub(crate) fn size_for(&self, trial: usize) -> usize {
        if self.trials <= 1 {
            self.size_limit
        } else {
            (trial * self.size_limit) / self.trials
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.trials, 100);
        assert_eq!(config.size_limit, NOMINAL_SIZE);
        assert_eq!(config.shrink_limit, 1000);
        assert_eq!(config.discard_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = Config::default()
            .with_trials(7)
            .with_size_limit(13)
            .with_shrink_limit(29)
            .with_discard_limit(31);
        assert_eq!(config.trials, 7);
        assert_eq!(config.size_limit, 13);
        assert_eq!(config.shrink_limit, 29);
        assert_eq!(config.discard_limit, 31);
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            Config::default().with_trials(0).validate(),
            Err(ConfigError::InvalidTrials(0))
        );
        assert_eq!(
            Config::default().with_shrink_limit(0).validate(),
            Err(ConfigError::InvalidShrinkLimit(0))
        );
    }

    #[test]
    fn test_size_progression_covers_the_range() {
        let config = Config::default();
        assert_eq!(config.size_for(0), 0);
        assert_eq!(config.size_for(50), 50);
        assert!(config.size_for(99) < config.size_limit);
        assert_eq!(Config::default().with_trials(1).size_for(0), NOMINAL_SIZE);
    }
}
