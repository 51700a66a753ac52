use thiserror::Error;

/// Configuration for the inverse kinematics solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    square_error_threshold: f64,
    max_iters: usize,
    log_interval: usize,
    scale: f64,
}

/// Errors that can occur when validating an inverse kinematics config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("square_error_threshold must be finite and non-negative")]
    Threshold,

    #[error("log_interval must be at least 1")]
    LogInterval,

    #[error("scale must be finite and non-zero")]
    Scale,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(1e-6, 20, usize::MAX, 1.0).unwrap()
    }
}

impl Config {
    /// Creates a new validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold is negative or non-finite, if the
    /// log interval is zero, or if the scale is zero or non-finite.
    pub fn new(
        square_error_threshold: f64,
        max_iters: usize,
        log_interval: usize,
        scale: f64,
    ) -> Result<Self, ConfigError> {
        if !square_error_threshold.is_finite() || square_error_threshold < 0.0 {
            return Err(ConfigError::Threshold);
        }
        if log_interval == 0 {
            return Err(ConfigError::LogInterval);
        }
        if !scale.is_finite() || scale == 0.0 {
            return Err(ConfigError::Scale);
        }

        Ok(Self {
            square_error_threshold,
            max_iters,
            log_interval,
            scale,
        })
    }

    /// Returns a copy with a different iteration budget.
    #[must_use]
    pub fn with_max_iters(self, max_iters: usize) -> Self {
        Self { max_iters, ..self }
    }

    /// Returns the squared pose error below which the solver has converged.
    #[must_use]
    pub fn square_error_threshold(&self) -> f64 {
        self.square_error_threshold
    }

    /// Returns the maximum number of Newton updates.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns how many iterations separate two progress log events.
    #[must_use]
    pub fn log_interval(&self) -> usize {
        self.log_interval
    }

    /// Returns the factor applied to every Newton update.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }
}
