//! CLI configuration
//!
//! Collected from command-line flags and their environment fallbacks.

use std::time::Duration;

use acm_ops::{MissingPolicy, SchedulerConfig};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ACM REST API (e.g. "https://cluster/v1")
    pub host: String,

    /// Sleep between scheduler passes that made no progress
    pub idle_backoff: Duration,

    /// How many times a missing task result is looked up before giving up.
    /// `None` keeps asking until the run is cancelled.
    pub result_retries: Option<u32>,

    /// Page size used when polling the tail of an output stream
    pub page_size: u32,

    /// Cancel waits that take longer than this
    pub timeout: Option<Duration>,

    /// Draw a progress counter on stderr while waiting
    pub show_progress: bool,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            anyhow::bail!("host cannot be empty");
        }

        if !self.host.starts_with("http://") && !self.host.starts_with("https://") {
            anyhow::bail!("host must start with http:// or https://");
        }

        if self.idle_backoff.is_zero() {
            anyhow::bail!("idle backoff must be greater than 0");
        }

        if self.page_size == 0 {
            anyhow::bail!("page size must be greater than 0");
        }

        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            idle_backoff: self.idle_backoff,
        }
    }

    /// Policy for result records that are not written yet
    pub fn missing_policy(&self) -> MissingPolicy {
        match self.result_retries {
            Some(attempts) => MissingPolicy::retry_up_to(attempts),
            None => MissingPolicy::retry_forever(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            host: "https://acm.example.com/v1".to_string(),
            idle_backoff: Duration::from_millis(100),
            result_retries: None,
            page_size: 1024,
            timeout: None,
            show_progress: false,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_host_needs_scheme() {
        let mut config = valid_config();
        config.host = "acm.example.com".to_string();
        assert!(config.validate().is_err());

        config.host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = valid_config();
        config.idle_backoff = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_policy_follows_retries() {
        let mut config = valid_config();
        assert_eq!(config.missing_policy(), MissingPolicy::retry_forever());

        config.result_retries = Some(5);
        assert_eq!(config.missing_policy(), MissingPolicy::retry_up_to(5));
        assert_eq!(
            config.scheduler_config().idle_backoff,
            Duration::from_millis(100)
        );
    }
}
