//! Backoff configuration and its builder

use super::builder::ConfigBuilder;
use super::env::{build_env_key, get_env_parse};
use crate::{BackoError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Initial backoff in milliseconds
pub const DEFAULT_BASE_MS: u64 = 100;

/// Multiplier applied per attempt
pub const DEFAULT_FACTOR: u32 = 2;

/// No jitter
pub const DEFAULT_JITTER: f64 = 0.0;

/// Unbounded: the largest representable backoff
pub const DEFAULT_CAP_MS: u64 = u64::MAX;

/// Prefix used when loading options from the environment
pub const DEFAULT_ENV_PREFIX: &str = "BACKO_";

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Resolved, validated backoff configuration
///
/// Instances can only be obtained through [`BackoffConfig::new`],
/// [`BackoffConfigBuilder::build`] or `Default`, so `cap >= base` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackoffConfig {
    base_ms: u64,
    factor: u32,
    jitter: f64,
    cap_ms: u64,
}

impl BackoffConfig {
    /// Create a validated configuration from explicit values
    ///
    /// # Errors
    ///
    /// Returns [`BackoError::InvalidConfiguration`] if `cap` is less than `base`.
    pub fn new(base: Duration, factor: u32, jitter: f64, cap: Duration) -> Result<Self> {
        BackoffConfigBuilder::new()
            .with_base(base)
            .with_factor(factor)
            .with_jitter(jitter)
            .with_cap(cap)
            .build()
    }

    /// Start a builder with every option unset
    pub fn builder() -> BackoffConfigBuilder {
        BackoffConfigBuilder::new()
    }

    /// Load options from `{prefix}BASE_MS`, `{prefix}FACTOR`, `{prefix}JITTER`
    /// and `{prefix}CAP_MS`, fill the rest with defaults, and validate
    pub fn from_env(prefix: &str) -> Result<Self> {
        BackoffConfigBuilder::from_env_with_defaults(prefix)?.build()
    }

    /// Initial backoff
    pub fn base(&self) -> Duration {
        Duration::from_millis(self.base_ms)
    }

    pub fn base_millis(&self) -> u64 {
        self.base_ms
    }

    /// Growth factor per attempt
    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Fraction of the raw backoff that may be randomly added or removed
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Maximum backoff
    pub fn cap(&self) -> Duration {
        Duration::from_millis(self.cap_ms)
    }

    pub fn cap_millis(&self) -> u64 {
        self.cap_ms
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: DEFAULT_BASE_MS,
            factor: DEFAULT_FACTOR,
            jitter: DEFAULT_JITTER,
            cap_ms: DEFAULT_CAP_MS,
        }
    }
}

/// Partially-specified backoff options
///
/// Every field is optional so that several sources can be layered with
/// [`ConfigBuilder::merge`]. Unset fields fall back to the defaults when the
/// options are resolved by [`build`](BackoffConfigBuilder::build).
///
/// The field names double as the serialized keys:
///
/// ```rust
/// use backo::BackoffConfigBuilder;
///
/// let options: BackoffConfigBuilder =
///     serde_json::from_str(r#"{ "base_ms": 250, "jitter": 0.5 }"#).unwrap();
/// let config = options.build().unwrap();
///
/// assert_eq!(config.base_millis(), 250);
/// assert_eq!(config.factor(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffConfigBuilder {
    /// Initial backoff in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ms: Option<u64>,

    /// Growth factor per attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<u32>,

    /// Jitter fraction, 0 disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,

    /// Maximum backoff in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_ms: Option<u64>,
}

impl BackoffConfigBuilder {
    /// Create an empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial backoff. Defaults to 100ms.
    ///
    /// Sub-millisecond precision is truncated.
    pub fn with_base(mut self, base: Duration) -> Self {
        self.base_ms = Some(duration_to_millis(base));
        self
    }

    pub fn with_base_millis(mut self, millis: u64) -> Self {
        self.base_ms = Some(millis);
        self
    }

    /// Set the backoff factor. Defaults to 2.
    pub fn with_factor(mut self, factor: u32) -> Self {
        self.factor = Some(factor);
        self
    }

    /// Set the jitter fraction. Defaults to 0, which disables jitter.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Set the maximum backoff. Defaults to the largest representable duration.
    pub fn with_cap(mut self, cap: Duration) -> Self {
        self.cap_ms = Some(duration_to_millis(cap));
        self
    }

    pub fn with_cap_millis(mut self, millis: u64) -> Self {
        self.cap_ms = Some(millis);
        self
    }

    /// Resolve the options into a [`BackoffConfig`]
    ///
    /// # Errors
    ///
    /// Returns [`BackoError::InvalidConfiguration`] if the resolved cap is
    /// less than the resolved base.
    pub fn build(&self) -> Result<BackoffConfig> {
        let base_ms = self.base_ms.unwrap_or(DEFAULT_BASE_MS);
        let cap_ms = self.cap_ms.unwrap_or(DEFAULT_CAP_MS);

        if cap_ms < base_ms {
            debug!(base_ms, cap_ms, "Rejecting backoff configuration");
            return Err(BackoError::InvalidConfiguration(format!(
                "initial backoff ({}ms) cannot be more than maximum ({}ms)",
                base_ms, cap_ms
            )));
        }

        Ok(BackoffConfig {
            base_ms,
            factor: self.factor.unwrap_or(DEFAULT_FACTOR),
            jitter: self.jitter.unwrap_or(DEFAULT_JITTER),
            cap_ms,
        })
    }
}

impl ConfigBuilder for BackoffConfigBuilder {
    fn validate(&self) -> Result<()> {
        self.build().map(|_| ())
    }

    fn from_env(prefix: &str) -> Result<Self> {
        Ok(Self {
            base_ms: get_env_parse(&build_env_key(prefix, "base_ms"))?,
            factor: get_env_parse(&build_env_key(prefix, "factor"))?,
            jitter: get_env_parse(&build_env_key(prefix, "jitter"))?,
            cap_ms: get_env_parse(&build_env_key(prefix, "cap_ms"))?,
        })
    }

    fn merge(&mut self, other: Self) -> &mut Self {
        if other.base_ms.is_some() {
            self.base_ms = other.base_ms;
        }
        if other.factor.is_some() {
            self.factor = other.factor;
        }
        if other.jitter.is_some() {
            self.jitter = other.jitter;
        }
        if other.cap_ms.is_some() {
            self.cap_ms = other.cap_ms;
        }
        self
    }
}

impl From<BackoffConfig> for BackoffConfigBuilder {
    fn from(config: BackoffConfig) -> Self {
        Self {
            base_ms: Some(config.base_ms),
            factor: Some(config.factor),
            jitter: Some(config.jitter),
            cap_ms: Some(config.cap_ms),
        }
    }
}
