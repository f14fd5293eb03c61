//! Layered configuration trait
//!
//! Provides a common trait for option sets that can be loaded from the
//! environment, merged on top of each other and validated before use.

use crate::Result;

/// Trait for option sets that support validation, environment loading and merging
///
/// Implementing this trait provides a consistent API for:
/// - Default (empty) option sets
/// - Validation of the resolved values
/// - Loading from environment variables
/// - Merging multiple configuration sources
///
/// # Example
///
/// ```rust
/// use backo::config::{BackoffConfigBuilder, ConfigBuilder};
///
/// let mut options = BackoffConfigBuilder::new().with_factor(3);
/// options.merge(BackoffConfigBuilder::new().with_jitter(0.5));
///
/// assert_eq!(options.factor, Some(3));
/// assert_eq!(options.jitter, Some(0.5));
/// assert!(options.validate().is_ok());
/// ```
pub trait ConfigBuilder: Default + Clone {
    /// Validate the configuration
    ///
    /// Returns an error if the options cannot be resolved into a usable
    /// configuration.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variable names (e.g., "BACKO_" for BACKO_FACTOR)
    ///
    /// Environment variables follow the pattern `{PREFIX}{FIELD_NAME}` where
    /// FIELD_NAME is the uppercased field name. Unset variables leave the
    /// corresponding option unset.
    fn from_env(prefix: &str) -> Result<Self>;

    /// Merge another configuration into this one
    ///
    /// Options set in `other` overwrite the ones in `self`; options left
    /// unset in `other` are kept.
    ///
    /// Returns self for chaining.
    fn merge(&mut self, other: Self) -> &mut Self;

    /// Load from environment on top of defaults, and validate
    ///
    /// 1. Start from `Self::default()`
    /// 2. Merge values loaded from environment variables
    /// 3. Validate the final result
    fn from_env_with_defaults(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.merge(Self::from_env(prefix)?);
        config.validate()?;
        Ok(config)
    }
}
