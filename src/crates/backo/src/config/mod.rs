//! Backoff configuration
//!
//! A [`BackoffConfig`] is immutable once built. It is produced by resolving a
//! [`BackoffConfigBuilder`], which holds partially-specified options that can
//! be layered from several sources:
//!
//! - chained `with_*` setters in code
//! - application config files, via `serde`
//! - environment variables (`BACKO_BASE_MS`, `BACKO_FACTOR`, `BACKO_JITTER`, `BACKO_CAP_MS`)
//!
//! Validation happens once, in [`BackoffConfigBuilder::build`].
//!
//! # Example
//!
//! ```rust,ignore
//! use backo::config::{BackoffConfigBuilder, ConfigBuilder, DEFAULT_ENV_PREFIX};
//! use std::time::Duration;
//!
//! // Code defaults, then the service config file, then the environment
//! let mut layered = BackoffConfigBuilder::new().with_cap(Duration::from_secs(30));
//! layered.merge(serde_json::from_str(&file_contents)?);
//! layered.merge(BackoffConfigBuilder::from_env(DEFAULT_ENV_PREFIX)?);
//!
//! let config = layered.build()?;
//! ```

mod builder;
mod env;
mod settings;

pub use builder::ConfigBuilder;
pub use env::{build_env_key, get_env, get_env_parse};
pub use settings::{
    BackoffConfig, BackoffConfigBuilder, DEFAULT_BASE_MS, DEFAULT_CAP_MS, DEFAULT_ENV_PREFIX,
    DEFAULT_FACTOR, DEFAULT_JITTER,
};
