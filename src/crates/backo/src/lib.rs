//! Full-jitter exponential backoff
//!
//! This crate computes how long a caller should wait before retrying a
//! failed operation. It does not run the retry loop itself.
//!
//! # Modules
//!
//! - `config` - Immutable backoff configuration, layered builder and environment loading
//! - `backoff` - The calculator and its cancellable wait
//! - `logging` - Formatting helpers used by log output
//!
//! # Example
//!
//! ```rust
//! use backo::{BackoffCalculator, BackoffConfig};
//! use std::time::Duration;
//!
//! let config = BackoffConfig::builder()
//!     .with_base(Duration::from_millis(100))
//!     .with_factor(2)
//!     .with_cap(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! let backoff = BackoffCalculator::new(config);
//! assert_eq!(backoff.compute(3), Duration::from_millis(800));
//! ```

pub mod backoff;
pub mod config;
pub mod logging;

pub use backoff::{BackoffCalculator, CancelToken};
pub use config::{BackoffConfig, BackoffConfigBuilder, ConfigBuilder};

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the backo crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackoError {
    /// Configuration rejected while it was being resolved
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A wait was cancelled before the backoff elapsed
    #[error("Backoff for attempt {attempt} cancelled after {elapsed:?}")]
    Cancelled {
        /// Attempt the wait was computed for
        attempt: u32,
        /// Time spent waiting before the cancellation was observed
        elapsed: Duration,
    },
}

impl BackoError {
    /// Whether this error is a cancellation rather than a configuration failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BackoError::Cancelled { .. })
    }
}

/// Result type for backo operations
pub type Result<T> = std::result::Result<T, BackoError>;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
