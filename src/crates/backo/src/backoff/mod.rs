//! Backoff computation and waiting
//!
//! This module provides:
//! - [`BackoffCalculator`], a pure function from attempt number to delay
//! - [`CancelToken`] and [`BackoffCalculator::wait_for`], which suspend the
//!   calling task for that delay unless cancelled
//!
//! The calculator never runs the retry loop; callers keep their own.
//!
//! # Example
//!
//! ```rust,ignore
//! use backo::{BackoffCalculator, BackoffConfig, CancelToken};
//! use std::time::Duration;
//!
//! async fn fetch_with_retry(shutdown: CancelToken) -> backo::Result<String> {
//!     let backoff = BackoffCalculator::new(
//!         BackoffConfig::builder()
//!             .with_base(Duration::from_millis(50))
//!             .with_jitter(0.5)
//!             .with_cap(Duration::from_secs(5))
//!             .build()?,
//!     );
//!
//!     let mut attempt = 0;
//!     loop {
//!         match fetch().await {
//!             Ok(body) => return Ok(body),
//!             Err(_) => {
//!                 // Returns BackoError::Cancelled if shutdown fires first
//!                 backoff.wait_for(attempt, &shutdown).await?;
//!                 attempt += 1;
//!             }
//!         }
//!     }
//! }
//! ```

mod calculator;
mod wait;

pub use calculator::BackoffCalculator;
pub use wait::CancelToken;
