//! Resilience patterns for production deployment
//!
//! Provides robust error handling and recovery mechanisms:
//! - Exponential backoff for retries
//! - A kill switch to halt trading on repeated failures
//! - A panic hook that logs before the process aborts

pub mod backoff;
pub mod kill_switch;
pub mod panic;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use kill_switch::{KillSwitch, KillSwitchState};
pub use panic::install_panic_handler;
