//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! On demand (checker.rs):
//!     Forwarder / Discovery API
//!     → probe base_address + health_check_path
//!     → classify (200 in time = healthy)
//!     → write back to registry
//!
//! Background (active.rs, optional):
//!     Periodic timer
//!     → check_all
//! ```
//!
//! # Design Decisions
//! - Single probe decides: no hysteresis thresholds
//! - Timeouts and connection errors are unhealthy outcomes, not errors

pub mod active;
pub mod checker;

pub use active::HealthMonitor;
pub use checker::{HealthChecker, HealthReport, HealthResult};
