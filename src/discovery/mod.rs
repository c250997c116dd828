//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     GatewayConfig.services → registry.rs (pre-populated, status unknown)
//!
//! Runtime:
//!     Discovery API → register / unregister / update_status
//!     Health checker → update_status (write-back after every probe)
//!     Forwarder → get (snapshot of one entry)
//! ```
//!
//! # Design Decisions
//! - One registry instance, owned by the composition root and shared via Arc
//! - Entries are independently keyed; no cross-entry transactions
//! - No persistence: contents are rebuilt on every start

pub mod entry;
pub mod registry;

pub use entry::{join_url, Metadata, Registration, ServiceEntry, ServiceStatus};
pub use registry::ServiceRegistry;
