//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (PathResolver loads the current RouteTable)
//!     → matcher.rs (evaluate prefix rules, longest first)
//!     → Return: service name or no-match (404)
//!
//! Route Compilation:
//!     RouteConfig[] + registered prefixes
//!     → Deduplicate identical prefixes
//!     → Sort by prefix length, longest first
//!     → Freeze as immutable RouteTable, swap in atomically
//! ```
//!
//! # Design Decisions
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Longest prefix wins; declaration order never matters

pub mod matcher;
pub mod router;

pub use matcher::{PathPrefixMatcher, RouteRule, RuleOrigin};
pub use router::{PathResolver, RouteTable};
