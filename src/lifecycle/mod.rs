//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → watch value flips to true (late subscribers see it too)
//!     → pool reconciliation task closes connections + resolver → exits
//! ```
//!
//! # Design Decisions
//! - The pool never installs OS signal handlers; it only subscribes
//! - Triggering more than once is harmless

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
