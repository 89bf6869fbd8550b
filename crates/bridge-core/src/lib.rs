//! # Bridge Core
//!
//! Core types shared across the upstream bridge:
//! - Error taxonomy and result alias
//! - Event bus for cross-cutting notifications

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;

// Re-export main types
pub use error::{BridgeError, BridgeResult};
pub use events::{BridgeEvent, EventBus, EvictionReason};
