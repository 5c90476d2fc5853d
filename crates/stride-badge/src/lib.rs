//! Stride Badge Engine
//!
//! Maps goal progress onto discrete achievement tiers.
//!
//! # Example
//!
//! ```rust
//! use stride_badge::{progress_to_tier, BadgeTiers};
//!
//! let tiers = BadgeTiers::default();
//! assert_eq!(progress_to_tier(Some(62.0), &tiers).name, "Silver");
//! assert_eq!(progress_to_tier(None, &tiers).name, "Starter");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod tier;

pub use engine::{badge_changes, compute_all_badges, compute_badge, BadgeChange, Progressed};
pub use tier::{progress_to_tier, BadgeError, BadgeTier, BadgeTiers};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
