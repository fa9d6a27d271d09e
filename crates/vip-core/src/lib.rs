//! # VIP Core
//!
//! Tier resolution and point storage for the VIP service.
//!
//! This crate is synchronous and network-free. It contains:
//! - The tier model ([`TierDefinition`], [`TierTable`])
//! - The Tier Resolver ([`resolve`])
//! - Point award arithmetic ([`upgrade`])
//! - The redb-backed [`VipStore`]
//!
//! ## Quick Start
//!
//! ```rust
//! use vip_core::{resolve, TierTable};
//!
//! let tiers = TierTable::default();
//! let resolved = resolve(4999, &tiers);
//!
//! assert_eq!(resolved.tier_name, "Bronze");
//! assert_eq!(resolved.next_tier_name.as_deref(), Some("Silver"));
//! assert_eq!(resolved.points_to_next, 1);
//! ```

pub mod error;
pub mod storage;
pub mod tier;
pub mod upgrade;

pub use error::{Result, VipError};
pub use storage::VipStore;
pub use tier::{MAX_TIER_SENTINEL, TierTable, resolve};
pub use upgrade::apply_award;

use serde::{Deserialize, Serialize};

// =============================================================================
// TIER LEVEL
// =============================================================================

/// Numeric rank of a tier. Level 0 is the floor tier.
pub type Level = u32;

/// Accumulated point total.
pub type Points = u64;

// =============================================================================
// TIER DEFINITION
// =============================================================================

/// A named rank with a minimum point threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub level: Level,
    pub name: String,
    pub min_points: Points,
}

impl TierDefinition {
    /// Create a new tier definition.
    #[must_use]
    pub fn new(level: Level, name: impl Into<String>, min_points: Points) -> Self {
        Self {
            level,
            name: name.into(),
            min_points,
        }
    }

    /// Whether a point total meets this tier's threshold (inclusive).
    #[must_use]
    pub fn qualifies(&self, points: Points) -> bool {
        self.min_points <= points
    }
}

// =============================================================================
// USER STATE
// =============================================================================

/// Persisted VIP state of one user.
///
/// `level` is derived from `points` and stored redundantly for reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVipState {
    pub user_id: String,
    pub points: Points,
    pub level: Level,
}

impl UserVipState {
    /// State of a user on first reference: no points, floor tier.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            points: 0,
            level: 0,
        }
    }
}

// =============================================================================
// RESOLVER OUTPUT
// =============================================================================

/// Result of resolving a point total against a tier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTier {
    pub tier_level: Level,
    pub tier_name: String,
    pub points: Points,
    /// `None` when the resolved tier is the highest one.
    pub next_tier_name: Option<String>,
    pub points_to_next: Points,
}

impl ResolvedTier {
    /// Whether no further tier exists above this one.
    #[must_use]
    pub fn is_max(&self) -> bool {
        self.next_tier_name.is_none()
    }
}

/// Outcome of a point award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeResult {
    pub user_id: String,
    pub old_level: Level,
    pub new_level: Level,
    pub new_level_name: String,
    pub new_points: Points,
    pub upgraded: bool,
}
