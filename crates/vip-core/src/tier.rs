//! # Tier Module
//!
//! The tier table and the Tier Resolver.
//!
//! A [`TierTable`] is the single source of truth for tier definitions. It is
//! always non-empty and kept sorted by level. The resolver assumes, but does
//! not enforce, that thresholds increase with level; [`TierTable::validate`]
//! checks that separately before a table is persisted.

use crate::error::{Result, VipError};
use crate::{Level, Points, ResolvedTier, TierDefinition};
use std::collections::BTreeSet;

/// Name reported in place of the next tier when none exists.
///
/// Reserved: no tier may carry this name.
pub const MAX_TIER_SENTINEL: &str = "MAX";

// =============================================================================
// TIER TABLE
// =============================================================================

/// Ordered, non-empty list of tier definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<TierDefinition>,
}

impl TierTable {
    /// Build a table from definitions in any order.
    ///
    /// Definitions are sorted by level. Returns an error only for an empty
    /// list; ordering invariants are checked by [`TierTable::validate`].
    pub fn new(mut tiers: Vec<TierDefinition>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(VipError::InvalidTierTable(
                "tier table must contain at least one tier".into(),
            ));
        }
        tiers.sort_by_key(|t| t.level);
        Ok(Self { tiers })
    }

    /// Build a table and check the full ordering invariant.
    pub fn validated(tiers: Vec<TierDefinition>) -> Result<Self> {
        let table = Self::new(tiers)?;
        table.validate()?;
        Ok(table)
    }

    /// Check that the table is well-formed:
    /// - the lowest tier is level 0 with a threshold of 0
    /// - levels and names are unique, and no name is [`MAX_TIER_SENTINEL`]
    /// - thresholds strictly increase with level
    pub fn validate(&self) -> Result<()> {
        let floor = self.floor();
        if floor.level != 0 || floor.min_points != 0 {
            return Err(VipError::InvalidTierTable(format!(
                "floor tier must be level 0 at 0 points, found level {} at {} points",
                floor.level, floor.min_points
            )));
        }

        let mut names = BTreeSet::new();
        for tier in &self.tiers {
            if tier.name == MAX_TIER_SENTINEL {
                return Err(VipError::InvalidTierTable(format!(
                    "tier name '{MAX_TIER_SENTINEL}' is reserved"
                )));
            }
            if !names.insert(tier.name.as_str()) {
                return Err(VipError::InvalidTierTable(format!(
                    "duplicate tier name '{}'",
                    tier.name
                )));
            }
        }

        for pair in self.tiers.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if lower.level == upper.level {
                return Err(VipError::InvalidTierTable(format!(
                    "duplicate tier level {}",
                    upper.level
                )));
            }
            if lower.min_points >= upper.min_points {
                return Err(VipError::InvalidTierTable(format!(
                    "threshold of level {} ({}) must exceed level {} ({})",
                    upper.level, upper.min_points, lower.level, lower.min_points
                )));
            }
        }

        Ok(())
    }

    /// The lowest-level tier.
    #[must_use]
    pub fn floor(&self) -> &TierDefinition {
        // Non-empty by construction
        &self.tiers[0]
    }

    /// The highest-level tier.
    #[must_use]
    pub fn top(&self) -> &TierDefinition {
        &self.tiers[self.tiers.len() - 1]
    }

    /// Look up a tier by its level.
    #[must_use]
    pub fn get(&self, level: Level) -> Option<&TierDefinition> {
        self.tiers.iter().find(|t| t.level == level)
    }

    /// Iterate tiers in ascending level order.
    pub fn iter(&self) -> impl Iterator<Item = &TierDefinition> {
        self.tiers.iter()
    }

    /// Tiers as a slice, ascending by level.
    #[must_use]
    pub fn as_slice(&self) -> &[TierDefinition] {
        &self.tiers
    }

    /// Number of tiers. Never zero.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Resolve a point total against this table. See [`resolve`].
    #[must_use]
    pub fn resolve(&self, points: Points) -> ResolvedTier {
        resolve(points, self)
    }
}

impl Default for TierTable {
    /// The six-tier reference table, Normal through Diamond.
    fn default() -> Self {
        Self {
            tiers: vec![
                TierDefinition::new(0, "Normal", 0),
                TierDefinition::new(1, "Bronze", 1_000),
                TierDefinition::new(2, "Silver", 5_000),
                TierDefinition::new(3, "Gold", 20_000),
                TierDefinition::new(4, "Platinum", 50_000),
                TierDefinition::new(5, "Diamond", 100_000),
            ],
        }
    }
}

impl<'a> IntoIterator for &'a TierTable {
    type Item = &'a TierDefinition;
    type IntoIter = std::slice::Iter<'a, TierDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiers.iter()
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Resolve the highest qualifying tier for `points`.
///
/// Starts from the floor tier and scans every tier in ascending level order,
/// keeping the last one whose threshold is met. The scan does not stop early,
/// so the result is the tier with the largest qualifying threshold on a
/// well-formed table.
///
/// The next tier is the one at `level + 1`. When it is missing the resolved
/// tier is the top and `points_to_next` is 0.
#[must_use]
pub fn resolve(points: Points, tiers: &TierTable) -> ResolvedTier {
    let mut current = tiers.floor();
    for tier in tiers {
        if tier.qualifies(points) {
            current = tier;
        }
    }

    let next = current
        .level
        .checked_add(1)
        .and_then(|level| tiers.get(level));

    ResolvedTier {
        tier_level: current.level,
        tier_name: current.name.clone(),
        points,
        next_tier_name: next.map(|t| t.name.clone()),
        // Saturates only on malformed tables where the next threshold is lower
        points_to_next: next.map_or(0, |t| t.min_points.saturating_sub(points)),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bronze_just_below_silver() {
        let resolved = resolve(4_999, &TierTable::default());
        assert_eq!(resolved.tier_level, 1);
        assert_eq!(resolved.tier_name, "Bronze");
        assert_eq!(resolved.next_tier_name.as_deref(), Some("Silver"));
        assert_eq!(resolved.points_to_next, 1);
    }

    #[test]
    fn silver_at_threshold() {
        let resolved = resolve(5_000, &TierTable::default());
        assert_eq!(resolved.tier_level, 2);
        assert_eq!(resolved.tier_name, "Silver");
        assert_eq!(resolved.next_tier_name.as_deref(), Some("Gold"));
        assert_eq!(resolved.points_to_next, 15_000);
    }

    #[test]
    fn diamond_is_max() {
        let resolved = resolve(100_000, &TierTable::default());
        assert_eq!(resolved.tier_level, 5);
        assert_eq!(resolved.tier_name, "Diamond");
        assert!(resolved.is_max());
        assert_eq!(resolved.points_to_next, 0);

        let beyond = resolve(u64::MAX, &TierTable::default());
        assert_eq!(beyond.tier_level, 5);
        assert_eq!(beyond.points_to_next, 0);
    }

    #[test]
    fn zero_points_is_floor() {
        let resolved = resolve(0, &TierTable::default());
        assert_eq!(resolved.tier_level, 0);
        assert_eq!(resolved.tier_name, "Normal");
        assert_eq!(resolved.points_to_next, 1_000);
    }

    #[test]
    fn single_tier_table() {
        let table = TierTable::new(vec![TierDefinition::new(0, "Only", 0)]).expect("table");
        let resolved = resolve(0, &table);
        assert_eq!(resolved.tier_name, "Only");
        assert!(resolved.is_max());
        assert_eq!(resolved.points_to_next, 0);
    }

    #[test]
    fn new_sorts_by_level() {
        let table = TierTable::new(vec![
            TierDefinition::new(2, "High", 200),
            TierDefinition::new(0, "Low", 0),
            TierDefinition::new(1, "Mid", 100),
        ])
        .expect("table");

        let levels: Vec<_> = table.iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![0, 1, 2]);
        assert_eq!(table.floor().name, "Low");
        assert_eq!(table.top().name, "High");
    }

    #[test]
    fn empty_table_rejected() {
        assert!(matches!(
            TierTable::new(Vec::new()),
            Err(VipError::InvalidTierTable(_))
        ));
    }

    #[test]
    fn default_table_is_valid() {
        assert!(TierTable::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_floor() {
        let result = TierTable::validated(vec![TierDefinition::new(1, "Bronze", 1_000)]);
        assert!(matches!(result, Err(VipError::InvalidTierTable(_))));

        let result = TierTable::validated(vec![TierDefinition::new(0, "Normal", 10)]);
        assert!(matches!(result, Err(VipError::InvalidTierTable(_))));
    }

    #[test]
    fn validate_rejects_non_monotonic_thresholds() {
        let result = TierTable::validated(vec![
            TierDefinition::new(0, "Normal", 0),
            TierDefinition::new(1, "Bronze", 5_000),
            TierDefinition::new(2, "Silver", 1_000),
        ]);
        assert!(matches!(result, Err(VipError::InvalidTierTable(_))));
    }

    #[test]
    fn validate_rejects_duplicates() {
        let dup_level = TierTable::validated(vec![
            TierDefinition::new(0, "Normal", 0),
            TierDefinition::new(1, "Bronze", 1_000),
            TierDefinition::new(1, "Silver", 5_000),
        ]);
        assert!(dup_level.is_err());

        let dup_name = TierTable::validated(vec![
            TierDefinition::new(0, "Normal", 0),
            TierDefinition::new(1, "Normal", 1_000),
        ]);
        assert!(dup_name.is_err());
    }

    #[test]
    fn validate_rejects_reserved_max_name() {
        let result = TierTable::validated(vec![
            TierDefinition::new(0, "Normal", 0),
            TierDefinition::new(1, MAX_TIER_SENTINEL, 100),
            TierDefinition::new(2, "Top", 200),
        ]);
        assert!(matches!(result, Err(VipError::InvalidTierTable(_))));

        // Only the exact sentinel is reserved
        let result = TierTable::validated(vec![
            TierDefinition::new(0, "Normal", 0),
            TierDefinition::new(1, "Max Elite", 100),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn malformed_table_is_deterministic() {
        // Thresholds decrease with level: resolution still terminates and saturates
        let table = TierTable::new(vec![
            TierDefinition::new(0, "A", 0),
            TierDefinition::new(1, "B", 500),
            TierDefinition::new(2, "C", 100),
        ])
        .expect("table");

        let first = resolve(200, &table);
        let second = resolve(200, &table);
        assert_eq!(first, second);
        assert_eq!(first.tier_name, "C");
    }

    #[test]
    fn gap_in_levels_has_no_next() {
        let table = TierTable::new(vec![
            TierDefinition::new(0, "Normal", 0),
            TierDefinition::new(2, "Skipped", 1_000),
        ])
        .expect("table");

        let resolved = resolve(0, &table);
        assert_eq!(resolved.tier_level, 0);
        assert!(resolved.is_max());
        assert_eq!(resolved.points_to_next, 0);
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    /// Well-formed tables: level 0 at 0 points, strictly increasing thresholds.
    fn valid_table() -> impl Strategy<Value = TierTable> {
        proptest::collection::vec(1u64..50_000, 0..8).prop_map(|gaps| {
            let mut tiers = vec![TierDefinition::new(0, "T0", 0)];
            let mut threshold = 0u64;
            for (i, gap) in gaps.into_iter().enumerate() {
                threshold += gap;
                let level = (i + 1) as Level;
                tiers.push(TierDefinition::new(level, format!("T{level}"), threshold));
            }
            TierTable::validated(tiers).expect("generated table is valid")
        })
    }

    proptest! {
        #[test]
        fn resolves_highest_qualifying_level(table in valid_table(), points in 0u64..500_000) {
            let expected = table
                .iter()
                .filter(|t| t.min_points <= points)
                .map(|t| t.level)
                .max()
                .unwrap_or(0);
            prop_assert_eq!(resolve(points, &table).tier_level, expected);
        }

        #[test]
        fn monotonic_in_points(table in valid_table(), a in 0u64..500_000, b in 0u64..500_000) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(resolve(low, &table).tier_level <= resolve(high, &table).tier_level);
        }

        #[test]
        fn thresholds_are_inclusive(table in valid_table()) {
            for tier in &table {
                let resolved = resolve(tier.min_points, &table);
                prop_assert_eq!(resolved.tier_level, tier.level);
                if tier.min_points > 0 {
                    prop_assert_eq!(resolve(tier.min_points - 1, &table).tier_level, tier.level - 1);
                }
            }
        }

        #[test]
        fn points_to_next_reaches_next_tier(table in valid_table(), points in 0u64..500_000) {
            let resolved = resolve(points, &table);
            match resolved.next_tier_name {
                Some(_) => {
                    let after = resolve(points + resolved.points_to_next, &table);
                    prop_assert_eq!(after.tier_level, resolved.tier_level + 1);
                }
                None => {
                    prop_assert_eq!(resolved.points_to_next, 0);
                    prop_assert_eq!(resolved.tier_level, table.top().level);
                }
            }
        }
    }
}
