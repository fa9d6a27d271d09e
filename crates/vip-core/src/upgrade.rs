//! # Upgrade Module
//!
//! Point award arithmetic, separated from storage so the store only has to
//! wrap it in a transaction.

use crate::error::{Result, VipError};
use crate::tier::{TierTable, resolve};
use crate::{Points, UpgradeResult, UserVipState};

/// Apply a point award to a user's state.
///
/// Returns the updated state to persist together with the upgrade outcome.
/// Fails with [`VipError::Validation`] when `delta` is zero or the new total
/// would overflow; the input state is never modified.
pub fn apply_award(
    state: &UserVipState,
    delta: Points,
    tiers: &TierTable,
) -> Result<(UserVipState, UpgradeResult)> {
    if delta == 0 {
        return Err(VipError::Validation("points must be a positive integer".into()));
    }

    let new_points = state.points.checked_add(delta).ok_or_else(|| {
        VipError::Validation(format!(
            "awarding {} points to '{}' would overflow the point total",
            delta, state.user_id
        ))
    })?;

    let resolved = resolve(new_points, tiers);

    let updated = UserVipState {
        user_id: state.user_id.clone(),
        points: new_points,
        level: resolved.tier_level,
    };

    let result = UpgradeResult {
        user_id: state.user_id.clone(),
        old_level: state.level,
        new_level: resolved.tier_level,
        new_level_name: resolved.tier_name,
        new_points,
        upgraded: resolved.tier_level > state.level,
    };

    Ok((updated, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn award_crossing_threshold_upgrades() {
        let state = UserVipState {
            user_id: "alice".into(),
            points: 900,
            level: 0,
        };

        let (updated, result) = apply_award(&state, 200, &TierTable::default()).expect("award");

        assert_eq!(updated.points, 1_100);
        assert_eq!(updated.level, 1);
        assert_eq!(result.old_level, 0);
        assert_eq!(result.new_level, 1);
        assert_eq!(result.new_level_name, "Bronze");
        assert!(result.upgraded);
    }

    #[test]
    fn award_within_tier_does_not_upgrade() {
        let state = UserVipState {
            user_id: "bob".into(),
            points: 1_000,
            level: 1,
        };

        let (updated, result) = apply_award(&state, 10, &TierTable::default()).expect("award");

        assert_eq!(updated.points, 1_010);
        assert_eq!(result.new_level, 1);
        assert!(!result.upgraded);
    }

    #[test]
    fn award_can_skip_tiers() {
        let state = UserVipState::new("carol");
        let (_, result) = apply_award(&state, 60_000, &TierTable::default()).expect("award");
        assert_eq!(result.new_level, 4);
        assert_eq!(result.new_level_name, "Platinum");
        assert!(result.upgraded);
    }

    #[test]
    fn zero_delta_rejected() {
        let state = UserVipState::new("dave");
        let result = apply_award(&state, 0, &TierTable::default());
        assert!(matches!(result, Err(VipError::Validation(_))));
    }

    #[test]
    fn overflow_rejected() {
        let state = UserVipState {
            user_id: "erin".into(),
            points: u64::MAX - 1,
            level: 5,
        };
        let result = apply_award(&state, 2, &TierTable::default());
        assert!(matches!(result, Err(VipError::Validation(_))));
    }

    #[test]
    fn stale_stored_level_is_corrected() {
        // Stored level lags behind points, e.g. after a tier table change
        let state = UserVipState {
            user_id: "frank".into(),
            points: 20_000,
            level: 0,
        };
        let (updated, result) = apply_award(&state, 1, &TierTable::default()).expect("award");
        assert_eq!(updated.level, 3);
        assert!(result.upgraded);
    }
}
