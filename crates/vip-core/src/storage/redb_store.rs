//! redb-backed store for VIP state.
//!
//! Two tables:
//! - `users`: user id -> postcard-encoded [`UserRow`]
//! - `vip_levels`: level -> postcard-encoded [`TierRow`], iterated ascending
//!
//! Every mutation runs in a single write transaction. redb admits one writer
//! at a time, so the read-modify-write of a point award is atomic.

use crate::error::{Result, VipError};
use crate::tier::TierTable;
use crate::upgrade::apply_award;
use crate::{Level, Points, TierDefinition, UpgradeResult, UserVipState};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const VIP_LEVELS: TableDefinition<Level, &[u8]> = TableDefinition::new("vip_levels");

/// Stored user row. The user id is the key.
#[derive(Debug, Serialize, Deserialize)]
struct UserRow {
    points: Points,
    level: Level,
}

/// Stored tier row. The level is the key.
#[derive(Debug, Serialize, Deserialize)]
struct TierRow {
    name: String,
    min_points: Points,
}

/// Handle to the VIP database.
///
/// Open once at startup and share behind an `Arc`. The file is closed when
/// the last handle is dropped.
pub struct VipStore {
    db: Database,
    path: PathBuf,
}

impl VipStore {
    /// Open or create the database at `path`.
    ///
    /// Creates both tables and seeds `vip_levels` with the default table
    /// when it is empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_tiers(path, &TierTable::default())
    }

    /// Open or create the database, seeding `vip_levels` with `seed` if empty.
    ///
    /// An existing tier table is never overwritten.
    pub fn open_with_tiers(path: impl AsRef<Path>, seed: &TierTable) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path)?;

        let txn = db.begin_write()?;
        {
            txn.open_table(USERS)?;
            let mut levels = txn.open_table(VIP_LEVELS)?;
            if levels.is_empty()? {
                seed.validate()?;
                for tier in seed {
                    let row = encode_tier(tier)?;
                    levels.insert(tier.level, row.as_slice())?;
                }
            }
        }
        txn.commit()?;

        Ok(Self { db, path })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // TIER TABLE
    // =========================================================================

    /// Load the tier table, ascending by level.
    pub fn tiers(&self) -> Result<TierTable> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(VIP_LEVELS)?;
        read_tiers(&table)
    }

    /// Replace the stored tier table.
    ///
    /// The new table must pass [`TierTable::validate`]. Stored user levels are
    /// not recomputed; they are corrected on the next award.
    pub fn replace_tiers(&self, tiers: &TierTable) -> Result<()> {
        tiers.validate()?;

        let txn = self.db.begin_write()?;
        txn.delete_table(VIP_LEVELS)?;
        {
            let mut levels = txn.open_table(VIP_LEVELS)?;
            for tier in tiers {
                let row = encode_tier(tier)?;
                levels.insert(tier.level, row.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// Look up a user.
    pub fn get_user(&self, user_id: &str) -> Result<Option<UserVipState>> {
        let txn = self.db.begin_read()?;
        let users = txn.open_table(USERS)?;
        let row = match users.get(user_id)? {
            Some(guard) => Some(decode_user(guard.value())?),
            None => None,
        };
        Ok(row.map(|row| row.into_state(user_id)))
    }

    /// Look up a user, creating it with zero points on first reference.
    ///
    /// Returns the state and whether it was created by this call.
    pub fn get_or_create_user(&self, user_id: &str) -> Result<(UserVipState, bool)> {
        validate_user_id(user_id)?;

        // Existing users never wait on the writer lock.
        if let Some(state) = self.get_user(user_id)? {
            return Ok((state, false));
        }

        let txn = self.db.begin_write()?;
        let (state, created) = {
            let mut users = txn.open_table(USERS)?;
            let existing = match users.get(user_id)? {
                Some(guard) => Some(decode_user(guard.value())?),
                None => None,
            };
            match existing {
                Some(row) => (row.into_state(user_id), false),
                None => {
                    let state = UserVipState::new(user_id);
                    let row = encode_user(&state)?;
                    users.insert(user_id, row.as_slice())?;
                    (state, true)
                }
            }
        };

        if created {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok((state, created))
    }

    /// Award points to an existing user and recompute the stored level.
    ///
    /// Fails with [`VipError::NotFound`] for an unknown user and with
    /// [`VipError::Validation`] for a zero delta or overflow. Nothing is
    /// written on failure.
    pub fn award_points(&self, user_id: &str, delta: Points) -> Result<UpgradeResult> {
        let txn = self.db.begin_write()?;
        let result = {
            let tiers = read_tiers(&txn.open_table(VIP_LEVELS)?)?;
            let mut users = txn.open_table(USERS)?;

            let current = match users.get(user_id)? {
                Some(guard) => decode_user(guard.value())?.into_state(user_id),
                None => return Err(VipError::NotFound(user_id.to_string())),
            };

            let (updated, result) = apply_award(&current, delta, &tiers)?;
            let row = encode_user(&updated)?;
            users.insert(user_id, row.as_slice())?;
            result
        };
        txn.commit()?;
        Ok(result)
    }

    /// Number of stored users.
    pub fn user_count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let users = txn.open_table(USERS)?;
        Ok(users.len()?)
    }
}

impl std::fmt::Debug for VipStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VipStore").field("path", &self.path).finish()
    }
}

// =============================================================================
// ROW CODEC
// =============================================================================

impl UserRow {
    fn into_state(self, user_id: &str) -> UserVipState {
        UserVipState {
            user_id: user_id.to_string(),
            points: self.points,
            level: self.level,
        }
    }
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(VipError::Validation("user_id required".into()));
    }
    Ok(())
}

fn encode_user(state: &UserVipState) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(&UserRow {
        points: state.points,
        level: state.level,
    })?)
}

fn decode_user(bytes: &[u8]) -> Result<UserRow> {
    Ok(postcard::from_bytes(bytes)?)
}

fn encode_tier(tier: &TierDefinition) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(&TierRow {
        name: tier.name.clone(),
        min_points: tier.min_points,
    })?)
}

fn read_tiers(table: &impl ReadableTable<Level, &'static [u8]>) -> Result<TierTable> {
    let mut tiers = Vec::new();
    for entry in table.iter()? {
        let (level, row) = entry?;
        let row: TierRow = postcard::from_bytes(row.value())?;
        tiers.push(TierDefinition::new(level.value(), row.name, row.min_points));
    }
    TierTable::new(tiers)
}

// =============================================================================
// TESTS
// =============================================================================
