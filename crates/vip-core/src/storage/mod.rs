//! # Storage Module
//!
//! Durable storage for users and the tier table using redb.
//!
//! Uses redb embedded database for:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - Single writer, so point awards never interleave

mod redb_store;

pub use redb_store::VipStore;
