//! Domain model for parcel tracking.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every persisted parcel is identified by a storage-assigned `ParcelNumber`.
//! - Deletion is physical removal; there are no tombstones.

pub mod parcel;
