//! Vote use-case services.
//!
//! # Responsibility
//! - Enforce one vote per identity per article on top of `VoteStore`.
//! - Expose read-only tallies and privileged reset/statistics operations.
//! - Translate storage failures into the caller-facing `VoteError` taxonomy.
//!
//! # Invariants
//! - Services receive their store, catalog and access control at
//!   construction; there are no ambient singletons.
//! - Services never log voter identities.

pub mod reset_admin;
pub mod stats_reader;
pub mod tally_reader;
pub mod vote_error;
pub mod vote_ledger;
