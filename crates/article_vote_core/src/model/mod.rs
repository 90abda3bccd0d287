//! Domain model for article votes.
//!
//! # Responsibility
//! - Define typed identifiers and values parsed from raw transport input.
//! - Define the vote record and the derived tally projection.
//!
//! # Invariants
//! - Percentages are derived on read and never stored.
//! - Raw transport strings are parsed once at the boundary; core code only
//!   sees typed values.

pub mod article;
pub mod tally;
pub mod vote;
