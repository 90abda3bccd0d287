//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define storage contracts for vote state and the article catalog.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - `VoteStore` is the only component that touches persistent vote state.
//! - Repository constructors reject connections without current migrations.

pub mod article_repo;
pub mod vote_repo;
