//! # Lot Catalog Core
//!
//! Shared, I/O-free logic for Lot Catalog: data models, attribute
//! normalization, the canonical per-model catalog, the record source
//! abstraction, snapshot materialization, and the faceted filter engine.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. The application
//! crate supplies a concrete [`source::RecordSource`] and writes the
//! snapshots that [`snapshot::materialize`] produces.
//!
//! # Pipeline
//!
//! ```text
//! RecordSource ─▶ normalize ─▶ materialize ─▶ Snapshot ─▶ query ─▶ FilterSession
//!      (rows)       (pure)       (pure)        (JSON)              (per user)
//! ```

pub mod catalog;
pub mod error;
pub mod facets;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod predicate;
pub mod session;
pub mod snapshot;
pub mod sort;
pub mod source;
