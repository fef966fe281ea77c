//! # Lot Catalog
//!
//! A dealer's vehicle inventory as a browsable, filterable catalog.
//!
//! The pure catalog logic (normalization, the canonical catalog, filter
//! predicates, facets, sorting, the filter session) lives in the
//! `lot-catalog-core` crate. This crate adds the I/O around it: the SQLite
//! Record Source, the snapshot writer, the Query Service, and the HTTP and
//! CLI surfaces.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌────────────────────┐
//! │ lot import   │──▶│ Record Source │──▶│ Cache Materializer │
//! │ (vendor JSON)│   │   (SQLite)    │   │  full + lite JSON  │
//! └──────────────┘   └───────┬───────┘   └─────────┬──────────┘
//!                            │ scan / lookup        │ snapshot
//!                            ▼                      ▼
//!                       ┌──────────────────────────────┐
//!                       │        Query Service         │
//!                       └──────────────┬───────────────┘
//!                          ┌───────────┴───────────┐
//!                          ▼                       ▼
//!                     ┌──────────┐           ┌──────────┐
//!                     │   CLI    │           │   HTTP   │
//!                     │  (lot)   │           │  (axum)  │
//!                     └──────────┘           └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lot init                         # create the vehicles table
//! lot import ./feed/vehicles.json  # load vendor rows
//! lot materialize                  # write the snapshots
//! lot list --model bronco --facets
//! lot serve                        # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Record Source table creation |
//! | [`import`] | Vendor row upsert |
//! | [`sqlite_source`] | SQLite Record Source |
//! | [`materialize`] | Snapshot writer |
//! | [`query`] | Query Service |
//! | [`server`] | HTTP server |
//! | [`get`] | Single-vehicle CLI lookup |
//! | [`stats`] | Snapshot facet report |
//! | [`audit`] | Normalizer coverage report |

pub mod audit;
pub mod config;
pub mod db;
pub mod get;
pub mod import;
pub mod materialize;
pub mod migrate;
pub mod query;
pub mod server;
pub mod sqlite_source;
pub mod stats;
