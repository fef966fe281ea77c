//! Query Service.
//!
//! Answers list and single-record requests from the snapshots when it can
//! and from the Record Source when it must. A well-formed list request
//! always produces a response: degraded paths return fewer or older
//! vehicles with diagnostics attached, never an error.
//!
//! # Paths
//!
//! ```text
//! list ──▶ no filters, stock sort, snapshot within tolerance? ──yes──▶ snapshot (page slice)
//!                               │ no
//!                               ▼
//!          scan source under timeout ──ok──▶ filter + sort + page ──▶ scan
//!                               │ timeout / unavailable / unusable
//!                               ▼
//!          filter the last snapshot ──▶ snapshot-fallback (stale)
//!                               │ no snapshot
//!                               ▼
//!                         empty list ──▶ none
//! ```
//!
//! Every response carries a fingerprint: SHA-256 over the version of the
//! data it was built from (snapshot generation time or source mtime), the
//! request's canonical form, the source mtime observed for the request, the
//! serving path and the staleness flag, truncated to 16 bytes and
//! hex-encoded. Equal fingerprints mean equal bodies. A snapshot response
//! that turns stale therefore gets a new fingerprint.
//!
//! `sort=random` is seeded from the data version and the filter set, so
//! repeated requests and successive pages of one listing share a shuffle.
//! The order changes whenever the data does.

use chrono::{DateTime, Utc};
use lot_catalog_core::catalog::Catalog;
use lot_catalog_core::error::{CatalogError, Diagnostic};
use lot_catalog_core::facets::{self, FacetHistogram};
use lot_catalog_core::filter::FilterState;
use lot_catalog_core::models::{Dimension, LiteVehicle, VehicleRecord};
use lot_catalog_core::predicate::record_passes;
use lot_catalog_core::snapshot::{build_records, FullSnapshot, LiteSnapshot};
use lot_catalog_core::sort::{sort_records, SortOrder};
use lot_catalog_core::source::RecordSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, RwLock};

use crate::config::Config;
use crate::materialize::{full_path, lite_path, read_snapshot, snapshots_generated};

/// A list request after parameter parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub state: FilterState,
    pub sort: SortOrder,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
    pub lite: bool,
    pub facets: bool,
}

impl ListRequest {
    pub fn new(per_page: usize) -> Self {
        Self {
            state: FilterState::default(),
            sort: SortOrder::Stock,
            page: 1,
            per_page,
            lite: false,
            facets: false,
        }
    }

    /// The snapshot is already sorted by stock and holds every vehicle.
    pub fn snapshot_satisfiable(&self) -> bool {
        self.state.is_empty() && self.sort == SortOrder::Stock
    }

    /// Stable textual form used in the fingerprint.
    pub fn canonical_query(&self) -> String {
        format!(
            "{}sort={};page={};per_page={};lite={};facets={}",
            self.state.canonical_query(),
            self.sort,
            self.page,
            self.per_page,
            self.lite,
            self.facets
        )
    }
}

/// A parsed `GET /inventory` request.
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryRequest {
    List(ListRequest),
    /// `stock=<key>`: single-record fast path.
    Single(String),
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_price(name: &str, value: &str) -> Result<Option<f64>, String> {
    let cleaned: String = value.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("{} must be a number, got '{}'", name, value))
}

fn parse_count(name: &str, value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("{} must be a positive integer, got '{}'", name, value))
}

/// Parse query parameters into a request.
///
/// Dimension parameters (`color`, `trim`, ...) include values and
/// `exclude_<dimension>` excludes them; both accept repeated keys or
/// comma-joined lists. `per_page` is clamped to `1..=max_per_page`.
/// Unrecognized parameters are ignored.
pub fn parse_params(
    params: &[(String, String)],
    default_per_page: usize,
    max_per_page: usize,
) -> Result<InventoryRequest, String> {
    let mut req = ListRequest::new(default_per_page);
    for (key, value) in params {
        let key = key.trim();
        match key {
            "stock" => {
                if !value.trim().is_empty() {
                    return Ok(InventoryRequest::Single(value.trim().to_string()));
                }
            }
            "sort" => req.sort = value.trim().parse()?,
            "page" => req.page = parse_count("page", value)?.max(1),
            "per_page" => req.per_page = parse_count("per_page", value)?.clamp(1, max_per_page),
            "price_min" => req.state.price.min = parse_price("price_min", value)?,
            "price_max" => req.state.price.max = parse_price("price_max", value)?,
            "lite" => req.lite = truthy(value),
            "facets" => req.facets = truthy(value),
            _ => {
                let (dim, exclude) = match key.strip_prefix("exclude_") {
                    Some(rest) => (rest, true),
                    None => (key, false),
                };
                let Ok(dim) = dim.parse::<Dimension>() else {
                    continue;
                };
                let filter = req.state.get_mut(dim);
                for v in value.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                    if exclude {
                        filter.exclude(v);
                    } else {
                        filter.include(v);
                    }
                }
            }
        }
    }
    Ok(InventoryRequest::List(req))
}

/// Where a list response's vehicles came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServedFrom {
    Snapshot,
    Scan,
    SnapshotFallback,
    None,
}

/// Full or lite vehicle projections.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Vehicles {
    Full(Vec<VehicleRecord>),
    Lite(Vec<LiteVehicle>),
}

impl Vehicles {
    pub fn len(&self) -> usize {
        match self {
            Vehicles::Full(v) => v.len(),
            Vehicles::Lite(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// VINs in response order.
    pub fn vins(&self) -> Vec<&str> {
        match self {
            Vehicles::Full(v) => v.iter().map(|r| r.vin.as_str()).collect(),
            Vehicles::Lite(v) => v.iter().map(|r| r.vin.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub vehicles: Vehicles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<FacetHistogram>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub total_count: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub stale: bool,
    pub served_from: ServedFrom,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    pub fingerprint: String,
}

/// A single-record lookup result.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub vehicle: VehicleRecord,
    /// `Scan` when the Record Source answered, `SnapshotFallback` otherwise.
    pub served_from: ServedFrom,
    pub diagnostics: Vec<Diagnostic>,
}

/// Hex of the first 16 bytes of SHA-256 over `mtime|query`.
pub fn fingerprint(mtime: Option<DateTime<Utc>>, query: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(m) = mtime {
        hasher.update(m.to_rfc3339().as_bytes());
    }
    hasher.update(b"|");
    hasher.update(query.as_bytes());
    hex::encode(&hasher.finalize()[..16])
}

/// The data version behind a response and how it was served.
#[derive(Debug, Clone, Copy)]
struct Basis {
    /// Version of the data the vehicles came from.
    data: Option<DateTime<Utc>>,
    /// Record Source mtime observed while answering.
    source: Option<DateTime<Utc>>,
    served_from: ServedFrom,
    stale: bool,
}

impl Basis {
    fn fingerprint(&self, query: &str) -> String {
        let source = self.source.map(|m| m.to_rfc3339()).unwrap_or_default();
        fingerprint(
            self.data,
            &format!(
                "{};source={};served={:?};stale={}",
                query, source, self.served_from, self.stale
            ),
        )
    }

    /// Seed for `sort=random`, fixed per data version and filter set.
    fn shuffle_seed(&self, filters: &str) -> u64 {
        let mut hasher = Sha256::new();
        if let Some(m) = self.data {
            hasher.update(m.to_rfc3339().as_bytes());
        }
        hasher.update(b"|");
        hasher.update(filters.as_bytes());
        let digest = hasher.finalize();
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(seed)
    }
}

fn total_pages(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page.max(1))
}

fn page_slice<T: Clone>(items: &[T], page: usize, per_page: usize) -> Vec<T> {
    let per_page = per_page.max(1);
    let start = page.saturating_sub(1).saturating_mul(per_page);
    items.iter().skip(start).take(per_page).cloned().collect()
}

fn project<'a>(records: impl Iterator<Item = &'a VehicleRecord>, lite: bool) -> Vehicles {
    if lite {
        Vehicles::Lite(records.map(LiteVehicle::from).collect())
    } else {
        Vehicles::Full(records.cloned().collect())
    }
}

#[derive(Clone)]
struct Cached {
    mtime: DateTime<Utc>,
    full: Arc<FullSnapshot>,
    lite: Arc<LiteSnapshot>,
}

pub struct QueryService {
    config: Arc<Config>,
    catalog: Catalog,
    source: Arc<dyn RecordSource>,
    cache: RwLock<Option<Cached>>,
}

impl QueryService {
    pub fn new(config: Arc<Config>, source: Arc<dyn RecordSource>) -> anyhow::Result<Self> {
        let catalog = config.catalog()?;
        Ok(Self {
            config,
            catalog,
            source,
            cache: RwLock::new(None),
        })
    }

    /// Current snapshots, re-read from disk only when their generation
    /// time changes. The read runs on the blocking pool.
    async fn snapshot(&self) -> Option<Cached> {
        let mtime = snapshots_generated(&self.config).await?;
        let hit = self
            .cache
            .read()
            .unwrap()
            .as_ref()
            .filter(|cached| cached.mtime == mtime)
            .cloned();
        if hit.is_some() {
            return hit;
        }

        let full_file = full_path(&self.config);
        let lite_file = lite_path(&self.config);
        let loaded = tokio::task::spawn_blocking(move || -> anyhow::Result<(FullSnapshot, LiteSnapshot)> {
            Ok((
                read_snapshot::<VehicleRecord>(&full_file)?,
                read_snapshot::<LiteVehicle>(&lite_file)?,
            ))
        })
        .await
        .map_err(anyhow::Error::from)
        .and_then(|read| read);
        match loaded {
            Ok((full, lite)) => {
                let cached = Cached {
                    mtime,
                    full: Arc::new(full),
                    lite: Arc::new(lite),
                };
                *self.cache.write().unwrap() = Some(cached.clone());
                tracing::debug!(%mtime, "loaded snapshots");
                Some(cached)
            }
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "snapshot unreadable");
                None
            }
        }
    }

    /// List vehicles. Never fails for a well-formed request.
    pub async fn list(&self, req: &ListRequest) -> ListResponse {
        let query = req.canonical_query();
        let snapshot = self.snapshot().await;
        let mut diagnostics = Vec::new();

        let source_modified = match self.source.modified_at().await {
            Ok(m) => Some(m),
            Err(e) => {
                diagnostics.push(Diagnostic::SourceUnavailable {
                    message: e.to_string(),
                });
                None
            }
        };

        if let Some(snap) = &snapshot {
            let lag = source_modified.map(|m| m - snap.full.source_modified);
            let stale = lag.map_or(true, |l| l > chrono::Duration::zero());
            let tolerable = lag.map_or(true, |l| {
                l <= chrono::Duration::seconds(self.config.snapshot.stale_tolerance_secs as i64)
            });
            if req.snapshot_satisfiable() && tolerable {
                if stale {
                    if let Some(m) = source_modified {
                        diagnostics.push(Diagnostic::StaleSnapshot {
                            snapshot_modified: snap.full.source_modified.to_rfc3339(),
                            source_modified: m.to_rfc3339(),
                        });
                    }
                }
                let basis = Basis {
                    data: Some(snap.mtime),
                    source: source_modified,
                    served_from: ServedFrom::Snapshot,
                    stale,
                };
                return self.from_snapshot(snap, req, &query, diagnostics, basis);
            }
        }

        let timeout = self.config.query.scan_timeout();
        match tokio::time::timeout(timeout, self.source.fetch_all()).await {
            Ok(Ok(batch)) => match build_records(&batch) {
                Ok(set) => {
                    diagnostics.extend(set.diagnostics);
                    let facets = req
                        .facets
                        .then(|| facets::contextual(&set.records, &req.state, &self.catalog));
                    let last_updated = snapshot.as_ref().map(|s| s.full.last_updated.clone());
                    let basis = Basis {
                        data: source_modified,
                        source: source_modified,
                        served_from: ServedFrom::Scan,
                        stale: false,
                    };
                    return self.paginate(
                        set.records.iter(),
                        req,
                        &query,
                        facets,
                        last_updated,
                        diagnostics,
                        basis,
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "scan returned unusable rows");
                    diagnostics.push(Diagnostic::SourceUnavailable {
                        message: e.to_string(),
                    });
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "scan failed");
                if !diagnostics
                    .iter()
                    .any(|d| matches!(d, Diagnostic::SourceUnavailable { .. }))
                {
                    diagnostics.push(Diagnostic::SourceUnavailable {
                        message: e.to_string(),
                    });
                }
            }
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "scan timed out");
                diagnostics.push(Diagnostic::ScanTimedOut {
                    after_ms: timeout.as_millis() as u64,
                });
            }
        }

        match &snapshot {
            Some(snap) => {
                let records = &snap.full.vehicles;
                let facets = req
                    .facets
                    .then(|| facets::contextual(records, &req.state, &self.catalog));
                let basis = Basis {
                    data: Some(snap.mtime),
                    source: source_modified,
                    served_from: ServedFrom::SnapshotFallback,
                    stale: true,
                };
                self.paginate(
                    records.iter(),
                    req,
                    &query,
                    facets,
                    Some(snap.full.last_updated.clone()),
                    diagnostics,
                    basis,
                )
            }
            None => {
                diagnostics.push(Diagnostic::SnapshotMissing);
                ListResponse {
                    vehicles: if req.lite {
                        Vehicles::Lite(Vec::new())
                    } else {
                        Vehicles::Full(Vec::new())
                    },
                    facets: None,
                    last_updated: None,
                    total_count: 0,
                    page: req.page,
                    per_page: req.per_page,
                    total_pages: 0,
                    stale: true,
                    served_from: ServedFrom::None,
                    diagnostics,
                    fingerprint: Basis {
                        data: None,
                        source: source_modified,
                        served_from: ServedFrom::None,
                        stale: true,
                    }
                    .fingerprint(&query),
                }
            }
        }
    }

    /// Fast path: slice the pre-sorted snapshot.
    fn from_snapshot(
        &self,
        snap: &Cached,
        req: &ListRequest,
        query: &str,
        diagnostics: Vec<Diagnostic>,
        basis: Basis,
    ) -> ListResponse {
        let (vehicles, facets, last_updated, total) = if req.lite {
            (
                Vehicles::Lite(page_slice(&snap.lite.vehicles, req.page, req.per_page)),
                &snap.lite.facets,
                &snap.lite.last_updated,
                snap.lite.total_count,
            )
        } else {
            (
                Vehicles::Full(page_slice(&snap.full.vehicles, req.page, req.per_page)),
                &snap.full.facets,
                &snap.full.last_updated,
                snap.full.total_count,
            )
        };
        ListResponse {
            vehicles,
            facets: req.facets.then(|| facets.clone()),
            last_updated: Some(last_updated.clone()),
            total_count: total,
            page: req.page,
            per_page: req.per_page,
            total_pages: total_pages(total, req.per_page),
            stale: basis.stale,
            served_from: basis.served_from,
            diagnostics,
            fingerprint: basis.fingerprint(query),
        }
    }

    /// Filter, sort, and page a record set.
    #[allow(clippy::too_many_arguments)]
    fn paginate<'a>(
        &self,
        records: impl Iterator<Item = &'a VehicleRecord>,
        req: &ListRequest,
        query: &str,
        facets: Option<FacetHistogram>,
        last_updated: Option<String>,
        diagnostics: Vec<Diagnostic>,
        basis: Basis,
    ) -> ListResponse {
        let mut matched: Vec<&VehicleRecord> = records
            .filter(|r| record_passes(r, &req.state, &self.catalog))
            .collect();
        let mut rng = StdRng::seed_from_u64(basis.shuffle_seed(&req.state.canonical_query()));
        sort_records(&mut matched, req.sort, &self.catalog, &mut rng);

        let total = matched.len();
        let page = page_slice(&matched, req.page, req.per_page);
        ListResponse {
            vehicles: project(page.into_iter(), req.lite),
            facets,
            last_updated,
            total_count: total,
            page: req.page,
            per_page: req.per_page,
            total_pages: total_pages(total, req.per_page),
            stale: basis.stale,
            served_from: basis.served_from,
            diagnostics,
            fingerprint: basis.fingerprint(query),
        }
    }

    /// `stock=<key>` on the list endpoint: a list of zero or one vehicles.
    pub async fn list_one(&self, key: &str) -> ListResponse {
        let query = format!("stock={}", key.trim());
        let source_modified = self.source.modified_at().await.ok();
        let (vehicles, served_from, stale, diagnostics) = match self.get_one(key).await {
            Ok(found) => {
                let stale = found.served_from != ServedFrom::Scan;
                (vec![found.vehicle], found.served_from, stale, found.diagnostics)
            }
            Err(e) => {
                tracing::debug!(error = %e, "stock lookup empty");
                (Vec::new(), ServedFrom::Scan, false, Vec::new())
            }
        };
        let snapshot = self.snapshot().await;
        let data = match served_from {
            ServedFrom::SnapshotFallback => snapshot.as_ref().map(|s| s.mtime),
            _ => source_modified,
        };
        let total = vehicles.len();
        ListResponse {
            vehicles: Vehicles::Full(vehicles),
            facets: None,
            last_updated: snapshot.map(|s| s.full.last_updated.clone()),
            total_count: total,
            page: 1,
            per_page: total.max(1),
            total_pages: total,
            stale,
            served_from,
            diagnostics,
            fingerprint: Basis {
                data,
                source: source_modified,
                served_from,
                stale,
            }
            .fingerprint(&query),
        }
    }

    /// Look up one vehicle by stock number or VIN.
    ///
    /// Goes to the Record Source directly. When the source cannot answer,
    /// the current snapshot is searched instead. A key found in neither is
    /// [`CatalogError::NotFound`].
    pub async fn get_one(&self, key: &str) -> Result<Lookup, CatalogError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CatalogError::NotFound(String::new()));
        }

        let timeout = self.config.query.scan_timeout();
        let mut diagnostics = Vec::new();
        match tokio::time::timeout(timeout, self.source.find(key)).await {
            Ok(Ok(Some(row))) => {
                if let Some((vehicle, diags)) = VehicleRecord::from_row(&row) {
                    return Ok(Lookup {
                        vehicle,
                        served_from: ServedFrom::Scan,
                        diagnostics: diags,
                    });
                }
                return Err(CatalogError::NotFound(key.to_string()));
            }
            Ok(Ok(None)) => return Err(CatalogError::NotFound(key.to_string())),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, key, "lookup failed, trying snapshot");
                diagnostics.push(Diagnostic::SourceUnavailable {
                    message: e.to_string(),
                });
            }
            Err(_) => {
                tracing::warn!(key, "lookup timed out, trying snapshot");
                diagnostics.push(Diagnostic::ScanTimedOut {
                    after_ms: timeout.as_millis() as u64,
                });
            }
        }

        self.snapshot()
            .await
            .and_then(|snap| {
                snap.full
                    .vehicles
                    .iter()
                    .find(|v| v.vin == key || (!v.stock.is_empty() && v.stock == key))
                    .cloned()
            })
            .map(|vehicle| Lookup {
                vehicle,
                served_from: ServedFrom::SnapshotFallback,
                diagnostics,
            })
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))
    }
}
