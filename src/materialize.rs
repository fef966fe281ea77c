//! Cache Materializer job.
//!
//! Reads the Record Source, runs the pure
//! [`lot_catalog_core::snapshot::materialize`] step, and writes the full
//! and lite snapshot files.
//!
//! # Guarantees
//!
//! - **Abort before write.** The source's modification time and rows are
//!   both read before any file is touched; an unreadable source fails the
//!   job and leaves the previous snapshots in place.
//! - **Atomic files.** Each snapshot is written to a temp file in the
//!   snapshot directory and renamed over the old one, so readers see either
//!   the old file or the new one.
//! - **Single writer.** A `.materialize.lock` file, created exclusively,
//!   guards the directory for the duration of the run.
//! - **Generation time on disk.** Both files are stamped with the run's
//!   generation time as their mtime, so any rebuild (forced or not) is
//!   visible to readers that key on it.
//! - **Cheap no-op.** A small stamp file written after both snapshots
//!   records the source modification time they were built from. If that is
//!   already at least the source's current mtime the run is skipped unless
//!   forced.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use lot_catalog_core::error::Diagnostic;
use lot_catalog_core::snapshot::{self, Snapshot, FULL_FILE, LITE_FILE};
use lot_catalog_core::source::RecordSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;

use crate::config::Config;

const LOCK_FILE: &str = ".materialize.lock";
const STAMP_FILE: &str = ".snapshot_stamp.json";

/// A lock older than this is assumed abandoned by a crashed run.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(15 * 60);

/// Outcome of one materializer run.
#[derive(Debug)]
pub struct MaterializeReport {
    /// False when the snapshots were already current.
    pub written: bool,
    pub source_modified: DateTime<Utc>,
    pub total_count: usize,
    pub skipped_rows: usize,
    pub duplicate_vins: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn full_path(config: &Config) -> PathBuf {
    config.snapshot.dir.join(FULL_FILE)
}

pub fn lite_path(config: &Config) -> PathBuf {
    config.snapshot.dir.join(LITE_FILE)
}

/// What the current snapshots were built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stamp {
    source_modified: DateTime<Utc>,
    generated_at: DateTime<Utc>,
}

fn read_stamp(config: &Config) -> Option<Stamp> {
    let bytes = fs::read(config.snapshot.dir.join(STAMP_FILE)).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Modification time of a file, if it exists.
pub fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

/// Generation time of the current snapshots: the older of the two file
/// mtimes, or `None` if either is missing.
pub async fn snapshots_generated(config: &Config) -> Option<DateTime<Utc>> {
    let full = tokio::fs::metadata(full_path(config)).await.ok()?.modified().ok()?;
    let lite = tokio::fs::metadata(lite_path(config)).await.ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(full.min(lite)))
}

/// Exclusive hold on a snapshot directory. Removed on drop.
struct DirLock {
    path: PathBuf,
}

impl DirLock {
    fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        for attempt in 0..2 {
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut f) => {
                    let _ = writeln!(f, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt == 0 => {
                    let abandoned = fs::metadata(&path)
                        .and_then(|m| m.modified())
                        .ok()
                        .and_then(|m| SystemTime::now().duration_since(m).ok())
                        .is_some_and(|age| age > LOCK_STALE_AFTER);
                    if !abandoned {
                        bail!(
                            "another materialization holds {}; remove it if no run is active",
                            path.display()
                        );
                    }
                    tracing::warn!(lock = %path.display(), "removing abandoned lock");
                    let _ = fs::remove_file(&path);
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create {}", path.display()))
                }
            }
        }
        bail!("could not acquire {}", path.display())
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Serialize `value` to `path` through a temp file, stamping `mtime`.
fn write_atomic<T: Serialize>(path: &Path, value: &T, mtime: DateTime<Utc>) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.as_file().set_modified(SystemTime::from(mtime))?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Run the materializer against `source`.
pub async fn materialize_snapshots(
    config: &Config,
    source: &dyn RecordSource,
    force: bool,
) -> Result<MaterializeReport> {
    let source_modified = source
        .modified_at()
        .await
        .with_context(|| "Record source unreadable; snapshots left untouched")?;

    if !force {
        let present = file_mtime(&full_path(config)).is_some() && file_mtime(&lite_path(config)).is_some();
        if let Some(stamp) = read_stamp(config).filter(|_| present) {
            if stamp.source_modified >= source_modified {
                tracing::debug!(%source_modified, "snapshots current, skipping");
                return Ok(MaterializeReport {
                    written: false,
                    source_modified,
                    total_count: 0,
                    skipped_rows: 0,
                    duplicate_vins: 0,
                    diagnostics: Vec::new(),
                });
            }
        }
    }

    let dir = &config.snapshot.dir;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create snapshot dir: {}", dir.display()))?;
    let _lock = DirLock::acquire(dir)?;

    let batch = source
        .fetch_all()
        .await
        .with_context(|| "Record source unreadable; snapshots left untouched")?;
    let catalog = config.catalog()?;
    let zone = config.display_zone()?;
    let generated_at = Utc::now();
    let out = snapshot::materialize(&batch, &catalog, source_modified, generated_at, &zone)
        .with_context(|| "Record source schema unusable; snapshots left untouched")?;

    write_atomic(&full_path(config), &out.full, generated_at)?;
    write_atomic(&lite_path(config), &out.lite, generated_at)?;
    let stamp = Stamp {
        source_modified,
        generated_at,
    };
    write_atomic(&dir.join(STAMP_FILE), &stamp, generated_at)?;

    for d in &out.diagnostics {
        tracing::warn!(diagnostic = %d, "degraded during materialization");
    }
    tracing::info!(
        vehicles = out.full.total_count,
        skipped = out.skipped_rows,
        duplicates = out.duplicate_vins,
        "materialized snapshots"
    );

    Ok(MaterializeReport {
        written: true,
        source_modified,
        total_count: out.full.total_count,
        skipped_rows: out.skipped_rows,
        duplicate_vins: out.duplicate_vins,
        diagnostics: out.diagnostics,
    })
}

/// Read a snapshot file written by [`materialize_snapshots`].
pub fn read_snapshot<V: serde::de::DeserializeOwned>(path: &Path) -> Result<Snapshot<V>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
    let snapshot = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
    Ok(snapshot)
}

pub async fn run_materialize(config: &Config, source: &dyn RecordSource, force: bool) -> Result<()> {
    let report = materialize_snapshots(config, source, force).await?;
    if !report.written {
        println!("materialize: snapshots current ({})", report.source_modified.to_rfc3339());
        return Ok(());
    }
    println!("materialize");
    println!("  vehicles: {}", report.total_count);
    println!("  skipped rows: {}", report.skipped_rows);
    println!("  duplicate VINs: {}", report.duplicate_vins);
    println!("  diagnostics: {}", report.diagnostics.len());
    println!("  source modified: {}", report.source_modified.to_rfc3339());
    println!("ok");
    Ok(())
}
