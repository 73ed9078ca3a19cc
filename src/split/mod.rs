//! Split planning.
//!
//! Two ways to partition a pool of images:
//!
//! - [`plan_ratio_split`]: a fresh, seeded split of a document's image ids
//!   into a held-out subset and its complement. Same id set plus same seed
//!   always gives the same membership.
//! - [`plan_even_split`]: a one-off halving of an already materialized split
//!   directory. Seeding is optional here; without a seed every run shuffles
//!   differently.
//!
//! Planning never mutates the filesystem. A destination that already holds
//! files is reported as [`SplitOutcome::AlreadySplit`] and left alone, because
//! artifacts built from an existing split (trained checkpoints, metrics) would
//! silently stop matching it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use walkdir::WalkDir;

use crate::error::CocosplitError;
use crate::ir::ImageId;

/// Result of planning a split that may legitimately do nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitOutcome<T> {
    /// A plan to carry out.
    Planned(T),
    /// The destination already holds files; nothing will be touched.
    AlreadySplit { destination: PathBuf },
    /// Too few items to move anything.
    InsufficientData { available: usize },
}

/// Membership of a fresh ratio split. Both sides are sorted ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatioSplit {
    /// The named subset (e.g. `val`).
    pub held_out: Vec<ImageId>,
    /// Everything else (e.g. what stays in `train`).
    pub remainder: Vec<ImageId>,
}

/// Membership of an even split of a directory. Both sides are sorted by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvenSplit {
    /// File names to move into the new split.
    pub moved: Vec<String>,
    /// File names that stay where they are.
    pub kept: Vec<String>,
}

/// Size of the held-out subset for `total` items: `max(1, floor(fraction * total))`,
/// never more than `total`.
pub fn held_out_count(total: usize, fraction: f64) -> usize {
    if total == 0 {
        return 0;
    }
    let raw = (total as f64 * fraction).floor() as usize;
    raw.clamp(1, total)
}

/// Seeded split of `ids` into a held-out subset of [`held_out_count`] ids and
/// the remainder.
///
/// The input order is irrelevant: ids are sorted and de-duplicated before the
/// seeded shuffle, so the result depends only on the id set and the seed.
///
/// # Errors
/// [`CocosplitError::InvalidConfig`] unless `0 < fraction < 1`.
pub fn plan_ratio_split(
    ids: &[ImageId],
    fraction: f64,
    seed: u64,
) -> Result<RatioSplit, CocosplitError> {
    validate_fraction(fraction)?;

    let mut pool = ids.to_vec();
    pool.sort();
    pool.dedup();

    let k = held_out_count(pool.len(), fraction);
    shuffle(&mut pool, Some(seed));

    let mut remainder = pool.split_off(k);
    let mut held_out = pool;
    held_out.sort();
    remainder.sort();

    debug!(
        "ratio split: {} held out, {} remaining (fraction {}, seed {})",
        held_out.len(),
        remainder.len(),
        fraction,
        seed
    );

    Ok(RatioSplit {
        held_out,
        remainder,
    })
}

/// Plan moving half of the files in `source_dir` into `destination_dir`.
///
/// `floor(n / 2)` files are chosen at random; with `seed` set the choice is
/// reproducible. Returns [`SplitOutcome::AlreadySplit`] when the destination
/// already holds entries and [`SplitOutcome::InsufficientData`] when fewer
/// than two files are available.
pub fn plan_even_split(
    source_dir: &Path,
    destination_dir: &Path,
    seed: Option<u64>,
) -> Result<SplitOutcome<EvenSplit>, CocosplitError> {
    if dir_is_populated(destination_dir)? {
        return Ok(SplitOutcome::AlreadySplit {
            destination: destination_dir.to_path_buf(),
        });
    }

    if !source_dir.is_dir() {
        return Ok(SplitOutcome::InsufficientData { available: 0 });
    }

    let mut files = list_file_names(source_dir)?;
    let available = files.len();
    let k = available / 2;
    if k == 0 {
        return Ok(SplitOutcome::InsufficientData { available });
    }

    shuffle(&mut files, seed);
    let mut kept = files.split_off(k);
    let mut moved = files;
    moved.sort();
    kept.sort();

    Ok(SplitOutcome::Planned(EvenSplit { moved, kept }))
}

/// True when `dir` exists and contains at least one entry.
pub fn dir_is_populated(dir: &Path) -> Result<bool, CocosplitError> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) if !dir.is_dir() && dir.exists() => Err(CocosplitError::InvalidConfig {
            message: format!("{} exists but is not a directory ({err})", dir.display()),
        }),
        Err(err) => Err(CocosplitError::Io(err)),
    }
}

/// Names of the regular files directly inside `dir`, sorted.
pub fn list_file_names(dir: &Path) -> Result<Vec<String>, CocosplitError> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| {
            CocosplitError::Io(source.into_io_error().unwrap_or_else(|| {
                io::Error::other(format!("failed to list {}", dir.display()))
            }))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => warn!("skipping non UTF-8 file name {}", entry.path().display()),
        }
    }

    names.sort();
    Ok(names)
}

fn validate_fraction(fraction: f64) -> Result<(), CocosplitError> {
    if fraction.is_finite() && 0.0 < fraction && fraction < 1.0 {
        Ok(())
    } else {
        Err(CocosplitError::InvalidConfig {
            message: format!("split fraction must be in the open interval (0, 1), got {fraction}"),
        })
    }
}

fn shuffle<T>(items: &mut [T], seed: Option<u64>) {
    match seed {
        Some(seed) => items.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => items.shuffle(&mut rand::rng()),
    }
}
