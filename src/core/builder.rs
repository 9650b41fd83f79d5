//! Parallel assembly of patch collections from many patch directories.
//!
//! Every path is parsed by a per-path builder on a bounded rayon pool. The
//! builder must already return rows in the common target frame, so merging is a
//! plain row-wise concatenation in input order.
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::collection::PatchCollection;
use crate::core::params::BuildOptions;
use crate::error::{Error, Result};
use crate::io::descriptor::{s1_patch_to_reprojected_collection, s2_patch_to_reprojected_collection};
use crate::io::directories::patch_directories;
use crate::types::{Crs, Modality};

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} patches ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("##-");
    pb.set_style(style);
    pb
}

/// Apply `builder` to every path with `options.n_workers` workers and stack the
/// results in input order.
///
/// The first failing path aborts the whole build. Empty input, or input whose
/// parts hold no rows at all, is reported as [`Error::EmptyResult`] naming the
/// attempted paths.
pub fn parallel_collection_builder<F>(
    paths: &[PathBuf],
    builder: F,
    options: &BuildOptions,
) -> Result<PatchCollection>
where
    F: Fn(&Path, &Crs) -> Result<PatchCollection> + Sync,
{
    options.validate()?;
    if paths.is_empty() {
        return Err(Error::EmptyResult { paths: Vec::new() });
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.n_workers)
        .build()?;
    let target = &options.target_crs;
    let pb = progress_bar(paths.len(), options.progress);
    debug!(
        "Parsing {} patches with {} workers into {}",
        paths.len(),
        options.n_workers,
        target
    );

    let parts = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let part = builder(path, target);
                pb.inc(1);
                part
            })
            .collect::<Result<Vec<_>>>()
    });
    pb.finish_and_clear();

    let parts: Vec<PatchCollection> = parts?.into_iter().filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return Err(Error::EmptyResult {
            paths: paths.to_vec(),
        });
    }
    let collection = PatchCollection::concat(parts)?;
    info!("Built collection with {} rows", collection.len());
    Ok(collection)
}

/// Build one collection from S2 patch directories or descriptor files.
pub fn build_collection_from_s2_patch_paths(
    paths: &[PathBuf],
    options: &BuildOptions,
) -> Result<PatchCollection> {
    parallel_collection_builder(paths, s2_patch_to_reprojected_collection, options)
}

/// Build one collection from S1 patch directories or descriptor files.
pub fn build_collection_from_s1_patch_paths(
    paths: &[PathBuf],
    options: &BuildOptions,
) -> Result<PatchCollection> {
    parallel_collection_builder(paths, s1_patch_to_reprojected_collection, options)
}

/// Scan `root` for patch directories of `modality` and build their collection.
pub fn collection_from_patch_dir(
    root: &Path,
    modality: Modality,
    options: &BuildOptions,
) -> Result<PatchCollection> {
    let paths = patch_directories(root, modality)?;
    info!("Found {} {} patch directories in {:?}", paths.len(), modality, root);
    if paths.is_empty() {
        return Err(Error::EmptyResult {
            paths: vec![root.to_path_buf()],
        });
    }
    match modality {
        Modality::S1 => build_collection_from_s1_patch_paths(&paths, options),
        Modality::S2 => build_collection_from_s2_patch_paths(&paths, options),
    }
}

pub fn collection_from_s2_patch_dir(root: &Path, options: &BuildOptions) -> Result<PatchCollection> {
    collection_from_patch_dir(root, Modality::S2, options)
}

pub fn collection_from_s1_patch_dir(root: &Path, options: &BuildOptions) -> Result<PatchCollection> {
    collection_from_patch_dir(root, Modality::S1, options)
}
