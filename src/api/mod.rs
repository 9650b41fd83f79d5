//! High-level pipeline entry points.
//!
//! Each function reads or builds a collection, runs one stage and persists the
//! result as Parquet, returning the absolute path of what it wrote. The
//! recommended builds chain the stages through a [`WorkDir`] so an interrupted
//! run leaves its intermediates behind for inspection.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::builder::collection_from_patch_dir;
use crate::core::filter::remove_bad_ben_entries;
use crate::core::metadata::{EnrichmentSources, add_full_ben_s1_metadata, add_full_ben_s2_metadata};
use crate::core::params::BuildOptions;
use crate::error::{Error, Result};
use crate::io::borders::BoundaryProvider;
use crate::io::parquet::{read_collection, write_collection};
use crate::io::reference::ReferenceData;
use crate::types::Modality;

pub const RAW_S1_OUTPUT: &str = "raw_ben_s1_gdf.parquet";
pub const RAW_S2_OUTPUT: &str = "raw_ben_s2_gdf.parquet";
pub const EXTENDED_S1_OUTPUT: &str = "extended_ben_s1_gdf.parquet";
pub const EXTENDED_S2_OUTPUT: &str = "extended_ben_s2_gdf.parquet";
pub const CLEANED_OUTPUT: &str = "cleaned_ben_gdf.parquet";
pub const FINAL_S1_OUTPUT: &str = "final_ben_s1.parquet";
pub const FINAL_S2_OUTPUT: &str = "final_ben_s2.parquet";
/// Name of the raw collection inside the work directory.
pub const INTERMEDIATE_RAW: &str = "raw_ben_gdf.parquet";

const APP_DIR_NAME: &str = "ben-gdf-builder";

/// Scratch directory for intermediate artifacts. Never cleaned up automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Use (and create) `root` as work directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root: fs::canonicalize(&root)?,
        })
    }

    /// Per-user data directory of this tool, falling back to the system temp dir.
    pub fn user_default() -> Result<Self> {
        let base = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join(APP_DIR_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }
}

/// Everything a recommended build needs besides the archive and the output path.
pub struct RecommendedBuild<'a> {
    pub work_dir: &'a WorkDir,
    pub options: &'a BuildOptions,
    pub reference: &'a ReferenceData,
    /// Country boundaries for the enrichment stage; `None` skips enrichment.
    pub borders: Option<&'a dyn BoundaryProvider>,
}

fn resolve_existing(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })
}

/// Sibling of `path` called `name`; `name` must be a bare file name.
fn sibling(path: &Path, name: &str) -> Result<PathBuf> {
    if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
        return Err(Error::InvalidArgument {
            arg: "output_name",
            value: name.to_string(),
        });
    }
    Ok(path.with_file_name(name))
}

fn build_raw_parquet(
    modality: Modality,
    ben_path: &Path,
    output_path: &Path,
    options: &BuildOptions,
) -> Result<PathBuf> {
    let output_path = std::path::absolute(output_path)?;
    let collection = collection_from_patch_dir(ben_path, modality, options)?;
    write_collection(&collection, &output_path)?;
    info!("Output written to: {:?}", output_path);
    Ok(output_path)
}

/// Build a fresh BigEarthNet-S2 collection from the patch directories below
/// `ben_path` and write it to `output_path`.
///
/// Fails with [`Error::EmptyResult`] if `ben_path` holds no S2 patch directory.
pub fn build_raw_ben_s2_parquet(
    ben_path: &Path,
    output_path: &Path,
    options: &BuildOptions,
) -> Result<PathBuf> {
    build_raw_parquet(Modality::S2, ben_path, output_path, options)
}

/// Build a fresh BigEarthNet-S1 collection from the patch directories below
/// `ben_path` and write it to `output_path`.
pub fn build_raw_ben_s1_parquet(
    ben_path: &Path,
    output_path: &Path,
    options: &BuildOptions,
) -> Result<PathBuf> {
    build_raw_parquet(Modality::S1, ben_path, output_path, options)
}

fn extend_parquet(
    modality: Modality,
    ben_parquet_path: &Path,
    output_name: &str,
    sources: &EnrichmentSources<'_>,
) -> Result<PathBuf> {
    let path = resolve_existing(ben_parquet_path)?;
    let output_path = sibling(&path, output_name)?;
    let collection = read_collection(&path)?;
    let extended = match modality {
        Modality::S1 => add_full_ben_s1_metadata(collection, sources)?,
        Modality::S2 => add_full_ben_s2_metadata(collection, sources)?,
    };
    write_collection(&extended, &output_path)?;
    info!("Output written to: {:?}", output_path);
    Ok(output_path)
}

/// Add the full metadata to a persisted S2 collection built by this crate.
/// The result is written next to the input as `output_name`.
pub fn extend_ben_s2_parquet(
    ben_parquet_path: &Path,
    output_name: &str,
    sources: &EnrichmentSources<'_>,
) -> Result<PathBuf> {
    extend_parquet(Modality::S2, ben_parquet_path, output_name, sources)
}

/// Add the full metadata to a persisted S1 collection built by this crate.
/// The result is written next to the input as `output_name`.
pub fn extend_ben_s1_parquet(
    ben_parquet_path: &Path,
    output_name: &str,
    sources: &EnrichmentSources<'_>,
) -> Result<PathBuf> {
    extend_parquet(Modality::S1, ben_parquet_path, output_name, sources)
}

/// Drop discouraged patches from a persisted S1 or S2 collection.
///
/// Only `labels` and the S2 name column are required. The result is written
/// next to the input as `output_name`.
pub fn remove_discouraged_parquet_entries(
    ben_parquet_path: &Path,
    output_name: &str,
    reference: &ReferenceData,
) -> Result<PathBuf> {
    let path = resolve_existing(ben_parquet_path)?;
    let output_path = sibling(&path, output_name)?;
    let cleaned = remove_bad_ben_entries(read_collection(&path)?, reference)?;
    write_collection(&cleaned, &output_path)?;
    info!("Output written to: {:?}", output_path);
    Ok(output_path)
}

fn build_recommended_parquet(
    modality: Modality,
    ben_path: &Path,
    output_path: &Path,
    build: &RecommendedBuild<'_>,
) -> Result<PathBuf> {
    let output_path = std::path::absolute(output_path)?;
    info!("Intermediate results will be written to {:?}", build.work_dir.path());

    let raw_path = build_raw_parquet(
        modality,
        ben_path,
        &build.work_dir.join(INTERMEDIATE_RAW),
        build.options,
    )?;
    info!("Removing discouraged entries");
    let mut stage_path = remove_discouraged_parquet_entries(&raw_path, CLEANED_OUTPUT, build.reference)?;

    if let Some(borders) = build.borders {
        info!("Adding metadata");
        let sources = EnrichmentSources {
            reference: build.reference,
            borders,
            crs: build.options.target_crs.clone(),
        };
        stage_path = match modality {
            Modality::S1 => extend_ben_s1_parquet(&stage_path, EXTENDED_S1_OUTPUT, &sources)?,
            Modality::S2 => extend_ben_s2_parquet(&stage_path, EXTENDED_S2_OUTPUT, &sources)?,
        };
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&stage_path, &output_path)?;
    info!("Final result copied to {:?}", output_path);
    Ok(output_path)
}

/// Raw S2 build, quality filter and (optionally) enrichment in one go.
/// The final collection is copied to `output_path`.
pub fn build_recommended_s2_parquet(
    ben_path: &Path,
    output_path: &Path,
    build: &RecommendedBuild<'_>,
) -> Result<PathBuf> {
    build_recommended_parquet(Modality::S2, ben_path, output_path, build)
}

/// Raw S1 build, quality filter and (optionally) enrichment in one go.
/// The final collection is copied to `output_path`.
pub fn build_recommended_s1_parquet(
    ben_path: &Path,
    output_path: &Path,
    build: &RecommendedBuild<'_>,
) -> Result<PathBuf> {
    build_recommended_parquet(Modality::S1, ben_path, output_path, build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn output_names_must_be_bare_file_names() {
        let input = Path::new("/data/raw.parquet");
        assert_eq!(
            sibling(input, "cleaned.parquet").unwrap(),
            Path::new("/data/cleaned.parquet")
        );
        assert!(matches!(
            sibling(input, "../cleaned.parquet"),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(sibling(input, "").is_err());
    }

    #[test]
    fn work_dir_is_created() {
        let tmp = TempDir::new().unwrap();
        let work_dir = WorkDir::new(tmp.path().join("a").join("b")).unwrap();
        assert!(work_dir.path().is_dir());
        assert_eq!(work_dir.join("x.parquet").parent(), Some(work_dir.path()));
    }

    #[test]
    fn missing_input_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let reference = ReferenceData::default();
        let err = remove_discouraged_parquet_entries(
            &tmp.path().join("absent.parquet"),
            CLEANED_OUTPUT,
            &reference,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
