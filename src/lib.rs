#![doc = r#"
BEN-GDF — build geospatial patch collections from BigEarthNet archives.

This crate turns the per-patch `*_labels_metadata.json` descriptors of the
BigEarthNet-S1 and BigEarthNet-S2 archives into one column-oriented collection
of patch footprints, enriches it with derived metadata (19-class labels,
snow/cloud flags, original split, country, season), removes patches that are
discouraged for training and persists everything as Parquet. It powers the
`ben-gdf` CLI and can be embedded in your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: the recommended S2 collection
------------------------------------------
```rust,no_run
use std::path::Path;
use ben_gdf_builder::{
    build_recommended_s2_parquet, BuildOptions, NaturalEarthBoundaries, RecommendedBuild,
    ReferenceData, WorkDir,
};

fn main() -> ben_gdf_builder::Result<()> {
    let work_dir = WorkDir::user_default()?;
    let options = BuildOptions::default();
    let reference = ReferenceData::from_dir(Path::new("/data/ben-reference"))?;
    let borders = NaturalEarthBoundaries::with_cache_dir(work_dir.path());

    let build = RecommendedBuild {
        work_dir: &work_dir,
        options: &options,
        reference: &reference,
        borders: Some(&borders),
    };
    let written = build_recommended_s2_parquet(
        Path::new("/data/BigEarthNet-v1.0"),
        Path::new("final_ben_s2.parquet"),
        &build,
    )?;
    println!("{}", written.display());
    Ok(())
}
```

Working with collections in memory
----------------------------------
```rust,no_run
use std::path::Path;
use ben_gdf_builder::{
    collection_from_s1_patch_dir, remove_bad_ben_entries, BuildOptions, ReferenceData,
};

fn main() -> ben_gdf_builder::Result<()> {
    let options = BuildOptions { n_workers: 16, ..BuildOptions::default() };
    let raw = collection_from_s1_patch_dir(Path::new("/data/BigEarthNet-S1-v1.0"), &options)?;
    let reference = ReferenceData::from_dir(Path::new("/data/ben-reference"))?;
    let cleaned = remove_bad_ben_entries(raw, &reference)?;
    println!("{} patches remain", cleaned.len());
    Ok(())
}
```

Error handling
--------------
All public functions return `ben_gdf_builder::Result<T>`; match on
`ben_gdf_builder::Error` to handle specific cases.

```rust,no_run
use std::path::Path;
use ben_gdf_builder::{build_raw_ben_s2_parquet, BuildOptions, Error};

fn main() {
    let options = BuildOptions::default();
    match build_raw_ben_s2_parquet(Path::new("/empty"), Path::new("raw.parquet"), &options) {
        Ok(path) => println!("written to {}", path.display()),
        Err(Error::EmptyResult { paths }) => eprintln!("no patches in {paths:?}"),
        Err(Error::NotFound { path }) => eprintln!("missing {}", path.display()),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — pipeline entry points writing Parquet files.
- [`core`] — collection type, parallel builder, enrichment and filtering.
- [`io`] — descriptors, directory scanning, reference lists, boundaries, Parquet.
- [`types`] — column names, `Modality`, `Season`, `OriginalSplit`, `Crs`.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Types
pub use crate::core::collection::{Column, PatchCollection};
pub use crate::core::metadata::EnrichmentSources;
pub use crate::core::params::BuildOptions;
pub use error::{Error, Result};
pub use types::{Crs, Modality, OriginalSplit, Season};

// Readers and reference data
pub use io::borders::{BoundaryCollection, BoundaryProvider, NaturalEarthBoundaries, StaticBoundaries};
pub use io::parquet::{read_collection, write_collection};
pub use io::reference::ReferenceData;

// Collection building and processing
pub use crate::core::builder::{
    build_collection_from_s1_patch_paths, build_collection_from_s2_patch_paths,
    collection_from_s1_patch_dir, collection_from_s2_patch_dir, parallel_collection_builder,
};
pub use crate::core::country::assign_to_ben_country;
pub use crate::core::filter::remove_bad_ben_entries;
pub use crate::core::metadata::{add_full_ben_s1_metadata, add_full_ben_s2_metadata, filter_season};
pub use io::descriptor::{
    s1_patch_to_collection, s1_patch_to_reprojected_collection, s2_patch_to_collection,
    s2_patch_to_reprojected_collection,
};

// High-level API re-exports
pub use api::{
    RecommendedBuild, WorkDir, build_raw_ben_s1_parquet, build_raw_ben_s2_parquet,
    build_recommended_s1_parquet, build_recommended_s2_parquet, extend_ben_s1_parquet,
    extend_ben_s2_parquet, remove_discouraged_parquet_entries,
};
