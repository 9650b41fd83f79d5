//! Per-patch reference lists published with BigEarthNet: patches covered by
//! seasonal snow, patches covered by clouds or shadows, and the original
//! train/validation/test assignment. All lists are keyed by the S2 patch name.
use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::types::OriginalSplit;

pub const SNOW_FILE: &str = "patches_with_seasonal_snow.csv";
pub const CLOUD_SHADOW_FILE: &str = "patches_with_cloud_and_shadow.csv";
pub const SPLIT_FILES: [(&str, OriginalSplit); 3] = [
    ("train.csv", OriginalSplit::Train),
    ("val.csv", OriginalSplit::Validation),
    ("test.csv", OriginalSplit::Test),
];

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    snowy: HashSet<String>,
    cloudy_shadowy: HashSet<String>,
    splits: HashMap<String, OriginalSplit>,
}

impl ReferenceData {
    pub fn new<I, J, K>(snowy: I, cloudy_shadowy: J, splits: K) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
        K: IntoIterator<Item = (String, OriginalSplit)>,
    {
        Self {
            snowy: snowy.into_iter().collect(),
            cloudy_shadowy: cloudy_shadowy.into_iter().collect(),
            splits: splits.into_iter().collect(),
        }
    }

    /// Load all lists from a directory holding the published CSV files.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let snowy = read_patch_names(&dir.join(SNOW_FILE))?;
        let cloudy_shadowy = read_patch_names(&dir.join(CLOUD_SHADOW_FILE))?;
        let mut splits = HashMap::new();
        for (file, split) in SPLIT_FILES {
            for name in read_patch_names(&dir.join(file))? {
                splits.insert(name, split);
            }
        }
        info!(
            "Loaded reference lists from {:?}: {} snowy, {} cloudy/shadowy, {} with split",
            dir,
            snowy.len(),
            cloudy_shadowy.len(),
            splits.len()
        );
        Ok(Self {
            snowy: snowy.into_iter().collect(),
            cloudy_shadowy: cloudy_shadowy.into_iter().collect(),
            splits,
        })
    }

    pub fn is_snowy(&self, s2_name: &str) -> bool {
        self.snowy.contains(s2_name)
    }

    pub fn is_cloudy_shadowy(&self, s2_name: &str) -> bool {
        self.cloudy_shadowy.contains(s2_name)
    }

    pub fn original_split(&self, s2_name: &str) -> Option<OriginalSplit> {
        self.splits.get(s2_name).copied()
    }
}

/// First field of every non-empty row; the files carry no header.
fn read_patch_names(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut names = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(name) = record.get(0).map(str::trim).filter(|n| !n.is_empty()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
