//! Enumerate BigEarthNet patch directories below an archive root.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Modality;

fn patch_name_pattern(modality: Modality) -> &'static Regex {
    static S1: OnceLock<Regex> = OnceLock::new();
    static S2: OnceLock<Regex> = OnceLock::new();
    match modality {
        Modality::S1 => S1.get_or_init(|| {
            Regex::new(r"^S1[AB]_IW_GRDH_1SDV_\d{8}T\d{6}_[0-9A-Z]{5}_\d+_\d+$")
                .expect("static S1 patch pattern")
        }),
        Modality::S2 => S2.get_or_init(|| {
            Regex::new(r"^S2[AB]_MSIL2A_\d{8}T\d{6}_\d+_\d+$").expect("static S2 patch pattern")
        }),
    }
}

/// Whether `name` follows the patch naming scheme of the modality.
pub fn is_patch_name(modality: Modality, name: &str) -> bool {
    patch_name_pattern(modality).is_match(name)
}

/// Sub-directories of `root` named like patches of `modality`, sorted by name.
/// Other entries are ignored.
pub fn patch_directories(root: &Path, modality: Modality) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotFound {
            path: root.to_path_buf(),
        });
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| is_patch_name(modality, n));
        if matches {
            dirs.push(path);
        } else {
            debug!("Skipping non-patch entry: {:?}", path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

pub fn s2_patch_directories(root: &Path) -> Result<Vec<PathBuf>> {
    patch_directories(root, Modality::S2)
}

pub fn s1_patch_directories(root: &Path) -> Result<Vec<PathBuf>> {
    patch_directories(root, Modality::S1)
}
