use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Crs;

/// Options for building collections, suitable for config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Number of concurrent descriptor workers
    pub n_workers: usize,
    /// Frame every record is reprojected into before concatenation
    pub target_crs: Crs,
    /// Show a progress bar while parsing descriptors
    pub progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            n_workers: 8,
            target_crs: Crs::default(),
            progress: true,
        }
    }
}

impl BuildOptions {
    /// Read options from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        let options: BuildOptions =
            serde_json::from_str(&raw).map_err(|e| Error::malformed(path, e))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_workers == 0 {
            return Err(Error::InvalidArgument {
                arg: "n_workers",
                value: self.n_workers.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_config_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("options.json");
        std::fs::write(&path, r#"{"n_workers": 2, "target_crs": "epsg:4326"}"#).unwrap();
        let options = BuildOptions::from_json_file(&path).unwrap();
        assert_eq!(options.n_workers, 2);
        assert_eq!(options.target_crs, Crs::new("EPSG:4326"));
        assert!(options.progress);
    }

    #[test]
    fn zero_workers_are_rejected() {
        let options = BuildOptions {
            n_workers: 0,
            ..BuildOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(Error::InvalidArgument { arg: "n_workers", .. })
        ));
    }
}
