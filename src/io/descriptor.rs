//! Reader for BigEarthNet `_labels_metadata.json` patch descriptors.
//!
//! Each descriptor becomes a single-row `PatchCollection` in the frame stated by
//! the descriptor itself. The `*_reprojected_*` variants additionally move the row
//! into a common target frame so that many rows can be concatenated without any
//! coordinate transform.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::collection::{Column, PatchCollection};
use crate::core::datetime::parse_datetime;
use crate::core::geometry::box_from_ul_lr_coords;
use crate::error::{Error, Result};
use crate::types::{
    CORRESPONDING_S2_PATCH, Crs, LABELS, Modality, NAME, SCENE_SOURCE, TILE_SOURCE,
};

pub const DESCRIPTOR_SUFFIX: &str = "_labels_metadata";
pub const DESCRIPTOR_EXTENSION: &str = "json";

/// A single label or a list of labels, as found in the `labels` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LabelField {
    One(String),
    Many(Vec<String>),
}

impl LabelField {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            LabelField::One(label) => vec![label],
            LabelField::Many(labels) => labels,
        }
    }
}

/// Upper-left and lower-right corners in the descriptor's own frame.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub ulx: f64,
    pub uly: f64,
    pub lrx: f64,
    pub lry: f64,
}

/// Fields shared by both modalities.
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorBase {
    pub labels: LabelField,
    pub coordinates: Coordinates,
    pub projection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S2Descriptor {
    #[serde(flatten)]
    pub base: DescriptorBase,
    pub acquisition_date: String,
    #[serde(default)]
    pub tile_source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S1Descriptor {
    #[serde(flatten)]
    pub base: DescriptorBase,
    pub acquisition_time: String,
    pub corresponding_s2_patch: String,
    #[serde(default)]
    pub scene_source: Option<String>,
}

/// Modality-specific view of a parsed descriptor.
pub trait PatchDescriptor: DeserializeOwned {
    const MODALITY: Modality;

    fn base(&self) -> &DescriptorBase;

    fn raw_timestamp(&self) -> &str;

    /// Attribute columns beyond name, labels and timestamp.
    fn extra_columns(&self) -> Vec<(String, Column)>;
}

impl PatchDescriptor for S2Descriptor {
    const MODALITY: Modality = Modality::S2;

    fn base(&self) -> &DescriptorBase {
        &self.base
    }

    fn raw_timestamp(&self) -> &str {
        &self.acquisition_date
    }

    fn extra_columns(&self) -> Vec<(String, Column)> {
        vec![(
            TILE_SOURCE.to_string(),
            Column::OptionalText(vec![self.tile_source.clone()]),
        )]
    }
}

impl PatchDescriptor for S1Descriptor {
    const MODALITY: Modality = Modality::S1;

    fn base(&self) -> &DescriptorBase {
        &self.base
    }

    fn raw_timestamp(&self) -> &str {
        &self.acquisition_time
    }

    fn extra_columns(&self) -> Vec<(String, Column)> {
        vec![
            (
                CORRESPONDING_S2_PATCH.to_string(),
                Column::Text(vec![self.corresponding_s2_patch.clone()]),
            ),
            (
                SCENE_SOURCE.to_string(),
                Column::OptionalText(vec![self.scene_source.clone()]),
            ),
        ]
    }
}

/// Accept either the descriptor file itself or the patch directory containing it.
pub fn resolve_descriptor_path(patch_path: &Path) -> Result<PathBuf> {
    if patch_path.is_file() {
        return Ok(patch_path.to_path_buf());
    }
    let dir_name = patch_path
        .file_name()
        .ok_or_else(|| Error::NotFound {
            path: patch_path.to_path_buf(),
        })?
        .to_string_lossy();
    let derived = patch_path.join(format!(
        "{}{}.{}",
        dir_name, DESCRIPTOR_SUFFIX, DESCRIPTOR_EXTENSION
    ));
    if derived.is_file() {
        Ok(derived)
    } else {
        Err(Error::NotFound { path: derived })
    }
}

/// Patch name: the descriptor file stem without the `_labels_metadata` suffix.
pub fn patch_name(descriptor_path: &Path) -> Result<String> {
    let stem = descriptor_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::malformed(descriptor_path, "descriptor file name is not valid UTF-8"))?;
    Ok(stem.strip_suffix(DESCRIPTOR_SUFFIX).unwrap_or(stem).to_string())
}

pub fn read_descriptor<D: PatchDescriptor>(descriptor_path: &Path) -> Result<D> {
    let raw = fs::read_to_string(descriptor_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound {
            path: descriptor_path.to_path_buf(),
        },
        _ => Error::Io(e),
    })?;
    serde_json::from_str(&raw).map_err(|e| Error::malformed(descriptor_path, e))
}

fn patch_to_collection<D: PatchDescriptor>(patch_path: &Path) -> Result<PatchCollection> {
    let json_path = resolve_descriptor_path(patch_path)?;
    let descriptor: D = read_descriptor(&json_path)?;
    let modality = D::MODALITY;
    let base = descriptor.base();

    let raw_timestamp = descriptor.raw_timestamp();
    let timestamp = parse_datetime(raw_timestamp)
        .ok_or_else(|| {
            Error::malformed(
                &json_path,
                format!(
                    "cannot parse {} `{}`",
                    modality.timestamp_column(),
                    raw_timestamp
                ),
            )
        })?
        .format(modality.timestamp_format())
        .to_string();

    let Coordinates { ulx, uly, lrx, lry } = base.coordinates;
    if ![ulx, uly, lrx, lry].iter().all(|v| v.is_finite()) {
        return Err(Error::malformed(&json_path, "non-finite corner coordinate"));
    }
    let geometry = box_from_ul_lr_coords(ulx, uly, lrx, lry);

    let mut columns = vec![
        (NAME.to_string(), Column::Text(vec![patch_name(&json_path)?])),
        (
            LABELS.to_string(),
            Column::Labels(vec![base.labels.clone().into_vec()]),
        ),
        (
            modality.timestamp_column().to_string(),
            Column::Text(vec![timestamp]),
        ),
    ];
    columns.extend(descriptor.extra_columns());

    debug!("Parsed {} descriptor {:?}", modality, json_path);
    PatchCollection::new(Crs::new(&base.projection), vec![geometry], columns)
}

/// Single-row collection from a BigEarthNet-S2 descriptor (file or patch directory).
///
/// `acquisition_date` is normalised to `YYYY-MM-DD hh:mm:ss`; the frame is the one
/// stated in the descriptor, the data is not reprojected.
pub fn s2_patch_to_collection(patch_path: &Path) -> Result<PatchCollection> {
    patch_to_collection::<S2Descriptor>(patch_path)
}

/// Single-row collection from a BigEarthNet-S1 descriptor (file or patch directory).
///
/// `acquisition_time` is normalised to `YYYY-MM-DDThh:mm:ss`; the frame is the one
/// stated in the descriptor, the data is not reprojected.
pub fn s1_patch_to_collection(patch_path: &Path) -> Result<PatchCollection> {
    patch_to_collection::<S1Descriptor>(patch_path)
}

pub fn s2_patch_to_reprojected_collection(patch_path: &Path, target: &Crs) -> Result<PatchCollection> {
    s2_patch_to_collection(patch_path)?.to_crs(target)
}

pub fn s1_patch_to_reprojected_collection(patch_path: &Path, target: &Crs) -> Result<PatchCollection> {
    s1_patch_to_collection(patch_path)?.to_crs(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ACQUISITION_DATE, ACQUISITION_TIME};
    use tempfile::TempDir;

    const S2_NAME: &str = "S2A_MSIL2A_20170613T101031_0_45";
    const S1_NAME: &str = "S1A_IW_GRDH_1SDV_20170613T165043_33UUP_0_45";

    fn write_patch(root: &Path, name: &str, body: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}_labels_metadata.json")), body).unwrap();
        dir
    }

    fn s2_body(labels: &str) -> String {
        format!(
            r#"{{"labels": {labels},
                "coordinates": {{"ulx": 600000, "uly": 5300000, "lrx": 601200, "lry": 5298800}},
                "projection": "EPSG:32633",
                "tile_source": "S2A_MSIL1C_20170613T101031_N0205_R022_T33UUP_20170613T101608",
                "acquisition_date": "2017-06-13 10:10:31"}}"#
        )
    }

    #[test]
    fn file_and_directory_yield_the_same_record() {
        let tmp = TempDir::new().unwrap();
        let dir = write_patch(tmp.path(), S2_NAME, &s2_body(r#"["Pastures", "Mixed forest"]"#));
        let file = dir.join(format!("{S2_NAME}_labels_metadata.json"));

        let from_dir = s2_patch_to_collection(&dir).unwrap();
        let from_file = s2_patch_to_collection(&file).unwrap();
        assert_eq!(from_dir, from_file);
        assert_eq!(from_dir.text(NAME).unwrap(), [S2_NAME]);
        assert_eq!(from_dir.text(ACQUISITION_DATE).unwrap(), ["2017-06-13 10:10:31"]);
        assert_eq!(from_dir.crs(), &Crs::new("EPSG:32633"));
        assert_eq!(
            from_dir.labels(LABELS).unwrap(),
            [vec!["Pastures".to_string(), "Mixed forest".to_string()]]
        );
    }

    #[test]
    fn single_label_is_wrapped_in_a_list() {
        let tmp = TempDir::new().unwrap();
        let dir = write_patch(tmp.path(), S2_NAME, &s2_body(r#""Pastures""#));
        let record = s2_patch_to_collection(&dir).unwrap();
        assert_eq!(record.labels(LABELS).unwrap(), [vec!["Pastures".to_string()]]);
    }

    #[test]
    fn s1_timestamp_is_normalised() {
        let tmp = TempDir::new().unwrap();
        let body = r#"{"labels": ["Sea and ocean"],
            "coordinates": {"ulx": 600000, "uly": 5300000, "lrx": 601200, "lry": 5298800},
            "projection": "EPSG:32633",
            "corresponding_s2_patch": "S2A_MSIL2A_20170613T101031_0_45",
            "scene_source": "S1A_IW_GRDH_1SDV_20170613T165043_20170613T165108_017011_01C5A8_5B4F",
            "acquisition_time": "2017-06-13 16:50:43"}"#;
        let dir = write_patch(tmp.path(), S1_NAME, body);
        let record = s1_patch_to_collection(&dir).unwrap();
        assert_eq!(record.text(ACQUISITION_TIME).unwrap(), ["2017-06-13T16:50:43"]);
        assert_eq!(
            record.text(CORRESPONDING_S2_PATCH).unwrap(),
            ["S2A_MSIL2A_20170613T101031_0_45"]
        );
        assert_eq!(record.text(NAME).unwrap(), [S1_NAME]);
    }

    #[test]
    fn missing_descriptor_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(S2_NAME);
        fs::create_dir_all(&dir).unwrap();
        let err = s2_patch_to_collection(&dir).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }), "{err}");
    }

    #[test]
    fn missing_field_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let body = r#"{"labels": ["Pastures"], "projection": "EPSG:32633",
            "acquisition_date": "2017-06-13 10:10:31"}"#;
        let dir = write_patch(tmp.path(), S2_NAME, body);
        let err = s2_patch_to_collection(&dir).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }), "{err}");
    }

    #[test]
    fn unparsable_timestamp_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let body = s2_body(r#"["Pastures"]"#).replace("2017-06-13 10:10:31", "last tuesday");
        let dir = write_patch(tmp.path(), S2_NAME, &body);
        let err = s2_patch_to_collection(&dir).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }), "{err}");
    }

    #[test]
    fn patch_name_strips_only_the_suffix() {
        let path = Path::new("/data/S2B_MSIL2A_20180421T100029_77_11_labels_metadata.json");
        assert_eq!(patch_name(path).unwrap(), "S2B_MSIL2A_20180421T100029_77_11");
    }

    #[test]
    fn reprojection_is_consistent_across_call_sites() {
        let tmp = TempDir::new().unwrap();
        let dir = write_patch(tmp.path(), S2_NAME, &s2_body(r#"["Pastures"]"#));
        let target = Crs::default();

        let a = s2_patch_to_reprojected_collection(&dir, &target).unwrap();
        let b = s2_patch_to_collection(&dir).unwrap().to_crs(&target).unwrap();
        assert_eq!(a.crs(), &target);
        assert_eq!(a.geometry(), b.geometry());
        assert_ne!(
            a.geometry(),
            s2_patch_to_collection(&dir).unwrap().geometry()
        );
    }
}
