//! Shared types and enums used across the builder.
//! Includes `Modality`, `Season`, `OriginalSplit`, the `Crs` reference-frame
//! handle and the well-known column names of a patch collection.
use gdal::spatial_ref::{AxisMappingStrategy, SpatialRef};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default target frame: ETRS89 / LAEA Europe.
pub const DEFAULT_TARGET_CRS: &str = "EPSG:3035";

pub const NAME: &str = "name";
pub const GEOMETRY: &str = "geometry";
pub const LABELS: &str = "labels";
pub const ACQUISITION_DATE: &str = "acquisition_date";
pub const ACQUISITION_TIME: &str = "acquisition_time";
pub const CORRESPONDING_S2_PATCH: &str = "corresponding_s2_patch";
pub const TILE_SOURCE: &str = "tile_source";
pub const SCENE_SOURCE: &str = "scene_source";
pub const NEW_LABELS: &str = "new_labels";
pub const SNOW: &str = "snow";
pub const CLOUD_OR_SHADOW: &str = "cloud_or_shadow";
pub const ORIGINAL_SPLIT: &str = "original_split";
pub const COUNTRY: &str = "country";
pub const SEASON: &str = "season";

/// Acquisition modality of a BigEarthNet archive.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Modality {
    /// Sentinel-1 radar patches
    S1,
    /// Sentinel-2 optical patches
    S2,
}

impl Modality {
    /// Column holding the acquisition timestamp.
    pub fn timestamp_column(self) -> &'static str {
        match self {
            Modality::S1 => ACQUISITION_TIME,
            Modality::S2 => ACQUISITION_DATE,
        }
    }

    /// Canonical `strftime` layout of the timestamp column.
    pub fn timestamp_format(self) -> &'static str {
        match self {
            Modality::S1 => "%Y-%m-%dT%H:%M:%S",
            Modality::S2 => "%Y-%m-%d %H:%M:%S",
        }
    }

    /// Column holding the optical patch name used for reference lookups.
    pub fn s2_name_column(self) -> &'static str {
        match self {
            Modality::S1 => CORRESPONDING_S2_PATCH,
            Modality::S2 => NAME,
        }
    }

    /// Columns an enrichment run needs on its input.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Modality::S1 => &[ACQUISITION_TIME, NAME, LABELS, CORRESPONDING_S2_PATCH],
            Modality::S2 => &[ACQUISITION_DATE, NAME, LABELS],
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modality::S1 => write!(f, "S1"),
            Modality::S2 => write!(f, "S2"),
        }
    }
}

/// Meteorological season on the northern hemisphere.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// December, January and February are winter; the rest follows in blocks of three.
    /// Returns `None` for months outside `1..=12`.
    pub fn from_month(month: u32) -> Option<Season> {
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self::ALL[((month % 12) / 3) as usize])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Split a patch was assigned to in the original BigEarthNet release.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum OriginalSplit {
    Train,
    Validation,
    Test,
}

impl OriginalSplit {
    pub fn as_str(self) -> &'static str {
        match self {
            OriginalSplit::Train => "train",
            OriginalSplit::Validation => "validation",
            OriginalSplit::Test => "test",
        }
    }
}

impl std::fmt::Display for OriginalSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coordinate reference system definition (`EPSG:xxxx`, WKT or PROJJSON).
///
/// `epsg:` prefixes are normalised to upper case so that `epsg:3035` and
/// `EPSG:3035` name the same frame.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Crs(String);

impl Crs {
    pub fn new(definition: impl AsRef<str>) -> Self {
        let definition = definition.as_ref().trim();
        match definition.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("epsg:") => {
                Crs(format!("EPSG:{}", &definition[5..]))
            }
            _ => Crs(definition.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// GDAL spatial reference in traditional GIS axis order (x = easting/longitude).
    pub fn spatial_ref(&self) -> Result<SpatialRef> {
        let mut srs = SpatialRef::from_definition(&self.0)?;
        srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        Ok(srs)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::new(DEFAULT_TARGET_CRS)
    }
}

impl From<String> for Crs {
    fn from(definition: String) -> Self {
        Crs::new(definition)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.0
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
