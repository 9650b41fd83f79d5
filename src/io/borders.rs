//! Country boundaries used to assign patches to a BigEarthNet country.
//!
//! The reference data is the Natural Earth 10m admin-0 countries layer. It is
//! downloaded once into the user data directory and read through GDAL's
//! `/vsizip/` handler, so the archive is never unpacked on disk.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use gdal::Dataset;
use gdal::vector::{FieldValue, LayerAccess};
use geo::{Geometry, MultiPolygon};
use tracing::{debug, info, warn};

use crate::core::geometry::Reprojector;
use crate::error::{Error, Result};
use crate::types::Crs;

pub const COUNTRIES_URL: &str = "https://www.naturalearthdata.com/http//www.naturalearthdata.com/download/10m/cultural/ne_10m_admin_0_countries.zip";
pub const COUNTRIES_ARCHIVE: &str = "ne_10m_admin_0_countries.zip";
const COUNTRIES_SHAPEFILE: &str = "ne_10m_admin_0_countries.shp";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/39.0.2171.95 Safari/537.36";

/// ISO-A2 codes of the countries covered by BigEarthNet.
pub const BEN_COUNTRIES_ISO_A2: [&str; 10] =
    ["AT", "BE", "CH", "FI", "IE", "LT", "LU", "PT", "RS", "XK"];

/// One country of the reference layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryEntry {
    pub iso_a3: String,
    pub iso_a2: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCollection {
    crs: Crs,
    entries: Vec<BoundaryEntry>,
}

impl BoundaryCollection {
    pub fn new(crs: Crs, entries: Vec<BoundaryEntry>) -> Self {
        Self { crs, entries }
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn entries(&self) -> &[BoundaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep the entries whose ISO-A2 code is listed.
    pub fn retain_iso_a2(mut self, codes: &[&str]) -> Self {
        self.entries
            .retain(|entry| codes.contains(&entry.iso_a2.as_str()));
        self
    }

    pub fn to_crs(&self, target: &Crs) -> Result<BoundaryCollection> {
        let reprojector = Reprojector::new(&self.crs, target)?;
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                Ok(BoundaryEntry {
                    geometry: reprojector.multi_polygon(&entry.geometry)?,
                    ..entry.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BoundaryCollection {
            crs: target.clone(),
            entries,
        })
    }
}

/// Source of the country boundary collection.
pub trait BoundaryProvider {
    fn boundaries(&self) -> Result<BoundaryCollection>;
}

/// Boundaries that are already in memory.
#[derive(Debug, Clone)]
pub struct StaticBoundaries(pub BoundaryCollection);

impl BoundaryProvider for StaticBoundaries {
    fn boundaries(&self) -> Result<BoundaryCollection> {
        Ok(self.0.clone())
    }
}

/// Natural Earth admin-0 countries, restricted to the BigEarthNet countries.
#[derive(Debug, Clone)]
pub struct NaturalEarthBoundaries {
    url: String,
    cache_dir: PathBuf,
}

impl NaturalEarthBoundaries {
    /// Cache the archive below the given directory.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: COUNTRIES_URL.to_string(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn archive_path(&self) -> PathBuf {
        self.cache_dir.join(COUNTRIES_ARCHIVE)
    }

    fn ensure_archive(&self) -> Result<PathBuf> {
        let archive = self.archive_path();
        if archive.is_file() {
            debug!("Using cached country borders: {:?}", archive);
            return Ok(archive);
        }
        fs::create_dir_all(&self.cache_dir)?;
        info!("Downloading country borders from {}", self.url);

        let unavailable = |e: reqwest::Error| Error::UpstreamUnavailable(format!("{}: {}", self.url, e));
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(unavailable)?;
        let response = client.get(&self.url).send().map_err(unavailable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "error downloading reference shapefile ({status}), probably due to some server issues"
            )));
        }
        let bytes = response.bytes().map_err(unavailable)?;

        // persist atomically so an interrupted download never looks cached
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&archive).map_err(|e| Error::Io(e.error))?;
        Ok(archive)
    }
}

impl BoundaryProvider for NaturalEarthBoundaries {
    fn boundaries(&self) -> Result<BoundaryCollection> {
        let archive = self.ensure_archive()?;
        let all = read_countries_archive(&archive)?;
        let ben = all.retain_iso_a2(&BEN_COUNTRIES_ISO_A2);
        if ben.is_empty() {
            return Err(Error::UpstreamUnavailable(format!(
                "{:?} contains none of the BigEarthNet countries",
                archive
            )));
        }
        Ok(ben)
    }
}

fn string_field(value: Option<FieldValue>) -> Option<String> {
    match value {
        Some(FieldValue::StringValue(s)) => Some(s),
        _ => None,
    }
}

/// Natural Earth no longer ships an ISO-A2 code for Kosovo; `XK` is injected so
/// that the country keeps matching the BigEarthNet country list.
pub fn correct_iso_a2(entry: BoundaryEntry) -> BoundaryEntry {
    if entry.name == "Kosovo" {
        BoundaryEntry {
            iso_a2: "XK".to_string(),
            ..entry
        }
    } else {
        entry
    }
}

/// Read every country from a Natural Earth admin-0 zip archive.
pub fn read_countries_archive(archive: &Path) -> Result<BoundaryCollection> {
    let vsi_path = format!("/vsizip/{}/{}", archive.display(), COUNTRIES_SHAPEFILE);
    let dataset = Dataset::open(&vsi_path)?;
    let mut layer = dataset.layer(0)?;
    let crs = match layer.spatial_ref() {
        Some(srs) => Crs::new(srs.to_wkt()?),
        None => Crs::new("EPSG:4326"),
    };

    let mut entries = Vec::new();
    for feature in layer.features() {
        let mut iso_a2 = None;
        let mut iso_a3 = None;
        let mut name = None;
        for (field, value) in feature.fields() {
            match field.as_str() {
                "ISO_A2" => iso_a2 = string_field(value),
                "ISO_A3" => iso_a3 = string_field(value),
                "NAME" => name = string_field(value),
                _ => {}
            }
        }
        let Some(name) = name else {
            warn!("Skipping country feature without NAME");
            continue;
        };
        let geometry = match feature.geometry().map(|g| g.to_geo()).transpose()? {
            Some(Geometry::Polygon(polygon)) => MultiPolygon::new(vec![polygon]),
            Some(Geometry::MultiPolygon(multi)) => multi,
            _ => {
                warn!("Skipping country {} without polygonal geometry", name);
                continue;
            }
        };
        entries.push(correct_iso_a2(BoundaryEntry {
            iso_a3: iso_a3.unwrap_or_default(),
            iso_a2: iso_a2.unwrap_or_default(),
            name,
            geometry,
        }));
    }
    debug!("Read {} countries from {:?}", entries.len(), archive);
    Ok(BoundaryCollection::new(crs, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::box_from_two_coords;

    fn entry(iso_a2: &str, name: &str) -> BoundaryEntry {
        BoundaryEntry {
            iso_a3: String::new(),
            iso_a2: iso_a2.to_string(),
            name: name.to_string(),
            geometry: MultiPolygon::new(vec![box_from_two_coords((0.0, 0.0), (1.0, 1.0))]),
        }
    }

    #[test]
    fn retains_only_listed_codes() {
        let all = BoundaryCollection::new(
            Crs::new("EPSG:4326"),
            vec![entry("AT", "Austria"), entry("NO", "Norway"), entry("XK", "Kosovo")],
        );
        let ben = all.retain_iso_a2(&BEN_COUNTRIES_ISO_A2);
        let names: Vec<_> = ben.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Austria", "Kosovo"]);
    }

    #[test]
    fn static_provider_hands_out_copies() {
        let collection = BoundaryCollection::new(Crs::new("EPSG:4326"), vec![entry("AT", "Austria")]);
        let provider = StaticBoundaries(collection.clone());
        assert_eq!(provider.boundaries().unwrap(), collection);
    }

    #[test]
    fn kosovo_gets_its_iso_a2_code() {
        let kosovo = correct_iso_a2(entry("-99", "Kosovo"));
        assert_eq!(kosovo.iso_a2, "XK");
        assert_eq!(kosovo.name, "Kosovo");

        let serbia = correct_iso_a2(entry("RS", "Serbia"));
        assert_eq!(serbia, entry("RS", "Serbia"));

        let ben = BoundaryCollection::new(Crs::new("EPSG:4326"), vec![kosovo, entry("NO", "Norway")])
            .retain_iso_a2(&BEN_COUNTRIES_ISO_A2);
        assert_eq!(ben.len(), 1);
    }

    #[test]
    fn unreachable_server_is_upstream_unavailable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let provider =
            NaturalEarthBoundaries::with_cache_dir(tmp.path()).with_url("http://127.0.0.1:9/countries.zip");
        let err = provider.boundaries().unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)), "{err}");
        assert!(!provider.archive_path().exists());
    }

    #[test]
    fn cached_archive_is_not_downloaded_again() {
        let tmp = tempfile::TempDir::new().unwrap();
        let provider =
            NaturalEarthBoundaries::with_cache_dir(tmp.path()).with_url("http://127.0.0.1:9/countries.zip");
        fs::write(provider.archive_path(), b"not a zip").unwrap();
        // the cached file is opened instead of fetched, so GDAL rejects it
        let err = provider.boundaries().unwrap_err();
        assert!(!matches!(err, Error::UpstreamUnavailable(_)), "{err}");
    }

    #[test]
    fn archive_lives_in_cache_dir() {
        let provider = NaturalEarthBoundaries::with_cache_dir("/tmp/ben-cache");
        assert_eq!(
            provider.archive_path(),
            Path::new("/tmp/ben-cache").join(COUNTRIES_ARCHIVE)
        );
    }
}
