//! Assign every patch to the closest BigEarthNet country.
//!
//! The centroid of each footprint, computed in a common equal-area frame, is
//! matched against the country boundaries by planar distance. For the small
//! 1200m x 1200m patches the centroid is a good stand-in for the country with
//! the largest overlap, and it settles border-crossing patches deterministically.
use std::cmp::Ordering;

use geo::{BoundingRect, Centroid, EuclideanDistance, Point, Polygon, Rect};
use tracing::debug;

use crate::core::collection::{Column, PatchCollection};
use crate::error::{Error, Result};
use crate::io::borders::{BoundaryCollection, BoundaryEntry, BoundaryProvider};
use crate::types::{COUNTRY, Crs};

/// Polygon parts of all boundaries with their bounding boxes.
struct BoundaryIndex<'a> {
    parts: Vec<(Rect<f64>, &'a Polygon<f64>, &'a BoundaryEntry)>,
}

impl<'a> BoundaryIndex<'a> {
    fn new(boundaries: &'a BoundaryCollection) -> Self {
        let parts = boundaries
            .entries()
            .iter()
            .flat_map(|entry| {
                entry
                    .geometry
                    .iter()
                    .filter_map(move |polygon| polygon.bounding_rect().map(|r| (r, polygon, entry)))
            })
            .collect();
        Self { parts }
    }

    /// Closest boundary to `point`. Equal distances resolve to the part visited first.
    fn nearest(&self, point: Point<f64>) -> Option<&'a BoundaryEntry> {
        let mut candidates: Vec<(f64, usize)> = self
            .parts
            .iter()
            .enumerate()
            .map(|(idx, (rect, _, _))| (rect_distance(rect, point), idx))
            .collect();
        candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let mut best: Option<(f64, &'a BoundaryEntry)> = None;
        for (lower_bound, idx) in candidates {
            if best.is_some_and(|(d, _)| lower_bound >= d) {
                break;
            }
            let (_, polygon, entry) = self.parts[idx];
            let distance = point.euclidean_distance(polygon);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, entry));
            }
        }
        best.map(|(_, entry)| entry)
    }
}

/// Distance from a point to a rectangle, zero inside.
fn rect_distance(rect: &Rect<f64>, point: Point<f64>) -> f64 {
    let dx = (rect.min().x - point.x()).max(point.x() - rect.max().x).max(0.0);
    let dy = (rect.min().y - point.y()).max(point.y() - rect.max().y).max(0.0);
    dx.hypot(dy)
}

/// Name of the closest boundary for every centroid.
pub fn nearest_country_names(
    centroids: &[Point<f64>],
    boundaries: &BoundaryCollection,
) -> Result<Vec<String>> {
    if boundaries.is_empty() {
        return Err(Error::UpstreamUnavailable(
            "the boundary collection holds no countries".into(),
        ));
    }
    let index = BoundaryIndex::new(boundaries);
    centroids
        .iter()
        .map(|&point| {
            index
                .nearest(point)
                .map(|entry| entry.name.clone())
                .ok_or_else(|| {
                    Error::UpstreamUnavailable("no boundary has a usable extent".into())
                })
        })
        .collect()
}

/// Append a `country` column naming the closest BigEarthNet country of each row.
///
/// Matching happens in `crs`; the returned collection keeps its original frame
/// and polygons.
pub fn assign_to_ben_country(
    mut collection: PatchCollection,
    borders: &dyn BoundaryProvider,
    crs: &Crs,
) -> Result<PatchCollection> {
    debug!("Reprojecting {} rows to {}", collection.len(), crs);
    let local = collection.to_crs(crs)?;

    debug!("Loading country shapes");
    let boundaries = borders.boundaries()?.to_crs(crs)?;

    debug!("Calculating centroids");
    let centroids = local
        .geometry()
        .iter()
        .enumerate()
        .map(|(row, polygon)| {
            polygon.centroid().ok_or_else(|| Error::InvalidArgument {
                arg: "geometry",
                value: format!("row {row} has an empty footprint"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Assigning data to {} countries", boundaries.len());
    let countries = nearest_country_names(&centroids, &boundaries)?;
    collection.set_column(COUNTRY, Column::Text(countries))?;
    Ok(collection)
}
