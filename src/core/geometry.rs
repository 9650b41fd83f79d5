//! Patch footprints and frame conversions.
//!
//! Footprints are axis-aligned rectangles built from two opposite corners.
//! Reprojection goes through GDAL's `CoordTransform`, ring by ring, with both
//! frames forced to traditional GIS axis order.
use gdal::spatial_ref::CoordTransform;
use geo::{Coord, LineString, MultiPolygon, Point, Polygon, Rect};

use crate::error::Result;
use crate::types::Crs;

/// Rectangle spanned by two opposite corners, in any order.
///
/// The ring is closed and starts at `(max_x, min_y)`, running counter-clockwise.
pub fn box_from_two_coords(p1: (f64, f64), p2: (f64, f64)) -> Polygon<f64> {
    Rect::new(Coord::from(p1), Coord::from(p2)).to_polygon()
}

/// Build a box from upper-left x/y and lower-right x/y, the BigEarthNet corner layout.
pub fn box_from_ul_lr_coords(ulx: f64, uly: f64, lrx: f64, lry: f64) -> Polygon<f64> {
    box_from_two_coords((ulx, uly), (lrx, lry))
}

/// Coordinate transform between two frames. Equal frames short-circuit to the identity.
pub struct Reprojector {
    transform: Option<CoordTransform>,
}

impl Reprojector {
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        if source == target {
            return Ok(Self { transform: None });
        }
        let source = source.spatial_ref()?;
        let target = target.spatial_ref()?;
        Ok(Self {
            transform: Some(CoordTransform::new(&source, &target)?),
        })
    }

    pub fn is_identity(&self) -> bool {
        self.transform.is_none()
    }

    fn line_string(&self, ring: &LineString<f64>) -> Result<LineString<f64>> {
        let Some(transform) = &self.transform else {
            return Ok(ring.clone());
        };
        let mut xs: Vec<f64> = ring.coords().map(|c| c.x).collect();
        let mut ys: Vec<f64> = ring.coords().map(|c| c.y).collect();
        let mut zs = vec![0.0; xs.len()];
        transform.transform_coords(&mut xs, &mut ys, &mut zs)?;
        Ok(xs
            .into_iter()
            .zip(ys)
            .map(|(x, y)| Coord { x, y })
            .collect())
    }

    pub fn polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        let exterior = self.line_string(polygon.exterior())?;
        let interiors = polygon
            .interiors()
            .iter()
            .map(|ring| self.line_string(ring))
            .collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }

    pub fn multi_polygon(&self, multi: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        multi
            .iter()
            .map(|polygon| self.polygon(polygon))
            .collect::<Result<Vec<_>>>()
            .map(MultiPolygon::new)
    }

    pub fn point(&self, point: Point<f64>) -> Result<Point<f64>> {
        let Some(transform) = &self.transform else {
            return Ok(point);
        };
        let mut xs = [point.x()];
        let mut ys = [point.y()];
        let mut zs = [0.0];
        transform.transform_coords(&mut xs, &mut ys, &mut zs)?;
        Ok(Point::new(xs[0], ys[0]))
    }
}
