//! Column-oriented patch collection.
//!
//! A `PatchCollection` is a table of rows sharing one reference frame: a
//! geometry column plus an ordered list of named, typed attribute columns.
//! Enrichment adds columns and filtering drops rows; neither touches the
//! geometry, name or labels of an existing row.
use std::collections::BTreeSet;

use geo::Polygon;

use crate::core::geometry::Reprojector;
use crate::error::{Error, Result};
use crate::types::{Crs, GEOMETRY};

/// Values of one attribute column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    OptionalText(Vec<Option<String>>),
    Labels(Vec<Vec<String>>),
    OptionalLabels(Vec<Option<Vec<String>>>),
    Flag(Vec<bool>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::OptionalText(v) => v.len(),
            Column::Labels(v) => v.len(),
            Column::OptionalLabels(v) => v.len(),
            Column::Flag(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Text(_) => "text",
            Column::OptionalText(_) => "optional text",
            Column::Labels(_) => "label list",
            Column::OptionalLabels(_) => "optional label list",
            Column::Flag(_) => "flag",
        }
    }

    fn retain(&mut self, keep: &[bool]) {
        fn apply<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut idx = 0;
            values.retain(|_| {
                let k = keep[idx];
                idx += 1;
                k
            });
        }
        match self {
            Column::Text(v) => apply(v, keep),
            Column::OptionalText(v) => apply(v, keep),
            Column::Labels(v) => apply(v, keep),
            Column::OptionalLabels(v) => apply(v, keep),
            Column::Flag(v) => apply(v, keep),
        }
    }

    fn append(&mut self, other: Column) -> std::result::Result<(), &'static str> {
        match (self, other) {
            (Column::Text(a), Column::Text(b)) => a.extend(b),
            (Column::OptionalText(a), Column::OptionalText(b)) => a.extend(b),
            (Column::Labels(a), Column::Labels(b)) => a.extend(b),
            (Column::OptionalLabels(a), Column::OptionalLabels(b)) => a.extend(b),
            (Column::Flag(a), Column::Flag(b)) => a.extend(b),
            (_, other) => return Err(other.type_name()),
        }
        Ok(())
    }
}

/// Ordered rows of patch footprints with attributes, in one reference frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchCollection {
    crs: Crs,
    geometry: Vec<Polygon<f64>>,
    columns: Vec<(String, Column)>,
}

impl PatchCollection {
    /// Assemble a collection; every column must have one value per geometry.
    pub fn new(crs: Crs, geometry: Vec<Polygon<f64>>, columns: Vec<(String, Column)>) -> Result<Self> {
        let mut collection = Self {
            crs,
            geometry,
            columns: Vec::with_capacity(columns.len()),
        };
        for (name, column) in columns {
            collection.set_column(name, column)?;
        }
        Ok(collection)
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    pub fn geometry(&self) -> &[Polygon<f64>] {
        &self.geometry
    }

    /// Column names in order, starting with `geometry`.
    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(GEOMETRY)
            .chain(self.columns.iter().map(|(name, _)| name.as_str()))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == GEOMETRY || self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, column)| column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    /// Fail with every required column that is absent, not just the first.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: BTreeSet<String> = required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns {
                missing: missing.into_iter().collect(),
            })
        }
    }

    fn required(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| Error::MissingColumns {
            missing: vec![name.to_string()],
        })
    }

    pub fn text(&self, name: &str) -> Result<&[String]> {
        match self.required(name)? {
            Column::Text(values) => Ok(values),
            _ => Err(Error::ColumnType {
                column: name.to_string(),
                expected: "text",
            }),
        }
    }

    pub fn labels(&self, name: &str) -> Result<&[Vec<String>]> {
        match self.required(name)? {
            Column::Labels(values) => Ok(values),
            _ => Err(Error::ColumnType {
                column: name.to_string(),
                expected: "label list",
            }),
        }
    }

    pub fn flags(&self, name: &str) -> Result<&[bool]> {
        match self.required(name)? {
            Column::Flag(values) => Ok(values),
            _ => Err(Error::ColumnType {
                column: name.to_string(),
                expected: "flag",
            }),
        }
    }

    /// Insert a column, replacing an existing one of the same name in place.
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if name == GEOMETRY {
            return Err(Error::SchemaMismatch(
                "the geometry column cannot be replaced by an attribute column".into(),
            ));
        }
        if column.len() != self.len() {
            return Err(Error::SchemaMismatch(format!(
                "column `{}` has {} values for {} rows",
                name,
                column.len(),
                self.len()
            )));
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }

    /// Keep the rows whose mask entry is `true`; surviving rows are densely re-indexed.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<()> {
        if keep.len() != self.len() {
            return Err(Error::SchemaMismatch(format!(
                "row mask has {} entries for {} rows",
                keep.len(),
                self.len()
            )));
        }
        let mut idx = 0;
        self.geometry.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
        for (_, column) in &mut self.columns {
            column.retain(keep);
        }
        Ok(())
    }

    /// Same rows with the geometry expressed in `target`.
    pub fn to_crs(&self, target: &Crs) -> Result<PatchCollection> {
        let reprojector = Reprojector::new(&self.crs, target)?;
        if reprojector.is_identity() {
            return Ok(self.clone());
        }
        let geometry = self
            .geometry
            .iter()
            .map(|polygon| reprojector.polygon(polygon))
            .collect::<Result<Vec<_>>>()?;
        Ok(PatchCollection {
            crs: target.clone(),
            geometry,
            columns: self.columns.clone(),
        })
    }

    /// Stack collections row-wise. All parts must share frame and column layout;
    /// no coordinate transform happens here.
    pub fn concat(parts: Vec<PatchCollection>) -> Result<PatchCollection> {
        let mut parts = parts.into_iter();
        let Some(mut merged) = parts.next() else {
            return Err(Error::EmptyResult { paths: Vec::new() });
        };
        for part in parts {
            if part.crs != merged.crs {
                return Err(Error::SchemaMismatch(format!(
                    "cannot concatenate frames {} and {}",
                    merged.crs, part.crs
                )));
            }
            if part.column_names() != merged.column_names() {
                return Err(Error::SchemaMismatch(format!(
                    "column layouts differ: {:?} vs {:?}",
                    merged.column_names(),
                    part.column_names()
                )));
            }
            merged.geometry.extend(part.geometry);
            for ((name, target), (_, source)) in merged.columns.iter_mut().zip(part.columns) {
                target.append(source).map_err(|found| {
                    Error::SchemaMismatch(format!(
                        "column `{}` is {} in one part and {} in another",
                        name,
                        target.type_name(),
                        found
                    ))
                })?;
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::box_from_two_coords;
    use crate::types::{LABELS, NAME};

    fn single(name: &str, offset: f64) -> PatchCollection {
        PatchCollection::new(
            Crs::new("EPSG:3035"),
            vec![box_from_two_coords((offset, 0.0), (offset + 1.0, 1.0))],
            vec![
                (NAME.to_string(), Column::Text(vec![name.to_string()])),
                (
                    LABELS.to_string(),
                    Column::Labels(vec![vec!["Pastures".to_string()]]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn concat_keeps_order_and_frame() {
        let merged = PatchCollection::concat(vec![single("a", 0.0), single("b", 10.0)]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.crs(), &Crs::new("EPSG:3035"));
        assert_eq!(merged.text(NAME).unwrap(), ["a", "b"]);
        assert_eq!(merged.column_names(), vec![GEOMETRY, NAME, LABELS]);
    }

    #[test]
    fn concat_rejects_mixed_frames() {
        let mut other = single("b", 10.0);
        other.crs = Crs::new("EPSG:4326");
        let err = PatchCollection::concat(vec![single("a", 0.0), other]).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn concat_of_nothing_is_empty_result() {
        let err = PatchCollection::concat(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyResult { .. }));
    }

    #[test]
    fn retain_rows_reindexes_every_column() {
        let mut merged = PatchCollection::concat(vec![
            single("a", 0.0),
            single("b", 10.0),
            single("c", 20.0),
        ])
        .unwrap();
        merged.retain_rows(&[true, false, true]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.text(NAME).unwrap(), ["a", "c"]);
        assert_eq!(merged.labels(LABELS).unwrap().len(), 2);
    }

    #[test]
    fn require_columns_reports_all_missing() {
        let collection = single("a", 0.0);
        let err = collection
            .require_columns(&["name", "season", "acquisition_date", "labels"])
            .unwrap_err();
        match err {
            Error::MissingColumns { missing } => {
                assert_eq!(missing, vec!["acquisition_date", "season"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn set_column_checks_length_and_replaces() {
        let mut collection = single("a", 0.0);
        assert!(collection
            .set_column("snow", Column::Flag(vec![true, false]))
            .is_err());
        collection.set_column("snow", Column::Flag(vec![true])).unwrap();
        collection.set_column("snow", Column::Flag(vec![false])).unwrap();
        assert_eq!(collection.flags("snow").unwrap(), [false]);
        assert_eq!(collection.column_names().len(), 4);
    }
}
