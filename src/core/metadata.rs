//! Enrich a patch collection with the full BigEarthNet metadata.
//!
//! Adds `new_labels`, `snow`, `cloud_or_shadow`, `original_split`, `country`
//! and `season`. S1 collections look up the quality lists through their
//! `corresponding_s2_patch` column, S2 collections through their own `name`.
use tracing::info;

use crate::core::collection::{Column, PatchCollection};
use crate::core::country::assign_to_ben_country;
use crate::core::datetime::parse_datetime;
use crate::core::labels::old2new_labels;
use crate::error::{Error, Result};
use crate::io::borders::BoundaryProvider;
use crate::io::reference::ReferenceData;
use crate::types::{
    CLOUD_OR_SHADOW, Crs, LABELS, Modality, NEW_LABELS, ORIGINAL_SPLIT, SEASON, SNOW, Season,
};

use chrono::Datelike;

/// Lookups the enrichment needs besides the collection itself.
pub struct EnrichmentSources<'a> {
    pub reference: &'a ReferenceData,
    pub borders: &'a dyn BoundaryProvider,
    /// Frame in which centroids are matched against country boundaries.
    pub crs: Crs,
}

impl<'a> EnrichmentSources<'a> {
    pub fn new(reference: &'a ReferenceData, borders: &'a dyn BoundaryProvider) -> Self {
        Self {
            reference,
            borders,
            crs: Crs::default(),
        }
    }
}

/// Season of every timestamp in `date_column`.
pub fn seasons(collection: &PatchCollection, date_column: &str) -> Result<Vec<Season>> {
    collection
        .text(date_column)?
        .iter()
        .map(|value| {
            parse_datetime(value)
                .and_then(|dt| Season::from_month(dt.month()))
                .ok_or_else(|| Error::ColumnType {
                    column: date_column.to_string(),
                    expected: "parsable timestamps",
                })
        })
        .collect()
}

/// Keep only rows acquired in `season`.
pub fn filter_season(
    mut collection: PatchCollection,
    date_column: &str,
    season: Season,
) -> Result<PatchCollection> {
    let keep: Vec<bool> = seasons(&collection, date_column)?
        .into_iter()
        .map(|s| s == season)
        .collect();
    collection.retain_rows(&keep)?;
    Ok(collection)
}

fn add_full_ben_metadata(
    mut collection: PatchCollection,
    s2_name_column: &str,
    date_column: &str,
    sources: &EnrichmentSources<'_>,
) -> Result<PatchCollection> {
    let new_labels: Vec<Option<Vec<String>>> = collection
        .labels(LABELS)?
        .iter()
        .map(|labels| old2new_labels(labels))
        .collect();

    let s2_names = collection.text(s2_name_column)?;
    let reference = sources.reference;
    let snow: Vec<bool> = s2_names.iter().map(|n| reference.is_snowy(n)).collect();
    let cloud_or_shadow: Vec<bool> = s2_names
        .iter()
        .map(|n| reference.is_cloudy_shadowy(n))
        .collect();
    let original_split: Vec<Option<String>> = s2_names
        .iter()
        .map(|n| reference.original_split(n).map(|s| s.to_string()))
        .collect();

    collection.set_column(NEW_LABELS, Column::OptionalLabels(new_labels))?;
    collection.set_column(SNOW, Column::Flag(snow))?;
    collection.set_column(CLOUD_OR_SHADOW, Column::Flag(cloud_or_shadow))?;
    collection.set_column(ORIGINAL_SPLIT, Column::OptionalText(original_split))?;

    let mut collection = assign_to_ben_country(collection, sources.borders, &sources.crs)?;

    let season: Vec<String> = seasons(&collection, date_column)?
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    collection.set_column(SEASON, Column::Text(season))?;

    info!("Added metadata to {} rows", collection.len());
    Ok(collection)
}

fn add_full_ben_modality_metadata(
    collection: PatchCollection,
    modality: Modality,
    sources: &EnrichmentSources<'_>,
) -> Result<PatchCollection> {
    collection.require_columns(modality.required_columns())?;
    add_full_ben_metadata(
        collection,
        modality.s2_name_column(),
        modality.timestamp_column(),
        sources,
    )
}

/// Add all available metadata to a collection in BigEarthNet-S1 layout.
///
/// Requires `acquisition_time`, `name`, `labels` and `corresponding_s2_patch`.
pub fn add_full_ben_s1_metadata(
    collection: PatchCollection,
    sources: &EnrichmentSources<'_>,
) -> Result<PatchCollection> {
    add_full_ben_modality_metadata(collection, Modality::S1, sources)
}

/// Add all available metadata to a collection in BigEarthNet-S2 layout.
///
/// Requires `acquisition_date`, `name` and `labels`.
pub fn add_full_ben_s2_metadata(
    collection: PatchCollection,
    sources: &EnrichmentSources<'_>,
) -> Result<PatchCollection> {
    add_full_ben_modality_metadata(collection, Modality::S2, sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::box_from_two_coords;
    use crate::io::borders::{BoundaryCollection, BoundaryEntry, StaticBoundaries};
    use crate::types::{ACQUISITION_DATE, COUNTRY, NAME, OriginalSplit};
    use geo::MultiPolygon;

    fn text(values: &[&str]) -> Column {
        Column::Text(values.iter().map(|v| v.to_string()).collect())
    }

    fn s2_collection() -> PatchCollection {
        PatchCollection::new(
            Crs::new("EPSG:3035"),
            vec![
                box_from_two_coords((0.0, 0.0), (10.0, 10.0)),
                box_from_two_coords((20.0, 0.0), (30.0, 10.0)),
                box_from_two_coords((40.0, 0.0), (50.0, 10.0)),
                box_from_two_coords((60.0, 0.0), (70.0, 10.0)),
            ],
            vec![
                (NAME.into(), text(&["p1", "p2", "p3", "p4"])),
                (
                    LABELS.into(),
                    Column::Labels(vec![
                        vec!["Pastures".into()],
                        vec!["Airports".into()],
                        vec!["Sea and ocean".into()],
                        vec!["Coniferous forest".into()],
                    ]),
                ),
                (
                    ACQUISITION_DATE.into(),
                    text(&[
                        "2018-01-21 10:00:00",
                        "2018-04-21 10:00:00",
                        "2018-08-10 10:00:00",
                        "2017-10-27 10:00:00",
                    ]),
                ),
            ],
        )
        .unwrap()
    }

    fn provider() -> StaticBoundaries {
        StaticBoundaries(BoundaryCollection::new(
            Crs::new("EPSG:3035"),
            vec![BoundaryEntry {
                iso_a3: "AUT".into(),
                iso_a2: "AT".into(),
                name: "Austria".into(),
                geometry: MultiPolygon::new(vec![box_from_two_coords((0.0, 0.0), (100.0, 100.0))]),
            }],
        ))
    }

    fn reference() -> ReferenceData {
        ReferenceData::new(
            vec!["p1".to_string()],
            vec!["p4".to_string()],
            vec![("p2".to_string(), OriginalSplit::Validation)],
        )
    }

    #[test]
    fn seasons_follow_acquisition_month() {
        let seasons = seasons(&s2_collection(), ACQUISITION_DATE).unwrap();
        assert_eq!(
            seasons,
            [Season::Winter, Season::Spring, Season::Summer, Season::Fall]
        );
    }

    #[test]
    fn filter_season_keeps_matching_rows() {
        let summer = filter_season(s2_collection(), ACQUISITION_DATE, Season::Summer).unwrap();
        assert_eq!(summer.text(NAME).unwrap(), ["p3"]);
    }

    #[test]
    fn enrichment_adds_exactly_the_metadata_columns() {
        let input = s2_collection();
        let before: Vec<String> = input.column_names().iter().map(|c| c.to_string()).collect();
        let reference = reference();
        let borders = provider();
        let sources = EnrichmentSources::new(&reference, &borders);

        let enriched = add_full_ben_s2_metadata(input, &sources).unwrap();
        let added: Vec<&str> = enriched
            .column_names()
            .into_iter()
            .filter(|c| !before.iter().any(|b| b.as_str() == *c))
            .collect();
        assert_eq!(
            added,
            [NEW_LABELS, SNOW, CLOUD_OR_SHADOW, ORIGINAL_SPLIT, COUNTRY, SEASON]
        );
        assert_eq!(enriched.flags(SNOW).unwrap(), [true, false, false, false]);
        assert_eq!(enriched.flags(CLOUD_OR_SHADOW).unwrap(), [false, false, false, true]);
        assert_eq!(
            enriched.column(ORIGINAL_SPLIT),
            Some(&Column::OptionalText(vec![
                None,
                Some("validation".into()),
                None,
                None
            ]))
        );
        assert_eq!(
            enriched.column(NEW_LABELS),
            Some(&Column::OptionalLabels(vec![
                Some(vec!["Pastures".into()]),
                None,
                Some(vec!["Marine waters".into()]),
                Some(vec!["Coniferous forest".into()]),
            ]))
        );
        assert_eq!(enriched.text(COUNTRY).unwrap(), ["Austria"; 4]);
        assert_eq!(
            enriched.text(SEASON).unwrap(),
            ["Winter", "Spring", "Summer", "Fall"]
        );
    }

    #[test]
    fn s1_enrichment_requires_cross_reference() {
        let reference = reference();
        let borders = provider();
        let sources = EnrichmentSources::new(&reference, &borders);
        let err = add_full_ben_s1_metadata(s2_collection(), &sources).unwrap_err();
        match err {
            Error::MissingColumns { missing } => {
                assert_eq!(missing, ["acquisition_time", "corresponding_s2_patch"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
