//! Remove patches that are discouraged for training.
use tracing::info;

use crate::core::collection::{Column, PatchCollection};
use crate::core::labels::old2new_labels;
use crate::error::Result;
use crate::io::reference::ReferenceData;
use crate::types::{CORRESPONDING_S2_PATCH, LABELS, NAME, NEW_LABELS};

/// Column holding the S2 name: the cross-reference of S1 rows, otherwise `name`.
pub fn s2_name_column(collection: &PatchCollection) -> &'static str {
    if collection.has_column(CORRESPONDING_S2_PATCH) {
        CORRESPONDING_S2_PATCH
    } else {
        NAME
    }
}

/// Keep only patches with 19-class labels that are free of seasonal snow,
/// clouds and shadows. Works for S1 and S2 collections.
///
/// `new_labels` is (re)computed from `labels`; surviving rows are re-indexed.
/// Running it on an already cleaned collection removes nothing.
pub fn remove_bad_ben_entries(
    mut collection: PatchCollection,
    reference: &ReferenceData,
) -> Result<PatchCollection> {
    let s2_name_column = s2_name_column(&collection);
    collection.require_columns(&[LABELS, s2_name_column])?;

    let new_labels: Vec<Option<Vec<String>>> = collection
        .labels(LABELS)?
        .iter()
        .map(|labels| old2new_labels(labels))
        .collect();
    let keep: Vec<bool> = collection
        .text(s2_name_column)?
        .iter()
        .zip(&new_labels)
        .map(|(name, labels)| {
            labels.is_some() && !reference.is_snowy(name) && !reference.is_cloudy_shadowy(name)
        })
        .collect();

    let before = collection.len();
    collection.set_column(NEW_LABELS, Column::OptionalLabels(new_labels))?;
    collection.retain_rows(&keep)?;
    info!(
        "Removed {} of {} patches (no 19-class labels, snow, clouds or shadows)",
        before - collection.len(),
        before
    );
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::box_from_two_coords;
    use crate::error::Error;
    use crate::types::Crs;

    fn collection(names: &[&str], labels: &[&str], s2_names: Option<&[&str]>) -> PatchCollection {
        let geometry = (0..names.len())
            .map(|i| box_from_two_coords((i as f64, 0.0), (i as f64 + 1.0, 1.0)))
            .collect();
        let mut columns = vec![
            (
                NAME.to_string(),
                Column::Text(names.iter().map(|n| n.to_string()).collect()),
            ),
            (
                LABELS.to_string(),
                Column::Labels(labels.iter().map(|l| vec![l.to_string()]).collect()),
            ),
        ];
        if let Some(s2_names) = s2_names {
            columns.push((
                CORRESPONDING_S2_PATCH.to_string(),
                Column::Text(s2_names.iter().map(|n| n.to_string()).collect()),
            ));
        }
        PatchCollection::new(Crs::default(), geometry, columns).unwrap()
    }

    fn reference() -> ReferenceData {
        ReferenceData::new(
            vec!["s2_snow".to_string()],
            vec!["s2_cloud".to_string()],
            Vec::new(),
        )
    }

    #[test]
    fn drops_unlabelled_snowy_and_cloudy_patches() {
        let input = collection(
            &["s2_ok", "s2_snow", "s2_cloud", "s2_port", "s2_water"],
            &["Pastures", "Pastures", "Pastures", "Port areas", "Water bodies"],
            None,
        );
        let cleaned = remove_bad_ben_entries(input, &reference()).unwrap();
        assert_eq!(cleaned.text(NAME).unwrap(), ["s2_ok", "s2_water"]);
        assert_eq!(
            cleaned.column(NEW_LABELS),
            Some(&Column::OptionalLabels(vec![
                Some(vec!["Pastures".into()]),
                Some(vec!["Inland waters".into()]),
            ]))
        );
    }

    #[test]
    fn s1_rows_use_the_cross_reference() {
        let input = collection(
            &["s1_a", "s1_b"],
            &["Pastures", "Pastures"],
            Some(&["s2_snow", "s2_ok"]),
        );
        let cleaned = remove_bad_ben_entries(input, &reference()).unwrap();
        assert_eq!(cleaned.text(NAME).unwrap(), ["s1_b"]);
    }

    #[test]
    fn is_idempotent() {
        let input = collection(
            &["s2_ok", "s2_snow", "s2_port"],
            &["Pastures", "Pastures", "Airports"],
            None,
        );
        let once = remove_bad_ben_entries(input, &reference()).unwrap();
        let twice = remove_bad_ben_entries(once.clone(), &reference()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn requires_labels() {
        let input = PatchCollection::new(
            Crs::default(),
            vec![box_from_two_coords((0.0, 0.0), (1.0, 1.0))],
            vec![(NAME.to_string(), Column::Text(vec!["x".into()]))],
        )
        .unwrap();
        let err = remove_bad_ben_entries(input, &reference()).unwrap_err();
        assert!(matches!(err, Error::MissingColumns { missing } if missing == ["labels"]));
    }
}
