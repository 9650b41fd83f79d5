//! Conversion from the 43-class CORINE label vocabulary of the original
//! BigEarthNet release to the 19-class nomenclature.

/// The 19 target classes in canonical order.
pub const NEW_LABEL_CLASSES: [&str; 19] = [
    "Urban fabric",
    "Industrial or commercial units",
    "Arable land",
    "Permanent crops",
    "Pastures",
    "Complex cultivation patterns",
    "Land principally occupied by agriculture, with significant areas of natural vegetation",
    "Agro-forestry areas",
    "Broad-leaved forest",
    "Coniferous forest",
    "Mixed forest",
    "Natural grassland and sparsely vegetated areas",
    "Moors, heathland and sclerophyllous vegetation",
    "Transitional woodland, shrub",
    "Beaches, dunes, sands",
    "Inland wetlands",
    "Coastal wetlands",
    "Inland waters",
    "Marine waters",
];

/// Index into `NEW_LABEL_CLASSES` for an original label, `None` when the class was dropped.
fn new_label_index(old_label: &str) -> Option<usize> {
    let idx = match old_label {
        "Continuous urban fabric" | "Discontinuous urban fabric" => 0,
        "Industrial or commercial units" => 1,
        "Non-irrigated arable land" | "Permanently irrigated land" | "Rice fields" => 2,
        "Vineyards"
        | "Fruit trees and berry plantations"
        | "Olive groves"
        | "Annual crops associated with permanent crops" => 3,
        "Pastures" => 4,
        "Complex cultivation patterns" => 5,
        "Land principally occupied by agriculture, with significant areas of natural vegetation" => 6,
        "Agro-forestry areas" => 7,
        "Broad-leaved forest" => 8,
        "Coniferous forest" => 9,
        "Mixed forest" => 10,
        "Natural grassland" | "Sparsely vegetated areas" => 11,
        "Moors and heathland" | "Sclerophyllous vegetation" => 12,
        "Transitional woodland/shrub" => 13,
        "Beaches, dunes, sands" => 14,
        "Inland marshes" | "Peatbogs" => 15,
        "Salt marshes" | "Salines" => 16,
        "Water courses" | "Water bodies" => 17,
        "Coastal lagoons" | "Estuaries" | "Sea and ocean" => 18,
        _ => return None,
    };
    Some(idx)
}

/// Map original labels to the 19-class nomenclature.
///
/// Unmapped labels are dropped and duplicates collapse; the result follows the
/// order of `NEW_LABEL_CLASSES`. Returns `None` when no target label remains.
pub fn old2new_labels<S: AsRef<str>>(old_labels: &[S]) -> Option<Vec<String>> {
    let mut present = [false; NEW_LABEL_CLASSES.len()];
    for label in old_labels {
        if let Some(idx) = new_label_index(label.as_ref().trim()) {
            present[idx] = true;
        }
    }
    let labels: Vec<String> = NEW_LABEL_CLASSES
        .iter()
        .zip(present)
        .filter(|(_, p)| *p)
        .map(|(label, _)| label.to_string())
        .collect();
    (!labels.is_empty()).then_some(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_and_orders_classes() {
        let old = [
            "Sea and ocean",
            "Continuous urban fabric",
            "Discontinuous urban fabric",
            "Coniferous forest",
        ];
        assert_eq!(
            old2new_labels(&old),
            Some(vec![
                "Urban fabric".to_string(),
                "Coniferous forest".to_string(),
                "Marine waters".to_string(),
            ])
        );
    }

    #[test]
    fn dropped_only_labels_are_absent() {
        assert_eq!(old2new_labels(&["Airports", "Burnt areas", "Bare rock"]), None);
        assert_eq!(old2new_labels::<&str>(&[]), None);
    }

    #[test]
    fn dropped_labels_are_skipped_next_to_kept_ones() {
        assert_eq!(
            old2new_labels(&["Port areas", "Pastures"]),
            Some(vec!["Pastures".to_string()])
        );
    }
}
