//! Finding → presentation tables and label derivation.
//!
//! The tables are immutable configuration built once at startup and injected
//! into the composer, so tests can substitute their own vocabularies.

use std::collections::HashMap;

use crate::models::Annotation;

/// Label used when a finding has no color entry. Labels falling back to it
/// still render in the legend but carry no treatment recommendation.
pub const FALLBACK_LABEL: &str = "Other";

/// Swatch colors and treatment texts keyed by finding label.
#[derive(Debug, Clone)]
pub struct FindingTables {
    colors: HashMap<String, String>,
    recommendations: HashMap<String, String>,
}

impl FindingTables {
    pub fn new(
        colors: HashMap<String, String>,
        recommendations: HashMap<String, String>,
    ) -> Self {
        Self {
            colors,
            recommendations,
        }
    }

    /// Swatch color for a label, falling back to the "Other" color.
    pub fn color_for(&self, label: &str) -> &str {
        self.colors
            .get(label)
            .or_else(|| self.colors.get(FALLBACK_LABEL))
            .map(String::as_str)
            .unwrap_or("#777777")
    }

    /// Treatment text for a label. Labels without an entry are omitted from
    /// the recommendations section (but still appear in the legend).
    pub fn recommendation_for(&self, label: &str) -> Option<&str> {
        self.recommendations.get(label).map(String::as_str)
    }
}

impl Default for FindingTables {
    fn default() -> Self {
        let colors = [
            ("Stains", "#D9534F"),
            ("Crowns", "#C71585"),
            ("Malaligned", "#F0AD4E"),
            ("Receded gums", "#E6E6FA"),
            ("Attrition", "#5BC0DE"),
            ("Inflammed/Red gums", "#A020F0"),
            ("Caries", "#5CB85C"),
            ("Scaling", "#337AB7"),
            ("Other", "#777777"),
        ];
        let recommendations = [
            ("Stains", "Teeth cleaning and polishing."),
            (
                "Crowns",
                "If the crown is loose or broken, better get it checked. Teeth coloured caps are the best ones.",
            ),
            ("Malaligned", "Braces or Clear Aligner"),
            ("Receded gums", "Gum Surgery."),
            ("Attrition", "Filling/ Night Guard."),
            ("Inflammed/Red gums", "Scaling."),
            (
                "Caries",
                "A filling is required to treat the cavity and prevent further decay.",
            ),
            (
                "Scaling",
                "Professional scaling is recommended to remove plaque and tartar.",
            ),
        ];

        Self::new(
            colors
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            recommendations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Unique finding labels in first-seen order, deduplicating exact matches.
pub fn unique_labels(annotations: &[Annotation]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for ann in annotations {
        if !seen.contains(&ann.label.as_str()) {
            seen.push(&ann.label);
        }
    }
    seen
}
