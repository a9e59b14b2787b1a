//! Vetro feature types and their display columns
//!
//! Exported Vetro layers are recognised by keywords in the file name. Each
//! layer has a fixed set of columns worth showing to an operator.

use crate::table::{IDENTITY_COLUMN, Snapshot};

/// Layer an export belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    FlowerPotDeadEnd,
    ServiceLocation,
    Handhole,
    AerialSpliceClosure,
    Pole,
}

/// Keyword checks in priority order
const KEYWORDS: &[(&[&str], FeatureType)] = &[
    (&["flower", "pot"], FeatureType::FlowerPotDeadEnd),
    (&["service"], FeatureType::ServiceLocation),
    (&["handhole"], FeatureType::Handhole),
    (&["splice", "closure"], FeatureType::AerialSpliceClosure),
    (&["pole"], FeatureType::Pole),
];

impl FeatureType {
    pub const ALL: [FeatureType; 5] = [
        FeatureType::FlowerPotDeadEnd,
        FeatureType::ServiceLocation,
        FeatureType::Handhole,
        FeatureType::AerialSpliceClosure,
        FeatureType::Pole,
    ];

    /// Detect the layer from a file name, case-insensitively
    pub fn detect(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|word| lower.contains(word)))
            .map(|(_, feature_type)| *feature_type)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeatureType::FlowerPotDeadEnd => "Flower Pot Dead End",
            FeatureType::ServiceLocation => "Service Location",
            FeatureType::Handhole => "Handhole",
            FeatureType::AerialSpliceClosure => "Aerial Splice Closure",
            FeatureType::Pole => "Pole",
        }
    }

    /// Columns shown for this layer, in display order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            FeatureType::FlowerPotDeadEnd => &[
                "ID", "Location", "Name", "Notes", "Size", "Type", "RUS Code", "vetro_id",
            ],
            FeatureType::ServiceLocation => &[
                "ID",
                "Name",
                "Address",
                "Street Address",
                "City",
                "State",
                "Zip Code",
                "Location Type",
                "Note",
                "Drop Type",
                "Build",
                "Latitude",
                "Source",
                "County",
                "vetro_id",
            ],
            FeatureType::Handhole => &[
                "ID", "Name", "Location", "Type", "Note", "Build", "Owner", "RUS Code", "Size", "MST",
                "Splicing", "vetro_id",
            ],
            FeatureType::AerialSpliceClosure => &[
                "ID",
                "Name",
                "Owner",
                "Location",
                "Links",
                "Structure ID",
                "Note",
                "Build",
                "RUS Code",
                "HO 1",
                "vetro_id",
            ],
            FeatureType::Pole => &[
                "ID",
                "Road Name",
                "Town",
                "Project",
                "State",
                "Owner",
                "Elco Id",
                "Telco Id",
                "Drop Type",
                "Status",
                "Make Ready Required",
                "Licensed",
                "Attachment Height",
                "Age",
                "Class",
                "Diameter",
                "Height",
                "Links",
                "Make Ready LoE",
                "Material",
                "Permitted",
                "Surveyed",
                "Type",
                "Latitude",
                "Survey Date",
                "Longitude",
                "Make Ready Explanation",
                "Assigned To",
                "Permit Number",
                "vetro_id",
            ],
        }
    }

    /// The layer's columns present in `snapshot`, identity column first
    pub fn display_columns(&self, snapshot: &Snapshot) -> Vec<String> {
        let mut present: Vec<String> = self
            .columns()
            .iter()
            .filter(|column| snapshot.has_column(column))
            .map(|column| column.to_string())
            .collect();

        if let Some(position) = present.iter().position(|c| c == IDENTITY_COLUMN) {
            let identity = present.remove(position);
            present.insert(0, identity);
        }

        present
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
