//! Wire models for the Vetro features API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Vetro's reference block identifying the feature being updated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VetroRef {
    pub vetro_id: Option<String>,
}

/// A single feature in a PATCH /features request.
///
/// Only properties are sent; geometry is never touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePayload {
    /// Always "Feature"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "x-vetro")]
    pub vetro: VetroRef,
    /// Property name -> string value, or null to clear the field
    pub properties: Map<String, Value>,
}

impl FeaturePayload {
    pub fn new(external_id: Option<String>, properties: Map<String, Value>) -> Self {
        Self {
            kind: "Feature".to_string(),
            vetro: VetroRef {
                vetro_id: external_id,
            },
            properties,
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        self.vetro.vetro_id.as_deref()
    }
}

/// Request body of PATCH /features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<FeaturePayload>,
}

impl FeatureCollection {
    pub fn new(features: Vec<FeaturePayload>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
