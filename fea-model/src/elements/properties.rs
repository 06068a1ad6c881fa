//! Element properties - material + section bound to elements

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// A reinforcement layer inside shell elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reinforcement {
    /// Layer name
    pub layer: String,
    /// Material of the bars
    pub material: String,
    /// Bar area in m²
    pub area: f64,
    /// Bar spacing in m
    pub spacing: f64,
    /// Offset from the mid-surface in m
    pub offset: f64,
    /// Bar angle from the local x axis in degrees
    pub angle: f64,
}

/// Binds a material and a section to elements
///
/// Exactly one of `elset` and `elements` names the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementProperties {
    pub name: String,
    /// Material name; springs and masses carry none
    #[serde(default)]
    pub material: Option<String>,
    /// Section name
    pub section: String,
    /// Element set name
    #[serde(default, alias = "elsets")]
    pub elset: Option<String>,
    /// Explicit element keys
    #[serde(default)]
    pub elements: Option<Vec<usize>>,
    #[serde(default)]
    pub reinforcement: Vec<Reinforcement>,
}

impl ElementProperties {
    /// Properties targeting an element set
    pub fn new(name: &str, material: &str, section: &str, elset: &str) -> Self {
        Self {
            name: name.to_string(),
            material: Some(material.to_string()),
            section: section.to_string(),
            elset: Some(elset.to_string()),
            elements: None,
            reinforcement: Vec::new(),
        }
    }

    /// Properties targeting explicit element keys
    pub fn on_elements(name: &str, material: &str, section: &str, elements: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            material: Some(material.to_string()),
            section: section.to_string(),
            elset: None,
            elements: Some(elements),
            reinforcement: Vec::new(),
        }
    }

    /// Properties without a material (springs, masses)
    pub fn without_material(mut self) -> Self {
        self.material = None;
        self
    }

    pub fn with_reinforcement(mut self, layer: Reinforcement) -> Self {
        self.reinforcement.push(layer);
        self
    }

    pub fn validate(&self) -> FEAResult<()> {
        match (&self.elset, &self.elements) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(FEAError::Validation(format!(
                "element properties '{}' name both an elset and explicit elements",
                self.name
            ))),
            (None, None) => Err(FEAError::Validation(format!(
                "element properties '{}' have no elset or elements",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_exclusive() {
        let ep = ElementProperties::new("ep", "steel", "sec", "elset_beams");
        assert!(ep.validate().is_ok());

        let mut both = ep.clone();
        both.elements = Some(vec![0, 1]);
        assert!(both.validate().is_err());

        let mut neither = ep;
        neither.elset = None;
        assert!(neither.validate().is_err());
    }

    #[test]
    fn test_legacy_elsets_alias() {
        let json = r#"{"name":"ep","material":"m","section":"s","elsets":"shells"}"#;
        let ep: ElementProperties = serde_json::from_str(json).unwrap();
        assert_eq!(ep.elset.as_deref(), Some("shells"));
    }
}
