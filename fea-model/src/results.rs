//! Result envelope - step -> component -> key -> value

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Where a field lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldLocation {
    Node,
    Element,
}

/// Canonical output fields, their location and their flat components
pub const FIELD_COMPONENTS: &[(&str, FieldLocation, &[&str])] = &[
    ("u", FieldLocation::Node, &["ux", "uy", "uz", "um"]),
    ("ur", FieldLocation::Node, &["urx", "ury", "urz", "urm"]),
    ("rf", FieldLocation::Node, &["rfx", "rfy", "rfz", "rfm"]),
    ("rm", FieldLocation::Node, &["rmx", "rmy", "rmz", "rmm"]),
    ("cf", FieldLocation::Node, &["cfx", "cfy", "cfz", "cfm"]),
    ("cm", FieldLocation::Node, &["cmx", "cmy", "cmz", "cmm"]),
    ("nt", FieldLocation::Node, &["nt"]),
    (
        "s",
        FieldLocation::Element,
        &["sxx", "syy", "szz", "sxy", "sxz", "syz", "smises", "smaxp", "sminp"],
    ),
    (
        "e",
        FieldLocation::Element,
        &["exx", "eyy", "ezz", "exy", "exz", "eyz", "emaxp", "eminp"],
    ),
    (
        "pe",
        FieldLocation::Element,
        &["pexx", "peyy", "pezz", "pexy", "pexz", "peyz", "pemaxp", "peminp"],
    ),
    ("sf", FieldLocation::Element, &["sf1", "sf2", "sf3", "sf4", "sf5"]),
    ("sm", FieldLocation::Element, &["sm1", "sm2", "sm3"]),
    (
        "spf",
        FieldLocation::Element,
        &["spf1", "spf2", "spf3", "spf4", "spf5", "spf6"],
    ),
    ("rbfor", FieldLocation::Element, &["rbfor"]),
];

/// Location of a canonical field
pub fn field_location(field: &str) -> Option<FieldLocation> {
    FIELD_COMPONENTS
        .iter()
        .find(|(name, _, _)| *name == field)
        .map(|(_, loc, _)| *loc)
}

/// Flat components of a canonical field
pub fn field_components(field: &str) -> Option<&'static [&'static str]> {
    FIELD_COMPONENTS
        .iter()
        .find(|(name, _, _)| *name == field)
        .map(|(_, _, comps)| *comps)
}

/// Reject any field that is not canonical
pub fn validate_fields<S: AsRef<str>>(fields: &[S]) -> FEAResult<()> {
    let unknown: Vec<&str> = fields
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| field_location(f).is_none())
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(FEAError::Validation(format!(
            "unknown output field(s): {}",
            unknown.join(", ")
        )))
    }
}

/// Results of one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResults {
    /// Nodal components, e.g. `ux`
    #[serde(default)]
    pub nodal: BTreeMap<String, BTreeMap<usize, f64>>,
    /// Element components, e.g. `smises`
    #[serde(default)]
    pub element: BTreeMap<String, BTreeMap<usize, f64>>,
    /// Natural or buckling frequencies, in mode order
    #[serde(default)]
    pub frequencies: Vec<f64>,
    /// Effective modal masses, in mode order
    #[serde(default)]
    pub masses: Vec<f64>,
}

impl StepResults {
    pub fn insert_nodal(&mut self, component: &str, key: usize, value: f64) {
        self.nodal
            .entry(component.to_string())
            .or_default()
            .insert(key, value);
    }

    pub fn insert_element(&mut self, component: &str, key: usize, value: f64) {
        self.element
            .entry(component.to_string())
            .or_default()
            .insert(key, value);
    }

    /// Fill `magnitude` with the Euclidean norm of the three `components`
    pub fn add_nodal_magnitude(&mut self, components: [&str; 3], magnitude: &str) {
        let Some(first) = self.nodal.get(components[0]) else {
            return;
        };
        let mut norms = BTreeMap::new();
        for &key in first.keys() {
            let sum: f64 = components
                .iter()
                .filter_map(|c| self.nodal.get(*c).and_then(|m| m.get(&key)))
                .map(|v| v * v)
                .sum();
            norms.insert(key, sum.sqrt());
        }
        self.nodal.insert(magnitude.to_string(), norms);
    }

    pub fn is_empty(&self) -> bool {
        self.nodal.is_empty()
            && self.element.is_empty()
            && self.frequencies.is_empty()
            && self.masses.is_empty()
    }
}

/// Von Mises equivalent of a stress tensor
pub fn von_mises(sxx: f64, syy: f64, szz: f64, sxy: f64, sxz: f64, syz: f64) -> f64 {
    (0.5 * ((sxx - syy).powi(2) + (syy - szz).powi(2) + (szz - sxx).powi(2))
        + 3.0 * (sxy.powi(2) + sxz.powi(2) + syz.powi(2)))
    .sqrt()
}

/// Results of every analysed step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    steps: BTreeMap<String, StepResults>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, step: &str, results: StepResults) {
        self.steps.insert(step.to_string(), results);
    }

    pub fn step(&self, step: &str) -> Option<&StepResults> {
        self.steps.get(step)
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Insert every step of `other`, replacing steps of the same name
    pub fn merge(&mut self, other: Results) {
        self.steps.extend(other.steps);
    }

    /// One component of a step, by location
    pub fn component(
        &self,
        step: &str,
        location: FieldLocation,
        component: &str,
    ) -> FEAResult<&BTreeMap<usize, f64>> {
        let results = self
            .step(step)
            .ok_or_else(|| FEAError::Validation(format!("no results for step '{step}'")))?;
        let table = match location {
            FieldLocation::Node => &results.nodal,
            FieldLocation::Element => &results.element,
        };
        table.get(component).ok_or_else(|| {
            FEAError::Validation(format!("no '{component}' results in step '{step}'"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_field_table() {
        assert_eq!(field_location("u"), Some(FieldLocation::Node));
        assert_eq!(field_location("s"), Some(FieldLocation::Element));
        assert_eq!(field_components("u"), Some(&["ux", "uy", "uz", "um"][..]));
        assert!(validate_fields(&["u", "rf", "s"]).is_ok());
        let err = validate_fields(&["u", "bogus"]).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_magnitude() {
        let mut step = StepResults::default();
        step.insert_nodal("ux", 0, 3.0);
        step.insert_nodal("uy", 0, 4.0);
        step.insert_nodal("uz", 0, 0.0);
        step.add_nodal_magnitude(["ux", "uy", "uz"], "um");
        assert_relative_eq!(step.nodal["um"][&0], 5.0);
    }

    #[test]
    fn test_von_mises_uniaxial() {
        assert_relative_eq!(von_mises(100.0, 0.0, 0.0, 0.0, 0.0, 0.0), 100.0);
        assert_relative_eq!(von_mises(0.0, 0.0, 0.0, 10.0, 0.0, 0.0), 10.0 * 3f64.sqrt());
    }

    #[test]
    fn test_component_lookup() {
        let mut step = StepResults::default();
        step.insert_element("smises", 2, 1.5);
        let mut results = Results::new();
        results.insert("load", step);
        assert_eq!(
            results.component("load", FieldLocation::Element, "smises").unwrap()[&2],
            1.5
        );
        assert!(results.component("load", FieldLocation::Node, "ux").is_err());
        assert!(results.component("other", FieldLocation::Node, "ux").is_err());
    }
}
