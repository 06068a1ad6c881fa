//! Constraints, interactions, amplitudes and temperature tables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// A named constraint between two surfaces or sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Constraint {
    /// Tie a slave set to a master surface within `tol`
    Tie {
        name: String,
        master: String,
        slave: String,
        tol: f64,
    },
}

impl Constraint {
    pub fn tie(name: &str, master: &str, slave: &str, tol: f64) -> Self {
        Constraint::Tie {
            name: name.to_string(),
            master: master.to_string(),
            slave: slave.to_string(),
            tol,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Constraint::Tie { name, .. } => name,
        }
    }

    /// Sets referenced by the constraint
    pub fn set_names(&self) -> Vec<&str> {
        match self {
            Constraint::Tie { master, slave, .. } => vec![master.as_str(), slave.as_str()],
        }
    }
}

/// A named surface interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Interaction {
    /// Film convection and radiation on a surface
    HeatTransfer {
        name: String,
        /// Amplitude driving the sink temperature
        amplitude: String,
        /// Element surface exchanging heat
        interface: String,
        sink_temp: f64,
        film_coef: f64,
        ambient_temp: f64,
        emissivity: f64,
    },
}

impl Interaction {
    pub fn heat_transfer(
        name: &str,
        amplitude: &str,
        interface: &str,
        sink_temp: f64,
        film_coef: f64,
        ambient_temp: f64,
        emissivity: f64,
    ) -> Self {
        Interaction::HeatTransfer {
            name: name.to_string(),
            amplitude: amplitude.to_string(),
            interface: interface.to_string(),
            sink_temp,
            film_coef,
            ambient_temp,
            emissivity,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Interaction::HeatTransfer { name, .. } => name,
        }
    }
}

/// Miscellaneous named data referenced by steps and interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Misc {
    /// Piecewise-linear f(x) given as (x, f) pairs
    Amplitude { name: String, values: Vec<[f64; 2]> },
    /// Nodal temperatures per time point
    Temperatures {
        name: String,
        /// (time, node key -> temperature) rows
        rows: Vec<TemperatureRow>,
    },
}

/// Nodal temperatures at one time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRow {
    pub time: f64,
    pub values: BTreeMap<String, f64>,
}

impl TemperatureRow {
    pub fn new(time: f64, values: &[(usize, f64)]) -> Self {
        Self {
            time,
            values: values.iter().map(|(k, t)| (k.to_string(), *t)).collect(),
        }
    }

    /// (node key, temperature) in key order
    pub fn nodal(&self) -> Vec<(usize, f64)> {
        let mut out: Vec<(usize, f64)> = self
            .values
            .iter()
            .filter_map(|(k, t)| k.parse().ok().map(|k| (k, *t)))
            .collect();
        out.sort_by_key(|(k, _)| *k);
        out
    }
}

impl Misc {
    pub fn amplitude(name: &str, values: Vec<[f64; 2]>) -> Self {
        Misc::Amplitude {
            name: name.to_string(),
            values,
        }
    }

    pub fn temperatures(name: &str, rows: Vec<TemperatureRow>) -> Self {
        Misc::Temperatures {
            name: name.to_string(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Misc::Amplitude { name, .. } | Misc::Temperatures { name, .. } => name,
        }
    }

    pub fn validate(&self) -> FEAResult<()> {
        match self {
            Misc::Amplitude { name, values } => {
                if values.is_empty() {
                    return Err(FEAError::Validation(format!("amplitude '{name}' is empty")));
                }
                if values.windows(2).any(|w| w[1][0] < w[0][0]) {
                    return Err(FEAError::Validation(format!(
                        "amplitude '{name}' abscissae must not decrease"
                    )));
                }
            }
            Misc::Temperatures { name, rows } => {
                if rows.iter().any(|r| r.nodal().len() != r.values.len()) {
                    return Err(FEAError::Validation(format!(
                        "temperatures '{name}' have a non-integer node key"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_order() {
        assert!(Misc::amplitude("a", vec![[0.0, 0.0], [1.0, 1.0]]).validate().is_ok());
        assert!(Misc::amplitude("a", vec![[1.0, 0.0], [0.0, 1.0]]).validate().is_err());
    }

    #[test]
    fn test_temperature_rows_sorted() {
        let row = TemperatureRow::new(0.0, &[(10, 20.0), (2, 25.0)]);
        assert_eq!(row.nodal(), vec![(2, 25.0), (10, 20.0)]);
    }

    #[test]
    fn test_tie_sets() {
        let tie = Constraint::tie("tie", "slab_top", "column_top", 0.01);
        assert_eq!(tie.name(), "tie");
        assert_eq!(tie.set_names(), vec!["slab_top", "column_top"]);
    }
}
