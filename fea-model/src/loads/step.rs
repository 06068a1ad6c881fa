//! Analysis steps

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Step variant and its analysis controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepKind {
    /// Static, optionally geometrically nonlinear
    General,
    /// Natural frequencies
    Modal { modes: usize },
    /// Linear buckling
    Buckle { modes: usize },
    /// Steady-state response at the listed frequencies
    Harmonic { frequencies: Vec<f64>, damping: f64 },
    /// Frequency sweep for acoustic analysis
    Acoustic {
        freq_range: [f64; 2],
        freq_step: f64,
        damping: f64,
    },
    /// Transient heat transfer
    Heat {
        interaction: String,
        temp0: f64,
        dtmax: f64,
        duration: f64,
    },
}

/// A named analysis step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub kind: StepKind,
    /// Displacements to activate, by name
    #[serde(default)]
    pub displacements: Vec<String>,
    /// Loads to activate, by name
    #[serde(default)]
    pub loads: Vec<String>,
    /// Factor applied to every load
    pub factor: f64,
    /// Per-load factors, overriding `factor`
    #[serde(default)]
    pub load_factors: BTreeMap<String, f64>,
    pub increments: usize,
    pub iterations: usize,
    pub tolerance: f64,
    pub nlgeom: bool,
    /// Name of a temperatures table applied in this step
    #[serde(default)]
    pub temperatures: Option<String>,
}

impl Step {
    pub fn new(name: &str, kind: StepKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            displacements: Vec::new(),
            loads: Vec::new(),
            factor: 1.0,
            load_factors: BTreeMap::new(),
            increments: 100,
            iterations: 100,
            tolerance: 0.01,
            nlgeom: false,
            temperatures: None,
        }
    }

    /// Static step activating displacements and loads
    pub fn general(name: &str, displacements: &[&str], loads: &[&str]) -> Self {
        Self::new(name, StepKind::General)
            .with_displacements(displacements)
            .with_loads(loads)
    }

    pub fn modal(name: &str, modes: usize, displacements: &[&str]) -> Self {
        Self::new(name, StepKind::Modal { modes }).with_displacements(displacements)
    }

    pub fn buckle(name: &str, modes: usize, displacements: &[&str], loads: &[&str]) -> Self {
        Self::new(name, StepKind::Buckle { modes })
            .with_displacements(displacements)
            .with_loads(loads)
    }

    pub fn harmonic(
        name: &str,
        frequencies: Vec<f64>,
        damping: f64,
        displacements: &[&str],
        loads: &[&str],
    ) -> Self {
        Self::new(
            name,
            StepKind::Harmonic {
                frequencies,
                damping,
            },
        )
        .with_displacements(displacements)
        .with_loads(loads)
    }

    pub fn acoustic(
        name: &str,
        freq_range: [f64; 2],
        freq_step: f64,
        displacements: &[&str],
        loads: &[&str],
    ) -> Self {
        Self::new(
            name,
            StepKind::Acoustic {
                freq_range,
                freq_step,
                damping: 0.0,
            },
        )
        .with_displacements(displacements)
        .with_loads(loads)
    }

    pub fn heat(name: &str, interaction: &str, temp0: f64, duration: f64) -> Self {
        Self::new(
            name,
            StepKind::Heat {
                interaction: interaction.to_string(),
                temp0,
                dtmax: duration / 100.0,
                duration,
            },
        )
    }

    pub fn with_displacements(mut self, names: &[&str]) -> Self {
        self.displacements = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_loads(mut self, names: &[&str]) -> Self {
        self.loads = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Override the factor of one load
    pub fn with_load_factor(mut self, load: &str, factor: f64) -> Self {
        self.load_factors.insert(load.to_string(), factor);
        self
    }

    pub fn with_nlgeom(mut self, nlgeom: bool) -> Self {
        self.nlgeom = nlgeom;
        self
    }

    pub fn with_increments(mut self, increments: usize) -> Self {
        self.increments = increments;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_temperatures(mut self, name: &str) -> Self {
        self.temperatures = Some(name.to_string());
        self
    }

    /// Factor applied to `load`
    pub fn factor_for(&self, load: &str) -> f64 {
        self.load_factors.get(load).copied().unwrap_or(self.factor)
    }

    /// Variant tag
    pub fn step_type(&self) -> &'static str {
        match self.kind {
            StepKind::General => "GeneralStep",
            StepKind::Modal { .. } => "ModalStep",
            StepKind::Buckle { .. } => "BucklingStep",
            StepKind::Harmonic { .. } => "HarmonicStep",
            StepKind::Acoustic { .. } => "AcousticStep",
            StepKind::Heat { .. } => "HeatStep",
        }
    }

    pub fn validate(&self) -> FEAResult<()> {
        let bad = |msg: &str| {
            Err(FEAError::Validation(format!("step '{}': {msg}", self.name)))
        };
        match &self.kind {
            StepKind::Modal { modes } | StepKind::Buckle { modes } if *modes == 0 => {
                return bad("needs at least one mode")
            }
            StepKind::Harmonic { frequencies, .. } if frequencies.is_empty() => {
                return bad("needs at least one frequency")
            }
            StepKind::Acoustic {
                freq_range,
                freq_step,
                ..
            } if freq_range[1] < freq_range[0] || *freq_step <= 0.0 => {
                return bad("needs an increasing frequency range and a positive step")
            }
            StepKind::Heat { duration, .. } if *duration <= 0.0 => {
                return bad("needs a positive duration")
            }
            _ => {}
        }
        if self.increments == 0 {
            return bad("needs at least one increment");
        }
        if !self.factor.is_finite() || self.load_factors.values().any(|f| !f.is_finite()) {
            return bad("load factors must be finite");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_defaults() {
        let step = Step::general("load", &["pins"], &["point"]);
        assert_eq!(step.increments, 100);
        assert_eq!(step.iterations, 100);
        assert!(!step.nlgeom);
        assert_eq!(step.loads, vec!["point".to_string()]);
        assert_eq!(step.step_type(), "GeneralStep");
    }

    #[test]
    fn test_load_factors() {
        let step = Step::general("s", &[], &["dead", "live"])
            .with_factor(1.35)
            .with_load_factor("live", 1.5);
        assert_eq!(step.factor_for("dead"), 1.35);
        assert_eq!(step.factor_for("live"), 1.5);
    }

    #[test]
    fn test_validate_modes() {
        assert!(Step::modal("m", 5, &["pins"]).validate().is_ok());
        assert!(Step::modal("m", 0, &["pins"]).validate().is_err());
    }
}
