//! Loads acting on nodes or elements

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Axes, Dofs, Target};
use crate::error::{FEAError, FEAResult};

/// Load variant and its components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoadKind {
    /// Concentrated forces and moments, same on every target node
    Point { components: Dofs },
    /// Concentrated forces and moments per node
    PointList { components: BTreeMap<usize, Dofs> },
    /// Distributed force per unit length on line elements
    Line { components: Dofs },
    /// Pressure on surface elements (`z` is normal)
    Area { components: Dofs },
    /// Self-weight acceleration `g` along a unit `direction`
    Gravity { g: f64, direction: [f64; 3] },
    /// Initial axial stress
    Prestress { sxx: f64 },
    /// Nodal temperature
    Thermal { temperature: f64 },
    /// Area load already lumped to nodes
    Tributary { components: BTreeMap<usize, Dofs> },
    /// Harmonic concentrated force
    HarmonicPoint { components: Dofs },
    /// Acoustic pressure at nodes
    AcousticPoint { pressure: f64 },
}

/// A named load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub name: String,
    pub target: Target,
    #[serde(default)]
    pub axes: Axes,
    pub kind: LoadKind,
}

impl Load {
    pub fn new(name: &str, target: impl Into<Target>, kind: LoadKind) -> Self {
        Self {
            name: name.to_string(),
            target: target.into(),
            axes: Axes::Global,
            kind,
        }
    }

    pub fn point(name: &str, target: impl Into<Target>, components: Dofs) -> Self {
        Self::new(name, target, LoadKind::Point { components })
    }

    /// Per-node point loads; targets exactly the listed nodes
    pub fn point_list(name: &str, components: BTreeMap<usize, Dofs>) -> Self {
        let keys = components.keys().copied().collect::<Vec<_>>();
        Self::new(name, keys, LoadKind::PointList { components })
    }

    /// Nodal loads lumped from a distributed area load
    pub fn tributary(name: &str, components: BTreeMap<usize, Dofs>) -> Self {
        let keys = components.keys().copied().collect::<Vec<_>>();
        Self::new(name, keys, LoadKind::Tributary { components })
    }

    /// Uniform load on beams, in local axes
    pub fn line(name: &str, target: impl Into<Target>, components: Dofs) -> Self {
        Self::new(name, target, LoadKind::Line { components }).with_axes(Axes::Local)
    }

    /// Uniform pressure on shells, in local axes
    pub fn area(name: &str, target: impl Into<Target>, pressure: f64) -> Self {
        let components = Dofs {
            z: Some(pressure),
            ..Default::default()
        };
        Self::new(name, target, LoadKind::Area { components }).with_axes(Axes::Local)
    }

    /// Standard gravity acting along -z
    pub fn gravity(name: &str, target: impl Into<Target>) -> Self {
        Self::new(
            name,
            target,
            LoadKind::Gravity {
                g: 9.81,
                direction: [0.0, 0.0, -1.0],
            },
        )
    }

    pub fn prestress(name: &str, target: impl Into<Target>, sxx: f64) -> Self {
        Self::new(name, target, LoadKind::Prestress { sxx })
    }

    pub fn thermal(name: &str, target: impl Into<Target>, temperature: f64) -> Self {
        Self::new(name, target, LoadKind::Thermal { temperature })
    }

    pub fn harmonic_point(name: &str, target: impl Into<Target>, components: Dofs) -> Self {
        Self::new(name, target, LoadKind::HarmonicPoint { components })
    }

    pub fn acoustic_point(name: &str, target: impl Into<Target>, pressure: f64) -> Self {
        Self::new(name, target, LoadKind::AcousticPoint { pressure })
    }

    pub fn with_axes(mut self, axes: Axes) -> Self {
        self.axes = axes;
        self
    }

    /// Variant tag
    pub fn load_type(&self) -> &'static str {
        match self.kind {
            LoadKind::Point { .. } => "PointLoad",
            LoadKind::PointList { .. } => "PointLoads",
            LoadKind::Line { .. } => "LineLoad",
            LoadKind::Area { .. } => "AreaLoad",
            LoadKind::Gravity { .. } => "GravityLoad",
            LoadKind::Prestress { .. } => "PrestressLoad",
            LoadKind::Thermal { .. } => "ThermalLoad",
            LoadKind::Tributary { .. } => "TributaryLoad",
            LoadKind::HarmonicPoint { .. } => "HarmonicPointLoad",
            LoadKind::AcousticPoint { .. } => "AcousticPointLoad",
        }
    }

    /// Whether the target keys are nodes (otherwise elements)
    pub fn targets_nodes(&self) -> bool {
        !matches!(
            self.kind,
            LoadKind::Line { .. }
                | LoadKind::Area { .. }
                | LoadKind::Gravity { .. }
                | LoadKind::Prestress { .. }
        )
    }

    fn is_finite(&self) -> bool {
        match &self.kind {
            LoadKind::Point { components }
            | LoadKind::Line { components }
            | LoadKind::Area { components }
            | LoadKind::HarmonicPoint { components } => components.is_finite(),
            LoadKind::PointList { components } | LoadKind::Tributary { components } => {
                components.values().all(Dofs::is_finite)
            }
            LoadKind::Gravity { g, direction } => {
                g.is_finite() && direction.iter().all(|d| d.is_finite())
            }
            LoadKind::Prestress { sxx: v }
            | LoadKind::Thermal { temperature: v }
            | LoadKind::AcousticPoint { pressure: v } => v.is_finite(),
        }
    }

    /// Components at `node`; per-node variants fall back to nothing
    pub fn components_at(&self, node: usize) -> Option<Dofs> {
        match &self.kind {
            LoadKind::Point { components }
            | LoadKind::HarmonicPoint { components }
            | LoadKind::Line { components }
            | LoadKind::Area { components } => Some(*components),
            LoadKind::PointList { components } | LoadKind::Tributary { components } => {
                components.get(&node).copied()
            }
            _ => None,
        }
    }

    pub fn validate(&self) -> FEAResult<()> {
        if !self.is_finite() {
            return Err(FEAError::Validation(format!(
                "load '{}' has a non-finite component",
                self.name
            )));
        }
        match &self.kind {
            LoadKind::Gravity { g, direction } => {
                let norm = direction.iter().map(|d| d * d).sum::<f64>().sqrt();
                if !g.is_finite() || (norm - 1.0).abs() > 1e-6 {
                    return Err(FEAError::Validation(format!(
                        "gravity load '{}' needs a finite g and a unit direction",
                        self.name
                    )));
                }
            }
            LoadKind::PointList { components } | LoadKind::Tributary { components }
                if components.is_empty() =>
            {
                return Err(FEAError::Validation(format!(
                    "load '{}' lists no nodes",
                    self.name
                )));
            }
            _ => {}
        }
        Ok(())
    }
}
