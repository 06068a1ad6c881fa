//! Boundary conditions, loads and analysis steps

mod displacement;
mod load;
mod step;

pub use displacement::{Displacement, DisplacementType, RollerAxis};
pub use load::{Load, LoadKind};
pub use step::{Step, StepKind};

use serde::{Deserialize, Serialize};

/// What a displacement or load acts on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
    /// A named set (or one of the implicit sets)
    Set(String),
    /// Explicit node or element keys
    Keys(Vec<usize>),
}

impl Target {
    pub fn set(name: &str) -> Self {
        Target::Set(name.to_string())
    }

    pub fn set_name(&self) -> Option<&str> {
        match self {
            Target::Set(name) => Some(name),
            Target::Keys(_) => None,
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::set(name)
    }
}

impl From<Vec<usize>> for Target {
    fn from(keys: Vec<usize>) -> Self {
        Target::Keys(keys)
    }
}

/// Frame in which components are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axes {
    #[default]
    Global,
    Local,
}

/// Per-DOF values; `None` leaves the DOF free (or unloaded)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dofs {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub xx: Option<f64>,
    #[serde(default)]
    pub yy: Option<f64>,
    #[serde(default)]
    pub zz: Option<f64>,
}

impl Dofs {
    /// Translational components only
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
            ..Default::default()
        }
    }

    /// All six components
    pub fn all(values: [f64; 6]) -> Self {
        Self {
            x: Some(values[0]),
            y: Some(values[1]),
            z: Some(values[2]),
            xx: Some(values[3]),
            yy: Some(values[4]),
            zz: Some(values[5]),
        }
    }

    /// Components in DOF order x, y, z, xx, yy, zz
    pub fn values(&self) -> [Option<f64>; 6] {
        [self.x, self.y, self.z, self.xx, self.yy, self.zz]
    }

    /// (0-based DOF index, value) for each defined component
    pub fn defined(&self) -> impl Iterator<Item = (usize, f64)> {
        self.values()
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }

    /// Every defined component scaled by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        let v = self.values().map(|c| c.map(|c| c * factor));
        Self {
            x: v[0],
            y: v[1],
            z: v[2],
            xx: v[3],
            yy: v[4],
            zz: v[5],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }

    /// Whether every defined component is finite
    pub fn is_finite(&self) -> bool {
        self.defined().all(|(_, v)| v.is_finite())
    }
}
