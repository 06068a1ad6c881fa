//! Prescribed displacements (boundary conditions)

use serde::{Deserialize, Serialize};

use super::{Axes, Dofs, Target};

/// Axes along which a roller is free to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollerAxis {
    X,
    Y,
    Z,
    XY,
    YZ,
    XZ,
}

impl RollerAxis {
    fn free(&self) -> [bool; 3] {
        match self {
            RollerAxis::X => [true, false, false],
            RollerAxis::Y => [false, true, false],
            RollerAxis::Z => [false, false, true],
            RollerAxis::XY => [true, true, false],
            RollerAxis::YZ => [false, true, true],
            RollerAxis::XZ => [true, false, true],
        }
    }
}

/// Displacement variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplacementType {
    Fixed,
    Pinned,
    Roller(RollerAxis),
    General,
}

/// A named set of prescribed DOF values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub name: String,
    /// Nodes the displacement acts on
    pub target: Target,
    pub dofs: Dofs,
    #[serde(default)]
    pub axes: Axes,
    pub displacement_type: DisplacementType,
}

impl Displacement {
    /// Arbitrary prescribed values
    pub fn general(name: &str, target: impl Into<Target>, dofs: Dofs) -> Self {
        Self {
            name: name.to_string(),
            target: target.into(),
            dofs,
            axes: Axes::Global,
            displacement_type: DisplacementType::General,
        }
    }

    /// All six DOFs held at zero
    pub fn fixed(name: &str, target: impl Into<Target>) -> Self {
        Self {
            displacement_type: DisplacementType::Fixed,
            ..Self::general(name, target, Dofs::all([0.0; 6]))
        }
    }

    /// Translations held at zero, rotations free
    pub fn pinned(name: &str, target: impl Into<Target>) -> Self {
        Self {
            displacement_type: DisplacementType::Pinned,
            ..Self::general(name, target, Dofs::xyz(0.0, 0.0, 0.0))
        }
    }

    /// Translations free along `axis`, the rest held, rotations free
    pub fn roller(name: &str, target: impl Into<Target>, axis: RollerAxis) -> Self {
        let free = axis.free();
        let held = |i: usize| if free[i] { None } else { Some(0.0) };
        let dofs = Dofs {
            x: held(0),
            y: held(1),
            z: held(2),
            ..Default::default()
        };
        Self {
            displacement_type: DisplacementType::Roller(axis),
            ..Self::general(name, target, dofs)
        }
    }

    pub fn with_axes(mut self, axes: Axes) -> Self {
        self.axes = axes;
        self
    }

    /// Variant tag
    pub fn displacement_type_name(&self) -> String {
        match self.displacement_type {
            DisplacementType::Fixed => "FixedDisplacement".to_string(),
            DisplacementType::Pinned => "PinnedDisplacement".to_string(),
            DisplacementType::Roller(axis) => format!("RollerDisplacement{axis:?}"),
            DisplacementType::General => "GeneralDisplacement".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_and_pinned() {
        let fixed = Displacement::fixed("fix", "supports");
        assert_eq!(fixed.dofs.defined().count(), 6);
        let pinned = Displacement::pinned("pin", vec![0, 1]);
        assert_eq!(pinned.dofs.values()[..3], [Some(0.0); 3]);
        assert!(pinned.dofs.xx.is_none());
        assert_eq!(pinned.target, Target::Keys(vec![0, 1]));
    }

    #[test]
    fn test_roller_frees_its_axes() {
        let roller = Displacement::roller("r", "edge", RollerAxis::XY);
        assert_eq!(roller.dofs.x, None);
        assert_eq!(roller.dofs.y, None);
        assert_eq!(roller.dofs.z, Some(0.0));
        assert_eq!(roller.displacement_type_name(), "RollerDisplacementXY");
    }
}
