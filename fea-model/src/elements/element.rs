//! Elements - typed topologies over node keys

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Element variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementType {
    Beam,
    Spring,
    Truss,
    Strut,
    Tie,
    Shell,
    Membrane,
    Face,
    Tetrahedron,
    Pentahedron,
    Hexahedron,
    Mass,
}

impl ElementType {
    pub const ALL: [ElementType; 12] = [
        ElementType::Beam,
        ElementType::Spring,
        ElementType::Truss,
        ElementType::Strut,
        ElementType::Tie,
        ElementType::Shell,
        ElementType::Membrane,
        ElementType::Face,
        ElementType::Tetrahedron,
        ElementType::Pentahedron,
        ElementType::Hexahedron,
        ElementType::Mass,
    ];

    /// Lower-case variant tag used in keys and logs
    pub fn tag(&self) -> &'static str {
        match self {
            ElementType::Beam => "beam",
            ElementType::Spring => "spring",
            ElementType::Truss => "truss",
            ElementType::Strut => "strut",
            ElementType::Tie => "tie",
            ElementType::Shell => "shell",
            ElementType::Membrane => "membrane",
            ElementType::Face => "face",
            ElementType::Tetrahedron => "tetrahedron",
            ElementType::Pentahedron => "pentahedron",
            ElementType::Hexahedron => "hexahedron",
            ElementType::Mass => "mass",
        }
    }

    /// Two-node line elements
    pub fn is_line(&self) -> bool {
        matches!(
            self,
            ElementType::Beam
                | ElementType::Spring
                | ElementType::Truss
                | ElementType::Strut
                | ElementType::Tie
        )
    }

    /// Axial-only line elements
    pub fn is_axial(&self) -> bool {
        matches!(self, ElementType::Truss | ElementType::Strut | ElementType::Tie)
    }

    /// Triangular or quadrilateral surface elements
    pub fn is_surface(&self) -> bool {
        matches!(
            self,
            ElementType::Shell | ElementType::Membrane | ElementType::Face
        )
    }

    pub fn is_solid(&self) -> bool {
        matches!(
            self,
            ElementType::Tetrahedron | ElementType::Pentahedron | ElementType::Hexahedron
        )
    }

    /// Accepted node counts
    pub fn arity(&self) -> &'static [usize] {
        match self {
            ElementType::Mass => &[1],
            t if t.is_line() => &[2],
            t if t.is_surface() => &[3, 4],
            ElementType::Tetrahedron => &[4],
            ElementType::Pentahedron => &[6],
            _ => &[8],
        }
    }

    /// Check a topology length against the variant's arity
    pub fn check_arity(&self, count: usize) -> FEAResult<()> {
        if self.arity().contains(&count) {
            Ok(())
        } else {
            Err(FEAError::Validation(format!(
                "{} element expects {:?} nodes, got {}",
                self.tag(),
                self.arity(),
                count
            )))
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Local element axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalAxes {
    pub ex: [f64; 3],
    pub ey: [f64; 3],
    pub ez: [f64; 3],
}

/// An element of the structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Dense 0-based key
    pub key: usize,
    /// Element variant
    pub element_type: ElementType,
    /// Ordered node keys
    pub nodes: Vec<usize>,
    /// Optional local axes (beams use `ez` as orientation)
    #[serde(default)]
    pub axes: Option<LocalAxes>,
    /// Thickness override for surface elements
    #[serde(default)]
    pub thickness: Option<f64>,
    /// Area override for line elements
    #[serde(default)]
    pub area: Option<f64>,
}

impl Element {
    pub fn new(key: usize, element_type: ElementType, nodes: Vec<usize>) -> Self {
        Self {
            key,
            element_type,
            nodes,
            axes: None,
            thickness: None,
            area: None,
        }
    }

    /// Attach local axes
    pub fn with_axes(mut self, axes: LocalAxes) -> Self {
        self.axes = Some(axes);
        self
    }

    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = Some(thickness);
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }
}
