//! Named node and element sets

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Implicit set of every node
pub const NSET_ALL: &str = "nset_all";
/// Implicit set of every element
pub const ELSET_ALL: &str = "elset_all";

/// What a set selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetKind {
    Node,
    Element,
    NodeSurface,
    ElementSurface,
}

impl SetKind {
    /// Whether members are node keys
    pub fn selects_nodes(&self) -> bool {
        matches!(self, SetKind::Node | SetKind::NodeSurface)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SetKind::Node => "node set",
            SetKind::Element => "element set",
            SetKind::NodeSurface => "node surface",
            SetKind::ElementSurface => "element surface",
        }
    }
}

/// One face of an element, e.g. side `S1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub element: usize,
    pub side: String,
}

impl Face {
    pub fn new(element: usize, side: &str) -> Self {
        Self {
            element,
            side: side.to_string(),
        }
    }
}

/// Members of a set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    Keys(Vec<usize>),
    Faces(Vec<Face>),
}

/// A named set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    pub name: String,
    pub kind: SetKind,
    pub selection: Selection,
    /// Insertion index, assigned by the structure
    #[serde(default)]
    pub index: usize,
}

impl Set {
    fn with_keys(name: &str, kind: SetKind, keys: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            selection: Selection::Keys(keys),
            index: 0,
        }
    }

    pub fn nodes(name: &str, keys: Vec<usize>) -> Self {
        Self::with_keys(name, SetKind::Node, keys)
    }

    pub fn elements(name: &str, keys: Vec<usize>) -> Self {
        Self::with_keys(name, SetKind::Element, keys)
    }

    pub fn node_surface(name: &str, keys: Vec<usize>) -> Self {
        Self::with_keys(name, SetKind::NodeSurface, keys)
    }

    pub fn element_surface(name: &str, faces: Vec<Face>) -> Self {
        Self {
            name: name.to_string(),
            kind: SetKind::ElementSurface,
            selection: Selection::Faces(faces),
            index: 0,
        }
    }

    /// Member keys; for surfaces of faces the owning elements, deduplicated
    pub fn keys(&self) -> Vec<usize> {
        match &self.selection {
            Selection::Keys(keys) => keys.clone(),
            Selection::Faces(faces) => {
                let mut keys: Vec<usize> = Vec::with_capacity(faces.len());
                for face in faces {
                    if !keys.contains(&face.element) {
                        keys.push(face.element);
                    }
                }
                keys
            }
        }
    }

    pub fn len(&self) -> usize {
        match &self.selection {
            Selection::Keys(keys) => keys.len(),
            Selection::Faces(faces) => faces.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the selection against the set kind and the entity counts
    pub fn validate(&self, node_count: usize, element_count: usize) -> FEAResult<()> {
        if self.name == NSET_ALL || self.name == ELSET_ALL {
            return Err(FEAError::Validation(format!(
                "'{}' is reserved for the implicit set",
                self.name
            )));
        }
        let limit = if self.kind.selects_nodes() {
            node_count
        } else {
            element_count
        };
        match (&self.selection, self.kind) {
            (Selection::Faces(_), SetKind::ElementSurface) | (Selection::Keys(_), _) => {}
            (Selection::Faces(_), kind) => {
                return Err(FEAError::Validation(format!(
                    "set '{}': a {} cannot hold element faces",
                    self.name,
                    kind.label()
                )))
            }
        }
        if let Some(bad) = self.keys().into_iter().find(|k| *k >= limit) {
            return Err(FEAError::InvariantViolation(format!(
                "set '{}' references missing {} {bad}",
                self.name,
                if self.kind.selects_nodes() { "node" } else { "element" }
            )));
        }
        Ok(())
    }
}
