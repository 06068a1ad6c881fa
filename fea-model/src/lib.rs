//! FEA Model - a solver-agnostic structural model for finite element decks
//!
//! This library holds everything a solver input deck is written from:
//! - Nodes keyed by rounded coordinates, so repeated insertions collapse
//! - Typed elements (beams, trusses, shells, solids, springs, masses)
//! - Named sets, materials, sections and element properties
//! - Displacements, loads and an ordered list of analysis steps
//! - A pre-write resolution pass and a JSON snapshot format
//! - A result envelope keyed by step, component and node/element
//!
//! ## Example
//! ```rust
//! use fea_model::prelude::*;
//!
//! let mut s = Structure::new("tower", "/tmp");
//! let base = s.add_nodes(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]).unwrap();
//! let top = s.add_node([0.0, 0.0, 1.0]).unwrap();
//! for b in base {
//!     s.add_element(ElementType::Truss, vec![b, top]).unwrap();
//! }
//!
//! s.add(vec![
//!     Material::elastic_isotropic("steel", 200e9, 0.3, 7850.0).into(),
//!     Section::truss("bar", 1e-4).into(),
//!     ElementProperties::new("ep", "steel", "bar", "elset_all").into(),
//!     Set::nodes("base", vec![0, 1, 2]).into(),
//!     Displacement::pinned("pinned", "base").into(),
//!     Load::point("tip", vec![top], Dofs::xyz(2000.0, 1000.0, -100000.0)).into(),
//!     Step::general("bc", &["pinned"], &[]).into(),
//!     Step::general("load", &["pinned"], &["tip"]).into(),
//! ])
//! .unwrap();
//!
//! let resolved = resolve(&s).unwrap();
//! assert_eq!(resolved.steps.len(), 2);
//! ```

pub mod catalog;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod loads;
pub mod misc;
pub mod model;
pub mod results;
pub mod sets;
pub mod snapshot;
pub mod validate;

// Re-export common types
pub mod prelude {
    pub use crate::catalog::{DuplicatePolicy, Named, NamedStore};
    pub use crate::elements::{
        Element, ElementProperties, ElementType, LocalAxes, LocalFrame, Material, MaterialModel,
        Node, Reinforcement, Section, SectionType, YieldCurve,
    };
    pub use crate::error::{FEAError, FEAResult, MissingRef};
    pub use crate::geometry::{element_key, geometric_key};
    pub use crate::loads::{
        Axes, Displacement, DisplacementType, Dofs, Load, LoadKind, RollerAxis, Step, StepKind,
        Target,
    };
    pub use crate::misc::{Constraint, Interaction, Misc, TemperatureRow};
    pub use crate::model::{Entity, EntityKind, Structure};
    pub use crate::results::{FieldLocation, Results, StepResults, FIELD_COMPONENTS};
    pub use crate::sets::{Face, Set, SetKind, ELSET_ALL, NSET_ALL};
    pub use crate::validate::{resolve, ElementBlock, Resolved};
}
