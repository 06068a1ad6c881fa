//! Structural entities: nodes, elements, materials, sections and properties

mod element;
mod material;
mod node;
mod properties;
mod section;

pub use element::{Element, ElementType, LocalAxes};
pub use material::{Material, MaterialModel, YieldCurve};
pub use node::{LocalFrame, Node};
pub use properties::{ElementProperties, Reinforcement};
pub use section::{Section, SectionType};
