//! Structure - the model container and its derived queries

use std::collections::HashMap;
use std::path::PathBuf;

use log::{debug, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::catalog::{DuplicatePolicy, Named, NamedStore};
use crate::elements::{
    Element, ElementProperties, ElementType, LocalFrame, Material, Node, Section,
};
use crate::error::{FEAError, FEAResult, MissingRef};
use crate::geometry::{self, DEFAULT_PRECISION};
use crate::loads::{Displacement, Load, Step, Target};
use crate::misc::{Constraint, Interaction, Misc};
use crate::results::{FieldLocation, Results};
use crate::sets::{Set, ELSET_ALL, NSET_ALL};

/// Default number of DOFs per node
pub const DEFAULT_NDOF: usize = 6;

/// Any entity accepted by [`Structure::add`]
#[derive(Debug, Clone)]
pub enum Entity {
    Node([f64; 3]),
    Element(ElementType, Vec<usize>),
    Set(Set),
    Material(Material),
    Section(Section),
    ElementProperties(ElementProperties),
    Displacement(Displacement),
    Load(Load),
    Step(Step),
    Constraint(Constraint),
    Interaction(Interaction),
    Misc(Misc),
}

macro_rules! entity_from {
    ($($variant:ident),*) => {
        $(impl From<$variant> for Entity {
            fn from(value: $variant) -> Self {
                Entity::$variant(value)
            }
        })*
    };
}

entity_from!(
    Set,
    Material,
    Section,
    ElementProperties,
    Displacement,
    Load,
    Step,
    Constraint,
    Interaction,
    Misc
);

/// Named entity kinds, for [`Structure::remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Set,
    Material,
    Section,
    ElementProperties,
    Displacement,
    Load,
    Step,
    Constraint,
    Interaction,
    Misc,
}

/// The structural model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Model name, also the deck file stem
    pub name: String,
    /// Output directory for decks and solver scratch
    pub path: PathBuf,
    /// Geometric-key precision in decimal digits
    pub tol: i32,
    /// DOFs per node hint
    pub ndof: usize,
    /// How repeated names are handled
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    nodes: Vec<Node>,
    elements: Vec<Element>,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    #[serde(skip)]
    element_index: HashMap<String, usize>,

    sets: NamedStore<Set>,
    materials: NamedStore<Material>,
    sections: NamedStore<Section>,
    element_properties: NamedStore<ElementProperties>,
    displacements: NamedStore<Displacement>,
    loads: NamedStore<Load>,
    steps: NamedStore<Step>,
    constraints: NamedStore<Constraint>,
    interactions: NamedStore<Interaction>,
    misc: NamedStore<Misc>,

    /// Execution order of steps, by name
    pub steps_order: Vec<String>,
    /// Results attached after analysis
    #[serde(default)]
    pub results: Results,
}

impl Default for Structure {
    fn default() -> Self {
        Self::new("structure", ".")
    }
}

impl Structure {
    /// Create an empty structure writing to `path`
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            tol: DEFAULT_PRECISION,
            ndof: DEFAULT_NDOF,
            duplicate_policy: DuplicatePolicy::Reject,
            nodes: Vec::new(),
            elements: Vec::new(),
            node_index: HashMap::new(),
            element_index: HashMap::new(),
            sets: NamedStore::new(),
            materials: NamedStore::new(),
            sections: NamedStore::new(),
            element_properties: NamedStore::new(),
            displacements: NamedStore::new(),
            loads: NamedStore::new(),
            steps: NamedStore::new(),
            constraints: NamedStore::new(),
            interactions: NamedStore::new(),
            misc: NamedStore::new(),
            steps_order: Vec::new(),
            results: Results::new(),
        }
    }

    /// Set the geometric-key precision; only allowed before nodes exist
    pub fn with_tol(mut self, tol: i32) -> FEAResult<Self> {
        if tol < 0 {
            return Err(FEAError::Validation(format!(
                "precision must be non-negative, got {tol}"
            )));
        }
        if !self.nodes.is_empty() {
            return Err(FEAError::Validation(
                "precision cannot change once nodes exist".to_string(),
            ));
        }
        self.tol = tol;
        Ok(self)
    }

    pub fn with_ndof(mut self, ndof: usize) -> Self {
        self.ndof = ndof;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    // ========================
    // Nodes and elements
    // ========================

    /// Key of the node at `xyz`, if one exists at this precision
    pub fn check_node_exists(&self, xyz: [f64; 3]) -> Option<usize> {
        let gkey = geometry::geometric_key(xyz, self.tol).ok()?;
        self.node_index.get(&gkey).copied()
    }

    /// Add a node, returning the existing key when the point is already present
    pub fn add_node(&mut self, xyz: [f64; 3]) -> FEAResult<usize> {
        self.add_node_with(xyz, None, None)
    }

    /// Add a node with an optional local frame and lumped mass
    pub fn add_node_with(
        &mut self,
        xyz: [f64; 3],
        frame: Option<LocalFrame>,
        mass: Option<f64>,
    ) -> FEAResult<usize> {
        let gkey = geometry::geometric_key(xyz, self.tol)?;
        if let Some(&key) = self.node_index.get(&gkey) {
            debug!("node at {gkey} already exists as {key}");
            return Ok(key);
        }
        if let Some(frame) = &frame {
            frame.validate()?;
        }
        if let Some(m) = mass {
            if !(m.is_finite() && m >= 0.0) {
                return Err(FEAError::Validation(format!("invalid node mass {m}")));
            }
        }

        let key = self.nodes.len();
        let mut node = Node::new(key, xyz);
        node.frame = frame;
        node.mass = mass;
        self.nodes.push(node);
        self.node_index.insert(gkey, key);
        Ok(key)
    }

    /// Add several nodes, returning their keys in order
    pub fn add_nodes(&mut self, points: &[[f64; 3]]) -> FEAResult<Vec<usize>> {
        points.iter().map(|xyz| self.add_node(*xyz)).collect()
    }

    /// Key of an element with this variant and node set, if one exists
    pub fn check_element_exists(&self, element_type: ElementType, nodes: &[usize]) -> Option<usize> {
        self.element_index
            .get(&geometry::element_key(element_type, nodes))
            .copied()
    }

    /// Add an element, returning the existing key for a coincident element
    pub fn add_element(&mut self, element_type: ElementType, nodes: Vec<usize>) -> FEAResult<usize> {
        self.add_element_with(Element::new(0, element_type, nodes))
    }

    /// Add a prepared element; its `key` is reassigned
    pub fn add_element_with(&mut self, mut element: Element) -> FEAResult<usize> {
        element.element_type.check_arity(element.nodes.len())?;
        if let Some(bad) = element.nodes.iter().find(|&&n| n >= self.nodes.len()) {
            return Err(FEAError::InvariantViolation(format!(
                "{} element references missing node {bad}",
                element.element_type
            )));
        }

        let ekey = geometry::element_key(element.element_type, &element.nodes);
        if let Some(&key) = self.element_index.get(&ekey) {
            debug!("element {ekey} already exists as {key}");
            return Ok(key);
        }

        let key = self.elements.len();
        element.key = key;
        self.elements.push(element);
        self.element_index.insert(ekey, key);
        Ok(key)
    }

    pub fn node(&self, key: usize) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn element(&self, key: usize) -> Option<&Element> {
        self.elements.get(key)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    // ========================
    // Named entities
    // ========================

    /// Route each entity to its store
    pub fn add(&mut self, entities: Vec<Entity>) -> FEAResult<()> {
        for entity in entities {
            match entity {
                Entity::Node(xyz) => {
                    self.add_node(xyz)?;
                }
                Entity::Element(element_type, nodes) => {
                    self.add_element(element_type, nodes)?;
                }
                Entity::Set(set) => self.add_set(set)?,
                Entity::Material(material) => self.add_material(material)?,
                Entity::Section(section) => self.add_section(section)?,
                Entity::ElementProperties(ep) => self.add_element_properties(ep)?,
                Entity::Displacement(displacement) => self.add_displacement(displacement)?,
                Entity::Load(load) => self.add_load(load)?,
                Entity::Step(step) => self.add_step(step)?,
                Entity::Constraint(constraint) => self.add_constraint(constraint)?,
                Entity::Interaction(interaction) => self.add_interaction(interaction)?,
                Entity::Misc(misc) => self.add_misc(misc)?,
            }
        }
        Ok(())
    }

    fn store<T: Named>(
        store: &mut NamedStore<T>,
        item: T,
        policy: DuplicatePolicy,
        kind: &str,
    ) -> FEAResult<()> {
        let name = item.name().to_string();
        if store.insert(item, policy)?.is_some() {
            warn!("{kind} '{name}' replaced");
        } else {
            debug!("added {kind} '{name}'");
        }
        Ok(())
    }

    /// Add a set; members must already exist
    pub fn add_set(&mut self, mut set: Set) -> FEAResult<()> {
        set.validate(self.nodes.len(), self.elements.len())?;
        set.index = self.sets.position(&set.name).unwrap_or(self.sets.len());
        Self::store(&mut self.sets, set, self.duplicate_policy, "set")
    }

    pub fn add_material(&mut self, material: Material) -> FEAResult<()> {
        material.validate()?;
        Self::store(&mut self.materials, material, self.duplicate_policy, "material")
    }

    pub fn add_section(&mut self, section: Section) -> FEAResult<()> {
        section.validate()?;
        Self::store(&mut self.sections, section, self.duplicate_policy, "section")
    }

    /// Add element properties; explicit element keys must exist
    pub fn add_element_properties(&mut self, ep: ElementProperties) -> FEAResult<()> {
        ep.validate()?;
        if let Some(elements) = &ep.elements {
            self.check_keys(elements, FieldLocation::Element, &ep.name)?;
        }
        Self::store(
            &mut self.element_properties,
            ep,
            self.duplicate_policy,
            "element properties",
        )
    }

    pub fn add_displacement(&mut self, displacement: Displacement) -> FEAResult<()> {
        if !displacement.dofs.is_finite() {
            return Err(FEAError::Validation(format!(
                "displacement '{}' has a non-finite value",
                displacement.name
            )));
        }
        if let Target::Keys(keys) = &displacement.target {
            self.check_keys(keys, FieldLocation::Node, &displacement.name)?;
        }
        Self::store(
            &mut self.displacements,
            displacement,
            self.duplicate_policy,
            "displacement",
        )
    }

    pub fn add_load(&mut self, load: Load) -> FEAResult<()> {
        load.validate()?;
        if let Target::Keys(keys) = &load.target {
            let location = if load.targets_nodes() {
                FieldLocation::Node
            } else {
                FieldLocation::Element
            };
            self.check_keys(keys, location, &load.name)?;
        }
        Self::store(&mut self.loads, load, self.duplicate_policy, "load")
    }

    /// Add a step and append it to `steps_order`
    pub fn add_step(&mut self, step: Step) -> FEAResult<()> {
        step.validate()?;
        let name = step.name.clone();
        Self::store(&mut self.steps, step, self.duplicate_policy, "step")?;
        if !self.steps_order.contains(&name) {
            self.steps_order.push(name);
        }
        Ok(())
    }

    /// Replace the execution order; names are checked before writing
    pub fn set_steps_order(&mut self, order: &[&str]) {
        self.steps_order = order.iter().map(|s| s.to_string()).collect();
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> FEAResult<()> {
        Self::store(&mut self.constraints, constraint, self.duplicate_policy, "constraint")
    }

    pub fn add_interaction(&mut self, interaction: Interaction) -> FEAResult<()> {
        Self::store(
            &mut self.interactions,
            interaction,
            self.duplicate_policy,
            "interaction",
        )
    }

    pub fn add_misc(&mut self, misc: Misc) -> FEAResult<()> {
        misc.validate()?;
        Self::store(&mut self.misc, misc, self.duplicate_policy, "misc")
    }

    /// Remove a named entity; returns whether it existed
    pub fn remove(&mut self, kind: EntityKind, name: &str) -> bool {
        let removed = match kind {
            EntityKind::Set => self.sets.remove(name).is_some(),
            EntityKind::Material => self.materials.remove(name).is_some(),
            EntityKind::Section => self.sections.remove(name).is_some(),
            EntityKind::ElementProperties => self.element_properties.remove(name).is_some(),
            EntityKind::Displacement => self.displacements.remove(name).is_some(),
            EntityKind::Load => self.loads.remove(name).is_some(),
            EntityKind::Step => {
                self.steps_order.retain(|s| s != name);
                self.steps.remove(name).is_some()
            }
            EntityKind::Constraint => self.constraints.remove(name).is_some(),
            EntityKind::Interaction => self.interactions.remove(name).is_some(),
            EntityKind::Misc => self.misc.remove(name).is_some(),
        };
        if removed && kind == EntityKind::Set {
            for (i, set) in self.sets.iter_mut().enumerate() {
                set.index = i;
            }
        }
        removed
    }

    fn check_keys(&self, keys: &[usize], location: FieldLocation, owner: &str) -> FEAResult<()> {
        let (limit, what) = match location {
            FieldLocation::Node => (self.nodes.len(), "node"),
            FieldLocation::Element => (self.elements.len(), "element"),
        };
        match keys.iter().find(|&&k| k >= limit) {
            Some(bad) => Err(FEAError::InvariantViolation(format!(
                "'{owner}' references missing {what} {bad}"
            ))),
            None => Ok(()),
        }
    }

    pub fn sets(&self) -> &NamedStore<Set> {
        &self.sets
    }

    pub fn materials(&self) -> &NamedStore<Material> {
        &self.materials
    }

    pub fn sections(&self) -> &NamedStore<Section> {
        &self.sections
    }

    pub fn element_properties(&self) -> &NamedStore<ElementProperties> {
        &self.element_properties
    }

    pub fn displacements(&self) -> &NamedStore<Displacement> {
        &self.displacements
    }

    pub fn loads(&self) -> &NamedStore<Load> {
        &self.loads
    }

    pub fn steps(&self) -> &NamedStore<Step> {
        &self.steps
    }

    pub fn constraints(&self) -> &NamedStore<Constraint> {
        &self.constraints
    }

    pub fn interactions(&self) -> &NamedStore<Interaction> {
        &self.interactions
    }

    pub fn misc(&self) -> &NamedStore<Misc> {
        &self.misc
    }

    // ========================
    // Derived queries
    // ========================

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// [min, max] along x, y and z; `None` without nodes
    pub fn node_bounds(&self) -> Option<[[f64; 2]; 3]> {
        let first = self.nodes.first()?.xyz();
        let mut bounds = first.map(|c| [c, c]);
        for node in &self.nodes[1..] {
            for (b, c) in bounds.iter_mut().zip(node.xyz()) {
                b[0] = b[0].min(c);
                b[1] = b[1].max(c);
            }
        }
        Some(bounds)
    }

    /// Coordinates ordered by key
    pub fn nodes_xyz(&self) -> Vec<[f64; 3]> {
        self.nodes.iter().map(Node::xyz).collect()
    }

    /// Mean of the element's node positions
    pub fn element_centroid(&self, key: usize) -> FEAResult<[f64; 3]> {
        let element = self
            .elements
            .get(key)
            .ok_or_else(|| FEAError::Validation(format!("no element {key}")))?;
        let sum = element
            .nodes
            .iter()
            .filter_map(|&n| self.nodes.get(n))
            .fold(Vector3::zeros(), |acc, node| acc + node.position());
        let c = sum / element.nodes.len() as f64;
        Ok([c.x, c.y, c.z])
    }

    /// For each node key, the elements using it
    pub fn elements_by_node(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for element in &self.elements {
            for &n in &element.nodes {
                if let Some(list) = adjacency.get_mut(n) {
                    if !list.contains(&element.key) {
                        list.push(element.key);
                    }
                }
            }
        }
        adjacency
    }

    /// Elements bound to `material` through element properties, sorted
    pub fn elements_of_material(&self, material: &str) -> FEAResult<Vec<usize>> {
        let mut keys = Vec::new();
        for ep in &self.element_properties {
            if ep.material.as_deref() == Some(material) {
                keys.extend(self.property_elements(ep)?);
            }
        }
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    /// Element keys targeted by element properties
    pub fn property_elements(&self, ep: &ElementProperties) -> FEAResult<Vec<usize>> {
        match (&ep.elset, &ep.elements) {
            (_, Some(keys)) => Ok(keys.clone()),
            (Some(elset), None) => self.resolve_set(elset),
            (None, None) => ep.validate().map(|_| Vec::new()),
        }
    }

    /// Member keys of a named set, including the implicit `nset_all` / `elset_all`
    pub fn resolve_set(&self, name: &str) -> FEAResult<Vec<usize>> {
        match name {
            NSET_ALL => Ok((0..self.nodes.len()).collect()),
            ELSET_ALL => Ok((0..self.elements.len()).collect()),
            _ => self.sets.get(name).map(Set::keys).ok_or_else(|| {
                FEAError::MissingReference(vec![MissingRef::new("set", name, "lookup")])
            }),
        }
    }

    /// Keys of a set or explicit target
    pub fn resolve_target(&self, target: &Target) -> FEAResult<Vec<usize>> {
        match target {
            Target::Set(name) => self.resolve_set(name),
            Target::Keys(keys) => Ok(keys.clone()),
        }
    }

    /// Orientation vector of a beam: its local `ez` if given, else global X
    /// for near-vertical beams and global Z otherwise
    pub fn beam_orientation(&self, key: usize) -> FEAResult<[f64; 3]> {
        let element = self
            .elements
            .get(key)
            .ok_or_else(|| FEAError::Validation(format!("no element {key}")))?;
        if let Some(axes) = &element.axes {
            return Ok(axes.ez);
        }
        let (Some(a), Some(b)) = (
            element.nodes.first().and_then(|&n| self.nodes.get(n)),
            element.nodes.get(1).and_then(|&n| self.nodes.get(n)),
        ) else {
            return Ok([0.0, 0.0, 1.0]);
        };

        let d = b.position() - a.position();
        let len = d.norm();
        if len < 1e-10 {
            return Err(FEAError::Validation(format!("beam {key} has zero length")));
        }
        let d = d / len;
        if d.z.abs() > d.x.abs() && d.z.abs() > d.y.abs() {
            Ok([1.0, 0.0, 0.0])
        } else {
            Ok([0.0, 0.0, 1.0])
        }
    }

    // ========================
    // Results
    // ========================

    /// One nodal component of a step, restricted to a set or key list
    pub fn get_nodal_results(
        &self,
        step: &str,
        component: &str,
        nodes: impl Into<Target>,
    ) -> FEAResult<Vec<(usize, f64)>> {
        self.project_results(step, FieldLocation::Node, component, &nodes.into())
    }

    /// One element component of a step, restricted to a set or key list
    pub fn get_element_results(
        &self,
        step: &str,
        component: &str,
        elements: impl Into<Target>,
    ) -> FEAResult<Vec<(usize, f64)>> {
        self.project_results(step, FieldLocation::Element, component, &elements.into())
    }

    fn project_results(
        &self,
        step: &str,
        location: FieldLocation,
        component: &str,
        target: &Target,
    ) -> FEAResult<Vec<(usize, f64)>> {
        let table = self.results.component(step, location, component)?;
        let keys = self.resolve_target(target)?;
        Ok(keys
            .into_iter()
            .filter_map(|k| table.get(&k).map(|v| (k, *v)))
            .collect())
    }

    // ========================
    // Snapshot support
    // ========================

    /// Rebuild the geometric-key indexes after deserializing a structure
    /// by other means than [`Structure::load_snapshot`]
    pub fn rebuild_indexes(&mut self) -> FEAResult<()> {
        self.node_index.clear();
        self.element_index.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.key != i {
                return Err(FEAError::InvariantViolation(format!(
                    "node at position {i} has key {}",
                    node.key
                )));
            }
            let gkey = geometry::geometric_key(node.xyz(), self.tol)?;
            self.node_index.insert(gkey, i);
        }
        for (i, element) in self.elements.iter().enumerate() {
            if element.key != i {
                return Err(FEAError::InvariantViolation(format!(
                    "element at position {i} has key {}",
                    element.key
                )));
            }
            if let Some(bad) = element.nodes.iter().find(|&&n| n >= self.nodes.len()) {
                return Err(FEAError::InvariantViolation(format!(
                    "element {i} references missing node {bad}"
                )));
            }
            self.element_index
                .insert(geometry::element_key(element.element_type, &element.nodes), i);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::StepResults;
    use approx::assert_relative_eq;

    fn frame() -> Structure {
        let mut s = Structure::new("frame", "/tmp");
        let keys = s
            .add_nodes(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 2.0]])
            .unwrap();
        s.add_element(ElementType::Beam, vec![keys[0], keys[1]]).unwrap();
        s.add_element(ElementType::Beam, vec![keys[1], keys[2]]).unwrap();
        s
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut s = Structure::default();
        let a = s.add_node([1.0, 2.0, 3.0]).unwrap();
        let b = s.add_node([1.0004, 2.0, 3.0]).unwrap();
        assert_eq!(a, b);
        assert_eq!(s.node_count(), 1);
        assert_eq!(s.check_node_exists([1.0, 2.0, 3.0]), Some(a));
        assert_eq!(s.check_node_exists([9.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_add_node_rejects_non_finite() {
        let mut s = Structure::default();
        assert!(matches!(
            s.add_node([f64::NAN, 0.0, 0.0]),
            Err(FEAError::Validation(_))
        ));
    }

    #[test]
    fn test_add_element_checks() {
        let mut s = frame();
        assert!(matches!(
            s.add_element(ElementType::Beam, vec![0, 7]),
            Err(FEAError::InvariantViolation(_))
        ));
        assert!(matches!(
            s.add_element(ElementType::Shell, vec![0, 1]),
            Err(FEAError::Validation(_))
        ));
        // reversed topology collapses onto the existing element
        assert_eq!(s.add_element(ElementType::Beam, vec![1, 0]).unwrap(), 0);
        assert_eq!(s.add_element(ElementType::Truss, vec![1, 0]).unwrap(), 2);
    }

    #[test]
    fn test_duplicate_names() {
        let mut s = frame();
        s.add_section(Section::truss("a", 1e-4)).unwrap();
        assert!(matches!(
            s.add_section(Section::truss("a", 2e-4)),
            Err(FEAError::DuplicateName(_))
        ));

        let mut s = frame().with_duplicate_policy(DuplicatePolicy::Replace);
        s.add_section(Section::truss("a", 1e-4)).unwrap();
        s.add_section(Section::truss("a", 2e-4)).unwrap();
        assert_eq!(s.sections().get("a").and_then(|x| x.get("A")), Some(2e-4));
    }

    #[test]
    fn test_batch_add_routes_by_kind() {
        let mut s = frame();
        s.add(vec![
            Entity::Node([5.0, 5.0, 5.0]),
            Material::elastic_isotropic("steel", 200e9, 0.3, 7850.0).into(),
            Section::rectangular("rect", 0.1, 0.2).into(),
            Set::elements("beams", vec![0, 1]).into(),
            ElementProperties::new("ep", "steel", "rect", "beams").into(),
            Displacement::fixed("fix", vec![0]).into(),
            Step::general("bc", &["fix"], &[]).into(),
        ])
        .unwrap();
        assert_eq!(s.node_count(), 4);
        assert_eq!(s.materials().len(), 1);
        assert_eq!(s.element_properties().len(), 1);
        assert_eq!(s.steps_order, vec!["bc".to_string()]);
    }

    #[test]
    fn test_set_members_must_exist() {
        let mut s = frame();
        assert!(matches!(
            s.add_set(Set::nodes("far", vec![10])),
            Err(FEAError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut s = frame();
        s.add_set(Set::nodes("a", vec![0])).unwrap();
        s.add_set(Set::nodes("b", vec![1])).unwrap();
        s.add_step(Step::general("bc", &[], &[])).unwrap();
        assert!(s.remove(EntityKind::Set, "a"));
        assert!(!s.remove(EntityKind::Set, "a"));
        assert_eq!(s.sets().get("b").map(|x| x.index), Some(0));
        assert!(s.remove(EntityKind::Step, "bc"));
        assert!(s.steps_order.is_empty());
    }

    #[test]
    fn test_derived_queries() {
        let s = frame();
        assert_eq!(
            s.node_bounds(),
            Some([[0.0, 1.0], [0.0, 0.0], [0.0, 2.0]])
        );
        let c = s.element_centroid(1).unwrap();
        assert_relative_eq!(c[2], 1.0);
        assert_eq!(s.elements_by_node(), vec![vec![0], vec![0, 1], vec![1]]);
        assert_eq!(s.resolve_set(NSET_ALL).unwrap(), vec![0, 1, 2]);
        assert_eq!(s.resolve_set(ELSET_ALL).unwrap(), vec![0, 1]);
        assert_eq!(s.resolve_set("nope").unwrap_err().missing_names(), vec!["nope"]);
    }

    #[test]
    fn test_elements_of_material() {
        let mut s = frame();
        s.add_set(Set::elements("second", vec![1])).unwrap();
        s.add(vec![
            Material::elastic_isotropic("steel", 200e9, 0.3, 7850.0).into(),
            Material::elastic_isotropic("alu", 70e9, 0.33, 2700.0).into(),
            Section::circular("rod", 0.01).into(),
            ElementProperties::on_elements("ep1", "steel", "rod", vec![0]).into(),
            ElementProperties::new("ep2", "alu", "rod", "second").into(),
        ])
        .unwrap();
        assert_eq!(s.elements_of_material("steel").unwrap(), vec![0]);
        assert_eq!(s.elements_of_material("alu").unwrap(), vec![1]);
    }

    #[test]
    fn test_beam_orientation() {
        let s = frame();
        assert_eq!(s.beam_orientation(0).unwrap(), [0.0, 0.0, 1.0]);
        assert_eq!(s.beam_orientation(1).unwrap(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_nodal_results_by_set() {
        let mut s = frame();
        s.add_set(Set::nodes("tip", vec![2])).unwrap();
        let mut step = StepResults::default();
        for k in 0..3 {
            step.insert_nodal("uz", k, -(k as f64));
        }
        s.results.insert("load", step);
        assert_eq!(s.get_nodal_results("load", "uz", "tip").unwrap(), vec![(2, -2.0)]);
        assert_eq!(
            s.get_nodal_results("load", "uz", vec![0, 1]).unwrap(),
            vec![(0, 0.0), (1, -1.0)]
        );
        assert!(s.get_element_results("load", "smises", ELSET_ALL).is_err());
    }
}
