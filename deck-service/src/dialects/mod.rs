//! Deck dialects and the framework that drives them
//!
//! The framework walks a resolved structure in a fixed section order and
//! calls the emitter hooks of one [`Dialect`]. Adapters never look names up
//! themselves; everything arrives through the [`Resolved`] view.

pub mod abaqus;
pub mod ansys;
pub mod opensees;
pub mod sofistik;

pub use abaqus::Abaqus;
pub use ansys::Ansys;
pub use opensees::OpenSees;
pub use sofistik::Sofistik;

use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::str::FromStr;

use fea_model::elements::{Element, ElementType, LocalFrame, Material, Node, Section};
use fea_model::error::{FEAError, FEAResult};
use fea_model::loads::{Axes, StepKind};
use fea_model::misc::{Constraint, Interaction, Misc};
use fea_model::model::Structure;
use fea_model::results::validate_fields;
use fea_model::validate::{
    resolve, ElementBlock, Resolved, ResolvedDisplacement, ResolvedLoad, ResolvedProperty,
    ResolvedSet, ResolvedStep,
};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::writer::Writer;

/// Collapsed 8-node solid for a tetrahedron
pub const TET_AS_BRICK: [usize; 8] = [0, 1, 2, 2, 3, 3, 3, 3];
/// Collapsed 8-node solid for a pentahedron
pub const PENT_AS_BRICK: [usize; 8] = [0, 1, 2, 2, 3, 4, 5, 5];
/// Collapsed quadrilateral for a triangle
pub const TRI_AS_QUAD: [usize; 4] = [0, 1, 2, 2];

/// The supported solver dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Abaqus,
    Ansys,
    OpenSees,
    Sofistik,
}

impl DialectKind {
    pub const ALL: [DialectKind; 4] = [
        DialectKind::Abaqus,
        DialectKind::Ansys,
        DialectKind::OpenSees,
        DialectKind::Sofistik,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DialectKind::Abaqus => "abaqus",
            DialectKind::Ansys => "ansys",
            DialectKind::OpenSees => "opensees",
            DialectKind::Sofistik => "sofistik",
        }
    }

    /// Extension of the deck file
    pub fn extension(&self) -> &'static str {
        match self {
            DialectKind::Abaqus => "inp",
            DialectKind::Ansys => "txt",
            DialectKind::OpenSees => "tcl",
            DialectKind::Sofistik => "dat",
        }
    }

    pub fn comment(&self) -> &'static str {
        match self {
            DialectKind::Abaqus => "**",
            DialectKind::Ansys => "!",
            DialectKind::OpenSees => "#",
            DialectKind::Sofistik => "$",
        }
    }

    /// Conventional solver command when no executable is configured
    pub fn default_executable(&self) -> &'static str {
        match self {
            DialectKind::Abaqus => "ccx",
            DialectKind::Ansys => "ansys",
            DialectKind::OpenSees => "OpenSees",
            DialectKind::Sofistik => "sps",
        }
    }

    /// Build the adapter for this dialect
    pub fn adapter(&self, structure: &Structure, options: &DeckOptions) -> FEAResult<Box<dyn Dialect>> {
        if *self != DialectKind::OpenSees && options.ndof.is_some_and(|n| n != 6) {
            return Err(FEAError::Validation(format!(
                "{self} decks always carry 6 DOFs per node"
            )));
        }
        Ok(match self {
            DialectKind::Abaqus => Box::new(Abaqus),
            DialectKind::Ansys => Box::new(Ansys),
            DialectKind::OpenSees => {
                Box::new(OpenSees::new(options.ndof.unwrap_or(structure.ndof))?)
            }
            DialectKind::Sofistik => Box::new(Sofistik),
        })
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = FEAError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abaqus" | "calculix" | "a" => Ok(DialectKind::Abaqus),
            "ansys" | "b" => Ok(DialectKind::Ansys),
            "opensees" | "c" => Ok(DialectKind::OpenSees),
            "sofistik" | "d" => Ok(DialectKind::Sofistik),
            other => Err(FEAError::Validation(format!(
                "unknown dialect '{other}', expected one of abaqus, ansys, opensees, sofistik"
            ))),
        }
    }
}

/// Sections of a deck, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckSection {
    Heading,
    Nodes,
    Elements,
    Sets,
    Materials,
    Sections,
    Displacements,
    Interactions,
    Misc,
    Steps,
}

impl DeckSection {
    pub const ALL: [DeckSection; 10] = [
        DeckSection::Heading,
        DeckSection::Nodes,
        DeckSection::Elements,
        DeckSection::Sets,
        DeckSection::Materials,
        DeckSection::Sections,
        DeckSection::Displacements,
        DeckSection::Interactions,
        DeckSection::Misc,
        DeckSection::Steps,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DeckSection::Heading => "Heading",
            DeckSection::Nodes => "Nodes",
            DeckSection::Elements => "Elements",
            DeckSection::Sets => "Sets",
            DeckSection::Materials => "Materials",
            DeckSection::Sections => "Sections",
            DeckSection::Displacements => "Displacements",
            DeckSection::Interactions => "Interactions",
            DeckSection::Misc => "Misc",
            DeckSection::Steps => "Steps",
        }
    }
}

pub fn default_fields() -> Vec<String> {
    vec!["u".to_string(), "rf".to_string()]
}

/// Options for one deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckOptions {
    /// Canonical output fields to request
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    /// DOFs per node, OpenSees only (3 or 6)
    #[serde(default)]
    pub ndof: Option<usize>,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            ndof: None,
        }
    }
}

impl DeckOptions {
    pub fn with_fields(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ndof: None,
        }
    }
}

/// Emitter hooks of one solver dialect
pub trait Dialect {
    fn kind(&self) -> DialectKind;

    fn comment(&self) -> &'static str {
        self.kind().comment()
    }

    fn separator(&self) -> &'static str {
        " "
    }

    /// DOFs per node in the deck
    fn ndof(&self) -> usize {
        6
    }

    /// Whether boundary conditions are applied step by step, remembering
    /// what earlier steps already pinned
    fn pins_per_step(&self) -> bool;

    /// Node order of an element topology; `None` keeps the stored order
    fn permutation(&self, _element_type: ElementType, _node_count: usize) -> Option<&'static [usize]> {
        None
    }

    /// Lines before the first section
    fn header(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()>;

    fn section_open(&self, _w: &mut Writer, _r: &Resolved<'_>, _section: DeckSection) -> FEAResult<()> {
        Ok(())
    }

    fn section_close(&self, _w: &mut Writer, _r: &Resolved<'_>, _section: DeckSection) -> FEAResult<()> {
        Ok(())
    }

    fn heading(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()>;

    fn node(&self, w: &mut Writer, node: &Node) -> FEAResult<()>;

    /// Card opening a block of elements sharing variant and node count
    fn element_block(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        index: usize,
        block: &ElementBlock,
    ) -> FEAResult<()>;

    /// `topology` is already permuted
    fn element(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        index: usize,
        element: &Element,
        topology: &[usize],
    ) -> FEAResult<()>;

    fn set(&self, w: &mut Writer, r: &Resolved<'_>, set: &ResolvedSet<'_>) -> FEAResult<()>;

    fn material(&self, w: &mut Writer, tag: usize, material: &Material) -> FEAResult<()>;

    /// Stand-alone section card, for dialects that number sections
    fn section(&self, _w: &mut Writer, _r: &Resolved<'_>, _tag: usize, _section: &Section) -> FEAResult<()> {
        Ok(())
    }

    /// Binding of a material and a section to an element set
    fn property(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        index: usize,
        property: &ResolvedProperty<'_>,
    ) -> FEAResult<()>;

    fn displacement(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        displacement: &ResolvedDisplacement<'_>,
    ) -> FEAResult<()>;

    fn constraint(&self, _w: &mut Writer, _r: &Resolved<'_>, constraint: &Constraint) -> FEAResult<()> {
        Err(unsupported(self.kind(), format!("constraint '{}'", constraint.name())))
    }

    fn interaction(
        &self,
        _w: &mut Writer,
        _r: &Resolved<'_>,
        interaction: &Interaction,
    ) -> FEAResult<()> {
        Err(unsupported(self.kind(), format!("interaction '{}'", interaction.name())))
    }

    fn misc(&self, w: &mut Writer, r: &Resolved<'_>, misc: &Misc) -> FEAResult<()>;

    /// Model-level cards derived from the steps, written after misc
    fn model_setup(&self, _w: &mut Writer, _r: &Resolved<'_>) -> FEAResult<()> {
        Ok(())
    }

    fn step_open(&self, w: &mut Writer, r: &Resolved<'_>, index: usize, step: &ResolvedStep<'_>) -> FEAResult<()>;

    fn load(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        step: &ResolvedStep<'_>,
        load: &ResolvedLoad<'_>,
    ) -> FEAResult<()>;

    /// Boundary conditions and loads of a step
    fn step_activate(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        _index: usize,
        step: &ResolvedStep<'_>,
        displacements: &[&ResolvedDisplacement<'_>],
        loads: &[&ResolvedLoad<'_>],
    ) -> FEAResult<()> {
        for d in displacements {
            self.displacement(w, r, d)?;
        }
        for l in loads {
            self.load(w, r, step, l)?;
        }
        Ok(())
    }

    fn step_output(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        index: usize,
        step: &ResolvedStep<'_>,
        fields: &[String],
    ) -> FEAResult<()>;

    fn step_close(&self, w: &mut Writer, r: &Resolved<'_>, index: usize, step: &ResolvedStep<'_>) -> FEAResult<()>;

    /// Lines after the last section
    fn footer(&self, _w: &mut Writer, _r: &Resolved<'_>) -> FEAResult<()> {
        Ok(())
    }
}

// ========================
// Framework
// ========================

/// Render a resolved structure through `dialect`
pub fn render(dialect: &dyn Dialect, r: &Resolved<'_>, fields: &[String]) -> FEAResult<String> {
    let mut w = Writer::new(dialect.comment(), dialect.separator(), 1);
    dialect.header(&mut w, r)?;

    for section in DeckSection::ALL {
        w.write_section(section.title());
        dialect.section_open(&mut w, r, section)?;
        match section {
            DeckSection::Heading => dialect.heading(&mut w, r)?,
            DeckSection::Nodes => {
                for node in r.structure.nodes() {
                    dialect.node(&mut w, node)?;
                }
            }
            DeckSection::Elements => {
                for (index, block) in r.blocks.iter().enumerate() {
                    dialect.element_block(&mut w, r, index, block)?;
                    let table = dialect.permutation(block.element_type, block.node_count);
                    for &key in &block.elements {
                        let Some(element) = r.structure.element(key) else {
                            continue;
                        };
                        let topology = permute(table, &element.nodes);
                        dialect.element(&mut w, r, index, element, &topology)?;
                    }
                }
            }
            DeckSection::Sets => {
                for set in &r.sets {
                    dialect.set(&mut w, r, set)?;
                }
            }
            DeckSection::Materials => {
                for (i, material) in r.materials.iter().enumerate() {
                    dialect.material(&mut w, i + 1, material)?;
                }
            }
            DeckSection::Sections => {
                for (i, section) in r.sections.iter().enumerate() {
                    dialect.section(&mut w, r, i + 1, section)?;
                }
                for (i, property) in r.properties.iter().enumerate() {
                    dialect.property(&mut w, r, i, property)?;
                }
            }
            DeckSection::Displacements => {
                if !dialect.pins_per_step() {
                    for i in r.activated_displacements() {
                        dialect.displacement(&mut w, r, &r.displacements[i])?;
                    }
                }
            }
            DeckSection::Interactions => {
                for constraint in &r.constraints {
                    dialect.constraint(&mut w, r, constraint)?;
                }
                for interaction in &r.interactions {
                    dialect.interaction(&mut w, r, interaction)?;
                }
            }
            DeckSection::Misc => {
                for misc in &r.misc {
                    dialect.misc(&mut w, r, misc)?;
                }
                dialect.model_setup(&mut w, r)?;
            }
            DeckSection::Steps => write_steps(dialect, &mut w, r, fields)?,
        }
        dialect.section_close(&mut w, r, section)?;
        w.blank_line();
    }

    dialect.footer(&mut w, r)?;
    Ok(w.into_string())
}

fn write_steps(dialect: &dyn Dialect, w: &mut Writer, r: &Resolved<'_>, fields: &[String]) -> FEAResult<()> {
    for (index, step) in r.steps.iter().enumerate() {
        w.write_subsection(&step.step.name);
        dialect.step_open(w, r, index, step)?;

        let displacements: Vec<&ResolvedDisplacement<'_>> = if dialect.pins_per_step() {
            step.new_displacements.iter().map(|&i| &r.displacements[i]).collect()
        } else {
            Vec::new()
        };
        let loads: Vec<&ResolvedLoad<'_>> = match step.step.kind {
            StepKind::Modal { .. } => Vec::new(),
            _ => step.loads.iter().map(|&i| &r.loads[i]).collect(),
        };

        dialect.step_activate(w, r, index, step, &displacements, &loads)?;
        dialect.step_output(w, r, index, step, fields)?;
        dialect.step_close(w, r, index, step)?;
    }
    Ok(())
}

/// Resolve, check and render a deck without touching the filesystem
pub fn render_deck(structure: &Structure, kind: DialectKind, options: &DeckOptions) -> FEAResult<String> {
    validate_fields(&options.fields)?;
    let resolved = resolve(structure)?;
    let dialect = kind.adapter(structure, options)?;
    let deck = render(dialect.as_ref(), &resolved, &options.fields)?;
    tracing::debug!(
        "rendered {} deck for '{}': {} lines",
        kind,
        structure.name,
        deck.lines().count()
    );
    Ok(deck)
}

/// Where [`write_input_deck`] puts the deck of `structure`
pub fn deck_path(structure: &Structure, kind: DialectKind) -> PathBuf {
    structure
        .path
        .join(format!("{}.{}", structure.name, kind.extension()))
}

/// Write `{path}/{name}.{ext}`.
///
/// The deck is rendered in memory and moved into place in one step, so a
/// failure never leaves a partial deck behind; a stale deck from an earlier
/// run is removed.
pub fn write_input_deck(structure: &Structure, kind: DialectKind, options: &DeckOptions) -> FEAResult<PathBuf> {
    let path = deck_path(structure, kind);
    let deck = match render_deck(structure, kind, options) {
        Ok(deck) => deck,
        Err(e) => {
            if path.exists() {
                tracing::warn!("removing stale deck {:?}", path);
                let _ = fs::remove_file(&path);
            }
            return Err(e);
        }
    };

    let write_failed = |source| FEAError::WriteFailed {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(&structure.path).map_err(write_failed)?;
    let mut file = NamedTempFile::new_in(&structure.path).map_err(write_failed)?;
    file.write_all(deck.as_bytes()).map_err(write_failed)?;
    file.as_file().sync_all().map_err(write_failed)?;
    file.persist(&path).map_err(|e| write_failed(e.error))?;

    tracing::info!("wrote {} deck {:?} ({} bytes)", kind, path, deck.len());
    Ok(path)
}

// ========================
// Helpers shared by the adapters
// ========================

pub(crate) fn unsupported(kind: DialectKind, what: impl fmt::Display) -> FEAError {
    FEAError::UnsupportedFeature(format!("{what} in {kind} decks"))
}

/// Apply a permutation table to a stored topology
pub fn permute(table: Option<&[usize]>, nodes: &[usize]) -> Vec<usize> {
    match table {
        Some(table) => table.iter().filter_map(|&i| nodes.get(i).copied()).collect(),
        None => nodes.to_vec(),
    }
}

/// Index of the element properties an element must carry in dialects that
/// key elements by section
pub(crate) fn property_index(r: &Resolved<'_>, element: usize) -> FEAResult<usize> {
    r.element_property
        .get(element)
        .copied()
        .flatten()
        .ok_or_else(|| FEAError::Validation(format!("element {element} has no element properties")))
}

/// Load magnitude factor of `load` in `step`
pub(crate) fn load_factor(step: &ResolvedStep<'_>, load: &ResolvedLoad<'_>) -> f64 {
    step.step.factor_for(&load.load.name)
}

/// Reject node data a dialect has no card for
pub(crate) fn check_node(kind: DialectKind, node: &Node, masses: bool) -> FEAResult<()> {
    if node.frame.is_some_and(|f| f != LocalFrame::global()) {
        return Err(unsupported(kind, format!("local frame on node {}", node.key)));
    }
    if !masses && node.mass.is_some() {
        return Err(unsupported(kind, format!("lumped mass on node {}", node.key)));
    }
    Ok(())
}

/// Displacements in local axes are not written by any dialect
pub(crate) fn check_global(kind: DialectKind, axes: Axes, what: &str) -> FEAResult<()> {
    match axes {
        Axes::Global => Ok(()),
        Axes::Local => Err(unsupported(kind, format!("local axes on {what}"))),
    }
}

/// Per-element thickness or area overrides cannot be carried by dialects
/// that bind sections to whole element sets
pub(crate) fn warn_overrides(kind: DialectKind, r: &Resolved<'_>, property: &ResolvedProperty<'_>) {
    let overridden = property.elements.iter().any(|&e| {
        r.structure
            .element(e)
            .is_some_and(|el| el.thickness.is_some() || el.area.is_some())
    });
    if overridden {
        tracing::warn!(
            "{} decks ignore per-element thickness and area in '{}'",
            kind,
            property.properties.name
        );
    }
}

/// Nodes of a resolved set, for cards that list nodes explicitly
pub(crate) fn node_keys<'r>(r: &'r Resolved<'_>, set: &str) -> &'r [usize] {
    r.set(set).map_or(&[][..], |s| s.keys.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("Abaqus".parse::<DialectKind>().unwrap(), DialectKind::Abaqus);
        assert_eq!("c".parse::<DialectKind>().unwrap(), DialectKind::OpenSees);
        assert_eq!(" sofistik ".parse::<DialectKind>().unwrap(), DialectKind::Sofistik);
        assert!(matches!(
            "nastran".parse::<DialectKind>(),
            Err(FEAError::Validation(_))
        ));
    }

    #[test]
    fn test_extensions() {
        let exts: Vec<&str> = DialectKind::ALL.iter().map(|d| d.extension()).collect();
        assert_eq!(exts, vec!["inp", "txt", "tcl", "dat"]);
    }

    #[test]
    fn test_permute() {
        let nodes = [10, 11, 12, 13];
        assert_eq!(permute(Some(&TET_AS_BRICK), &nodes), vec![10, 11, 12, 12, 13, 13, 13, 13]);
        assert_eq!(permute(None, &nodes), nodes.to_vec());
    }

    #[test]
    fn test_ndof_override_is_opensees_only() {
        let s = Structure::default();
        let options = DeckOptions {
            ndof: Some(3),
            ..Default::default()
        };
        assert!(DialectKind::Abaqus.adapter(&s, &options).is_err());
        assert_eq!(DialectKind::OpenSees.adapter(&s, &options).unwrap().ndof(), 3);
    }
}
