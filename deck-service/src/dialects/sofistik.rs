//! SOFiSTiK CADINP input (`.dat`)
//!
//! The deck is a chain of program blocks: SOFIMSHA for the mesh, AQUA for
//! materials and sections, SOFIMSHA again for supports, then one ASE block
//! per step. SOFiSTiK works in kN, m and MPa; the model is in N, m and Pa.

use fea_model::elements::{Element, ElementType, Material, MaterialModel, Node, Section, SectionType};
use fea_model::error::FEAResult;
use fea_model::loads::{Axes, LoadKind, StepKind};
use fea_model::misc::Misc;
use fea_model::validate::{
    ElementBlock, Resolved, ResolvedDisplacement, ResolvedLoad, ResolvedProperty, ResolvedSet,
    ResolvedStep,
};

use super::{
    check_global, check_node, load_factor, property_index, unsupported, warn_overrides,
    DeckSection, Dialect, DialectKind, PENT_AS_BRICK, TET_AS_BRICK, TRI_AS_QUAD,
};
use crate::writer::{num, Writer};

/// N to kN
const KILO: f64 = 1e-3;
/// Pa to MPa
const MEGA: f64 = 1e-6;
/// m to mm, for section dimensions
const MILLI: f64 = 1e3;
const GRAVITY: f64 = 9.81;

const NODE_LOADS: [&str; 6] = ["PXX", "PYY", "PZZ", "MXX", "MYY", "MZZ"];
const SUPPORTS: [&str; 6] = ["PX", "PY", "PZ", "MX", "MY", "MZ"];

/// Support code of a set of held DOFs
pub fn fixity(held: [bool; 6]) -> String {
    if held.iter().all(|&h| h) {
        return "F".to_string();
    }
    let mut code = String::new();
    let (translations, rotations) = held.split_at(3);
    if translations.iter().all(|&h| h) {
        code.push_str("PP");
    } else {
        for (label, _) in SUPPORTS[..3].iter().zip(translations).filter(|&(_, &h)| h) {
            code.push_str(label);
        }
    }
    for (label, _) in SUPPORTS[3..].iter().zip(rotations).filter(|&(_, &h)| h) {
        code.push_str(label);
    }
    code
}

/// CADINP input for SOFIMSHA, AQUA and ASE
pub struct Sofistik;

impl Sofistik {
    /// ASE `ECHO` option printing a canonical field; the rest only reaches
    /// the database
    pub fn echo_option(field: &str) -> Option<&'static str> {
        match field {
            "u" | "ur" => Some("DISP"),
            "rf" | "rm" => Some("REAC"),
            "s" | "e" | "pe" | "sf" | "sm" | "spf" | "rbfor" => Some("FORC"),
            _ => None,
        }
    }

    /// Record keyword of an element variant
    pub fn record(element_type: ElementType) -> Option<&'static str> {
        match element_type {
            ElementType::Beam => Some("BEAM"),
            ElementType::Truss | ElementType::Strut | ElementType::Tie => Some("TRUS"),
            ElementType::Spring => Some("SPRI"),
            ElementType::Shell => Some("QUAD"),
            ElementType::Tetrahedron | ElementType::Pentahedron | ElementType::Hexahedron => {
                Some("BRIC")
            }
            ElementType::Membrane | ElementType::Face | ElementType::Mass => None,
        }
    }

    /// Property using a section, which supplies its material number
    fn first_user<'r, 'a>(r: &'r Resolved<'a>, tag: usize) -> Option<&'r ResolvedProperty<'a>> {
        r.properties.iter().find(|p| p.section_tag == tag)
    }
}

impl Dialect for Sofistik {
    fn kind(&self) -> DialectKind {
        DialectKind::Sofistik
    }

    fn pins_per_step(&self) -> bool {
        false
    }

    fn permutation(&self, element_type: ElementType, node_count: usize) -> Option<&'static [usize]> {
        match (element_type, node_count) {
            (ElementType::Shell, 3) => Some(&TRI_AS_QUAD),
            (ElementType::Tetrahedron, 4) => Some(&TET_AS_BRICK),
            (ElementType::Pentahedron, 6) => Some(&PENT_AS_BRICK),
            _ => None,
        }
    }

    fn header(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        w.write_comment(format!("SOFiSTiK input for '{}'", r.structure.name));
        w.write_comment("Units: kN, m, MPa");
        w.blank_line();
        Ok(())
    }

    fn section_open(&self, w: &mut Writer, r: &Resolved<'_>, section: DeckSection) -> FEAResult<()> {
        match section {
            DeckSection::Nodes => w.write_line("NODE NO X Y Z"),
            DeckSection::Materials => {
                w.write_line("+PROG AQUA urs:2");
                w.write_line(format!("HEAD {} materials and sections", r.structure.name));
            }
            DeckSection::Displacements => {
                w.write_line("+PROG SOFIMSHA urs:3");
                w.write_line(format!("HEAD {} supports", r.structure.name));
                w.write_line("SYST REST");
            }
            _ => {}
        }
        Ok(())
    }

    fn section_close(&self, w: &mut Writer, _r: &Resolved<'_>, section: DeckSection) -> FEAResult<()> {
        if matches!(
            section,
            DeckSection::Sets | DeckSection::Sections | DeckSection::Displacements
        ) {
            w.write_line("END");
        }
        Ok(())
    }

    fn heading(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        w.write_line("+PROG SOFIMSHA urs:1");
        w.write_line(format!("HEAD {}", r.structure.name));
        w.write_line("SYST 3D GDIR NEGZ GDIV 1000");
        Ok(())
    }

    fn node(&self, w: &mut Writer, node: &Node) -> FEAResult<()> {
        check_node(self.kind(), node, false)?;
        let id = w.id(node.key);
        w.write_fields([id.to_string(), num(node.x), num(node.y), num(node.z)]);
        Ok(())
    }

    fn element_block(
        &self,
        w: &mut Writer,
        _r: &Resolved<'_>,
        _index: usize,
        block: &ElementBlock,
    ) -> FEAResult<()> {
        let Some(record) = Self::record(block.element_type) else {
            return Err(unsupported(self.kind(), format!("{} elements", block.element_type.tag())));
        };
        let columns = match block.element_type {
            ElementType::Spring => "NO NA NE CP",
            ElementType::Shell => "NO N1 N2 N3 N4 MNO T",
            t if t.is_solid() => "NO N1 N2 N3 N4 N5 N6 N7 N8 MNO",
            _ => "NO NA NE NCS",
        };
        w.write_line(format!("{record} {columns}"));
        Ok(())
    }

    fn element(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        _index: usize,
        element: &Element,
        topology: &[usize],
    ) -> FEAResult<()> {
        let property = &r.properties[property_index(r, element.key)?];
        let mut fields = vec![w.id(element.key).to_string()];
        fields.extend(topology.iter().map(|&n| w.id(n).to_string()));
        let material = property.material_tag.unwrap_or(0).to_string();

        match element.element_type {
            ElementType::Beam | ElementType::Truss | ElementType::Strut | ElementType::Tie => {
                fields.push(property.section_tag.to_string());
            }
            ElementType::Spring => fields.push(num(property.section.require("k")? * KILO)),
            ElementType::Shell => {
                let t = match element.thickness {
                    Some(t) => t,
                    None => property.section.require("t")?,
                };
                fields.push(material);
                fields.push(num(t));
            }
            _ => fields.push(material),
        }
        w.write_fields(fields);
        Ok(())
    }

    fn set(&self, w: &mut Writer, r: &Resolved<'_>, set: &ResolvedSet<'_>) -> FEAResult<()> {
        let number = r
            .sets
            .iter()
            .position(|s| s.name == set.name)
            .map_or(0, |i| i + 1);
        // SOFIMSHA derives membership from element numbers (`GDIV`), so a
        // named set is only a titled group; supports and loads address node
        // and element numbers directly
        w.write_line(format!("GRP NO {number} TITL '{}'", set.name));
        Ok(())
    }

    fn material(&self, w: &mut Writer, tag: usize, material: &Material) -> FEAResult<()> {
        let (e, v, p) = material.elastic();
        let gam = num(p * GRAVITY * KILO);
        let line = match &material.model {
            MaterialModel::ElasticIsotropic {
                tension: true,
                compression: true,
                ..
            }
            | MaterialModel::Stiff { .. } => {
                format!("MAT NO {tag} E {} MUE {} GAM {gam}", num(e * MEGA), num(v))
            }
            MaterialModel::Steel { fy, .. } => {
                format!("STEE NO {tag} ES {} FY {} GAM {gam}", num(e * MEGA), num(*fy))
            }
            MaterialModel::Concrete { fck, .. } => {
                format!("CONC NO {tag} FCK {} EC {} GAM {gam}", num(*fck), num(e * MEGA))
            }
            _ => {
                return Err(unsupported(
                    self.kind(),
                    format!("{} material '{}'", material.material_type(), material.name),
                ))
            }
        };
        w.write_comment(&material.name);
        w.write_line(line);
        Ok(())
    }

    fn section(&self, w: &mut Writer, r: &Resolved<'_>, tag: usize, section: &Section) -> FEAResult<()> {
        let material = Self::first_user(r, tag)
            .and_then(|p| p.material_tag)
            .unwrap_or(1);
        let g = |key: &str| section.require(key);
        let line = match section.section_type {
            SectionType::Rectangular => format!(
                "SREC NO {tag} H {} B {} MNO {material}",
                num(g("h")? * MILLI),
                num(g("b")? * MILLI)
            ),
            SectionType::Circular => {
                format!("SCIT NO {tag} D {} MNO {material}", num(2.0 * g("r")? * MILLI))
            }
            SectionType::Pipe => format!(
                "SCIT NO {tag} D {} T {} MNO {material}",
                num(2.0 * g("r")? * MILLI),
                num(g("t")? * MILLI)
            ),
            t if t.is_beam() => format!(
                "SVAL NO {tag} MNO {material} A {} IT {} IY {} IZ {}",
                num(g("A")?),
                num(g("J")?),
                num(g("Ixx")?),
                num(g("Iyy")?)
            ),
            SectionType::Truss | SectionType::Strut | SectionType::Tie => {
                format!("SVAL NO {tag} MNO {material} A {}", num(g("A")?))
            }
            // thickness and stiffness travel on the element records
            _ => return Ok(()),
        };
        w.write_comment(&section.name);
        w.write_line(line);
        Ok(())
    }

    fn property(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        _index: usize,
        property: &ResolvedProperty<'_>,
    ) -> FEAResult<()> {
        if property.section.section_type != SectionType::Shell {
            warn_overrides(self.kind(), r, property);
        }
        if !property.properties.reinforcement.is_empty() {
            return Err(unsupported(
                self.kind(),
                format!("reinforcement in '{}'", property.properties.name),
            ));
        }
        w.write_comment(format!(
            "{}: section {} on {}",
            property.properties.name, property.section_tag, property.elset
        ));
        Ok(())
    }

    fn displacement(
        &self,
        w: &mut Writer,
        _r: &Resolved<'_>,
        displacement: &ResolvedDisplacement<'_>,
    ) -> FEAResult<()> {
        let d = displacement.displacement;
        check_global(self.kind(), d.axes, "displacements")?;
        if d.dofs.defined().any(|(_, v)| v != 0.0) {
            return Err(unsupported(self.kind(), format!("prescribed non-zero values in '{}'", d.name)));
        }
        let code = fixity(d.dofs.values().map(|v| v.is_some()));
        w.write_comment(&d.name);
        for &node in &displacement.nodes {
            w.write_line(format!("NODE NO {} FIX {code}", w.id(node)));
        }
        Ok(())
    }

    fn misc(&self, w: &mut Writer, _r: &Resolved<'_>, misc: &Misc) -> FEAResult<()> {
        match misc {
            Misc::Amplitude { name, .. } => {
                w.write_comment(format!("amplitude {name} is not used"));
                Ok(())
            }
            Misc::Temperatures { name, .. } => Err(unsupported(self.kind(), format!("temperatures '{name}'"))),
        }
    }

    fn step_open(&self, w: &mut Writer, r: &Resolved<'_>, index: usize, step: &ResolvedStep<'_>) -> FEAResult<()> {
        let s = step.step;
        if step.temperatures.is_some() {
            return Err(unsupported(self.kind(), format!("temperatures in step '{}'", s.name)));
        }
        if !matches!(s.kind, StepKind::General | StepKind::Modal { .. }) {
            return Err(unsupported(self.kind(), format!("step '{}' of this kind", s.name)));
        }
        w.write_line(format!("+PROG ASE urs:{}", 4 + index));
        w.write_line(format!("HEAD {} {}", r.structure.name, s.name));
        w.write_line(format!("SYST PROB {}", if s.nlgeom { "TH3" } else { "LINE" }));
        if s.nlgeom {
            w.write_line(format!("CTRL ITER {}", s.iterations));
        }
        if let StepKind::Modal { modes } = s.kind {
            w.write_line(format!("EIGE {modes} ETYP LANC LC {}", 1000 + index + 1));
        }
        Ok(())
    }

    fn load(
        &self,
        w: &mut Writer,
        _r: &Resolved<'_>,
        step: &ResolvedStep<'_>,
        load: &ResolvedLoad<'_>,
    ) -> FEAResult<()> {
        let factor = load_factor(step, load) * KILO;
        let l = load.load;
        match &l.kind {
            LoadKind::Point { components } => {
                check_global(self.kind(), l.axes, "point loads")?;
                for &node in &load.keys {
                    for (i, value) in components.defined() {
                        w.write_line(format!(
                            "NODE NO {} TYPE {} P1 {}",
                            w.id(node),
                            NODE_LOADS[i],
                            num(value * factor)
                        ));
                    }
                }
            }
            LoadKind::PointList { components } | LoadKind::Tributary { components } => {
                check_global(self.kind(), l.axes, "point loads")?;
                for (&node, dofs) in components {
                    for (i, value) in dofs.defined() {
                        w.write_line(format!(
                            "NODE NO {} TYPE {} P1 {}",
                            w.id(node),
                            NODE_LOADS[i],
                            num(value * factor)
                        ));
                    }
                }
            }
            LoadKind::Line { components } => {
                let labels = match l.axes {
                    Axes::Global => ["PXX", "PYY", "PZZ"],
                    Axes::Local => ["PXS", "PYS", "PZS"],
                };
                for &element in &load.keys {
                    for (i, value) in components.defined() {
                        let Some(label) = labels.get(i) else {
                            return Err(unsupported(
                                self.kind(),
                                format!("moment component of line load '{}'", l.name),
                            ));
                        };
                        w.write_line(format!(
                            "BEAM NO {} TYPE {label} P1 {}",
                            w.id(element),
                            num(value * factor)
                        ));
                    }
                }
            }
            LoadKind::Area { components } => {
                let pressure = components.z.unwrap_or(0.0) * factor;
                for &element in &load.keys {
                    w.write_line(format!("QUAD NO {} TYPE PZ P1 {}", w.id(element), num(pressure)));
                }
            }
            // self weight is switched on by the load case
            LoadKind::Gravity { .. } => {}
            _ => {
                return Err(unsupported(
                    self.kind(),
                    format!("{} load '{}'", l.load_type(), l.name),
                ))
            }
        }
        Ok(())
    }

    fn step_activate(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        index: usize,
        step: &ResolvedStep<'_>,
        _displacements: &[&ResolvedDisplacement<'_>],
        loads: &[&ResolvedLoad<'_>],
    ) -> FEAResult<()> {
        if loads.is_empty() {
            return Ok(());
        }
        let mut card = format!("LC NO {} TITL '{}'", index + 1, step.step.name);
        for l in loads {
            if let LoadKind::Gravity { g, direction } = l.load.kind {
                if direction != [0.0, 0.0, -1.0] {
                    return Err(unsupported(
                        self.kind(),
                        format!("gravity '{}' off the negative z axis", l.load.name),
                    ));
                }
                card.push_str(&format!(" DLZ {}", num(g / GRAVITY * load_factor(step, l))));
            }
        }
        w.write_line(card);
        for l in loads {
            self.load(w, r, step, l)?;
        }
        Ok(())
    }

    fn step_output(
        &self,
        w: &mut Writer,
        _r: &Resolved<'_>,
        _index: usize,
        _step: &ResolvedStep<'_>,
        fields: &[String],
    ) -> FEAResult<()> {
        let mut options: Vec<&str> = Vec::new();
        for option in fields.iter().filter_map(|f| Self::echo_option(f)) {
            if !options.contains(&option) {
                options.push(option);
            }
        }
        for option in options {
            w.write_line(format!("ECHO {option} FULL"));
        }
        Ok(())
    }

    fn step_close(&self, w: &mut Writer, _r: &Resolved<'_>, _index: usize, _step: &ResolvedStep<'_>) -> FEAResult<()> {
        w.write_line("END");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixity_codes() {
        assert_eq!(fixity([true; 6]), "F");
        assert_eq!(fixity([true, true, true, false, false, false]), "PP");
        assert_eq!(fixity([false, true, true, false, false, false]), "PYPZ");
        assert_eq!(fixity([true, true, true, true, false, false]), "PPMX");
    }

    #[test]
    fn test_echo_options() {
        assert_eq!(Sofistik::echo_option("u"), Some("DISP"));
        assert_eq!(Sofistik::echo_option("rm"), Some("REAC"));
        assert_eq!(Sofistik::echo_option("sf"), Some("FORC"));
        assert_eq!(Sofistik::echo_option("nt"), None);
    }

    #[test]
    fn test_element_records() {
        assert_eq!(Sofistik::record(ElementType::Hexahedron), Some("BRIC"));
        assert_eq!(Sofistik::record(ElementType::Membrane), None);
    }
}
