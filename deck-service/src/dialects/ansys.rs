//! Ansys APDL batch scripts (`.txt`)
//!
//! APDL commands are comma-delimited whatever the listing separator is, so
//! every command line goes through [`cmd`].

use fea_model::elements::{Element, ElementType, Material, MaterialModel, Node, Section, SectionType};
use fea_model::error::FEAResult;
use fea_model::loads::{Axes, LoadKind, StepKind};
use fea_model::misc::Misc;
use fea_model::sets::SetKind;
use fea_model::validate::{
    ElementBlock, Resolved, ResolvedDisplacement, ResolvedLoad, ResolvedProperty, ResolvedSet,
    ResolvedStep, SetOrigin,
};

use super::{
    check_global, check_node, load_factor, unsupported, warn_overrides, Dialect, DialectKind,
    PENT_AS_BRICK, TET_AS_BRICK, TRI_AS_QUAD,
};
use crate::writer::{num, Writer};

const DOF_LABELS: [&str; 6] = ["UX", "UY", "UZ", "ROTX", "ROTY", "ROTZ"];
const FORCE_LABELS: [&str; 6] = ["FX", "FY", "FZ", "MX", "MY", "MZ"];

/// One APDL command
fn cmd<I, S>(w: &mut Writer, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line: Vec<String> = fields.into_iter().map(|f| f.as_ref().to_string()).collect();
    w.write_line(line.join(","));
}

/// Sorted keys as inclusive runs of consecutive values
fn runs(keys: &[usize]) -> Vec<(usize, usize)> {
    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for k in sorted {
        match runs.last_mut() {
            Some((_, last)) if *last + 1 == k => *last = k,
            _ => runs.push((k, k)),
        }
    }
    runs
}

/// APDL batch scripts for Mechanical APDL
pub struct Ansys;

impl Ansys {
    pub fn element_keyword(element_type: ElementType) -> &'static str {
        match element_type {
            ElementType::Beam => "BEAM188",
            ElementType::Truss | ElementType::Strut | ElementType::Tie => "LINK180",
            ElementType::Spring => "COMBIN14",
            ElementType::Shell | ElementType::Membrane => "SHELL181",
            ElementType::Face => "SURF154",
            ElementType::Tetrahedron | ElementType::Pentahedron | ElementType::Hexahedron => {
                "SOLID185"
            }
            ElementType::Mass => "MASS21",
        }
    }

    /// Section id of a shell property; shell sections carry their material
    fn shell_section_id(r: &Resolved<'_>, index: usize) -> usize {
        r.sections.len() + index + 1
    }

    fn is_general(step: &ResolvedStep<'_>) -> bool {
        matches!(step.step.kind, StepKind::General)
    }

    /// 1-based position of a general step within its run of general steps
    fn run_position(r: &Resolved<'_>, index: usize) -> usize {
        r.steps[..=index]
            .iter()
            .rev()
            .take_while(|s| Self::is_general(s))
            .count()
    }

    fn select(w: &mut Writer, entity: &str, keys: &[usize]) {
        cmd(w, [entity, "NONE"]);
        let label = if entity == "NSEL" { "NODE" } else { "ELEM" };
        for (first, last) in runs(keys) {
            let (a, b) = (w.id(first), w.id(last));
            if a == b {
                cmd(w, [entity.to_string(), "A".into(), label.into(), String::new(), a.to_string()]);
            } else {
                cmd(
                    w,
                    [entity.to_string(), "A".into(), label.into(), String::new(), a.to_string(), b.to_string()],
                );
            }
        }
    }

    fn elastic(w: &mut Writer, tag: usize, e: f64, v: f64) {
        cmd(w, ["MP".into(), "EX".into(), tag.to_string(), num(e)]);
        cmd(w, ["MP".into(), "PRXY".into(), tag.to_string(), num(v)]);
    }

    fn clear_loads(w: &mut Writer) {
        cmd(w, ["FDELE", "ALL", "ALL"]);
        cmd(w, ["SFEDELE", "ALL", "ALL", "ALL"]);
        cmd(w, ["BFDELE", "ALL", "ALL"]);
        cmd(w, ["ACEL", "0", "0", "0"]);
    }

    fn on_component(w: &mut Writer, set: &str, body: impl FnOnce(&mut Writer)) {
        cmd(w, ["CMSEL", "S", set]);
        body(w);
        cmd(w, ["ALLSEL"]);
    }
}

impl Dialect for Ansys {
    fn kind(&self) -> DialectKind {
        DialectKind::Ansys
    }

    fn pins_per_step(&self) -> bool {
        true
    }

    fn permutation(&self, element_type: ElementType, node_count: usize) -> Option<&'static [usize]> {
        match (element_type, node_count) {
            (ElementType::Tetrahedron, 4) => Some(&TET_AS_BRICK),
            (ElementType::Pentahedron, 6) => Some(&PENT_AS_BRICK),
            (ElementType::Shell | ElementType::Membrane | ElementType::Face, 3) => Some(&TRI_AS_QUAD),
            _ => None,
        }
    }

    fn header(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        w.write_comment(format!("Ansys APDL script for '{}'", r.structure.name));
        cmd(w, ["/BATCH"]);
        cmd(w, ["/UNITS", "SI"]);
        w.blank_line();
        Ok(())
    }

    fn heading(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        cmd(w, ["/TITLE", r.structure.name.as_str()]);
        cmd(w, ["/PREP7"]);
        Ok(())
    }

    fn node(&self, w: &mut Writer, node: &Node) -> FEAResult<()> {
        check_node(self.kind(), node, false)?;
        let id = w.id(node.key);
        cmd(w, ["N".into(), id.to_string(), num(node.x), num(node.y), num(node.z)]);
        Ok(())
    }

    fn element_block(
        &self,
        w: &mut Writer,
        _r: &Resolved<'_>,
        index: usize,
        block: &ElementBlock,
    ) -> FEAResult<()> {
        let t = (index + 1).to_string();
        w.write_comment(format!("{} x {}", block.elements.len(), block.element_type.tag()));
        cmd(w, ["ET", t.as_str(), Self::element_keyword(block.element_type)]);
        match block.element_type {
            ElementType::Membrane => cmd(w, ["KEYOPT", t.as_str(), "1", "1"]),
            ElementType::Tie => cmd(w, ["KEYOPT", t.as_str(), "3", "1"]),
            ElementType::Strut => cmd(w, ["KEYOPT", t.as_str(), "3", "2"]),
            ElementType::Mass => cmd(w, ["KEYOPT", t.as_str(), "3", "2"]),
            _ => {}
        }
        cmd(w, ["TYPE", t.as_str()]);
        Ok(())
    }

    fn element(
        &self,
        w: &mut Writer,
        _r: &Resolved<'_>,
        _index: usize,
        element: &Element,
        topology: &[usize],
    ) -> FEAResult<()> {
        let mut fields = vec!["EN".to_string(), w.id(element.key).to_string()];
        fields.extend(topology.iter().map(|&n| w.id(n).to_string()));
        cmd(w, fields);
        Ok(())
    }

    fn set(&self, w: &mut Writer, _r: &Resolved<'_>, set: &ResolvedSet<'_>) -> FEAResult<()> {
        let (entity, label) = if set.kind.selects_nodes() {
            ("NSEL", "NODE")
        } else {
            ("ESEL", "ELEM")
        };
        if set.origin == SetOrigin::Implicit {
            cmd(w, [entity, "ALL"]);
        } else if set.kind == SetKind::ElementSurface {
            let elements: Vec<usize> = set.faces.unwrap_or_default().iter().map(|f| f.element).collect();
            Self::select(w, entity, &elements);
        } else {
            Self::select(w, entity, &set.keys);
        }
        cmd(w, ["CM", set.name.as_str(), label]);
        cmd(w, ["ALLSEL"]);
        Ok(())
    }

    fn material(&self, w: &mut Writer, tag: usize, material: &Material) -> FEAResult<()> {
        w.write_comment(&material.name);
        let t = tag.to_string();
        match &material.model {
            MaterialModel::ElasticIsotropic {
                e,
                v,
                tension,
                compression,
                ..
            } => {
                if !tension || !compression {
                    return Err(unsupported(
                        self.kind(),
                        format!("no-tension or no-compression material '{}'", material.name),
                    ));
                }
                Self::elastic(w, tag, *e, *v);
            }
            MaterialModel::ElasticOrthotropic {
                ex,
                ey,
                ez,
                vxy,
                vyz,
                vzx,
                gxy,
                gyz,
                gzx,
                ..
            } => {
                let constants = [
                    ("EX", ex),
                    ("EY", ey),
                    ("EZ", ez),
                    ("PRXY", vxy),
                    ("PRYZ", vyz),
                    ("PRXZ", vzx),
                    ("GXY", gxy),
                    ("GYZ", gyz),
                    ("GXZ", gzx),
                ];
                for (label, value) in constants {
                    cmd(w, ["MP".into(), label.into(), t.clone(), num(*value)]);
                }
            }
            MaterialModel::ElasticPlastic { e, v, curve, .. } | MaterialModel::Steel { e, v, curve, .. } => {
                Self::elastic(w, tag, *e, *v);
                let points: Vec<(f64, f64)> = curve.points().collect();
                cmd(w, ["TB".into(), "MISO".into(), t.clone(), "1".into(), points.len().to_string()]);
                for (stress, plastic) in points {
                    // MISO takes total strain
                    cmd(w, ["TBPT".into(), String::new(), num(plastic + stress / e), num(stress)]);
                }
            }
            MaterialModel::Stiff { e, v, .. } => Self::elastic(w, tag, *e, *v),
            _ => {
                return Err(unsupported(
                    self.kind(),
                    format!("{} material '{}'", material.material_type(), material.name),
                ))
            }
        }
        cmd(w, ["MP".into(), "DENS".into(), t, num(material.elastic().2)]);
        w.blank_line();
        Ok(())
    }

    fn section(&self, w: &mut Writer, _r: &Resolved<'_>, tag: usize, section: &Section) -> FEAResult<()> {
        let t = tag.to_string();
        let g = |key: &str| section.require(key);
        let beam = |w: &mut Writer, shape: &str, data: Vec<f64>| {
            cmd(w, ["SECTYPE", t.as_str(), "BEAM", shape, section.name.as_str()]);
            let mut fields = vec!["SECDATA".to_string()];
            fields.extend(data.into_iter().map(num));
            cmd(w, fields);
        };
        match section.section_type {
            SectionType::Rectangular => beam(w, "RECT", vec![g("b")?, g("h")?]),
            SectionType::Circular => beam(w, "CSOLID", vec![g("r")?]),
            SectionType::Pipe => {
                let r = g("r")?;
                beam(w, "CTUBE", vec![r - g("t")?, r])
            }
            SectionType::I => {
                let (b, tf) = (g("b")?, g("tf")?);
                beam(w, "I", vec![b, b, g("h")?, tf, tf, g("tw")?])
            }
            SectionType::Box => {
                let (tw, tf) = (g("tw")?, g("tf")?);
                beam(w, "HREC", vec![g("b")?, g("h")?, tw, tw, tf, tf])
            }
            SectionType::Angle => {
                let t = g("t")?;
                beam(w, "L", vec![g("b")?, g("h")?, t, t])
            }
            SectionType::Trapezoidal => {
                let (b1, b2, h) = (g("b1")?, g("b2")?, g("h")?);
                beam(
                    w,
                    "QUAD",
                    vec![-b1 / 2.0, 0.0, b1 / 2.0, 0.0, b2 / 2.0, h, -b2 / 2.0, h],
                )
            }
            SectionType::General => beam(
                w,
                "ASEC",
                vec![g("A")?, g("Ixx")?, g("Ixy")?, g("Iyy")?, 0.0, g("J")?],
            ),
            SectionType::Truss | SectionType::Strut | SectionType::Tie => {
                cmd(w, ["SECTYPE", t.as_str(), "LINK", "", section.name.as_str()]);
                cmd(w, ["SECDATA".to_string(), num(g("A")?)]);
            }
            SectionType::Spring => cmd(w, ["R".into(), t.clone(), num(g("k")?)]),
            SectionType::Mass => {
                let m = num(g("mass")?);
                cmd(w, ["R".into(), t.clone(), m.clone(), m.clone(), m]);
            }
            // shell sections are written per property, solids need none
            SectionType::Shell | SectionType::Membrane | SectionType::Solid => {}
        }
        Ok(())
    }

    fn property(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        index: usize,
        property: &ResolvedProperty<'_>,
    ) -> FEAResult<()> {
        warn_overrides(self.kind(), r, property);
        if !property.properties.reinforcement.is_empty() {
            return Err(unsupported(
                self.kind(),
                format!("reinforcement in '{}'", property.properties.name),
            ));
        }
        let section = property.section;
        let material_tag = property.material_tag.map(|m| m.to_string());

        let assignment = match section.section_type {
            SectionType::Shell | SectionType::Membrane => {
                let id = Self::shell_section_id(r, index).to_string();
                cmd(w, ["SECTYPE", id.as_str(), "SHELL", "", section.name.as_str()]);
                cmd(w, [
                    "SECDATA".to_string(),
                    num(section.require("t")?),
                    material_tag.clone().unwrap_or_default(),
                    "0".to_string(),
                    "5".to_string(),
                ]);
                Some(("SECNUM", id))
            }
            SectionType::Spring | SectionType::Mass => Some(("REAL", property.section_tag.to_string())),
            SectionType::Solid => None,
            _ => Some(("SECNUM", property.section_tag.to_string())),
        };

        Self::on_component(w, &property.elset, |w| {
            if let Some(m) = &material_tag {
                cmd(w, ["EMODIF", "ALL", "MAT", m.as_str()]);
            }
            if let Some((label, id)) = &assignment {
                cmd(w, ["EMODIF", "ALL", *label, id.as_str()]);
            }
        });
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
        w.write_comment(&d.name);
        for (i, value) in d.dofs.defined() {
            cmd(w, ["D".into(), displacement.nset.clone(), DOF_LABELS[i].into(), num(value)]);
        }
        Ok(())
    }

    fn misc(&self, w: &mut Writer, _r: &Resolved<'_>, misc: &Misc) -> FEAResult<()> {
        match misc {
            Misc::Amplitude { name, values } => {
                w.write_comment(format!("amplitude {name} with {} points is not used", values.len()));
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
        let continues = Self::is_general(step) && Self::run_position(r, index) > 1;
        if !continues {
            cmd(w, ["FINISH"]);
            cmd(w, ["/SOLU"]);
        }
        if index > 0 {
            Self::clear_loads(w);
        }
        match &s.kind {
            StepKind::General => {
                if !continues {
                    cmd(w, ["ANTYPE", "0"]);
                }
                cmd(w, ["NLGEOM", if s.nlgeom { "ON" } else { "OFF" }]);
                cmd(w, ["NSUBST".to_string(), s.increments.to_string()]);
                cmd(w, ["NEQIT".to_string(), s.iterations.to_string()]);
                cmd(w, ["CNVTOL".into(), "F".into(), String::new(), num(s.tolerance)]);
            }
            StepKind::Modal { modes } => {
                cmd(w, ["ANTYPE", "2"]);
                cmd(w, ["MODOPT".to_string(), "LANB".into(), modes.to_string()]);
                cmd(w, ["MXPAND".to_string(), modes.to_string(), String::new(), String::new(), "YES".into()]);
            }
            StepKind::Buckle { .. } => {
                cmd(w, ["ANTYPE", "0"]);
                cmd(w, ["PSTRES", "ON"]);
            }
            StepKind::Harmonic {
                frequencies,
                damping,
            } => {
                let lo = frequencies.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = frequencies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                cmd(w, ["ANTYPE", "3"]);
                cmd(w, ["HROPT", "FULL"]);
                cmd(w, ["HARFRQ".to_string(), num(lo), num(hi)]);
                cmd(w, ["NSUBST".to_string(), frequencies.len().to_string()]);
                cmd(w, ["KBC", "1"]);
                cmd(w, ["DMPRAT".to_string(), num(*damping)]);
            }
            StepKind::Acoustic {
                freq_range,
                freq_step,
                damping,
            } => {
                let substeps = ((freq_range[1] - freq_range[0]) / freq_step).ceil().max(1.0) as usize;
                cmd(w, ["ANTYPE", "3"]);
                cmd(w, ["HROPT", "FULL"]);
                cmd(w, ["HARFRQ".to_string(), num(freq_range[0]), num(freq_range[1])]);
                cmd(w, ["NSUBST".to_string(), substeps.to_string()]);
                cmd(w, ["KBC", "1"]);
                cmd(w, ["DMPRAT".to_string(), num(*damping)]);
            }
            StepKind::Heat { .. } => {
                return Err(unsupported(self.kind(), format!("heat transfer step '{}'", s.name)))
            }
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
        let factor = load_factor(step, load);
        let l = load.load;
        w.write_comment(&l.name);
        match &l.kind {
            LoadKind::Point { components } | LoadKind::HarmonicPoint { components } => {
                check_global(self.kind(), l.axes, "point loads")?;
                for (i, value) in components.defined() {
                    cmd(w, ["F".into(), load.set.clone(), FORCE_LABELS[i].into(), num(value * factor)]);
                }
            }
            LoadKind::PointList { components } | LoadKind::Tributary { components } => {
                check_global(self.kind(), l.axes, "point loads")?;
                for (&node, dofs) in components {
                    let id = w.id(node).to_string();
                    for (i, value) in dofs.defined() {
                        cmd(w, ["F".into(), id.clone(), FORCE_LABELS[i].into(), num(value * factor)]);
                    }
                }
            }
            LoadKind::Line { components } => {
                if l.axes == Axes::Global {
                    return Err(unsupported(self.kind(), format!("global line load '{}'", l.name)));
                }
                let mut faces = Vec::new();
                for (i, value) in components.defined() {
                    let face = match i {
                        2 => "1",
                        1 => "2",
                        0 => "3",
                        _ => {
                            return Err(unsupported(
                                self.kind(),
                                format!("moment component of line load '{}'", l.name),
                            ))
                        }
                    };
                    faces.push((face, value * factor));
                }
                Self::on_component(w, &load.set, |w| {
                    for (face, value) in faces {
                        cmd(w, ["SFBEAM".into(), "ALL".into(), face.into(), "PRES".into(), num(value)]);
                    }
                });
            }
            LoadKind::Area { components } => {
                let pressure = components.z.unwrap_or(0.0) * factor;
                Self::on_component(w, &load.set, |w| {
                    cmd(w, [
                        "SFE".into(),
                        "ALL".into(),
                        "1".into(),
                        "PRES".into(),
                        String::new(),
                        num(pressure),
                    ]);
                });
            }
            LoadKind::Gravity { g, direction } => {
                let mut fields = vec!["ACEL".to_string()];
                fields.extend(direction.iter().map(|d| num(-g * d * factor)));
                cmd(w, fields);
            }
            LoadKind::Thermal { temperature } => {
                cmd(w, ["BF".into(), load.set.clone(), "TEMP".into(), num(*temperature)]);
            }
            LoadKind::AcousticPoint { pressure } => {
                cmd(w, ["D".into(), load.set.clone(), "PRES".into(), num(pressure * factor)]);
            }
            LoadKind::Prestress { .. } => {
                return Err(unsupported(self.kind(), format!("prestress load '{}'", l.name)))
            }
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
        cmd(w, ["OUTRES", "ERASE"]);
        let mut items: Vec<&str> = Vec::new();
        for field in fields {
            let item = match field.as_str() {
                "u" | "ur" | "nt" => "NSOL",
                "rf" | "rm" => "RSOL",
                "cf" | "cm" => "NLOAD",
                "s" => "STRS",
                "e" => "EPEL",
                "pe" => "EPPL",
                _ => "MISC",
            };
            if !items.contains(&item) {
                items.push(item);
            }
        }
        for item in items {
            cmd(w, ["OUTRES", item, "ALL"]);
        }
        Ok(())
    }

    fn step_close(&self, w: &mut Writer, r: &Resolved<'_>, index: usize, step: &ResolvedStep<'_>) -> FEAResult<()> {
        match &step.step.kind {
            StepKind::General => {
                let position = Self::run_position(r, index);
                cmd(w, ["LSWRITE".to_string(), position.to_string()]);
                let run_ends = r.steps.get(index + 1).map_or(true, |next| !Self::is_general(next));
                if run_ends {
                    cmd(w, ["LSSOLVE".to_string(), "1".into(), position.to_string()]);
                }
            }
            StepKind::Buckle { modes } => {
                cmd(w, ["SOLVE"]);
                cmd(w, ["FINISH"]);
                cmd(w, ["/SOLU"]);
                cmd(w, ["ANTYPE", "1"]);
                cmd(w, ["BUCOPT".to_string(), "LANB".into(), modes.to_string()]);
                cmd(w, ["MXPAND".to_string(), modes.to_string()]);
                cmd(w, ["SOLVE"]);
            }
            _ => cmd(w, ["SOLVE"]),
        }
        Ok(())
    }

    fn footer(&self, w: &mut Writer, _r: &Resolved<'_>) -> FEAResult<()> {
        cmd(w, ["FINISH"]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_merge_consecutive_keys() {
        assert_eq!(runs(&[4, 0, 1, 2, 7, 5]), vec![(0, 2), (4, 5), (7, 7)]);
        assert!(runs(&[]).is_empty());
    }

    #[test]
    fn test_commands_are_comma_delimited() {
        let mut w = Writer::new("!", " ", 1);
        cmd(&mut w, ["N", "1", "0", "0", "0"]);
        assert_eq!(w.into_string(), "N,1,0,0,0\n");
    }

    #[test]
    fn test_solid_permutations() {
        let a = Ansys;
        assert_eq!(a.permutation(ElementType::Tetrahedron, 4), Some(&TET_AS_BRICK[..]));
        assert_eq!(a.permutation(ElementType::Shell, 3), Some(&TRI_AS_QUAD[..]));
        assert_eq!(a.permutation(ElementType::Hexahedron, 8), None);
    }
}
