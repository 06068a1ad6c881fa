//! OpenSees Tcl scripts (`.tcl`)
//!
//! Elements are built inside a `build_elements` proc that runs once the
//! sections and transformations they refer to exist.

use fea_model::elements::{Element, ElementType, Material, MaterialModel, Node, SectionType};
use fea_model::error::{FEAError, FEAResult};
use fea_model::loads::{Axes, LoadKind, StepKind};
use fea_model::misc::Misc;
use fea_model::validate::{
    ElementBlock, Resolved, ResolvedDisplacement, ResolvedLoad, ResolvedProperty, ResolvedSet,
    ResolvedStep,
};

use super::{
    check_global, check_node, load_factor, property_index, unsupported, DeckSection, Dialect,
    DialectKind,
};
use crate::writer::{num, Writer};

const INDENT: &str = "    ";

/// Recorder output of a nodal field: DOFs and response
pub fn recorder_spec(field: &str) -> Option<([usize; 3], &'static str)> {
    match field {
        "u" => Some(([1, 2, 3], "disp")),
        "ur" => Some(([4, 5, 6], "disp")),
        "rf" => Some(([1, 2, 3], "reaction")),
        "rm" => Some(([4, 5, 6], "reaction")),
        _ => None,
    }
}

/// File a recorder writes, relative to the working directory
pub fn recorder_file(model: &str, step: &str, field: &str) -> String {
    format!("{model}_{step}_{field}.out")
}

/// File the eigenvalues of a modal step are written to
pub fn eigen_file(model: &str, step: &str) -> String {
    format!("{model}_{step}_eigen.out")
}

/// Tcl scripts for the OpenSees interpreter
pub struct OpenSees {
    ndof: usize,
}

impl OpenSees {
    pub fn new(ndof: usize) -> FEAResult<Self> {
        match ndof {
            3 | 6 => Ok(Self { ndof }),
            other => Err(FEAError::Validation(format!(
                "opensees decks carry 3 or 6 DOFs per node, got {other}"
            ))),
        }
    }

    fn need_rotations(&self, what: impl std::fmt::Display) -> FEAResult<()> {
        if self.ndof == 6 {
            Ok(())
        } else {
            Err(unsupported(self.kind(), format!("{what} with 3 DOFs per node")))
        }
    }

    /// Tag of the uniaxial material a property generates for itself
    fn aux_tag(r: &Resolved<'_>, index: usize) -> usize {
        r.materials.len() + index + 1
    }

    /// Tag of the section or nDMaterial of an element
    fn property_tag(r: &Resolved<'_>, element: usize) -> FEAResult<usize> {
        property_index(r, element).map(|i| i + 1)
    }

    /// DOF components of a load vector, zero-filled to the deck's DOF count
    fn components(&self, values: [Option<f64>; 6], factor: f64) -> Vec<String> {
        values[..self.ndof]
            .iter()
            .map(|v| num(v.unwrap_or(0.0) * factor))
            .collect()
    }

    fn young(&self, property: &ResolvedProperty<'_>) -> FEAResult<f64> {
        property
            .material
            .map(|m| m.elastic().0)
            .ok_or_else(|| unsupported(self.kind(), format!("'{}' without a material", property.properties.name)))
    }
}

impl Dialect for OpenSees {
    fn kind(&self) -> DialectKind {
        DialectKind::OpenSees
    }

    fn ndof(&self) -> usize {
        self.ndof
    }

    fn pins_per_step(&self) -> bool {
        false
    }

    fn header(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        w.write_comment(format!("OpenSees script for '{}'", r.structure.name));
        w.write_line("wipe");
        w.write_line(format!("model BasicBuilder -ndm 3 -ndf {}", self.ndof));
        w.write_line("proc group {flag name args} { set ::groups($name) $args }");
        w.blank_line();
        Ok(())
    }

    fn section_open(&self, w: &mut Writer, _r: &Resolved<'_>, section: DeckSection) -> FEAResult<()> {
        if section == DeckSection::Elements {
            w.write_line("proc build_elements {} {");
        }
        Ok(())
    }

    fn section_close(&self, w: &mut Writer, _r: &Resolved<'_>, section: DeckSection) -> FEAResult<()> {
        match section {
            DeckSection::Elements => w.write_line("}"),
            DeckSection::Sections => w.write_line("build_elements"),
            _ => {}
        }
        Ok(())
    }

    fn heading(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        w.write_comment(format!("Model: {}", r.structure.name));
        w.write_comment("Units: N, m, s");
        w.write_comment(format!("DOFs per node: {}", self.ndof));
        Ok(())
    }

    fn node(&self, w: &mut Writer, node: &Node) -> FEAResult<()> {
        check_node(self.kind(), node, true)?;
        let id = w.id(node.key).to_string();
        w.write_fields(["node".to_string(), id.clone(), num(node.x), num(node.y), num(node.z)]);
        if let Some(m) = node.mass {
            let mut fields = vec!["mass".to_string(), id];
            fields.extend(std::iter::repeat(num(m)).take(3));
            fields.extend(std::iter::repeat("0".to_string()).take(self.ndof - 3));
            w.write_fields(fields);
        }
        Ok(())
    }

    fn element_block(
        &self,
        w: &mut Writer,
        _r: &Resolved<'_>,
        _index: usize,
        block: &ElementBlock,
    ) -> FEAResult<()> {
        w.write_line(format!(
            "{INDENT}{} {} x {}",
            w.comment(),
            block.elements.len(),
            block.element_type.tag()
        ));
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
        let id = w.id(element.key);
        let nodes: Vec<String> = topology.iter().map(|&n| w.id(n).to_string()).collect();
        let nodes = nodes.join(" ");
        let tag = Self::property_tag(r, element.key)?;

        let line = match element.element_type {
            ElementType::Beam => {
                self.need_rotations("beams")?;
                format!("element elasticBeamColumn {id} {nodes} -section {tag} -transf {id}")
            }
            ElementType::Truss | ElementType::Strut | ElementType::Tie => {
                format!("element truss {id} {nodes} -section {tag}")
            }
            ElementType::Shell => {
                self.need_rotations("shells")?;
                let variant = if topology.len() == 3 { "ShellDKGT" } else { "ShellMITC4" };
                format!("element {variant} {id} {nodes} -section {tag}")
            }
            ElementType::Hexahedron => format!("element stdBrick {id} {nodes} -section {tag}"),
            ElementType::Tetrahedron => {
                format!("element FourNodeTetrahedron {id} {nodes} -section {tag}")
            }
            ElementType::Spring => {
                let aux = Self::aux_tag(r, tag - 1);
                format!("element zeroLength {id} {nodes} -mat {aux} {aux} {aux} -dir 1 2 3")
            }
            other => {
                return Err(unsupported(self.kind(), format!("{} element {}", other.tag(), element.key)))
            }
        };
        w.write_line(format!("{INDENT}{line}"));
        Ok(())
    }

    fn set(&self, w: &mut Writer, _r: &Resolved<'_>, set: &ResolvedSet<'_>) -> FEAResult<()> {
        let keys: Vec<usize> = match set.faces {
            Some(faces) => faces.iter().map(|f| f.element).collect(),
            None => set.keys.clone(),
        };
        let mut fields = vec!["group".to_string(), "-name".to_string(), set.name.clone()];
        fields.extend(keys.iter().map(|&k| w.id(k).to_string()));
        w.write_fields(fields);
        Ok(())
    }

    fn material(&self, w: &mut Writer, tag: usize, material: &Material) -> FEAResult<()> {
        w.write_comment(&material.name);
        let line = match &material.model {
            MaterialModel::ElasticIsotropic {
                e,
                tension,
                compression,
                ..
            } => match (tension, compression) {
                (true, true) => format!("uniaxialMaterial Elastic {tag} {}", num(*e)),
                (false, true) => format!("uniaxialMaterial ENT {tag} {}", num(*e)),
                (true, false) => format!("uniaxialMaterial Elastic {tag} {} 0.0 0.0", num(*e)),
                (false, false) => {
                    return Err(unsupported(
                        self.kind(),
                        format!("material '{}' without tension and compression", material.name),
                    ))
                }
            },
            MaterialModel::Stiff { e, .. } => format!("uniaxialMaterial Elastic {tag} {}", num(*e)),
            MaterialModel::ElasticPlastic { e, curve, .. } => {
                let fy = curve.points().next().map_or(0.0, |(stress, _)| stress);
                format!("uniaxialMaterial ElasticPP {tag} {} {}", num(*e), num(fy / e))
            }
            MaterialModel::Steel { e, fy, fu, eu, .. } => {
                let (fy, fu) = (fy * 1e6, fu * 1e6);
                let plastic = eu * 0.01 - fy / e;
                let b = if plastic > 0.0 { (fu - fy) / plastic / e } else { 0.0 };
                format!("uniaxialMaterial Steel01 {tag} {} {} {}", num(fy), num(*e), num(b))
            }
            MaterialModel::Concrete { compression, .. } => {
                let stresses: Vec<f64> = compression.points().map(|(s, _)| s).collect();
                let peak = stresses.first().copied().unwrap_or(0.0);
                let ultimate = stresses.last().copied().unwrap_or(peak);
                format!(
                    "uniaxialMaterial Concrete01 {tag} {} -0.002 {} -0.0035",
                    num(-peak),
                    num(-ultimate)
                )
            }
            _ => {
                return Err(unsupported(
                    self.kind(),
                    format!("{} material '{}'", material.material_type(), material.name),
                ))
            }
        };
        w.write_line(line);
        Ok(())
    }

    fn property(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        index: usize,
        property: &ResolvedProperty<'_>,
    ) -> FEAResult<()> {
        let section = property.section;
        let tag = index + 1;
        let aux = Self::aux_tag(r, index);
        let g = |key: &str| section.require(key);
        if !property.properties.reinforcement.is_empty() {
            return Err(unsupported(
                self.kind(),
                format!("reinforcement in '{}'", property.properties.name),
            ));
        }
        w.write_comment(&property.properties.name);

        match section.section_type {
            t if t.is_beam() => {
                let e = self.young(property)?;
                let shear = property.material.map_or(0.0, |m| m.g());
                w.write_fields([
                    "section".to_string(),
                    "Elastic".into(),
                    tag.to_string(),
                    num(e),
                    num(g("A")?),
                    num(g("Ixx")?),
                    num(g("Iyy")?),
                    num(shear),
                    num(g("J")?),
                ]);
                for &element in &property.elements {
                    let [x, y, z] = r.structure.beam_orientation(element)?;
                    let id = w.id(element);
                    w.write_line(format!("geomTransf Linear {id} {} {} {}", num(x), num(y), num(z)));
                }
            }
            SectionType::Truss | SectionType::Strut | SectionType::Tie => {
                let ea = num(self.young(property)? * g("A")?);
                let line = match section.section_type {
                    SectionType::Strut => format!("uniaxialMaterial ENT {aux} {ea}"),
                    SectionType::Tie => format!("uniaxialMaterial Elastic {aux} {ea} 0.0 0.0"),
                    _ => format!("uniaxialMaterial Elastic {aux} {ea}"),
                };
                w.write_line(line);
                w.write_line(format!("section Uniaxial {tag} {aux} P"));
            }
            SectionType::Shell => {
                let (e, v, p) = property.material.map(|m| m.elastic()).unwrap_or_default();
                w.write_fields([
                    "section".to_string(),
                    "ElasticMembranePlateSection".into(),
                    tag.to_string(),
                    num(e),
                    num(v),
                    num(g("t")?),
                    num(p),
                ]);
            }
            SectionType::Solid => {
                let (e, v, p) = property.material.map(|m| m.elastic()).unwrap_or_default();
                w.write_fields([
                    "nDMaterial".to_string(),
                    "ElasticIsotropic".into(),
                    tag.to_string(),
                    num(e),
                    num(v),
                    num(p),
                ]);
            }
            SectionType::Spring => {
                w.write_line(format!("uniaxialMaterial Elastic {aux} {}", num(g("k")?)));
            }
            other => {
                return Err(unsupported(self.kind(), format!("{other:?} section '{}'", section.name)))
            }
        }
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
        w.write_comment(&d.name);
        let flags: Vec<String> = d.dofs.values()[..self.ndof]
            .iter()
            .map(|v| if v.is_some() { "1" } else { "0" }.to_string())
            .collect();
        for &node in &displacement.nodes {
            let mut fields = vec!["fix".to_string(), w.id(node).to_string()];
            fields.extend(flags.iter().cloned());
            w.write_fields(fields);
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

    fn step_open(&self, w: &mut Writer, _r: &Resolved<'_>, _index: usize, step: &ResolvedStep<'_>) -> FEAResult<()> {
        let s = step.step;
        if step.temperatures.is_some() {
            return Err(unsupported(self.kind(), format!("temperatures in step '{}'", s.name)));
        }
        match &s.kind {
            StepKind::General => {
                w.write_line("constraints Transformation");
                w.write_line("numberer RCM");
                w.write_line("system BandGeneral");
                w.write_line(format!("test NormDispIncr {} {}", num(s.tolerance), s.iterations));
                w.write_line("algorithm Newton");
                w.write_line(format!(
                    "integrator LoadControl {}",
                    num(1.0 / s.increments.max(1) as f64)
                ));
                w.write_line("analysis Static");
                Ok(())
            }
            StepKind::Modal { .. } => Ok(()),
            _ => Err(unsupported(self.kind(), format!("step '{}' of this kind", s.name))),
        }
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
        match &l.kind {
            LoadKind::Point { components } => {
                check_global(self.kind(), l.axes, "point loads")?;
                let values = self.components(components.values(), factor).join(" ");
                for &node in &load.keys {
                    w.write_line(format!("{INDENT}load {} {values}", w.id(node)));
                }
            }
            LoadKind::PointList { components } | LoadKind::Tributary { components } => {
                check_global(self.kind(), l.axes, "point loads")?;
                for (&node, dofs) in components {
                    let values = self.components(dofs.values(), factor).join(" ");
                    w.write_line(format!("{INDENT}load {} {values}", w.id(node)));
                }
            }
            LoadKind::Line { components } if l.axes == Axes::Local => {
                let ids: Vec<String> = load.keys.iter().map(|&k| w.id(k).to_string()).collect();
                let c = |v: Option<f64>| num(v.unwrap_or(0.0) * factor);
                w.write_line(format!(
                    "{INDENT}eleLoad -ele {} -type -beamUniform {} {} {}",
                    ids.join(" "),
                    c(components.y),
                    c(components.z),
                    c(components.x)
                ));
            }
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
        w.write_line(format!("pattern Plain {} Linear {{", index + 1));
        for l in loads {
            self.load(w, r, step, l)?;
        }
        w.write_line("}");
        Ok(())
    }

    fn step_output(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        _index: usize,
        step: &ResolvedStep<'_>,
        fields: &[String],
    ) -> FEAResult<()> {
        if !matches!(step.step.kind, StepKind::General) {
            return Ok(());
        }
        let last = r.structure.node_count();
        for field in fields {
            let Some((dofs, response)) = recorder_spec(field) else {
                w.write_comment(format!("field '{field}' has no recorder"));
                continue;
            };
            if dofs[0] > self.ndof {
                continue;
            }
            w.write_line(format!(
                "recorder Node -file {} -time -nodeRange 1 {last} -dof {} {} {} {response}",
                recorder_file(&r.structure.name, &step.step.name, field),
                dofs[0],
                dofs[1],
                dofs[2]
            ));
        }
        Ok(())
    }

    fn step_close(&self, w: &mut Writer, r: &Resolved<'_>, _index: usize, step: &ResolvedStep<'_>) -> FEAResult<()> {
        let s = step.step;
        match &s.kind {
            StepKind::Modal { modes } => {
                w.write_line(format!("set eigenvalues [eigen {modes}]"));
                w.write_line(format!(
                    "set eigen_file [open \"{}\" w]",
                    eigen_file(&r.structure.name, &s.name)
                ));
                w.write_line("foreach lambda $eigenvalues { puts $eigen_file $lambda }");
                w.write_line("close $eigen_file");
            }
            _ => {
                w.write_line(format!("analyze {}", s.increments.max(1)));
                w.write_line("loadConst -time 0.0");
                w.write_line("remove recorders");
                w.write_line("wipeAnalysis");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndof_must_be_three_or_six() {
        assert!(OpenSees::new(3).is_ok());
        assert!(OpenSees::new(6).is_ok());
        assert!(matches!(OpenSees::new(2), Err(FEAError::Validation(_))));
    }

    #[test]
    fn test_components_follow_ndof() {
        let o = OpenSees::new(3).unwrap();
        let values = [Some(1.0), None, Some(-2.0), Some(5.0), None, None];
        assert_eq!(o.components(values, 2.0), vec!["2", "0", "-4"]);
    }

    #[test]
    fn test_recorder_names() {
        assert_eq!(recorder_file("tower", "load", "u"), "tower_load_u.out");
        assert_eq!(recorder_spec("rf"), Some(([1, 2, 3], "reaction")));
        assert_eq!(recorder_spec("s"), None);
    }
}
