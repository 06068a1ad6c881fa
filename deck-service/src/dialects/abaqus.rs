//! Abaqus / CalculiX keyword decks (`.inp`)

use fea_model::elements::{Element, ElementType, Material, MaterialModel, Node, SectionType, YieldCurve};
use fea_model::error::{FEAError, FEAResult};
use fea_model::loads::{Axes, LoadKind, StepKind};
use fea_model::misc::{Constraint, Interaction, Misc};
use fea_model::results::{field_location, FieldLocation};
use fea_model::sets::{SetKind, NSET_ALL, ELSET_ALL};
use fea_model::validate::{
    ElementBlock, Resolved, ResolvedDisplacement, ResolvedLoad, ResolvedProperty, ResolvedSet,
    ResolvedStep,
};

use super::{
    check_global, check_node, load_factor, unsupported, warn_overrides, DeckSection, Dialect,
    DialectKind,
};
use crate::writer::{num, Writer, IDS_PER_LINE};

/// Keyword decks read by Abaqus and CalculiX
pub struct Abaqus;

impl Abaqus {
    const ABSOLUTE_ZERO: f64 = -273.15;
    const STEFAN_BOLTZMANN: f64 = 5.67e-8;
    /// Integration points through a shell
    const SHELL_POINTS: usize = 5;

    /// Element type keyword of a block
    pub fn element_keyword(element_type: ElementType, node_count: usize) -> &'static str {
        let tri = node_count == 3;
        match element_type {
            ElementType::Beam => "B31",
            ElementType::Spring => "SPRINGA",
            ElementType::Truss | ElementType::Strut | ElementType::Tie => "T3D2",
            ElementType::Shell if tri => "S3",
            ElementType::Shell => "S4",
            ElementType::Membrane if tri => "M3D3",
            ElementType::Membrane => "M3D4",
            ElementType::Face if tri => "SFM3D3",
            ElementType::Face => "SFM3D4",
            ElementType::Tetrahedron => "C3D4",
            ElementType::Pentahedron => "C3D6",
            ElementType::Hexahedron => "C3D8",
            ElementType::Mass => "MASS",
        }
    }

    fn block_name(block: &ElementBlock) -> String {
        format!("block_{}_{}", block.element_type.tag(), block.node_count)
    }

    fn elastic(w: &mut Writer, e: f64, v: f64) {
        w.write_line("*ELASTIC");
        w.write_fields([num(e), num(v)]);
    }

    fn curve(w: &mut Writer, curve: &YieldCurve) {
        for (stress, strain) in curve.points() {
            w.write_fields([num(stress), num(strain)]);
        }
    }

    /// Native `*NODE PRINT` / `*EL PRINT` keyword of a canonical field
    pub fn output_keyword(field: &str) -> Option<&'static str> {
        Some(match field {
            "u" => "U",
            "ur" => "UR",
            "rf" => "RF",
            "rm" => "RM",
            "cf" => "CF",
            "cm" => "CM",
            "nt" => "NT",
            "s" => "S",
            "e" => "E",
            "pe" => "PE",
            "sf" => "SF",
            "sm" => "SM",
            "spf" => "CTF",
            "rbfor" => "RBFOR",
            _ => return None,
        })
    }

    /// Elements of a beam property grouped by orientation vector; a single
    /// group keeps the property's elset, several get `<elset>_o<n>`
    fn orientation_groups(
        r: &Resolved<'_>,
        property: &ResolvedProperty<'_>,
    ) -> FEAResult<Vec<(String, [f64; 3], Vec<usize>)>> {
        let mut groups: Vec<([f64; 3], Vec<usize>)> = Vec::new();
        for &element in &property.elements {
            let orientation = r.structure.beam_orientation(element)?;
            match groups.iter_mut().find(|(o, _)| *o == orientation) {
                Some((_, elements)) => elements.push(element),
                None => groups.push((orientation, vec![element])),
            }
        }
        if groups.len() <= 1 {
            let (orientation, elements) = groups.pop().unwrap_or(([0.0, 0.0, 1.0], Vec::new()));
            return Ok(vec![(property.elset.clone(), orientation, elements)]);
        }
        groups
            .into_iter()
            .enumerate()
            .map(|(i, (orientation, elements))| {
                let name = format!("{}_o{}", property.elset, i + 1);
                if r.set(&name).is_some() {
                    return Err(FEAError::InvariantViolation(format!(
                        "orientation elset '{name}' of '{}' clashes with a set",
                        property.properties.name
                    )));
                }
                Ok((name, orientation, elements))
            })
            .collect()
    }

    fn beam_section(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        property: &ResolvedProperty<'_>,
        material: &str,
    ) -> FEAResult<()> {
        let groups = Self::orientation_groups(r, property)?;
        let split = groups.len() > 1;
        for (elset, orientation, elements) in groups {
            if split {
                w.write_line(format!("*ELSET, ELSET={elset}"));
                w.write_ids(&elements, IDS_PER_LINE, "");
            }
            self.beam_section_card(w, property, material, &elset, orientation)?;
        }
        Ok(())
    }

    fn beam_section_card(
        &self,
        w: &mut Writer,
        property: &ResolvedProperty<'_>,
        material: &str,
        elset: &str,
        orientation: [f64; 3],
    ) -> FEAResult<()> {
        let section = property.section;
        let g = |key: &str| section.require(key);

        if section.section_type == SectionType::General {
            let density = property.material.map_or(0.0, |m| m.elastic().2);
            w.write_line(format!(
                "*BEAM GENERAL SECTION, ELSET={elset}, SECTION=GENERAL, DENSITY={}",
                num(density)
            ));
            w.write_fields([g("A")?, g("Ixx")?, g("Ixy")?, g("Iyy")?, g("J")?].map(num));
            w.write_fields(orientation.map(num));
            if let Some(m) = property.material {
                w.write_fields([num(m.elastic().0), num(m.g())]);
            }
            return Ok(());
        }

        let (keyword, dims) = match section.section_type {
            SectionType::Rectangular => ("RECT", vec![g("b")?, g("h")?]),
            SectionType::Circular => ("CIRC", vec![g("r")?]),
            SectionType::Pipe => ("PIPE", vec![g("r")?, g("t")?]),
            SectionType::I => {
                let h = g("h")?;
                let b = g("b")?;
                let tf = g("tf")?;
                ("I", vec![h / 2.0, h, b, b, tf, tf, g("tw")?])
            }
            SectionType::Box => {
                let (tw, tf) = (g("tw")?, g("tf")?);
                ("BOX", vec![g("b")?, g("h")?, tw, tf, tw, tf])
            }
            SectionType::Angle => {
                let t = g("t")?;
                ("L", vec![g("b")?, g("h")?, t, t])
            }
            SectionType::Trapezoidal => ("TRAPEZOID", vec![g("b1")?, g("h")?, g("b2")?, 0.0]),
            other => return Err(unsupported(self.kind(), format!("{other:?} beam section"))),
        };
        w.write_line(format!(
            "*BEAM SECTION, ELSET={elset}, MATERIAL={material}, SECTION={keyword}"
        ));
        w.write_fields(dims.into_iter().map(num));
        w.write_fields(orientation.map(num));
        Ok(())
    }

    fn temperatures(w: &mut Writer, misc: &Misc) {
        let Misc::Temperatures { rows, .. } = misc else {
            return;
        };
        let Some(last) = rows.last() else { return };
        w.write_line("*TEMPERATURE");
        for (node, t) in last.nodal() {
            let id = w.id(node);
            w.write_fields([id.to_string(), num(t)]);
        }
    }
}

impl Dialect for Abaqus {
    fn kind(&self) -> DialectKind {
        DialectKind::Abaqus
    }

    fn separator(&self) -> &'static str {
        ", "
    }

    fn pins_per_step(&self) -> bool {
        true
    }

    fn header(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        w.write_comment(format!("Abaqus input deck for '{}'", r.structure.name));
        w.write_comment("Units: N, m, s, C");
        w.blank_line();
        Ok(())
    }

    fn section_open(&self, w: &mut Writer, _r: &Resolved<'_>, section: DeckSection) -> FEAResult<()> {
        if section == DeckSection::Nodes {
            w.write_line("*NODE");
        }
        Ok(())
    }

    fn heading(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        w.write_line("*HEADING");
        w.write_line(&r.structure.name);
        w.write_line(format!(
            "*PHYSICAL CONSTANTS, ABSOLUTE ZERO={}, STEFAN BOLTZMANN={}",
            num(Self::ABSOLUTE_ZERO),
            num(Self::STEFAN_BOLTZMANN)
        ));
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
        w.write_line(format!(
            "*ELEMENT, TYPE={}, ELSET={}",
            Self::element_keyword(block.element_type, block.node_count),
            Self::block_name(block)
        ));
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
        let mut fields = vec![w.id(element.key).to_string()];
        fields.extend(topology.iter().map(|&n| w.id(n).to_string()));
        w.write_fields(fields);
        Ok(())
    }

    fn set(&self, w: &mut Writer, _r: &Resolved<'_>, set: &ResolvedSet<'_>) -> FEAResult<()> {
        match set.kind {
            SetKind::Node => {
                w.write_line(format!("*NSET, NSET={}", set.name));
                w.write_ids(&set.keys, IDS_PER_LINE, "");
            }
            SetKind::Element => {
                w.write_line(format!("*ELSET, ELSET={}", set.name));
                w.write_ids(&set.keys, IDS_PER_LINE, "");
            }
            SetKind::NodeSurface => {
                w.write_line(format!("*SURFACE, TYPE=NODE, NAME={}", set.name));
                for &key in &set.keys {
                    let id = w.id(key);
                    w.write_fields([id.to_string(), num(1.0)]);
                }
            }
            SetKind::ElementSurface => {
                w.write_line(format!("*SURFACE, TYPE=ELEMENT, NAME={}", set.name));
                for face in set.faces.unwrap_or_default() {
                    let id = w.id(face.element);
                    w.write_fields([id.to_string(), face.side.clone()]);
                }
            }
        }
        w.blank_line();
        Ok(())
    }

    fn material(&self, w: &mut Writer, _tag: usize, material: &Material) -> FEAResult<()> {
        w.write_line(format!("*MATERIAL, NAME={}", material.name));
        match &material.model {
            MaterialModel::ElasticIsotropic {
                e,
                v,
                tension,
                compression,
                ..
            } => {
                Self::elastic(w, *e, *v);
                if !compression {
                    w.write_line("*NO COMPRESSION");
                }
                if !tension {
                    w.write_line("*NO TENSION");
                }
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
                w.write_line("*ELASTIC, TYPE=ENGINEERING CONSTANTS");
                w.write_fields([ex, ey, ez, vxy, vzx, vyz, gxy, gzx].map(|v| num(*v)));
                w.write_fields([num(*gyz)]);
            }
            MaterialModel::ElasticPlastic { e, v, curve, .. }
            | MaterialModel::Steel { e, v, curve, .. } => {
                Self::elastic(w, *e, *v);
                w.write_line("*PLASTIC");
                Self::curve(w, curve);
            }
            MaterialModel::Stiff { e, v, .. } => Self::elastic(w, *e, *v),
            MaterialModel::Concrete {
                e,
                v,
                compression,
                tension,
                fratios,
                ..
            }
            | MaterialModel::ConcreteSmearedCrack {
                e,
                v,
                compression,
                tension,
                fratios,
                ..
            } => {
                Self::elastic(w, *e, *v);
                w.write_line("*CONCRETE");
                Self::curve(w, compression);
                w.write_line("*TENSION STIFFENING");
                Self::curve(w, tension);
                w.write_line("*FAILURE RATIOS");
                w.write_fields(fratios.map(num));
            }
            MaterialModel::ConcreteDamagedPlasticity {
                e,
                v,
                damage,
                hardening,
                stiffening,
                plasticity,
                ..
            } => {
                Self::elastic(w, *e, *v);
                w.write_line("*CONCRETE DAMAGED PLASTICITY");
                w.write_fields(plasticity.map(num));
                w.write_line("*CONCRETE COMPRESSION HARDENING");
                Self::curve(w, hardening);
                w.write_line("*CONCRETE TENSION STIFFENING");
                Self::curve(w, stiffening);
                w.write_line("*CONCRETE COMPRESSION DAMAGE");
                Self::curve(w, damage);
            }
        }
        w.write_line("*DENSITY");
        w.write_fields([num(material.elastic().2)]);
        w.blank_line();
        Ok(())
    }

    fn property(
        &self,
        w: &mut Writer,
        r: &Resolved<'_>,
        _index: usize,
        property: &ResolvedProperty<'_>,
    ) -> FEAResult<()> {
        warn_overrides(self.kind(), r, property);
        let section = property.section;
        let elset = &property.elset;
        let material = property.material.map_or("", |m| m.name.as_str());
        w.write_comment(format!(
            "{}: {} + {}",
            property.properties.name, material, section.name
        ));

        if !property.properties.reinforcement.is_empty() && section.section_type != SectionType::Shell {
            return Err(unsupported(
                self.kind(),
                format!("reinforcement outside shell sections ('{}')", property.properties.name),
            ));
        }

        match section.section_type {
            t if t.is_beam() => self.beam_section(w, r, property, material)?,
            SectionType::Truss | SectionType::Strut | SectionType::Tie => {
                w.write_line(format!("*SOLID SECTION, ELSET={elset}, MATERIAL={material}"));
                w.write_fields([num(section.require("A")?)]);
            }
            SectionType::Shell => {
                w.write_line(format!("*SHELL SECTION, ELSET={elset}, MATERIAL={material}"));
                w.write_fields([num(section.require("t")?), Self::SHELL_POINTS.to_string()]);
                if !property.properties.reinforcement.is_empty() {
                    w.write_line("*REBAR LAYER");
                    for bar in &property.properties.reinforcement {
                        w.write_fields([
                            bar.layer.clone(),
                            num(bar.area),
                            num(bar.spacing),
                            num(bar.offset),
                            bar.material.clone(),
                            num(bar.angle),
                        ]);
                    }
                }
            }
            SectionType::Membrane => {
                w.write_line(format!("*MEMBRANE SECTION, ELSET={elset}, MATERIAL={material}"));
                w.write_fields([num(section.require("t")?)]);
            }
            SectionType::Solid => {
                w.write_line(format!("*SOLID SECTION, ELSET={elset}, MATERIAL={material}"));
            }
            SectionType::Spring => {
                w.write_line(format!("*SPRING, ELSET={elset}"));
                w.write_line("");
                w.write_fields([num(section.require("k")?)]);
            }
            _ => {
                w.write_line(format!("*MASS, ELSET={elset}"));
                w.write_fields([num(section.require("mass")?)]);
            }
        }
        w.blank_line();
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
        w.write_line("*BOUNDARY");
        for (i, value) in d.dofs.defined() {
            let dof = (i + 1).to_string();
            w.write_fields([displacement.nset.clone(), dof.clone(), dof, num(value)]);
        }
        Ok(())
    }

    fn constraint(&self, w: &mut Writer, _r: &Resolved<'_>, constraint: &Constraint) -> FEAResult<()> {
        let Constraint::Tie {
            name,
            master,
            slave,
            tol,
        } = constraint;
        w.write_line(format!(
            "*TIE, NAME={name}, POSITION TOLERANCE={}, ADJUST=NO",
            num(*tol)
        ));
        w.write_fields([slave, master]);
        w.blank_line();
        Ok(())
    }

    fn interaction(&self, w: &mut Writer, _r: &Resolved<'_>, interaction: &Interaction) -> FEAResult<()> {
        let Interaction::HeatTransfer { name, interface, .. } = interaction;
        w.write_comment(format!("{name}: film and radiation on '{interface}', written in its heat step"));
        Ok(())
    }

    fn misc(&self, w: &mut Writer, _r: &Resolved<'_>, misc: &Misc) -> FEAResult<()> {
        match misc {
            Misc::Amplitude { name, values } => {
                w.write_line(format!("*AMPLITUDE, NAME={name}"));
                let flat: Vec<f64> = values.iter().flatten().copied().collect();
                for chunk in flat.chunks(8) {
                    w.write_fields(chunk.iter().map(|v| num(*v)));
                }
            }
            Misc::Temperatures { name, rows } => {
                w.write_comment(format!("{name}: {} rows, applied by the steps using it", rows.len()));
            }
        }
        w.blank_line();
        Ok(())
    }

    fn model_setup(&self, w: &mut Writer, r: &Resolved<'_>) -> FEAResult<()> {
        let temp0 = r.steps.iter().find_map(|s| match s.step.kind {
            StepKind::Heat { temp0, .. } => Some(temp0),
            _ => None,
        });
        if let Some(temp0) = temp0 {
            w.write_line("*INITIAL CONDITIONS, TYPE=TEMPERATURE");
            w.write_fields([NSET_ALL.to_string(), num(temp0)]);
        }

        let mut prestressed: Vec<usize> = r
            .steps
            .iter()
            .flat_map(|s| s.loads.iter().copied())
            .filter(|&i| matches!(r.loads[i].load.kind, LoadKind::Prestress { .. }))
            .collect();
        prestressed.sort_unstable();
        prestressed.dedup();
        for i in prestressed {
            let load = &r.loads[i];
            if let LoadKind::Prestress { sxx } = load.load.kind {
                w.write_line("*INITIAL CONDITIONS, TYPE=STRESS");
                w.write_fields([load.set.clone(), num(sxx)]);
            }
        }
        Ok(())
    }

    fn step_open(&self, w: &mut Writer, _r: &Resolved<'_>, _index: usize, step: &ResolvedStep<'_>) -> FEAResult<()> {
        let s = step.step;
        w.write_line(format!(
            "*STEP, NAME={}, NLGEOM={}, INC={}",
            s.name,
            if s.nlgeom { "YES" } else { "NO" },
            s.increments
        ));
        match &s.kind {
            StepKind::General => w.write_line("*STATIC"),
            StepKind::Modal { modes } => w.write_line(format!("*FREQUENCY, NUMBER={modes}")),
            StepKind::Buckle { modes } => {
                w.write_line("*BUCKLE");
                w.write_fields([modes.to_string()]);
            }
            StepKind::Harmonic {
                frequencies,
                damping,
            } => {
                w.write_line("*STEADY STATE DYNAMICS, DIRECT");
                for f in frequencies {
                    w.write_fields([num(*f), num(*f), "1".to_string()]);
                }
                w.write_line(format!("*GLOBAL DAMPING, STRUCTURAL={}", num(*damping)));
            }
            StepKind::Acoustic { .. } => {
                return Err(unsupported(self.kind(), format!("acoustic step '{}'", s.name)))
            }
            StepKind::Heat { dtmax, duration, .. } => {
                w.write_line("*HEAT TRANSFER");
                w.write_fields([num(*dtmax), num(*duration), String::new(), num(*dtmax)]);
            }
        }
        w.blank_line();
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
                w.write_line("*CLOAD");
                for (i, value) in components.defined() {
                    w.write_fields([load.set.clone(), (i + 1).to_string(), num(value * factor)]);
                }
            }
            LoadKind::PointList { components } | LoadKind::Tributary { components } => {
                check_global(self.kind(), l.axes, "point loads")?;
                w.write_line("*CLOAD");
                for (&node, dofs) in components {
                    let id = w.id(node).to_string();
                    for (i, value) in dofs.defined() {
                        w.write_fields([id.clone(), (i + 1).to_string(), num(value * factor)]);
                    }
                }
            }
            LoadKind::Line { components } => {
                w.write_line("*DLOAD");
                for (i, value) in components.defined() {
                    let label = match (l.axes, i) {
                        (Axes::Global, 0) => "PX",
                        (Axes::Global, 1) => "PY",
                        (Axes::Global, 2) => "PZ",
                        (Axes::Local, 0) => "P1",
                        (Axes::Local, 1) => "P2",
                        _ => {
                            return Err(unsupported(
                                self.kind(),
                                format!("component {i} of line load '{}'", l.name),
                            ))
                        }
                    };
                    w.write_fields([load.set.clone(), label.to_string(), num(value * factor)]);
                }
            }
            LoadKind::Area { components } => {
                w.write_line("*DLOAD");
                let pressure = components.z.unwrap_or(0.0);
                w.write_fields([load.set.clone(), "P".to_string(), num(pressure * factor)]);
            }
            LoadKind::Gravity { g, direction } => {
                w.write_line("*DLOAD");
                let mut fields = vec![load.set.clone(), "GRAV".to_string(), num(g * factor)];
                fields.extend(direction.map(num));
                w.write_fields(fields);
            }
            LoadKind::Prestress { .. } => {
                w.write_comment("applied as an initial stress condition");
            }
            LoadKind::Thermal { temperature } => {
                w.write_line("*TEMPERATURE");
                w.write_fields([load.set.clone(), num(temperature * factor)]);
            }
            LoadKind::AcousticPoint { .. } => {
                return Err(unsupported(self.kind(), format!("acoustic load '{}'", l.name)))
            }
        }
        Ok(())
    }

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
        if let Some(temperatures) = step.temperatures {
            w.write_comment(temperatures.name());
            Self::temperatures(w, temperatures);
        }
        if let Some(Interaction::HeatTransfer {
            amplitude,
            interface,
            sink_temp,
            film_coef,
            ambient_temp,
            emissivity,
            ..
        }) = step.interaction
        {
            w.write_line(format!("*SFILM, AMPLITUDE={amplitude}"));
            w.write_fields([interface.clone(), "F".to_string(), num(*sink_temp), num(*film_coef)]);
            w.write_line(format!("*SRADIATE, AMPLITUDE={amplitude}"));
            w.write_fields([
                interface.clone(),
                "R".to_string(),
                num(*ambient_temp),
                num(*emissivity),
            ]);
        }
        w.blank_line();
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
        let keywords = |location: FieldLocation| -> FEAResult<Vec<&'static str>> {
            fields
                .iter()
                .filter(|f| field_location(f) == Some(location))
                .map(|f| {
                    Self::output_keyword(f)
                        .ok_or_else(|| FEAError::Validation(format!("unknown output field '{f}'")))
                })
                .collect()
        };
        let nodal = keywords(FieldLocation::Node)?;
        let element = keywords(FieldLocation::Element)?;
        if !nodal.is_empty() {
            w.write_line(format!("*NODE PRINT, NSET={NSET_ALL}"));
            w.write_fields(nodal);
        }
        if !element.is_empty() {
            w.write_line(format!("*EL PRINT, ELSET={ELSET_ALL}"));
            w.write_fields(element);
        }
        Ok(())
    }

    fn step_close(&self, w: &mut Writer, _r: &Resolved<'_>, _index: usize, _step: &ResolvedStep<'_>) -> FEAResult<()> {
        w.write_line("*END STEP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::{render_deck, DeckOptions};
    use fea_model::prelude::*;

    fn cantilever() -> Structure {
        let mut s = Structure::new("cantilever", "/tmp");
        let nodes = s.add_nodes(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]).unwrap();
        s.add_element(ElementType::Beam, vec![nodes[0], nodes[1]]).unwrap();
        s.add_element(ElementType::Beam, vec![nodes[1], nodes[2]]).unwrap();
        s.add(vec![
            Material::steel("s355", 355.0, 490.0, 15.0).into(),
            Section::rectangular("rect", 0.1, 0.2).into(),
            ElementProperties::new("ep", "s355", "rect", "elset_all").into(),
            Set::nodes("support", vec![0]).into(),
            Displacement::fixed("fixed", "support").into(),
            Load::gravity("self_weight", "elset_all").into(),
            Step::general("gravity", &["fixed"], &["self_weight"]).with_factor(1.35).into(),
        ])
        .unwrap();
        s
    }

    #[test]
    fn test_element_keywords() {
        assert_eq!(Abaqus::element_keyword(ElementType::Shell, 3), "S3");
        assert_eq!(Abaqus::element_keyword(ElementType::Shell, 4), "S4");
        assert_eq!(Abaqus::element_keyword(ElementType::Tie, 2), "T3D2");
        assert_eq!(Abaqus::element_keyword(ElementType::Hexahedron, 8), "C3D8");
    }

    #[test]
    fn test_beam_cantilever_deck() {
        let deck = render_deck(&cantilever(), DialectKind::Abaqus, &DeckOptions::with_fields(&["u", "s"])).unwrap();

        assert!(deck.starts_with("** Abaqus input deck for 'cantilever'\n"));
        assert!(deck.contains("*ELEMENT, TYPE=B31, ELSET=block_beam_2\n1, 1, 2\n2, 2, 3\n"));
        assert!(deck.contains("*BEAM SECTION, ELSET=elset_all, MATERIAL=s355, SECTION=RECT\n0.1, 0.2\n0, 0, 1\n"));
        assert!(deck.contains("*MATERIAL, NAME=s355\n*ELASTIC\n"));
        assert!(deck.contains("*PLASTIC\n"));
        assert!(deck.contains("*BOUNDARY\nsupport, 1, 1, 0\n"));
        assert_eq!(deck.matches("support, ").count(), 6);
        assert!(deck.contains("*STEP, NAME=gravity, NLGEOM=NO, INC="));
        assert!(deck.contains("*DLOAD\nelset_all, GRAV, "));
        assert!(deck.contains("*NODE PRINT, NSET=nset_all\nU\n"));
        assert!(deck.contains("*EL PRINT, ELSET=elset_all\nS\n"));
        assert!(deck.contains("*END STEP\n"));
    }

    /// Two horizontal beams and a vertical post under one property
    fn portal() -> Structure {
        let mut s = Structure::new("portal", "/tmp");
        let n = s
            .add_nodes(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 2.0], [2.0, 0.0, 0.0]])
            .unwrap();
        s.add_element(ElementType::Beam, vec![n[0], n[1]]).unwrap();
        s.add_element(ElementType::Beam, vec![n[1], n[2]]).unwrap();
        s.add_element(ElementType::Beam, vec![n[1], n[3]]).unwrap();
        s.add(vec![
            Material::steel("s355", 355.0, 490.0, 15.0).into(),
            Section::rectangular("rect", 0.1, 0.2).into(),
            ElementProperties::new("ep", "s355", "rect", "elset_all").into(),
            Displacement::fixed("fixed", vec![0, 3]).into(),
            Load::point("top", vec![2], Dofs::xyz(1000.0, 0.0, 0.0)).into(),
            Step::general("sway", &["fixed"], &["top"]).into(),
        ])
        .unwrap();
        s
    }

    #[test]
    fn test_beam_orientation_per_element() {
        let s = portal();
        assert_eq!(s.beam_orientation(0).unwrap(), [0.0, 0.0, 1.0]);
        assert_eq!(s.beam_orientation(1).unwrap(), [1.0, 0.0, 0.0]);
        let deck = render_deck(&s, DialectKind::Abaqus, &DeckOptions::default()).unwrap();

        assert!(deck.contains(
            "*ELSET, ELSET=elset_all_o1\n1, 3\n\
             *BEAM SECTION, ELSET=elset_all_o1, MATERIAL=s355, SECTION=RECT\n0.1, 0.2\n0, 0, 1\n"
        ));
        assert!(deck.contains(
            "*ELSET, ELSET=elset_all_o2\n2\n\
             *BEAM SECTION, ELSET=elset_all_o2, MATERIAL=s355, SECTION=RECT\n0.1, 0.2\n1, 0, 0\n"
        ));
        assert!(!deck.contains("*BEAM SECTION, ELSET=elset_all,"));
    }

    #[test]
    fn test_output_keywords_come_from_the_field_table() {
        assert_eq!(Abaqus::output_keyword("ur"), Some("UR"));
        assert_eq!(Abaqus::output_keyword("spf"), Some("CTF"));
        assert_eq!(Abaqus::output_keyword("velocity"), None);
        for (field, _, _) in fea_model::results::FIELD_COMPONENTS {
            assert!(Abaqus::output_keyword(field).is_some(), "{field}");
        }

        let fields = DeckOptions::with_fields(&["u", "rf", "spf", "sf"]);
        let deck = render_deck(&cantilever(), DialectKind::Abaqus, &fields).unwrap();
        assert!(deck.contains("*NODE PRINT, NSET=nset_all\nU, RF\n"));
        assert!(deck.contains("*EL PRINT, ELSET=elset_all\nCTF, SF\n"));
    }

    #[test]
    fn test_thermal_loads_take_the_step_factor() {
        let mut s = cantilever();
        s.add(vec![
            Load::thermal("warm", vec![1, 2], 20.0).into(),
            Step::general("heat_up", &[], &["warm"]).with_factor(1.5).into(),
        ])
        .unwrap();
        let deck = render_deck(&s, DialectKind::Abaqus, &DeckOptions::default()).unwrap();
        assert!(deck.contains("*TEMPERATURE\nnset_warm, 30\n"));
    }

    #[test]
    fn test_node_masses_are_unsupported() {
        let mut s = cantilever();
        s.add_node_with([3.0, 0.0, 0.0], None, Some(10.0)).unwrap();
        let err = render_deck(&s, DialectKind::Abaqus, &DeckOptions::default()).unwrap_err();
        assert!(matches!(err, FEAError::UnsupportedFeature(_)));
    }
}
