//! Result extraction into the result envelope
//!
//! Each extractor owns the translation from its solver's field names to the
//! canonical ones (`vx → ux`, `fx → rfx`, ...).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fea_model::error::{FEAError, FEAResult};
use fea_model::loads::StepKind;
use fea_model::model::Structure;
use fea_model::results::{field_components, von_mises, Results, StepResults};
use regex::Regex;

use crate::dialects::opensees::{eigen_file, recorder_file, recorder_spec};
use crate::dialects::{unsupported, DialectKind};

/// Reads what a solver run left in its working directory
pub trait ResultExtractor {
    fn extract(&self, structure: &Structure, workdir: &Path, fields: &[String]) -> FEAResult<Results>;
}

/// Extractor able to read the results of `kind`
pub fn extractor_for(kind: DialectKind) -> FEAResult<Box<dyn ResultExtractor + Send + Sync>> {
    match kind {
        DialectKind::Abaqus => Ok(Box::new(DatExtractor::new()?)),
        DialectKind::OpenSees => Ok(Box::new(RecorderExtractor)),
        other => Err(unsupported(other, "result extraction")),
    }
}

// ========================
// CalculiX .dat print tables
// ========================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Block {
    None,
    Displacements,
    Forces,
    Stresses,
    Strains,
    Eigenvalues,
    ModalMass,
}

impl Block {
    /// Block opened by a header line, if the line is a header
    fn from_header(line: &str) -> Option<Block> {
        let lower = line.trim().to_lowercase();
        if lower.starts_with("displacements (vx,vy,vz)") {
            Some(Block::Displacements)
        } else if lower.starts_with("forces (fx,fy,fz)") {
            Some(Block::Forces)
        } else if lower.starts_with("stresses (elem") {
            Some(Block::Stresses)
        } else if lower.starts_with("strains (elem") {
            Some(Block::Strains)
        } else if lower.starts_with("e i g e n v a l u e   o u t p u t") {
            Some(Block::Eigenvalues)
        } else if lower.starts_with("e f f e c t i v e   m o d a l   m a s s") {
            Some(Block::ModalMass)
        } else if lower.contains(" for set ") || lower.starts_with("p a r t i c i p a t i o n") {
            Some(Block::None)
        } else {
            None
        }
    }
}

/// Running per-element sum of integration-point tensors
#[derive(Default)]
struct TensorSum {
    sum: [f64; 6],
    count: usize,
}

impl TensorSum {
    fn add(&mut self, values: &[f64]) {
        for (s, v) in self.sum.iter_mut().zip(values) {
            *s += v;
        }
        self.count += 1;
    }

    fn mean(&self) -> [f64; 6] {
        let n = self.count.max(1) as f64;
        self.sum.map(|s| s / n)
    }
}

#[derive(Default)]
struct DatStep {
    results: StepResults,
    stresses: BTreeMap<usize, TensorSum>,
    strains: BTreeMap<usize, TensorSum>,
}

/// Reads the `{name}.dat` print tables CalculiX writes for `*NODE PRINT` and
/// `*EL PRINT`
pub struct DatExtractor {
    step_marker: Regex,
}

impl DatExtractor {
    pub fn new() -> FEAResult<Self> {
        let step_marker = Regex::new(r"^S T E P\s+(\d+)$")
            .map_err(|e| FEAError::Validation(format!("step marker pattern: {e}")))?;
        Ok(Self { step_marker })
    }

    /// Step number of an `S T E P       n` marker
    fn step_marker(&self, line: &str) -> Option<usize> {
        self.step_marker.captures(line)?.get(1)?.as_str().parse().ok()
    }

    /// Parse `.dat` text into per-step results, step `n` of the file being
    /// `steps[n - 1]`
    pub fn parse(&self, content: &str, steps: &[String], fields: &[String]) -> Results {
        let wants = |f: &str| fields.iter().any(|x| x == f);
        let mut parsed: BTreeMap<usize, DatStep> = BTreeMap::new();
        let mut step = 1;
        let mut block = Block::None;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(n) = self.step_marker(trimmed) {
                step = n;
                block = Block::None;
                continue;
            }
            if trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
                if let Some(next) = Block::from_header(trimmed) {
                    tracing::debug!("Found {:?} block in step {}: {}", next, step, trimmed);
                    block = next;
                }
                continue;
            }

            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            let Some(Ok(id)) = parts.first().map(|p| p.parse::<usize>()) else {
                continue;
            };
            let numbers: Vec<f64> = parts[1..].iter().map_while(|p| p.parse::<f64>().ok()).collect();
            let current = parsed.entry(step).or_default();
            // ids in the file are 1-based
            let key = id.saturating_sub(1);

            match block {
                Block::Displacements if numbers.len() >= 3 && wants("u") => {
                    for (c, v) in ["ux", "uy", "uz"].iter().zip(&numbers) {
                        current.results.insert_nodal(c, key, *v);
                    }
                }
                Block::Forces if numbers.len() >= 3 && wants("rf") => {
                    for (c, v) in ["rfx", "rfy", "rfz"].iter().zip(&numbers) {
                        current.results.insert_nodal(c, key, *v);
                    }
                }
                // element id, integration point, six components
                Block::Stresses if numbers.len() >= 7 && wants("s") => {
                    current.stresses.entry(key).or_default().add(&numbers[1..7]);
                }
                Block::Strains if numbers.len() >= 7 && wants("e") => {
                    current.strains.entry(key).or_default().add(&numbers[1..7]);
                }
                // mode, eigenvalue, rad/time, cycles/time, imaginary
                Block::Eigenvalues if numbers.len() >= 3 => {
                    current.results.frequencies.push(numbers[2]);
                }
                Block::ModalMass if numbers.len() >= 3 => {
                    current.results.masses.push(numbers[..3].iter().sum());
                }
                _ => {}
            }
        }

        let mut results = Results::new();
        for (n, mut dat) in parsed {
            let Some(name) = n.checked_sub(1).and_then(|i| steps.get(i)) else {
                tracing::warn!("Ignoring results of step {} beyond steps_order", n);
                continue;
            };
            for (key, sum) in &dat.stresses {
                let [sxx, syy, szz, sxy, sxz, syz] = sum.mean();
                for (c, v) in ["sxx", "syy", "szz", "sxy", "sxz", "syz"].iter().zip(sum.mean()) {
                    dat.results.insert_element(c, *key, v);
                }
                dat.results
                    .insert_element("smises", *key, von_mises(sxx, syy, szz, sxy, sxz, syz));
            }
            for (key, sum) in &dat.strains {
                for (c, v) in ["exx", "eyy", "ezz", "exy", "exz", "eyz"].iter().zip(sum.mean()) {
                    dat.results.insert_element(c, *key, v);
                }
            }
            dat.results.add_nodal_magnitude(["ux", "uy", "uz"], "um");
            dat.results.add_nodal_magnitude(["rfx", "rfy", "rfz"], "rfm");
            if !dat.results.is_empty() {
                results.insert(name, dat.results);
            }
        }
        results
    }
}

impl ResultExtractor for DatExtractor {
    fn extract(&self, structure: &Structure, workdir: &Path, fields: &[String]) -> FEAResult<Results> {
        let dat_path = workdir.join(format!("{}.dat", structure.name));
        if !dat_path.exists() {
            return Err(FEAError::AnalysisFailed(format!("no .dat file at {:?}", dat_path)));
        }
        let content = fs::read_to_string(&dat_path)?;
        let results = self.parse(&content, &structure.steps_order, fields);
        tracing::info!(
            "Extracted {} step(s) from {:?}",
            results.step_names().count(),
            dat_path
        );
        Ok(results)
    }
}

// ========================
// OpenSees recorders
// ========================

/// Reads the recorder files and eigenvalue lists an OpenSees deck writes
pub struct RecorderExtractor;

impl RecorderExtractor {
    /// Last recorded row: time, then three values per node
    pub fn parse_recorder(content: &str, components: &[&str], results: &mut StepResults) {
        let Some(last) = content.lines().rev().find(|l| !l.trim().is_empty()) else {
            return;
        };
        let values: Vec<f64> = last
            .split_whitespace()
            .skip(1)
            .filter_map(|v| v.parse().ok())
            .collect();
        for (node, row) in values.chunks(3).enumerate() {
            for (c, v) in components.iter().zip(row) {
                results.insert_nodal(c, node, *v);
            }
        }
    }

    /// Frequencies in Hz from eigenvalues ω²
    pub fn parse_eigenvalues(content: &str) -> Vec<f64> {
        content
            .split_whitespace()
            .filter_map(|v| v.parse::<f64>().ok())
            .map(|lambda| lambda.max(0.0).sqrt() / (2.0 * std::f64::consts::PI))
            .collect()
    }
}

impl ResultExtractor for RecorderExtractor {
    fn extract(&self, structure: &Structure, workdir: &Path, fields: &[String]) -> FEAResult<Results> {
        let mut results = Results::new();
        for name in &structure.steps_order {
            let Some(step) = structure.steps().get(name) else {
                continue;
            };
            let mut step_results = StepResults::default();
            match step.kind {
                StepKind::Modal { .. } => {
                    let path = workdir.join(eigen_file(&structure.name, name));
                    let content = fs::read_to_string(&path).map_err(|e| {
                        FEAError::AnalysisFailed(format!("missing eigenvalues {:?}: {e}", path))
                    })?;
                    step_results.frequencies = Self::parse_eigenvalues(&content);
                }
                StepKind::General => {
                    for field in fields {
                        let (Some(_), Some(components)) = (recorder_spec(field), field_components(field))
                        else {
                            continue;
                        };
                        let path = workdir.join(recorder_file(&structure.name, name, field));
                        if !path.exists() {
                            tracing::warn!("No recorder output for '{}' in step '{}'", field, name);
                            continue;
                        }
                        let content = fs::read_to_string(&path)?;
                        Self::parse_recorder(&content, &components[..3], &mut step_results);
                        step_results.add_nodal_magnitude(
                            [components[0], components[1], components[2]],
                            components[3],
                        );
                    }
                }
                _ => continue,
            }
            if !step_results.is_empty() {
                results.insert(name, step_results);
            }
        }
        Ok(results)
    }
}
