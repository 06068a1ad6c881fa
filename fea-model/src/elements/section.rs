//! Cross-sections and their derived properties

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::element::ElementType;
use crate::error::{FEAError, FEAResult};

/// Section variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    Angle,
    Box,
    Circular,
    General,
    I,
    Pipe,
    Rectangular,
    Trapezoidal,
    Shell,
    Membrane,
    Solid,
    Truss,
    Strut,
    Tie,
    Spring,
    Mass,
}

impl SectionType {
    /// Frame sections carrying bending properties
    pub fn is_beam(&self) -> bool {
        matches!(
            self,
            SectionType::Angle
                | SectionType::Box
                | SectionType::Circular
                | SectionType::General
                | SectionType::I
                | SectionType::Pipe
                | SectionType::Rectangular
                | SectionType::Trapezoidal
        )
    }

    /// Whether elements of `element_type` may carry this section
    pub fn accepts(&self, element_type: ElementType) -> bool {
        match self {
            t if t.is_beam() => element_type == ElementType::Beam,
            SectionType::Truss | SectionType::Strut | SectionType::Tie => element_type.is_axial(),
            SectionType::Shell => matches!(element_type, ElementType::Shell | ElementType::Face),
            SectionType::Membrane => {
                matches!(element_type, ElementType::Membrane | ElementType::Face)
            }
            SectionType::Solid => element_type.is_solid(),
            SectionType::Spring => element_type == ElementType::Spring,
            _ => element_type == ElementType::Mass,
        }
    }
}

/// A named cross-section.
///
/// `geometry` holds the defining dimensions plus, for frame sections, the
/// derived `A`, `Ixx`, `Iyy`, `Ixy`, `J`, `Avx` and `Avy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub section_type: SectionType,
    pub geometry: BTreeMap<String, f64>,
}

impl Section {
    pub fn new(name: &str, section_type: SectionType, geometry: &[(&str, f64)]) -> Self {
        Self {
            name: name.to_string(),
            section_type,
            geometry: geometry
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    /// Look up a geometry scalar
    pub fn get(&self, key: &str) -> Option<f64> {
        self.geometry.get(key).copied()
    }

    /// Look up a geometry scalar the caller cannot do without
    pub fn require(&self, key: &str) -> FEAResult<f64> {
        self.get(key).ok_or_else(|| {
            FEAError::Validation(format!("section '{}' has no '{key}' value", self.name))
        })
    }

    fn with_derived(mut self, a: f64, ixx: f64, iyy: f64, ixy: f64, j: f64, avx: f64, avy: f64) -> Self {
        for (k, v) in [
            ("A", a),
            ("Ixx", ixx),
            ("Iyy", iyy),
            ("Ixy", ixy),
            ("J", j),
            ("Avx", avx),
            ("Avy", avy),
        ] {
            self.geometry.insert(k.to_string(), v);
        }
        self
    }

    /// Solid rectangle of width `b` and height `h`
    pub fn rectangular(name: &str, b: f64, h: f64) -> Self {
        let a = b * h;
        let (long, short) = if b > h { (b, h) } else { (h, b) };
        let j = long * short.powi(3) / 3.0 * (1.0 - 0.63 * short / long);
        Self::new(name, SectionType::Rectangular, &[("b", b), ("h", h)]).with_derived(
            a,
            b * h.powi(3) / 12.0,
            h * b.powi(3) / 12.0,
            0.0,
            j,
            5.0 / 6.0 * a,
            5.0 / 6.0 * a,
        )
    }

    /// Solid circle of radius `r`
    pub fn circular(name: &str, r: f64) -> Self {
        let a = PI * r.powi(2);
        let i = PI * r.powi(4) / 4.0;
        Self::new(name, SectionType::Circular, &[("r", r)]).with_derived(
            a,
            i,
            i,
            0.0,
            2.0 * i,
            0.9 * a,
            0.9 * a,
        )
    }

    /// Hollow circle of outer radius `r` and wall thickness `t`
    pub fn pipe(name: &str, r: f64, t: f64) -> Self {
        let ri = r - t;
        let a = PI * (r.powi(2) - ri.powi(2));
        let i = PI * (r.powi(4) - ri.powi(4)) / 4.0;
        Self::new(name, SectionType::Pipe, &[("r", r), ("t", t)]).with_derived(
            a,
            i,
            i,
            0.0,
            2.0 * i,
            a / 2.0,
            a / 2.0,
        )
    }

    /// Doubly symmetric I of width `b`, height `h`, web `tw` and flanges `tf`
    pub fn i_section(name: &str, b: f64, h: f64, tw: f64, tf: f64) -> Self {
        let hw = h - 2.0 * tf;
        let a = 2.0 * b * tf + hw * tw;
        let ixx = (b * h.powi(3) - (b - tw) * hw.powi(3)) / 12.0;
        let iyy = (2.0 * tf * b.powi(3) + hw * tw.powi(3)) / 12.0;
        let j = (2.0 * b * tf.powi(3) + hw * tw.powi(3)) / 3.0;
        Self::new(
            name,
            SectionType::I,
            &[("b", b), ("h", h), ("tw", tw), ("tf", tf)],
        )
        .with_derived(a, ixx, iyy, 0.0, j, 5.0 / 6.0 * 2.0 * b * tf, h * tw)
    }

    /// Rectangular hollow section
    pub fn box_section(name: &str, b: f64, h: f64, tw: f64, tf: f64) -> Self {
        let bi = b - 2.0 * tw;
        let hi = h - 2.0 * tf;
        let a = b * h - bi * hi;
        let ixx = (b * h.powi(3) - bi * hi.powi(3)) / 12.0;
        let iyy = (h * b.powi(3) - hi * bi.powi(3)) / 12.0;
        // Bredt's formula on the mid-wall contour
        let am = (b - tw) * (h - tf);
        let s = 2.0 * ((b - tw) / tf + (h - tf) / tw);
        let j = 4.0 * am.powi(2) / s;
        Self::new(
            name,
            SectionType::Box,
            &[("b", b), ("h", h), ("tw", tw), ("tf", tf)],
        )
        .with_derived(a, ixx, iyy, 0.0, j, 2.0 * b * tf, 2.0 * h * tw)
    }

    /// Equal-thickness L with horizontal leg `b` and vertical leg `h`
    pub fn angle(name: &str, b: f64, h: f64, t: f64) -> Self {
        // horizontal leg, then the vertical leg above it
        let parts = [
            (b * t, b / 2.0, t / 2.0, b, t),
            ((h - t) * t, t / 2.0, t + (h - t) / 2.0, t, h - t),
        ];
        let a: f64 = parts.iter().map(|p| p.0).sum();
        let xc = parts.iter().map(|p| p.0 * p.1).sum::<f64>() / a;
        let yc = parts.iter().map(|p| p.0 * p.2).sum::<f64>() / a;
        let mut ixx = 0.0;
        let mut iyy = 0.0;
        let mut ixy = 0.0;
        for (ap, x, y, w, d) in parts {
            ixx += w * d.powi(3) / 12.0 + ap * (y - yc).powi(2);
            iyy += d * w.powi(3) / 12.0 + ap * (x - xc).powi(2);
            ixy += ap * (x - xc) * (y - yc);
        }
        let j = t.powi(3) * (b + h - t) / 3.0;
        Self::new(name, SectionType::Angle, &[("b", b), ("h", h), ("t", t)])
            .with_derived(a, ixx, iyy, ixy, j, b * t, h * t)
    }

    /// Symmetric trapezoid with bottom width `b1`, top width `b2` and height `h`
    pub fn trapezoidal(name: &str, b1: f64, b2: f64, h: f64) -> Self {
        let a = h * (b1 + b2) / 2.0;
        let ixx = h.powi(3) * (b1.powi(2) + 4.0 * b1 * b2 + b2.powi(2)) / (36.0 * (b1 + b2));
        let iyy = h * (b1 + b2) * (b1.powi(2) + b2.powi(2)) / 48.0;
        // Saint-Venant approximation for compact solid sections
        let j = a.powi(4) / (40.0 * (ixx + iyy));
        Self::new(
            name,
            SectionType::Trapezoidal,
            &[("b1", b1), ("b2", b2), ("h", h)],
        )
        .with_derived(a, ixx, iyy, 0.0, j, 5.0 / 6.0 * a, 5.0 / 6.0 * a)
    }

    /// Frame section given directly by its integrated properties
    pub fn general(name: &str, a: f64, ixx: f64, ixy: f64, iyy: f64, j: f64) -> Self {
        Self::new(name, SectionType::General, &[]).with_derived(a, ixx, iyy, ixy, j, a, a)
    }

    pub fn shell(name: &str, t: f64) -> Self {
        Self::new(name, SectionType::Shell, &[("t", t)])
    }

    pub fn membrane(name: &str, t: f64) -> Self {
        Self::new(name, SectionType::Membrane, &[("t", t)])
    }

    pub fn solid(name: &str) -> Self {
        Self::new(name, SectionType::Solid, &[])
    }

    pub fn truss(name: &str, a: f64) -> Self {
        Self::new(name, SectionType::Truss, &[("A", a)])
    }

    /// Compression-only axial section
    pub fn strut(name: &str, a: f64) -> Self {
        Self::new(name, SectionType::Strut, &[("A", a)])
    }

    /// Tension-only axial section
    pub fn tie(name: &str, a: f64) -> Self {
        Self::new(name, SectionType::Tie, &[("A", a)])
    }

    /// Linear spring with axial stiffness `k` in N/m
    pub fn spring(name: &str, k: f64) -> Self {
        Self::new(name, SectionType::Spring, &[("k", k)])
    }

    /// Point mass in kg
    pub fn mass(name: &str, mass: f64) -> Self {
        Self::new(name, SectionType::Mass, &[("mass", mass)])
    }

    /// Check every geometry value is finite and the required ones are present
    pub fn validate(&self) -> FEAResult<()> {
        if let Some((k, v)) = self.geometry.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FEAError::Validation(format!(
                "section '{}' has non-finite '{k}' = {v}",
                self.name
            )));
        }
        let required: &[&str] = match self.section_type {
            t if t.is_beam() => &["A", "Ixx", "Iyy", "J"],
            SectionType::Shell | SectionType::Membrane => &["t"],
            SectionType::Truss | SectionType::Strut | SectionType::Tie => &["A"],
            SectionType::Spring => &["k"],
            SectionType::Mass => &["mass"],
            _ => &[],
        };
        for key in required {
            self.require(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangular_section() {
        let section = Section::rectangular("r", 0.3, 0.5);
        assert_relative_eq!(section.get("A").unwrap(), 0.15);
        assert_relative_eq!(section.get("Ixx").unwrap(), 0.3 * 0.5_f64.powi(3) / 12.0);
        assert!(section.validate().is_ok());
    }

    #[test]
    fn test_circular_section() {
        let section = Section::circular("c", 0.25);
        assert_relative_eq!(section.get("A").unwrap(), PI * 0.0625);
        assert_relative_eq!(section.get("Ixx").unwrap(), section.get("Iyy").unwrap());
    }

    #[test]
    fn test_angle_symmetric_product() {
        let section = Section::angle("l", 0.1, 0.1, 0.01);
        assert_relative_eq!(section.get("A").unwrap(), 0.01 * 0.19, epsilon = 1e-12);
        assert_relative_eq!(
            section.get("Ixx").unwrap(),
            section.get("Iyy").unwrap(),
            epsilon = 1e-14
        );
        assert!(section.get("Ixy").unwrap() < 0.0);
    }

    #[test]
    fn test_compatibility() {
        assert!(SectionType::I.accepts(ElementType::Beam));
        assert!(!SectionType::I.accepts(ElementType::Truss));
        assert!(SectionType::Truss.accepts(ElementType::Tie));
        assert!(SectionType::Shell.accepts(ElementType::Shell));
        assert!(!SectionType::Shell.accepts(ElementType::Hexahedron));
        assert!(SectionType::Solid.accepts(ElementType::Hexahedron));
    }

    #[test]
    fn test_missing_geometry() {
        let section = Section::new("s", SectionType::Shell, &[]);
        assert!(matches!(section.validate(), Err(FEAError::Validation(_))));
    }
}
