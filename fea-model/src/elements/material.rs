//! Material models

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Paired stress / strain sequences
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YieldCurve {
    /// Stress values in Pa
    pub stress: Vec<f64>,
    /// Plastic (or cracking) strain values
    pub strain: Vec<f64>,
}

impl YieldCurve {
    pub fn new(stress: Vec<f64>, strain: Vec<f64>) -> Self {
        Self { stress, strain }
    }

    pub fn validate(&self) -> FEAResult<()> {
        if self.stress.len() != self.strain.len() {
            return Err(FEAError::Validation(format!(
                "curve has {} stresses but {} strains",
                self.stress.len(),
                self.strain.len()
            )));
        }
        if self.stress.is_empty() {
            return Err(FEAError::Validation("curve is empty".to_string()));
        }
        Ok(())
    }

    /// (stress, strain) pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.stress.iter().copied().zip(self.strain.iter().copied())
    }
}

/// Material behaviour with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MaterialModel {
    ElasticIsotropic {
        e: f64,
        v: f64,
        p: f64,
        tension: bool,
        compression: bool,
    },
    ElasticOrthotropic {
        ex: f64,
        ey: f64,
        ez: f64,
        vxy: f64,
        vyz: f64,
        vzx: f64,
        gxy: f64,
        gyz: f64,
        gzx: f64,
        p: f64,
    },
    ElasticPlastic {
        e: f64,
        v: f64,
        p: f64,
        curve: YieldCurve,
    },
    Stiff {
        e: f64,
        v: f64,
        p: f64,
    },
    Concrete {
        e: f64,
        v: f64,
        p: f64,
        fck: f64,
        compression: YieldCurve,
        tension: YieldCurve,
        fratios: [f64; 2],
    },
    ConcreteSmearedCrack {
        e: f64,
        v: f64,
        p: f64,
        compression: YieldCurve,
        tension: YieldCurve,
        fratios: [f64; 2],
    },
    ConcreteDamagedPlasticity {
        e: f64,
        v: f64,
        p: f64,
        /// Inelastic strain / damage pairs in compression
        damage: YieldCurve,
        hardening: YieldCurve,
        stiffening: YieldCurve,
        /// Dilation angle, eccentricity, fb0/fc0, K, viscosity
        plasticity: [f64; 5],
    },
    Steel {
        e: f64,
        v: f64,
        p: f64,
        fy: f64,
        fu: f64,
        eu: f64,
        curve: YieldCurve,
    },
}

/// A named material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub model: MaterialModel,
}

impl Material {
    pub fn new(name: &str, model: MaterialModel) -> Self {
        Self {
            name: name.to_string(),
            model,
        }
    }

    /// Linear elastic isotropic material
    pub fn elastic_isotropic(name: &str, e: f64, v: f64, p: f64) -> Self {
        Self::new(
            name,
            MaterialModel::ElasticIsotropic {
                e,
                v,
                p,
                tension: true,
                compression: true,
            },
        )
    }

    /// Compression-only (`tension = false`) or tension-only material
    pub fn with_no_tension(mut self) -> Self {
        if let MaterialModel::ElasticIsotropic { tension, .. } = &mut self.model {
            *tension = false;
        }
        self
    }

    pub fn with_no_compression(mut self) -> Self {
        if let MaterialModel::ElasticIsotropic { compression, .. } = &mut self.model {
            *compression = false;
        }
        self
    }

    pub fn elastic_plastic(name: &str, e: f64, v: f64, p: f64, curve: YieldCurve) -> Self {
        Self::new(name, MaterialModel::ElasticPlastic { e, v, p, curve })
    }

    /// Very stiff elastic material
    pub fn stiff(name: &str, e: f64) -> Self {
        Self::new(name, MaterialModel::Stiff { e, v: 0.3, p: 0.1 })
    }

    /// Bilinear steel from yield strength `fy` and ultimate strength `fu` in MPa
    /// and ultimate strain `eu` in percent.
    pub fn steel(name: &str, fy: f64, fu: f64, eu: f64) -> Self {
        let e = 210e9;
        let fy_pa = fy * 1e6;
        let fu_pa = fu * 1e6;
        let ep = eu * 0.01 - fy_pa / e;
        let curve = YieldCurve::new(vec![fy_pa, fu_pa], vec![0.0, ep]);
        Self::new(
            name,
            MaterialModel::Steel {
                e,
                v: 0.3,
                p: 7850.0,
                fy,
                fu,
                eu,
                curve,
            },
        )
    }

    /// Concrete from the characteristic cylinder strength `fck` in MPa.
    ///
    /// The compression branch follows the EN 1992-1-1 stress-strain parabola
    /// sampled every 1e-4 strain, kept from the peak onwards as plastic strain.
    pub fn concrete(name: &str, fck: f64) -> Self {
        let fcm = fck + 8.0;
        let ecm = 22.0 * (fcm / 10.0).powf(0.3) * 1e9;
        let ec1 = (0.7 * fcm.powf(0.31)).min(2.8) * 0.001;
        let ecu1 = if fck < 50.0 {
            0.0035
        } else {
            (2.8 + 27.0 * ((98.0 - fcm) / 100.0).powi(4)) * 0.001
        };
        let k = 1.05 * ecm * 1e-6 * ec1 / fcm;
        let fctm = if fck <= 50.0 {
            0.3 * fck.powf(2.0 / 3.0)
        } else {
            2.12 * (1.0 + fcm / 10.0).ln()
        };

        let de = 0.0001;
        let steps = (ecu1 / de).round() as usize;
        let samples: Vec<(f64, f64)> = (1..=steps)
            .map(|i| {
                let strain = i as f64 * de;
                let n = strain / ec1;
                let f = fcm * (k * n - n * n) / (1.0 + (k - 2.0) * n);
                (f * 1e6, strain)
            })
            .collect();

        let peak = samples
            .iter()
            .enumerate()
            .fold(0, |best, (i, s)| if s.0 > samples[best].0 { i } else { best });
        let e0 = samples.get(peak).map(|s| s.1).unwrap_or(0.0);
        let compression = YieldCurve::new(
            samples[peak..].iter().map(|s| s.0).collect(),
            samples[peak..].iter().map(|s| s.1 - e0).collect(),
        );

        Self::new(
            name,
            MaterialModel::Concrete {
                e: ecm,
                v: 0.2,
                p: 2400.0,
                fck,
                compression,
                tension: YieldCurve::new(vec![1.0, 0.0], vec![0.0, 0.001]),
                fratios: [1.16, fctm / fcm],
            },
        )
    }

    pub fn concrete_smeared_crack(
        name: &str,
        e: f64,
        v: f64,
        p: f64,
        compression: YieldCurve,
        tension: YieldCurve,
    ) -> Self {
        Self::new(
            name,
            MaterialModel::ConcreteSmearedCrack {
                e,
                v,
                p,
                compression,
                tension,
                fratios: [1.16, 0.0836],
            },
        )
    }

    pub fn concrete_damaged_plasticity(
        name: &str,
        e: f64,
        v: f64,
        p: f64,
        damage: YieldCurve,
        hardening: YieldCurve,
        stiffening: YieldCurve,
    ) -> Self {
        Self::new(
            name,
            MaterialModel::ConcreteDamagedPlasticity {
                e,
                v,
                p,
                damage,
                hardening,
                stiffening,
                plasticity: [38.0, 0.1, 1.16, 0.667, 0.0],
            },
        )
    }

    /// Variant tag
    pub fn material_type(&self) -> &'static str {
        match &self.model {
            MaterialModel::ElasticIsotropic { .. } => "ElasticIsotropic",
            MaterialModel::ElasticOrthotropic { .. } => "ElasticOrthotropic",
            MaterialModel::ElasticPlastic { .. } => "ElasticPlastic",
            MaterialModel::Stiff { .. } => "Stiff",
            MaterialModel::Concrete { .. } => "Concrete",
            MaterialModel::ConcreteSmearedCrack { .. } => "ConcreteSmearedCrack",
            MaterialModel::ConcreteDamagedPlasticity { .. } => "ConcreteDamagedPlasticity",
            MaterialModel::Steel { .. } => "Steel",
        }
    }

    /// Young's modulus, Poisson ratio and density; orthotropic reports `ex` and `vxy`
    pub fn elastic(&self) -> (f64, f64, f64) {
        match &self.model {
            MaterialModel::ElasticIsotropic { e, v, p, .. }
            | MaterialModel::ElasticPlastic { e, v, p, .. }
            | MaterialModel::Stiff { e, v, p }
            | MaterialModel::Concrete { e, v, p, .. }
            | MaterialModel::ConcreteSmearedCrack { e, v, p, .. }
            | MaterialModel::ConcreteDamagedPlasticity { e, v, p, .. }
            | MaterialModel::Steel { e, v, p, .. } => (*e, *v, *p),
            MaterialModel::ElasticOrthotropic { ex, vxy, p, .. } => (*ex, *vxy, *p),
        }
    }

    /// Shear modulus from E and v
    pub fn g(&self) -> f64 {
        let (e, v, _) = self.elastic();
        e / (2.0 * (1.0 + v))
    }

    /// Check parameters and curves
    pub fn validate(&self) -> FEAResult<()> {
        let (e, v, p) = self.elastic();
        if !(e.is_finite() && e > 0.0) {
            return Err(FEAError::Validation(format!(
                "material '{}' needs a positive modulus, got {e}",
                self.name
            )));
        }
        if !(v.is_finite() && v > -1.0 && v < 0.5) {
            return Err(FEAError::Validation(format!(
                "material '{}' has Poisson ratio {v} outside (-1, 0.5)",
                self.name
            )));
        }
        if !(p.is_finite() && p >= 0.0) {
            return Err(FEAError::Validation(format!(
                "material '{}' has invalid density {p}",
                self.name
            )));
        }
        match &self.model {
            MaterialModel::ElasticPlastic { curve, .. } | MaterialModel::Steel { curve, .. } => {
                curve.validate()
            }
            MaterialModel::Concrete {
                compression,
                tension,
                ..
            }
            | MaterialModel::ConcreteSmearedCrack {
                compression,
                tension,
                ..
            } => {
                compression.validate()?;
                tension.validate()
            }
            MaterialModel::ConcreteDamagedPlasticity {
                damage,
                hardening,
                stiffening,
                ..
            } => {
                damage.validate()?;
                hardening.validate()?;
                stiffening.validate()
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_isotropic_material() {
        let mat = Material::elastic_isotropic("steel", 200e9, 0.3, 7850.0);
        assert_eq!(mat.material_type(), "ElasticIsotropic");
        assert_relative_eq!(mat.g(), 200e9 / 2.6, epsilon = 1.0);
        assert!(mat.validate().is_ok());
    }

    #[test]
    fn test_steel_curve() {
        let mat = Material::steel("s355", 355.0, 510.0, 20.0);
        match &mat.model {
            MaterialModel::Steel { curve, .. } => {
                assert_eq!(curve.stress, vec![355e6, 510e6]);
                assert_relative_eq!(curve.strain[1], 0.2 - 355e6 / 210e9);
            }
            other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn test_concrete_curve_starts_at_peak() {
        let mat = Material::concrete("c30", 30.0);
        assert!(mat.validate().is_ok());
        match &mat.model {
            MaterialModel::Concrete {
                compression, e, ..
            } => {
                assert_eq!(compression.strain[0], 0.0);
                let peak = compression.stress[0];
                assert!(compression.stress.iter().all(|s| *s <= peak));
                assert!(*e > 30e9 && *e < 35e9);
            }
            other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn test_invalid_poisson() {
        let mat = Material::elastic_isotropic("bad", 200e9, 0.6, 7850.0);
        assert!(matches!(mat.validate(), Err(FEAError::Validation(_))));
    }
}
