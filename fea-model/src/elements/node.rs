//! Node - a keyed point in 3D space

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// An orthonormal local frame attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalFrame {
    pub ex: [f64; 3],
    pub ey: [f64; 3],
    pub ez: [f64; 3],
}

impl LocalFrame {
    /// Tolerance on unit length and mutual orthogonality
    pub const TOLERANCE: f64 = 1e-6;

    pub fn new(ex: [f64; 3], ey: [f64; 3], ez: [f64; 3]) -> Self {
        Self { ex, ey, ez }
    }

    /// The global frame
    pub fn global() -> Self {
        Self::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0])
    }

    /// Check that the three axes are unit vectors and mutually orthogonal
    pub fn validate(&self) -> FEAResult<()> {
        let axes = [
            Vector3::from(self.ex),
            Vector3::from(self.ey),
            Vector3::from(self.ez),
        ];
        for axis in &axes {
            if (axis.norm() - 1.0).abs() > Self::TOLERANCE {
                return Err(FEAError::Validation(format!(
                    "local frame axis {:?} is not a unit vector",
                    axis.as_slice()
                )));
            }
        }
        for (i, j) in [(0, 1), (1, 2), (0, 2)] {
            if axes[i].dot(&axes[j]).abs() > Self::TOLERANCE {
                return Err(FEAError::Validation(
                    "local frame axes are not mutually orthogonal".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A node in the structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Dense 0-based key
    pub key: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    /// Optional local frame
    #[serde(default)]
    pub frame: Option<LocalFrame>,
    /// Optional lumped mass
    #[serde(default)]
    pub mass: Option<f64>,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(key: usize, xyz: [f64; 3]) -> Self {
        Self {
            key,
            x: xyz[0],
            y: xyz[1],
            z: xyz[2],
            frame: None,
            mass: None,
        }
    }

    /// Get the coordinates as an array
    pub fn xyz(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        (other.position() - self.position()).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new(4, [1.0, 2.0, 3.0]);
        assert_eq!(node.key, 4);
        assert_eq!(node.xyz(), [1.0, 2.0, 3.0]);
        assert!(node.frame.is_none());
    }

    #[test]
    fn test_node_distance() {
        let n1 = Node::new(0, [0.0, 0.0, 0.0]);
        let n2 = Node::new(1, [3.0, 4.0, 0.0]);
        assert!((n1.distance_to(&n2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_frame_validation() {
        assert!(LocalFrame::global().validate().is_ok());
        let skewed = LocalFrame::new([1.0, 0.0, 0.0], [0.6, 0.8, 0.0], [0.0, 0.0, 1.0]);
        assert!(skewed.validate().is_err());
        let long = LocalFrame::new([2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
        assert!(long.validate().is_err());
    }
}
