//! Geometric keys - canonical string keys for coordinates and topologies

use crate::elements::ElementType;
use crate::error::{FEAError, FEAResult};

/// Default number of decimal digits kept when keying coordinates
pub const DEFAULT_PRECISION: i32 = 3;

/// Delimiter between the coordinates of a geometric key
pub const KEY_DELIMITER: &str = ",";

/// Build the canonical key of a point rounded to `precision` decimal digits.
///
/// Two points whose coordinates round to the same values produce
/// byte-identical keys, including the `-0.000` / `0.000` case.
pub fn geometric_key(xyz: [f64; 3], precision: i32) -> FEAResult<String> {
    if precision < 0 {
        return Err(FEAError::Validation(format!(
            "precision must be non-negative, got {precision}"
        )));
    }
    if let Some(bad) = xyz.iter().find(|c| !c.is_finite()) {
        return Err(FEAError::Validation(format!(
            "non-finite coordinate {bad} in {xyz:?}"
        )));
    }

    let p = precision as usize;
    let parts: Vec<String> = xyz
        .iter()
        .map(|&c| {
            let s = format!("{c:.p$}");
            match s.strip_prefix('-') {
                Some(rest) if rest.chars().all(|ch| ch == '0' || ch == '.') => rest.to_string(),
                _ => s,
            }
        })
        .collect();

    Ok(parts.join(KEY_DELIMITER))
}

/// Key of an element: variant tag plus its sorted node keys.
pub fn element_key(element_type: ElementType, nodes: &[usize]) -> String {
    let mut sorted = nodes.to_vec();
    sorted.sort_unstable();
    let joined = sorted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-");
    format!("{}:{}", element_type.tag(), joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_collapses_nearby_points() {
        let a = geometric_key([1.0001, 2.0, 3.0], 3).unwrap();
        let b = geometric_key([0.9999, 2.0004, 3.0], 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "1.000,2.000,3.000");
    }

    #[test]
    fn test_negative_zero_is_normalised() {
        let a = geometric_key([-0.0001, 0.0, 0.0], 3).unwrap();
        let b = geometric_key([0.0, -0.0, 0.0], 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "0.000,0.000,0.000");
    }

    #[test]
    fn test_zero_precision() {
        assert_eq!(geometric_key([1.4, -2.0, 0.2], 0).unwrap(), "1,-2,0");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            geometric_key([f64::NAN, 0.0, 0.0], 3),
            Err(FEAError::Validation(_))
        ));
        assert!(matches!(
            geometric_key([0.0, f64::INFINITY, 0.0], 3),
            Err(FEAError::Validation(_))
        ));
        assert!(matches!(
            geometric_key([0.0, 0.0, 0.0], -1),
            Err(FEAError::Validation(_))
        ));
    }

    #[test]
    fn test_element_key_ignores_node_order() {
        let a = element_key(ElementType::Shell, &[3, 1, 2, 0]);
        let b = element_key(ElementType::Shell, &[0, 1, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, element_key(ElementType::Membrane, &[0, 1, 2, 3]));
    }
}
