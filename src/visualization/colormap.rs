//! The `plasma` colormap.

use plotters::style::RGBColor;

/// Plasma anchors at evenly spaced positions from 0 to 1.
const PLASMA: [(u8, u8, u8); 9] = [
    (13, 8, 135),   // #0d0887
    (76, 2, 161),   // #4c02a1
    (126, 3, 168),  // #7e03a8
    (168, 34, 150), // #a82296
    (204, 71, 120), // #cc4778
    (230, 108, 92), // #e66c5c
    (248, 149, 64), // #f89540
    (253, 197, 39), // #fdc527
    (240, 249, 33), // #f0f921
];

/// Color for `t` in `[0, 1]`, linearly interpolated between anchors.
pub fn plasma(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (PLASMA.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(PLASMA.len() - 2);
    let frac = scaled - lo as f64;

    let (r0, g0, b0) = PLASMA[lo];
    let (r1, g1, b1) = PLASMA[lo + 1];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

    RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Linear mapping of a value range onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub min: f64,
    pub max: f64,
}

impl Normalize {
    /// Range spanning every finite value; `None` if there is none.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut range: Option<Self> = None;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            range = Some(match range {
                None => Self { min: v, max: v },
                Some(r) => Self {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
            });
        }
        range
    }

    /// Position of `v` in the range. A flat range maps everything to 0.5.
    pub fn apply(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            return 0.5;
        }
        ((v - self.min) / span).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plasma_endpoints() {
        assert_eq!(plasma(0.0), RGBColor(13, 8, 135));
        assert_eq!(plasma(1.0), RGBColor(240, 249, 33));
        assert_eq!(plasma(0.5), RGBColor(204, 71, 120));
        assert_eq!(plasma(-3.0), plasma(0.0));
        assert_eq!(plasma(f64::NAN), plasma(0.0));
    }

    #[test]
    fn test_plasma_interpolates() {
        let mid = plasma(1.0 / 16.0);
        assert_eq!(mid, RGBColor(45, 5, 148));
    }

    #[test]
    fn test_normalize() {
        let norm = Normalize::from_values([2.0, f64::NAN, 6.0, 4.0]).unwrap();
        assert_eq!(norm, Normalize { min: 2.0, max: 6.0 });
        assert_eq!(norm.apply(4.0), 0.5);
        assert_eq!(norm.apply(10.0), 1.0);

        let flat = Normalize::from_values([3.0, 3.0]).unwrap();
        assert_eq!(flat.apply(3.0), 0.5);

        assert!(Normalize::from_values(Vec::new()).is_none());
    }
}
