/// Lowest accepted flame level.
pub const MIN_LEVEL: f32 = 0.0;
/// Highest accepted flame level.
pub const MAX_LEVEL: f32 = 100.0;
/// Level used until the caller picks one.
pub const DEFAULT_LEVEL: f32 = 50.0;

/// Caller-facing flame level, always within `[MIN_LEVEL, MAX_LEVEL]`.
///
/// The shader sees the normalized value (`level / 100`), which scales
/// opacity, brightness and ripple amplitude together.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Intensity(f32);

impl Intensity {
    /// Clamps `level` into range. NaN has no meaningful position in the range
    /// and is rejected with `None`.
    pub fn new(level: f32) -> Option<Self> {
        if level.is_nan() {
            None
        } else {
            Some(Self(level.clamp(MIN_LEVEL, MAX_LEVEL)))
        }
    }

    pub fn level(self) -> f32 {
        self.0
    }

    pub fn normalized(self) -> f32 {
        self.0 / MAX_LEVEL
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(DEFAULT_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_into_range() {
        assert_eq!(Intensity::new(-10.0).unwrap().level(), 0.0);
        assert_eq!(Intensity::new(150.0).unwrap().level(), 100.0);
        assert_eq!(Intensity::new(37.0).unwrap().level(), 37.0);
        assert_eq!(Intensity::new(f32::INFINITY).unwrap().level(), 100.0);
        assert_eq!(Intensity::new(f32::NEG_INFINITY).unwrap().level(), 0.0);
    }

    #[test]
    fn rejects_nan() {
        assert!(Intensity::new(f32::NAN).is_none());
    }

    #[test]
    fn normalizes_to_unit_range() {
        assert_eq!(Intensity::default().normalized(), 0.5);
        assert_eq!(Intensity::new(100.0).unwrap().normalized(), 1.0);
        assert_eq!(Intensity::new(0.0).unwrap().normalized(), 0.0);
    }
}
