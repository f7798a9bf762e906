//! Half-integer layer keys
//!
//! Gantree: L2_Propagation → FrameKey
//!
//! Propagation results are indexed by half-integers: integer `k` is the
//! report point inside layer `k` (errors, crossings) and `k ± 0.5` is the gap
//! between layers (bases). Keys are stored doubled so they stay exact and
//! totally ordered.

use crumble_core::{CrumbleError, CrumbleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-integer layer key, stored as twice its value
/// Gantree: FrameKey // 반정수 키
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct FrameKey(i64);

impl FrameKey {
    /// Integer key `k` (inside layer `k`)
    pub const fn at(k: i64) -> Self {
        Self(2 * k)
    }

    /// Key `k + 0.5` (gap after layer `k`)
    pub const fn after(k: i64) -> Self {
        Self(2 * k + 1)
    }

    /// Key `k - 0.5` (gap before layer `k`)
    pub const fn before(k: i64) -> Self {
        Self(2 * k - 1)
    }

    /// Parse a float key; must be a finite multiple of 0.5
    /// Gantree: from_f64(v) -> Result<FrameKey> // 변환
    pub fn from_f64(value: f64) -> CrumbleResult<Self> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled.fract() != 0.0 || doubled.abs() > i64::MAX as f64 {
            return Err(CrumbleError::InvalidFrameKey(value));
        }
        Ok(Self(doubled as i64))
    }

    /// Key as a float
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 2.0
    }

    /// Twice the key
    pub const fn doubled(self) -> i64 {
        self.0
    }

    /// Check if this is an in-layer (integer) key
    pub const fn is_integer(self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl From<FrameKey> for String {
    fn from(key: FrameKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for FrameKey {
    type Error = CrumbleError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        let value: f64 = text
            .trim()
            .parse()
            .map_err(|_| CrumbleError::InvalidFrameKey(f64::NAN))?;
        Self::from_f64(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constructors() {
        assert_relative_eq!(FrameKey::at(3).to_f64(), 3.0);
        assert_relative_eq!(FrameKey::after(3).to_f64(), 3.5);
        assert_relative_eq!(FrameKey::before(0).to_f64(), -0.5);
        assert!(FrameKey::at(2).is_integer());
        assert!(!FrameKey::after(2).is_integer());
    }

    #[test]
    fn test_ordering() {
        assert!(FrameKey::before(1) < FrameKey::at(1));
        assert!(FrameKey::at(1) < FrameKey::after(1));
        assert_eq!(FrameKey::after(0), FrameKey::before(1));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(FrameKey::from_f64(1.5).unwrap(), FrameKey::after(1));
        assert_eq!(FrameKey::from_f64(-0.5).unwrap(), FrameKey::before(0));
        assert!(FrameKey::from_f64(0.25).is_err());
        assert!(FrameKey::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_display_and_string_roundtrip() {
        assert_eq!(FrameKey::after(2).to_string(), "2.5");
        assert_eq!(FrameKey::at(-1).to_string(), "-1");
        let key = FrameKey::try_from("2.5".to_string()).unwrap();
        assert_eq!(key, FrameKey::after(2));
        assert!(FrameKey::try_from("abc".to_string()).is_err());
    }
}
