//! Propagation overlay configuration
//!
//! Gantree: L2_Propagation → PropagationConfig
//!
//! Controls which propagations the overlay computes for a circuit revision.

use crumble_core::constants::markers;
use crumble_core::{CrumbleError, CrumbleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overlay configuration
/// Gantree: PropagationConfig // 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Number of MARKX/MARKY/MARKZ slots propagated
    /// Gantree: marker_slots: u32 // 마커 슬롯 수 (10)
    pub marker_slots: u32,

    /// Propagate every detector backward
    /// Gantree: include_detectors: bool // 검출기 포함
    pub include_detectors: bool,

    /// Propagate every observable backward
    /// Gantree: include_observables: bool // 관측량 포함
    pub include_observables: bool,

    /// Drop results with no snapshots
    pub skip_empty_frames: bool,
}

impl PropagationConfig {
    // ========================================================================
    // Presets
    // ========================================================================

    /// Marker slots only
    pub fn markers_only() -> Self {
        Self {
            include_detectors: false,
            include_observables: false,
            ..Self::default()
        }
    }

    /// Detectors and observables only
    pub fn annotations_only() -> Self {
        Self {
            marker_slots: 0,
            ..Self::default()
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set number of marker slots
    pub fn with_marker_slots(mut self, slots: u32) -> Self {
        self.marker_slots = slots;
        self
    }

    /// Enable/disable detector propagation
    pub fn with_detectors(mut self, enabled: bool) -> Self {
        self.include_detectors = enabled;
        self
    }

    /// Enable/disable observable propagation
    pub fn with_observables(mut self, enabled: bool) -> Self {
        self.include_observables = enabled;
        self
    }

    /// Keep or drop empty results
    pub fn with_skip_empty_frames(mut self, enabled: bool) -> Self {
        self.skip_empty_frames = enabled;
        self
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate configuration
    /// Gantree: validate(&self) -> Result // 검증
    ///
    /// `annotations_only()` is the one preset with zero marker slots; any
    /// other configuration needs between 1 and `MAX_MARKER_SLOTS`.
    pub fn validate(&self) -> CrumbleResult<()> {
        if self.marker_slots > markers::MAX_MARKER_SLOTS {
            return Err(CrumbleError::InvalidConfig(format!(
                "marker_slots must be <= {}, got {}",
                markers::MAX_MARKER_SLOTS,
                self.marker_slots
            )));
        }

        if self.marker_slots == 0 && !(self.include_detectors || self.include_observables) {
            return Err(CrumbleError::InvalidConfig(
                "marker_slots must be > 0 when detectors and observables are off".to_string(),
            ));
        }

        Ok(())
    }

    // ========================================================================
    // JSON
    // ========================================================================

    /// Load and validate from JSON
    pub fn from_json(json: &str) -> CrumbleResult<Self> {
        let config: PropagationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> CrumbleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            marker_slots: markers::DEFAULT_MARKER_SLOTS,
            include_detectors: true,
            include_observables: true,
            skip_empty_frames: true,
        }
    }
}

impl fmt::Display for PropagationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PropagationConfig(slots={}, detectors={}, observables={}, skip_empty={})",
            self.marker_slots, self.include_detectors, self.include_observables, self.skip_empty_frames
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = PropagationConfig::default();
        assert_eq!(config.marker_slots, 10);
        assert!(config.include_detectors);
        assert!(config.include_observables);
        assert!(config.skip_empty_frames);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PropagationConfig::default()
            .with_marker_slots(3)
            .with_detectors(false)
            .with_observables(false)
            .with_skip_empty_frames(false);
        assert_eq!(config.marker_slots, 3);
        assert!(!config.include_detectors);
        assert!(!config.skip_empty_frames);
    }

    #[test]
    fn test_presets() {
        let markers = PropagationConfig::markers_only();
        assert!(!markers.include_detectors && !markers.include_observables);
        assert!(markers.validate().is_ok());

        let annotations = PropagationConfig::annotations_only();
        assert_eq!(annotations.marker_slots, 0);
        assert!(annotations.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let too_many = PropagationConfig::default().with_marker_slots(65);
        assert!(matches!(too_many.validate(), Err(CrumbleError::InvalidConfig(_))));
        assert!(PropagationConfig::default().with_marker_slots(64).validate().is_ok());

        let nothing = PropagationConfig::markers_only().with_marker_slots(0);
        assert!(nothing.validate().is_err());
    }

    #[test]
    fn test_json() {
        let config = PropagationConfig::default().with_marker_slots(4);
        let json = config.to_json().unwrap();
        assert_eq!(PropagationConfig::from_json(&json).unwrap(), config);

        let partial = PropagationConfig::from_json(r#"{"marker_slots": 2}"#).unwrap();
        assert_eq!(partial.marker_slots, 2);
        assert!(partial.include_detectors);

        assert!(PropagationConfig::from_json(r#"{"marker_slots": 100}"#).is_err());
        assert!(matches!(
            PropagationConfig::from_json("not json"),
            Err(CrumbleError::JsonError(_))
        ));
    }

    #[test]
    fn test_display() {
        let s = PropagationConfig::default().to_string();
        assert!(s.contains("slots=10"));
    }
}
