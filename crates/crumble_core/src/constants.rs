//! Constants for Crumble
//!
//! Gantree: L0_Foundation → Constants
//!
//! Register limits, marker conventions and text-format tokens.

// ============================================================================
// Frame Register Constants
// Gantree: frame // 프레임 상수
// ============================================================================

pub mod frame {
    //! Limits of the word-parallel Pauli frame register

    /// Maximum simultaneous frames in one register (bits per word)
    /// Gantree: MAX_FRAMES: usize = 32
    pub const MAX_FRAMES: usize = 32;
}

// ============================================================================
// Marker Constants
// Gantree: markers // 마커 상수
// ============================================================================

pub mod markers {
    //! Marker gate names and slot conventions

    /// Detector annotation
    pub const DETECTOR: &str = "DETECTOR";

    /// Observable annotation
    pub const OBSERVABLE_INCLUDE: &str = "OBSERVABLE_INCLUDE";

    /// User Pauli markers
    pub const MARKX: &str = "MARKX";
    /// User Pauli markers
    pub const MARKY: &str = "MARKY";
    /// User Pauli markers
    pub const MARKZ: &str = "MARKZ";

    /// Colored region annotation
    pub const POLYGON: &str = "POLYGON";

    /// Marker slots the editor shows by default
    /// Gantree: DEFAULT_MARKER_SLOTS: u32 = 10
    pub const DEFAULT_MARKER_SLOTS: u32 = 10;

    /// Upper bound accepted by configuration
    pub const MAX_MARKER_SLOTS: u32 = 64;
}

// ============================================================================
// Text Tokens
// Gantree: text // 텍스트 토큰
// ============================================================================

pub mod text {
    //! Tokens shared by scalar tables and the circuit text format

    /// Prefix tagging an inconsistent scalar transition
    /// Gantree: ERR_PREFIX: &str = "ERR:"
    pub const ERR_PREFIX: &str = "ERR:";

    /// Prefix of synthesized Pauli-product measurement names
    pub const MPP_PREFIX: &str = "MPP:";

    /// Prefix of synthesized Pauli-product rotation names
    pub const SPP_PREFIX: &str = "SPP:";

    /// Prefix of synthesized inverse Pauli-product rotation names
    pub const SPP_DAG_PREFIX: &str = "SPP_DAG:";

    /// Largest qubit id the reader accepts
    /// Gantree: MAX_QUBIT_ID: usize = 1 << 20
    pub const MAX_QUBIT_ID: usize = 1 << 20;

    /// Largest instruction count after unrolling `REPEAT` blocks
    /// Gantree: MAX_UNROLLED_INSTRUCTIONS: usize = 1 << 22
    pub const MAX_UNROLLED_INSTRUCTIONS: usize = 1 << 22;
}
