//! Global gate registry
//!
//! Gantree: L1_Circuit → GateTable
//!
//! Every gate name the circuit format accepts, built once from per-family
//! generators. Pauli-product measurements and rotations are synthesized on
//! demand from their basis string.

use crate::constants::text::{MPP_PREFIX, SPP_DAG_PREFIX, SPP_PREFIX};
use crate::constants::markers;
use crate::error::{CrumbleError, CrumbleResult};
use crate::gate::{FrameRule, Gate, TableauMap};
use crate::types::{Basis, BasisString};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Scalar Conjugation Tables
// ============================================================================

/// Pauli gates only flip signs
const IDENTITY_TABLE: TableauMap = &[
    ("X", "X"), ("Y", "Y"), ("Z", "Z"),
];

/// X ↔ Z
const EXCHANGE_XZ_TABLE: TableauMap = &[
    ("X", "Z"), ("Y", "Y"), ("Z", "X"),
];

/// X ↔ Y
const EXCHANGE_XY_TABLE: TableauMap = &[
    ("X", "Y"), ("Y", "X"), ("Z", "Z"),
];

/// Y ↔ Z
const EXCHANGE_YZ_TABLE: TableauMap = &[
    ("X", "X"), ("Y", "Z"), ("Z", "Y"),
];

/// X → Y → Z → X
const CYCLE_XYZ_TABLE: TableauMap = &[
    ("X", "Y"), ("Y", "Z"), ("Z", "X"),
];

/// X → Z → Y → X
const CYCLE_ZYX_TABLE: TableauMap = &[
    ("X", "Z"), ("Y", "X"), ("Z", "Y"),
];

/// Resets and demolition measurements, any basis
const RESET_TABLE: TableauMap = &[
    ("X", "ERR:I"), ("Y", "ERR:I"), ("Z", "ERR:I"),
];

/// Measurement in the X basis
const MEASURE_X_TABLE: TableauMap = &[
    ("X", "X"), ("Y", "ERR:Y"), ("Z", "ERR:Z"),
];

/// Measurement in the Y basis
const MEASURE_Y_TABLE: TableauMap = &[
    ("X", "ERR:X"), ("Y", "Y"), ("Z", "ERR:Z"),
];

/// Measurement in the Z basis
const MEASURE_Z_TABLE: TableauMap = &[
    ("X", "ERR:X"), ("Y", "ERR:Y"), ("Z", "Z"),
];

/// CX
const CX_TABLE: TableauMap = &[
    ("IX", "IX"), ("IY", "ZY"), ("IZ", "ZZ"), ("XI", "XX"), ("XX", "XI"),
    ("XY", "YZ"), ("XZ", "YY"), ("YI", "YX"), ("YX", "YI"), ("YY", "XZ"),
    ("YZ", "XY"), ("ZI", "ZI"), ("ZX", "ZX"), ("ZY", "IY"), ("ZZ", "IZ"),
];

/// CY
const CY_TABLE: TableauMap = &[
    ("IX", "ZX"), ("IY", "IY"), ("IZ", "ZZ"), ("XI", "XY"), ("XX", "YZ"),
    ("XY", "XI"), ("XZ", "YX"), ("YI", "YY"), ("YX", "XZ"), ("YY", "YI"),
    ("YZ", "XX"), ("ZI", "ZI"), ("ZX", "IX"), ("ZY", "ZY"), ("ZZ", "IZ"),
];

/// CZ
const CZ_TABLE: TableauMap = &[
    ("IX", "ZX"), ("IY", "ZY"), ("IZ", "IZ"), ("XI", "XZ"), ("XX", "YY"),
    ("XY", "YX"), ("XZ", "XI"), ("YI", "YZ"), ("YX", "XY"), ("YY", "XX"),
    ("YZ", "YI"), ("ZI", "ZI"), ("ZX", "IX"), ("ZY", "IY"), ("ZZ", "ZZ"),
];

/// XCX
const XCX_TABLE: TableauMap = &[
    ("IX", "IX"), ("IY", "XY"), ("IZ", "XZ"), ("XI", "XI"), ("XX", "XX"),
    ("XY", "IY"), ("XZ", "IZ"), ("YI", "YX"), ("YX", "YI"), ("YY", "ZZ"),
    ("YZ", "ZY"), ("ZI", "ZX"), ("ZX", "ZI"), ("ZY", "YZ"), ("ZZ", "YY"),
];

/// XCY
const XCY_TABLE: TableauMap = &[
    ("IX", "XX"), ("IY", "IY"), ("IZ", "XZ"), ("XI", "XI"), ("XX", "IX"),
    ("XY", "XY"), ("XZ", "IZ"), ("YI", "YY"), ("YX", "ZZ"), ("YY", "YI"),
    ("YZ", "ZX"), ("ZI", "ZY"), ("ZX", "YZ"), ("ZY", "ZI"), ("ZZ", "YX"),
];

/// XCZ
const XCZ_TABLE: TableauMap = &[
    ("IX", "XX"), ("IY", "XY"), ("IZ", "IZ"), ("XI", "XI"), ("XX", "IX"),
    ("XY", "IY"), ("XZ", "XZ"), ("YI", "YZ"), ("YX", "ZY"), ("YY", "ZX"),
    ("YZ", "YI"), ("ZI", "ZZ"), ("ZX", "YY"), ("ZY", "YX"), ("ZZ", "ZI"),
];

/// YCX
const YCX_TABLE: TableauMap = &[
    ("IX", "IX"), ("IY", "YY"), ("IZ", "YZ"), ("XI", "XX"), ("XX", "XI"),
    ("XY", "ZZ"), ("XZ", "ZY"), ("YI", "YI"), ("YX", "YX"), ("YY", "IY"),
    ("YZ", "IZ"), ("ZI", "ZX"), ("ZX", "ZI"), ("ZY", "XZ"), ("ZZ", "XY"),
];

/// YCY
const YCY_TABLE: TableauMap = &[
    ("IX", "YX"), ("IY", "IY"), ("IZ", "YZ"), ("XI", "XY"), ("XX", "ZZ"),
    ("XY", "XI"), ("XZ", "ZX"), ("YI", "YI"), ("YX", "IX"), ("YY", "YY"),
    ("YZ", "IZ"), ("ZI", "ZY"), ("ZX", "XZ"), ("ZY", "ZI"), ("ZZ", "XX"),
];

/// YCZ
const YCZ_TABLE: TableauMap = &[
    ("IX", "YX"), ("IY", "YY"), ("IZ", "IZ"), ("XI", "XZ"), ("XX", "ZY"),
    ("XY", "ZX"), ("XZ", "XI"), ("YI", "YI"), ("YX", "IX"), ("YY", "IY"),
    ("YZ", "YZ"), ("ZI", "ZZ"), ("ZX", "XY"), ("ZY", "XX"), ("ZZ", "ZI"),
];

/// SWAP
const SWAP_TABLE: TableauMap = &[
    ("IX", "XI"), ("IY", "YI"), ("IZ", "ZI"), ("XI", "IX"), ("XX", "XX"),
    ("XY", "YX"), ("XZ", "ZX"), ("YI", "IY"), ("YX", "XY"), ("YY", "YY"),
    ("YZ", "ZY"), ("ZI", "IZ"), ("ZX", "XZ"), ("ZY", "YZ"), ("ZZ", "ZZ"),
];

/// ISWAP and ISWAP_DAG
const ISWAP_TABLE: TableauMap = &[
    ("IX", "YZ"), ("IY", "XZ"), ("IZ", "ZI"), ("XI", "ZY"), ("XX", "XX"),
    ("XY", "YX"), ("XZ", "IY"), ("YI", "ZX"), ("YX", "XY"), ("YY", "YY"),
    ("YZ", "IX"), ("ZI", "IZ"), ("ZX", "YI"), ("ZY", "XI"), ("ZZ", "ZZ"),
];

/// CXSWAP
const CXSWAP_TABLE: TableauMap = &[
    ("IX", "XI"), ("IY", "YZ"), ("IZ", "ZZ"), ("XI", "XX"), ("XX", "IX"),
    ("XY", "ZY"), ("XZ", "YY"), ("YI", "XY"), ("YX", "IY"), ("YY", "ZX"),
    ("YZ", "YX"), ("ZI", "IZ"), ("ZX", "XZ"), ("ZY", "YI"), ("ZZ", "ZI"),
];

/// SWAPCX
const SWAPCX_TABLE: TableauMap = &[
    ("IX", "XX"), ("IY", "YX"), ("IZ", "ZI"), ("XI", "IX"), ("XX", "XI"),
    ("XY", "YI"), ("XZ", "ZX"), ("YI", "ZY"), ("YX", "YZ"), ("YY", "XZ"),
    ("YZ", "IY"), ("ZI", "ZZ"), ("ZX", "YY"), ("ZY", "XY"), ("ZZ", "IZ"),
];

/// CZSWAP
const CZSWAP_TABLE: TableauMap = &[
    ("IX", "XZ"), ("IY", "YZ"), ("IZ", "ZI"), ("XI", "ZX"), ("XX", "YY"),
    ("XY", "XY"), ("XZ", "IX"), ("YI", "ZY"), ("YX", "YX"), ("YY", "XX"),
    ("YZ", "IY"), ("ZI", "IZ"), ("ZX", "XI"), ("ZY", "YI"), ("ZZ", "ZZ"),
];

/// SQRT_XX and SQRT_XX_DAG
const SQRT_XX_TABLE: TableauMap = &[
    ("IX", "IX"), ("IY", "XZ"), ("IZ", "XY"), ("XI", "XI"), ("XX", "XX"),
    ("XY", "IZ"), ("XZ", "IY"), ("YI", "ZX"), ("YX", "ZI"), ("YY", "YY"),
    ("YZ", "YZ"), ("ZI", "YX"), ("ZX", "YI"), ("ZY", "ZY"), ("ZZ", "ZZ"),
];

/// SQRT_YY and SQRT_YY_DAG
const SQRT_YY_TABLE: TableauMap = &[
    ("IX", "YZ"), ("IY", "IY"), ("IZ", "YX"), ("XI", "ZY"), ("XX", "XX"),
    ("XY", "ZI"), ("XZ", "XZ"), ("YI", "YI"), ("YX", "IZ"), ("YY", "YY"),
    ("YZ", "IX"), ("ZI", "XY"), ("ZX", "ZX"), ("ZY", "XI"), ("ZZ", "ZZ"),
];

/// SQRT_ZZ and SQRT_ZZ_DAG
const SQRT_ZZ_TABLE: TableauMap = &[
    ("IX", "ZY"), ("IY", "ZX"), ("IZ", "IZ"), ("XI", "YZ"), ("XX", "XX"),
    ("XY", "XY"), ("XZ", "YI"), ("YI", "XZ"), ("YX", "YX"), ("YY", "YY"),
    ("YZ", "XI"), ("ZI", "ZI"), ("ZX", "IY"), ("ZY", "IX"), ("ZZ", "ZZ"),
];

/// Pair measurement MXX
const MEASURE_XX_TABLE: TableauMap = &[
    ("IX", "IX"), ("IY", "ERR:IY"), ("IZ", "ERR:IZ"), ("XI", "XI"), ("XX", "XX"),
    ("XY", "ERR:XY"), ("XZ", "ERR:XZ"), ("YI", "ERR:YI"), ("YX", "ERR:YX"), ("YY", "YY"),
    ("YZ", "YZ"), ("ZI", "ERR:ZI"), ("ZX", "ERR:ZX"), ("ZY", "ZY"), ("ZZ", "ZZ"),
];

/// Pair measurement MYY
const MEASURE_YY_TABLE: TableauMap = &[
    ("IX", "ERR:IX"), ("IY", "IY"), ("IZ", "ERR:IZ"), ("XI", "ERR:XI"), ("XX", "XX"),
    ("XY", "ERR:XY"), ("XZ", "XZ"), ("YI", "YI"), ("YX", "ERR:YX"), ("YY", "YY"),
    ("YZ", "ERR:YZ"), ("ZI", "ERR:ZI"), ("ZX", "ZX"), ("ZY", "ERR:ZY"), ("ZZ", "ZZ"),
];

/// Pair measurement MZZ
const MEASURE_ZZ_TABLE: TableauMap = &[
    ("IX", "ERR:IX"), ("IY", "ERR:IY"), ("IZ", "IZ"), ("XI", "ERR:XI"), ("XX", "XX"),
    ("XY", "XY"), ("XZ", "ERR:XZ"), ("YI", "ERR:YI"), ("YX", "YX"), ("YY", "YY"),
    ("YZ", "ERR:YZ"), ("ZI", "ZI"), ("ZX", "ERR:ZX"), ("ZY", "ERR:ZY"), ("ZZ", "ZZ"),
];

// ============================================================================
// Gate Families
// ============================================================================

fn one(name: &str, table: TableauMap, rule: FrameRule) -> Gate {
    Gate::new(name, Some(1), true, Some(table), rule)
}

fn two(name: &str, table: TableauMap, rule: FrameRule) -> Gate {
    Gate::new(name, Some(2), true, Some(table), rule)
}

/// Pauli gates and the identity
fn half_turns() -> Vec<Gate> {
    ["I", "X", "Y", "Z"]
        .iter()
        .map(|name| one(name, IDENTITY_TABLE, FrameRule::Identity))
        .collect()
}

/// Hadamard-like involutions
fn hadamard_likes() -> Vec<Gate> {
    vec![
        one("H", EXCHANGE_XZ_TABLE, FrameRule::ExchangeXZ),
        one("H_NXZ", EXCHANGE_XZ_TABLE, FrameRule::ExchangeXZ),
        one("H_XY", EXCHANGE_XY_TABLE, FrameRule::ExchangeXY),
        one("H_NXY", EXCHANGE_XY_TABLE, FrameRule::ExchangeXY),
        one("H_YZ", EXCHANGE_YZ_TABLE, FrameRule::ExchangeYZ),
        one("H_NYZ", EXCHANGE_YZ_TABLE, FrameRule::ExchangeYZ),
    ]
}

/// √Pauli rotations (same frame action as the matching Hadamard-like)
fn quarter_turns() -> Vec<Gate> {
    vec![
        one("S", EXCHANGE_XY_TABLE, FrameRule::ExchangeXY),
        one("S_DAG", EXCHANGE_XY_TABLE, FrameRule::ExchangeXY),
        one("SQRT_X", EXCHANGE_YZ_TABLE, FrameRule::ExchangeYZ),
        one("SQRT_X_DAG", EXCHANGE_YZ_TABLE, FrameRule::ExchangeYZ),
        one("SQRT_Y", EXCHANGE_XZ_TABLE, FrameRule::ExchangeXZ),
        one("SQRT_Y_DAG", EXCHANGE_XZ_TABLE, FrameRule::ExchangeXZ),
    ]
}

/// Axis cycles
fn third_turns() -> Vec<Gate> {
    let forward = ["C_XYZ", "C_NXYZ", "C_XNYZ", "C_XYNZ"]
        .iter()
        .map(|name| one(name, CYCLE_XYZ_TABLE, FrameRule::CycleXYZ));
    let backward = ["C_ZYX", "C_NZYX", "C_ZNYX", "C_ZYNX"]
        .iter()
        .map(|name| one(name, CYCLE_ZYX_TABLE, FrameRule::CycleZYX));
    forward.chain(backward).collect()
}

fn controlled_paulis() -> Vec<Gate> {
    vec![
        two("CX", CX_TABLE, FrameRule::Cx),
        two("CY", CY_TABLE, FrameRule::Cy),
        two("CZ", CZ_TABLE, FrameRule::Cz),
        two("XCX", XCX_TABLE, FrameRule::Xcx),
        two("XCY", XCY_TABLE, FrameRule::Xcy),
        two("XCZ", XCZ_TABLE, FrameRule::Xcz),
        two("YCX", YCX_TABLE, FrameRule::Ycx),
        two("YCY", YCY_TABLE, FrameRule::Ycy),
        two("YCZ", YCZ_TABLE, FrameRule::Ycz),
    ]
}

fn swaps() -> Vec<Gate> {
    vec![
        two("SWAP", SWAP_TABLE, FrameRule::Swap),
        two("ISWAP", ISWAP_TABLE, FrameRule::ISwap),
        two("ISWAP_DAG", ISWAP_TABLE, FrameRule::ISwap),
        two("CXSWAP", CXSWAP_TABLE, FrameRule::CxSwap),
        two("SWAPCX", SWAPCX_TABLE, FrameRule::SwapCx),
        two("CZSWAP", CZSWAP_TABLE, FrameRule::CzSwap),
    ]
}

fn sqrt_pauli_pairs() -> Vec<Gate> {
    [
        (Basis::X, SQRT_XX_TABLE),
        (Basis::Y, SQRT_YY_TABLE),
        (Basis::Z, SQRT_ZZ_TABLE),
    ]
    .iter()
    .flat_map(|&(basis, table)| {
        let name = format!("SQRT_{0}{0}", basis);
        [
            two(&name, table, FrameRule::SqrtPair(basis)),
            two(&format!("{}_DAG", name), table, FrameRule::SqrtPair(basis)),
        ]
    })
    .collect()
}

fn resets() -> Vec<Gate> {
    vec![
        one("R", RESET_TABLE, FrameRule::Reset(Basis::Z)),
        one("RX", RESET_TABLE, FrameRule::Reset(Basis::X)),
        one("RY", RESET_TABLE, FrameRule::Reset(Basis::Y)),
    ]
}

fn solo_measurements() -> Vec<Gate> {
    vec![
        one("M", MEASURE_Z_TABLE, FrameRule::Measure(Basis::Z)),
        one("MX", MEASURE_X_TABLE, FrameRule::Measure(Basis::X)),
        one("MY", MEASURE_Y_TABLE, FrameRule::Measure(Basis::Y)),
    ]
}

fn pair_measurements() -> Vec<Gate> {
    [
        ("MXX", Basis::X, MEASURE_XX_TABLE),
        ("MYY", Basis::Y, MEASURE_YY_TABLE),
        ("MZZ", Basis::Z, MEASURE_ZZ_TABLE),
    ]
    .iter()
    .map(|&(name, basis, table)| {
        two(
            name,
            table,
            FrameRule::MeasureProduct(BasisString::uniform(basis, 2)),
        )
    })
    .collect()
}

fn demolition_measurements() -> Vec<Gate> {
    vec![
        one("MR", RESET_TABLE, FrameRule::DemolitionMeasure(Basis::Z)),
        one("MRX", RESET_TABLE, FrameRule::DemolitionMeasure(Basis::X)),
        one("MRY", RESET_TABLE, FrameRule::DemolitionMeasure(Basis::Y)),
    ]
}

fn marker_gates() -> Vec<Gate> {
    vec![
        Gate::marker(markers::MARKX, Some(1)).with_default_argument(0.0),
        Gate::marker(markers::MARKY, Some(1)).with_default_argument(0.0),
        Gate::marker(markers::MARKZ, Some(1)).with_default_argument(0.0),
        Gate::marker(markers::DETECTOR, Some(1)),
        Gate::marker(markers::OBSERVABLE_INCLUDE, Some(1)),
        Gate::marker(markers::POLYGON, None),
    ]
}

// ============================================================================
// Registry
// ============================================================================

/// Name → gate, built on first use
/// Gantree: GATE_TABLE: Lazy<HashMap<String, Arc<Gate>>> // 전역 게이트 표
static GATE_TABLE: Lazy<HashMap<String, Arc<Gate>>> = Lazy::new(|| {
    let families = [
        half_turns(),
        hadamard_likes(),
        quarter_turns(),
        third_turns(),
        controlled_paulis(),
        swaps(),
        sqrt_pauli_pairs(),
        resets(),
        solo_measurements(),
        pair_measurements(),
        demolition_measurements(),
        marker_gates(),
    ];
    families
        .into_iter()
        .flatten()
        .map(|gate| (gate.name.clone(), Arc::new(gate)))
        .collect()
});

/// Pauli-product measurement over `bases` (named `MPP:<bases>`)
/// Gantree: make_mpp_gate(&BasisString) -> Gate // MPP 합성
pub fn make_mpp_gate(bases: &BasisString) -> Gate {
    Gate::new(
        format!("{}{}", MPP_PREFIX, bases),
        None,
        false,
        None,
        FrameRule::MeasureProduct(bases.clone()),
    )
}

/// Pauli-product rotation over `bases` (named `SPP:<bases>` or `SPP_DAG:<bases>`)
pub fn make_spp_gate(bases: &BasisString, dagger: bool) -> Gate {
    let prefix = if dagger { SPP_DAG_PREFIX } else { SPP_PREFIX };
    Gate::new(
        format!("{}{}", prefix, bases),
        None,
        false,
        None,
        FrameRule::PauliProductRotation(bases.clone()),
    )
}

fn parse_product(text: &str) -> Option<BasisString> {
    if text.is_empty() {
        return None;
    }
    BasisString::parse(text).ok()
}

/// Look up a gate by exact name
/// Gantree: lookup(name) -> Option<Arc<Gate>> // 조회
///
/// Static names win; `MPP:<bases>`, `M<bases>`, `SPP:<bases>` and
/// `SPP_DAG:<bases>` are synthesized.
pub fn lookup(name: &str) -> Option<Arc<Gate>> {
    if let Some(gate) = GATE_TABLE.get(name) {
        return Some(Arc::clone(gate));
    }
    if let Some(rest) = name.strip_prefix(MPP_PREFIX) {
        return parse_product(rest).map(|b| Arc::new(make_mpp_gate(&b)));
    }
    if let Some(rest) = name.strip_prefix(SPP_DAG_PREFIX) {
        return parse_product(rest).map(|b| Arc::new(make_spp_gate(&b, true)));
    }
    if let Some(rest) = name.strip_prefix(SPP_PREFIX) {
        return parse_product(rest).map(|b| Arc::new(make_spp_gate(&b, false)));
    }
    if let Some(rest) = name.strip_prefix('M') {
        return parse_product(rest).map(|b| Arc::new(make_mpp_gate(&b)));
    }
    None
}

/// Like [`lookup`], failing with [`CrumbleError::UnknownGate`]
pub fn lookup_or_err(name: &str) -> CrumbleResult<Arc<Gate>> {
    lookup(name).ok_or_else(|| CrumbleError::UnknownGate(name.to_string()))
}

/// Every statically registered gate, sorted by name
pub fn all_gates() -> Vec<Arc<Gate>> {
    let mut gates: Vec<Arc<Gate>> = GATE_TABLE.values().cloned().collect();
    gates.sort_by(|a, b| a.name.cmp(&b.name));
    gates
}

// ============================================================================
// Tests
// ============================================================================
