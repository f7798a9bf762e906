//! Circuit text reader and writer
//!
//! Gantree: L1_Circuit → StimText
//!
//! Line-oriented reader for the subset of the stim circuit format the editor
//! works with, and the matching writer. Noise channels are skipped,
//! `REPEAT` blocks are unrolled and `DETECTOR` / `OBSERVABLE_INCLUDE`
//! record references become markers placed at the measurements they name.

use crate::circuit::Circuit;
use crate::constants::markers;
use crate::constants::text::{
    MAX_QUBIT_ID, MAX_UNROLLED_INSTRUCTIONS, MPP_PREFIX, SPP_DAG_PREFIX, SPP_PREFIX,
};
use crate::error::{CrumbleError, CrumbleResult};
use crate::gate::Gate;
use crate::gate_table;
use crate::operation::Operation;
use crate::types::{Basis, BasisString, Coord, QubitId};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Gate spellings accepted on input, mapped to their registered name
const ALIASES: &[(&str, &str)] = &[
    ("CNOT", "CX"),
    ("ZCX", "CX"),
    ("ZCY", "CY"),
    ("ZCZ", "CZ"),
    ("MZ", "M"),
    ("RZ", "R"),
    ("MRZ", "MR"),
    ("H_XZ", "H"),
    ("SQRT_Z", "S"),
    ("SQRT_Z_DAG", "S_DAG"),
    ("SWAPCZ", "CZSWAP"),
];

/// Noise channels; they have no effect on Pauli frame propagation
const NOISE_CHANNELS: &[&str] = &[
    "DEPOLARIZE1",
    "DEPOLARIZE2",
    "X_ERROR",
    "Y_ERROR",
    "Z_ERROR",
    "PAULI_CHANNEL_1",
    "PAULI_CHANNEL_2",
    "E",
    "CORRELATED_ERROR",
    "ELSE_CORRELATED_ERROR",
];

/// Noise channels that also write measurement results
const HERALDED_CHANNELS: &[&str] = &["HERALDED_ERASE", "HERALDED_PAULI_CHANNEL_1"];

// ============================================================================
// Instruction Parsing
// ============================================================================

/// One parsed target token
#[derive(Debug, Clone, PartialEq)]
enum Target {
    /// Plain qubit (measurement inversion `!` dropped)
    Qubit(QubitId),
    /// `X3`, or a `*`-joined product such as `X0*Z1`
    Product(Vec<(Basis, QubitId)>),
    /// `rec[-k]`
    Rec(i64),
    /// `sweep[k]`
    Sweep,
}

/// One instruction line after unrolling
#[derive(Debug, Clone)]
struct Instruction {
    line: usize,
    name: String,
    args: Vec<f64>,
    targets: Vec<Target>,
}

fn parse_error(line: usize, message: impl Into<String>) -> CrumbleError {
    CrumbleError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_qubit(text: &str, line: usize) -> CrumbleResult<QubitId> {
    let qubit: QubitId = text
        .parse()
        .map_err(|_| parse_error(line, format!("bad qubit target '{}'", text)))?;
    if qubit > MAX_QUBIT_ID {
        return Err(parse_error(
            line,
            format!("qubit {} exceeds the limit of {}", qubit, MAX_QUBIT_ID),
        ));
    }
    Ok(qubit)
}

fn parse_target(token: &str, line: usize) -> CrumbleResult<Target> {
    let token = token.trim_start_matches('!');
    if let Some(inner) = token.strip_prefix("rec[").and_then(|t| t.strip_suffix(']')) {
        let offset: i64 = inner
            .parse()
            .map_err(|_| parse_error(line, format!("bad record target '{}'", token)))?;
        if offset >= 0 {
            return Err(parse_error(line, format!("record target '{}' must be negative", token)));
        }
        return Ok(Target::Rec(offset));
    }
    if token.starts_with("sweep[") {
        return Ok(Target::Sweep);
    }
    if token.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(Target::Qubit(parse_qubit(token, line)?));
    }
    let mut factors = Vec::new();
    for factor in token.split('*') {
        let factor = factor.trim_start_matches('!');
        let mut chars = factor.chars();
        let basis = chars
            .next()
            .ok_or_else(|| parse_error(line, format!("empty product factor in '{}'", token)))
            .and_then(|c| Basis::from_char(c).map_err(|e| e.at_line(line)))?;
        factors.push((basis, parse_qubit(chars.as_str(), line)?));
    }
    Ok(Target::Product(factors))
}

/// Split target text into tokens, gluing `X0 * Z1` into `X0*Z1`
fn tokenize_targets(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut glue = false;
    for raw in text.split_whitespace() {
        match tokens.last_mut() {
            Some(last) if glue || raw.starts_with('*') => {
                last.push_str(raw);
            }
            _ => tokens.push(raw.to_string()),
        }
        glue = raw.ends_with('*');
    }
    tokens
}

fn parse_instruction(line: usize, text: &str) -> CrumbleResult<Instruction> {
    let name_end = text
        .find(|c: char| c == '(' || c.is_whitespace())
        .unwrap_or(text.len());
    let name = text[..name_end].to_ascii_uppercase();
    let mut rest = &text[name_end..];

    let mut args = Vec::new();
    if let Some(after_paren) = rest.trim_start().strip_prefix('(') {
        let close = after_paren
            .find(')')
            .ok_or_else(|| parse_error(line, "missing ')'"))?;
        for arg in after_paren[..close].split(',').map(str::trim).filter(|a| !a.is_empty()) {
            let value: f64 = arg
                .parse()
                .map_err(|_| parse_error(line, format!("bad argument '{}'", arg)))?;
            args.push(value);
        }
        rest = &after_paren[close + 1..];
    }

    let targets = tokenize_targets(rest)
        .iter()
        .map(|t| parse_target(t, line))
        .collect::<CrumbleResult<Vec<_>>>()?;
    Ok(Instruction {
        line,
        name,
        args,
        targets,
    })
}

/// Parse lines, unrolling `REPEAT n { ... }` blocks
fn parse_block(
    lines: &[(usize, &str)],
    pos: &mut usize,
    nested: bool,
    out: &mut Vec<Instruction>,
) -> CrumbleResult<()> {
    while *pos < lines.len() {
        let (line, text) = lines[*pos];
        *pos += 1;
        if text == "}" {
            if nested {
                return Ok(());
            }
            return Err(parse_error(line, "unmatched '}'"));
        }
        let upper = text.to_ascii_uppercase();
        if let Some(header) = upper.strip_prefix("REPEAT") {
            let count_text = header
                .trim()
                .strip_suffix('{')
                .map(str::trim)
                .ok_or_else(|| parse_error(line, "REPEAT must open a block with '{'"))?;
            let count: usize = count_text
                .parse()
                .map_err(|_| parse_error(line, format!("bad repeat count '{}'", count_text)))?;
            let mut body = Vec::new();
            parse_block(lines, pos, true, &mut body)?;
            let unrolled = count
                .checked_mul(body.len())
                .and_then(|n| n.checked_add(out.len()))
                .filter(|&n| n <= MAX_UNROLLED_INSTRUCTIONS);
            if unrolled.is_none() {
                return Err(parse_error(
                    line,
                    format!(
                        "REPEAT {} unrolls past {} instructions",
                        count, MAX_UNROLLED_INSTRUCTIONS
                    ),
                ));
            }
            for _ in 0..count {
                out.extend(body.iter().cloned());
            }
            continue;
        }
        out.push(parse_instruction(line, text)?);
    }
    if nested {
        let line = lines.last().map_or(0, |l| l.0);
        return Err(parse_error(line, "unterminated REPEAT block"));
    }
    Ok(())
}

// ============================================================================
// Reader
// ============================================================================

/// Mutable state while reading
struct Reader {
    circuit: Circuit,
    layer: usize,
    /// Per measurement result: layer and representative qubit (`None` for
    /// results that touch no qubit, such as MPAD)
    record: Vec<Option<(usize, QubitId)>>,
    next_detector: u32,
}

impl Reader {
    /// Insert, opening a new layer on collision
    fn put(&mut self, op: Operation) -> CrumbleResult<()> {
        match self.circuit.put_operation(self.layer, op.clone(), false) {
            Err(CrumbleError::Collision { qubit }) => {
                log::debug!(
                    "Collision on qubit {} in layer {}: starting layer {}",
                    qubit,
                    self.layer,
                    self.layer + 1
                );
                self.layer += 1;
                self.circuit.put_operation(self.layer, op, false)
            }
            other => other,
        }
    }

    fn put_measuring(&mut self, op: Operation) -> CrumbleResult<()> {
        let group = op.gate.group_size(op.id_targets.len()).max(1);
        let firsts: Vec<QubitId> = op.id_targets.chunks(group).map(|g| g[0]).collect();
        self.put(op)?;
        let layer = self.layer;
        self.record.extend(firsts.into_iter().map(|q| Some((layer, q))));
        Ok(())
    }

    fn qubits(inst: &Instruction) -> CrumbleResult<Vec<QubitId>> {
        inst.targets
            .iter()
            .map(|t| match t {
                Target::Qubit(q) => Ok(*q),
                Target::Rec(_) | Target::Sweep => Err(CrumbleError::Unsupported(format!(
                    "classically controlled {}",
                    inst.name
                ))),
                Target::Product(_) => Err(parse_error(
                    inst.line,
                    format!("{} takes qubit targets", inst.name),
                )),
            })
            .collect()
    }

    fn apply(&mut self, inst: &Instruction) -> CrumbleResult<()> {
        let name = inst.name.as_str();
        match name {
            "TICK" => {
                self.layer += 1;
                Ok(())
            }
            "QUBIT_COORDS" | "SHIFT_COORDS" => Ok(()),
            "MPAD" => {
                self.record.extend(inst.targets.iter().map(|_| None));
                Ok(())
            }
            _ if NOISE_CHANNELS.contains(&name) => {
                log::warn!("Line {}: skipping noise channel {}", inst.line, name);
                Ok(())
            }
            _ if HERALDED_CHANNELS.contains(&name) => {
                log::warn!("Line {}: skipping noise channel {}", inst.line, name);
                self.record.extend(inst.targets.iter().map(|_| None));
                Ok(())
            }
            markers::DETECTOR => {
                let index = self.next_detector;
                self.next_detector += 1;
                self.place_annotation(inst, markers::DETECTOR, index)
            }
            markers::OBSERVABLE_INCLUDE => {
                let index = inst
                    .args
                    .first()
                    .filter(|a| **a >= 0.0 && a.fract() == 0.0)
                    .ok_or_else(|| parse_error(inst.line, "OBSERVABLE_INCLUDE needs an index"))?;
                self.place_annotation(inst, markers::OBSERVABLE_INCLUDE, *index as u32)
            }
            "MPP" | "SPP" | "SPP_DAG" => self.apply_products(inst),
            _ => self.apply_gate(inst),
        }
    }

    fn place_annotation(&mut self, inst: &Instruction, name: &str, index: u32) -> CrumbleResult<()> {
        for target in &inst.targets {
            let offset = match target {
                Target::Rec(offset) => *offset,
                Target::Product(_) => {
                    return Err(CrumbleError::Unsupported(format!(
                        "Pauli targets in {}",
                        name
                    )))
                }
                _ => return Err(parse_error(inst.line, format!("{} takes rec[] targets", name))),
            };
            let position = self.record.len() as i64 + offset;
            if position < 0 {
                return Err(parse_error(
                    inst.line,
                    format!("rec[{}] refers before the first measurement", offset),
                ));
            }
            let Some((layer, qubit)) = self.record[position as usize] else {
                log::warn!("Line {}: {} rec[{}] names a result with no qubit", inst.line, name, offset);
                continue;
            };
            let marker = Operation::named(name, vec![index as f64], vec![qubit])?;
            self.circuit.put_operation(layer, marker, false)?;
        }
        Ok(())
    }

    fn apply_products(&mut self, inst: &Instruction) -> CrumbleResult<()> {
        for target in &inst.targets {
            let factors = match target {
                Target::Product(factors) => factors,
                _ => {
                    return Err(parse_error(
                        inst.line,
                        format!("{} takes Pauli product targets", inst.name),
                    ))
                }
            };
            let bases = BasisString::new(factors.iter().map(|(b, _)| *b).collect());
            let qubits: Vec<QubitId> = factors.iter().map(|(_, q)| *q).collect();
            let gate = match inst.name.as_str() {
                "MPP" => gate_table::make_mpp_gate(&bases),
                "SPP" => gate_table::make_spp_gate(&bases, false),
                _ => gate_table::make_spp_gate(&bases, true),
            };
            let op = Operation::new(Arc::new(gate), inst.args.clone(), qubits)?;
            if op.gate.is_measurement() {
                self.put_measuring(op)?;
            } else {
                self.put(op)?;
            }
        }
        Ok(())
    }

    fn apply_gate(&mut self, inst: &Instruction) -> CrumbleResult<()> {
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == inst.name)
            .map_or(inst.name.as_str(), |(_, name)| name);
        let gate = gate_table::lookup_or_err(canonical)?;
        let qubits = Self::qubits(inst)?;
        gate.check_targets(qubits.len())?;

        let group = gate.group_size(qubits.len()).max(1);
        for chunk in qubits.chunks(group) {
            let op = Operation::new(Arc::clone(&gate), inst.args.clone(), chunk.to_vec())?;
            if gate.is_marker {
                self.circuit.put_operation(self.layer, op, false)?;
            } else if gate.is_measurement() {
                self.put_measuring(op)?;
            } else {
                self.put(op)?;
            }
        }
        Ok(())
    }
}

/// Qubit ids referenced anywhere in the instructions
fn referenced_qubits(instructions: &[Instruction]) -> impl Iterator<Item = QubitId> + '_ {
    instructions.iter().flat_map(|inst| {
        inst.targets.iter().flat_map(|t| match t {
            Target::Qubit(q) => vec![*q],
            Target::Product(factors) => factors.iter().map(|(_, q)| *q).collect(),
            _ => Vec::new(),
        })
    })
}

/// Dense coordinate table: explicit `QUBIT_COORDS`, then auto-placement on row 0
fn resolve_coords(instructions: &[Instruction]) -> CrumbleResult<Vec<Coord>> {
    let mut explicit: BTreeMap<QubitId, Coord> = BTreeMap::new();
    for inst in instructions.iter().filter(|i| i.name == "QUBIT_COORDS") {
        if inst.args.len() < 2 {
            return Err(parse_error(inst.line, "QUBIT_COORDS needs two coordinates"));
        }
        let coord = Coord::new(inst.args[0], inst.args[1]);
        for target in &inst.targets {
            match target {
                Target::Qubit(q) => {
                    explicit.insert(*q, coord);
                }
                _ => return Err(parse_error(inst.line, "QUBIT_COORDS takes qubit targets")),
            }
        }
    }

    let num_qubits = referenced_qubits(instructions)
        .chain(explicit.keys().copied())
        .max()
        .map_or(0, |q| q + 1);
    let mut taken: HashSet<String> = explicit.values().map(|c| c.key()).collect();
    let mut coords = Vec::with_capacity(num_qubits);
    for q in 0..num_qubits {
        let coord = match explicit.get(&q) {
            Some(c) => *c,
            None => {
                let mut x = q;
                while taken.contains(&Coord::new(x as f64, 0.0).key()) {
                    x += 1;
                }
                let c = Coord::new(x as f64, 0.0);
                taken.insert(c.key());
                c
            }
        };
        coords.push(coord);
    }
    Ok(coords)
}

// ============================================================================
// Writer Helpers
// ============================================================================

fn format_args(args: &[f64]) -> String {
    if args.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// Text instruction name and product flag for a gate
fn text_name(gate: &Gate) -> (&str, bool) {
    for (prefix, name) in [
        (MPP_PREFIX, "MPP"),
        (SPP_DAG_PREFIX, "SPP_DAG"),
        (SPP_PREFIX, "SPP"),
    ] {
        if gate.name.starts_with(prefix) {
            return (name, true);
        }
    }
    (gate.name.as_str(), false)
}

fn product_token(op: &Operation) -> String {
    let bases = op.gate.name.split(':').nth(1).unwrap_or_default();
    bases
        .chars()
        .zip(&op.id_targets)
        .map(|(b, q)| format!("{}{}", b, q))
        .collect::<Vec<_>>()
        .join("*")
}

fn target_tokens(op: &Operation, product: bool) -> Vec<String> {
    if product {
        vec![product_token(op)]
    } else {
        op.id_targets.iter().map(|q| q.to_string()).collect()
    }
}

// ============================================================================
// Circuit Text I/O
// ============================================================================

impl Circuit {
    /// Read circuit text
    /// Gantree: from_stim(text) -> Result<Circuit> // 텍스트 읽기
    pub fn from_stim(text: &str) -> CrumbleResult<Circuit> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.split('#').next().unwrap_or_default().trim()))
            .filter(|(_, l)| !l.is_empty())
            .collect();
        let mut instructions = Vec::new();
        parse_block(&lines, &mut 0, false, &mut instructions)?;

        let coords = resolve_coords(&instructions)?;
        let mut reader = Reader {
            circuit: Circuit::with_qubits(coords)?,
            layer: 0,
            record: Vec::new(),
            next_detector: 0,
        };
        for inst in &instructions {
            reader.apply(inst).map_err(|e| e.at_line(inst.line))?;
        }
        log::debug!(
            "Read circuit: {} qubits, {} layers, {} measurements",
            reader.circuit.num_qubits(),
            reader.circuit.num_layers(),
            reader.record.len()
        );
        Ok(reader.circuit)
    }

    /// Write circuit text
    /// Gantree: to_stim() -> String // 텍스트 쓰기
    ///
    /// Consecutive operations of one fusable gate (or consecutive product
    /// measurements / rotations) share a line. Detectors and observables are
    /// written after the layer holding their latest measurement.
    pub fn to_stim(&self) -> String {
        let mut out: Vec<String> = self
            .qubit_coords()
            .iter()
            .enumerate()
            .map(|(q, c)| format!("QUBIT_COORDS({}, {}) {}", c.x, c.y, q))
            .collect();

        let sites = self.measurement_sites();
        let total = sites.len() as i64;
        let mut measured_through = vec![0i64; self.num_layers()];
        for site in &sites {
            measured_through[site.layer] += 1;
        }
        for k in 1..measured_through.len() {
            measured_through[k] += measured_through[k - 1];
        }

        let found = self.collect_detectors_and_observables(true);
        let mut annotations: Vec<Vec<String>> = vec![Vec::new(); self.num_layers()];
        let mut place = |mids: &[i64], head: String| {
            let Some(&latest) = mids.first() else {
                return;
            };
            let layer = sites[(total + latest) as usize].layer;
            let recs: Vec<String> = mids
                .iter()
                .rev()
                .map(|m| format!("rec[{}]", total + m - measured_through[layer]))
                .collect();
            annotations[layer].push(format!("{} {}", head, recs.join(" ")));
        };
        for d in &found.detectors {
            place(&d.mids, markers::DETECTOR.to_string());
        }
        for (index, mids) in &found.observables {
            place(mids, format!("{}({})", markers::OBSERVABLE_INCLUDE, index));
        }

        for (k, layer) in self.layers().iter().enumerate() {
            if k > 0 {
                out.push("TICK".to_string());
            }

            let mut current: Option<(String, Vec<String>)> = None;
            let mut previous: Option<&Operation> = None;
            for op in layer.iter_gates() {
                let (name, product) = text_name(&op.gate);
                let head = format!("{}{}", name, format_args(&op.args));
                let joins = previous.is_some_and(|p| {
                    let (p_name, p_product) = text_name(&p.gate);
                    if product {
                        p_product && p_name == name && p.args == op.args
                    } else {
                        p.fuses_with(op)
                    }
                });
                match current.as_mut() {
                    Some((_, targets)) if joins => targets.extend(target_tokens(op, product)),
                    _ => {
                        if let Some((h, t)) = current.take() {
                            out.push(format!("{} {}", h, t.join(" ")));
                        }
                        current = Some((head, target_tokens(op, product)));
                    }
                }
                previous = Some(op);
            }
            if let Some((h, t)) = current.take() {
                out.push(format!("{} {}", h, t.join(" ")));
            }

            for marker in layer.markers() {
                if marker.name() == markers::DETECTOR || marker.name() == markers::OBSERVABLE_INCLUDE {
                    continue;
                }
                out.push(marker.to_string());
            }
            out.append(&mut annotations[k]);
        }

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pauli;

    #[test]
    fn test_read_basic() {
        let c = Circuit::from_stim("H 0\nTICK\nCX 0 1\nTICK\nM 1\n").unwrap();
        assert_eq!(c.num_layers(), 3);
        assert_eq!(c.num_qubits(), 2);
        assert_eq!(c.layers()[1].get(1).map(|o| o.name()), Some("CX"));
        assert_eq!(c.qubit_coords()[1], Coord::new(1.0, 0.0));
    }

    #[test]
    fn test_read_aliases_and_case() {
        let c = Circuit::from_stim("cnot 0 1\nTICK\nmz 0\nsqrt_z 1").unwrap();
        assert_eq!(c.layers()[0].get(0).map(|o| o.name()), Some("CX"));
        assert_eq!(c.layers()[1].get(0).map(|o| o.name()), Some("M"));
        assert_eq!(c.layers()[1].get(1).map(|o| o.name()), Some("S"));
    }

    #[test]
    fn test_read_splits_fused_targets() {
        let c = Circuit::from_stim("CX 0 1 2 3").unwrap();
        let ops: Vec<_> = c.layers()[0].iter_gates().collect();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].id_targets, vec![2, 3]);
    }

    #[test]
    fn test_read_collision_opens_layer() {
        let c = Circuit::from_stim("H 0\nCX 0 1").unwrap();
        assert_eq!(c.num_layers(), 2);
        assert_eq!(c.layers()[1].get(1).map(|o| o.name()), Some("CX"));
    }

    #[test]
    fn test_read_coords_and_auto_placement() {
        let c = Circuit::from_stim("QUBIT_COORDS(1, 0) 0\nH 0 1 2").unwrap();
        assert_eq!(c.qubit_coords()[0], Coord::new(1.0, 0.0));
        // (1, 0) is taken, so qubit 1 moves right
        assert_eq!(c.qubit_coords()[1], Coord::new(2.0, 0.0));
        assert_eq!(c.qubit_coords()[2], Coord::new(3.0, 0.0));
    }

    #[test]
    fn test_read_comments_noise_and_repeat() {
        let text = "# header\nR 0\nX_ERROR(0.1) 0\nREPEAT 3 {\n  TICK\n  H 0 # flip\n}\n";
        let c = Circuit::from_stim(text).unwrap();
        assert_eq!(c.num_layers(), 4);
        assert!(c.layers().iter().skip(1).all(|l| l.get(0).is_some_and(|o| o.name() == "H")));
    }

    #[test]
    fn test_read_products() {
        let c = Circuit::from_stim("MPP X0*Z1 !Y2\nTICK\nSPP_DAG X0 * X1").unwrap();
        assert_eq!(c.count_measurements(), 2);
        assert_eq!(c.layers()[0].get(1).map(|o| o.name()), Some("MPP:XZ"));
        assert_eq!(c.layers()[0].get(2).map(|o| o.name()), Some("MPP:Y"));
        assert_eq!(c.layers()[1].get(1).map(|o| o.name()), Some("SPP_DAG:XX"));
    }

    #[test]
    fn test_read_detectors_become_markers() {
        let text = "M 0 1\nTICK\nM 0\nDETECTOR(1, 2) rec[-1] rec[-3]\nOBSERVABLE_INCLUDE(2) rec[-2]";
        let c = Circuit::from_stim(text).unwrap();
        let l0: Vec<String> = c.layers()[0].markers().iter().map(|m| m.to_string()).collect();
        let l1: Vec<String> = c.layers()[1].markers().iter().map(|m| m.to_string()).collect();
        assert_eq!(l0, vec!["DETECTOR(0) 0", "OBSERVABLE_INCLUDE(2) 1"]);
        assert_eq!(l1, vec!["DETECTOR(0) 0"]);
        let found = c.collect_detectors_and_observables(false);
        assert_eq!(found.detectors[0].mids, vec![-1, -3]);
        assert_eq!(found.observables.get(&2), Some(&vec![-2]));
    }

    #[test]
    fn test_read_markers() {
        let c = Circuit::from_stim("MARKX(1) 0\nMARKZ 1\nPOLYGON(1,0,0,0.5) 0 1").unwrap();
        let markers = c.layers()[0].markers();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].marker_pauli(), Some(Pauli::X));
        assert_eq!(markers[0].marker_index(), Some(1));
        assert_eq!(markers[1].marker_index(), Some(0));
    }

    #[test]
    fn test_read_errors() {
        let err = Circuit::from_stim("H 0\nFOO 1").unwrap_err();
        assert!(matches!(err, CrumbleError::Parse { line: 2, .. }));
        assert!(Circuit::from_stim("CX 0").is_err());
        assert!(Circuit::from_stim("CX rec[-1] 0").is_err());
        assert!(Circuit::from_stim("REPEAT 2 {\nH 0").is_err());
        assert!(Circuit::from_stim("H 0\n}").is_err());
        assert!(Circuit::from_stim("DETECTOR rec[-1]").is_err());
        let err = Circuit::from_stim("M 0\nOBSERVABLE_INCLUDE(0) X0").unwrap_err();
        assert!(err.to_string().contains("Pauli targets"));
    }

    #[test]
    fn test_write_fuses_and_ticks() {
        let c = Circuit::from_stim("CX 0 1 2 3\nTICK\nMPP X0*Z1 Y2\nMARKX(0) 3").unwrap();
        let text = c.to_stim();
        let lines: Vec<&str> = text.lines().filter(|l| !l.starts_with("QUBIT_COORDS")).collect();
        assert_eq!(lines, vec!["CX 0 1 2 3", "TICK", "MPP X0*Z1 Y2", "MARKX(0) 3"]);
    }

    #[test]
    fn test_write_detectors_relative_to_position() {
        let text = "M 0 1\nTICK\nM 0\nTICK\nH 1\nDETECTOR rec[-1] rec[-3]";
        let written = Circuit::from_stim(text).unwrap().to_stim();
        let lines: Vec<&str> = written.lines().filter(|l| !l.starts_with("QUBIT_COORDS")).collect();
        assert_eq!(lines, vec!["M 0 1", "TICK", "M 0", "DETECTOR rec[-3] rec[-1]", "TICK", "H 1"]);
    }

    #[test]
    fn test_roundtrip() {
        let text = "QUBIT_COORDS(0, 0) 0\nQUBIT_COORDS(1, 0) 1\nQUBIT_COORDS(0, 1) 2\n\
                    R 0 1 2\nMARKZ(0) 2\nTICK\nH 0\nTICK\nCX 0 1\nTICK\nM 1 2\n\
                    DETECTOR rec[-1]\nDETECTOR rec[-2] rec[-1]\nOBSERVABLE_INCLUDE(0) rec[-2]\n";
        let c = Circuit::from_stim(text).unwrap();
        let written = c.to_stim();
        let again = Circuit::from_stim(&written).unwrap();
        assert_eq!(again, c);
        assert_eq!(again.to_stim(), written);
    }

    #[test]
    fn test_read_rejects_oversized_input() {
        assert!(matches!(
            Circuit::from_stim("H 4000000000"),
            Err(CrumbleError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            Circuit::from_stim("R 0\nREPEAT 1000000000 {\nH 0\nTICK\n}"),
            Err(CrumbleError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            Circuit::from_stim("REPEAT 100000 {\nREPEAT 100000 {\nH 0\n}\n}"),
            Err(CrumbleError::Parse { line: 1, .. })
        ));
        // Within the limits
        let c = Circuit::from_stim("REPEAT 3 {\nH 0\nTICK\n}\nH 5").unwrap();
        assert_eq!(c.num_layers(), 4);
        assert_eq!(c.num_qubits(), 6);
    }
}
