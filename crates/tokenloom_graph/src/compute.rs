// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-kind value computation.
//!
//! Each function is pure over a node's controls and its resolved inputs.
//! An input that is not wired (or whose source yields nothing usable)
//! falls back to a kind-specific default, so partially wired nodes still
//! produce a value. Sinks return `None` when their input is empty.

use crate::color::{format_hex, mix_channels, parse_hex, sample_scale, Rgb};
use crate::node::Controls;
use crate::value::TokenValue;
use indexmap::IndexMap;
use std::ops::RangeInclusive;

/// Signature shared by every kind's computation
pub type ComputeFn = fn(&Controls, &ResolvedInputs) -> Option<TokenValue>;

/// Weight of input A when mixing colors
pub const MIX_WEIGHT: f64 = 0.5;

/// Substitute for an unwired `A` input of a mix node
pub const MIX_DEFAULT_A: [u8; 3] = [0x00, 0x00, 0x00];

/// Substitute for an unwired `B` input of a mix node
pub const MIX_DEFAULT_B: [u8; 3] = [0xff, 0xff, 0xff];

/// Base color of a palette whose `color` input is unwired
pub const PALETTE_DEFAULT_BASE: &str = "#3b82f6";

/// Allowed palette lengths
pub const PALETTE_STEPS: RangeInclusive<usize> = 3..=10;

/// Allowed type scale lengths
pub const SCALE_STEPS: RangeInclusive<usize> = 1..=12;

/// Values arriving at a node's input sockets for one evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedInputs(IndexMap<&'static str, TokenValue>);

impl ResolvedInputs {
    /// Create an empty set (nothing wired)
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value for an input socket
    pub fn insert(&mut self, socket: &'static str, value: TokenValue) {
        self.0.insert(socket, value);
    }

    /// Builder-style insert
    pub fn with(mut self, socket: &'static str, value: TokenValue) -> Self {
        self.insert(socket, value);
        self
    }

    /// Value for an input socket, if it resolved
    pub fn get(&self, socket: &str) -> Option<&TokenValue> {
        self.0.get(socket)
    }

    /// Color arriving at a socket, if it resolved to a parsable color
    fn color(&self, socket: &str) -> Option<[u8; 3]> {
        self.get(socket).and_then(TokenValue::as_color).and_then(parse_hex)
    }
}

/// Clamp a numeric control to a whole count in `range`
fn step_count(controls: &Controls, fallback: usize, range: RangeInclusive<usize>) -> usize {
    let raw = controls.number("steps").unwrap_or(fallback as f64);
    let (lo, hi) = (*range.start() as f64, *range.end() as f64);
    raw.round().clamp(lo, hi) as usize
}

/// JavaScript-style rounding (half towards positive infinity)
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

pub(crate) fn color_input(controls: &Controls, _inputs: &ResolvedInputs) -> Option<TokenValue> {
    controls
        .text("color")
        .map(|hex| TokenValue::Color(hex.to_string()))
}

pub(crate) fn number_input(controls: &Controls, _inputs: &ResolvedInputs) -> Option<TokenValue> {
    let value = controls.number("value")?;
    let unit = controls.text("unit").unwrap_or_default();
    Some(TokenValue::dimension(value, unit))
}

pub(crate) fn font_input(controls: &Controls, _inputs: &ResolvedInputs) -> Option<TokenValue> {
    controls
        .text("font")
        .map(|family| TokenValue::Font(family.to_string()))
}

pub(crate) fn mix_colors(_controls: &Controls, inputs: &ResolvedInputs) -> Option<TokenValue> {
    let a = inputs.color("A").unwrap_or(MIX_DEFAULT_A);
    let b = inputs.color("B").unwrap_or(MIX_DEFAULT_B);
    Some(TokenValue::Color(format_hex(mix_channels(a, b, MIX_WEIGHT))))
}

/// Ramp positions sampled for a palette of `steps` colors
///
/// Positions run from 0.1 to 0.9 so the ramp never reaches pure white or black.
pub fn palette_positions(steps: usize) -> Vec<f64> {
    let steps = steps.clamp(*PALETTE_STEPS.start(), *PALETTE_STEPS.end());
    (0..steps)
        .map(|i| 0.1 + (i as f64 / (steps - 1) as f64) * 0.8)
        .collect()
}

pub(crate) fn palette_generator(
    controls: &Controls,
    inputs: &ResolvedInputs,
) -> Option<TokenValue> {
    let base = inputs
        .color("color")
        .map(Rgb::from_bytes)
        .or_else(|| Rgb::from_hex(PALETTE_DEFAULT_BASE))?;
    let space = controls.color_space();
    let steps = step_count(controls, 5, PALETTE_STEPS);

    let stops = [Rgb::WHITE, base, Rgb::BLACK];
    let swatches = palette_positions(steps)
        .into_iter()
        .map(|t| sample_scale(&stops, t, space).to_hex())
        .collect();
    Some(TokenValue::List(swatches))
}

/// Font sizes `round(base * ratio^i)` for `i` in `0..steps`
pub fn type_scale(base: f64, ratio: f64, steps: usize) -> Vec<f64> {
    (0..steps)
        .map(|i| round_half_up(base * ratio.powi(i as i32)))
        .collect()
}

pub(crate) fn type_scale_generator(
    controls: &Controls,
    inputs: &ResolvedInputs,
) -> Option<TokenValue> {
    let base = inputs
        .get("base")
        .and_then(TokenValue::as_number)
        .or_else(|| controls.number("base_size"))
        .unwrap_or(16.0);
    let ratio = controls
        .text("ratio")
        .and_then(|r| r.parse::<f64>().ok())
        .unwrap_or(1.25);
    let steps = step_count(controls, 5, SCALE_STEPS);

    let sizes = type_scale(base, ratio, steps)
        .into_iter()
        .map(|size| format!("{size}px"))
        .collect();
    Some(TokenValue::List(sizes))
}

pub(crate) fn output_token(_controls: &Controls, inputs: &ResolvedInputs) -> Option<TokenValue> {
    inputs.get("value").cloned()
}

pub(crate) fn export_sink(_controls: &Controls, inputs: &ResolvedInputs) -> Option<TokenValue> {
    inputs.get("data").cloned()
}
