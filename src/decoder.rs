//! Table-driven quadrature decoding for the panel's rotary encoders.
//!
//! Each encoder produces two phase-shifted active-low signals. The decoder
//! walks a fixed transition table keyed by (current phase, 2-bit sample) in
//! which only the two transitions that complete a full Gray-code cycle emit
//! a detent. Contact bounce shows up as an out-of-sequence sample and lands
//! on a non-emitting phase, so no debounce timing is needed on these lines.

use strum_macros::EnumIter;

/// Rotation sense of one completed detent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// Where in the four-sample quadrature cycle the encoder last was.
///
/// `Rest` is both lines high (idle at a detent). The `Cw*`/`Ccw*` phases
/// track progress through a clockwise or counter-clockwise cycle; leaving
/// the expected sequence drops back towards `Rest` without emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
enum Phase {
    Rest,
    CwFinal,
    CwBegin,
    CwNext,
    CcwBegin,
    CcwFinal,
    CcwNext,
}

/// One transition table entry: the validated next phase plus the detent this
/// sample completed, if any.
#[derive(Clone, Copy)]
struct Step {
    next: Phase,
    detent: Option<Direction>,
}

const fn go(next: Phase) -> Step {
    Step { next, detent: None }
}

const fn emit(next: Phase, direction: Direction) -> Step {
    Step {
        next,
        detent: Some(direction),
    }
}

/// Indexed by `[phase][pattern]` with `pattern = (a << 1) | b` built from the
/// raw line levels. Exactly two entries emit: completing a clockwise cycle
/// (11 -> 01 -> 00 -> 10 -> 11) or a counter-clockwise one
/// (11 -> 10 -> 00 -> 01 -> 11).
static TRANSITIONS: [[Step; 4]; 7] = [
    // Rest
    [
        go(Phase::Rest),
        go(Phase::CwBegin),
        go(Phase::CcwBegin),
        go(Phase::Rest),
    ],
    // CwFinal
    [
        go(Phase::CwNext),
        go(Phase::Rest),
        go(Phase::CwFinal),
        emit(Phase::Rest, Direction::Clockwise),
    ],
    // CwBegin
    [
        go(Phase::CwNext),
        go(Phase::CwBegin),
        go(Phase::Rest),
        go(Phase::Rest),
    ],
    // CwNext
    [
        go(Phase::CwNext),
        go(Phase::CwBegin),
        go(Phase::CwFinal),
        go(Phase::Rest),
    ],
    // CcwBegin
    [
        go(Phase::CcwNext),
        go(Phase::Rest),
        go(Phase::CcwBegin),
        go(Phase::Rest),
    ],
    // CcwFinal
    [
        go(Phase::CcwNext),
        go(Phase::CcwFinal),
        go(Phase::Rest),
        emit(Phase::Rest, Direction::CounterClockwise),
    ],
    // CcwNext
    [
        go(Phase::CcwNext),
        go(Phase::CcwFinal),
        go(Phase::CcwBegin),
        go(Phase::Rest),
    ],
];

/// Quadrature state machine for one encoder.
///
/// `sample` is fed from the 1 ms timer interrupt; it is O(1), never blocks
/// and never allocates.
pub struct QuadratureDecoder {
    phase: Phase,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self { phase: Phase::Rest }
    }

    /// Feed one sample of the two encoder lines (electrical levels, idle
    /// high). Returns the detent this sample completed, if any.
    pub fn sample(&mut self, a: bool, b: bool) -> Option<Direction> {
        let pattern = ((a as usize) << 1) | b as usize;
        let Step { next, detent } = TRANSITIONS[self.phase as usize][pattern];
        self.phase = next;
        detent
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}
