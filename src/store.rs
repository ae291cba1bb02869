//! Shared live state between the tick interrupt and the foreground loop.
//!
//! The encoders are decoded inside a 1 kHz timer interrupt while the control
//! loop reads the results from the main context, so everything that crosses
//! that boundary lives behind one critical-section cell: the tick counter,
//! both setpoints, the step sizes, and the per-channel settle references.
//! Holding them in a single `Copy` struct means a setpoint is always
//! observed together with the tick at which it last changed.

use core::cell::Cell;

use critical_section::Mutex;

use crate::decoder::{Direction, QuadratureDecoder};
use crate::types::{Channel, Setpoints, StepSize};

/// Ticks an encoder must stay quiet before its changed setpoint is pushed
/// downstream. At the 1 ms tick period this is 400 ms.
pub const SETTLE_TICKS: u16 = 400;

/// Everything the interrupt and the foreground loop share. Copied in and
/// out of the cell whole, under a critical section.
#[derive(Clone, Copy)]
struct Shared {
    /// Millisecond tick. Wraps at the u16 width; consumers compare elapsed
    /// time with wrapping subtraction, never raw magnitudes.
    tick: u16,
    setpoints: Setpoints,
    volts_step: StepSize,
    amps_step: StepSize,
    /// Tick of the most recent detent, per channel.
    volts_touched: u16,
    amps_touched: u16,
}

/// A setpoint snapshot plus whether its encoder has been quiet long enough
/// for the value to be pushed, sampled in one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelReading {
    pub value: u16,
    pub settled: bool,
}

/// Live panel targets, shared between the tick interrupt (single writer via
/// [`EncoderScanner`]) and the foreground loop (reader, plus the rare
/// step-size toggle).
pub struct SetpointStore {
    shared: Mutex<Cell<Shared>>,
}

impl SetpointStore {
    pub const fn new() -> Self {
        Self {
            shared: Mutex::new(Cell::new(Shared {
                tick: 0,
                setpoints: Setpoints {
                    volts_mv: 0,
                    amps_ma: 0,
                },
                volts_step: StepSize::Unit,
                amps_step: StepSize::Unit,
                volts_touched: 0,
                amps_touched: 0,
            })),
        }
    }

    /// Replace both live values, e.g. with the module's reported state at
    /// startup. Resets the settle references so the seed itself does not
    /// register as encoder activity.
    pub fn seed(&self, setpoints: Setpoints) {
        self.update(|shared| {
            shared.setpoints = setpoints;
            shared.volts_touched = shared.tick;
            shared.amps_touched = shared.tick;
        });
    }

    /// Current tick count. Wraps; compare with `wrapping_sub`.
    pub fn tick(&self) -> u16 {
        self.snapshot().tick
    }

    /// Both live setpoints.
    pub fn setpoints(&self) -> Setpoints {
        self.snapshot().setpoints
    }

    /// Step size currently applied per detent on `channel`.
    pub fn step_size(&self, channel: Channel) -> StepSize {
        let shared = self.snapshot();
        match channel {
            Channel::Voltage => shared.volts_step,
            Channel::Current => shared.amps_step,
        }
    }

    /// Flip `channel` between fine and coarse adjustment.
    pub fn toggle_step_size(&self, channel: Channel) {
        self.update(|shared| match channel {
            Channel::Voltage => shared.volts_step = shared.volts_step.toggled(),
            Channel::Current => shared.amps_step = shared.amps_step.toggled(),
        });
    }

    /// Value and quiet-window state for `channel`, taken together so a fresh
    /// value can never be paired with a stale settle reference.
    pub fn read_channel(&self, channel: Channel) -> ChannelReading {
        let shared = self.snapshot();
        let (value, touched) = match channel {
            Channel::Voltage => (shared.setpoints.volts_mv, shared.volts_touched),
            Channel::Current => (shared.setpoints.amps_ma, shared.amps_touched),
        };
        ChannelReading {
            value,
            settled: shared.tick.wrapping_sub(touched) >= SETTLE_TICKS,
        }
    }

    /// One tick's worth of updates from the interrupt: apply any completed
    /// detents, then advance the counter. Runs inside a single critical
    /// section.
    pub(crate) fn tick_update(&self, volts: Option<Direction>, amps: Option<Direction>) {
        self.update(|shared| {
            if let Some(direction) = volts {
                let step = shared.volts_step.amount();
                shared.setpoints.volts_mv = stepped(
                    shared.setpoints.volts_mv,
                    direction,
                    step,
                    Channel::Voltage.limit(),
                );
                shared.volts_touched = shared.tick;
            }
            if let Some(direction) = amps {
                let step = shared.amps_step.amount();
                shared.setpoints.amps_ma = stepped(
                    shared.setpoints.amps_ma,
                    direction,
                    step,
                    Channel::Current.limit(),
                );
                shared.amps_touched = shared.tick;
            }
            shared.tick = shared.tick.wrapping_add(1);
        });
    }

    fn update<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.shared.borrow(cs);
            let mut shared = cell.get();
            let result = f(&mut shared);
            cell.set(shared);
            result
        })
    }

    fn snapshot(&self) -> Shared {
        critical_section::with(|cs| self.shared.borrow(cs).get())
    }
}

impl Default for SetpointStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Move `value` one detent in `direction`, clamped to `[0, limit]`.
fn stepped(value: u16, direction: Direction, step: u16, limit: u16) -> u16 {
    match direction {
        Direction::Clockwise => value.saturating_add(step).min(limit),
        Direction::CounterClockwise => value.saturating_sub(step),
    }
}

/// Raw electrical levels of the four encoder lines for one tick. The lines
/// idle high through their pull-ups and read low when grounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderLevels {
    pub volts_a: bool,
    pub volts_b: bool,
    pub amps_a: bool,
    pub amps_b: bool,
}

impl EncoderLevels {
    /// Both encoders at rest on a detent.
    pub const fn idle() -> Self {
        Self {
            volts_a: true,
            volts_b: true,
            amps_a: true,
            amps_b: true,
        }
    }
}

/// Interrupt-side driver: owns both decoders and forwards completed detents
/// into the shared store.
///
/// The platform's 1 ms timer interrupt samples the four encoder lines and
/// calls [`scan`](Self::scan) with them, once per tick, which also advances
/// the shared tick counter. The decoder state never leaves the interrupt
/// context.
pub struct EncoderScanner<'a> {
    store: &'a SetpointStore,
    volts: QuadratureDecoder,
    amps: QuadratureDecoder,
}

impl<'a> EncoderScanner<'a> {
    pub const fn new(store: &'a SetpointStore) -> Self {
        Self {
            store,
            volts: QuadratureDecoder::new(),
            amps: QuadratureDecoder::new(),
        }
    }

    /// Decode one sample of all four encoder lines and advance the tick.
    /// O(1), allocation-free, safe to call from an interrupt handler.
    pub fn scan(&mut self, levels: EncoderLevels) {
        let volts = self.volts.sample(levels.volts_a, levels.volts_b);
        let amps = self.amps.sample(levels.amps_a, levels.amps_b);
        self.store.tick_update(volts, amps);
    }
}
