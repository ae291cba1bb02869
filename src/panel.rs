//! The foreground control loop: step-size switches, setpoint pushes and the
//! CC indicator.
//!
//! Everything here runs in main context and may block on fixed delays; the
//! encoders keep decoding in the tick interrupt throughout, so the panel
//! stays responsive while a slow transaction is in flight.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_io::{Read, ReadReady, Write};

use crate::psu::Dps5005;
use crate::store::SetpointStore;
use crate::types::{Channel, Setpoints};

/// Gap between the two samples that confirm a switch press.
const DEBOUNCE_MS: u32 = 10;

/// Hold-off after a step-size toggle so one press cannot toggle twice.
const STEP_TOGGLE_HOLD_MS: u32 = 100;

/// Pause between a setpoint write and its confirming read. The module
/// ignores commands that arrive hot on the heels of another.
const POST_WRITE_DELAY_MS: u32 = 500;

/// Retry pacing while waiting for the module to answer at startup.
const STARTUP_RETRY_MS: u32 = 100;

/// Front-panel controller tying the shared setpoint store to the module.
///
/// Each pass of the loop services three independent concerns: debounced
/// step-size switches, pushing settled setpoint drift to the module with a
/// confirming read-back, and mirroring the module's CC status onto the
/// indicator LED.
pub struct Panel<'a, S, D, VB, AB, LED>
where
    S: Read + ReadReady + Write,
    D: DelayNs,
    VB: InputPin,
    AB: InputPin,
    LED: OutputPin,
{
    psu: Dps5005<S>,
    delay: D,
    store: &'a SetpointStore,
    volts_switch: VB,
    amps_switch: AB,
    cc_led: LED,
    /// Last values the module confirmed holding, per channel. Drift is
    /// live store value != this.
    confirmed: Setpoints,
}

impl<'a, S, D, VB, AB, LED> Panel<'a, S, D, VB, AB, LED>
where
    S: Read + ReadReady + Write,
    D: DelayNs,
    VB: InputPin,
    AB: InputPin,
    LED: OutputPin,
{
    pub fn new(
        psu: Dps5005<S>,
        delay: D,
        store: &'a SetpointStore,
        volts_switch: VB,
        amps_switch: AB,
        cc_led: LED,
    ) -> Self {
        Self {
            psu,
            delay,
            store,
            volts_switch,
            amps_switch,
            cc_led,
            confirmed: Setpoints::default(),
        }
    }

    /// Last setpoints the module confirmed holding.
    pub fn confirmed(&self) -> Setpoints {
        self.confirmed
    }

    /// Acquire the module's actual state, then service the panel forever.
    pub fn run(&mut self) -> ! {
        self.acquire();
        loop {
            self.service();
        }
    }

    /// Block until a first read succeeds, then seed the store and the
    /// confirmed shadows from it so the panel starts in sync with reality.
    fn acquire(&mut self) {
        loop {
            match self.psu.read_setpoints(&mut self.delay) {
                Ok(setpoints) => {
                    self.store.seed(setpoints);
                    self.confirmed = setpoints;
                    return;
                }
                Err(_) => self.delay.delay_ms(STARTUP_RETRY_MS),
            }
        }
    }

    /// One pass of the control loop.
    fn service(&mut self) {
        self.poll_step_switches();
        self.sync_channel(Channel::Voltage);
        self.sync_channel(Channel::Current);
        self.poll_cc_indicator();
    }

    fn poll_step_switches(&mut self) {
        debounced_toggle(
            &mut self.volts_switch,
            &mut self.delay,
            self.store,
            Channel::Voltage,
        );
        debounced_toggle(
            &mut self.amps_switch,
            &mut self.delay,
            self.store,
            Channel::Current,
        );
    }

    /// Push `channel` to the module if it has drifted from the confirmed
    /// value and its encoder has gone quiet. The shadow only advances on a
    /// successful read-back, so a failed confirmation leaves the write to
    /// be retried on a later pass.
    fn sync_channel(&mut self, channel: Channel) {
        let reading = self.store.read_channel(channel);
        if reading.value == self.confirmed.channel(channel) || !reading.settled {
            return;
        }

        let written = match channel {
            Channel::Voltage => self.psu.set_voltage_mv(reading.value),
            Channel::Current => self.psu.set_current_ma(reading.value),
        };
        if written.is_err() {
            return;
        }

        self.delay.delay_ms(POST_WRITE_DELAY_MS);

        // The shadow takes the value that was pushed, not the store's
        // current value; detents that landed during the delay above stay
        // unsynced and trigger another pass.
        if self.psu.read_setpoints(&mut self.delay).is_ok() {
            self.confirmed.set_channel(channel, reading.value);
        }
    }

    /// Mirror the module's CV/CC state onto the indicator. A failed poll
    /// leaves the LED as it was.
    fn poll_cc_indicator(&mut self) {
        if let Ok(limiting) = self.psu.read_cc_status(&mut self.delay) {
            let _ = self.cc_led.set_state(PinState::from(limiting));
        }
    }
}

/// Two-sample debounce: a press that is still asserted [DEBOUNCE_MS] after
/// first being seen toggles the channel's step size, followed by a hold-off
/// so a single press cannot toggle again on the next pass.
fn debounced_toggle<P: InputPin>(
    switch: &mut P,
    delay: &mut impl DelayNs,
    store: &SetpointStore,
    channel: Channel,
) {
    if pressed(switch) {
        delay.delay_ms(DEBOUNCE_MS);
        if pressed(switch) {
            store.toggle_step_size(channel);
            delay.delay_ms(STEP_TOGGLE_HOLD_MS);
        }
    }
}

/// Switches ground their line when pressed; an unreadable pin counts as
/// released.
fn pressed<P: InputPin>(switch: &mut P) -> bool {
    switch.is_low().unwrap_or(false)
}
