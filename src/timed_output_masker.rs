/*
 * The buzzer has to pulse on a fixed cadence for as long as an alert runs. If
 * the controller did that itself, it would have to sleep between beeps and
 * could not keep an eye on its timers and flags in the meantime.
 *
 * Instead we separate the desired output state from the actual pin state. The
 * controller only says "the buzzer is on, subject to the beep cadence". This
 * module is ticked at a fixed rate, advances the cadence and masks the desired
 * state with it to produce the pin levels. It also applies the wiring of each
 * pin, so callers can use `true` for "on" throughout.
 */

use enum_ordinalize::Ordinalize;

use crate::actuator::Lights;
use crate::config::{BEEP_OFF_MS, BEEP_ON_MS, OUTPUT_TICK_MS};

#[derive(Ordinalize, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Pins {
    Stop,
    Caution,
    Go,
    Buzzer,
}

#[derive(Copy, Clone)]
struct OutputStateDescriptor {
    on: bool,
    subject_to_beep_cadence: bool,
}

impl OutputStateDescriptor {
    const fn new() -> Self {
        OutputStateDescriptor {
            on: false,
            subject_to_beep_cadence: false,
        }
    }
}

const TICKS_PER_BEEP: u16 = ((BEEP_ON_MS + BEEP_OFF_MS) / OUTPUT_TICK_MS) as u16;
const TICKS_BEEP_ON: u16 = (BEEP_ON_MS / OUTPUT_TICK_MS) as u16;

pub struct TimedOutputMasker {
    output_descriptors: [OutputStateDescriptor; Pins::VARIANT_COUNT],
    active_lows: [bool; Pins::VARIANT_COUNT],
    tick_count: u16,
    beep_value: bool,
}

impl TimedOutputMasker {
    pub const fn new(active_lows: [bool; Pins::VARIANT_COUNT]) -> Self {
        TimedOutputMasker {
            output_descriptors: [OutputStateDescriptor::new(); Pins::VARIANT_COUNT],
            active_lows,
            tick_count: TICKS_PER_BEEP - 1,
            beep_value: false,
        }
    }

    /*
     * Time stays outside of this module so it can be tested. The caller
     * invokes this once every `OUTPUT_TICK_MS` and writes the result to the
     * pins.
     */
    pub fn call_every_tick(&mut self) -> [bool; Pins::VARIANT_COUNT] {
        self.advance_timers();
        self.mask_output_pins()
    }

    /// Pin levels for the current tick, without advancing time.
    pub fn outputs(&self) -> [bool; Pins::VARIANT_COUNT] {
        self.mask_output_pins()
    }

    fn advance_timers(&mut self) {
        self.tick_count = (self.tick_count + 1) % TICKS_PER_BEEP;
        self.beep_value = self.tick_count < TICKS_BEEP_ON;
    }

    fn mask_output_pins(&self) -> [bool; Pins::VARIANT_COUNT] {
        let mut outputs = [false; Pins::VARIANT_COUNT];
        for (i, output) in outputs.iter_mut().enumerate() {
            let descriptor = &self.output_descriptors[i];
            *output = descriptor.on;

            if descriptor.subject_to_beep_cadence {
                *output &= self.beep_value;
            }

            if self.active_lows[i] {
                *output = !*output;
            }
        }

        outputs
    }

    pub fn set_lights(&mut self, lights: Lights) {
        self.set_on_off(Pins::Stop, lights.stop);
        self.set_on_off(Pins::Caution, lights.caution);
        self.set_on_off(Pins::Go, lights.go);
    }

    /*
     * Switching the buzzer on restarts the cadence, so that every alert opens
     * with a full beep rather than whatever is left of the current one.
     */
    pub fn set_buzzer(&mut self, on: bool) {
        let was_on = self.output_descriptors[Pins::Buzzer.ordinal()].on;
        if on && !was_on {
            self.tick_count = TICKS_PER_BEEP - 1;
            self.beep_value = false;
        }
        self.set_pin(Pins::Buzzer, on, true);
    }

    pub fn set_on_off(&mut self, pin: Pins, on: bool) {
        self.set_pin(pin, on, false);
    }

    pub fn set_pin(&mut self, pin: Pins, on: bool, subject_to_beep_cadence: bool) {
        self.output_descriptors[pin.ordinal()] = OutputStateDescriptor {
            on,
            subject_to_beep_cadence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIVE_HIGH: [bool; Pins::VARIANT_COUNT] = [false; Pins::VARIANT_COUNT];

    fn buzzer_trace(masker: &mut TimedOutputMasker, ticks: usize) -> Vec<bool> {
        (0..ticks)
            .map(|_| masker.call_every_tick()[Pins::Buzzer.ordinal()])
            .collect()
    }

    #[test]
    fn lights_pass_straight_through() {
        let mut masker = TimedOutputMasker::new(ALL_ACTIVE_HIGH);
        masker.set_lights(Lights::CAUTION);

        for _ in 0..100 {
            assert_eq!(masker.call_every_tick(), [false, true, false, false]);
        }
    }

    #[test]
    fn buzzer_beeps_120_on_180_off() {
        let mut masker = TimedOutputMasker::new(ALL_ACTIVE_HIGH);
        masker.set_buzzer(true);

        let trace = buzzer_trace(&mut masker, 60);

        let on_ticks = (BEEP_ON_MS / OUTPUT_TICK_MS) as usize;
        let period = ((BEEP_ON_MS + BEEP_OFF_MS) / OUTPUT_TICK_MS) as usize;
        for (tick, on) in trace.iter().enumerate() {
            assert_eq!(*on, tick % period < on_ticks, "tick {}", tick);
        }
    }

    #[test]
    fn enabling_buzzer_restarts_the_cadence() {
        let mut masker = TimedOutputMasker::new(ALL_ACTIVE_HIGH);
        buzzer_trace(&mut masker, 7);
        masker.set_buzzer(true);

        let trace = buzzer_trace(&mut masker, 12);
        assert!(trace.iter().all(|on| *on));

        // Re-enabling while on keeps the cadence going.
        masker.set_buzzer(true);
        assert_eq!(buzzer_trace(&mut masker, 1), vec![false]);
    }

    #[test]
    fn buzzer_off_stays_silent() {
        let mut masker = TimedOutputMasker::new(ALL_ACTIVE_HIGH);
        masker.set_buzzer(true);
        buzzer_trace(&mut masker, 5);
        masker.set_buzzer(false);

        assert!(buzzer_trace(&mut masker, 60).iter().all(|on| !*on));
    }

    #[test]
    fn active_low_pins_are_inverted() {
        let mut masker = TimedOutputMasker::new([true, false, false, true]);
        masker.set_lights(Lights::VEHICLES_STOP);

        assert_eq!(masker.call_every_tick(), [false, false, false, true]);
    }
}
