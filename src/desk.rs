/*
 * Desk simulation of the crossing.
 *
 * Runs the three monitors on their real cadences against a virtual clock and
 * a scripted set of inputs, and prints every change of the outputs. Handy for
 * trying out timing changes without a board.
 */

use enum_ordinalize::Ordinalize;

use pedestrian_crossing::config::{
    BUTTON_POLL_MS, BUTTON_PRESSED_HIGH, CONTROLLER_POLL_MS, OUTPUT_TICK_MS, POLICY,
    SENSOR_COUNT, motion_poll_ms,
};
use pedestrian_crossing::timed_output_masker::{Pins, TimedOutputMasker};
use pedestrian_crossing::{
    CrossingController, InputDebouncer, Lights, MotionCorrelator, OutputActuator,
    SharedEventState, StatusLines,
};

const END_MS: u64 = 40_000;

// (from, to) in milliseconds.
const BUTTON_PRESSES: [(u64, u64); 3] = [(1_000, 1_300), (5_000, 5_200), (24_000, 24_150)];
const WALKERS: [(u64, u64); 2] = [(14_000, 16_000), (19_000, 21_000)];
// The second sensor sees a walker this much later than the first.
const SENSOR_SPACING_MS: u64 = 400;

// Prints only what changed; the controller asserts its outputs every step.
struct PrintingActuator {
    now_ms: u64,
    masker: TimedOutputMasker,
    lights: Option<Lights>,
    buzzer: Option<bool>,
}

impl OutputActuator for PrintingActuator {
    fn set_lights(&mut self, lights: Lights) {
        if self.lights != Some(lights) {
            println!("{:>6} ms  lights  {:?}", self.now_ms, lights);
            self.lights = Some(lights);
        }
        self.masker.set_lights(lights);
    }

    fn set_buzzer(&mut self, on: bool) {
        if self.buzzer != Some(on) {
            let tone = if on { "on" } else { "off" };
            println!("{:>6} ms  buzzer  {}", self.now_ms, tone);
            self.buzzer = Some(on);
        }
        self.masker.set_buzzer(on);
    }

    fn show_status(&mut self, status: &StatusLines) {
        println!("{:>6} ms  status  {}", self.now_ms, status);
    }
}

fn within(windows: &[(u64, u64)], t: u64) -> bool {
    windows.iter().any(|(from, to)| (*from..*to).contains(&t))
}

pub fn run() {
    println!("policy {:?}, {} motion sensor(s)", POLICY, SENSOR_COUNT);

    let shared = SharedEventState::new();
    let mut debouncer = InputDebouncer::new();
    let mut correlator = MotionCorrelator::<SENSOR_COUNT>::new(POLICY);
    let actuator = PrintingActuator {
        now_ms: 0,
        masker: TimedOutputMasker::new([false; Pins::VARIANT_COUNT]),
        lights: None,
        buzzer: None,
    };
    let mut controller = CrossingController::new(POLICY, actuator);
    controller.start(0, SENSOR_COUNT);

    let mut beeps = 0;
    let mut buzzer_was_on = false;

    for t in (0..END_MS).step_by(OUTPUT_TICK_MS as usize) {
        controller.actuator_mut().now_ms = t;

        if t % BUTTON_POLL_MS == 0 {
            let pressed = within(&BUTTON_PRESSES, t);
            let raw_high = pressed == BUTTON_PRESSED_HIGH;
            if let Some(event) = debouncer.poll(t, raw_high, &shared) {
                println!("{:>6} ms  button  {:?}", t, event);
            }
        }

        if t % motion_poll_ms(SENSOR_COUNT) == 0 {
            let motion: [bool; SENSOR_COUNT] = core::array::from_fn(|i| {
                let delay = i as u64 * SENSOR_SPACING_MS;
                t >= delay && within(&WALKERS, t - delay)
            });
            if let Some(event) = correlator.poll(t, motion, &shared) {
                println!("{:>6} ms  motion  {:?}", t, event);
            }
        }

        if t % CONTROLLER_POLL_MS == 0 {
            controller.step(t, &shared);
        }

        let outputs = controller.actuator_mut().masker.call_every_tick();
        let buzzer_on = outputs[Pins::Buzzer.ordinal()];
        if buzzer_on && !buzzer_was_on {
            beeps += 1;
        }
        buzzer_was_on = buzzer_on;
    }

    println!("{} beeps, final state {:?}", beeps, controller.state());
}
