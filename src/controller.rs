/*
 * The crossing state machine.
 *
 * The controller is stepped on a fixed cadence. Each step it reads the shared
 * flags, decides whether to change state, and drives the lights, the buzzer
 * and the status surface. No step ever waits: a running crossing or alert is
 * timed by comparing `now` against a deadline captured when it started.
 *
 * Which of a legal crossing and an illegal crossing wins is decided by the
 * policy. Under `Preemptive`, confirmed motion cancels anything in progress
 * and the alert lasts until the motion flag drops. Under `Lockout`, motion is
 * only acted on from idle, the alert runs for a fixed time, and afterwards
 * detection is held off for a cooldown.
 */

use crate::actuator::{Lights, OutputActuator};
use crate::config::{
    ALERT_COOLDOWN_MS, ALERT_DURATION_MS, CROSSING_WINDOW_MS, Policy, STATUS_REFRESH_ALERT_MS,
    STATUS_REFRESH_CROSSING_MS, STATUS_REFRESH_IDLE_MS,
};
use crate::shared::{EventFlags, SharedEventState};
use crate::status::StatusLines;
use crate::log_info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum CrossingState {
    Idle,
    ActiveCrossing,
    IllegalAlert,
}

pub struct CrossingController<A: OutputActuator> {
    policy: Policy,
    state: CrossingState,
    actuator: A,
    crossing_started_ms: u64,
    // Only set under the lockout policy.
    alert_deadline_ms: Option<u64>,
    last_status_ms: Option<u64>,
}

impl<A: OutputActuator> CrossingController<A> {
    pub fn new(policy: Policy, actuator: A) -> Self {
        CrossingController {
            policy,
            state: CrossingState::Idle,
            actuator,
            crossing_started_ms: 0,
            alert_deadline_ms: None,
            last_status_ms: None,
        }
    }

    pub fn state(&self) -> CrossingState {
        self.state
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// Drives the idle outputs. Call once before the first `step`.
    pub fn start(&mut self, now_ms: u64, sensor_count: usize) {
        log_info!("controller started, policy {:?}", self.policy);
        self.drive_outputs();
        self.show(now_ms, &StatusLines::ready(sensor_count));
    }

    pub fn step(&mut self, now_ms: u64, shared: &SharedEventState) {
        let flags = shared.snapshot();

        match self.state {
            CrossingState::Idle => {
                if self.alert_wins(flags) {
                    shared.set_crossing_requested(false);
                    self.enter_alert(now_ms);
                } else if flags.crossing_requested {
                    self.begin_crossing(now_ms, shared);
                } else if self.status_due(now_ms, STATUS_REFRESH_IDLE_MS) {
                    let cooldown_left = shared.ignore_until().saturating_sub(now_ms);
                    self.show(now_ms, &StatusLines::idle(cooldown_left));
                }
            }
            CrossingState::ActiveCrossing => {
                let elapsed = now_ms.saturating_sub(self.crossing_started_ms);
                if self.alert_wins(flags) {
                    log_info!("illegal crossing cancels the legal crossing");
                    shared.set_crossing_active(false);
                    shared.set_crossing_requested(false);
                    self.enter_alert(now_ms);
                } else if elapsed >= CROSSING_WINDOW_MS {
                    self.end_crossing(now_ms, shared);
                } else if self.status_due(now_ms, STATUS_REFRESH_CROSSING_MS) {
                    let left = CROSSING_WINDOW_MS - elapsed;
                    self.show(now_ms, &StatusLines::crossing(left));
                }
            }
            CrossingState::IllegalAlert => match self.alert_deadline_ms {
                // Preemptive: lasts as long as the flag does.
                None if !flags.illegal_detected => self.leave_alert(now_ms),
                // Lockout: runs to its deadline whatever the flag does, then
                // holds detection off before the flag is released.
                Some(deadline) if now_ms >= deadline => {
                    shared.set_ignore_until(now_ms + ALERT_COOLDOWN_MS);
                    shared.set_illegal_detected(false);
                    self.leave_alert(now_ms);
                }
                deadline => {
                    if self.status_due(now_ms, STATUS_REFRESH_ALERT_MS) {
                        let left = deadline.map_or(0, |deadline| deadline - now_ms);
                        self.show(now_ms, &StatusLines::alert(self.policy, left));
                    }
                }
            },
        }

        // A command the actuator could not deliver is retried next step.
        self.drive_outputs();
    }

    // Whether confirmed motion takes over from the current state.
    fn alert_wins(&self, flags: EventFlags) -> bool {
        match (self.policy, self.state) {
            (Policy::Preemptive, _) => flags.illegal_detected,
            (Policy::Lockout, CrossingState::Idle) => {
                flags.illegal_detected && !flags.crossing_active
            }
            (Policy::Lockout, _) => false,
        }
    }

    fn begin_crossing(&mut self, now_ms: u64, shared: &SharedEventState) {
        shared.set_crossing_requested(false);
        shared.set_crossing_active(true);
        self.crossing_started_ms = now_ms;
        self.transition(CrossingState::ActiveCrossing);
        self.show(now_ms, &StatusLines::crossing(CROSSING_WINDOW_MS));
    }

    fn end_crossing(&mut self, now_ms: u64, shared: &SharedEventState) {
        shared.set_crossing_active(false);
        self.transition(CrossingState::Idle);
        self.show(now_ms, &StatusLines::crossing_done());
    }

    fn enter_alert(&mut self, now_ms: u64) {
        self.alert_deadline_ms = match self.policy {
            Policy::Preemptive => None,
            Policy::Lockout => Some(now_ms + ALERT_DURATION_MS),
        };
        self.transition(CrossingState::IllegalAlert);
        let left = self.alert_deadline_ms.map_or(0, |deadline| deadline - now_ms);
        self.show(now_ms, &StatusLines::alert(self.policy, left));
    }

    fn leave_alert(&mut self, now_ms: u64) {
        self.alert_deadline_ms = None;
        self.transition(CrossingState::Idle);
        self.show(now_ms, &StatusLines::alert_done(self.policy));
    }

    // Asserted every step, so the outputs always follow the state.
    fn drive_outputs(&mut self) {
        let (lights, buzzer) = match self.state {
            CrossingState::Idle => (Lights::VEHICLES_GO, false),
            CrossingState::ActiveCrossing => (Lights::VEHICLES_STOP, false),
            CrossingState::IllegalAlert => (Lights::CAUTION, true),
        };
        self.actuator.set_lights(lights);
        self.actuator.set_buzzer(buzzer);
    }

    fn transition(&mut self, next: CrossingState) {
        log_info!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn status_due(&self, now_ms: u64, refresh_ms: u64) -> bool {
        self.last_status_ms
            .is_none_or(|last| now_ms.saturating_sub(last) > refresh_ms)
    }

    fn show(&mut self, now_ms: u64, status: &StatusLines) {
        self.actuator.show_status(status);
        self.last_status_ms = Some(now_ms);
    }
}
