/*
 * Turns the raw request button into crossing requests.
 *
 * A button bounces for a few milliseconds when pressed or released. We only
 * accept a new level after the raw reading has held still for the debounce
 * threshold, and only the transition into the pressed level counts as a
 * request. Presses made while a crossing or an alert is in progress are
 * dropped, so that a pedestrian cannot queue up a second crossing.
 */

use crate::config::{BUTTON_DEBOUNCE_MS, BUTTON_PRESSED_HIGH};
use crate::shared::SharedEventState;

/// What happened to a debounced press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum ButtonEvent {
    Requested,
    IgnoredCrossingActive,
    IgnoredIllegal,
}

pub struct InputDebouncer {
    last_raw: bool,
    last_stable: bool,
    last_change_ms: u64,
}

impl InputDebouncer {
    pub const fn new() -> Self {
        InputDebouncer {
            last_raw: !BUTTON_PRESSED_HIGH,
            last_stable: !BUTTON_PRESSED_HIGH,
            last_change_ms: 0,
        }
    }

    /*
     * Call once per button poll with the raw pin level. Returns an event only
     * on the poll where a press becomes stable.
     */
    pub fn poll(
        &mut self,
        now_ms: u64,
        raw_high: bool,
        shared: &SharedEventState,
    ) -> Option<ButtonEvent> {
        if raw_high != self.last_raw {
            self.last_raw = raw_high;
            self.last_change_ms = now_ms;
        }

        let settled = now_ms.saturating_sub(self.last_change_ms) >= BUTTON_DEBOUNCE_MS;
        if !settled || raw_high == self.last_stable {
            return None;
        }

        self.last_stable = raw_high;
        if self.last_stable != BUTTON_PRESSED_HIGH {
            return None;
        }

        let event = if shared.crossing_active() {
            ButtonEvent::IgnoredCrossingActive
        } else if shared.illegal_detected() {
            ButtonEvent::IgnoredIllegal
        } else {
            shared.set_crossing_requested(true);
            ButtonEvent::Requested
        };
        Some(event)
    }
}

impl Default for InputDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BUTTON_POLL_MS;

    const PRESSED: bool = BUTTON_PRESSED_HIGH;
    const RELEASED: bool = !BUTTON_PRESSED_HIGH;

    // Feeds `level(t)` to the debouncer every poll from `from` to `to`
    // (exclusive) and collects the events with their timestamps.
    fn run(
        debouncer: &mut InputDebouncer,
        shared: &SharedEventState,
        from: u64,
        to: u64,
        level: impl Fn(u64) -> bool,
    ) -> Vec<(u64, ButtonEvent)> {
        (from..to)
            .step_by(BUTTON_POLL_MS as usize)
            .filter_map(|t| debouncer.poll(t, level(t), shared).map(|e| (t, e)))
            .collect()
    }

    #[test]
    fn short_press_is_ignored() {
        let mut debouncer = InputDebouncer::new();
        let shared = SharedEventState::new();

        let events = run(&mut debouncer, &shared, 1_000, 2_000, |t| {
            if (1_000..1_030).contains(&t) { PRESSED } else { RELEASED }
        });

        assert!(events.is_empty());
        assert!(!shared.crossing_requested());
    }

    #[test]
    fn held_press_requests_once_at_threshold() {
        let mut debouncer = InputDebouncer::new();
        let shared = SharedEventState::new();

        let events = run(&mut debouncer, &shared, 1_000, 3_000, |t| {
            if (1_000..2_000).contains(&t) { PRESSED } else { RELEASED }
        });

        assert_eq!(events, vec![(1_050, ButtonEvent::Requested)]);
        assert!(shared.crossing_requested());
    }

    #[test]
    fn bouncing_contacts_give_a_single_request() {
        let mut debouncer = InputDebouncer::new();
        let shared = SharedEventState::new();

        // Chatters for 40 ms on press and on release.
        let events = run(&mut debouncer, &shared, 1_000, 3_000, |t| match t {
            1_000..1_040 => (t / 10) % 2 == 0,
            1_040..1_500 => PRESSED,
            1_500..1_540 => (t / 10) % 2 == 1,
            _ => RELEASED,
        });

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, ButtonEvent::Requested);
    }

    #[test]
    fn each_press_release_cycle_requests_again() {
        let mut debouncer = InputDebouncer::new();
        let shared = SharedEventState::new();

        let events = run(&mut debouncer, &shared, 1_000, 3_000, |t| {
            if (1_000..1_200).contains(&t) || (1_600..1_800).contains(&t) {
                PRESSED
            } else {
                RELEASED
            }
        });

        assert_eq!(
            events,
            vec![(1_050, ButtonEvent::Requested), (1_650, ButtonEvent::Requested)]
        );
    }

    #[test]
    fn press_during_crossing_is_dropped() {
        let mut debouncer = InputDebouncer::new();
        let shared = SharedEventState::new();
        shared.set_crossing_active(true);

        let events = run(&mut debouncer, &shared, 1_000, 1_500, |_| PRESSED);

        assert_eq!(events, vec![(1_050, ButtonEvent::IgnoredCrossingActive)]);
        assert!(!shared.crossing_requested());
    }

    #[test]
    fn press_during_alert_is_dropped() {
        let mut debouncer = InputDebouncer::new();
        let shared = SharedEventState::new();
        shared.set_illegal_detected(true);

        let events = run(&mut debouncer, &shared, 1_000, 1_500, |_| PRESSED);

        assert_eq!(events, vec![(1_050, ButtonEvent::IgnoredIllegal)]);
        assert!(!shared.crossing_requested());
    }
}
