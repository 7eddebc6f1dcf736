/*
 * Turns raw motion sensor readings into the illegal-crossing flag.
 *
 * Motion sensors are noisy: glare, foliage and pets all make them fire. Two
 * filters are applied. First, each sensor has to read motion continuously for
 * a confirmation window before we believe it. Second, when two sensors are
 * fitted, both have to confirm within a correlation window of each other
 * before we call it a crossing.
 *
 * Under the lockout policy the correlator also stands down while a legal
 * crossing is active and during the cooldown that follows an alert. Under the
 * preemptive policy it never looks at either.
 */

use crate::config::{CORRELATION_WINDOW_MS, Policy, SENSOR_CONFIRM_MS};
use crate::shared::SharedEventState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The sensor reads no motion.
    Clear,
    /// Motion, but not yet for long enough.
    Pending,
    Confirmed,
}

/// Confirms a single sensor across polls.
#[derive(Debug, Default)]
pub struct SensorConfirmer {
    high_since_ms: Option<u64>,
}

impl SensorConfirmer {
    pub const fn new() -> Self {
        SensorConfirmer {
            high_since_ms: None,
        }
    }

    pub fn sample(&mut self, now_ms: u64, motion: bool) -> Confirmation {
        if !motion {
            self.high_since_ms = None;
            return Confirmation::Clear;
        }

        let since = *self.high_since_ms.get_or_insert(now_ms);
        if now_ms.saturating_sub(since) >= SENSOR_CONFIRM_MS {
            Confirmation::Confirmed
        } else {
            Confirmation::Pending
        }
    }

    pub fn reset(&mut self) {
        self.high_since_ms = None;
    }
}

/// A change to the illegal-crossing flag made by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum MotionEvent {
    Raised,
    Cleared,
    /// Cleared because detection is locked out.
    Suppressed,
}

/// Correlates `N` motion sensors, where `N` is one or two.
pub struct MotionCorrelator<const N: usize> {
    policy: Policy,
    confirmers: [SensorConfirmer; N],
    last_confirmed_ms: [Option<u64>; N],
}

impl<const N: usize> MotionCorrelator<N> {
    const SENSOR_COUNT_IS_SUPPORTED: () = assert!(N == 1 || N == 2, "one or two motion sensors");

    pub const fn new(policy: Policy) -> Self {
        let () = Self::SENSOR_COUNT_IS_SUPPORTED;
        MotionCorrelator {
            policy,
            confirmers: [const { SensorConfirmer::new() }; N],
            last_confirmed_ms: [None; N],
        }
    }

    /// The last time each sensor was confirmed, if it still counts.
    pub fn last_confirmed(&self) -> &[Option<u64>; N] {
        &self.last_confirmed_ms
    }

    pub fn poll(
        &mut self,
        now_ms: u64,
        motion: [bool; N],
        shared: &SharedEventState,
    ) -> Option<MotionEvent> {
        if self.policy == Policy::Lockout
            && (shared.crossing_active() || shared.is_suppressed(now_ms))
        {
            self.reset();
            return shared
                .set_illegal_detected(false)
                .then_some(MotionEvent::Suppressed);
        }

        let mut confirmations = [Confirmation::Clear; N];
        for (i, confirmer) in self.confirmers.iter_mut().enumerate() {
            confirmations[i] = confirmer.sample(now_ms, motion[i]);
        }

        if N == 1 {
            match confirmations[0] {
                Confirmation::Confirmed => raise(shared),
                Confirmation::Clear => clear(shared),
                Confirmation::Pending => None,
            }
        } else {
            self.correlate(now_ms, &confirmations, shared)
        }
    }

    fn correlate(
        &mut self,
        now_ms: u64,
        confirmations: &[Confirmation; N],
        shared: &SharedEventState,
    ) -> Option<MotionEvent> {
        for (last, confirmation) in self.last_confirmed_ms.iter_mut().zip(confirmations) {
            if *confirmation == Confirmation::Confirmed {
                *last = Some(now_ms);
            } else if last.is_some_and(|t| now_ms.saturating_sub(t) > CORRELATION_WINDOW_MS) {
                *last = None;
            }
        }

        if self.corroborated() {
            raise(shared)
        } else if self.last_confirmed_ms.iter().all(Option::is_none) {
            clear(shared)
        } else {
            None
        }
    }

    // Every sensor confirmed, and all within one correlation window.
    fn corroborated(&self) -> bool {
        let mut earliest = u64::MAX;
        let mut latest = 0;
        for last in &self.last_confirmed_ms {
            let Some(t) = *last else {
                return false;
            };
            earliest = earliest.min(t);
            latest = latest.max(t);
        }
        latest - earliest <= CORRELATION_WINDOW_MS
    }

    fn reset(&mut self) {
        self.confirmers.iter_mut().for_each(SensorConfirmer::reset);
        self.last_confirmed_ms = [None; N];
    }
}

fn raise(shared: &SharedEventState) -> Option<MotionEvent> {
    (!shared.set_illegal_detected(true)).then_some(MotionEvent::Raised)
}

fn clear(shared: &SharedEventState) -> Option<MotionEvent> {
    shared
        .set_illegal_detected(false)
        .then_some(MotionEvent::Cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MOTION_POLL_DUAL_MS, MOTION_POLL_SINGLE_MS};

    #[test]
    fn confirmer_needs_continuous_motion() {
        let mut confirmer = SensorConfirmer::new();
        assert_eq!(confirmer.sample(0, true), Confirmation::Pending);
        assert_eq!(confirmer.sample(120, true), Confirmation::Pending);
        assert_eq!(confirmer.sample(160, false), Confirmation::Clear);
        assert_eq!(confirmer.sample(240, true), Confirmation::Pending);
        assert_eq!(confirmer.sample(440, true), Confirmation::Confirmed);
        assert_eq!(confirmer.sample(520, true), Confirmation::Confirmed);
    }

    // Polls a dual correlator on its cadence; `motion(t)` gives both sensors.
    fn run_dual(
        correlator: &mut MotionCorrelator<2>,
        shared: &SharedEventState,
        from: u64,
        to: u64,
        motion: impl Fn(u64) -> [bool; 2],
    ) -> Vec<(u64, MotionEvent)> {
        (from..to)
            .step_by(MOTION_POLL_DUAL_MS as usize)
            .filter_map(|t| correlator.poll(t, motion(t), shared).map(|e| (t, e)))
            .collect()
    }

    #[test]
    fn single_sensor_raises_after_confirmation_and_clears_on_low() {
        let mut correlator = MotionCorrelator::<1>::new(Policy::Preemptive);
        let shared = SharedEventState::new();

        assert_eq!(correlator.poll(0, [true], &shared), None);
        assert_eq!(
            correlator.poll(MOTION_POLL_SINGLE_MS, [true], &shared),
            Some(MotionEvent::Raised)
        );
        assert!(shared.illegal_detected());
        let held = correlator.poll(2 * MOTION_POLL_SINGLE_MS, [true], &shared);
        assert_eq!(held, None);
        assert_eq!(
            correlator.poll(3 * MOTION_POLL_SINGLE_MS, [false], &shared),
            Some(MotionEvent::Cleared)
        );
        assert!(!shared.illegal_detected());
    }

    #[test]
    fn preemptive_policy_ignores_crossing_and_cooldown() {
        let mut correlator = MotionCorrelator::<1>::new(Policy::Preemptive);
        let shared = SharedEventState::new();
        shared.set_crossing_active(true);
        shared.set_ignore_until(60_000);

        correlator.poll(1_000, [true], &shared);
        correlator.poll(1_200, [true], &shared);

        assert!(shared.illegal_detected());
    }

    #[test]
    fn dual_sensors_within_window_raise() {
        let mut correlator = MotionCorrelator::<2>::new(Policy::Lockout);
        let shared = SharedEventState::new();

        // A goes high at 1000, B at 1480; each confirms 200 ms later.
        let events = run_dual(&mut correlator, &shared, 1_000, 2_000, |t| {
            [(1_000..1_300).contains(&t), (1_480..1_800).contains(&t)]
        });

        assert_eq!(events, vec![(1_720, MotionEvent::Raised)]);
        assert!(shared.illegal_detected());
    }

    #[test]
    fn single_sensor_alone_never_raises_in_dual_mode() {
        let mut correlator = MotionCorrelator::<2>::new(Policy::Lockout);
        let shared = SharedEventState::new();

        let events = run_dual(&mut correlator, &shared, 0, 5_000, |t| {
            [(1_000..1_500).contains(&t), false]
        });

        assert!(events.is_empty());
        assert!(!shared.illegal_detected());
        assert_eq!(correlator.last_confirmed(), &[None, None]);
    }

    #[test]
    fn confirmations_too_far_apart_do_not_raise() {
        let mut correlator = MotionCorrelator::<2>::new(Policy::Lockout);
        let shared = SharedEventState::new();

        // A is last confirmed at 1240, B first at 2360.
        let events = run_dual(&mut correlator, &shared, 1_000, 4_000, |t| {
            [(1_000..1_300).contains(&t), (2_100..2_400).contains(&t)]
        });

        assert!(events.is_empty());
        assert!(!shared.illegal_detected());
    }

    #[test]
    fn flag_clears_once_both_confirmations_are_stale() {
        let mut correlator = MotionCorrelator::<2>::new(Policy::Lockout);
        let shared = SharedEventState::new();

        let events = run_dual(&mut correlator, &shared, 0, 3_000, |t| {
            let walking = (0..400).contains(&t);
            [walking, walking]
        });

        // Last confirmation at 320, stale once more than 800 ms old.
        assert_eq!(
            events,
            vec![(240, MotionEvent::Raised), (1_200, MotionEvent::Cleared)]
        );
    }

    #[test]
    fn lockout_suppresses_during_crossing() {
        let mut correlator = MotionCorrelator::<2>::new(Policy::Lockout);
        let shared = SharedEventState::new();
        shared.set_crossing_active(true);

        let events = run_dual(&mut correlator, &shared, 0, 2_000, |_| [true, true]);

        assert!(events.is_empty());
        assert!(!shared.illegal_detected());
    }

    #[test]
    fn lockout_forces_flag_clear_while_cooling_down() {
        let mut correlator = MotionCorrelator::<2>::new(Policy::Lockout);
        let shared = SharedEventState::new();
        shared.set_illegal_detected(true);
        shared.set_ignore_until(1_000);

        assert_eq!(
            correlator.poll(0, [true, true], &shared),
            Some(MotionEvent::Suppressed)
        );
        assert_eq!(correlator.poll(80, [true, true], &shared), None);

        // Re-arms at 1000 and has to confirm from scratch.
        let events = run_dual(&mut correlator, &shared, 960, 2_000, |_| [true, true]);
        assert_eq!(events, vec![(1_280, MotionEvent::Raised)]);
    }

    #[test]
    fn single_sensor_lockout_stands_down_during_crossing_and_cooldown() {
        let mut correlator = MotionCorrelator::<1>::new(Policy::Lockout);
        let shared = SharedEventState::new();
        let step = MOTION_POLL_SINGLE_MS as usize;

        shared.set_crossing_active(true);
        for t in (0..1_200).step_by(step) {
            assert_eq!(correlator.poll(t, [true], &shared), None);
        }
        assert!(!shared.illegal_detected());

        shared.set_crossing_active(false);
        shared.set_ignore_until(5_000);
        for t in (1_200..5_000).step_by(step) {
            assert_eq!(correlator.poll(t, [true], &shared), None);
        }
        assert!(!shared.illegal_detected());

        // Confirmation starts over once the cooldown ends.
        assert_eq!(correlator.poll(5_000, [true], &shared), None);
        assert_eq!(
            correlator.poll(5_200, [true], &shared),
            Some(MotionEvent::Raised)
        );
    }

    #[test]
    fn dual_preemptive_raises_during_crossing_and_holds_until_both_stale() {
        let mut correlator = MotionCorrelator::<2>::new(Policy::Preemptive);
        let shared = SharedEventState::new();
        shared.set_crossing_active(true);

        // A is last confirmed at 320, B at 960.
        let events = run_dual(&mut correlator, &shared, 0, 3_000, |t| {
            [(0..400).contains(&t), (0..1_000).contains(&t)]
        });

        assert_eq!(
            events,
            vec![(240, MotionEvent::Raised), (1_840, MotionEvent::Cleared)]
        );
    }
}
