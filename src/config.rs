/*
 * Build-time configuration of the crossing.
 *
 * Nothing here can change while the device runs. All durations are in
 * milliseconds, which is the unit every component of the library takes its
 * timestamps in.
 */

// Legal crossing.
pub const CROSSING_WINDOW_MS: u64 = 10_000;

// Request button. The button pulls the line low when pressed.
pub const BUTTON_POLL_MS: u64 = 10;
pub const BUTTON_DEBOUNCE_MS: u64 = 50;
pub const BUTTON_PRESSED_HIGH: bool = false;

// Motion sensors.
pub const SENSOR_CONFIRM_MS: u64 = 200;
pub const CORRELATION_WINDOW_MS: u64 = 800;
pub const MOTION_POLL_DUAL_MS: u64 = 80;
pub const MOTION_POLL_SINGLE_MS: u64 = 200;

// Illegal crossing alert. Only the lockout policy uses a fixed alert duration
// and a cooldown.
pub const ALERT_DURATION_MS: u64 = 3_000;
pub const ALERT_COOLDOWN_MS: u64 = 5_000;
pub const BEEP_ON_MS: u64 = 120;
pub const BEEP_OFF_MS: u64 = 180;

// Controller and outputs.
pub const CONTROLLER_POLL_MS: u64 = 20;
pub const OUTPUT_TICK_MS: u64 = 10;

// Status surface.
pub const STATUS_LOCK_TIMEOUT_MS: u64 = 200;
pub const STATUS_REFRESH_IDLE_MS: u64 = 400;
pub const STATUS_REFRESH_CROSSING_MS: u64 = 250;
pub const STATUS_REFRESH_ALERT_MS: u64 = 200;

/// How a legal crossing and an illegal crossing are arbitrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Policy {
    /// Confirmed motion cancels any legal crossing, and the alert lasts for
    /// as long as motion is detected.
    Preemptive,
    /// A legal crossing locks out detection. An alert runs for a fixed
    /// duration and is followed by a cooldown before detection re-arms.
    Lockout,
}

#[cfg(feature = "preemptive-alert")]
pub const POLICY: Policy = Policy::Preemptive;
#[cfg(not(feature = "preemptive-alert"))]
pub const POLICY: Policy = Policy::Lockout;

#[cfg(feature = "single-sensor")]
pub const SENSOR_COUNT: usize = 1;
#[cfg(not(feature = "single-sensor"))]
pub const SENSOR_COUNT: usize = 2;

/// The correlator poll cadence that goes with a sensor count.
pub const fn motion_poll_ms(sensor_count: usize) -> u64 {
    if sensor_count == 1 {
        MOTION_POLL_SINGLE_MS
    } else {
        MOTION_POLL_DUAL_MS
    }
}
