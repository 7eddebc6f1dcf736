/*
 * Text shown on the three-line status surface.
 *
 * Purely informational; nothing reads it back. Lines longer than the surface
 * is wide are cut off.
 */

use core::fmt::{self, Write};

use heapless::String;

use crate::config::{ALERT_COOLDOWN_MS, Policy};

pub const LINE_WIDTH: usize = 21;

pub type Line = String<LINE_WIDTH>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLines {
    lines: [Line; 3],
}

impl StatusLines {
    pub fn new(line1: &str, line2: &str, line3: &str) -> Self {
        StatusLines {
            lines: [truncated(line1), truncated(line2), truncated(line3)],
        }
    }

    pub fn lines(&self) -> [&str; 3] {
        [
            self.lines[0].as_str(),
            self.lines[1].as_str(),
            self.lines[2].as_str(),
        ]
    }

    pub fn ready(sensor_count: usize) -> Self {
        let mut sensors = Line::new();
        let _ = write!(sensors, "{}-PIR illegal", sensor_count);
        Self::with_line2("SYSTEM READY", sensors, "Press button")
    }

    pub fn idle(cooldown_left_ms: u64) -> Self {
        if cooldown_left_ms == 0 {
            return Self::new("MODE: IDLE", "Press button", "Car: GO");
        }
        let mut line2 = Line::new();
        let seconds = whole_seconds(cooldown_left_ms);
        let _ = write!(line2, "Ignore illegal: {}s", seconds);
        Self::with_line2("MODE: IDLE", line2, "Car: GO")
    }

    pub fn crossing(left_ms: u64) -> Self {
        let mut line2 = Line::new();
        let _ = write!(line2, "Walk: {}s", whole_seconds(left_ms));
        Self::with_line2("LEGAL CROSSING", line2, "Car: STOP")
    }

    pub fn crossing_done() -> Self {
        Self::new("DONE", "Back to idle", "UNLOCK")
    }

    pub fn alert(policy: Policy, left_ms: u64) -> Self {
        match policy {
            Policy::Preemptive => Self::new("WARNING!", "Illegal crossing", "Car: CAUTION"),
            Policy::Lockout => {
                let mut line3 = Line::new();
                let _ = write!(line3, "Alert: {}s", whole_seconds(left_ms));
                Self::with_line3("WARNING!", "Illegal crossing", line3)
            }
        }
    }

    pub fn alert_done(policy: Policy) -> Self {
        match policy {
            Policy::Preemptive => Self::new("ILLEGAL END", "Back to idle", "Car: GO"),
            Policy::Lockout => {
                let mut line3 = Line::new();
                let _ = write!(line3, "Wait {}s", whole_seconds(ALERT_COOLDOWN_MS));
                Self::with_line3("ALERT STOP", "Back to idle", line3)
            }
        }
    }

    fn with_line2(line1: &str, line2: Line, line3: &str) -> Self {
        let mut status = Self::new(line1, "", line3);
        status.lines[1] = line2;
        status
    }

    fn with_line3(line1: &str, line2: &str, line3: Line) -> Self {
        let mut status = Self::new(line1, line2, "");
        status.lines[2] = line3;
        status
    }
}

impl fmt::Display for StatusLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [line1, line2, line3] = self.lines();
        write!(f, "{} | {} | {}", line1, line2, line3)
    }
}

// Rounded up, so the countdown never shows 0 while time is left.
pub fn whole_seconds(ms: u64) -> u64 {
    ms.div_ceil(1000)
}

fn truncated(text: &str) -> Line {
    let mut line = Line::new();
    for c in text.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
    line
}
