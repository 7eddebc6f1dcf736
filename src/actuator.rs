/*
 * The narrow interface through which the controller drives the outside world.
 *
 * The vehicle indicator is a stop/caution/go triple of which exactly one line
 * is lit. The buzzer is only switched on or off here; its on/off cadence is
 * produced downstream by the output masker. Status updates are best effort and
 * may be dropped by the implementation.
 */

use crate::status::StatusLines;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Lights {
    pub stop: bool,
    pub caution: bool,
    pub go: bool,
}

impl Lights {
    pub const VEHICLES_GO: Lights = Lights::new(false, false, true);
    pub const VEHICLES_STOP: Lights = Lights::new(true, false, false);
    pub const CAUTION: Lights = Lights::new(false, true, false);

    pub const fn new(stop: bool, caution: bool, go: bool) -> Self {
        Self { stop, caution, go }
    }
}

pub trait OutputActuator {
    fn set_lights(&mut self, lights: Lights);

    fn set_buzzer(&mut self, on: bool);

    /// Must not block the caller for long; an update that cannot be shown
    /// right now is dropped.
    fn show_status(&mut self, status: &StatusLines);
}
