#![cfg_attr(not(test), no_std)]

/*
 * Pedestrian crossing controller.
 *
 * A push button requests a timed legal crossing that stops vehicle traffic.
 * One or two motion sensors detect people crossing outside that window and
 * raise an audible and visual alert. Three independently clocked monitors,
 * the button debouncer, the motion correlator and the crossing controller,
 * talk to each other only through a handful of shared flags.
 *
 * Nothing in this library reads a clock or touches a pin. Callers pass in
 * millisecond timestamps and raw levels, which keeps every component testable
 * on the host.
 */

pub mod log;

pub mod actuator;
pub mod config;
pub mod controller;
pub mod debouncer;
pub mod error;
pub mod motion;
pub mod shared;
pub mod status;
pub mod timed_output_masker;

pub use actuator::{Lights, OutputActuator};
pub use config::Policy;
pub use controller::{CrossingController, CrossingState};
pub use debouncer::{ButtonEvent, InputDebouncer};
pub use motion::{MotionCorrelator, MotionEvent};
pub use shared::{EventFlags, SharedEventState};
pub use status::StatusLines;
