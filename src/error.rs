/*
 * Errors from the status surface.
 *
 * None of these are fatal. The control loop keeps running and the affected
 * status update is skipped.
 */

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum DisplayError {
    /// The display could not be brought up at boot; it stays absent.
    Init,
    /// Another writer held the display for too long.
    LockTimeout,
    /// The bus transaction failed.
    Write,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Init => write!(f, "display initialization failed"),
            DisplayError::LockTimeout => write!(f, "display busy, update skipped"),
            DisplayError::Write => write!(f, "display write failed"),
        }
    }
}

impl core::error::Error for DisplayError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_say_the_update_was_skipped() {
        assert_eq!(
            DisplayError::LockTimeout.to_string(),
            "display busy, update skipped"
        );
    }
}
