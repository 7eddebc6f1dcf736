/*
 * Logging macros shared by the library and the firmware.
 *
 * On the bare-metal target these forward to defmt, which ships the log over
 * RTT. Host unit tests print to stdout. Any other host build discards the
 * message, but still type-checks the arguments.
 */

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($defmt:ident, $label:literal, $($arg:tt)*) => {{
        #[cfg(target_os = "none")]
        ::defmt::$defmt!($($arg)*);

        #[cfg(all(not(target_os = "none"), test))]
        println!("[{}] {}", $label, format_args!($($arg)*));

        #[cfg(all(not(target_os = "none"), not(test)))]
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log!(info, "INFO", $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log!(warn, "WARN", $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log!(error, "ERROR", $($arg)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log!(debug, "DEBUG", $($arg)*) };
}
