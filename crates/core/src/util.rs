/// A macro to unwrap an option to its `Some` value, and panic if `None`. This
/// is the same as [Option::unwrap], except that it accepts a format string
/// and format arguments, allowing for more flexibility in error messages.
/// Reserved for contract violations that indicate a bug in the caller.
#[macro_export]
macro_rules! unwrap {
    ($opt:expr, $fmt:expr, $($arg:tt)*) => {
        match $opt {
            Some(v) => v,
            None => panic!($fmt, $($arg)*),
        }
    };
}

/// A macro to measure the evaluation time of an expression. Wraps an
/// expression, logs the elapsed time at the given level (debug by default),
/// then evaluates to the value of the expression.
#[macro_export]
macro_rules! timed {
    ($label:expr, $ex:expr) => {
        $crate::timed!($label, log::Level::Debug, $ex)
    };
    ($label:expr, $log_level:expr, $ex:expr) => {{
        let now = std::time::Instant::now();
        let value = $ex;
        let elapsed = now.elapsed();
        log::log!($log_level, "{} took {} ms", $label, elapsed.as_millis());
        value
    }};
}

/// Linear interpolation between `a` and `b`. `t` is clamped to `[0, 1]`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 1.0, 0.5), 0.5);
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
        // Out of range t gets clamped
        assert_eq!(lerp(2.0, 4.0, 3.0), 4.0);
        assert_eq!(lerp(2.0, 4.0, -1.0), 2.0);
    }

    #[test]
    fn test_timed_returns_value() {
        let value = timed!("addition", 1 + 2);
        assert_eq!(value, 3);
    }

    #[test]
    #[should_panic(expected = "missing 3")]
    fn test_unwrap_panics_with_message() {
        let opt: Option<u32> = None;
        unwrap!(opt, "missing {}", 3);
    }
}
