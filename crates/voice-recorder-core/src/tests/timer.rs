use crate::{ElapsedTime, TICK};

use std::time::Duration;

/// WHAT: Elapsed time formats as minutes, seconds and hundredths
/// WHY: The recording timer label shows MM:SS:hh
#[test]
fn given_elapsed_hundredths_when_formatting_then_mm_ss_hh() {
    // Given
    let zero = ElapsedTime::ZERO;
    let sample = ElapsedTime::from_hundredths(6_123);
    let long = ElapsedTime::from_hundredths(100 * 60 * 125 + 7);

    // When / Then
    assert_eq!(zero.to_string(), "00:00:00");
    assert_eq!(sample.to_string(), "01:01:23");
    assert_eq!((sample.minutes(), sample.seconds(), sample.hundredths()), (1, 1, 23));
    assert_eq!(long.to_string(), "125:00:07");
}

/// WHAT: One clock unit is ten milliseconds
/// WHY: Hundredths of a second must track wall time
#[test]
fn given_tick_when_inspected_then_ten_milliseconds() {
    assert_eq!(TICK, Duration::from_millis(10));
    assert_eq!(ElapsedTime::from_hundredths(42).as_hundredths(), 42);
}
