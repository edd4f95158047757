#![forbid(unsafe_code)]

//! Computed transition-duration parsing.
//!
//! Hosts express transition durations as CSS strings in either seconds
//! (`"0.6s"`) or milliseconds (`"600ms"`). Both spellings normalize to the
//! same [`Duration`]; the controller's hide delay depends on that
//! equivalence. Multi-value lists (`"0.6s, 0.3s"`) resolve to their first
//! component, matching `parseFloat` behavior in the host this models.

use web_time::Duration;

/// Parse a CSS transition-duration string into a [`Duration`].
///
/// Returns `None` for unparsable, negative, or empty input. Zero parses as
/// `Some(Duration::ZERO)`; deciding whether zero means "no transition" is the
/// caller's policy, not the parser's.
pub fn parse_transition_duration(value: &str) -> Option<Duration> {
    let first = value.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }

    let (number, scale_to_ms) = if let Some(n) = first.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = first.strip_suffix('s') {
        (n, 1_000.0)
    } else {
        return None;
    };

    let parsed: f64 = number.trim().parse().ok()?;
    if !parsed.is_finite() || parsed < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(parsed * scale_to_ms / 1_000.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn seconds_and_millis_spellings_agree() {
        assert_eq!(
            parse_transition_duration("0.6s"),
            Some(Duration::from_millis(600))
        );
        assert_eq!(
            parse_transition_duration("600ms"),
            Some(Duration::from_millis(600))
        );
    }

    #[test]
    fn first_component_of_list_wins() {
        assert_eq!(
            parse_transition_duration("0.6s, 0.3s"),
            Some(Duration::from_millis(600))
        );
        assert_eq!(
            parse_transition_duration("250ms, 1s"),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn zero_is_some_zero() {
        assert_eq!(parse_transition_duration("0s"), Some(Duration::ZERO));
        assert_eq!(parse_transition_duration("0ms"), Some(Duration::ZERO));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_transition_duration(""), None);
        assert_eq!(parse_transition_duration("fast"), None);
        assert_eq!(parse_transition_duration("600"), None);
        assert_eq!(parse_transition_duration("-0.3s"), None);
        assert_eq!(parse_transition_duration("NaNs"), None);
    }

    #[test]
    fn whitespace_is_tolerated() {
        assert_eq!(
            parse_transition_duration("  0.25s "),
            Some(Duration::from_millis(250))
        );
    }

    proptest! {
        #[test]
        fn spellings_always_agree(ms in 0u32..3_600_000) {
            let as_ms = parse_transition_duration(&format!("{ms}ms")).unwrap();
            let as_s = parse_transition_duration(&format!("{}s", f64::from(ms) / 1000.0)).unwrap();
            // Identical up to float rounding in from_secs_f64.
            let delta = as_ms.abs_diff(as_s);
            prop_assert!(delta <= Duration::from_micros(1), "delta {delta:?}");
        }

        #[test]
        fn never_panics_on_arbitrary_input(s in "\\PC*") {
            let _ = parse_transition_duration(&s);
        }
    }
}
