//! Flight time derived from departure and landing clock times.
//!
//! Both inputs are wall-clock times without a date. A landing earlier in the
//! day than the departure means the flight crossed midnight exactly once.

use chrono::{Duration, NaiveTime};

/// Elapsed time between a departure and a landing time of day.
///
/// If `landing` is earlier than `departure` the landing is taken to be on the
/// following day, so the result is always in `0..24h`. Equal times give zero.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, NaiveTime};
/// use pdtlog::compute::flight_time;
///
/// let dep = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
/// let ldg = NaiveTime::from_hms_opt(1, 0, 0).unwrap();
/// assert_eq!(flight_time(dep, ldg), Duration::hours(2));
/// ```
#[must_use]
pub fn flight_time(departure: NaiveTime, landing: NaiveTime) -> Duration {
    let elapsed = landing.signed_duration_since(departure);
    if elapsed < Duration::zero() {
        elapsed + Duration::days(1)
    } else {
        elapsed
    }
}

/// Flight time to persist for an operation.
///
/// An explicitly supplied duration always wins; the calculator only runs when
/// none is given.
#[must_use]
pub fn resolve_flight_time(
    explicit: Option<Duration>,
    departure: NaiveTime,
    landing: NaiveTime,
) -> Duration {
    explicit.unwrap_or_else(|| flight_time(departure, landing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_same_day() {
        assert_eq!(flight_time(hm(10, 0), hm(11, 30)), Duration::minutes(90));
    }

    #[test]
    fn test_overnight() {
        assert_eq!(flight_time(hm(23, 0), hm(1, 0)), Duration::hours(2));
    }

    #[test]
    fn test_equal_times_is_zero() {
        assert_eq!(flight_time(hm(8, 15), hm(8, 15)), Duration::zero());
    }

    #[test]
    fn test_landing_at_midnight() {
        assert_eq!(flight_time(hm(22, 45), hm(0, 0)), Duration::minutes(75));
    }

    #[test]
    fn test_one_minute_before_departure_wraps_almost_full_day() {
        assert_eq!(
            flight_time(hm(12, 0), hm(11, 59)),
            Duration::hours(24) - Duration::minutes(1)
        );
    }

    #[test]
    fn test_seconds_are_kept() {
        let dep = NaiveTime::from_hms_opt(9, 0, 10).unwrap();
        let ldg = NaiveTime::from_hms_opt(9, 30, 40).unwrap();
        assert_eq!(flight_time(dep, ldg), Duration::seconds(30 * 60 + 30));
    }

    #[test]
    fn test_resolve_uses_explicit_value() {
        let manual = Duration::minutes(42);
        assert_eq!(
            resolve_flight_time(Some(manual), hm(10, 0), hm(11, 30)),
            manual
        );
    }

    #[test]
    fn test_resolve_computes_when_absent() {
        assert_eq!(
            resolve_flight_time(None, hm(23, 0), hm(1, 0)),
            Duration::hours(2)
        );
    }

    fn arb_time() -> impl Strategy<Value = NaiveTime> {
        (0u32..86_400)
            .prop_map(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap())
    }

    proptest! {
        #[test]
        fn prop_forward_pairs_are_plain_difference(a in arb_time(), b in arb_time()) {
            let (dep, ldg) = if a <= b { (a, b) } else { (b, a) };
            prop_assert_eq!(flight_time(dep, ldg), ldg - dep);
        }

        #[test]
        fn prop_backward_pairs_wrap_once(a in arb_time(), b in arb_time()) {
            prop_assume!(a != b);
            let (ldg, dep) = if a < b { (a, b) } else { (b, a) };
            let d = flight_time(dep, ldg);
            prop_assert_eq!(d, (ldg - dep) + Duration::days(1));
            prop_assert!(d > Duration::zero());
            prop_assert!(d < Duration::days(1));
        }

        #[test]
        fn prop_repeatable(dep in arb_time(), ldg in arb_time()) {
            prop_assert_eq!(flight_time(dep, ldg), flight_time(dep, ldg));
        }

        #[test]
        fn prop_explicit_always_wins(dep in arb_time(), ldg in arb_time(), mins in 0i64..10_000) {
            let manual = Duration::minutes(mins);
            prop_assert_eq!(resolve_flight_time(Some(manual), dep, ldg), manual);
        }
    }
}
