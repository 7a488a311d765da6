//! Property tests for the range resolver.
//!
//! 1. Intraday requests ending today and reaching past the cap are clamped to
//!    exactly the cap, with a warning
//! 2. Daily-or-coarser intervals never clamp
//! 3. A resolved range always satisfies start < end <= today
//! 4. Requests inside the window pass through untouched

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use stockfetch_core::domain::Interval;
use stockfetch_core::range::{resolve, resolve_request, RangePreset, RangeRequest};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_today() -> impl Strategy<Value = NaiveDate> {
    (0i64..20_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1980, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn arb_intraday() -> impl Strategy<Value = Interval> {
    prop::sample::select(
        Interval::ALL
            .iter()
            .copied()
            .filter(|i| i.is_intraday())
            .collect::<Vec<_>>(),
    )
}

fn arb_daily() -> impl Strategy<Value = Interval> {
    prop::sample::select(
        Interval::ALL
            .iter()
            .copied()
            .filter(|i| !i.is_intraday())
            .collect::<Vec<_>>(),
    )
}

fn arb_interval() -> impl Strategy<Value = Interval> {
    prop::sample::select(Interval::ALL.to_vec())
}

// ── 1. Intraday clamp ────────────────────────────────────────────────

proptest! {
    #[test]
    fn intraday_clamp_spans_exactly_the_cap(
        interval in arb_intraday(),
        today in arb_today(),
        extra in 1i64..2_000,
    ) {
        let cap = interval.lookback_cap_days().unwrap();
        let start = today - Duration::days(cap + extra);

        let range = resolve(interval, start, today, today).unwrap();
        prop_assert_eq!(range.span_days(), cap);
        prop_assert_eq!(range.end, today);

        let warning = range.warning.unwrap();
        prop_assert_eq!(warning.requested_start, start);
        prop_assert_eq!(warning.effective_start, range.start);
        prop_assert_eq!(warning.cap_days, cap);
    }
}

// ── 2. Daily never clamps ────────────────────────────────────────────

proptest! {
    #[test]
    fn daily_or_coarser_never_clamps(
        interval in arb_daily(),
        today in arb_today(),
        back in 1i64..30_000,
    ) {
        let start = today - Duration::days(back);
        let range = resolve(interval, start, today, today).unwrap();
        prop_assert_eq!(range.start, start);
        prop_assert_eq!(range.end, today);
        prop_assert!(range.warning.is_none());
    }
}

// ── 3. Output bounds ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn resolved_range_is_ordered_and_not_in_future(
        interval in arb_interval(),
        today in arb_today(),
        start_off in -400i64..400,
        end_off in -400i64..400,
    ) {
        let start = today + Duration::days(start_off);
        let end = today + Duration::days(end_off);
        if let Ok(range) = resolve(interval, start, end, today) {
            prop_assert!(range.start < range.end);
            prop_assert!(range.end <= today);
            prop_assert!(range.start >= start);
            if let Some(cap) = interval.lookback_cap_days() {
                prop_assert!(range.start >= today - Duration::days(cap));
            }
        }
    }

    #[test]
    fn start_not_before_end_is_always_rejected(
        interval in arb_interval(),
        today in arb_today(),
        start_off in -400i64..0,
        gap in 0i64..50,
    ) {
        let start = today + Duration::days(start_off);
        let end = start - Duration::days(gap);
        prop_assert!(resolve(interval, start, end, today).is_err());
    }
}

// ── 4. In-window pass-through ────────────────────────────────────────

proptest! {
    #[test]
    fn in_window_requests_are_unchanged(
        interval in arb_intraday(),
        today in arb_today(),
        back in 1i64..7,
    ) {
        let start = today - Duration::days(back);
        let range = resolve(interval, start, today, today).unwrap();
        prop_assert_eq!(range.start, start);
        prop_assert!(range.warning.is_none());
    }

    #[test]
    fn every_offered_preset_resolves(
        interval in arb_interval(),
        today in arb_today(),
    ) {
        for preset in interval.presets() {
            if *preset == RangePreset::Custom {
                continue;
            }
            let range = resolve_request(interval, &RangeRequest::Preset(*preset), today);
            prop_assert!(range.is_ok(), "{} {} failed: {:?}", interval, preset.slug(), range);
        }
    }
}

#[test]
fn one_minute_ten_day_request_is_clamped_to_seven() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let range = resolve(Interval::M1, today - Duration::days(10), today, today).unwrap();
    assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());
    assert!(range.warning.is_some());
}

#[test]
fn max_request_uses_window_or_earliest_history() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let intraday = resolve_request(Interval::M5, &RangeRequest::Max, today).unwrap();
    assert_eq!(intraday.span_days(), 60);
    assert!(intraday.warning.is_none());

    let daily = resolve_request(Interval::D1, &RangeRequest::Max, today).unwrap();
    assert_eq!(daily.start, stockfetch_core::range::earliest_history());
}
