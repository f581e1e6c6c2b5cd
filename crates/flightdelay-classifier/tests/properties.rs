// Property-based tests for the classification rules.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use flightdelay_classifier::{
    classify, classify_fields, fields, DelayCategory, FlightRecord, RejectReason, TimeOfDay,
};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn departure(hour: u32, minute: u32) -> String {
    format!("2024-06-15T{hour:02}:{minute:02}:00")
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn blank_departure_always_rejects(
        padding in "[ \t]{0,4}",
        delay in "\\PC{0,8}",
    ) {
        let err = classify_fields(Some(padding.as_str()), Some(delay.as_str())).unwrap_err();
        prop_assert_eq!(err, RejectReason::MissingDeparture);

        let err = classify_fields(None, Some(delay.as_str())).unwrap_err();
        prop_assert_eq!(err, RejectReason::MissingDeparture);
    }

    #[test]
    fn delays_with_a_non_digit_always_reject(
        prefix in "[0-9]{0,3}",
        bad in "[^0-9\\s]".prop_filter("trimmed away", |c| !c.chars().any(char::is_whitespace)),
        suffix in "[0-9]{0,3}",
    ) {
        let delay = format!("{prefix}{bad}{suffix}");
        let err = classify_fields(Some("2024-06-15T10:00:00"), Some(delay.as_str())).unwrap_err();
        prop_assert_eq!(err.code(), "invalid_delay_minutes");
    }

    #[test]
    fn negative_delays_always_reject(minutes in 1i64..100_000) {
        let delay = format!("-{minutes}");
        let err = classify_fields(Some("2024-06-15T10:00:00"), Some(delay.as_str())).unwrap_err();
        prop_assert_eq!(err.code(), "invalid_delay_minutes");
    }

    #[test]
    fn accepted_records_are_delayed_iff_positive(
        hour in 0u32..24,
        minute in 0u32..60,
        minutes in 0i64..10_000,
    ) {
        let delay = minutes.to_string();
        let derived = classify_fields(Some(departure(hour, minute).as_str()), Some(delay.as_str()))
            .unwrap();
        prop_assert_eq!(derived.is_delayed, minutes > 0);
        prop_assert_eq!(derived.delay_minutes, minutes);
        prop_assert_eq!(derived.overrides_reason(), minutes == 0);
    }

    #[test]
    fn every_hour_gets_exactly_one_daypart(hour in 0u32..24, minute in 0u32..60) {
        let derived = classify_fields(Some(departure(hour, minute).as_str()), Some("1")).unwrap();
        let matching: Vec<TimeOfDay> = TimeOfDay::ALL
            .into_iter()
            .filter(|bucket| match bucket {
                TimeOfDay::Morning => (5..12).contains(&hour),
                TimeOfDay::Afternoon => (12..17).contains(&hour),
                TimeOfDay::Evening => (17..21).contains(&hour),
                TimeOfDay::Night => !(5..21).contains(&hour),
            })
            .collect();
        prop_assert_eq!(matching, vec![derived.time_of_day]);
    }

    #[test]
    fn every_delay_gets_exactly_one_category(minutes in 0i64..100_000) {
        let delay = minutes.to_string();
        let derived = classify_fields(Some("2024-06-15T10:00:00"), Some(delay.as_str())).unwrap();
        let matching: Vec<DelayCategory> = DelayCategory::ALL
            .into_iter()
            .filter(|category| match category {
                DelayCategory::OnTime => minutes <= 0,
                DelayCategory::ShortDelay => (1..=15).contains(&minutes),
                DelayCategory::ModerateDelay => (16..=60).contains(&minutes),
                DelayCategory::LongDelay => minutes > 60,
            })
            .collect();
        prop_assert_eq!(matching, vec![derived.delay_category]);
    }

    #[test]
    fn classification_only_touches_delay_reason(
        hour in 0u32..24,
        minutes in 0i64..500,
        reason in "[A-Za-z ]{0,12}",
        airline in "[A-Z]{2}",
    ) {
        let record = FlightRecord::from_pairs([
            (fields::AIRLINE.to_string(), airline.clone()),
            (fields::SCHEDULED_DEPARTURE.to_string(), departure(hour, 0)),
            (fields::DELAY_MINUTES.to_string(), minutes.to_string()),
            (fields::DELAY_REASON.to_string(), reason.clone()),
        ]);

        let enriched = classify(record.clone()).accepted().unwrap();
        for (name, value) in record.iter() {
            let out = enriched.record.get(name).unwrap();
            if name == fields::DELAY_REASON && minutes == 0 {
                prop_assert_eq!(out, fields::ON_TIME_REASON);
            } else {
                prop_assert_eq!(out, value);
            }
        }
        prop_assert_eq!(enriched.record.len(), record.len());
    }
}
