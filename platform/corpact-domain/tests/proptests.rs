use corpact_domain::services::marker_tracker::MarkerTracker;
use corpact_domain::value_objects::markers::ExpectedMarkers;
use corpact_domain::value_objects::payload::{
    EventDetails, EventType, GeneralInformation, KeyDates, MandatoryVoluntary, OptionEntry,
    OptionType, Rate, RateAndPrice, SubmissionDocument, SubmissionPayload, UnderlyingSecurity,
};
use proptest::prelude::*;
use std::time::Duration;

const MARKERS: [&str; 4] = [
    "DMZ Service: Received submission",
    "[EventBus] Published event",
    "Internal Service: Processing event",
    "Internal Service: Successfully saved ENCRYPTED Corporate Action CA-TEST-001",
];

fn option_type() -> impl Strategy<Value = OptionType> {
    prop_oneof![
        Just(OptionType::Cash),
        Just(OptionType::Securities),
        Just(OptionType::Lapse),
    ]
}

fn payload() -> impl Strategy<Value = SubmissionPayload> {
    (
        "[A-Z]{2}-[A-Z0-9]{1,8}",
        prop::collection::vec(("[0-9]{3}", option_type()), 1..5),
        0usize..5,
        prop::option::of(1u32..100_000),
        prop::option::of("[A-Z]{1,5}"),
    )
        .prop_map(|(event_id, options, default_idx, cents, ticker)| {
            let default_idx = default_idx % options.len();
            SubmissionPayload {
                general_information: GeneralInformation {
                    event_id,
                    event_type: EventType::CashDividend,
                    mandatory_voluntary: MandatoryVoluntary::Voluntary,
                },
                details: EventDetails {
                    dates: KeyDates {
                        announcement_date: "2024-01-02".to_string(),
                        ex_date: Some("2024-01-09".to_string()),
                        record_date: "2024-01-10".to_string(),
                        payment_date: "2024-01-31".to_string(),
                    },
                    rate_and_price: cents.map(|c| RateAndPrice {
                        gross_dividend_rate: Some(Rate {
                            amount: Some(f64::from(c) / 100.0),
                            currency: Some("EUR".to_string()),
                        }),
                    }),
                },
                underlying_security: UnderlyingSecurity {
                    isin: "DE000BASF111".to_string(),
                    ticker,
                },
                options: options
                    .into_iter()
                    .enumerate()
                    .map(|(idx, (number, option_type))| OptionEntry {
                        option_number: number,
                        option_type,
                        default_option: Some(idx == default_idx),
                    })
                    .collect(),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn found_markers_never_shrink(snapshots in prop::collection::vec(prop::collection::vec(0usize..4, 0..4), 1..12)) {
        let mut tracker = MarkerTracker::new(&ExpectedMarkers::new(MARKERS));
        let mut previous = 0usize;
        for (idx, snapshot) in snapshots.iter().enumerate() {
            let content = snapshot
                .iter()
                .map(|i| MARKERS[*i])
                .collect::<Vec<_>>()
                .join("\n");
            tracker.observe(&content, Duration::from_millis(idx as u64));
            let found = tracker.found().len();
            prop_assert!(found >= previous);
            prop_assert_eq!(found + tracker.missing().len(), MARKERS.len());
            previous = found;
        }
    }

    #[test]
    fn growing_record_converges_once_all_markers_appear(order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(), noise in "[a-z ]{0,40}") {
        let mut tracker = MarkerTracker::new(&ExpectedMarkers::new(MARKERS));
        let mut content = noise.clone();
        for (step, idx) in order.iter().enumerate() {
            prop_assert!(!tracker.is_complete());
            content.push_str(MARKERS[*idx]);
            content.push('\n');
            tracker.observe(&content, Duration::from_millis(step as u64));
        }
        prop_assert!(tracker.is_complete());
        prop_assert_eq!(tracker.observed_order().len(), MARKERS.len());
    }

    #[test]
    fn payload_json_round_trips_unchanged(payload in payload()) {
        let json = payload.to_json().expect("serialize");
        let parsed: SubmissionPayload = serde_json::from_str(&json).expect("parse");
        prop_assert_eq!(parsed.options.iter().filter(|o| o.is_default()).count(), 1);
        prop_assert_eq!(&parsed, &payload);
        prop_assert_eq!(parsed.to_json().expect("serialize"), json.clone());

        let document = SubmissionDocument::from_json(&json).expect("document");
        prop_assert_eq!(document.event_id(), payload.event_id());
        prop_assert!(document.preflight().is_empty());
    }
}
