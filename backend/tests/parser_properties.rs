use proptest::prelude::*;

use forex_ingest::feed::parse_ticks;
use forex_ingest::ticks::Tick;

fn pair() -> impl Strategy<Value = String> {
    "[A-Z]{3}/[A-Z]{3}"
}

fn price() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e9..1.0e9_f64,
        (0u32..100_000).prop_map(f64::from),
    ]
}

prop_compose! {
    fn any_tick()(
        pair in pair(),
        timestamp_ms in any::<i64>(),
        bid_big in price(),
        bid_points in price(),
        offer_big in price(),
        offer_points in price(),
        high in price(),
        low in price(),
    ) -> Tick {
        Tick { pair, timestamp_ms, bid_big, bid_points, offer_big, offer_points, high, low }
    }
}

fn row(fields: &[String]) -> String {
    fields.join(",")
}

fn fields_of(t: &Tick) -> Vec<String> {
    t.to_record().iter().map(str::to_string).collect()
}

/// Never parses as an integer or a float (no "inf"/"nan" lookalikes).
fn garbage() -> impl Strategy<Value = String> {
    "x[a-z]{0,4}"
}

proptest! {
    #[test]
    fn valid_rows_decode_to_their_values(t in any_tick()) {
        let body = row(&fields_of(&t));
        let out = parse_ticks(body.as_bytes()).unwrap();

        prop_assert_eq!(out.ticks.len(), 1);
        let decoded = &out.ticks[&t.pair];
        prop_assert_eq!(decoded, &t);
        prop_assert_eq!(fields_of(decoded), fields_of(&t));
    }

    #[test]
    fn any_non_numeric_field_excludes_the_row(
        t in any_tick(),
        col in 1usize..8,
        junk in garbage(),
    ) {
        let mut fields = fields_of(&t);
        fields[col] = junk;

        let keeper = Tick { pair: "KEEP/ME".into(), ..t.clone() };
        let body = format!("{}\n{}", row(&fields), row(&fields_of(&keeper)));
        let out = parse_ticks(body.as_bytes()).unwrap();

        prop_assert!(!out.ticks.contains_key(&t.pair));
        prop_assert!(out.ticks.contains_key("KEEP/ME"));
        prop_assert_eq!(out.rejected.len(), 1);
        prop_assert_eq!(out.rejected[0].line, 1);
    }

    #[test]
    fn later_row_wins_for_shared_pair(first in any_tick(), second in any_tick()) {
        let second = Tick { pair: first.pair.clone(), ..second };
        let body = format!("{}\n{}\n", row(&fields_of(&first)), row(&fields_of(&second)));
        let out = parse_ticks(body.as_bytes()).unwrap();

        prop_assert_eq!(out.ticks.len(), 1);
        prop_assert_eq!(&out.ticks[&first.pair], &second);
    }
}
