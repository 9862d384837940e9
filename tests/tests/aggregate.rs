//! Rate aggregation against in-memory raw tables.

use dynamodb_client::AggregateWriter;
use etl_core::{CovidCounters, Domain, FluCounters, Offset};
use integration_tests::fixtures::{covid, day, flu, reference_date};
use integration_tests::mocks::MemoryStore;
use worker::RateAggregator;

#[tokio::test]
async fn alameda_month_yields_twenty_five_percent() {
    let store = MemoryStore::new();
    store.seed(covid("california-alameda", day(Offset::Today), 1000, 20));
    store.seed(covid("california-alameda", day(Offset::Week1), 900, 19));
    store.seed(covid("california-alameda", day(Offset::Week2), 850, 18));
    store.seed(covid("california-alameda", day(Offset::Week3), 800, 16));

    let aggregator = RateAggregator::new(store.clone());
    let records = aggregator
        .aggregate::<CovidCounters>(reference_date())
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.slots.today, CovidCounters::new(1000, 20));
    assert_eq!(record.slots.week1, Some(CovidCounters::new(900, 19)));
    assert_eq!(record.slots.week2, Some(CovidCounters::new(850, 18)));
    assert_eq!(record.slots.week3, Some(CovidCounters::new(800, 16)));
    assert_eq!(record.rates.monthly_case_rate, 25.0);
    assert_eq!(record.rates.monthly_death_rate, 25.0);
}

#[tokio::test]
async fn one_record_per_today_entity_only() {
    let store = MemoryStore::new();
    store.seed(covid("california-alameda", day(Offset::Today), 120, 2));
    store.seed(covid("texas-travis", day(Offset::Today), 70, 1));
    store.seed(covid("california-alameda", day(Offset::Week1), 110, 2));
    store.seed(covid("oregon-lane", day(Offset::Week2), 40, 0));
    store.seed(covid("california-alameda", day(Offset::Week3), 100, 2));

    let aggregator = RateAggregator::new(store.clone());
    let records = aggregator
        .aggregate::<CovidCounters>(reference_date())
        .await
        .unwrap();

    let entities: Vec<&str> = records.iter().map(|r| r.entity.as_str()).collect();
    assert_eq!(entities, vec!["california-alameda", "texas-travis"]);

    let alameda = &records[0];
    assert_eq!(alameda.rates.monthly_case_rate, 20.0);
    assert_eq!(alameda.slots.week2, None);

    // Missing from every historical partition: slots unset, rates zero.
    let travis = &records[1];
    assert_eq!(travis.slots.week1, None);
    assert_eq!(travis.slots.week3, None);
    assert_eq!(travis.rates.monthly_case_rate, 0.0);
    assert_eq!(travis.rates.monthly_death_rate, 0.0);
}

#[tokio::test]
async fn each_partition_is_queried_once_in_offset_order() {
    let store = MemoryStore::new();
    for offset in Offset::ALL {
        store.seed(covid("ohio-franklin", day(offset), 10, 0));
    }

    RateAggregator::new(store.clone())
        .aggregate::<CovidCounters>(reference_date())
        .await
        .unwrap();

    let expected: Vec<_> = Offset::ALL
        .iter()
        .map(|offset| (Domain::Covid, day(*offset)))
        .collect();
    assert_eq!(store.queries(), expected);
}

#[tokio::test]
async fn zero_week3_counts_give_zero_rates() {
    let store = MemoryStore::new();
    store.seed(covid("ohio-franklin", day(Offset::Today), 50, 3));
    store.seed(covid("ohio-franklin", day(Offset::Week3), 0, 0));
    // keep the other partitions non-empty so no fallback applies
    store.seed(covid("ohio-other", day(Offset::Week1), 1, 0));
    store.seed(covid("ohio-other", day(Offset::Week2), 1, 0));

    let records = RateAggregator::new(store.clone())
        .aggregate::<CovidCounters>(reference_date())
        .await
        .unwrap();

    assert_eq!(records[0].slots.week3, Some(CovidCounters::new(0, 0)));
    assert_eq!(records[0].rates.monthly_case_rate, 0.0);
    assert_eq!(records[0].rates.monthly_death_rate, 0.0);
}

#[tokio::test]
async fn missing_history_collapses_onto_today() {
    let store = MemoryStore::new();
    store.seed(covid("california-alameda", day(Offset::Today), 1000, 20));
    store.seed(covid("texas-travis", day(Offset::Today), 70, 1));

    let records = RateAggregator::new(store.clone())
        .aggregate::<CovidCounters>(reference_date())
        .await
        .unwrap();

    for record in &records {
        let today = Some(record.slots.today);
        assert_eq!(record.slots.week1, today);
        assert_eq!(record.slots.week2, today);
        assert_eq!(record.slots.week3, today);
        assert_eq!(record.rates.monthly_case_rate, 0.0);
    }

    let fallbacks = store
        .queries()
        .iter()
        .filter(|(_, date)| *date == reference_date())
        .count();
    assert_eq!(fallbacks, 4);
}

#[tokio::test]
async fn aggregation_is_idempotent() {
    let store = MemoryStore::new();
    store.seed(covid("california-alameda", day(Offset::Today), 1000, 20));
    store.seed(covid("california-alameda", day(Offset::Week1), 900, 19));
    store.seed(covid("california-alameda", day(Offset::Week2), 850, 18));
    store.seed(covid("california-alameda", day(Offset::Week3), 800, 16));
    let aggregator = RateAggregator::new(store.clone());

    let first = aggregator
        .aggregate::<CovidCounters>(reference_date())
        .await
        .unwrap();
    AggregateWriter::<CovidCounters>::upsert_records(&*store, &first)
        .await
        .unwrap();
    let after_first = store.monthly::<CovidCounters>();

    let second = aggregator
        .aggregate::<CovidCounters>(reference_date())
        .await
        .unwrap();
    AggregateWriter::<CovidCounters>::upsert_records(&*store, &second)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.monthly::<CovidCounters>(), after_first);
}

#[tokio::test]
async fn flu_rates_are_ili_shares() {
    let store = MemoryStore::new();
    store.seed(flu(4, day(Offset::Today), 30, 600));
    store.seed(flu(4, day(Offset::Week1), 25, 550));
    store.seed(flu(4, day(Offset::Week2), 20, 520));
    store.seed(flu(4, day(Offset::Week3), 10, 500));
    store.seed(flu(5, day(Offset::Today), 7, 0));

    let records = RateAggregator::new(store.clone())
        .aggregate::<FluCounters>(reference_date())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    let hhs4 = &records[0];
    assert_eq!(hhs4.entity.as_str(), "hhs4");
    assert!((hhs4.rates.today_ili_rate - 0.05).abs() < 1e-12);
    assert!((hhs4.rates.week3_ili_rate - 0.02).abs() < 1e-12);

    let hhs5 = &records[1];
    assert_eq!(hhs5.rates.today_ili_rate, 0.0);
    assert_eq!(hhs5.rates.week3_ili_rate, 0.0);

    // Flu queries never touch covid partitions.
    assert!(store.queries().iter().all(|(domain, _)| *domain == Domain::Flu));
}

#[tokio::test]
async fn read_failure_is_returned_as_store_001() {
    let store = MemoryStore::new();
    store.seed(covid("california-alameda", day(Offset::Today), 1000, 20));
    store.set_fail_reads(true);

    let err = RateAggregator::new(store.clone())
        .aggregate::<CovidCounters>(reference_date())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), Some("STORE_001"));
    assert_eq!(store.queries().len(), 1);
}
