//! Dashboard lookups and event resolution.

use dynamodb_client::{covid_summary, flu_summary, AggregateWriter};
use etl_core::{AggregatedRecord, CovidCounters, EntityId, FluCounters, OffsetSlots};
use integration_tests::fixtures;
use integration_tests::mocks::{MemoryStore, MockEvents};
use reference::resolve_event;
use std::sync::Arc;

async fn seed_monthly(store: &Arc<MemoryStore>) {
    let mut covid = OffsetSlots::new(CovidCounters::new(1000, 20));
    covid.week3 = Some(CovidCounters::new(800, 16));
    let covid = AggregatedRecord::from_slots(EntityId::new("california-alameda"), covid);
    AggregateWriter::<CovidCounters>::upsert_records(&**store, &[covid])
        .await
        .unwrap();

    let mut flu = OffsetSlots::new(FluCounters::new(30, 600));
    flu.week3 = Some(FluCounters::new(10, 500));
    let flu = AggregatedRecord::from_slots(EntityId::hhs_region(9), flu);
    AggregateWriter::<FluCounters>::upsert_records(&**store, &[flu])
        .await
        .unwrap();
}

#[tokio::test]
async fn covid_summary_reports_today_and_monthly_rates() {
    let store = MemoryStore::new();
    seed_monthly(&store).await;

    let summary = covid_summary(&*store, &EntityId::county("California", "Alameda"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.daily_cases, 1000);
    assert_eq!(summary.daily_deaths, 20);
    assert_eq!(summary.monthly_case_rate, 25.0);
    assert_eq!(summary.monthly_death_rate, 25.0);
}

#[tokio::test]
async fn flu_summary_reports_both_rates() {
    let store = MemoryStore::new();
    seed_monthly(&store).await;

    let summary = flu_summary(&*store, &EntityId::hhs_region(9))
        .await
        .unwrap()
        .unwrap();

    assert!((summary.today_rate - 0.05).abs() < 1e-12);
    assert!((summary.week3_rate - 0.02).abs() < 1e-12);
}

#[tokio::test]
async fn not_found_is_distinct_from_failure() {
    let store = MemoryStore::new();
    seed_monthly(&store).await;

    let missing = covid_summary(&*store, &EntityId::new("oregon-lane")).await;
    assert!(matches!(missing, Ok(None)));
    let missing = flu_summary(&*store, &EntityId::hhs_region(1)).await;
    assert!(matches!(missing, Ok(None)));

    store.set_fail_reads(true);
    let err = covid_summary(&*store, &EntityId::new("california-alameda"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), Some("STORE_001"));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn event_resolves_to_dashboard_figures() {
    let store = MemoryStore::new();
    seed_monthly(&store).await;
    let events = MockEvents::new();
    events.insert("893792827407", fixtures::event("94501"));

    let location = resolve_event(&events, &fixtures::geo(), &fixtures::states(), "893792827407")
        .await
        .unwrap();
    assert_eq!(location.county.as_str(), "california-alameda");
    assert_eq!(location.region.as_str(), "hhs9");
    assert_eq!(location.event.name, "Spring Street Fair");

    let covid = covid_summary(&*store, &location.county).await.unwrap();
    let flu = flu_summary(&*store, &location.region).await.unwrap();
    assert_eq!(covid.unwrap().monthly_case_rate, 25.0);
    assert!(flu.is_some());
}

#[tokio::test]
async fn unresolvable_events_are_not_found() {
    let events = MockEvents::new();
    // Oregon is in the geo table but not in the states list.
    events.insert("oregon-event", fixtures::event("97401"));
    events.insert("unknown-zip", fixtures::event("00501"));
    let geo = fixtures::geo();
    let states = fixtures::states();

    for id in ["no-such-event", "oregon-event", "unknown-zip"] {
        let err = resolve_event(&events, &geo, &states, id).await.unwrap_err();
        assert!(err.is_not_found(), "{}: {}", id, err);
    }

    events.set_should_fail(true);
    let err = resolve_event(&events, &geo, &states, "oregon-event")
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
}
