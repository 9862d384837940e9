//! Full runs of the pipeline against in-memory buckets and tables.

use etl_core::{CovidCounters, Domain, FluCounters, Offset, HHS_REGION_COUNT};
use integration_tests::fixtures::{self, covid, day, reference_date};
use integration_tests::mocks::{MemoryObjects, MemoryStore};
use s3_source::{covid_key, flu_key};
use std::sync::Arc;
use worker::{aggregate_phase, Phase, Pipeline, PipelineConfig};

fn pipeline(objects: &Arc<MemoryObjects>, store: &Arc<MemoryStore>) -> Pipeline<MemoryObjects, MemoryStore> {
    Pipeline::new(
        PipelineConfig::immediate(),
        objects.clone(),
        store.clone(),
        fixtures::buckets(),
        Arc::new(fixtures::states()),
    )
}

#[tokio::test]
async fn full_run_fills_raw_and_monthly_tables() {
    let objects = MemoryObjects::new();
    let store = MemoryStore::new();
    fixtures::seed_objects(&objects, reference_date());

    let report = pipeline(&objects, &store).run(reference_date()).await.unwrap();

    assert_eq!(report.date, reference_date());
    assert_eq!(report.phases.len(), 4);
    // Alameda, San Mateo and New York; the two placeholder counties are dropped.
    assert_eq!(report.items(Domain::Covid, Phase::Ingest), 3);
    assert_eq!(report.items(Domain::Covid, Phase::Aggregate), 3);
    assert_eq!(report.items(Domain::Flu, Phase::Ingest), HHS_REGION_COUNT as usize);
    assert_eq!(report.items(Domain::Flu, Phase::Aggregate), HHS_REGION_COUNT as usize);

    let raw = store.raw_rows::<CovidCounters>(reference_date());
    assert!(raw.iter().all(|s| !s.entity.as_str().contains("out of")));
    assert!(raw.iter().all(|s| s.entity.as_str() != "california-unassigned"));

    let alameda = store
        .monthly_record::<CovidCounters>("california-alameda")
        .unwrap();
    assert_eq!(alameda.slots.today, CovidCounters::new(1000, 20));
    // No history in the store: every offset falls back to the run date.
    assert_eq!(alameda.slots.week3, Some(alameda.slots.today));
    assert_eq!(alameda.rates.monthly_case_rate, 0.0);

    let flu_raw = store.raw_rows::<FluCounters>(reference_date());
    assert!(flu_raw.iter().all(|s| s.meta.release_date.as_deref() == Some("2021-03-19")));
    assert!(flu_raw.iter().all(|s| s.meta.ili.as_deref() == Some("1.5")));

    let hhs3 = store.monthly_record::<FluCounters>("hhs3").unwrap();
    assert_eq!(hhs3.slots.today, FluCounters::new(30, 1000));
    assert!((hhs3.rates.today_ili_rate - 0.03).abs() < 1e-12);
}

#[tokio::test]
async fn phases_run_in_order() {
    let objects = MemoryObjects::new();
    let store = MemoryStore::new();
    fixtures::seed_objects(&objects, reference_date());

    let report = pipeline(&objects, &store).run(reference_date()).await.unwrap();

    let order: Vec<_> = report.phases.iter().map(|p| (p.domain, p.phase)).collect();
    assert_eq!(
        order,
        vec![
            (Domain::Covid, Phase::Ingest),
            (Domain::Covid, Phase::Aggregate),
            (Domain::Flu, Phase::Ingest),
            (Domain::Flu, Phase::Aggregate),
        ]
    );

    let buckets = fixtures::buckets();
    let fetched = objects.fetched();
    assert_eq!(
        fetched[0],
        format!("{}/{}", buckets.covid, covid_key("California", reference_date()))
    );
    assert_eq!(
        fetched[1],
        format!("{}/{}", buckets.covid, covid_key("New York", reference_date()))
    );
    assert_eq!(fetched.len(), 2 + HHS_REGION_COUNT as usize);
    assert_eq!(
        fetched.last().unwrap(),
        &format!("{}/{}", buckets.flu, flu_key(HHS_REGION_COUNT, reference_date()))
    );

    // Covid queries all happen before any flu query.
    let queries = store.queries();
    let first_flu = queries.iter().position(|(d, _)| *d == Domain::Flu).unwrap();
    assert!(queries[..first_flu].iter().all(|(d, _)| *d == Domain::Covid));
    assert!(queries[first_flu..].iter().all(|(d, _)| *d == Domain::Flu));
}

#[tokio::test]
async fn history_from_earlier_runs_feeds_the_rates() {
    let objects = MemoryObjects::new();
    let store = MemoryStore::new();
    fixtures::seed_objects(&objects, reference_date());
    store.seed(covid("california-alameda", day(Offset::Week1), 900, 19));
    store.seed(covid("california-alameda", day(Offset::Week2), 850, 18));
    store.seed(covid("california-alameda", day(Offset::Week3), 800, 16));

    pipeline(&objects, &store).run(reference_date()).await.unwrap();

    let alameda = store
        .monthly_record::<CovidCounters>("california-alameda")
        .unwrap();
    assert_eq!(alameda.rates.monthly_case_rate, 25.0);
    assert_eq!(alameda.rates.monthly_death_rate, 25.0);

    // Present today, absent from the populated history partitions.
    let san_mateo = store
        .monthly_record::<CovidCounters>("california-san mateo")
        .unwrap();
    assert_eq!(san_mateo.slots.week3, None);
    assert_eq!(san_mateo.rates.monthly_case_rate, 0.0);
}

#[tokio::test]
async fn missing_object_aborts_before_later_phases() {
    let objects = MemoryObjects::new();
    let store = MemoryStore::new();
    fixtures::seed_objects(&objects, reference_date());
    objects.remove(&fixtures::buckets().covid, &covid_key("New York", reference_date()));

    let err = pipeline(&objects, &store)
        .run(reference_date())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), Some("SOURCE_002"));
    // California was written before the failure; nothing after it ran.
    assert_eq!(store.raw_rows::<CovidCounters>(reference_date()).len(), 2);
    assert!(store.queries().is_empty());
    assert!(store.monthly::<CovidCounters>().is_empty());
    assert!(store.monthly::<FluCounters>().is_empty());
    assert!(objects.fetched().iter().all(|key| !key.starts_with("flu-bucket")));
}

#[tokio::test]
async fn write_failure_aborts_the_run() {
    let objects = MemoryObjects::new();
    let store = MemoryStore::new();
    fixtures::seed_objects(&objects, reference_date());
    store.set_fail_writes(true);

    let err = pipeline(&objects, &store)
        .run(reference_date())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), Some("STORE_002"));
    assert_eq!(store.write_calls(), 1);
    assert_eq!(objects.fetched().len(), 1);
}

#[tokio::test]
async fn malformed_object_is_a_data_error() {
    let objects = MemoryObjects::new();
    let store = MemoryStore::new();
    fixtures::seed_objects(&objects, reference_date());
    objects.put(&fixtures::buckets().flu, &flu_key(7, reference_date()), "<html>rate limited</html>");

    let err = pipeline(&objects, &store)
        .ingest(Domain::Flu, reference_date())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), Some("DATA_001"));
    // Flu regions are written in one call after all ten parse.
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn single_domain_commands_touch_only_their_domain() {
    let objects = MemoryObjects::new();
    let store = MemoryStore::new();
    fixtures::seed_objects(&objects, reference_date());
    let pipeline = pipeline(&objects, &store);

    let ingest = pipeline.ingest(Domain::Flu, reference_date()).await.unwrap();
    assert_eq!(ingest.phase, Phase::Ingest);
    assert_eq!(ingest.items, HHS_REGION_COUNT as usize);
    assert!(store.raw_rows::<CovidCounters>(reference_date()).is_empty());

    let aggregate = pipeline
        .aggregate(Domain::Flu, reference_date())
        .await
        .unwrap();
    assert_eq!(aggregate.items, HHS_REGION_COUNT as usize);
    assert_eq!(store.monthly::<FluCounters>().len(), HHS_REGION_COUNT as usize);
    assert!(store.monthly::<CovidCounters>().is_empty());
}

#[tokio::test]
async fn aggregate_phase_needs_only_the_tables() {
    let store = MemoryStore::new();
    store.seed(covid("california-alameda", reference_date(), 1000, 20));
    store.seed(covid("california-alameda", day(Offset::Week1), 900, 19));
    store.seed(covid("california-alameda", day(Offset::Week2), 850, 18));
    store.seed(covid("california-alameda", day(Offset::Week3), 800, 16));

    let report = aggregate_phase(&store, Domain::Covid, reference_date())
        .await
        .unwrap();

    assert_eq!(report.phase, Phase::Aggregate);
    assert_eq!(report.domain, Domain::Covid);
    assert_eq!(report.items, 1);
    let alameda = store
        .monthly_record::<CovidCounters>("california-alameda")
        .unwrap();
    assert_eq!(alameda.rates.monthly_case_rate, 25.0);
    assert!(store.monthly::<FluCounters>().is_empty());
}
