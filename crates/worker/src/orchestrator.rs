//! Run orchestration.
//!
//! A scheduled run goes covid ingest → covid aggregate → flu ingest → flu
//! aggregate, with fixed pauses between bulk-write phases to stay inside
//! provisioned table throughput. The first failure ends the run.

use chrono::NaiveDate;
use dynamodb_client::{AggregateWriter, DomainStore};
use etl_core::{partition_key, Counters, CovidCounters, Domain, FluCounters, Result};
use reference::StateRegions;
use s3_source::{BucketNames, ObjectSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::aggregator::RateAggregator;
use crate::ingest::Ingestor;

/// Pauses between bulk writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause between two states' covid ingests
    #[serde(default = "default_state_delay_secs")]
    pub state_delay_secs: u64,
    /// Pause between phases
    #[serde(default = "default_phase_delay_secs")]
    pub phase_delay_secs: u64,
}

fn default_state_delay_secs() -> u64 {
    5
}

fn default_phase_delay_secs() -> u64 {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            state_delay_secs: default_state_delay_secs(),
            phase_delay_secs: default_phase_delay_secs(),
        }
    }
}

impl PipelineConfig {
    /// No pauses at all.
    pub fn immediate() -> Self {
        Self {
            state_delay_secs: 0,
            phase_delay_secs: 0,
        }
    }

    pub fn state_delay(&self) -> Duration {
        Duration::from_secs(self.state_delay_secs)
    }

    pub fn phase_delay(&self) -> Duration {
        Duration::from_secs(self.phase_delay_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Ingest,
    Aggregate,
}

/// Outcome of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub domain: Domain,
    pub phase: Phase,
    /// Snapshots written for ingest, records upserted for aggregate
    pub items: usize,
    pub elapsed_ms: u64,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub date: NaiveDate,
    pub phases: Vec<PhaseReport>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn items(&self, domain: Domain, phase: Phase) -> usize {
        self.phases
            .iter()
            .filter(|p| p.domain == domain && p.phase == phase)
            .map(|p| p.items)
            .sum()
    }
}

/// Aggregates one domain for `date` and upserts the monthly records.
///
/// Needs only the tables, so it can run without an object source.
pub async fn aggregate_phase<S>(store: &Arc<S>, domain: Domain, date: NaiveDate) -> Result<PhaseReport>
where
    S: DomainStore<CovidCounters> + DomainStore<FluCounters> + ?Sized,
{
    let start = Instant::now();

    let items = match domain {
        Domain::Covid => aggregate_domain::<CovidCounters, S>(store, date).await?,
        Domain::Flu => aggregate_domain::<FluCounters, S>(store, date).await?,
    };

    Ok(phase_report(domain, Phase::Aggregate, items, start))
}

async fn aggregate_domain<C, S>(store: &Arc<S>, date: NaiveDate) -> Result<usize>
where
    C: Counters,
    S: DomainStore<C> + ?Sized,
{
    let records = RateAggregator::new(store.clone()).aggregate::<C>(date).await?;
    AggregateWriter::<C>::upsert_records(&**store, &records).await
}

fn phase_report(domain: Domain, phase: Phase, items: usize, start: Instant) -> PhaseReport {
    let report = PhaseReport {
        domain,
        phase,
        items,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        domain = %domain,
        phase = ?phase,
        items = items,
        elapsed_ms = report.elapsed_ms,
        "Phase complete"
    );
    report
}

/// Sequences ingestion and aggregation against one set of tables.
pub struct Pipeline<O: ?Sized, S: ?Sized> {
    config: PipelineConfig,
    ingestor: Ingestor<O, S>,
    store: Arc<S>,
    states: Arc<StateRegions>,
}

impl<O, S> Pipeline<O, S>
where
    O: ObjectSource + ?Sized,
    S: DomainStore<CovidCounters> + DomainStore<FluCounters> + ?Sized,
{
    pub fn new(
        config: PipelineConfig,
        source: Arc<O>,
        store: Arc<S>,
        buckets: BucketNames,
        states: Arc<StateRegions>,
    ) -> Self {
        Self {
            config,
            ingestor: Ingestor::new(source, store.clone(), buckets),
            store,
            states,
        }
    }

    /// Runs every phase of both domains for `date`.
    pub async fn run(&self, date: NaiveDate) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", run_id = %run_id, date = %partition_key(date));

        async move {
            let start = Instant::now();
            let mut phases = Vec::with_capacity(4);
            info!(states = self.states.len(), "Run starting");

            phases.push(self.ingest(Domain::Covid, date).await?);
            self.pause().await;
            phases.push(self.aggregate(Domain::Covid, date).await?);
            self.pause().await;
            phases.push(self.ingest(Domain::Flu, date).await?);
            self.pause().await;
            phases.push(self.aggregate(Domain::Flu, date).await?);

            let report = RunReport {
                run_id,
                date,
                phases,
                elapsed_ms: start.elapsed().as_millis() as u64,
            };

            let m = metrics().snapshot();
            info!(
                elapsed_ms = report.elapsed_ms,
                objects_fetched = m.objects_fetched,
                snapshots_written = m.snapshots_written,
                snapshots_read = m.snapshots_read,
                records_written = m.records_written,
                partition_fallbacks = m.partition_fallbacks,
                store_latency_mean_ms = m.store_latency_mean_ms,
                "Run complete"
            );

            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Loads one domain's raw objects for `date`.
    pub async fn ingest(&self, domain: Domain, date: NaiveDate) -> Result<PhaseReport> {
        let start = Instant::now();

        let items = match domain {
            Domain::Covid => {
                let mut written = 0;
                for (i, state) in self.states.states().iter().enumerate() {
                    if i > 0 && !self.config.state_delay().is_zero() {
                        tokio::time::sleep(self.config.state_delay()).await;
                    }
                    written += self.ingestor.ingest_covid_state(state, date).await?;
                }
                written
            }
            Domain::Flu => self.ingestor.ingest_flu(date).await?,
        };

        Ok(phase_report(domain, Phase::Ingest, items, start))
    }

    /// Aggregates one domain for `date` and upserts the monthly records.
    pub async fn aggregate(&self, domain: Domain, date: NaiveDate) -> Result<PhaseReport> {
        aggregate_phase(&self.store, domain, date).await
    }

    async fn pause(&self) {
        let delay = self.config.phase_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
