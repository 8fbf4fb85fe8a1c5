//! The alarm grid sweep.
//!
//! For each `(trueAlarm, falseAlarm, discardedAlarm)` combination, in nested
//! loop order:
//!
//! 1. build the synthetic observation table over `[F, A, M]`
//! 2. fit the fixed graph `F→A, F→M, A→M`
//! 3. query `P(F | A=1, M=1)`
//! 4. keep the mass at index 1 (`F=1`)
//! 5. write one record and flush it
//!
//! The first error aborts the run. Records already written stay on disk;
//! nothing is retried or resumed.

pub mod config;
pub mod record;
pub mod sink;

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::backend::NetworkBackend;
use crate::errors::{Result, SweepError};
use crate::network::{Dag, Evidence, ObservationTable, State};

pub use config::{ParamRange, SweepConfig, SweepGrid, SweepParams};
pub use record::{format_probability, SweepRecord};
pub use sink::{AppendFileSink, RecordSink};

/// Edges of the fire/alarm/mobilisation network.
pub const ALARM_EDGES: [(&str, &str); 3] = [("F", "A"), ("F", "M"), ("A", "M")];
/// Observation table columns.
pub const ALARM_COLUMNS: [&str; 3] = ["F", "A", "M"];
/// Fire, alarm raised, response mobilised.
pub const TRUE_ALARM_ROW: [State; 3] = [1, 1, 1];
/// No fire, alarm raised, response mobilised.
pub const FALSE_ALARM_ROW: [State; 3] = [0, 1, 1];
/// No fire, alarm raised, alarm discarded.
pub const DISCARDED_ALARM_ROW: [State; 3] = [0, 1, 0];
/// Position of `F=1` in the posterior value vector.
pub const POSITIVE_STATE_INDEX: usize = 1;

/// The fixed graph shape.
pub fn alarm_dag() -> Result<Dag> {
    Dag::from_edges(&ALARM_EDGES)
}

/// Concatenates the three row patterns, `true_alarm` rows first.
pub fn build_observation_table(params: SweepParams) -> Result<ObservationTable> {
    let mut table = ObservationTable::new(ALARM_COLUMNS);
    table.push_repeated(&TRUE_ALARM_ROW, params.true_alarm)?;
    table.push_repeated(&FALSE_ALARM_ROW, params.false_alarm)?;
    table.push_repeated(&DISCARDED_ALARM_ROW, params.discarded_alarm)?;
    Ok(table)
}

/// Fits, queries, and extracts the probability for one grid point.
pub fn evaluate_point<B: NetworkBackend>(
    backend: &B,
    dag: &Dag,
    params: SweepParams,
    query: &str,
    evidence: &Evidence,
) -> Result<SweepRecord> {
    let table = build_observation_table(params)?;
    let model = backend.fit(dag, &table)?;
    let posterior = backend.infer(&model, query, evidence)?;
    let prob = posterior.value_at(POSITIVE_STATE_INDEX).ok_or_else(|| {
        SweepError::Inference(format!(
            "posterior over '{}' has {} states, expected at least {}",
            query,
            posterior.values.len(),
            POSITIVE_STATE_INDEX + 1
        ))
    })?;
    if !(0.0..=1.0).contains(&prob) {
        return Err(SweepError::Numerical(format!(
            "posterior probability {} for {:?} is outside [0, 1]",
            prob, params
        )));
    }
    Ok(SweepRecord::new(params, prob))
}

/// Outcome of a completed sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSummary {
    pub records: usize,
    pub min_prob: f64,
    pub max_prob: f64,
    pub elapsed: Duration,
}

/// Runs the full grid of `config` through `backend`, writing to `sink`.
pub fn run_sweep<B, S>(config: &SweepConfig, backend: &B, sink: &mut S) -> Result<SweepSummary>
where
    B: NetworkBackend,
    S: RecordSink + ?Sized,
{
    config.validate()?;
    let dag = alarm_dag()?;
    let grid = config.grid();
    let total = grid.len();
    let outer = config.true_alarm.len();
    let t0 = Instant::now();

    info!(
        points = total,
        true_alarm = %config.true_alarm,
        false_alarm = %config.false_alarm,
        discarded_alarm = %config.discarded_alarm,
        "starting sweep"
    );

    let mut summary = SweepSummary {
        records: 0,
        min_prob: f64::INFINITY,
        max_prob: f64::NEG_INFINITY,
        elapsed: Duration::ZERO,
    };
    let mut current_outer = None;

    for params in grid {
        if current_outer != Some(params.true_alarm) {
            current_outer = Some(params.true_alarm);
            info!(
                "[{}/{}] trueAlarm={}  {}/{} records  {:.1}s",
                params.true_alarm - config.true_alarm.start + 1,
                outer,
                params.true_alarm,
                summary.records,
                total,
                t0.elapsed().as_secs_f64()
            );
        }

        let record = evaluate_point(backend, &dag, params, &config.query, &config.evidence)?;
        sink.write_record(&record)?;
        debug!(
            true_alarm = params.true_alarm,
            false_alarm = params.false_alarm,
            discarded_alarm = params.discarded_alarm,
            prob = record.prob,
            "record written"
        );

        summary.records += 1;
        summary.min_prob = summary.min_prob.min(record.prob);
        summary.max_prob = summary.max_prob.max(record.prob);
    }

    summary.elapsed = t0.elapsed();
    info!(
        "Done. {} records in {:.1}s, prob range [{:.4}, {:.4}]",
        summary.records,
        summary.elapsed.as_secs_f64(),
        summary.min_prob,
        summary.max_prob
    );
    Ok(summary)
}
