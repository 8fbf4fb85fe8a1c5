//! End-to-end tests for the sweep loop, with stub and exact backends.

use std::cell::Cell;
use std::io;
use std::sync::Arc;

use firesweep_core::sweep::{alarm_dag, build_observation_table, evaluate_point, RecordSink};
use firesweep_core::{
    run_sweep, run_to_file, Dag, Estimator, Evidence, ExactBackend, NetworkBackend,
    ObservationTable, ParamRange, Posterior, SweepConfig, SweepError, SweepParams, SweepRecord,
};

/// Counts calls and returns the row count as the model.
#[derive(Default)]
struct StubBackend {
    fits: Cell<usize>,
    infers: Cell<usize>,
    fail_on_fit: Option<usize>,
}

impl NetworkBackend for StubBackend {
    type Model = usize;

    fn fit(&self, _dag: &Dag, table: &ObservationTable) -> firesweep_core::Result<usize> {
        let n = self.fits.get() + 1;
        self.fits.set(n);
        if self.fail_on_fit == Some(n) {
            return Err(SweepError::Fit("stub failure".into()));
        }
        Ok(table.len())
    }

    fn infer(
        &self,
        model: &usize,
        query: &str,
        _evidence: &Evidence,
    ) -> firesweep_core::Result<Posterior> {
        self.infers.set(self.infers.get() + 1);
        let p = 1.0 / *model as f64;
        Ok(Posterior {
            variable: Arc::from(query),
            states: vec![0, 1],
            values: vec![1.0 - p, p],
        })
    }
}

/// Accepts records until the `fail_on`-th write, which fails like a full disk.
struct FailingSink {
    fail_on: usize,
    written: Vec<SweepRecord>,
}

impl RecordSink for FailingSink {
    fn write_record(&mut self, record: &SweepRecord) -> firesweep_core::Result<()> {
        if self.written.len() + 1 == self.fail_on {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device").into());
        }
        self.written.push(*record);
        Ok(())
    }
}

fn small_config() -> SweepConfig {
    SweepConfig {
        true_alarm: ParamRange::new(1, 3),
        false_alarm: ParamRange::new(1, 4),
        discarded_alarm: ParamRange::new(1, 5),
        ..SweepConfig::default()
    }
}

#[test]
fn default_grid_yields_25000_records_in_lexicographic_order() {
    let backend = StubBackend::default();
    let mut records: Vec<SweepRecord> = Vec::new();
    let summary = run_sweep(&SweepConfig::default(), &backend, &mut records).unwrap();

    assert_eq!(summary.records, 25_000);
    assert_eq!(records.len(), 25_000);
    assert_eq!(backend.fits.get(), 25_000);
    assert_eq!(backend.infers.get(), 25_000);

    assert_eq!(records[0].params, SweepParams::new(1, 1, 1));
    assert_eq!(records[1].params, SweepParams::new(1, 1, 2));
    assert_eq!(records[50].params, SweepParams::new(1, 2, 1));
    assert_eq!(records[2_500].params, SweepParams::new(2, 1, 1));
    assert_eq!(records[24_999].params, SweepParams::new(10, 50, 50));
    assert!(records.windows(2).all(|w| w[0].params < w[1].params));
}

#[test]
fn stub_sees_table_of_expected_size() {
    let backend = StubBackend::default();
    let mut records: Vec<SweepRecord> = Vec::new();
    run_sweep(&small_config(), &backend, &mut records).unwrap();
    for record in &records {
        let expected = 1.0 / record.params.total_rows() as f64;
        assert!((record.prob - expected).abs() < 1e-12);
    }
}

#[test]
fn failure_aborts_and_keeps_earlier_records() {
    let backend = StubBackend {
        fail_on_fit: Some(8),
        ..StubBackend::default()
    };
    let mut records: Vec<SweepRecord> = Vec::new();
    let err = run_sweep(&small_config(), &backend, &mut records).unwrap_err();
    assert!(matches!(err, SweepError::Fit(_)));
    assert_eq!(records.len(), 7);
    assert_eq!(backend.infers.get(), 7);
}

#[test]
fn invalid_config_writes_nothing() {
    let config = SweepConfig {
        discarded_alarm: ParamRange::new(0, 5),
        ..SweepConfig::default()
    };
    let mut records: Vec<SweepRecord> = Vec::new();
    let err = run_sweep(&config, &StubBackend::default(), &mut records).unwrap_err();
    assert!(matches!(err, SweepError::Config(_)));
    assert!(records.is_empty());
}

#[test]
fn sink_write_failure_aborts_the_run() {
    let backend = StubBackend::default();
    let mut sink = FailingSink {
        fail_on: 5,
        written: Vec::new(),
    };
    let err = run_sweep(&small_config(), &backend, &mut sink).unwrap_err();
    assert!(matches!(err, SweepError::Io(_)));
    assert_eq!(sink.written.len(), 4);
    assert_eq!(sink.written[3].params, SweepParams::new(1, 1, 4));
    // The failing record was computed, nothing after it was.
    assert_eq!(backend.fits.get(), 5);
}

#[test]
fn missing_output_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = SweepConfig {
        output: dir.path().join("missing").join("sim_out.txt"),
        ..small_config()
    };
    let err = run_to_file(&config).unwrap_err();
    assert!(matches!(err, SweepError::Io(_)));
    assert!(!config.output.exists());
}

#[test]
fn invalid_estimator_leaves_truncated_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("sim_out.txt");
    std::fs::write(&output, "previous run\n").unwrap();
    let config = SweepConfig {
        output: output.clone(),
        truncate: true,
        estimator: Estimator::BayesianDirichlet { pseudo_count: 0.0 },
        ..small_config()
    };
    let err = run_to_file(&config).unwrap_err();
    assert!(matches!(err, SweepError::Config(_)));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous run\n");
}

#[test]
fn scenario_one_one_one() {
    let params = SweepParams::new(1, 1, 1);
    let table = build_observation_table(params).unwrap();
    assert_eq!(table.len(), 3);
    let rows: Vec<Vec<u32>> = table.rows().collect();
    assert_eq!(rows, vec![vec![1, 1, 1], vec![0, 1, 1], vec![0, 1, 0]]);

    let dag = alarm_dag().unwrap();
    let config = SweepConfig::default();
    let record = evaluate_point(
        &ExactBackend::maximum_likelihood(),
        &dag,
        params,
        &config.query,
        &config.evidence,
    )
    .unwrap();
    assert_eq!(record.params, params);
    assert!((record.prob - 0.5).abs() < 1e-12);
    assert_eq!(
        record.to_line(),
        "{ falseAlarm: 1, trueAlarm: 1, discardedAlarm: 1, prob: 0.5 },\n"
    );
}

#[test]
fn more_true_alarms_raise_the_posterior() {
    let dag = alarm_dag().unwrap();
    let config = SweepConfig::default();
    let backend = ExactBackend::maximum_likelihood();
    let low = evaluate_point(
        &backend,
        &dag,
        SweepParams::new(1, 1, 1),
        &config.query,
        &config.evidence,
    )
    .unwrap();
    let high = evaluate_point(
        &backend,
        &dag,
        SweepParams::new(10, 1, 1),
        &config.query,
        &config.evidence,
    )
    .unwrap();
    assert!((1.0 - high.prob) < (1.0 - low.prob));
    assert!((high.prob - 10.0 / 11.0).abs() < 1e-12);
}

#[test]
fn full_run_to_file_writes_25000_lines() {
    let dir = tempfile::tempdir().unwrap();
    let config = SweepConfig {
        output: dir.path().join("sim_out.txt"),
        ..SweepConfig::default()
    };
    let summary = run_to_file(&config).unwrap();
    assert_eq!(summary.records, 25_000);

    let content = std::fs::read_to_string(&config.output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 25_000);
    assert_eq!(
        lines[0],
        "{ falseAlarm: 1, trueAlarm: 1, discardedAlarm: 1, prob: 0.5 },"
    );
    assert!(lines[24_999]
        .starts_with("{ falseAlarm: 50, trueAlarm: 10, discardedAlarm: 50, prob: "));
    assert!(content.ends_with("},\n"));
    assert!(summary.min_prob >= 0.0 && summary.max_prob <= 1.0);
}

#[test]
fn rerun_without_truncate_duplicates_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = SweepConfig {
        output: dir.path().join("sim_out.txt"),
        ..small_config()
    };
    run_to_file(&config).unwrap();
    let first = std::fs::read_to_string(&config.output).unwrap();
    run_to_file(&config).unwrap();
    let second = std::fs::read_to_string(&config.output).unwrap();

    assert_eq!(first.lines().count(), 60);
    assert_eq!(second, format!("{}{}", first, first));

    let truncating = SweepConfig {
        truncate: true,
        ..config.clone()
    };
    run_to_file(&truncating).unwrap();
    assert_eq!(std::fs::read_to_string(&config.output).unwrap(), first);
}
