//! Sweep configuration and the parameter grid.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{Result, SweepError};
use crate::network::{Estimator, Evidence};

/// Default output file, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "sim_out.txt";
/// Query variable: fire.
pub const QUERY_VARIABLE: &str = "F";
/// Largest count accepted for any one row pattern.
pub const MAX_PATTERN_COUNT: usize = 1_000_000;
/// Largest number of grid points accepted for one run.
pub const MAX_GRID_POINTS: usize = 100_000_000;

/// An inclusive range of row-pattern counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRange {
    pub start: usize,
    pub end: usize,
}

impl ParamRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.start == 0 {
            return Err(SweepError::Config(format!(
                "{} range must start at 1 or above, got {}",
                name, self
            )));
        }
        if self.is_empty() {
            return Err(SweepError::Config(format!("{} range {} is empty", name, self)));
        }
        if self.end > MAX_PATTERN_COUNT {
            return Err(SweepError::Config(format!(
                "{} range {} exceeds the maximum count {}",
                name, self, MAX_PATTERN_COUNT
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ParamRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Parses `LO:HI` (inclusive) or a single count `N`.
impl FromStr for ParamRange {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| SweepError::Config(format!("invalid range bound '{}': {}", part, e)))
        };
        match s.split_once(':') {
            Some((lo, hi)) => Ok(Self::new(parse(lo)?, parse(hi)?)),
            None => {
                let n = parse(s)?;
                Ok(Self::new(n, n))
            }
        }
    }
}

/// Row-pattern counts for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepParams {
    /// Copies of `(F=1, A=1, M=1)`.
    pub true_alarm: usize,
    /// Copies of `(F=0, A=1, M=1)`.
    pub false_alarm: usize,
    /// Copies of `(F=0, A=1, M=0)`.
    pub discarded_alarm: usize,
}

impl SweepParams {
    pub const fn new(true_alarm: usize, false_alarm: usize, discarded_alarm: usize) -> Self {
        Self {
            true_alarm,
            false_alarm,
            discarded_alarm,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.true_alarm + self.false_alarm + self.discarded_alarm
    }
}

/// Everything a sweep run needs. `Default` reproduces the reference run.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub true_alarm: ParamRange,
    pub false_alarm: ParamRange,
    pub discarded_alarm: ParamRange,
    pub output: PathBuf,
    /// Truncate the output before writing. Off by default: runs append.
    pub truncate: bool,
    pub estimator: Estimator,
    pub query: String,
    pub evidence: Evidence,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            true_alarm: ParamRange::new(1, 10),
            false_alarm: ParamRange::new(1, 50),
            discarded_alarm: ParamRange::new(1, 50),
            output: PathBuf::from(DEFAULT_OUTPUT),
            truncate: false,
            estimator: Estimator::MaximumLikelihood,
            query: QUERY_VARIABLE.to_string(),
            evidence: Evidence::new().with("A", 1).with("M", 1),
        }
    }
}

impl SweepConfig {
    /// Checks ranges, grid size, query, and estimator before anything is
    /// opened or written.
    pub fn validate(&self) -> Result<()> {
        self.true_alarm.validate("trueAlarm")?;
        self.false_alarm.validate("falseAlarm")?;
        self.discarded_alarm.validate("discardedAlarm")?;
        self.true_alarm
            .len()
            .checked_mul(self.false_alarm.len())
            .and_then(|n| n.checked_mul(self.discarded_alarm.len()))
            .filter(|&n| n <= MAX_GRID_POINTS)
            .ok_or_else(|| {
                SweepError::Config(format!(
                    "grid {} x {} x {} exceeds {} points",
                    self.true_alarm, self.false_alarm, self.discarded_alarm, MAX_GRID_POINTS
                ))
            })?;
        if self.query.is_empty() {
            return Err(SweepError::Config("query variable must not be empty".into()));
        }
        self.estimator
            .validate()
            .map_err(|e| SweepError::Config(format!("invalid estimator: {}", e)))?;
        Ok(())
    }

    pub fn grid(&self) -> SweepGrid {
        SweepGrid::new(self.true_alarm, self.false_alarm, self.discarded_alarm)
    }
}

/// Lexicographic iteration over `(true_alarm, false_alarm, discarded_alarm)`.
///
/// `true_alarm` is the outermost loop, `discarded_alarm` the innermost.
#[derive(Debug, Clone)]
pub struct SweepGrid {
    true_alarm: ParamRange,
    false_alarm: ParamRange,
    discarded_alarm: ParamRange,
    position: usize,
}

impl SweepGrid {
    pub fn new(true_alarm: ParamRange, false_alarm: ParamRange, discarded_alarm: ParamRange) -> Self {
        Self {
            true_alarm,
            false_alarm,
            discarded_alarm,
            position: 0,
        }
    }

    /// Number of combinations in the full grid, regardless of position.
    /// Saturates instead of overflowing; [`SweepConfig::validate`] rejects
    /// grids that large.
    pub fn total(&self) -> usize {
        self.true_alarm
            .len()
            .saturating_mul(self.false_alarm.len())
            .saturating_mul(self.discarded_alarm.len())
    }

    fn params_at(&self, index: usize) -> SweepParams {
        let inner = self.discarded_alarm.len();
        let middle = self.false_alarm.len() * inner;
        SweepParams {
            true_alarm: self.true_alarm.start + index / middle,
            false_alarm: self.false_alarm.start + (index % middle) / inner,
            discarded_alarm: self.discarded_alarm.start + index % inner,
        }
    }
}

impl Iterator for SweepGrid {
    type Item = SweepParams;

    fn next(&mut self) -> Option<SweepParams> {
        if self.position >= self.total() {
            return None;
        }
        let params = self.params_at(self.position);
        self.position += 1;
        Some(params)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SweepGrid {}
