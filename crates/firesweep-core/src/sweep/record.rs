//! Output records and their text form.
//!
//! One line per iteration:
//!
//! ```text
//! { falseAlarm: 3, trueAlarm: 1, discardedAlarm: 7, prob: 0.25 },
//! ```
//!
//! The trailing comma and the missing enclosing brackets are part of the
//! format; the file is meant to be pasted into an array literal by hand.

use std::fmt;

use crate::sweep::config::SweepParams;

/// One sweep result: the counts and `P(F=1 | A=1, M=1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepRecord {
    pub params: SweepParams,
    pub prob: f64,
}

impl SweepRecord {
    pub fn new(params: SweepParams, prob: f64) -> Self {
        Self { params, prob }
    }

    /// The record as written to the output file, newline included.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for SweepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ falseAlarm: {}, trueAlarm: {}, discardedAlarm: {}, prob: {} }},",
            self.params.false_alarm,
            self.params.true_alarm,
            self.params.discarded_alarm,
            format_probability(self.prob)
        )
    }
}

/// Shortest round-trip decimal, with `.0` on integral values and an
/// exponent (two-digit minimum) below `1e-4`.
pub fn format_probability(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value != 0.0 && value.abs() < 1e-4 {
        let sci = format!("{:e}", value);
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => sci,
        };
    }
    if value.fract() == 0.0 {
        return format!("{:.1}", value);
    }
    format!("{}", value)
}
