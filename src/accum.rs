//! This module accumulates exposure and event counts across the whole job
//!
//! The accumulator is the only state that outlives an event. It is created
//! when the output destination opens, fed once per sub-run and once per
//! event, and turned into a [`JobSummary`] at shutdown. A job that never
//! processed an event refuses to finalize rather than produce an empty
//! output.

use crate::{
    error::{Error, Result},
    numeric::Float,
};
use std::fmt;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

/// Running totals of the job
#[derive(Default)]
pub struct ExposureAccumulator {
    /// Protons-on-target summed over every sub-run seen so far
    total_pot: Float,

    /// Exposure of the sub-run currently being processed
    subrun_pot: Float,

    /// Number of sub-runs seen so far
    subruns: usize,

    /// Number of events processed so far
    events: usize,
}
//
impl ExposureAccumulator {
    /// Prepare for accumulation; totals start at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the exposure of one sub-run
    ///
    /// A sub-run without a recorded exposure counts as zero protons on
    /// target, which is ordinary for non-beam data.
    pub fn record_subrun(&mut self, pot: Option<Float>) {
        self.subrun_pot = pot.unwrap_or(0.);
        self.total_pot += self.subrun_pot;
        self.subruns += 1;
    }

    /// Record one processed event
    pub fn record_event(&mut self) {
        self.events += 1;
    }

    /// Exposure of the sub-run currently being processed
    pub fn subrun_pot(&self) -> Float {
        self.subrun_pot
    }

    /// Integrate the totals of another accumulator
    pub fn merge(&mut self, other: Self) {
        self.total_pot += other.total_pot;
        self.subruns += other.subruns;
        self.events += other.events;
    }

    /// Turn the running totals into the shutdown summary
    ///
    /// Refuses when no event was ever processed; the host must not write an
    /// output file in that case.
    pub fn finalize(self) -> Result<JobSummary> {
        if self.events == 0 {
            return Err(Error::NothingProcessed);
        }
        let completed = OffsetDateTime::now_utc()
            .format(&Rfc2822)
            .unwrap_or_default();
        Ok(JobSummary {
            total_pot: self.total_pot,
            subruns: self.subruns,
            events: self.events,
            completed,
        })
    }
}

/// Final counters of a finished job
pub struct JobSummary {
    /// Protons-on-target summed over the whole job
    pub total_pot: Float,

    /// Number of sub-runs processed
    pub subruns: usize,

    /// Number of events processed
    pub events: usize,

    /// Timestamp of when the job finished
    pub completed: String,
}

impl fmt::Display for JobSummary {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Total POT      : {}", self.total_pot)?;
        writeln!(fmt, "Total sub-runs : {}", self.subruns)?;
        writeln!(fmt, "Total events   : {}", self.events)?;
        write!(fmt, "Completed      : {}", self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_events_finalize_to_three() {
        let mut accum = ExposureAccumulator::new();
        accum.record_subrun(Some(1e18));
        for _ in 0..3 {
            accum.record_event();
        }
        let summary = accum.finalize().unwrap();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.subruns, 1);
        assert_eq!(summary.total_pot, 1e18);
    }

    #[test]
    fn zero_events_withhold_finalization() {
        let mut accum = ExposureAccumulator::new();
        accum.record_subrun(Some(1e18));
        assert!(matches!(accum.finalize(), Err(Error::NothingProcessed)));
    }

    #[test]
    fn missing_pot_counts_as_zero_exposure() {
        let mut accum = ExposureAccumulator::new();
        accum.record_subrun(None);
        accum.record_subrun(Some(2e18));
        accum.record_event();
        let summary = accum.finalize().unwrap();
        assert_eq!(summary.total_pot, 2e18);
        assert_eq!(summary.subruns, 2);
    }

    #[test]
    fn merge_matches_sequential_accumulation() {
        let mut first = ExposureAccumulator::new();
        first.record_subrun(Some(1e18));
        first.record_event();

        let mut second = ExposureAccumulator::new();
        second.record_subrun(Some(2e18));
        second.record_event();
        second.record_event();

        first.merge(second);
        let summary = first.finalize().unwrap();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.subruns, 2);
        assert_eq!(summary.total_pot, 3e18);
    }
}
