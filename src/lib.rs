//! cafmaker: assembling common analysis records from reconstruction output
//!
//!
//! # Introduction (for the physicist)
//!
//! A liquid-argon detector's reconstruction chain leaves behind a web of
//! object collections: slices of hits grouped into candidate interactions,
//! particle hierarchies, fitted tracks and showers, flash matches, tagger
//! hits, and the simulation truth that produced all of it. Analyzers do not
//! want the web; they want one flattened record per slice with everything
//! resolved, truth-matched, and ready to cut on. This crate builds that
//! record.
//!
//!
//! # Introduction (for the data-processing guy)
//!
//! The hard part is not copying fields, it is resolving associations. Every
//! mapping between collections is a named, possibly absent, possibly
//! many-to-many table. The engine resolves each one through a single policy
//! (tolerate what is intentionally absent, abort or warn on what is
//! unexpectedly missing, always abort on structurally impossible states),
//! matches reconstructed objects to simulated particles by deposited-energy
//! overlap, and degrades gracefully wherever the inputs are partial.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The host framework drives three entry points:
//!
//! * [`Configuration::load`] once per job,
//! * [`EventProcessor::process_event`] once per event, synchronously,
//! * [`ExposureAccumulator`] at open/sub-run/event/shutdown boundaries.
//!
//! Each event is processed to completion before the next begins and leaves
//! no state behind apart from the accumulator's counters. Output persistence
//! belongs to the host; this crate only hands back finished
//! [`EventRecord`]s.

#![warn(missing_docs)]

pub mod accum;
pub mod assoc;
pub mod config;
pub mod error;
pub mod event;
pub mod fakereco;
pub mod inputs;
pub mod momentum;
pub mod numeric;
pub mod reco;
pub mod records;
pub mod slices;
pub mod truth;
pub mod truthmatch;

pub use crate::{
    accum::{ExposureAccumulator, JobSummary},
    config::Configuration,
    error::{Error, Result},
    event::EventProcessor,
    inputs::EventInputs,
    records::EventRecord,
};
