//! Per-event orchestration of the record assembly
//!
//! One [`EventProcessor`] lives for the whole job. For every event the host
//! hands it the materialized inputs; it builds the truth branch and the
//! truth-hit index, classifies the simulation sources, runs the fake
//! reconstruction, walks the slices through the assembler, fills the header,
//! and finishes with the one cross-slice pass that designates, per truth
//! interaction, the single reconstructed object that best matches it.

use crate::{
    accum::ExposureAccumulator,
    assoc::Resolver,
    config::Configuration,
    error::Result,
    fakereco::FakeReco,
    inputs::EventInputs,
    reco, slices,
    records::{EventRecord, Header, McType, SliceRecord, TruthBranch},
    slices::ResolvedAssociations,
    truth,
    truthmatch::TruthHitIndex,
};
use std::collections::HashMap;
use tracing::info;

/// Job-lived assembly driver
pub struct EventProcessor<'cfg> {
    /// Job configuration
    cfg: &'cfg Configuration,

    /// Lookup policy shared by every resolution in the job
    resolver: Resolver,

    /// Fake-reconstruction pass, carrying its generator across events
    fake_reco: FakeReco,
}
//
impl<'cfg> EventProcessor<'cfg> {
    /// Set up the driver for one job
    pub fn new(cfg: &'cfg Configuration) -> Self {
        EventProcessor {
            cfg,
            resolver: Resolver::new(cfg.strict),
            fake_reco: FakeReco::new(cfg.fake_reco_seed),
        }
    }

    /// Assemble the record of one event
    ///
    /// Processing is synchronous and leaves no per-event state behind; the
    /// accumulator is the only thing shared across events.
    pub fn process_event(
        &mut self,
        inputs: &EventInputs,
        accum: &mut ExposureAccumulator,
    ) -> Result<EventRecord> {
        let cfg = self.cfg;
        accum.record_event();

        // ### TRUTH ###

        let mc_truths = self.resolver.require(
            inputs.mc_truths.as_ref(),
            &cfg.gen_label,
            "generator truth",
        )?;
        // The secondary generators are probed, never required; their absence
        // only matters to the simulation-type classification
        let mc_type = classify_mc_type(
            mc_truths.is_some(),
            inputs.cosmic_mc_truths.is_some(),
            inputs.particle_gun_mc_truths.is_some(),
        );

        let sim_channels = self.resolver.require(
            inputs.sim_channels.as_ref(),
            &cfg.sim_channel_label,
            "simulated energy deposits",
        )?;
        let truth_index = sim_channels.map(|channels| TruthHitIndex::build(channels));
        let empty_index = TruthHitIndex::build(&[]);

        let mc_particles = self.resolver.require(
            inputs.mc_particles.as_ref(),
            &cfg.g4_label,
            "simulated particles",
        )?;
        let true_particles = mc_particles
            .map(|particles| {
                truth::build_true_particles(
                    particles,
                    truth_index.as_ref().unwrap_or(&empty_index),
                    &inputs.active_volumes,
                )
            })
            .unwrap_or_default();

        let truth_branch = mc_truths
            .map(|truths| truth::build_truth_branch(truths, &true_particles))
            .unwrap_or_else(TruthBranch::default);

        let mc_tracks = self.resolver.require(
            inputs.mc_tracks.as_ref(),
            &cfg.mc_track_label,
            "fast-simulation tracks",
        )?;
        let fake_reco = match (mc_truths, mc_tracks) {
            (Some(truths), Some(tracks)) => {
                self.fake_reco.fill(truths, tracks, &inputs.active_volumes)
            }
            _ => Vec::new(),
        };

        // ### DETECTOR ###

        let pass_flash_trigger = self
            .resolver
            .require(
                inputs.flash_trigger.as_ref(),
                &cfg.flash_trigger_label,
                "flash-trigger decision",
            )?
            .copied()
            .unwrap_or(false);

        let crt_hits = self
            .resolver
            .require(inputs.crt_hits.as_ref(), &cfg.crt_hit_label, "CRT hits")?
            .map(|hits| reco::fill_crt_hits(hits, cfg.crt_use_ts0))
            .unwrap_or_default();

        // ### SLICES ###

        let slice_inputs = self.resolver.require(
            inputs.slices.as_ref(),
            &cfg.particle_label,
            "slices",
        )?;
        let assocs = ResolvedAssociations::resolve(&self.resolver, cfg, inputs)?;

        let mut slice_records = Vec::new();
        if let Some(slice_inputs) = slice_inputs {
            for (slice_index, slice) in slice_inputs.iter().enumerate() {
                if let Some(record) = slices::assemble_slice(
                    slice_index,
                    slice,
                    cfg,
                    inputs,
                    &assocs,
                    truth_index.as_ref(),
                    &true_particles,
                )? {
                    slice_records.push(record);
                }
            }
        }

        // ### RECORD ###

        let mut record = EventRecord {
            header: Header {
                run: inputs.run,
                subrun: inputs.subrun,
                is_mc: !inputs.is_real_data,
                mc_type,
                // The exposure recorded at the last sub-run boundary
                pot: accum.subrun_pot(),
            },
            slices: slice_records,
            truth: truth_branch,
            true_particles,
            fake_reco,
            crt_hits,
            pass_flash_trigger,
        };

        designate_candidates(&mut record);

        info!(
            run = record.header.run,
            subrun = record.header.subrun,
            slices = record.slices.len(),
            interactions = record.truth.interactions.len(),
            "assembled event record"
        );
        Ok(record)
    }
}

/// Decide how the event was simulated from which truth sources are present
///
/// An overlay of beam and cosmic simulation takes precedence over either
/// single-source classification.
fn classify_mc_type(has_gen: bool, has_cosmic: bool, has_particle_gun: bool) -> McType {
    match (has_gen, has_cosmic, has_particle_gun) {
        (true, true, _) => McType::Overlay,
        (true, false, _) => McType::Neutrino,
        (false, true, _) => McType::Cosmic,
        (false, false, true) => McType::ParticleGun,
        (false, false, false) => McType::Unknown,
    }
}

/// Designate at most one reconstructed object per truth interaction
///
/// Scans every track and shower of every kept slice and, for each truth
/// interaction, flags the object with the best completeness as "the"
/// matched candidate. Ties go to the earliest slice, then the earliest
/// particle within it. Completeness is the designation criterion because it
/// measures how much of the interaction's signal the object captured.
fn designate_candidates(record: &mut EventRecord) {
    // Dominant particle to owning interaction
    let interaction_of: HashMap<i32, usize> = record
        .true_particles
        .iter()
        .filter_map(|part| part.interaction.map(|nu| (part.track_id, nu)))
        .collect();

    /// Where one candidate object lives
    struct Candidate {
        slice: usize,
        is_track: bool,
        position: usize,
        completeness: crate::numeric::Float,
    }

    let mut best: Vec<Option<Candidate>> = Vec::new();
    best.resize_with(record.truth.interactions.len(), || None);

    for (slice_index, slc) in record.slices.iter().enumerate() {
        // Walk the slice's objects in particle order so that the first
        // strictly-better candidate seen is also the tie-break winner
        let mut objects: Vec<(usize, bool, usize, &crate::records::ObjectTruth)> = slc
            .tracks
            .iter()
            .enumerate()
            .map(|(i, trk)| (trk.particle_index, true, i, &trk.truth))
            .chain(
                slc.showers
                    .iter()
                    .enumerate()
                    .map(|(i, shw)| (shw.particle_index, false, i, &shw.truth)),
            )
            .collect();
        objects.sort_by_key(|&(particle_index, ..)| particle_index);

        for (_, is_track, position, truth) in objects {
            let Some(particle) = truth.matched.particle() else {
                continue;
            };
            let Some(&nu) = interaction_of.get(&particle) else {
                continue;
            };
            let completeness = truth.matched.completeness().unwrap_or(0.);
            let better = match &best[nu] {
                None => true,
                Some(candidate) => completeness > candidate.completeness,
            };
            if better {
                best[nu] = Some(Candidate {
                    slice: slice_index,
                    is_track,
                    position,
                    completeness,
                });
            }
        }
    }

    for candidate in best.into_iter().flatten() {
        let slc: &mut SliceRecord = &mut record.slices[candidate.slice];
        if candidate.is_track {
            slc.tracks[candidate.position].truth.designated = true;
        } else {
            slc.showers[candidate.position].truth.designated = true;
        }
    }
}
