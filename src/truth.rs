//! Building the truth branch from generator and detector-simulation output
//!
//! Simulated particles are enriched with the deposit bookkeeping of the
//! truth-hit index (visible energy, containment in the active volumes), and
//! generator interactions are paired with their flux metadata and with the
//! particles that descend from them. Both collections are built once per
//! event, before any slice is assembled, and are immutable afterwards.

use crate::{
    inputs::{ActiveVolume, McInteractionInput, McParticleInput},
    records::{TrueInteraction, TrueParticle, TruthBranch},
    truthmatch::TruthHitIndex,
};

/// Build the whole-event simulated particle list
pub fn build_true_particles(
    mc_particles: &[McParticleInput],
    index: &TruthHitIndex,
    volumes: &[ActiveVolume],
) -> Vec<TrueParticle> {
    mc_particles
        .iter()
        .map(|part| {
            let contained = volumes
                .iter()
                .any(|vol| vol.contains(&part.start) && vol.contains(&part.end));
            TrueParticle {
                track_id: part.track_id,
                pdg: part.pdg,
                parent: part.parent,
                interaction: part.interaction,
                start_momentum: part.start_momentum,
                start: part.start,
                end: part.end,
                length: (part.end - part.start).norm(),
                visible_energy: index.total_energy(part.track_id),
                contained,
            }
        })
        .collect()
}

/// Build the truth branch from the generator interactions
///
/// Each interaction gathers the simulated particles that descend from it,
/// in particle-collection order, and sums their visible energy.
pub fn build_truth_branch(
    mc_truths: &[McInteractionInput],
    particles: &[TrueParticle],
) -> TruthBranch {
    let interactions = mc_truths
        .iter()
        .enumerate()
        .map(|(index, truth)| {
            let descendants: Vec<&TrueParticle> = particles
                .iter()
                .filter(|part| part.interaction == Some(index))
                .collect();
            TrueInteraction {
                index,
                nu_pdg: truth.nu_pdg,
                is_cc: truth.is_cc,
                mode: truth.mode,
                energy: truth.energy,
                vertex: truth.vertex,
                parent_pdg: truth.flux.as_ref().map(|flux| flux.parent_pdg),
                parent_decay_mode: truth.flux.as_ref().map(|flux| flux.decay_mode),
                particles: descendants.iter().map(|part| part.track_id).collect(),
                visible_energy: descendants.iter().map(|part| part.visible_energy).sum(),
            }
        })
        .collect();
    TruthBranch { interactions }
}
