//! Per-slice record assembly
//!
//! For every candidate interaction the pattern recognition produced, this
//! module resolves which reconstructed objects belong to it, finds its
//! primary particle, applies the selection policy, and classifies each child
//! of the hierarchy as track-like or shower-like before handing it to the
//! type-specific fillers. The sequence is strictly the same for every slice:
//! resolve, select primary, summarize, cut, truth-match, classify children,
//! append.

use crate::{
    assoc::{Association, Resolver},
    config::Configuration,
    error::{Error, Result},
    inputs::{EventInputs, FlashMatchInput, HitInput, ParticleMetadataInput, SliceInput, VertexInput},
    numeric::Float,
    reco,
    records::{
        ObjectTruth, SliceRecord, TrueParticle, MCS_HYPOTHESES, NUM_MCS_HYPOTHESES,
        NUM_RANGE_HYPOTHESES, RANGE_HYPOTHESES,
    },
    truthmatch::{TruthHitIndex, TruthMatch},
};
use tracing::debug;

/// Every association the slice loop consumes, resolved up front
///
/// All lookups happen before any slice is assembled, so a strict-mode
/// resolution failure surfaces before the first record is emitted and the
/// loop itself only performs guarded indexed access.
pub struct ResolvedAssociations<'ev> {
    /// Slice to child particles
    pub slice_particles: Association<'ev>,

    /// Slice to its hits
    pub slice_hits: Association<'ev>,

    /// Particle to its fitted track
    pub particle_tracks: Association<'ev>,

    /// Particle to its fitted shower
    pub particle_showers: Association<'ev>,

    /// Particle to its interaction vertex
    pub particle_vertices: Association<'ev>,

    /// Particle to its pattern-recognition metadata
    pub particle_metadata: Association<'ev>,

    /// Particle to its flash-match result
    pub particle_flash_matches: Association<'ev>,

    /// Track to the hits it was fit from
    pub track_hits: Association<'ev>,

    /// Shower to the hits it was fit from
    pub shower_hits: Association<'ev>,

    /// Track to its per-plane calorimetry
    pub track_calorimetry: Association<'ev>,

    /// Track to its per-plane particle identification
    pub track_particle_ids: Association<'ev>,

    /// Track to a matched cosmic-ray-tagger hit
    pub track_crt_hits: Association<'ev, Float>,

    /// Track to its scattering momentum fit, per mass hypothesis
    pub track_mcs_fits: [Association<'ev>; NUM_MCS_HYPOTHESES],

    /// Track to its range momentum fit, per mass hypothesis
    pub track_range_fits: [Association<'ev>; NUM_RANGE_HYPOTHESES],

    /// Shower to its selection residual
    pub shower_residuals: Association<'ev>,

    /// Shower to its track refit
    pub shower_track_fits: Association<'ev>,

    /// Shower to its density profile fit
    pub shower_density_fits: Association<'ev>,
}
//
impl<'ev> ResolvedAssociations<'ev> {
    /// Resolve every association table the slice loop will consume
    pub fn resolve(
        resolver: &Resolver,
        cfg: &Configuration,
        inputs: &'ev EventInputs,
    ) -> Result<Self> {
        let n_slices = inputs.slices.as_ref().map_or(0, Vec::len);
        let n_particles = inputs.particles.len();
        let n_tracks = inputs.tracks.len();
        let n_showers = inputs.showers.len();
        let assocs = &inputs.assocs;

        // Hypothesis tables are read under instance-qualified labels; an
        // empty base label keeps every instance intentionally absent
        let instance = |base: &str, name: &str| {
            if base.is_empty() {
                String::new()
            } else {
                format!("{}:{}", base, name)
            }
        };

        let mut track_mcs_fits: [Association<'ev>; NUM_MCS_HYPOTHESES] =
            std::array::from_fn(|_| Association::Absent);
        for (hypothesis, name) in MCS_HYPOTHESES.iter().enumerate() {
            track_mcs_fits[hypothesis] = resolver.resolve(
                &assocs.track_mcs_fits,
                n_tracks,
                &instance(&cfg.mcs_label, name),
                "track",
                "scattering fit",
            )?;
        }
        let mut track_range_fits: [Association<'ev>; NUM_RANGE_HYPOTHESES] =
            std::array::from_fn(|_| Association::Absent);
        for (hypothesis, name) in RANGE_HYPOTHESES.iter().enumerate() {
            track_range_fits[hypothesis] = resolver.resolve(
                &assocs.track_range_fits,
                n_tracks,
                &instance(&cfg.range_label, name),
                "track",
                "range fit",
            )?;
        }

        Ok(ResolvedAssociations {
            slice_particles: resolver.resolve(
                &assocs.slice_particles,
                n_slices,
                &cfg.particle_label,
                "slice",
                "particle",
            )?,
            slice_hits: resolver.resolve(
                &assocs.slice_hits,
                n_slices,
                &cfg.particle_label,
                "slice",
                "hit",
            )?,
            particle_tracks: resolver.resolve(
                &assocs.particle_tracks,
                n_particles,
                &cfg.track_label,
                "particle",
                "track",
            )?,
            particle_showers: resolver.resolve(
                &assocs.particle_showers,
                n_particles,
                &cfg.shower_label,
                "particle",
                "shower",
            )?,
            particle_vertices: resolver.resolve(
                &assocs.particle_vertices,
                n_particles,
                &cfg.particle_label,
                "particle",
                "vertex",
            )?,
            particle_metadata: resolver.resolve(
                &assocs.particle_metadata,
                n_particles,
                &cfg.particle_label,
                "particle",
                "metadata",
            )?,
            particle_flash_matches: resolver.resolve(
                &assocs.particle_flash_matches,
                n_particles,
                &cfg.flash_match_label,
                "particle",
                "flash match",
            )?,
            track_hits: resolver.resolve(
                &assocs.track_hits,
                n_tracks,
                &cfg.track_label,
                "track",
                "hit",
            )?,
            shower_hits: resolver.resolve(
                &assocs.shower_hits,
                n_showers,
                &cfg.shower_label,
                "shower",
                "hit",
            )?,
            track_calorimetry: resolver.resolve(
                &assocs.track_calorimetry,
                n_tracks,
                &cfg.calo_label,
                "track",
                "calorimetry",
            )?,
            track_particle_ids: resolver.resolve(
                &assocs.track_particle_ids,
                n_tracks,
                &cfg.pid_label,
                "track",
                "particle id",
            )?,
            track_crt_hits: resolver.resolve(
                &assocs.track_crt_hits,
                n_tracks,
                &cfg.crt_hit_match_label,
                "track",
                "CRT hit",
            )?,
            track_mcs_fits,
            track_range_fits,
            shower_residuals: resolver.resolve(
                &assocs.shower_residuals,
                n_showers,
                &cfg.shower_selection_label,
                "shower",
                "residual",
            )?,
            shower_track_fits: resolver.resolve(
                &assocs.shower_track_fits,
                n_showers,
                &cfg.shower_selection_label,
                "shower",
                "track refit",
            )?,
            shower_density_fits: resolver.resolve(
                &assocs.shower_density_fits,
                n_showers,
                &cfg.shower_selection_label,
                "shower",
                "density fit",
            )?,
        })
    }
}

/// The primary particle of a slice together with its resolved annotations
#[derive(Debug)]
pub struct Primary<'ev> {
    /// Position of the primary in the event's particle collection
    pub index: usize,

    /// Flash-match result of the hierarchy
    pub flash_match: Option<&'ev FlashMatchInput>,

    /// Pattern-recognition metadata of the primary
    pub metadata: Option<&'ev ParticleMetadataInput>,

    /// Interaction vertex of the primary
    pub vertex: Option<&'ev VertexInput>,
}

/// Find the primary particle of a slice and resolve its annotations
///
/// The upstream reconstruction promises exactly one flagged primary per
/// hierarchy. If several particles claim the flag anyway, the first in input
/// order wins; whether that upstream state is a bug or intended is not
/// knowable here, so the behavior is pinned rather than repaired.
pub fn select_primary<'ev>(
    children: &[usize],
    inputs: &'ev EventInputs,
    assocs: &ResolvedAssociations<'ev>,
) -> Result<Option<Primary<'ev>>> {
    let Some(&index) = children
        .iter()
        .find(|&&ipart| {
            inputs
                .particles
                .get(ipart)
                .map_or(false, |part| part.is_primary)
        })
    else {
        return Ok(None);
    };

    // At most one flash match may exist per hierarchy; several would mean
    // the flash matcher broke its contract
    let flash_match = assocs
        .particle_flash_matches
        .at_most_one(index, "flash match")?
        .and_then(|edge| inputs.flash_matches.get(edge.target));
    let metadata = assocs
        .particle_metadata
        .first(index)
        .and_then(|edge| inputs.metadata.get(edge.target));
    let vertex = assocs
        .particle_vertices
        .first(index)
        .and_then(|edge| inputs.vertices.get(edge.target));

    Ok(Some(Primary {
        index,
        flash_match,
        metadata,
        vertex,
    }))
}

/// What a hierarchy particle reconstructs to
///
/// A particle is either track-like, shower-like, or carries no terminal
/// payload at all; holding both payloads is not representable here and is
/// rejected during classification.
#[derive(Debug)]
pub enum ParticleKind {
    /// The particle has exactly one fitted track
    Track(usize),

    /// The particle has exactly one fitted shower
    Shower(usize),

    /// The particle has neither payload
    Unclassified,
}

/// Classify a hierarchy particle by which terminal payload it carries
pub fn classify_particle(
    ipart: usize,
    assocs: &ResolvedAssociations<'_>,
) -> Result<ParticleKind> {
    let track = assocs.particle_tracks.at_most_one(ipart, "track")?;
    let shower = assocs.particle_showers.at_most_one(ipart, "shower")?;
    match (track, shower) {
        (Some(_), Some(_)) => Err(Error::integrity(format!(
            "particle index {} carries both a track and a shower payload",
            ipart
        ))),
        (Some(track), None) => Ok(ParticleKind::Track(track.target)),
        (None, Some(shower)) => Ok(ParticleKind::Shower(shower.target)),
        (None, None) => Ok(ParticleKind::Unclassified),
    }
}

/// Assemble the record of one slice, or decide to drop it
///
/// Returns `None` when the selection policy rejects the slice; rejected
/// slices never pay for truth matching or child classification.
pub fn assemble_slice(
    slice_index: usize,
    slice: &SliceInput,
    cfg: &Configuration,
    inputs: &EventInputs,
    assocs: &ResolvedAssociations<'_>,
    truth_index: Option<&TruthHitIndex>,
    true_particles: &[TrueParticle],
) -> Result<Option<SliceRecord>> {
    // Child particles and hits of this slice
    let children: Vec<usize> = assocs
        .slice_particles
        .get(slice_index)
        .map(|edges| edges.iter().map(|edge| edge.target).collect())
        .unwrap_or_default();
    let slice_hits: Vec<&HitInput> = assocs
        .slice_hits
        .get(slice_index)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| inputs.hits.get(edge.target))
                .collect()
        })
        .unwrap_or_default();

    // Primary particle and its annotations
    let primary = select_primary(&children, inputs, assocs)?;

    // Slice-level summary
    let mut slc = reco::fill_slice_vars(slice, children.len(), primary.is_some());
    if let Some(primary) = &primary {
        reco::fill_slice_metadata(primary.metadata, &mut slc);
        reco::fill_slice_flash_match(primary.flash_match, &mut slc);
        reco::fill_slice_vertex(primary.vertex, &mut slc);
    }

    // The selection policy: the single branch point separating kept from
    // discarded slices
    if cfg.cut_clear_cosmic && slc.is_clear_cosmic {
        debug!(slice = slice.id, "dropping clear-cosmic slice");
        return Ok(None);
    }

    // Truth matching happens after the keep decision so that dropped slices
    // never pay for it
    if let Some(index) = truth_index {
        slc.truth = index.match_hits(slice_hits.iter().copied(), &inputs.clocks);
        slc.matched_interaction = interaction_of(&slc.truth, true_particles);
    }

    // Classify and fill the children
    for &ipart in &children {
        let Some(particle) = inputs.particles.get(ipart) else {
            continue;
        };
        match classify_particle(ipart, assocs)? {
            ParticleKind::Track(itrk) => {
                let Some(track) = inputs.tracks.get(itrk) else {
                    continue;
                };
                let mut trk = reco::fill_track_vars(track, particle, ipart);
                reco::fill_track_mcs(&assocs.track_mcs_fits, itrk, inputs, &mut trk);
                reco::fill_track_range(&assocs.track_range_fits, itrk, inputs, &mut trk);
                reco::fill_track_calorimetry(&assocs.track_calorimetry, itrk, inputs, &mut trk);
                reco::fill_track_chi2_pid(&assocs.track_particle_ids, itrk, inputs, &mut trk);
                reco::fill_track_crt_match(
                    &assocs.track_crt_hits,
                    itrk,
                    inputs.crt_hits.as_ref(),
                    cfg.crt_use_ts0,
                    &mut trk,
                );
                if let Some(index) = truth_index {
                    let hits = object_hits(&assocs.track_hits, itrk, inputs);
                    trk.truth = ObjectTruth::new(
                        index.match_hits(hits.iter().copied(), &inputs.clocks),
                    );
                }
                slc.tracks.push(trk);
            }
            ParticleKind::Shower(ishw) => {
                let Some(shower) = inputs.showers.get(ishw) else {
                    continue;
                };
                let vertex = primary.as_ref().and_then(|primary| primary.vertex);
                let mut shw = reco::fill_shower_vars(shower, particle, ipart, vertex);
                reco::fill_shower_selection(
                    &assocs.shower_residuals,
                    &assocs.shower_track_fits,
                    &assocs.shower_density_fits,
                    ishw,
                    inputs,
                    &mut shw,
                );
                if let Some(index) = truth_index {
                    let hits = object_hits(&assocs.shower_hits, ishw, inputs);
                    shw.truth = ObjectTruth::new(
                        index.match_hits(hits.iter().copied(), &inputs.clocks),
                    );
                }
                slc.showers.push(shw);
            }
            ParticleKind::Unclassified => {}
        }
    }

    Ok(Some(slc))
}

/// Hits associated to one reconstructed object
fn object_hits<'ev>(
    assoc: &Association<'_>,
    source: usize,
    inputs: &'ev EventInputs,
) -> Vec<&'ev HitInput> {
    assoc
        .get(source)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| inputs.hits.get(edge.target))
                .collect()
        })
        .unwrap_or_default()
}

/// The truth interaction the dominant contributor of a match descends from
fn interaction_of(matched: &TruthMatch, true_particles: &[TrueParticle]) -> Option<usize> {
    let particle = matched.particle()?;
    true_particles
        .iter()
        .find(|part| part.track_id == particle)
        .and_then(|part| part.interaction)
}
