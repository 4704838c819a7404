//! Field fillers copying upstream reconstruction output into records
//!
//! These follow one convention: a `fill_*_vars` function builds the base
//! record from the object itself, and the remaining fillers graft one
//! association's worth of data onto it. Fillers never resolve labels; they
//! receive already-resolved associations and stay oblivious to the
//! strictness policy.

use crate::{
    assoc::Association,
    inputs::{
        CrtHitInput, EventInputs, FlashMatchInput, ParticleInput, ParticleMetadataInput,
        ShowerInput, SliceInput, TrackInput, VertexInput,
    },
    numeric::Float,
    records::{
        CrtHitRecord, McsMomentum, ObjectTruth, PlaneCalorimetry, PlaneParticleId, ShowerDensityFit,
        ShowerRecord, ShowerTrackFit, SliceRecord, TrackCrtMatch, TrackRecord, NUM_MCS_HYPOTHESES,
        NUM_RANGE_HYPOTHESES,
    },
    truthmatch::TruthMatch,
};

/// Base slice record from the slice object and the primary-particle scan
pub fn fill_slice_vars(
    slice: &SliceInput,
    n_particles: usize,
    has_primary: bool,
) -> SliceRecord {
    SliceRecord {
        id: slice.id,
        charge: slice.charge,
        center: slice.center,
        n_particles,
        // A hierarchy without a primary was not reconstructed as a neutrino
        // candidate at all
        is_clear_cosmic: !has_primary,
        nu_score: None,
        flash_time: None,
        flash_score: None,
        vertex: None,
        truth: TruthMatch::Unmatched,
        matched_interaction: None,
        tracks: Vec::new(),
        showers: Vec::new(),
    }
}

/// Graft the primary particle's pattern-recognition metadata onto a slice
pub fn fill_slice_metadata(meta: Option<&ParticleMetadataInput>, slc: &mut SliceRecord) {
    if let Some(meta) = meta {
        slc.nu_score = meta.nu_score;
        slc.is_clear_cosmic = slc.is_clear_cosmic || meta.is_clear_cosmic;
    }
}

/// Graft the primary particle's flash match onto a slice
pub fn fill_slice_flash_match(fmatch: Option<&FlashMatchInput>, slc: &mut SliceRecord) {
    if let Some(fmatch) = fmatch {
        slc.flash_time = Some(fmatch.time);
        slc.flash_score = Some(fmatch.score);
    }
}

/// Graft the primary particle's vertex onto a slice
pub fn fill_slice_vertex(vertex: Option<&VertexInput>, slc: &mut SliceRecord) {
    if let Some(vertex) = vertex {
        slc.vertex = Some(vertex.position);
    }
}

/// Base track record from the fitted trajectory and its hierarchy particle
pub fn fill_track_vars(
    track: &TrackInput,
    particle: &ParticleInput,
    particle_index: usize,
) -> TrackRecord {
    TrackRecord {
        particle: particle.id,
        particle_index,
        parent: particle.parent,
        length: track.length,
        start: track.start,
        end: track.end,
        direction: track.direction,
        mcs: [None; NUM_MCS_HYPOTHESES],
        range: [None; NUM_RANGE_HYPOTHESES],
        calorimetry: Vec::new(),
        particle_id: Vec::new(),
        crt_match: None,
        truth: ObjectTruth::new(TruthMatch::Unmatched),
    }
}

/// Graft the scattering momentum fits onto a track, one hypothesis at a time
pub fn fill_track_mcs(
    fits: &[Association<'_>; NUM_MCS_HYPOTHESES],
    track_index: usize,
    inputs: &EventInputs,
    trk: &mut TrackRecord,
) {
    for (hypothesis, fit) in fits.iter().enumerate() {
        trk.mcs[hypothesis] = fit
            .first(track_index)
            .and_then(|edge| inputs.mcs_fits.get(edge.target))
            .map(|fit| McsMomentum {
                fwd_momentum: fit.fwd_momentum,
                bwd_momentum: fit.bwd_momentum,
                is_best_forward: fit.is_best_forward,
            });
    }
}

/// Graft the range momentum fits onto a track
pub fn fill_track_range(
    fits: &[Association<'_>; NUM_RANGE_HYPOTHESES],
    track_index: usize,
    inputs: &EventInputs,
    trk: &mut TrackRecord,
) {
    for (hypothesis, fit) in fits.iter().enumerate() {
        trk.range[hypothesis] = fit
            .first(track_index)
            .and_then(|edge| inputs.range_fits.get(edge.target))
            .map(|fit| fit.momentum);
    }
}

/// Graft the per-plane calorimetry onto a track
pub fn fill_track_calorimetry(
    calo: &Association<'_>,
    track_index: usize,
    inputs: &EventInputs,
    trk: &mut TrackRecord,
) {
    let Some(edges) = calo.get(track_index) else {
        return;
    };
    for edge in edges {
        if let Some(calo) = inputs.calorimetry.get(edge.target) {
            trk.calorimetry.push(PlaneCalorimetry {
                plane: calo.plane,
                kinetic_energy: calo.kinetic_energy,
                n_points: calo.dedx.len(),
            });
        }
    }
}

/// Graft the per-plane particle identification onto a track
pub fn fill_track_chi2_pid(
    pid: &Association<'_>,
    track_index: usize,
    inputs: &EventInputs,
    trk: &mut TrackRecord,
) {
    let Some(edges) = pid.get(track_index) else {
        return;
    };
    for edge in edges {
        if let Some(pid) = inputs.particle_ids.get(edge.target) {
            trk.particle_id.push(PlaneParticleId {
                plane: pid.plane,
                chi2_muon: pid.chi2_muon,
                chi2_pion: pid.chi2_pion,
                chi2_kaon: pid.chi2_kaon,
                chi2_proton: pid.chi2_proton,
                pida: pid.pida,
            });
        }
    }
}

/// Graft the matched cosmic-ray-tagger hit onto a track
pub fn fill_track_crt_match(
    crt: &Association<'_, Float>,
    track_index: usize,
    crt_hits: Option<&Vec<CrtHitInput>>,
    use_ts0: bool,
    trk: &mut TrackRecord,
) {
    let Some(edge) = crt.first(track_index) else {
        return;
    };
    let Some(hit) = crt_hits.and_then(|hits| hits.get(edge.target)) else {
        return;
    };
    trk.crt_match = Some(TrackCrtMatch {
        time: edge.payload,
        hit_time: crt_hit_time(hit, use_ts0),
        hit_position: hit.position,
        hit_pe: hit.pe,
    });
}

/// Base shower record from the fitted cone and its hierarchy particle
pub fn fill_shower_vars(
    shower: &ShowerInput,
    particle: &ParticleInput,
    particle_index: usize,
    vertex: Option<&VertexInput>,
) -> ShowerRecord {
    ShowerRecord {
        particle: particle.id,
        particle_index,
        parent: particle.parent,
        direction: shower.direction,
        start: shower.start,
        open_angle: shower.open_angle,
        length: shower.length,
        energy: shower
            .energy
            .get(shower.best_plane)
            .copied()
            .unwrap_or(0.),
        energy_per_plane: shower.energy.clone(),
        dedx_per_plane: shower.dedx.clone(),
        conversion_gap: vertex.map(|vtx| (shower.start - vtx.position).norm()),
        residual: None,
        track_fit: None,
        density_fit: None,
        truth: ObjectTruth::new(TruthMatch::Unmatched),
    }
}

/// Graft the shower-selection products onto a shower
///
/// Selection products are filled only when exactly one edge exists; the
/// selection pass may legitimately emit none or several candidates and
/// neither case is an error.
pub fn fill_shower_selection(
    residuals: &Association<'_>,
    track_fits: &Association<'_>,
    density_fits: &Association<'_>,
    shower_index: usize,
    inputs: &EventInputs,
    shw: &mut ShowerRecord,
) {
    if let Some(edge) = single_edge(residuals, shower_index) {
        shw.residual = inputs.shower_residuals.get(edge).copied();
    }
    if let Some(edge) = single_edge(track_fits, shower_index) {
        shw.track_fit = inputs
            .shower_track_fits
            .get(edge)
            .map(|fit| ShowerTrackFit {
                track_length: fit.track_length,
                track_width: fit.track_width,
            });
    }
    if let Some(edge) = single_edge(density_fits, shower_index) {
        shw.density_fit = inputs
            .shower_density_fits
            .get(edge)
            .map(|fit| ShowerDensityFit {
                density_grad: fit.density_grad,
                density_pow: fit.density_pow,
            });
    }
}

/// Target of the unique edge of a source element, if there is exactly one
fn single_edge(assoc: &Association<'_>, source: usize) -> Option<usize> {
    match assoc.get(source) {
        Some([edge]) => Some(edge.target),
        _ => None,
    }
}

/// Copy the cosmic-ray-tagger hits into the event record
pub fn fill_crt_hits(crt_hits: &[CrtHitInput], use_ts0: bool) -> Vec<CrtHitRecord> {
    crt_hits
        .iter()
        .map(|hit| CrtHitRecord {
            position: hit.position,
            time: crt_hit_time(hit, use_ts0),
            pe: hit.pe,
        })
        .collect()
}

/// Pick the configured timestamp of a tagger hit
fn crt_hit_time(hit: &CrtHitInput, use_ts0: bool) -> Float {
    if use_ts0 {
        hit.time_ts0
    } else {
        hit.time_ts1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn slice() -> SliceInput {
        SliceInput {
            id: 3,
            charge: 1500.,
            center: vector![10., -20., 250.],
        }
    }

    #[test]
    fn slice_without_primary_is_clear_cosmic() {
        let slc = fill_slice_vars(&slice(), 2, false);
        assert!(slc.is_clear_cosmic);
        let slc = fill_slice_vars(&slice(), 2, true);
        assert!(!slc.is_clear_cosmic);
    }

    #[test]
    fn metadata_can_only_promote_to_clear_cosmic() {
        let mut slc = fill_slice_vars(&slice(), 2, true);
        fill_slice_metadata(
            Some(&ParticleMetadataInput {
                nu_score: Some(0.9),
                track_score: None,
                is_clear_cosmic: false,
            }),
            &mut slc,
        );
        assert!(!slc.is_clear_cosmic);
        assert_eq!(slc.nu_score, Some(0.9));

        fill_slice_metadata(
            Some(&ParticleMetadataInput {
                nu_score: None,
                track_score: None,
                is_clear_cosmic: true,
            }),
            &mut slc,
        );
        assert!(slc.is_clear_cosmic);
    }

    #[test]
    fn shower_conversion_gap_needs_a_vertex() {
        let shower = ShowerInput {
            direction: vector![0., 0., 1.],
            start: vector![0., 0., 13.],
            open_angle: 0.2,
            length: 25.,
            energy: vec![80., 90., 100.],
            dedx: vec![2.0, 2.1, 2.2],
            best_plane: 2,
        };
        let particle = ParticleInput {
            id: 5,
            pdg: 11,
            is_primary: false,
            parent: Some(0),
        };
        let vertex = VertexInput {
            position: vector![0., 0., 10.],
        };

        let shw = fill_shower_vars(&shower, &particle, 1, Some(&vertex));
        assert_eq!(shw.energy, 100.);
        assert_eq!(shw.conversion_gap, Some(3.));

        let shw = fill_shower_vars(&shower, &particle, 1, None);
        assert!(shw.conversion_gap.is_none());
    }
}
