//! Upstream reconstruction and simulation products, as plain data
//!
//! The host framework materializes one [`EventInputs`] per event before
//! handing it to the assembler. Nothing here is computed by this crate; the
//! types only mirror the shape of what the upstream producers wrote.
//! Collections read under a configurable label are wrapped in `Option`: a
//! `None` means the producer did not run for this file, and the strictness
//! policy decides whether that is tolerable.

use crate::{
    momentum::{Momentum, Position},
    numeric::Float,
};
use nalgebra::vector;

/// A candidate interaction: one grouping of reconstructed hits
pub struct SliceInput {
    /// Identifier assigned by the pattern recognition
    pub id: u32,

    /// Total charge collected by the slice's hits
    pub charge: Float,

    /// Charge-weighted center of the slice
    pub center: Position,
}

/// An entry in the reconstructed particle hierarchy of a slice
pub struct ParticleInput {
    /// Self-identifier within the particle collection
    pub id: u32,

    /// Particle-type hypothesis assigned by the pattern recognition
    pub pdg: i32,

    /// Whether this particle heads the hierarchy of its slice
    pub is_primary: bool,

    /// Identifier of the parent particle, if any
    pub parent: Option<u32>,
}

/// A fitted track trajectory
pub struct TrackInput {
    /// Trajectory length (cm)
    pub length: Float,

    /// Fitted start point
    pub start: Position,

    /// Fitted end point
    pub end: Position,

    /// Direction at the start point
    pub direction: Position,
}

/// A fitted electromagnetic shower
pub struct ShowerInput {
    /// Shower axis direction
    pub direction: Position,

    /// Shower start point
    pub start: Position,

    /// Opening angle of the shower cone (rad)
    pub open_angle: Float,

    /// Shower length along its axis (cm)
    pub length: Float,

    /// Reconstructed energy per wire plane (MeV)
    pub energy: Vec<Float>,

    /// Initial dE/dx per wire plane (MeV/cm)
    pub dedx: Vec<Float>,

    /// Index of the plane the energy estimate should be read from
    pub best_plane: usize,
}

/// A reconstructed hit on one readout channel
pub struct HitInput {
    /// Readout channel the hit was seen on
    pub channel: u32,

    /// First TPC tick of the hit window
    pub start_tick: Float,

    /// Last TPC tick of the hit window
    pub end_tick: Float,

    /// Integrated charge of the hit
    pub integral: Float,
}

/// A reconstructed interaction vertex
#[derive(Debug)]
pub struct VertexInput {
    /// Vertex position
    pub position: Position,
}

/// A flash-match result for a particle hierarchy
#[derive(Debug)]
pub struct FlashMatchInput {
    /// Matched interaction time (us)
    pub time: Float,

    /// Match quality score
    pub score: Float,
}

/// Pattern-recognition metadata attached to a particle
#[derive(Debug)]
pub struct ParticleMetadataInput {
    /// Neutrino-likeness score of the hierarchy
    pub nu_score: Option<Float>,

    /// Track-likeness score of the particle
    pub track_score: Option<Float>,

    /// Whether the hierarchy was tagged as unambiguous cosmic-ray activity
    pub is_clear_cosmic: bool,
}

/// A momentum fit from multiple Coulomb scattering, for one mass hypothesis
pub struct McsFitInput {
    /// Momentum assuming forward-going trajectory (GeV/c)
    pub fwd_momentum: Float,

    /// Momentum assuming backward-going trajectory (GeV/c)
    pub bwd_momentum: Float,

    /// Whether the forward hypothesis fit better
    pub is_best_forward: bool,
}

/// A momentum estimate from track range, for one mass hypothesis
pub struct RangeFitInput {
    /// Momentum from the range tables (GeV/c)
    pub momentum: Float,
}

/// Calorimetric reconstruction of a track on one wire plane
pub struct CalorimetryInput {
    /// Wire plane the measurement was made on
    pub plane: u32,

    /// Deposited kinetic energy (MeV)
    pub kinetic_energy: Float,

    /// Energy loss per trajectory point (MeV/cm)
    pub dedx: Vec<Float>,

    /// Residual range per trajectory point (cm)
    pub residual_range: Vec<Float>,
}

/// Particle identification of a track on one wire plane
pub struct ParticleIdInput {
    /// Wire plane the identification was run on
    pub plane: u32,

    /// Chi-square of the muon hypothesis
    pub chi2_muon: Float,

    /// Chi-square of the pion hypothesis
    pub chi2_pion: Float,

    /// Chi-square of the kaon hypothesis
    pub chi2_kaon: Float,

    /// Chi-square of the proton hypothesis
    pub chi2_proton: Float,

    /// PIDA aggregate score
    pub pida: Float,
}

/// A hit in the cosmic-ray tagger
pub struct CrtHitInput {
    /// Hit position
    pub position: Position,

    /// Timestamp relative to the beam gate, TS0 clock (us)
    pub time_ts0: Float,

    /// Timestamp relative to the beam gate, TS1 clock (us)
    pub time_ts1: Float,

    /// Total collected photo-electrons
    pub pe: Float,
}

/// Shower refit as a track-like object, from the shower selection pass
pub struct ShowerTrackFitInput {
    /// Length of the refit track stub (cm)
    pub track_length: Float,

    /// Width of the refit track stub (cm)
    pub track_width: Float,
}

/// Transverse density profile fit of a shower
pub struct ShowerDensityFitInput {
    /// Power-law gradient of the density profile
    pub density_grad: Float,

    /// Power-law exponent of the density profile
    pub density_pow: Float,
}

/// A generator-level simulated interaction with its flux metadata
pub struct McInteractionInput {
    /// Particle type of the interacting neutrino
    pub nu_pdg: i32,

    /// Whether the interaction is charged-current
    pub is_cc: bool,

    /// Interaction mode code from the generator
    pub mode: i32,

    /// Neutrino energy (GeV)
    pub energy: Float,

    /// True interaction vertex
    pub vertex: Position,

    /// Beamline flux metadata, absent for non-beam generators
    pub flux: Option<FluxInput>,
}

/// Beamline metadata of one simulated neutrino
pub struct FluxInput {
    /// Particle type of the hadron whose decay produced the neutrino
    pub parent_pdg: i32,

    /// Decay mode code from the beam simulation
    pub decay_mode: i32,
}

/// A simulated particle from the detector simulation
pub struct McParticleInput {
    /// Simulation track identifier (unique within the event)
    pub track_id: i32,

    /// Particle type
    pub pdg: i32,

    /// Simulation track identifier of the parent, zero for primaries
    pub parent: i32,

    /// Index of the generator interaction this particle descends from
    pub interaction: Option<usize>,

    /// 4-momentum at the production point
    pub start_momentum: Momentum,

    /// Production point
    pub start: Position,

    /// Last simulated point
    pub end: Position,
}

/// A fast-simulation track, input to the fake reconstruction
pub struct McTrackInput {
    /// Particle type
    pub pdg: i32,

    /// Index of the generator interaction this track descends from
    pub interaction: Option<usize>,

    /// Track start point
    pub start: Position,

    /// Track end point
    pub end: Position,

    /// 4-momentum at the start point
    pub start_momentum: Momentum,
}

/// Energy deposited by one simulated particle in one readout time bin
pub struct EnergyDeposit {
    /// Simulation track identifier of the depositing particle
    pub particle: i32,

    /// Deposited energy (MeV)
    pub energy: Float,
}

/// All energy deposited on a channel in one readout time bin
pub struct TimedDeposit {
    /// Readout time (TDC counts)
    pub tdc: Float,

    /// Per-particle deposits in this bin
    pub deposits: Vec<EnergyDeposit>,
}

/// Simulated energy deposits of one readout channel
pub struct SimChannelInput {
    /// Readout channel
    pub channel: u32,

    /// Time-ordered deposits on this channel
    pub deposits: Vec<TimedDeposit>,
}

/// Conversion between hit times and simulation readout times
pub struct ClockInfo {
    /// Offset between TPC tick zero and TDC zero
    pub trigger_offset: Float,
}
//
impl ClockInfo {
    /// Convert a TPC tick to the simulation TDC time base
    pub fn tpc_tick_to_tdc(&self, tick: Float) -> Float {
        tick + self.trigger_offset
    }
}

impl Default for ClockInfo {
    fn default() -> Self {
        ClockInfo {
            trigger_offset: 0.,
        }
    }
}

/// An axis-aligned active detector volume, from the geometry description
pub struct ActiveVolume {
    /// Corner with the smallest coordinates
    pub min: Position,

    /// Corner with the largest coordinates
    pub max: Position,
}
//
impl ActiveVolume {
    /// Whether a point lies inside this volume
    pub fn contains(&self, p: &Position) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

/// One edge of an association table
#[derive(Debug)]
pub struct AssociationEdge<P = ()> {
    /// Index into the source collection
    pub source: usize,

    /// Index into the target collection
    pub target: usize,

    /// Auxiliary per-edge payload
    pub payload: P,
}

/// A named many-to-many mapping between two product collections
///
/// Tables are looked up by label; several producers may have written tables
/// of the same kind under different labels.
pub struct AssociationTable<P = ()> {
    /// Label the table was produced under
    pub label: String,

    /// The mapping's edges, in production order
    pub edges: Vec<AssociationEdge<P>>,
}
//
impl<P> AssociationTable<P> {
    /// Build a table from (source, target, payload) triples
    pub fn with_payloads(
        label: impl Into<String>,
        edges: impl IntoIterator<Item = (usize, usize, P)>,
    ) -> Self {
        AssociationTable {
            label: label.into(),
            edges: edges
                .into_iter()
                .map(|(source, target, payload)| AssociationEdge {
                    source,
                    target,
                    payload,
                })
                .collect(),
        }
    }
}
//
impl AssociationTable<()> {
    /// Build a payload-less table from (source, target) pairs
    pub fn new(
        label: impl Into<String>,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        Self::with_payloads(label.into(), edges.into_iter().map(|(s, t)| (s, t, ())))
    }
}

/// Every association table the event carries, grouped by kind
#[derive(Default)]
pub struct AssociationStore {
    /// Slice to child particles
    pub slice_particles: Vec<AssociationTable>,

    /// Slice to its hits
    pub slice_hits: Vec<AssociationTable>,

    /// Particle to its fitted track
    pub particle_tracks: Vec<AssociationTable>,

    /// Particle to its fitted shower
    pub particle_showers: Vec<AssociationTable>,

    /// Particle to its interaction vertex
    pub particle_vertices: Vec<AssociationTable>,

    /// Particle to its pattern-recognition metadata
    pub particle_metadata: Vec<AssociationTable>,

    /// Particle to its flash-match result
    pub particle_flash_matches: Vec<AssociationTable>,

    /// Track to the hits it was fit from
    pub track_hits: Vec<AssociationTable>,

    /// Shower to the hits it was fit from
    pub shower_hits: Vec<AssociationTable>,

    /// Track to its per-plane calorimetry
    pub track_calorimetry: Vec<AssociationTable>,

    /// Track to its per-plane particle identification
    pub track_particle_ids: Vec<AssociationTable>,

    /// Track to a matched cosmic-ray-tagger hit, with the matching time as
    /// per-edge payload
    pub track_crt_hits: Vec<AssociationTable<Float>>,

    /// Track to its scattering momentum fits, one table per mass hypothesis
    /// (labels are formed as `<label>:<hypothesis>`)
    pub track_mcs_fits: Vec<AssociationTable>,

    /// Track to its range momentum fits, one table per mass hypothesis
    pub track_range_fits: Vec<AssociationTable>,

    /// Shower to its selection residual
    pub shower_residuals: Vec<AssociationTable>,

    /// Shower to its track refit
    pub shower_track_fits: Vec<AssociationTable>,

    /// Shower to its density profile fit
    pub shower_density_fits: Vec<AssociationTable>,
}

/// Everything the host materialized for one event
pub struct EventInputs {
    /// Run number
    pub run: u32,

    /// Sub-run number
    pub subrun: u32,

    /// Whether this event comes from the detector rather than simulation
    pub is_real_data: bool,

    /// Protons-on-target exposure of the enclosing sub-run, if recorded
    pub subrun_pot: Option<Float>,

    /// Hit time conversion constants
    pub clocks: ClockInfo,

    /// Active detector volumes
    pub active_volumes: Vec<ActiveVolume>,

    /// Candidate interaction slices, absent if pattern recognition did not run
    pub slices: Option<Vec<SliceInput>>,

    /// Reconstructed particle hierarchy entries
    pub particles: Vec<ParticleInput>,

    /// Fitted tracks
    pub tracks: Vec<TrackInput>,

    /// Fitted showers
    pub showers: Vec<ShowerInput>,

    /// Reconstructed hits
    pub hits: Vec<HitInput>,

    /// Reconstructed vertices
    pub vertices: Vec<VertexInput>,

    /// Flash-match results
    pub flash_matches: Vec<FlashMatchInput>,

    /// Pattern-recognition metadata blocks
    pub metadata: Vec<ParticleMetadataInput>,

    /// Scattering momentum fits
    pub mcs_fits: Vec<McsFitInput>,

    /// Range momentum fits
    pub range_fits: Vec<RangeFitInput>,

    /// Per-plane track calorimetry
    pub calorimetry: Vec<CalorimetryInput>,

    /// Per-plane track particle identification
    pub particle_ids: Vec<ParticleIdInput>,

    /// Shower selection residuals
    pub shower_residuals: Vec<Float>,

    /// Shower track refits
    pub shower_track_fits: Vec<ShowerTrackFitInput>,

    /// Shower density profile fits
    pub shower_density_fits: Vec<ShowerDensityFitInput>,

    /// Cosmic-ray-tagger hits
    pub crt_hits: Option<Vec<CrtHitInput>>,

    /// Flash-trigger decision
    pub flash_trigger: Option<bool>,

    /// Generator truth of the neutrino source
    pub mc_truths: Option<Vec<McInteractionInput>>,

    /// Generator truth of the cosmic-ray source
    pub cosmic_mc_truths: Option<Vec<McInteractionInput>>,

    /// Generator truth of the particle-gun source
    pub particle_gun_mc_truths: Option<Vec<McInteractionInput>>,

    /// Simulated particles from the detector simulation
    pub mc_particles: Option<Vec<McParticleInput>>,

    /// Fast-simulation tracks
    pub mc_tracks: Option<Vec<McTrackInput>>,

    /// Per-channel simulated energy deposits
    pub sim_channels: Option<Vec<SimChannelInput>>,

    /// Association tables
    pub assocs: AssociationStore,
}
//
impl EventInputs {
    /// An empty event, useful as a starting point for hosts and tests
    pub fn empty(run: u32, subrun: u32) -> Self {
        EventInputs {
            run,
            subrun,
            is_real_data: false,
            subrun_pot: None,
            clocks: ClockInfo::default(),
            active_volumes: Vec::new(),
            slices: None,
            particles: Vec::new(),
            tracks: Vec::new(),
            showers: Vec::new(),
            hits: Vec::new(),
            vertices: Vec::new(),
            flash_matches: Vec::new(),
            metadata: Vec::new(),
            mcs_fits: Vec::new(),
            range_fits: Vec::new(),
            calorimetry: Vec::new(),
            particle_ids: Vec::new(),
            shower_residuals: Vec::new(),
            shower_track_fits: Vec::new(),
            shower_density_fits: Vec::new(),
            crt_hits: None,
            flash_trigger: None,
            mc_truths: None,
            cosmic_mc_truths: None,
            particle_gun_mc_truths: None,
            mc_particles: None,
            mc_tracks: None,
            sim_channels: None,
            assocs: AssociationStore::default(),
        }
    }
}

/// A volume spanning the given coordinate ranges
pub fn volume(
    x: (Float, Float),
    y: (Float, Float),
    z: (Float, Float),
) -> ActiveVolume {
    ActiveVolume {
        min: vector![x.0, y.0, z.0],
        max: vector![x.1, y.1, z.1],
    }
}
