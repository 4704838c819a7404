//! The flattened analysis records this crate exists to produce
//!
//! One [`EventRecord`] is assembled per processed event and handed back to
//! the host for persistence. Its nested structure mirrors how analyzers
//! consume it: per-slice records with their track-like and shower-like
//! children, a truth branch, the whole-event simulated particle list, and a
//! small header. Records are plain data; once an event record is returned it
//! is never mutated again.

use crate::{
    momentum::{Momentum, Position},
    numeric::Float,
    truthmatch::TruthMatch,
};

/// Index of the muon mass hypothesis in scattering and range fits
pub const MUON: usize = 0;

/// Index of the pion mass hypothesis in scattering fits
pub const PION: usize = 1;

/// Index of the kaon mass hypothesis in scattering fits
pub const KAON: usize = 2;

/// Index of the proton mass hypothesis in scattering fits
pub const PROTON: usize = 3;

/// Number of mass hypotheses fitted by multiple Coulomb scattering
pub const NUM_MCS_HYPOTHESES: usize = 4;

/// Index of the proton hypothesis in range fits (muon shares index 0)
pub const RANGE_PROTON: usize = 1;

/// Number of mass hypotheses fitted by range
pub const NUM_RANGE_HYPOTHESES: usize = 2;

/// Instance names of the scattering fit hypotheses, in index order
pub const MCS_HYPOTHESES: [&str; NUM_MCS_HYPOTHESES] = ["muon", "pion", "kaon", "proton"];

/// Instance names of the range fit hypotheses, in index order
pub const RANGE_HYPOTHESES: [&str; NUM_RANGE_HYPOTHESES] = ["muon", "proton"];

/// How the event was simulated, decided by which truth sources are present
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum McType {
    /// No recognized truth source
    Unknown,

    /// Beam neutrino simulation only
    Neutrino,

    /// Cosmic-ray simulation only
    Cosmic,

    /// Beam neutrinos overlaid on cosmic rays
    Overlay,

    /// Single-particle gun
    ParticleGun,
}

/// Event-level metadata
#[derive(Clone, Debug)]
pub struct Header {
    /// Run number
    pub run: u32,

    /// Sub-run number
    pub subrun: u32,

    /// Whether the event is simulated
    pub is_mc: bool,

    /// Classification of the simulation sources
    pub mc_type: McType,

    /// Protons-on-target exposure of the enclosing sub-run
    pub pot: Float,
}

/// Truth-match annotation carried by a track or shower record
#[derive(Clone, Copy, Debug)]
pub struct ObjectTruth {
    /// Dominant-contributor match of the object's hits
    pub matched: TruthMatch,

    /// Whether the cross-slice pass designated this object as the matched
    /// candidate of its truth interaction
    pub designated: bool,
}
//
impl ObjectTruth {
    /// Annotate a fresh match; designation happens in a later pass
    pub fn new(matched: TruthMatch) -> Self {
        ObjectTruth {
            matched,
            designated: false,
        }
    }
}

/// A momentum fit from multiple Coulomb scattering
#[derive(Clone, Copy, Debug)]
pub struct McsMomentum {
    /// Momentum assuming forward-going trajectory (GeV/c)
    pub fwd_momentum: Float,

    /// Momentum assuming backward-going trajectory (GeV/c)
    pub bwd_momentum: Float,

    /// Whether the forward hypothesis fit better
    pub is_best_forward: bool,
}

/// Calorimetric summary of a track on one wire plane
#[derive(Clone, Debug)]
pub struct PlaneCalorimetry {
    /// Wire plane
    pub plane: u32,

    /// Deposited kinetic energy (MeV)
    pub kinetic_energy: Float,

    /// Number of calorimetry points on this plane
    pub n_points: usize,
}

/// Particle-identification summary of a track on one wire plane
#[derive(Clone, Debug)]
pub struct PlaneParticleId {
    /// Wire plane
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

/// A cosmic-ray-tagger hit matched to a track
#[derive(Clone, Debug)]
pub struct TrackCrtMatch {
    /// Matching time from the association payload (us)
    pub time: Float,

    /// Timestamp of the matched hit (us), clock chosen by configuration
    pub hit_time: Float,

    /// Position of the matched hit
    pub hit_position: Position,

    /// Collected photo-electrons of the matched hit
    pub hit_pe: Float,
}

/// A track-like child of a slice
#[derive(Clone, Debug)]
pub struct TrackRecord {
    /// Identifier of the hierarchy particle this track reconstructs
    pub particle: u32,

    /// Position of that particle in the event's particle collection
    pub particle_index: usize,

    /// Identifier of the particle's parent in the hierarchy
    pub parent: Option<u32>,

    /// Trajectory length (cm)
    pub length: Float,

    /// Fitted start point
    pub start: Position,

    /// Fitted end point
    pub end: Position,

    /// Direction at the start point
    pub direction: Position,

    /// Scattering momentum per mass hypothesis, indexed by the hypothesis
    /// consts above
    pub mcs: [Option<McsMomentum>; NUM_MCS_HYPOTHESES],

    /// Range momentum per mass hypothesis (GeV/c)
    pub range: [Option<Float>; NUM_RANGE_HYPOTHESES],

    /// Per-plane calorimetry
    pub calorimetry: Vec<PlaneCalorimetry>,

    /// Per-plane particle identification
    pub particle_id: Vec<PlaneParticleId>,

    /// Matched cosmic-ray-tagger hit, if any
    pub crt_match: Option<TrackCrtMatch>,

    /// Truth-match annotation
    pub truth: ObjectTruth,
}

/// Shower refit as a track-like object
#[derive(Clone, Copy, Debug)]
pub struct ShowerTrackFit {
    /// Length of the refit track stub (cm)
    pub track_length: Float,

    /// Width of the refit track stub (cm)
    pub track_width: Float,
}

/// Transverse density profile fit of a shower
#[derive(Clone, Copy, Debug)]
pub struct ShowerDensityFit {
    /// Power-law gradient of the density profile
    pub density_grad: Float,

    /// Power-law exponent of the density profile
    pub density_pow: Float,
}

/// A shower-like child of a slice
#[derive(Clone, Debug)]
pub struct ShowerRecord {
    /// Identifier of the hierarchy particle this shower reconstructs
    pub particle: u32,

    /// Position of that particle in the event's particle collection
    pub particle_index: usize,

    /// Identifier of the particle's parent in the hierarchy
    pub parent: Option<u32>,

    /// Shower axis direction
    pub direction: Position,

    /// Shower start point
    pub start: Position,

    /// Opening angle of the shower cone (rad)
    pub open_angle: Float,

    /// Shower length along its axis (cm)
    pub length: Float,

    /// Energy estimate from the best plane (MeV)
    pub energy: Float,

    /// Reconstructed energy per wire plane (MeV)
    pub energy_per_plane: Vec<Float>,

    /// Initial dE/dx per wire plane (MeV/cm)
    pub dedx_per_plane: Vec<Float>,

    /// Distance from the slice vertex to the shower start (cm)
    pub conversion_gap: Option<Float>,

    /// Selection residual, if the selection pass ran
    pub residual: Option<Float>,

    /// Track refit of the shower, if available
    pub track_fit: Option<ShowerTrackFit>,

    /// Density profile fit, if available
    pub density_fit: Option<ShowerDensityFit>,

    /// Truth-match annotation
    pub truth: ObjectTruth,
}

/// One assembled slice
#[derive(Clone, Debug)]
pub struct SliceRecord {
    /// Identifier assigned by the pattern recognition
    pub id: u32,

    /// Total charge collected by the slice's hits
    pub charge: Float,

    /// Charge-weighted center of the slice
    pub center: Position,

    /// Number of particles in the slice's hierarchy
    pub n_particles: usize,

    /// Whether the slice was tagged as unambiguous cosmic-ray activity
    pub is_clear_cosmic: bool,

    /// Neutrino-likeness score of the hierarchy
    pub nu_score: Option<Float>,

    /// Flash-match time of the primary particle (us)
    pub flash_time: Option<Float>,

    /// Flash-match quality score of the primary particle
    pub flash_score: Option<Float>,

    /// Interaction vertex of the primary particle
    pub vertex: Option<Position>,

    /// Dominant-contributor match of the slice's hits
    pub truth: TruthMatch,

    /// Truth interaction the dominant contributor descends from
    pub matched_interaction: Option<usize>,

    /// Track-like children
    pub tracks: Vec<TrackRecord>,

    /// Shower-like children
    pub showers: Vec<ShowerRecord>,
}

/// A simulated particle, enriched with deposit bookkeeping
#[derive(Clone, Debug)]
pub struct TrueParticle {
    /// Simulation track identifier
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

    /// Straight-line distance between production and last point (cm)
    pub length: Float,

    /// Energy the particle deposited in the readout (MeV)
    pub visible_energy: Float,

    /// Whether both endpoints lie inside an active volume
    pub contained: bool,
}

/// A simulated neutrino interaction with its flux metadata
#[derive(Clone, Debug)]
pub struct TrueInteraction {
    /// Position of this interaction in the generator truth collection
    pub index: usize,

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

    /// Particle type of the hadron whose decay produced the neutrino
    pub parent_pdg: Option<i32>,

    /// Decay mode code from the beam simulation
    pub parent_decay_mode: Option<i32>,

    /// Simulation track identifiers of the particles this interaction made
    pub particles: Vec<i32>,

    /// Summed visible energy of those particles (MeV)
    pub visible_energy: Float,
}

/// The truth branch of an event record
#[derive(Clone, Debug, Default)]
pub struct TruthBranch {
    /// Simulated interactions, in generator order
    pub interactions: Vec<TrueInteraction>,
}

/// A cosmic-ray-tagger hit, copied into the event record
#[derive(Clone, Debug)]
pub struct CrtHitRecord {
    /// Hit position
    pub position: Position,

    /// Timestamp (us), clock chosen by configuration
    pub time: Float,

    /// Collected photo-electrons
    pub pe: Float,
}

/// Fake-reconstruction lepton summary
#[derive(Clone, Debug)]
pub struct FakeRecoLepton {
    /// Particle type
    pub pdg: i32,

    /// Smeared momentum magnitude (GeV/c)
    pub momentum: Float,

    /// Cosine of the angle to the beam axis
    pub costh: Float,

    /// Track length (cm)
    pub length: Float,

    /// Whether the track ends inside an active volume
    pub contained: bool,
}

/// A fake-reconstruction record for one truth interaction
#[derive(Clone, Debug)]
pub struct FakeRecoRecord {
    /// Index of the truth interaction this record was derived from
    pub interaction: usize,

    /// Smeared neutrino energy (GeV)
    pub nu_energy: Float,

    /// Smeared interaction vertex
    pub vertex: Position,

    /// Lepton summary
    pub lepton: FakeRecoLepton,
}

/// One finished record per processed event
#[derive(Debug)]
pub struct EventRecord {
    /// Event-level metadata
    pub header: Header,

    /// Assembled slices, in pattern-recognition order
    pub slices: Vec<SliceRecord>,

    /// Truth branch
    pub truth: TruthBranch,

    /// Whole-event simulated particle list
    pub true_particles: Vec<TrueParticle>,

    /// Fake-reconstruction records
    pub fake_reco: Vec<FakeRecoRecord>,

    /// Cosmic-ray-tagger hits
    pub crt_hits: Vec<CrtHitRecord>,

    /// Flash-trigger decision, false when the trigger did not run
    pub pass_flash_trigger: bool,
}
