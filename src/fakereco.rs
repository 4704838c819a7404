//! Fake reconstruction: smeared truth used for performance studies
//!
//! This pass runs alongside the real record assembly and produces, for each
//! charged-current truth interaction with a muon inside the active volume, a
//! simplified record whose quantities are the true ones smeared by fixed
//! detector resolutions. The generator is seeded from the configuration, so
//! a job reprocessing the same input produces identical fake records.

use crate::{
    inputs::{ActiveVolume, McInteractionInput, McTrackInput},
    momentum::{xyz, Z},
    numeric::{reals::consts::PI, Float},
    records::{FakeRecoLepton, FakeRecoRecord},
};
use prefix_num_ops::real::*;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// Relative resolution of the smeared neutrino energy
const ENERGY_RESOLUTION: Float = 0.10;

/// Relative resolution of the smeared lepton momentum
const MOMENTUM_RESOLUTION: Float = 0.05;

/// Absolute resolution of the smeared vertex position (cm)
const VERTEX_RESOLUTION: Float = 2.0;

/// Muon particle code
const MUON_PDG: i32 = 13;

/// The fake-reconstruction pass, owning its seeded generator
pub struct FakeReco {
    rng: Xoshiro256Plus,
}
//
impl FakeReco {
    /// Set up the pass with a reproducible generator state
    pub fn new(seed: u64) -> Self {
        FakeReco {
            rng: Xoshiro256Plus::seed_from_u64(seed),
        }
    }

    /// Produce the fake records of one event
    ///
    /// Interactions without a contained charged-current muon yield nothing;
    /// an event with no interactions at all yields an empty list.
    pub fn fill(
        &mut self,
        mc_truths: &[McInteractionInput],
        mc_tracks: &[McTrackInput],
        volumes: &[ActiveVolume],
    ) -> Vec<FakeRecoRecord> {
        let mut records = Vec::new();
        for (index, truth) in mc_truths.iter().enumerate() {
            if !truth.is_cc {
                continue;
            }
            if !volumes.iter().any(|vol| vol.contains(&truth.vertex)) {
                continue;
            }
            let Some(lepton) = mc_tracks.iter().find(|track| {
                track.interaction == Some(index) && track.pdg.abs() == MUON_PDG
            }) else {
                continue;
            };

            let momentum = xyz(&lepton.start_momentum);
            let smeared_momentum = momentum.norm() * (1. + MOMENTUM_RESOLUTION * self.gauss());
            let costh = if momentum.norm() > 0. {
                momentum[Z] / momentum.norm()
            } else {
                0.
            };
            let mut vertex = truth.vertex;
            for coord in vertex.iter_mut() {
                *coord += VERTEX_RESOLUTION * self.gauss();
            }

            records.push(FakeRecoRecord {
                interaction: index,
                nu_energy: truth.energy * (1. + ENERGY_RESOLUTION * self.gauss()),
                vertex,
                lepton: FakeRecoLepton {
                    pdg: lepton.pdg,
                    momentum: abs(smeared_momentum),
                    costh,
                    length: (lepton.end - lepton.start).norm(),
                    contained: volumes.iter().any(|vol| vol.contains(&lepton.end)),
                },
            });
        }
        records
    }

    /// One standard-normal draw, by the Box-Muller transform
    fn gauss(&mut self) -> Float {
        // Map the first uniform draw into (0, 1] to keep the log finite
        let u: Float = 1. - self.rng.gen::<Float>();
        let v: Float = self.rng.gen();
        sqrt(-2. * ln(u)) * cos(2. * PI * v)
    }
}
