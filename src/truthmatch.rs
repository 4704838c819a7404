//! Matching reconstructed objects to the simulated particles that made them
//!
//! Built once per event from the simulated per-channel energy deposits, the
//! [`TruthHitIndex`] answers two questions: which simulated particle
//! dominates a given reconstructed hit, and how much energy a given particle
//! deposited over the whole event. On top of it, [`TruthHitIndex::match_hits`]
//! aggregates the deposits behind any set of hits (a track's, a shower's, a
//! whole slice's) and selects the dominant contributor together with purity
//! and completeness scores.
//!
//! "No overlapping deposit" is an explicit unmatched state everywhere in
//! this module. It is never collapsed into a zero-energy match, and ties are
//! broken toward the lowest particle identifier so that reprocessing a file
//! yields identical records.

use crate::{
    inputs::{ClockInfo, HitInput, SimChannelInput},
    numeric::Float,
};
use num_traits::Zero;
use std::collections::{BTreeMap, HashMap};

/// One energy deposit as seen from the index
struct IndexedDeposit {
    /// Readout time (TDC counts)
    tdc: Float,

    /// Depositing simulated particle
    particle: i32,

    /// Deposited energy (MeV)
    energy: Float,
}

/// Per-event index of simulated energy deposits
pub struct TruthHitIndex {
    /// Deposits of each channel, in input order
    by_channel: HashMap<u32, Vec<IndexedDeposit>>,

    /// Total deposited energy of each particle over the whole event
    totals: BTreeMap<i32, Float>,
}
//
impl TruthHitIndex {
    /// Walk the simulated channels and build the index
    pub fn build(sim_channels: &[SimChannelInput]) -> Self {
        let mut by_channel: HashMap<u32, Vec<IndexedDeposit>> = HashMap::new();
        let mut totals: BTreeMap<i32, Float> = BTreeMap::new();

        for channel in sim_channels {
            let entries = by_channel.entry(channel.channel).or_default();
            for timed in &channel.deposits {
                for deposit in &timed.deposits {
                    entries.push(IndexedDeposit {
                        tdc: timed.tdc,
                        particle: deposit.particle,
                        energy: deposit.energy,
                    });
                    *totals.entry(deposit.particle).or_insert(0.) += deposit.energy;
                }
            }
        }

        TruthHitIndex { by_channel, totals }
    }

    /// Total energy a particle deposited over the whole event (MeV)
    pub fn total_energy(&self, particle: i32) -> Float {
        self.totals.get(&particle).copied().unwrap_or(0.)
    }

    /// Accumulate the deposits behind one hit into a per-particle sum
    fn accumulate_hit(
        &self,
        hit: &HitInput,
        clocks: &ClockInfo,
        sums: &mut BTreeMap<i32, Float>,
    ) {
        let lo = clocks.tpc_tick_to_tdc(hit.start_tick);
        let hi = clocks.tpc_tick_to_tdc(hit.end_tick);
        let Some(deposits) = self.by_channel.get(&hit.channel) else {
            return;
        };
        for deposit in deposits {
            if deposit.tdc >= lo && deposit.tdc <= hi {
                *sums.entry(deposit.particle).or_insert(0.) += deposit.energy;
            }
        }
    }

    /// The simulated particle that dominates one reconstructed hit
    ///
    /// Restricts the hit channel's deposits to the hit's time window and
    /// picks the particle with the largest deposited energy there. A hit
    /// with no overlapping deposit yields `None`.
    pub fn best_particle(&self, hit: &HitInput, clocks: &ClockInfo) -> Option<i32> {
        let mut sums = BTreeMap::new();
        self.accumulate_hit(hit, clocks, &mut sums);
        dominant(&sums).map(|(particle, _)| particle)
    }

    /// Truth-match an object from the set of hits that belong to it
    pub fn match_hits<'hit>(
        &self,
        hits: impl IntoIterator<Item = &'hit HitInput>,
        clocks: &ClockInfo,
    ) -> TruthMatch {
        let mut sums = BTreeMap::new();
        for hit in hits {
            self.accumulate_hit(hit, clocks, &mut sums);
        }

        let total: Float = sums.values().sum();
        let Some((particle, energy)) = dominant(&sums) else {
            return TruthMatch::Unmatched;
        };
        if total.is_zero() {
            // Deposits can carry zero energy; treat an all-zero overlap the
            // same as no overlap rather than divide by it
            return TruthMatch::Unmatched;
        }

        TruthMatch::Matched {
            particle,
            purity: energy / total,
            completeness: energy / self.total_energy(particle),
        }
    }
}

/// Pick the largest contribution, ties broken toward the lowest identifier
///
/// Relies on the map iterating in ascending key order together with a
/// strictly-greater comparison.
fn dominant(sums: &BTreeMap<i32, Float>) -> Option<(i32, Float)> {
    let mut best: Option<(i32, Float)> = None;
    for (&particle, &energy) in sums {
        match best {
            Some((_, best_energy)) if energy <= best_energy => {}
            _ => best = Some((particle, energy)),
        }
    }
    best
}

/// Outcome of truth-matching one reconstructed object
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TruthMatch {
    /// The object has no hits, or none of its hits overlap a deposit
    Unmatched,

    /// A dominant contributor was found
    Matched {
        /// Simulation track identifier of the dominant contributor
        particle: i32,

        /// Fraction of the object's deposited energy owed to that particle
        purity: Float,

        /// Fraction of that particle's whole-event energy captured here
        completeness: Float,
    },
}
//
impl TruthMatch {
    /// The matched particle identifier, if any
    pub fn particle(&self) -> Option<i32> {
        match *self {
            TruthMatch::Unmatched => None,
            TruthMatch::Matched { particle, .. } => Some(particle),
        }
    }

    /// The completeness score, if matched
    pub fn completeness(&self) -> Option<Float> {
        match *self {
            TruthMatch::Unmatched => None,
            TruthMatch::Matched { completeness, .. } => Some(completeness),
        }
    }
}
