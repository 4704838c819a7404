//! End-to-end scenarios: a small simulated event is carried through the
//! whole assembly and the finished record is inspected.

use cafmaker::{
    accum::ExposureAccumulator,
    config::Configuration,
    error::Error,
    event::EventProcessor,
    inputs::{
        volume, AssociationTable, CalorimetryInput, CrtHitInput, EnergyDeposit, EventInputs,
        FlashMatchInput, HitInput, McInteractionInput, McParticleInput, McTrackInput, McsFitInput,
        ParticleIdInput, ParticleInput, ParticleMetadataInput, RangeFitInput, SimChannelInput,
        SliceInput, TimedDeposit, TrackInput, VertexInput,
    },
    records::{McType, MCS_HYPOTHESES, RANGE_HYPOTHESES},
    truthmatch::TruthMatch,
};
use nalgebra::vector;

/// The simulated muon's track identifier in every fixture
const MUON_ID: i32 = 7;

fn hit(channel: u32) -> HitInput {
    HitInput {
        channel,
        start_tick: 0.,
        end_tick: 20.,
        integral: 100.,
    }
}

fn sim_channel(channel: u32, energy: f64) -> SimChannelInput {
    SimChannelInput {
        channel,
        deposits: vec![TimedDeposit {
            tdc: 10.,
            deposits: vec![EnergyDeposit {
                particle: MUON_ID,
                energy,
            }],
        }],
    }
}

fn particle(id: u32, is_primary: bool) -> ParticleInput {
    ParticleInput {
        id,
        pdg: if is_primary { 14 } else { 13 },
        is_primary,
        parent: if is_primary { None } else { Some(0) },
    }
}

fn track(length: f64) -> TrackInput {
    TrackInput {
        length,
        start: vector![0., 0., 50.],
        end: vector![0., 0., 50. + length],
        direction: vector![0., 0., 1.],
    }
}

fn neutrino_truth() -> McInteractionInput {
    McInteractionInput {
        nu_pdg: 14,
        is_cc: true,
        mode: 0,
        energy: 1.5,
        vertex: vector![0., 0., 50.],
        flux: None,
    }
}

fn muon_mc_particle() -> McParticleInput {
    McParticleInput {
        track_id: MUON_ID,
        pdg: 13,
        parent: 0,
        interaction: Some(0),
        start_momentum: cafmaker::momentum::Momentum::new(0., 0., 1., 1.),
        start: vector![0., 0., 50.],
        end: vector![0., 0., 150.],
    }
}

fn muon_mc_track() -> McTrackInput {
    McTrackInput {
        pdg: 13,
        interaction: Some(0),
        start: vector![0., 0., 50.],
        end: vector![0., 0., 150.],
        start_momentum: cafmaker::momentum::Momentum::new(0., 0., 1., 1.),
    }
}

/// Install an association table of every configured kind, so that strict
/// mode resolves everything; edges are added by the individual scenarios
fn install_tables(cfg: &Configuration, inputs: &mut EventInputs) {
    let empty = |label: &str| AssociationTable::new(label.to_owned(), []);
    inputs.assocs.slice_particles = vec![empty(&cfg.particle_label)];
    inputs.assocs.slice_hits = vec![empty(&cfg.particle_label)];
    inputs.assocs.particle_tracks = vec![empty(&cfg.track_label)];
    inputs.assocs.particle_showers = vec![empty(&cfg.shower_label)];
    inputs.assocs.particle_vertices = vec![empty(&cfg.particle_label)];
    inputs.assocs.particle_metadata = vec![empty(&cfg.particle_label)];
    inputs.assocs.particle_flash_matches = vec![empty(&cfg.flash_match_label)];
    inputs.assocs.track_hits = vec![empty(&cfg.track_label)];
    inputs.assocs.shower_hits = vec![empty(&cfg.shower_label)];
    inputs.assocs.track_calorimetry = vec![empty(&cfg.calo_label)];
    inputs.assocs.track_particle_ids = vec![empty(&cfg.pid_label)];
    inputs.assocs.track_crt_hits = vec![AssociationTable::with_payloads(
        cfg.crt_hit_match_label.clone(),
        [],
    )];
    inputs.assocs.track_mcs_fits = MCS_HYPOTHESES
        .iter()
        .map(|name| empty(&format!("{}:{}", cfg.mcs_label, name)))
        .collect();
    inputs.assocs.track_range_fits = RANGE_HYPOTHESES
        .iter()
        .map(|name| empty(&format!("{}:{}", cfg.range_label, name)))
        .collect();
    inputs.assocs.shower_residuals = vec![empty(&cfg.shower_selection_label)];
    inputs.assocs.shower_track_fits = vec![empty(&cfg.shower_selection_label)];
    inputs.assocs.shower_density_fits = vec![empty(&cfg.shower_selection_label)];
}

/// One neutrino interaction, one slice, one primary hierarchy with a single
/// muon track whose hits fully cover the muon's energy deposits
fn one_muon_event(cfg: &Configuration) -> EventInputs {
    let mut inputs = EventInputs::empty(1000, 5);
    inputs.subrun_pot = Some(3e18);
    inputs.active_volumes = vec![volume((-200., 200.), (-200., 200.), (0., 500.))];

    inputs.slices = Some(vec![SliceInput {
        id: 1,
        charge: 4200.,
        center: vector![0., 0., 100.],
    }]);
    inputs.particles = vec![particle(100, true), particle(101, false)];
    inputs.tracks = vec![track(100.)];
    inputs.hits = vec![hit(1), hit(2), hit(3)];
    inputs.vertices = vec![VertexInput {
        position: vector![0., 0., 50.],
    }];
    inputs.flash_matches = vec![FlashMatchInput {
        time: 1.25,
        score: 0.9,
    }];
    inputs.metadata = vec![ParticleMetadataInput {
        nu_score: Some(0.8),
        track_score: None,
        is_clear_cosmic: false,
    }];
    inputs.mcs_fits = vec![McsFitInput {
        fwd_momentum: 0.95,
        bwd_momentum: 0.60,
        is_best_forward: true,
    }];
    inputs.range_fits = vec![RangeFitInput { momentum: 0.97 }];
    inputs.calorimetry = vec![CalorimetryInput {
        plane: 2,
        kinetic_energy: 480.,
        dedx: vec![2.1, 2.2, 2.4],
        residual_range: vec![90., 50., 10.],
    }];
    inputs.particle_ids = vec![ParticleIdInput {
        plane: 2,
        chi2_muon: 8.,
        chi2_pion: 20.,
        chi2_kaon: 60.,
        chi2_proton: 90.,
        pida: 12.,
    }];
    inputs.crt_hits = Some(vec![CrtHitInput {
        position: vector![0., 210., 100.],
        time_ts0: 4.5,
        time_ts1: 5.5,
        pe: 80.,
    }]);
    inputs.flash_trigger = Some(true);

    inputs.mc_truths = Some(vec![neutrino_truth()]);
    inputs.mc_particles = Some(vec![muon_mc_particle()]);
    inputs.mc_tracks = Some(vec![muon_mc_track()]);
    inputs.sim_channels = Some(vec![
        sim_channel(1, 1.0),
        sim_channel(2, 2.0),
        sim_channel(3, 3.0),
    ]);

    install_tables(cfg, &mut inputs);
    inputs.assocs.slice_particles[0] = AssociationTable::new(
        cfg.particle_label.clone(),
        [(0, 0), (0, 1)],
    );
    inputs.assocs.slice_hits[0] = AssociationTable::new(
        cfg.particle_label.clone(),
        [(0, 0), (0, 1), (0, 2)],
    );
    inputs.assocs.particle_tracks[0] =
        AssociationTable::new(cfg.track_label.clone(), [(1, 0)]);
    inputs.assocs.track_hits[0] = AssociationTable::new(
        cfg.track_label.clone(),
        [(0, 0), (0, 1), (0, 2)],
    );
    inputs.assocs.particle_vertices[0] =
        AssociationTable::new(cfg.particle_label.clone(), [(0, 0)]);
    inputs.assocs.particle_metadata[0] =
        AssociationTable::new(cfg.particle_label.clone(), [(0, 0)]);
    inputs.assocs.particle_flash_matches[0] =
        AssociationTable::new(cfg.flash_match_label.clone(), [(0, 0)]);
    inputs.assocs.track_calorimetry[0] =
        AssociationTable::new(cfg.calo_label.clone(), [(0, 0)]);
    inputs.assocs.track_particle_ids[0] =
        AssociationTable::new(cfg.pid_label.clone(), [(0, 0)]);
    inputs.assocs.track_crt_hits[0] = AssociationTable::with_payloads(
        cfg.crt_hit_match_label.clone(),
        [(0usize, 0usize, 4.25)],
    );
    inputs.assocs.track_mcs_fits[0] = AssociationTable::new(
        format!("{}:{}", cfg.mcs_label, MCS_HYPOTHESES[0]),
        [(0, 0)],
    );
    inputs.assocs.track_range_fits[0] = AssociationTable::new(
        format!("{}:{}", cfg.range_label, RANGE_HYPOTHESES[0]),
        [(0, 0)],
    );
    inputs
}

#[test]
fn round_trip_full_overlap_gives_unit_completeness_and_designation() {
    let cfg = Configuration::default();
    let inputs = one_muon_event(&cfg);
    let mut accum = ExposureAccumulator::new();
    accum.record_subrun(inputs.subrun_pot);

    let record = EventProcessor::new(&cfg)
        .process_event(&inputs, &mut accum)
        .unwrap();

    // Header
    assert_eq!(record.header.run, 1000);
    assert_eq!(record.header.subrun, 5);
    assert!(record.header.is_mc);
    assert_eq!(record.header.mc_type, McType::Neutrino);
    assert_eq!(record.header.pot, 3e18);
    assert!(record.pass_flash_trigger);

    // Truth branch
    assert_eq!(record.truth.interactions.len(), 1);
    assert_eq!(record.truth.interactions[0].particles, vec![MUON_ID]);
    assert_eq!(record.true_particles.len(), 1);
    assert_eq!(record.true_particles[0].visible_energy, 6.0);
    assert!(record.true_particles[0].contained);

    // Slice summary
    assert_eq!(record.slices.len(), 1);
    let slc = &record.slices[0];
    assert!(!slc.is_clear_cosmic);
    assert_eq!(slc.nu_score, Some(0.8));
    assert_eq!(slc.flash_time, Some(1.25));
    assert_eq!(slc.vertex, Some(vector![0., 0., 50.]));

    // The slice's hits fully cover the muon's deposits
    match slc.truth {
        TruthMatch::Matched {
            particle,
            purity,
            completeness,
        } => {
            assert_eq!(particle, MUON_ID);
            assert_eq!(purity, 1.0);
            assert_eq!(completeness, 1.0);
        }
        TruthMatch::Unmatched => panic!("slice should be matched"),
    }
    assert_eq!(slc.matched_interaction, Some(0));

    // The muon child is track-like and fully filled
    assert_eq!(slc.tracks.len(), 1);
    assert!(slc.showers.is_empty());
    let trk = &slc.tracks[0];
    assert_eq!(trk.particle, 101);
    assert_eq!(trk.length, 100.);
    assert_eq!(trk.mcs[0].unwrap().fwd_momentum, 0.95);
    assert!(trk.mcs[1].is_none());
    assert_eq!(trk.range[0], Some(0.97));
    assert_eq!(trk.calorimetry.len(), 1);
    assert_eq!(trk.particle_id.len(), 1);
    let crt = trk.crt_match.as_ref().unwrap();
    assert_eq!(crt.time, 4.25);
    assert_eq!(crt.hit_time, 5.5); // TS1 clock by default

    // Cross-slice pass designates this track as the neutrino's candidate
    assert!(trk.truth.designated);
    assert_eq!(trk.truth.matched.completeness(), Some(1.0));

    // Fake reconstruction found the contained charged-current muon
    assert_eq!(record.fake_reco.len(), 1);
    assert_eq!(record.fake_reco[0].interaction, 0);
    assert!(record.fake_reco[0].lepton.contained);
}

#[test]
fn slice_without_primary_is_dropped_but_truth_survives() {
    let mut cfg = Configuration::default();
    cfg.cut_clear_cosmic = true;
    let mut inputs = one_muon_event(&cfg);
    // Nobody claims the primary flag anymore
    for part in &mut inputs.particles {
        part.is_primary = false;
    }

    let mut accum = ExposureAccumulator::new();
    let record = EventProcessor::new(&cfg)
        .process_event(&inputs, &mut accum)
        .unwrap();

    assert!(record.slices.is_empty());
    assert_eq!(record.truth.interactions.len(), 1);
    assert_eq!(record.true_particles.len(), 1);
}

#[test]
fn slice_without_primary_is_kept_when_the_cut_is_off() {
    let cfg = Configuration::default();
    let mut inputs = one_muon_event(&cfg);
    for part in &mut inputs.particles {
        part.is_primary = false;
    }

    let mut accum = ExposureAccumulator::new();
    let record = EventProcessor::new(&cfg)
        .process_event(&inputs, &mut accum)
        .unwrap();

    assert_eq!(record.slices.len(), 1);
    assert!(record.slices[0].is_clear_cosmic);
    // No primary means no flash match, vertex, or score
    assert!(record.slices[0].flash_time.is_none());
    assert!(record.slices[0].vertex.is_none());
    assert!(record.slices[0].nu_score.is_none());
}

#[test]
fn unresolved_label_aborts_in_strict_mode_and_degrades_in_lenient_mode() {
    let mut cfg = Configuration::default();
    let inputs = one_muon_event(&cfg);

    // The tables were written under the default labels; ask for another
    cfg.track_label = "nosuchproducer".to_owned();

    let mut accum = ExposureAccumulator::new();
    let err = EventProcessor::new(&cfg)
        .process_event(&inputs, &mut accum)
        .unwrap_err();
    assert!(matches!(err, Error::MissingAssociation { .. }));

    // The identical input under lenient mode yields a record whose
    // track-dependent fields are simply empty
    cfg.strict = false;
    let record = EventProcessor::new(&cfg)
        .process_event(&inputs, &mut accum)
        .unwrap();
    assert_eq!(record.slices.len(), 1);
    assert!(record.slices[0].tracks.is_empty());
    // The slice-level summary is untouched by the missing track producer
    assert_eq!(record.slices[0].flash_time, Some(1.25));
}

#[test]
fn empty_label_is_absent_by_design_even_in_strict_mode() {
    let mut cfg = Configuration::default();
    cfg.crt_hit_label = String::new();
    cfg.crt_hit_match_label = String::new();
    let mut inputs = one_muon_event(&cfg);
    inputs.crt_hits = None;
    install_tables(&cfg, &mut inputs);

    let mut accum = ExposureAccumulator::new();
    let record = EventProcessor::new(&cfg)
        .process_event(&inputs, &mut accum)
        .unwrap();
    assert!(record.crt_hits.is_empty());
}

#[test]
fn three_events_accumulate_to_three() {
    let cfg = Configuration::default();
    let inputs = one_muon_event(&cfg);
    let mut processor = EventProcessor::new(&cfg);
    let mut accum = ExposureAccumulator::new();
    accum.record_subrun(inputs.subrun_pot);

    for _ in 0..3 {
        processor.process_event(&inputs, &mut accum).unwrap();
    }
    let summary = accum.finalize().unwrap();
    assert_eq!(summary.events, 3);
    assert_eq!(summary.total_pot, 3e18);
}

#[test]
fn zero_events_withhold_finalization() {
    let mut accum = ExposureAccumulator::new();
    accum.record_subrun(Some(1e18));
    assert!(matches!(accum.finalize(), Err(Error::NothingProcessed)));
}

#[test]
fn designation_tie_breaks_toward_the_earliest_slice() {
    let cfg = Configuration::default();
    let mut inputs = EventInputs::empty(1, 1);
    inputs.active_volumes = vec![volume((-200., 200.), (-200., 200.), (0., 500.))];

    // Two slices, each holding a track that captures exactly half of the
    // muon's deposits
    inputs.slices = Some(vec![
        SliceInput {
            id: 1,
            charge: 100.,
            center: vector![0., 0., 100.],
        },
        SliceInput {
            id: 2,
            charge: 100.,
            center: vector![0., 0., 200.],
        },
    ]);
    inputs.particles = vec![
        particle(100, true),
        particle(101, false),
        particle(200, true),
        particle(201, false),
    ];
    inputs.tracks = vec![track(50.), track(50.)];
    inputs.hits = vec![hit(1), hit(2)];
    inputs.mc_truths = Some(vec![neutrino_truth()]);
    inputs.mc_particles = Some(vec![muon_mc_particle()]);
    inputs.mc_tracks = Some(vec![muon_mc_track()]);
    inputs.sim_channels = Some(vec![sim_channel(1, 2.0), sim_channel(2, 2.0)]);
    inputs.crt_hits = Some(Vec::new());
    inputs.flash_trigger = Some(false);

    install_tables(&cfg, &mut inputs);
    inputs.assocs.slice_particles[0] = AssociationTable::new(
        cfg.particle_label.clone(),
        [(0, 0), (0, 1), (1, 2), (1, 3)],
    );
    inputs.assocs.slice_hits[0] = AssociationTable::new(
        cfg.particle_label.clone(),
        [(0, 0), (1, 1)],
    );
    inputs.assocs.particle_tracks[0] =
        AssociationTable::new(cfg.track_label.clone(), [(1, 0), (3, 1)]);
    inputs.assocs.track_hits[0] =
        AssociationTable::new(cfg.track_label.clone(), [(0, 0), (1, 1)]);

    let mut accum = ExposureAccumulator::new();
    let record = EventProcessor::new(&cfg)
        .process_event(&inputs, &mut accum)
        .unwrap();

    assert_eq!(record.slices.len(), 2);
    let first = &record.slices[0].tracks[0];
    let second = &record.slices[1].tracks[0];
    assert_eq!(first.truth.matched.completeness(), Some(0.5));
    assert_eq!(second.truth.matched.completeness(), Some(0.5));
    assert!(first.truth.designated);
    assert!(!second.truth.designated);
}
