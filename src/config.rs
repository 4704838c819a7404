//! Mechanism for loading and sharing the job configuration
//!
//! The host framework hands us a small parameter file naming, for every
//! upstream product and association, the label it was produced under, plus
//! the policy flags that control how lookup failures are handled. An empty
//! label (spelled `none` in the file) marks a product as intentionally
//! absent for this job.

use eyre::{ensure, eyre, Report, Result, WrapErr};

use std::{fs::File, io::Read, str::FromStr};

/// Sentinel spelling of an empty label in the configuration file
const NO_LABEL: &str = "none";

/// Job configuration
pub struct Configuration {
    /// Whether an unresolved non-empty label aborts the job
    pub strict: bool,

    /// Whether slices tagged as clear cosmic-ray activity are dropped
    pub cut_clear_cosmic: bool,

    /// Whether CRT hit matches report the TS0 or the TS1 timestamp
    pub crt_use_ts0: bool,

    /// Seed of the fake-reconstruction smearing generator
    pub fake_reco_seed: u64,

    /// Label of the neutrino generator truth
    pub gen_label: String,

    /// Label of the cosmic-ray generator truth
    pub cosmic_gen_label: String,

    /// Label of the particle-gun generator truth
    pub particle_gun_gen_label: String,

    /// Label of the detector-simulation particle collection
    pub g4_label: String,

    /// Label of the per-channel simulated energy deposits
    pub sim_channel_label: String,

    /// Label of the fast-simulation track collection used by fake reco
    pub mc_track_label: String,

    /// Label of the flash-trigger decision
    pub flash_trigger_label: String,

    /// Label of the cosmic-ray-tagger hit collection
    pub crt_hit_label: String,

    /// Label of the slice/particle pattern-recognition products
    pub particle_label: String,

    /// Label of the track fit products
    pub track_label: String,

    /// Label of the shower fit products
    pub shower_label: String,

    /// Label of the shower selection products (residuals and refits)
    pub shower_selection_label: String,

    /// Label of the track calorimetry products
    pub calo_label: String,

    /// Label of the track particle-identification products
    pub pid_label: String,

    /// Label of the slice flash-match products
    pub flash_match_label: String,

    /// Label of the track-to-CRT-hit match products
    pub crt_hit_match_label: String,

    /// Base label of the multiple-Coulomb-scattering momentum fits
    pub mcs_label: String,

    /// Base label of the momentum-by-range fits
    pub range_label: String,
}
//
impl Configuration {
    /// Load the configuration from a file, check it, and print it out
    pub fn load(file_name: &str) -> Result<Self> {
        // Read out the job's configuration file or die trying.
        let config_str = {
            let mut config_file = File::open(file_name)?;
            let mut buffer = String::new();
            config_file.read_to_string(&mut buffer)?;
            buffer
        };

        // We will iterate over the configuration items. In this simple config
        // file format, these should be the first non-whitespace chunk of text
        // on each line. We will ignore blank lines.
        let mut config_iter = config_str
            .lines()
            .filter_map(|line| line.split_whitespace().next());

        // This closure fetches the next configuration item, tagging it with
        // the name of the configuration field which it is supposed to fill to
        // ease error reporting, and handling unexpected end-of-file too.
        let mut next_item = |name: &'static str| -> Result<ConfigItem> {
            config_iter
                .next()
                .map(|data| ConfigItem::new(name, data))
                .ok_or_else(|| eyre!("Missing configuration of {}", name))
        };

        // Decode the configuration items into concrete values
        let config = Configuration {
            strict: next_item("strict")?.parse::<bool>()?,
            cut_clear_cosmic: next_item("cut_clear_cosmic")?.parse::<bool>()?,
            crt_use_ts0: next_item("crt_use_ts0")?.parse::<bool>()?,
            fake_reco_seed: next_item("fake_reco_seed")?.parse::<u64>()?,
            gen_label: next_item("gen_label")?.parse_label(),
            cosmic_gen_label: next_item("cosmic_gen_label")?.parse_label(),
            particle_gun_gen_label: next_item("particle_gun_gen_label")?.parse_label(),
            g4_label: next_item("g4_label")?.parse_label(),
            sim_channel_label: next_item("sim_channel_label")?.parse_label(),
            mc_track_label: next_item("mc_track_label")?.parse_label(),
            flash_trigger_label: next_item("flash_trigger_label")?.parse_label(),
            crt_hit_label: next_item("crt_hit_label")?.parse_label(),
            particle_label: next_item("particle_label")?.parse_label(),
            track_label: next_item("track_label")?.parse_label(),
            shower_label: next_item("shower_label")?.parse_label(),
            shower_selection_label: next_item("shower_selection_label")?.parse_label(),
            calo_label: next_item("calo_label")?.parse_label(),
            pid_label: next_item("pid_label")?.parse_label(),
            flash_match_label: next_item("flash_match_label")?.parse_label(),
            crt_hit_match_label: next_item("crt_hit_match_label")?.parse_label(),
            mcs_label: next_item("mcs_label")?.parse_label(),
            range_label: next_item("range_label")?.parse_label(),
        };

        // Display it the way the original framework job would, to ease
        // comparisons between processing logs
        config.print();

        // A job whose pattern-recognition label is empty can never produce a
        // slice record, which is certainly a misconfiguration
        ensure!(
            !config.particle_label.is_empty(),
            "Please configure a pattern-recognition (particle) label"
        );

        // If nothing bad occured, we can now return the configuration
        Ok(config)
    }

    /// Display the configuration
    pub fn print(&self) {
        println!("StrictMode        : {}", self.strict);
        println!("CutClearCosmic    : {}", self.cut_clear_cosmic);
        println!("CRTHitUseTS0      : {}", self.crt_use_ts0);
        println!("FakeRecoSeed      : {}", self.fake_reco_seed);
        println!("GenLabel          : {}", self.gen_label);
        println!("CosmicGenLabel    : {}", self.cosmic_gen_label);
        println!("ParticleGunLabel  : {}", self.particle_gun_gen_label);
        println!("G4Label           : {}", self.g4_label);
        println!("SimChannelLabel   : {}", self.sim_channel_label);
        println!("MCTrackLabel      : {}", self.mc_track_label);
        println!("FlashTrigLabel    : {}", self.flash_trigger_label);
        println!("CRTHitLabel       : {}", self.crt_hit_label);
        println!("ParticleLabel     : {}", self.particle_label);
        println!("TrackLabel        : {}", self.track_label);
        println!("ShowerLabel       : {}", self.shower_label);
        println!("ShowerSelLabel    : {}", self.shower_selection_label);
        println!("CaloLabel         : {}", self.calo_label);
        println!("PidLabel          : {}", self.pid_label);
        println!("FlashMatchLabel   : {}", self.flash_match_label);
        println!("CRTHitMatchLabel  : {}", self.crt_hit_match_label);
        println!("MCSLabel          : {}", self.mcs_label);
        println!("RangeLabel        : {}", self.range_label);
    }
}

impl Default for Configuration {
    /// Conventional labels of the standard reconstruction chain
    ///
    /// This is what hosts and tests start from before overriding the labels
    /// their input files actually carry.
    fn default() -> Self {
        Configuration {
            strict: true,
            cut_clear_cosmic: false,
            crt_use_ts0: false,
            fake_reco_seed: 12345,
            gen_label: "generator".to_owned(),
            cosmic_gen_label: "cosmgen".to_owned(),
            particle_gun_gen_label: "pgun".to_owned(),
            g4_label: "largeant".to_owned(),
            sim_channel_label: "simdrift".to_owned(),
            mc_track_label: "mcreco".to_owned(),
            flash_trigger_label: "flashtrig".to_owned(),
            crt_hit_label: "crthit".to_owned(),
            particle_label: "pandora".to_owned(),
            track_label: "pandoraTrack".to_owned(),
            shower_label: "pandoraShower".to_owned(),
            shower_selection_label: "pandoraShowerSel".to_owned(),
            calo_label: "pandoraCalo".to_owned(),
            pid_label: "pandoraPid".to_owned(),
            flash_match_label: "fmatch".to_owned(),
            crt_hit_match_label: "crtmatch".to_owned(),
            mcs_label: "pandoraTrackMCS".to_owned(),
            range_label: "pandoraTrackRange".to_owned(),
        }
    }
}

/// A value from the configuration file, tagged with the struct field which it
/// is supposed to map for error reporting purposes.
struct ConfigItem<'data> {
    name: &'static str,
    data: &'data str,
}
//
impl<'data> ConfigItem<'data> {
    /// Build a config item from a struct field tag and raw iterator data
    fn new(name: &'static str, data: &'data str) -> Self {
        Self { name, data }
    }

    /// Parse this data using Rust's standard parsing logic
    fn parse<T: FromStr>(self) -> Result<T>
    where
        <T as FromStr>::Err: ::std::error::Error + Send + Sync + 'static,
    {
        self.data
            .parse::<T>()
            .map_err(Report::new)
            .wrap_err(format!("Could not parse configuration of {}", self.name))
    }

    /// Parse a product label, mapping the `none` sentinel to an empty label
    ///
    /// The file format is whitespace-separated, so a truly empty token
    /// cannot be written down directly.
    fn parse_label(self) -> String {
        if self.data == NO_LABEL {
            String::new()
        } else {
            self.data.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_sentinel_maps_to_empty() {
        let item = ConfigItem::new("gen_label", "none");
        assert_eq!(item.parse_label(), "");
        let item = ConfigItem::new("gen_label", "generator");
        assert_eq!(item.parse_label(), "generator");
    }

    #[test]
    fn default_configuration_is_strict() {
        let cfg = Configuration::default();
        assert!(cfg.strict);
        assert!(!cfg.cut_clear_cosmic);
        assert!(!cfg.particle_label.is_empty());
    }
}
