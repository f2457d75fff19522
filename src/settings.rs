use crate::error::{Error, Result};
use crate::geometry::BoundaryCondition;
use crate::material::check_absorbing;
use crate::source::SourceDistribution;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Run configuration, fixed for the lifetime of a simulation.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Histories per generation (size of the source bank).
    pub particles: usize,
    pub batches: usize,
    /// Generations per batch.
    pub generations: usize,
    /// Number of final batches whose k-effective is recorded.
    pub active: usize,
    pub boundary: BoundaryCondition,
    pub source: SourceDistribution,
    /// Box extents along x, y and z.
    pub extent: [f64; 3],
    pub nuclides: usize,
    pub nu: f64,
    pub xs_f: f64,
    pub xs_a: f64,
    pub xs_s: f64,
    /// Mesh bins per axis for the entropy diagnostic and the flux tally.
    pub bins: usize,
    pub seed: u64,
    /// Turn on the mesh flux tally during active batches.
    pub tally: bool,
    /// Transport workers; `None` uses one per available thread.
    pub threads: Option<usize>,
    pub output: OutputSettings,
}

/// Optional output files; a file is written only when its path is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub keff_file: Option<PathBuf>,
    pub entropy_file: Option<PathBuf>,
    pub tally_file: Option<PathBuf>,
    pub bank_file: Option<PathBuf>,
    /// Source site positions after every generation's resampling.
    pub source_file: Option<PathBuf>,
    /// Read the initial source bank from this JSON file instead of sampling it.
    pub load_source: Option<PathBuf>,
    /// Write the final source bank to this JSON file.
    pub save_source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particles: 10_000,
            batches: 20,
            generations: 1,
            active: 10,
            boundary: BoundaryCondition::Reflect,
            source: SourceDistribution::Flat,
            extent: [1000.0, 1000.0, 1000.0],
            nuclides: 60,
            nu: 1.5,
            xs_f: 2.29,
            xs_a: 3.42,
            xs_s: 2.29,
            bins: 10,
            seed: 1,
            tally: false,
            threads: None,
            output: OutputSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, filling missing keys with defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Index of the first active batch.
    pub fn first_active_batch(&self) -> usize {
        self.batches - self.active
    }

    /// Number of transport workers the generation loop splits histories over.
    pub fn workers(&self) -> usize {
        self.threads.unwrap_or_else(rayon::current_num_threads).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("particles", self.particles),
            ("batches", self.batches),
            ("generations", self.generations),
            ("nuclides", self.nuclides),
            ("bins", self.bins),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidParam(format!("{} must be > 0", name)));
            }
        }
        if self.active > self.batches {
            return Err(Error::InvalidParam(format!(
                "active batches ({}) cannot exceed total batches ({})",
                self.active, self.batches
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidParam("threads must be > 0".to_string()));
        }
        if !self.extent.iter().all(|&l| l.is_finite() && l > 0.0) {
            return Err(Error::InvalidParam(format!(
                "extent components must be finite and > 0, got {:?}",
                self.extent
            )));
        }
        if !self.nu.is_finite() || self.nu < 0.0 {
            return Err(Error::InvalidParam("nu must be finite and >= 0".to_string()));
        }
        for (name, xs) in [("xs_f", self.xs_f), ("xs_a", self.xs_a), ("xs_s", self.xs_s)] {
            if !xs.is_finite() || xs < 0.0 {
                return Err(Error::InvalidParam(format!("{} must be finite and >= 0", name)));
            }
        }
        if self.xs_a + self.xs_s <= 0.0 {
            return Err(Error::InvalidParam(
                "xs_a + xs_s (total cross section) must be > 0".to_string(),
            ));
        }
        if self.xs_f > self.xs_a {
            return Err(Error::InvalidParam(
                "xs_f cannot exceed xs_a: fission is a kind of absorption".to_string(),
            ));
        }
        check_absorbing(self.xs_a, self.boundary)?;
        Ok(())
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn row(f: &mut fmt::Formatter<'_>, key: &str, value: impl fmt::Display) -> fmt::Result {
            writeln!(f, "{:<32}{}", key, value)
        }
        row(f, "Number of particles:", self.particles)?;
        row(f, "Number of batches:", self.batches)?;
        row(f, "Number of active batches:", self.active)?;
        row(f, "Number of generations:", self.generations)?;
        row(f, "Boundary conditions:", format!("{:?}", self.boundary))?;
        row(f, "Source distribution:", format!("{:?}", self.source))?;
        row(f, "Number of nuclides in material:", self.nuclides)?;
        row(f, "Geometry extents:", format!("{:?}", self.extent))?;
        row(f, "Average neutrons per fission:", self.nu)?;
        row(f, "Fission cross section:", self.xs_f)?;
        row(f, "Absorption cross section:", self.xs_a)?;
        row(f, "Scattering cross section:", self.xs_s)?;
        row(f, "Mesh bins per axis:", self.bins)?;
        row(f, "Tallies:", if self.tally { "on" } else { "off" })?;
        row(f, "Workers:", self.workers())?;
        write!(f, "{:<32}{}", "RNG seed:", self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.particles, 10_000);
        assert_eq!(s.first_active_batch(), 10);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(
            r#"{"particles": 500, "boundary": "vacuum", "output": {"keff_file": "k.dat"}}"#,
        )
        .unwrap();
        assert_eq!(s.particles, 500);
        assert_eq!(s.boundary, BoundaryCondition::Vacuum);
        assert_eq!(s.batches, 20);
        assert_eq!(s.output.keff_file, Some(PathBuf::from("k.dat")));
        assert_eq!(s.output.entropy_file, None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let res: std::result::Result<Settings, _> = serde_json::from_str(r#"{"particels": 5}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"seed": 99, "active": 0}}"#).unwrap();
        let s = Settings::from_json_file(file.path()).unwrap();
        assert_eq!(s.seed, 99);
        assert_eq!(s.active, 0);
        assert_eq!(s.first_active_batch(), s.batches);
    }

    #[test]
    fn test_json_round_trip_of_defaults() {
        let s = Settings::default();
        let back: Settings = serde_json::from_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn test_validation_failures() {
        let cases: Vec<Box<dyn Fn(&mut Settings)>> = vec![
            Box::new(|s: &mut Settings| s.particles = 0),
            Box::new(|s: &mut Settings| s.generations = 0),
            Box::new(|s: &mut Settings| s.active = s.batches + 1),
            Box::new(|s: &mut Settings| s.bins = 0),
            Box::new(|s: &mut Settings| s.threads = Some(0)),
            Box::new(|s: &mut Settings| s.extent = [1.0, -1.0, 1.0]),
            Box::new(|s: &mut Settings| s.xs_f = s.xs_a + 1.0),
            Box::new(|s: &mut Settings| s.nu = f64::NAN),
            Box::new(|s: &mut Settings| {
                s.xs_f = 0.0;
                s.xs_a = 0.0;
                s.boundary = BoundaryCondition::Periodic;
            }),
        ];
        for mutate in cases {
            let mut s = Settings::default();
            mutate(&mut s);
            assert!(matches!(s.validate(), Err(Error::InvalidParam(_))), "{:?}", s);
        }
    }

    #[test]
    fn test_pure_scatterer_rejected_unless_box_leaks() {
        let scatterer = Settings {
            xs_f: 0.0,
            xs_a: 0.0,
            xs_s: 1.0,
            ..Settings::default()
        };
        assert_eq!(scatterer.boundary, BoundaryCondition::Reflect);
        assert!(matches!(scatterer.validate(), Err(Error::InvalidParam(_))));

        let leaky = Settings {
            boundary: BoundaryCondition::Vacuum,
            ..scatterer
        };
        assert!(leaky.validate().is_ok());
    }

    #[test]
    fn test_workers_respects_threads() {
        let s = Settings {
            threads: Some(3),
            ..Settings::default()
        };
        assert_eq!(s.workers(), 3);
        assert!(Settings::default().workers() >= 1);
    }
}
