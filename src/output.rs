// Plain-text result files. Each enabled file is truncated when the run starts
// and appended to afterwards.

use crate::bank::Bank;
use crate::error::{Error, Result};
use crate::particle::Particle;
use crate::settings::OutputSettings;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct OutputFiles {
    keff: Option<PathBuf>,
    entropy: Option<PathBuf>,
    tally: Option<PathBuf>,
    bank: Option<PathBuf>,
    source: Option<PathBuf>,
}

impl OutputFiles {
    /// Create (or truncate) every configured file.
    pub fn init(settings: &OutputSettings) -> Result<Self> {
        let files = Self {
            keff: settings.keff_file.clone(),
            entropy: settings.entropy_file.clone(),
            tally: settings.tally_file.clone(),
            bank: settings.bank_file.clone(),
            source: settings.source_file.clone(),
        };
        let paths = [
            &files.keff,
            &files.entropy,
            &files.tally,
            &files.bank,
            &files.source,
        ];
        for path in paths.into_iter().flatten() {
            File::create(path)?;
        }
        Ok(files)
    }

    pub fn write_entropy(&self, h: f64) -> Result<()> {
        match &self.entropy {
            Some(path) => append_line(path, &format!("{:.10}", h)),
            None => Ok(()),
        }
    }

    /// Write the k-effective of every active batch, one per line.
    pub fn write_keff(&self, keff: &[f64]) -> Result<()> {
        let Some(path) = &self.keff else {
            return Ok(());
        };
        let mut w = BufWriter::new(OpenOptions::new().append(true).create(true).open(path)?);
        for k in keff {
            writeln!(w, "{:.10}", k)?;
        }
        w.flush()?;
        Ok(())
    }

    /// Append one batch's flux mesh as a single line.
    pub fn write_tally(&self, flux: &[f64]) -> Result<()> {
        match &self.tally {
            Some(path) => append_line(path, &join(flux.iter().map(|f| format!("{:e}", f)))),
            None => Ok(()),
        }
    }

    /// Append a snapshot of the bank, one particle per line: `x y z u v w energy`.
    pub fn write_bank(&self, bank: &Bank) -> Result<()> {
        let Some(path) = &self.bank else {
            return Ok(());
        };
        let mut w = BufWriter::new(OpenOptions::new().append(true).create(true).open(path)?);
        for p in bank {
            let [x, y, z] = p.position;
            let [u, v, wd] = p.direction;
            writeln!(w, "{} {} {} {} {} {} {}", x, y, z, u, v, wd, p.energy)?;
        }
        w.flush()?;
        Ok(())
    }

    /// Append the source site positions, one `x y z` line per site.
    pub fn write_source(&self, bank: &Bank) -> Result<()> {
        let Some(path) = &self.source else {
            return Ok(());
        };
        let mut w = BufWriter::new(OpenOptions::new().append(true).create(true).open(path)?);
        for p in bank {
            let [x, y, z] = p.position;
            writeln!(w, "{} {} {}", x, y, z)?;
        }
        w.flush()?;
        Ok(())
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new().append(true).create(true).open(path)?;
    writeln!(f, "{}", line)?;
    Ok(())
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(" ")
}

/// Save a source bank as JSON.
pub fn save_source(path: &Path, bank: &Bank) -> Result<()> {
    let w = BufWriter::new(File::create(path)?);
    serde_json::to_writer(w, bank.as_slice())?;
    Ok(())
}

/// Load a source bank previously written by [`save_source`], requiring exactly
/// `expected` particles.
pub fn load_source(path: &Path, expected: usize) -> Result<Vec<Particle>> {
    let text = std::fs::read_to_string(path)?;
    let particles: Vec<Particle> = serde_json::from_str(&text)?;
    if particles.len() != expected {
        return Err(Error::Parse(format!(
            "source file {} holds {} particles, expected {}",
            path.display(),
            particles.len(),
            expected
        )));
    }
    Ok(particles)
}
