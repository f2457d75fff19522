// Batch/generation driver for the eigenvalue calculation.
//
// Per generation: transport the source bank across the worker pool, merge the
// workers' fission banks in worker order, estimate k, resample the fission
// sites back into the source bank and score the source entropy.

use crate::bank::Bank;
use crate::eigenvalue::{synchronize_bank, KeffEstimator};
use crate::entropy::EntropyMesh;
use crate::error::{Error, Result};
use crate::fast_rng::{FastRng, STREAM_MASTER, STREAM_MATERIAL};
use crate::geometry::Geometry;
use crate::material::Material;
use crate::output::{load_source, save_source, OutputFiles};
use crate::settings::Settings;
use crate::source::Source;
use crate::tally::Tally;
use crate::transport::{Transport, WorkerState};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Whether the current batch contributes to the k-effective series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Inactive,
    Active,
}

/// Results of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// k-effective of each active batch, in batch order.
    pub batch_keff: Vec<f64>,
    pub keff_mean: f64,
    /// Sample standard deviation; NaN with fewer than two active batches.
    pub keff_std: f64,
    /// Source entropy after every generation of every batch.
    pub entropy: Vec<f64>,
    pub elapsed: Duration,
}

pub struct Simulation {
    settings: Settings,
    geometry: Geometry,
    material: Material,
    source: Source,
    source_bank: Bank,
    fission_bank: Bank,
    workers: Vec<WorkerState>,
    tally: Tally,
    entropy_mesh: EntropyMesh,
    master_rng: FastRng,
    output: OutputFiles,
    phase: BatchPhase,
    print_status: bool,
}

impl Simulation {
    /// Validate `settings`, build the problem and fill the initial source bank,
    /// either sampled from the source distribution or read from
    /// `settings.output.load_source`.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let geometry = Geometry::new(settings.extent, settings.boundary)?;
        let mut material_rng = FastRng::stream(settings.seed, STREAM_MATERIAL);
        let material = Material::new(
            settings.xs_f,
            settings.xs_a,
            settings.xs_s,
            settings.nu,
            settings.nuclides,
            &mut material_rng,
        )?;
        let source = Source::new(settings.source, geometry.clone())?;
        let mut master_rng = FastRng::stream(settings.seed, STREAM_MASTER);

        let n = settings.particles;
        let mut source_bank = Bank::with_capacity("source bank", n)?;
        match &settings.output.load_source {
            Some(path) => {
                for p in load_source(path, n)? {
                    if !geometry.contains(p.position) {
                        return Err(Error::InvalidParam(format!(
                            "loaded source site {:?} lies outside the geometry {:?}",
                            p.position, geometry.extent
                        )));
                    }
                    source_bank.push(p)?;
                }
                info!(path = %path.display(), particles = n, "loaded initial source bank");
            }
            None => {
                for _ in 0..n {
                    source_bank.push(source.sample(&mut master_rng))?;
                }
            }
        }

        let fission_bank = Bank::with_capacity("fission bank", 2 * n)?;
        let tally = Tally::new(&geometry, settings.bins)?;
        let entropy_mesh = EntropyMesh::new(&geometry, settings.bins)?;

        let n_workers = settings.workers();
        let per_worker = 2 * n.div_ceil(n_workers);
        let workers = (0..n_workers)
            .map(|w| WorkerState::new(w, settings.seed, tally.worker_scores()?, per_worker))
            .collect::<Result<Vec<_>>>()?;

        let output = OutputFiles::init(&settings.output)?;

        debug!(
            workers = n_workers,
            nuclides = material.nuclides.len(),
            k_inf = material.k_infinity(),
            "simulation initialized"
        );

        Ok(Self {
            settings,
            geometry,
            material,
            source,
            source_bank,
            fission_bank,
            workers,
            tally,
            entropy_mesh,
            master_rng,
            output,
            phase: BatchPhase::Inactive,
            print_status: false,
        })
    }

    /// Print the per-batch status table to stdout while running.
    pub fn with_status_table(mut self, on: bool) -> Self {
        self.print_status = on;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn source_bank(&self) -> &Bank {
        &self.source_bank
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    /// Run every batch and return the k-effective and entropy history.
    ///
    /// The first error aborts the run and is returned as is.
    pub fn run<T: Transport>(&mut self, transport: &T) -> Result<RunSummary> {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.len())
            .build()?;

        let n_batches = self.settings.batches;
        let n_generations = self.settings.generations;
        let first_active = self.settings.first_active_batch();
        let mut keff = KeffEstimator::new(self.settings.active);
        let mut entropy = Vec::with_capacity(n_batches * n_generations);

        info!(
            batches = n_batches,
            active = self.settings.active,
            generations = n_generations,
            particles = self.settings.particles,
            workers = self.workers.len(),
            "starting eigenvalue run"
        );
        if self.print_status {
            println!("{:>8}  {:>10}  {:>10}  {:>22}", "BATCH", "ENTROPY", "KEFF", "MEAN KEFF");
        }

        for i_b in 0..n_batches {
            if i_b >= first_active {
                self.activate()?;
            }

            let mut h = 0.0;
            for i_g in 0..n_generations {
                pool.install(|| self.transport_generation(transport))?;
                self.merge_worker_banks()?;

                let k_gen = keff.add_generation(self.fission_bank.len(), self.source_bank.len());
                synchronize_bank(
                    &mut self.source_bank,
                    &mut self.fission_bank,
                    &self.source,
                    &mut self.master_rng,
                );

                h = self.entropy_mesh.entropy(self.source_bank.as_slice())?;
                entropy.push(h);
                self.output.write_entropy(h)?;
                self.output.write_source(&self.source_bank)?;
                debug!(batch = i_b + 1, generation = i_g + 1, keff = k_gen, entropy = h);
            }

            let active = self.phase == BatchPhase::Active;
            let k_batch = keff.finish_batch(active);
            if self.tally.tallies_on {
                let batch_flux = self
                    .tally
                    .batch_tally(self.settings.particles * n_generations);
                self.output.write_tally(&batch_flux)?;
            }
            self.output.write_bank(&self.source_bank)?;

            let (mean, std) = keff.statistics();
            if active {
                info!(batch = i_b + 1, keff = k_batch, entropy = h, mean, std, "batch complete");
            } else {
                info!(batch = i_b + 1, keff = k_batch, entropy = h, "inactive batch complete");
            }
            if self.print_status {
                self.print_status_row(i_b + 1, h, k_batch, active.then_some((mean, std)));
            }
        }

        self.output.write_keff(keff.batch_keff())?;
        if let Some(path) = &self.settings.output.save_source {
            save_source(path, &self.source_bank)?;
            info!(path = %path.display(), "saved final source bank");
        }

        let (keff_mean, keff_std) = keff.statistics();
        if keff.batch_keff().len() < 2 {
            warn!(
                active = keff.batch_keff().len(),
                "fewer than two active batches, k-effective standard deviation is undefined"
            );
        }
        let summary = RunSummary {
            batch_keff: keff.into_batch_keff(),
            keff_mean,
            keff_std,
            entropy,
            elapsed: start.elapsed(),
        };
        info!(
            keff = summary.keff_mean,
            std = summary.keff_std,
            elapsed_s = summary.elapsed.as_secs_f64(),
            "eigenvalue run finished"
        );
        Ok(summary)
    }

    /// Enter the active phase. Tallies are switched on at most once.
    fn activate(&mut self) -> Result<()> {
        if self.phase == BatchPhase::Active {
            return Ok(());
        }
        self.phase = BatchPhase::Active;
        if self.settings.tally && !self.tally.tallies_on {
            self.tally.tallies_on = true;
            for w in &mut self.workers {
                w.scores = self.tally.worker_scores()?;
            }
            info!("tallies switched on");
        }
        Ok(())
    }

    /// Transport the whole source bank. Worker `w` takes the `w`-th contiguous
    /// chunk, so the set of histories each worker runs is fixed for a given
    /// worker count.
    fn transport_generation<T: Transport>(&mut self, transport: &T) -> Result<()> {
        let n_workers = self.workers.len();
        let chunk = self.source_bank.len().div_ceil(n_workers).max(1);
        let geometry = &self.geometry;
        let material = &self.material;

        self.workers
            .par_iter_mut()
            .zip(self.source_bank.as_slice().par_chunks(chunk))
            .try_for_each(|(worker, histories)| {
                for particle in histories {
                    let mut p = *particle;
                    transport.transport(&mut p, geometry, material, worker)?;
                }
                Ok(())
            })
    }

    /// Concatenate the worker fission banks in worker order and fold the
    /// worker tally scores into the batch tally.
    fn merge_worker_banks(&mut self) -> Result<()> {
        self.fission_bank.reset();
        for w in &mut self.workers {
            self.fission_bank.extend_from(&w.fission_bank)?;
            w.fission_bank.reset();
            self.tally.accumulate(&mut w.scores);
        }
        Ok(())
    }

    fn print_status_row(&self, batch: usize, h: f64, k: f64, stats: Option<(f64, f64)>) {
        match stats {
            Some((mean, std)) if std.is_nan() => {
                println!("{:>8}  {:>10.6}  {:>10.6}  {:>10.6}", batch, h, k, mean)
            }
            Some((mean, std)) => println!(
                "{:>8}  {:>10.6}  {:>10.6}  {:>10.6} +/- {:<8.6}",
                batch, h, k, mean, std
            ),
            None => println!("{:>8}  {:>10.6}  {:>10.6}", batch, h, k),
        }
    }
}
