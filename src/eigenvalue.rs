// Population control and k-effective estimation between generations
// (OpenMC: eigenvalue.cpp, synchronize_bank / calculate_average_keff).

use crate::bank::Bank;
use crate::source::Source;
use rand::Rng;

/// Refill `source_bank` from `fission_bank`, keeping the source bank's size.
///
/// With `n_f >= n_s` fission sites, `n_s` of them are chosen uniformly without
/// replacement by reservoir sampling: the first `n_s` fill the reservoir, then
/// site `i` replaces slot `j = uniform(0..=i)` whenever `j < n_s`. Every site
/// ends up in the new source with probability `n_s / n_f`.
///
/// With fewer sites than slots, the first `n_s - n_f` slots are drawn fresh
/// from `source` and every fission site is kept in the remaining slots.
///
/// The fission bank is empty afterwards in both cases. The result depends only
/// on `rng` and on the order of `fission_bank`.
pub fn synchronize_bank<R: Rng + ?Sized>(
    source_bank: &mut Bank,
    fission_bank: &mut Bank,
    source: &Source,
    rng: &mut R,
) {
    let n_s = source_bank.len();
    let n_f = fission_bank.len();
    let sites = fission_bank.as_slice();
    let slots = source_bank.as_mut_slice();

    if n_f >= n_s {
        slots.copy_from_slice(&sites[..n_s]);
        for (i, site) in sites.iter().enumerate().skip(n_s) {
            let j = rng.gen_range(0..=i);
            if j < n_s {
                slots[j] = *site;
            }
        }
    } else {
        let n_fresh = n_s - n_f;
        for slot in &mut slots[..n_fresh] {
            *slot = source.sample(rng);
        }
        slots[n_fresh..].copy_from_slice(sites);
    }

    fission_bank.reset();
}

/// Mean and sample standard deviation of `keff`.
///
/// The standard deviation of a single value is undefined and comes back as NaN;
/// an empty slice gives NaN for both.
pub fn calculate_keff(keff: &[f64]) -> (f64, f64) {
    let n = keff.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = keff.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return (mean, f64::NAN);
    }
    let ss: f64 = keff.iter().map(|k| (k - mean).powi(2)).sum();
    (mean, (ss / (n - 1) as f64).sqrt())
}

/// Running k-effective estimator over the active batches of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct KeffEstimator {
    n_active: usize,
    batch_keff: Vec<f64>,
    generation_sum: f64,
    generations: usize,
}

impl KeffEstimator {
    pub fn new(n_active: usize) -> Self {
        Self {
            n_active,
            batch_keff: Vec::with_capacity(n_active),
            generation_sum: 0.0,
            generations: 0,
        }
    }

    /// Add one generation's estimate `n_fission / n_source`.
    pub fn add_generation(&mut self, n_fission: usize, n_source: usize) -> f64 {
        let k = if n_source == 0 {
            0.0
        } else {
            n_fission as f64 / n_source as f64
        };
        self.generation_sum += k;
        self.generations += 1;
        k
    }

    /// Close the current batch: average its generations and, if the batch is
    /// active, append the estimate to the series. Returns the batch estimate.
    pub fn finish_batch(&mut self, active: bool) -> f64 {
        let k = if self.generations == 0 {
            0.0
        } else {
            self.generation_sum / self.generations as f64
        };
        self.generation_sum = 0.0;
        self.generations = 0;
        if active {
            debug_assert!(self.batch_keff.len() < self.n_active);
            self.batch_keff.push(k);
        }
        k
    }

    /// Estimates of the active batches completed so far.
    pub fn batch_keff(&self) -> &[f64] {
        &self.batch_keff
    }

    pub fn n_active(&self) -> usize {
        self.n_active
    }

    /// Mean and sample standard deviation over the recorded active batches.
    pub fn statistics(&self) -> (f64, f64) {
        calculate_keff(&self.batch_keff)
    }

    pub fn into_batch_keff(self) -> Vec<f64> {
        self.batch_keff
    }
}
