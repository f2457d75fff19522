use crate::error::Result;
use crate::entropy::EntropyMesh;
use crate::geometry::Geometry;
use std::fmt;

/// Collision-estimator scalar flux on a regular mesh over the box.
///
/// Transport never touches this directly: each worker scores into its own
/// [`TallyScores`], and the driver folds those into the batch accumulator at
/// the end of every generation.
#[derive(Debug, Clone)]
pub struct Tally {
    pub tallies_on: bool,
    mesh: EntropyMesh,
    /// Flux accumulated during the current batch.
    pub flux: Vec<f64>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    pub n_batches: usize,
}

impl Tally {
    pub fn new(geometry: &Geometry, n_bins: usize) -> Result<Self> {
        let mesh = EntropyMesh::new(geometry, n_bins)?;
        Ok(Self {
            tallies_on: false,
            flux: mesh.zeroed_cells("tally flux")?,
            sum: mesh.zeroed_cells("tally sum")?,
            sum_sq: mesh.zeroed_cells("tally sum of squares")?,
            mesh,
            n_batches: 0,
        })
    }

    pub fn n_cells(&self) -> usize {
        self.mesh.n_cells()
    }

    /// Empty per-worker accumulator matching this tally's mesh and on/off state.
    pub fn worker_scores(&self) -> Result<TallyScores> {
        let flux = if self.tallies_on {
            self.mesh.zeroed_cells("worker tally scores")?
        } else {
            Vec::new()
        };
        Ok(TallyScores {
            enabled: self.tallies_on,
            mesh: self.mesh.clone(),
            flux,
        })
    }

    /// Add a worker's scores to the batch accumulator and clear them.
    pub fn accumulate(&mut self, scores: &mut TallyScores) {
        if !scores.enabled {
            return;
        }
        for (total, s) in self.flux.iter_mut().zip(scores.flux.iter_mut()) {
            *total += *s;
            *s = 0.0;
        }
    }

    /// Close the batch: normalize its flux per source particle, add it to the
    /// running sums and clear the batch accumulator. Returns the normalized
    /// batch flux.
    pub fn batch_tally(&mut self, particles_per_batch: usize) -> Vec<f64> {
        let norm = if particles_per_batch > 0 {
            1.0 / particles_per_batch as f64
        } else {
            0.0
        };
        let batch: Vec<f64> = self.flux.iter().map(|f| f * norm).collect();
        for ((s, s2), b) in self.sum.iter_mut().zip(self.sum_sq.iter_mut()).zip(&batch) {
            *s += b;
            *s2 += b * b;
        }
        self.flux.iter_mut().for_each(|f| *f = 0.0);
        self.n_batches += 1;
        batch
    }

    /// Mean flux per cell over the tallied batches.
    pub fn mean(&self) -> Vec<f64> {
        let n = self.n_batches as f64;
        self.sum
            .iter()
            .map(|s| if self.n_batches > 0 { s / n } else { 0.0 })
            .collect()
    }

    /// Sample standard deviation per cell; NaN until two batches are tallied.
    pub fn std_dev(&self) -> Vec<f64> {
        let n = self.n_batches as f64;
        self.sum
            .iter()
            .zip(&self.sum_sq)
            .map(|(s, s2)| {
                if self.n_batches < 2 {
                    f64::NAN
                } else {
                    let mean = s / n;
                    ((s2 / n - mean * mean).max(0.0) * n / (n - 1.0)).sqrt()
                }
            })
            .collect()
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mean = self.mean();
        let total: f64 = mean.iter().sum();
        writeln!(f, "Mesh flux tally: {} cells", self.n_cells())?;
        writeln!(f, "    Batches: {}", self.n_batches)?;
        write!(f, "    Total mean flux: {:.6e}", total)
    }
}

/// Worker-private flux accumulator.
#[derive(Debug, Clone)]
pub struct TallyScores {
    enabled: bool,
    mesh: EntropyMesh,
    flux: Vec<f64>,
}

impl TallyScores {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Score `value` in the cell holding `position`. No-op while tallies are off.
    pub fn score(&mut self, position: [f64; 3], value: f64) -> Result<()> {
        if self.enabled {
            let cell = self.mesh.cell_index(position)?;
            self.flux[cell] += value;
        }
        Ok(())
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::geometry::BoundaryCondition;

    fn tally() -> Tally {
        let g = Geometry::new([2.0; 3], BoundaryCondition::Reflect).unwrap();
        Tally::new(&g, 2).unwrap()
    }

    #[test]
    fn test_disabled_scores_are_dropped() {
        let t = tally();
        let mut scores = t.worker_scores().unwrap();
        assert!(!scores.is_enabled());
        scores.score([0.5, 0.5, 0.5], 1.0).unwrap();
        assert!(scores.flux().is_empty());
    }

    #[test]
    fn test_accumulate_and_batch_statistics() {
        let mut t = tally();
        t.tallies_on = true;

        for value in [2.0, 4.0] {
            let mut a = t.worker_scores().unwrap();
            let mut b = t.worker_scores().unwrap();
            a.score([0.5, 0.5, 0.5], value).unwrap();
            b.score([0.5, 0.5, 0.5], value).unwrap();
            t.accumulate(&mut a);
            t.accumulate(&mut b);
            assert!(a.flux().iter().all(|&f| f == 0.0));
            let batch = t.batch_tally(2);
            assert_eq!(batch[0], value);
        }

        assert_eq!(t.n_batches, 2);
        let mean = t.mean();
        let std = t.std_dev();
        assert!((mean[0] - 3.0).abs() < 1e-12);
        assert!((std[0] - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(mean[7], 0.0);
        assert!(t.flux.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_std_dev_undefined_for_one_batch() {
        let mut t = tally();
        t.tallies_on = true;
        t.batch_tally(10);
        assert!(t.std_dev().iter().all(|s| s.is_nan()));
    }

    #[test]
    fn test_oversized_mesh_is_an_error_not_a_panic() {
        let g = Geometry::new([2.0; 3], BoundaryCondition::Reflect).unwrap();
        assert!(matches!(Tally::new(&g, 3_000_000), Err(Error::InvalidParam(_))));
        assert!(matches!(
            Tally::new(&g, 2_000_000),
            Err(Error::AllocationFailure { what: "tally flux", .. })
        ));
    }

    #[test]
    fn test_score_outside_mesh_is_error() {
        let mut t = tally();
        t.tallies_on = true;
        let mut s = t.worker_scores().unwrap();
        assert!(s.score([5.0, 0.0, 0.0], 1.0).is_err());
    }
}
