// Shannon entropy of the fission source, the usual source-convergence
// diagnostic of eigenvalue Monte Carlo (OpenMC: eigenvalue.cpp, shannon_entropy).

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::particle::Particle;

/// Regular `n × n × n` mesh over the box used to bin source sites.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyMesh {
    n: usize,
    n_cells: usize,
    width: [f64; 3],
    extent: [f64; 3],
}

impl EntropyMesh {
    pub fn new(geometry: &Geometry, n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::InvalidParam(
                "entropy mesh needs at least one bin per axis".to_string(),
            ));
        }
        let n_cells = n_bins
            .checked_mul(n_bins)
            .and_then(|sq| sq.checked_mul(n_bins))
            .ok_or_else(|| {
                Error::InvalidParam(format!("{} bins per axis overflows the mesh cell count", n_bins))
            })?;
        let n = n_bins as f64;
        Ok(Self {
            n: n_bins,
            n_cells,
            width: [
                geometry.extent[0] / n,
                geometry.extent[1] / n,
                geometry.extent[2] / n,
            ],
            extent: geometry.extent,
        })
    }

    pub fn bins_per_axis(&self) -> usize {
        self.n
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// One zeroed slot per cell, for the buffer named `what`.
    pub fn zeroed_cells<T: Copy + Default>(&self, what: &'static str) -> Result<Vec<T>> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(self.n_cells)
            .map_err(|_| Error::AllocationFailure {
                what,
                requested: self.n_cells,
            })?;
        cells.resize(self.n_cells, T::default());
        Ok(cells)
    }

    /// Flattened cell index `ix·n² + iy·n + iz` of `position`.
    ///
    /// Points on an upper face belong to the last cell on that axis. Anything
    /// outside the box is an error.
    pub fn cell_index(&self, position: [f64; 3]) -> Result<usize> {
        let mut idx = [0usize; 3];
        for axis in 0..3 {
            let x = position[axis];
            if !(0.0..=self.extent[axis]).contains(&x) {
                return Err(Error::OutOfBounds(format!(
                    "position {:?} outside mesh extent {:?}",
                    position, self.extent
                )));
            }
            idx[axis] = ((x / self.width[axis]).floor() as usize).min(self.n - 1);
        }
        let flat = idx[0] * self.n * self.n + idx[1] * self.n + idx[2];
        debug_assert!(flat < self.n_cells());
        Ok(flat)
    }

    /// Occupancy count of every cell.
    pub fn counts<'a, I>(&self, particles: I) -> Result<Vec<u64>>
    where
        I: IntoIterator<Item = &'a Particle>,
    {
        let mut count: Vec<u64> = self.zeroed_cells("entropy counts")?;
        for p in particles {
            count[self.cell_index(p.position)?] += 1;
        }
        Ok(count)
    }

    /// `H = -Σ p_i·log2(p_i)` over occupied cells, `p_i = c_i / N`.
    ///
    /// An empty population has zero entropy.
    pub fn entropy(&self, particles: &[Particle]) -> Result<f64> {
        if particles.is_empty() {
            return Ok(0.0);
        }
        let total = particles.len() as f64;
        let h = self
            .counts(particles)?
            .into_iter()
            .filter(|&c| c > 0)
            .map(|c| {
                let p = c as f64 / total;
                -p * p.log2()
            })
            .sum();
        Ok(h)
    }
}

/// Entropy of a particle population over an `n_bins³` mesh of `geometry`.
pub fn shannon_entropy(geometry: &Geometry, particles: &[Particle], n_bins: usize) -> Result<f64> {
    EntropyMesh::new(geometry, n_bins)?.entropy(particles)
}
