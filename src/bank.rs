// Particle banks for eigenvalue calculations, after OpenMC's bank.cpp.
//
// - source bank: the population transported in the current generation
// - fission bank: sites produced during the generation, one per worker while
//   transport runs, concatenated by the driver before resampling

use crate::error::{Error, Result};
use crate::particle::Particle;

/// Append-only particle store with explicit doubling growth.
///
/// `len() <= capacity()` always holds. `reset` drops the live count to zero but
/// keeps the storage, so a bank reused across generations stops allocating once
/// it has reached its working size.
#[derive(Debug, Clone, Default)]
pub struct Bank {
    particles: Vec<Particle>,
    name: &'static str,
}

impl Bank {
    /// Create an empty bank able to hold `capacity` particles before growing.
    pub fn with_capacity(name: &'static str, capacity: usize) -> Result<Self> {
        let mut particles = Vec::new();
        particles
            .try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailure {
                what: name,
                requested: capacity,
            })?;
        Ok(Self { particles, name })
    }

    /// Append a particle, doubling the capacity when the bank is full.
    pub fn push(&mut self, particle: Particle) -> Result<()> {
        if self.particles.len() == self.particles.capacity() {
            self.grow(self.particles.capacity().max(1))?;
        }
        self.particles.push(particle);
        Ok(())
    }

    /// Append every particle of `other`, in order.
    pub fn extend_from(&mut self, other: &Bank) -> Result<()> {
        let needed = self.particles.len() + other.len();
        if needed > self.particles.capacity() {
            let mut target = self.particles.capacity().max(1);
            while target < needed {
                target *= 2;
            }
            self.grow(target - self.particles.capacity())?;
        }
        self.particles.extend_from_slice(other.as_slice());
        Ok(())
    }

    fn grow(&mut self, additional: usize) -> Result<()> {
        let requested = self.particles.capacity() + additional;
        self.particles
            .try_reserve_exact(requested - self.particles.len())
            .map_err(|_| Error::AllocationFailure {
                what: self.name,
                requested,
            })
    }

    /// Forget all particles without releasing storage.
    pub fn reset(&mut self) {
        self.particles.clear();
    }

    /// Resize the live region to exactly `n` particles, filling new slots with
    /// default particles. Used to give a source bank its fixed target size.
    pub fn resize(&mut self, n: usize) -> Result<()> {
        if n > self.particles.capacity() {
            self.grow(n - self.particles.capacity())?;
        }
        self.particles.resize(n, Particle::default());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.particles.capacity()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }
}

impl<'a> IntoIterator for &'a Bank {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle_at(x: f64) -> Particle {
        Particle::new([x, 0.0, 0.0], 1.0, 0.0)
    }

    #[test]
    fn test_bank_basic() {
        let mut bank = Bank::with_capacity("source bank", 4).unwrap();
        assert!(bank.is_empty());
        assert!(bank.capacity() >= 4);

        bank.push(particle_at(1.0)).unwrap();
        bank.push(particle_at(2.0)).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.as_slice()[1].position[0], 2.0);
    }

    #[test]
    fn test_bank_grows_past_initial_capacity() {
        let mut bank = Bank::with_capacity("fission bank", 2).unwrap();
        for i in 0..9 {
            bank.push(particle_at(i as f64)).unwrap();
        }
        assert_eq!(bank.len(), 9);
        assert!(bank.capacity() >= 9);
        for (i, p) in bank.iter().enumerate() {
            assert_eq!(p.position[0], i as f64);
        }
    }

    #[test]
    fn test_zero_capacity_bank_still_grows() {
        let mut bank = Bank::with_capacity("fission bank", 0).unwrap();
        bank.push(particle_at(0.5)).unwrap();
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn test_reset_keeps_storage() {
        let mut bank = Bank::with_capacity("fission bank", 8).unwrap();
        for i in 0..8 {
            bank.push(particle_at(i as f64)).unwrap();
        }
        let cap = bank.capacity();
        bank.reset();
        assert!(bank.is_empty());
        assert_eq!(bank.capacity(), cap);
    }

    #[test]
    fn test_extend_from_concatenates_in_order() {
        let mut a = Bank::with_capacity("worker 0", 1).unwrap();
        let mut b = Bank::with_capacity("worker 1", 1).unwrap();
        a.push(particle_at(0.0)).unwrap();
        b.push(particle_at(1.0)).unwrap();
        b.push(particle_at(2.0)).unwrap();

        let mut merged = Bank::with_capacity("fission bank", 0).unwrap();
        merged.extend_from(&a).unwrap();
        merged.extend_from(&b).unwrap();
        let xs: Vec<f64> = merged.iter().map(|p| p.position[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_resize_sets_target_size() {
        let mut bank = Bank::with_capacity("source bank", 0).unwrap();
        bank.resize(100).unwrap();
        assert_eq!(bank.len(), 100);
        assert!(bank.iter().all(|p| p.alive));
    }
}
