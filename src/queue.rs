use crate::error::{Error, Result};
use crate::particle::Particle;

/// FIFO ring buffer of particles that doubles when it fills up.
///
/// Live particles occupy slots `[head, head + n) mod capacity`. One slot is
/// always left free: `enqueue` grows as soon as `n + 1 == capacity`.
#[derive(Debug, Clone)]
pub struct ParticleQueue {
    slots: Vec<Particle>,
    head: usize,
    n: usize,
}

impl ParticleQueue {
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        Ok(Self {
            slots: allocate(capacity)?,
            head: 0,
            n: 0,
        })
    }

    /// Add a particle at the tail.
    pub fn enqueue(&mut self, particle: Particle) -> Result<()> {
        if self.n + 1 == self.slots.len() {
            self.grow()?;
        }
        let tail = (self.head + self.n) % self.slots.len();
        self.slots[tail] = particle;
        self.n += 1;
        Ok(())
    }

    /// Remove the particle at the head.
    pub fn dequeue(&mut self) -> Result<Particle> {
        if self.n == 0 {
            return Err(Error::EmptyQueue);
        }
        let particle = self.slots[self.head];
        self.n -= 1;
        self.head = (self.head + 1) % self.slots.len();
        Ok(particle)
    }

    /// Double the storage. Live particles that wrapped past the physical end are
    /// moved to sit directly after the unwrapped suffix, so the live region stays
    /// contiguous modulo the new capacity.
    fn grow(&mut self) -> Result<()> {
        let old_sz = self.slots.len();
        let new_sz = old_sz * 2;
        let mut slots = allocate(new_sz)?;

        let suffix = self.n.min(old_sz - self.head);
        let wrapped = self.n - suffix;
        slots[self.head..self.head + suffix]
            .copy_from_slice(&self.slots[self.head..self.head + suffix]);
        slots[old_sz..old_sz + wrapped].copy_from_slice(&self.slots[..wrapped]);

        self.slots = slots;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

fn allocate(sz: usize) -> Result<Vec<Particle>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(sz)
        .map_err(|_| Error::AllocationFailure {
            what: "particle queue",
            requested: sz,
        })?;
    slots.resize(sz, Particle::default());
    Ok(slots)
}
