// Per-particle transport: the interface the driver calls for every history and
// a one-group analog random walk implementing it for the box geometry.

use crate::bank::Bank;
use crate::error::Result;
use crate::fast_rng::FastRng;
use crate::geometry::{BoundaryCondition, Geometry, Surface};
use crate::material::{check_absorbing, Material};
use crate::particle::Particle;
use crate::source::sample_fission_particle;
use crate::tally::TallyScores;
use std::f64::consts::PI;

/// Everything a transport worker owns privately during a generation.
#[derive(Debug, Clone)]
pub struct WorkerState {
    pub index: usize,
    pub rng: FastRng,
    /// Fission sites produced by this worker's histories, in history order.
    pub fission_bank: Bank,
    pub scores: TallyScores,
}

impl WorkerState {
    pub fn new(index: usize, seed: u64, scores: TallyScores, bank_capacity: usize) -> Result<Self> {
        Ok(Self {
            index,
            rng: FastRng::worker_stream(seed, index),
            fission_bank: Bank::with_capacity("worker fission bank", bank_capacity)?,
            scores,
        })
    }
}

/// Transport of a single history.
///
/// Implementations may kill the particle, push fission sites into
/// `worker.fission_bank` and score into `worker.scores`. They are called
/// concurrently from several workers, each with its own `WorkerState`.
pub trait Transport: Sync {
    fn transport(
        &self,
        particle: &mut Particle,
        geometry: &Geometry,
        material: &Material,
        worker: &mut WorkerState,
    ) -> Result<()>;
}

/// Analog one-group random walk in a homogeneous box.
///
/// Each flight is the shorter of a sampled collision distance and the distance
/// to the box surface. At a collision the neutron is absorbed with probability
/// Σa/Σt, and an absorption is a fission with probability Σf/Σa releasing
/// `floor(ν + ξ)` neutrons; otherwise it scatters isotropically.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalogTransport;

impl Transport for AnalogTransport {
    fn transport(
        &self,
        particle: &mut Particle,
        geometry: &Geometry,
        material: &Material,
        worker: &mut WorkerState,
    ) -> Result<()> {
        check_absorbing(material.xs_a, geometry.boundary)?;
        let rng = &mut worker.rng;

        while particle.alive {
            let d_collision = -(1.0 - rng.random()).ln() / material.xs_t;
            let Some((d_boundary, surface)) =
                geometry.distance_to_boundary(particle.position, particle.direction)
            else {
                particle.alive = false;
                break;
            };

            if d_boundary < d_collision {
                particle.move_by(d_boundary);
                geometry.clamp(&mut particle.position);
                cross_surface(particle, geometry, surface);
                continue;
            }

            particle.move_by(d_collision);
            geometry.clamp(&mut particle.position);
            worker.scores.score(particle.position, 1.0 / material.xs_t)?;

            if rng.random() < material.xs_a / material.xs_t {
                if material.xs_a > 0.0 && rng.random() < material.xs_f / material.xs_a {
                    let n_sites = (material.nu + rng.random()).floor() as usize;
                    for _ in 0..n_sites {
                        let site = sample_fission_particle(particle.position, rng);
                        worker.fission_bank.push(site)?;
                    }
                }
                particle.alive = false;
            } else {
                let mu = 2.0 * rng.random() - 1.0;
                let phi = 2.0 * PI * rng.random();
                particle.set_angles(mu, phi);
                particle.last_energy = particle.energy;
            }
        }
        Ok(())
    }
}

/// Apply the box boundary condition to a particle sitting on `surface`.
fn cross_surface(particle: &mut Particle, geometry: &Geometry, surface: Surface) {
    let axis = surface.axis();
    let face = if surface.is_upper() {
        geometry.extent[axis]
    } else {
        0.0
    };
    match geometry.boundary {
        BoundaryCondition::Vacuum => {
            particle.position[axis] = face;
            particle.alive = false;
        }
        BoundaryCondition::Reflect => {
            particle.position[axis] = face;
            particle.direction[axis] = -particle.direction[axis];
            match axis {
                0 => particle.mu = -particle.mu,
                1 => particle.phi = (PI - particle.phi).rem_euclid(2.0 * PI),
                _ => particle.phi = (2.0 * PI - particle.phi).rem_euclid(2.0 * PI),
            }
        }
        BoundaryCondition::Periodic => {
            particle.position[axis] = geometry.extent[axis] - face;
        }
    }
}
