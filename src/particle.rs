use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A neutron history's state.
///
/// Direction cosines are kept consistent with the polar cosine `mu` and the
/// azimuth `phi` they were sampled from: `u = mu`, `v = sqrt(1-mu²)·cos(phi)`,
/// `w = sqrt(1-mu²)·sin(phi)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub mu: f64,
    pub phi: f64,
    pub energy: f64,
    pub last_energy: f64,
    pub alive: bool,
}

impl Particle {
    /// A live particle with unit energy travelling along (`mu`, `phi`).
    pub fn new(position: [f64; 3], mu: f64, phi: f64) -> Self {
        let mut p = Self {
            position,
            direction: [0.0; 3],
            mu,
            phi,
            energy: 1.0,
            last_energy: 0.0,
            alive: true,
        };
        p.set_angles(mu, phi);
        p
    }

    /// Isotropic direction drawn with two uniform samples.
    pub fn isotropic<R: rand::Rng + ?Sized>(position: [f64; 3], rng: &mut R) -> Self {
        let mu = rng.gen::<f64>() * 2.0 - 1.0;
        let phi = rng.gen::<f64>() * 2.0 * PI;
        Self::new(position, mu, phi)
    }

    /// Reset the direction from a polar cosine and azimuth.
    pub fn set_angles(&mut self, mu: f64, phi: f64) {
        let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
        self.mu = mu;
        self.phi = phi;
        self.direction = [mu, sin_theta * phi.cos(), sin_theta * phi.sin()];
    }

    pub fn move_by(&mut self, distance: f64) {
        for (x, u) in self.position.iter_mut().zip(self.direction) {
            *x += distance * u;
        }
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new([0.0; 3], 1.0, 0.0)
    }
}
