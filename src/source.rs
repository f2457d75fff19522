use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::particle::Particle;
use serde::{Deserialize, Serialize};

/// Spatial distribution of the external source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceDistribution {
    /// Uniform over the whole box.
    #[default]
    Flat,
    /// Every particle starts at the same point.
    Point { position: [f64; 3] },
}

/// Isotropic source over the box, used to seed the first generation and to top
/// up the source bank when a generation produces too few fission sites.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub distribution: SourceDistribution,
    pub geometry: Geometry,
}

impl Source {
    pub fn new(distribution: SourceDistribution, geometry: Geometry) -> Result<Self> {
        if let SourceDistribution::Point { position } = distribution {
            if !geometry.contains(position) {
                return Err(Error::InvalidParam(format!(
                    "point source at {:?} lies outside the geometry {:?}",
                    position, geometry.extent
                )));
            }
        }
        Ok(Self {
            distribution,
            geometry,
        })
    }

    pub fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Particle {
        match self.distribution {
            SourceDistribution::Flat => sample_source_particle(&self.geometry, rng),
            SourceDistribution::Point { position } => Particle::isotropic(position, rng),
        }
    }
}

/// Particle uniformly distributed over the volume of `geometry`, isotropic direction.
pub fn sample_source_particle<R: rand::Rng + ?Sized>(geometry: &Geometry, rng: &mut R) -> Particle {
    let mu = rng.gen::<f64>() * 2.0 - 1.0;
    let phi = rng.gen::<f64>() * 2.0 * std::f64::consts::PI;
    let position = [
        rng.gen::<f64>() * geometry.extent[0],
        rng.gen::<f64>() * geometry.extent[1],
        rng.gen::<f64>() * geometry.extent[2],
    ];
    Particle::new(position, mu, phi)
}

/// Fission neutron born at the parent's position with an isotropic direction.
pub fn sample_fission_particle<R: rand::Rng + ?Sized>(parent_position: [f64; 3], rng: &mut R) -> Particle {
    Particle::isotropic(parent_position, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fast_rng::FastRng;
    use crate::geometry::BoundaryCondition;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cube(side: f64) -> Geometry {
        Geometry::new([side; 3], BoundaryCondition::Reflect).unwrap()
    }

    #[test]
    fn test_flat_source_stays_inside_box() {
        let g = Geometry::new([1.0, 2.0, 3.0], BoundaryCondition::Vacuum).unwrap();
        let mut rng = FastRng::new(11);
        for _ in 0..5000 {
            let p = sample_source_particle(&g, &mut rng);
            assert!(g.contains(p.position));
            assert!(p.alive);
            assert_eq!(p.energy, 1.0);
            assert_eq!(p.last_energy, 0.0);
        }
    }

    #[test]
    fn test_flat_source_fills_the_volume() {
        let g = cube(1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let n = 20000;
        let mut lower_half = 0;
        for _ in 0..n {
            if sample_source_particle(&g, &mut rng).position[2] < 0.5 {
                lower_half += 1;
            }
        }
        let frac = lower_half as f64 / n as f64;
        assert!((frac - 0.5).abs() < 0.02, "lower-half fraction {}", frac);
    }

    #[test]
    fn test_point_source() {
        let g = cube(10.0);
        let src = Source::new(
            SourceDistribution::Point {
                position: [1.0, 2.0, 3.0],
            },
            g,
        )
        .unwrap();
        let mut rng = FastRng::new(5);
        let p = src.sample(&mut rng);
        assert_eq!(p.position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_point_source_outside_geometry_rejected() {
        let res = Source::new(
            SourceDistribution::Point {
                position: [20.0, 0.0, 0.0],
            },
            cube(10.0),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_fission_particle_inherits_position() {
        let mut rng = FastRng::new(8);
        let p = sample_fission_particle([4.0, 5.0, 6.0], &mut rng);
        assert_eq!(p.position, [4.0, 5.0, 6.0]);
        let mag: f64 = p.direction.iter().map(|c| c * c).sum::<f64>().sqrt();
        assert!((mag - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_source_distribution_serde() {
        let flat: SourceDistribution = serde_json::from_str(r#"{"type":"flat"}"#).unwrap();
        assert_eq!(flat, SourceDistribution::Flat);
        let point: SourceDistribution =
            serde_json::from_str(r#"{"type":"point","position":[1.0,1.0,1.0]}"#).unwrap();
        assert_eq!(
            point,
            SourceDistribution::Point {
                position: [1.0, 1.0, 1.0]
            }
        );
    }
}
