use crate::error::{Error, Result};
use crate::fast_rng::FastRng;
use crate::geometry::BoundaryCondition;

/// Microscopic cross sections (barns) and atom density of one synthetic nuclide.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Nuclide {
    pub xs_f: f64,
    pub xs_a: f64,
    pub xs_s: f64,
    pub xs_t: f64,
    pub atom_density: f64,
}

/// Uniform one-group material filling the whole box.
///
/// The macroscopic cross sections are fixed by the run configuration. The
/// nuclide table is generated so that `Σ_k N_k·σ_k` reproduces each of them;
/// it exists to give transport a realistic per-nuclide lookup to perform.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub xs_f: f64,
    pub xs_a: f64,
    pub xs_s: f64,
    pub xs_t: f64,
    /// Average number of neutrons released per fission.
    pub nu: f64,
    pub nuclides: Vec<Nuclide>,
}

impl Material {
    /// Build a material from its macroscopic cross sections, generating
    /// `n_nuclides` nuclides whose weighted sum matches them.
    pub fn new(
        xs_f: f64,
        xs_a: f64,
        xs_s: f64,
        nu: f64,
        n_nuclides: usize,
        rng: &mut FastRng,
    ) -> Result<Self> {
        for (name, value) in [("xs_f", xs_f), ("xs_a", xs_a), ("xs_s", xs_s)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidParam(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }
        if xs_a + xs_s <= 0.0 {
            return Err(Error::InvalidParam(
                "total cross section must be > 0".to_string(),
            ));
        }
        if xs_f > xs_a {
            return Err(Error::InvalidParam(format!(
                "fission cross section {} cannot exceed absorption cross section {}",
                xs_f, xs_a
            )));
        }
        if !nu.is_finite() || nu < 0.0 {
            return Err(Error::InvalidParam(format!("nu must be finite and >= 0, got {}", nu)));
        }
        if n_nuclides == 0 {
            return Err(Error::InvalidParam("material needs at least one nuclide".to_string()));
        }

        let nuclides = generate_nuclides(xs_f, xs_a, xs_s, n_nuclides, rng);

        Ok(Self {
            xs_f,
            xs_a,
            xs_s,
            xs_t: xs_a + xs_s,
            nu,
            nuclides,
        })
    }

    /// Macroscopic cross sections rebuilt from the nuclide table, as
    /// `(fission, absorption, scatter, total)`.
    pub fn macro_xs(&self) -> (f64, f64, f64, f64) {
        self.nuclides.iter().fold((0.0, 0.0, 0.0, 0.0), |acc, n| {
            (
                acc.0 + n.atom_density * n.xs_f,
                acc.1 + n.atom_density * n.xs_a,
                acc.2 + n.atom_density * n.xs_s,
                acc.3 + n.atom_density * n.xs_t,
            )
        })
    }

    /// Infinite-medium multiplication factor `ν·Σf/Σa`.
    pub fn k_infinity(&self) -> f64 {
        if self.xs_a > 0.0 {
            self.nu * self.xs_f / self.xs_a
        } else {
            0.0
        }
    }
}

/// Reject a non-absorbing material inside a box that never lets particles out:
/// with `xs_a == 0` and reflective or periodic faces a history never ends.
pub fn check_absorbing(xs_a: f64, boundary: BoundaryCondition) -> Result<()> {
    if xs_a <= 0.0 && boundary != BoundaryCondition::Vacuum {
        return Err(Error::InvalidParam(format!(
            "xs_a must be > 0 with {:?} boundaries, otherwise no history terminates",
            boundary
        )));
    }
    Ok(())
}

fn generate_nuclides(
    xs_f: f64,
    xs_a: f64,
    xs_s: f64,
    n_nuclides: usize,
    rng: &mut FastRng,
) -> Vec<Nuclide> {
    let mut remaining_density = 1.0;
    let mut sum = Nuclide::default();
    let mut nuclides = Vec::with_capacity(n_nuclides);

    for i in 0..n_nuclides {
        let atom_density = if i + 1 < n_nuclides {
            let d = rng.random() * remaining_density;
            remaining_density -= d;
            d
        } else {
            remaining_density
        };
        let nuclide = Nuclide {
            xs_a: rng.random(),
            xs_f: rng.random(),
            xs_s: rng.random(),
            xs_t: 0.0,
            atom_density,
        };
        sum.xs_a += nuclide.xs_a * atom_density;
        sum.xs_f += nuclide.xs_f * atom_density;
        sum.xs_s += nuclide.xs_s * atom_density;
        nuclides.push(nuclide);
    }

    // Rescale each reaction so the density-weighted sum hits the macroscopic value.
    for nuclide in &mut nuclides {
        nuclide.xs_a *= scale(xs_a, sum.xs_a);
        nuclide.xs_f *= scale(xs_f, sum.xs_f);
        nuclide.xs_s *= scale(xs_s, sum.xs_s);
        nuclide.xs_t = nuclide.xs_a + nuclide.xs_s;
    }

    nuclides
}

fn scale(target: f64, sum: f64) -> f64 {
    if sum > 0.0 {
        target / sum
    } else {
        0.0
    }
}
