use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Behaviour of particles reaching the outer surface of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    Vacuum,
    #[default]
    Reflect,
    Periodic,
}

/// Faces of the box, lower then upper on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    X0,
    X1,
    Y0,
    Y1,
    Z0,
    Z1,
}

impl Surface {
    /// Axis index (0 = x, 1 = y, 2 = z) the face is normal to.
    pub fn axis(self) -> usize {
        match self {
            Surface::X0 | Surface::X1 => 0,
            Surface::Y0 | Surface::Y1 => 1,
            Surface::Z0 | Surface::Z1 => 2,
        }
    }

    pub fn is_upper(self) -> bool {
        matches!(self, Surface::X1 | Surface::Y1 | Surface::Z1)
    }

    fn from_axis(axis: usize, upper: bool) -> Self {
        match (axis, upper) {
            (0, false) => Surface::X0,
            (0, true) => Surface::X1,
            (1, false) => Surface::Y0,
            (1, true) => Surface::Y1,
            (2, false) => Surface::Z0,
            _ => Surface::Z1,
        }
    }
}

/// Rectangular box `[0, x] × [0, y] × [0, z]` filled with a single material.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub extent: [f64; 3],
    pub boundary: BoundaryCondition,
}

impl Geometry {
    pub fn new(extent: [f64; 3], boundary: BoundaryCondition) -> Result<Self> {
        if !extent.iter().all(|&l| l.is_finite() && l > 0.0) {
            return Err(Error::InvalidParam(format!(
                "geometry extents must be finite and > 0, got {:?}",
                extent
            )));
        }
        Ok(Self { extent, boundary })
    }

    pub fn volume(&self) -> f64 {
        self.extent.iter().product()
    }

    pub fn center(&self) -> [f64; 3] {
        [
            0.5 * self.extent[0],
            0.5 * self.extent[1],
            0.5 * self.extent[2],
        ]
    }

    /// True if `position` lies inside the box or on its surface.
    pub fn contains(&self, position: [f64; 3]) -> bool {
        position
            .iter()
            .zip(self.extent)
            .all(|(&x, l)| (0.0..=l).contains(&x))
    }

    /// Pull a position that drifted past a face through round-off back onto it.
    pub fn clamp(&self, position: &mut [f64; 3]) {
        for (x, l) in position.iter_mut().zip(self.extent) {
            *x = x.clamp(0.0, l);
        }
    }

    /// Distance along `direction` to the first face hit from `position`, and that face.
    ///
    /// Returns `None` only for a zero direction vector.
    pub fn distance_to_boundary(
        &self,
        position: [f64; 3],
        direction: [f64; 3],
    ) -> Option<(f64, Surface)> {
        let mut nearest: Option<(f64, Surface)> = None;
        for axis in 0..3 {
            let u = direction[axis];
            let (d, upper) = if u > 0.0 {
                ((self.extent[axis] - position[axis]) / u, true)
            } else if u < 0.0 {
                (-position[axis] / u, false)
            } else {
                continue;
            };
            let d = d.max(0.0);
            if nearest.map_or(true, |(best, _)| d < best) {
                nearest = Some((d, Surface::from_axis(axis, upper)));
            }
        }
        nearest
    }
}
