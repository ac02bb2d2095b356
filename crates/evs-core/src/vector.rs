//! Minimal Lorentz four-vector used to carry service outputs.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Pseudorapidity reported for vectors parallel to the beam axis.
pub const ETA_SATURATION: f64 = 1.0e10;

/// Four-momentum `(px, py, pz, E)` in GeV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FourVector {
    /// Momentum component along x.
    pub px: f64,
    /// Momentum component along y.
    pub py: f64,
    /// Momentum component along the beam axis.
    pub pz: f64,
    /// Energy component.
    pub e: f64,
}

impl FourVector {
    /// Creates a vector from its Cartesian components.
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Magnitude of the three-momentum.
    pub fn p(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Pseudorapidity.
    ///
    /// A vector along the beam axis saturates at `±ETA_SATURATION`; the zero
    /// vector yields 0.
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            if self.pz == 0.0 {
                return 0.0;
            }
            return ETA_SATURATION.copysign(self.pz);
        }
        (self.pz / pt).asinh()
    }

    /// Invariant mass squared, `E² − p²`.
    pub fn m2(&self) -> f64 {
        self.e * self.e - (self.px * self.px + self.py * self.py + self.pz * self.pz)
    }
}

impl Sub for FourVector {
    type Output = FourVector;

    fn sub(self, rhs: FourVector) -> FourVector {
        FourVector::new(
            self.px - rhs.px,
            self.py - rhs.py,
            self.pz - rhs.pz,
            self.e - rhs.e,
        )
    }
}

impl Add for FourVector {
    type Output = FourVector;

    fn add(self, rhs: FourVector) -> FourVector {
        FourVector::new(
            self.px + rhs.px,
            self.py + rhs.py,
            self.pz + rhs.pz,
            self.e + rhs.e,
        )
    }
}
