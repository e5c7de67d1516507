use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// A basic four-vector
///
/// The zero component is the energy/time component. The remainder are
/// the spatial components
#[derive(
    Deserialize, Serialize, PartialEq, PartialOrd, Debug, Clone, Copy, Default,
)]
pub struct FourVector {
    p: [f64; 4],
}

impl FourVector {
    /// Construct a new four-vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from transverse momentum, pseudorapidity, azimuthal
    /// angle, and mass
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let e = (px * px + py * py + pz * pz + m * m).sqrt();
        [e, px, py, pz].into()
    }

    /// The square \sum v_i^2 with i = 1,2,3 of the spatial norm
    pub fn spatial_norm_sq(&self) -> f64 {
        self.p.iter().skip(1).map(|e| *e * *e).sum()
    }

    /// The scalar transverse momentum
    pub fn pt(&self) -> f64 {
        (self.p[1] * self.p[1] + self.p[2] * self.p[2]).sqrt()
    }

    const fn len() -> usize {
        4
    }

    /// The invariant mass \sqrt{v_0^2 - \sum v_i^2} with i = 1,2,3
    ///
    /// Negative mass squares from rounding are clamped to zero
    pub fn m(&self) -> f64 {
        self.m_sq().max(0.).sqrt()
    }

    /// The invariant mass square v_0^2 - \sum v_i^2 with i = 1,2,3
    pub fn m_sq(&self) -> f64 {
        self.p[0] * self.p[0] - self.spatial_norm_sq()
    }
}

impl std::convert::From<[f64; 4]> for FourVector {
    fn from(p: [f64; 4]) -> FourVector {
        FourVector { p }
    }
}

impl std::ops::Index<usize> for FourVector {
    type Output = f64;

    fn index(&self, i: usize) -> &Self::Output {
        &self.p[i]
    }
}

impl std::ops::AddAssign for FourVector {
    fn add_assign(&mut self, rhs: FourVector) {
        for i in 0..Self::len() {
            self.p[i] += rhs[i]
        }
    }
}

impl std::ops::Add for FourVector {
    type Output = Self;

    fn add(mut self, rhs: FourVector) -> Self::Output {
        self += rhs;
        self
    }
}

/// Azimuthal angle difference wrapped into [-π, π]
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut dphi = (phi1 - phi2) % (2. * PI);
    if dphi > PI {
        dphi -= 2. * PI;
    } else if dphi < -PI {
        dphi += 2. * PI;
    }
    dphi
}

/// Angular separation \sqrt{Δη^2 + Δφ^2}
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let deta = eta1 - eta2;
    let dphi = delta_phi(phi1, phi2);
    (deta * deta + dphi * dphi).sqrt()
}
