use crate::{floating_type_mod::FT, Boundary, FreeSlip, ZeroPerimeter};
use serde::{Deserialize, Serialize};

/// Jacobi sweeps per relaxation solve (diffusion and pressure) unless
/// configured otherwise. Fewer sweeps are cheaper but leave more divergence
/// behind.
pub const DEFAULT_JACOBI_ITERATIONS: usize = 40;

/// Boundary condition used for the scalar fields of the pressure solve.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum PressureBoundary {
    /// homogeneous Dirichlet (p = 0 on the perimeter)
    ZeroPerimeter,

    /// velocity style normal-component clearing
    FreeSlip,
}

impl Default for PressureBoundary {
    fn default() -> Self {
        PressureBoundary::ZeroPerimeter
    }
}

impl From<PressureBoundary> for Boundary {
    fn from(pressure_boundary: PressureBoundary) -> Self {
        match pressure_boundary {
            PressureBoundary::ZeroPerimeter => ZeroPerimeter.into(),
            PressureBoundary::FreeSlip => FreeSlip.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    // time step in "cells per velocity unit"
    pub dt: FT,
    pub viscosity: FT,

    #[serde(default = "default_jacobi_iterations")]
    pub jacobi_iterations: usize,

    // the density tracer is only diffused when this is positive
    #[serde(default)]
    pub density_diffusion: FT,
    // density is multiplied by this factor once per step
    #[serde(default = "default_density_decay")]
    pub density_decay: FT,

    #[serde(default)]
    pub pressure_boundary: PressureBoundary,
}

fn default_jacobi_iterations() -> usize {
    DEFAULT_JACOBI_ITERATIONS
}

fn default_density_decay() -> FT {
    1.
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            dt: 0.1,
            viscosity: 0.5,
            jacobi_iterations: DEFAULT_JACOBI_ITERATIONS,
            density_diffusion: 0.,
            density_decay: 0.995,
            pressure_boundary: PressureBoundary::default(),
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.dt.is_finite() && self.dt > 0.) {
            return Err(format!("dt must be a positive number, got {}", self.dt));
        }
        if !(self.viscosity.is_finite() && self.viscosity >= 0.) {
            return Err(format!("viscosity must be non-negative, got {}", self.viscosity));
        }
        if !(self.density_diffusion.is_finite() && self.density_diffusion >= 0.) {
            return Err(format!(
                "density_diffusion must be non-negative, got {}",
                self.density_diffusion
            ));
        }
        if !(self.density_decay.is_finite() && (0. ..=1.).contains(&self.density_decay)) {
            return Err(format!("density_decay must be in [0, 1], got {}", self.density_decay));
        }
        Ok(())
    }
}
