pub mod advection;
pub mod boundary_handler;
pub mod canvas;
pub mod color_map;
pub mod colors;
pub mod concurrency;
pub mod diffusion;
pub mod error;
pub mod field;
pub mod projection;
pub mod relaxation;
pub mod sampler;
pub mod simulation;
pub mod simulation_parameters;
pub mod workspace;

#[cfg(feature = "double-precision")]
pub mod floating_type_mod {
    pub type FT = f64;
    pub use std::f64::consts::{PI, TAU};
}

#[cfg(not(feature = "double-precision"))]
pub mod floating_type_mod {
    pub type FT = f32;
    pub use std::f32::consts::{PI, TAU};
}

use floating_type_mod::FT;

use nalgebra::SVector;

pub type V<T, const D: usize> = SVector<T, D>;

pub type V2 = V<FT, 2>;
pub type V3 = V<FT, 3>;

pub fn vec2f(x: FT, y: FT) -> V2 {
    [x, y].into()
}

pub fn vec3f(x: FT, y: FT, z: FT) -> V3 {
    [x, y, z].into()
}

pub use advection::advect;
pub use boundary_handler::{enforce_boundaries, Boundary, BoundaryCondition, FreeSlip, ZeroPerimeter};
pub use canvas::Canvas;
pub use diffusion::diffuse;
pub use error::{SolverError, SolverResult};
pub use field::{Field, GridDims, CHANNELS};
pub use projection::{divergence_at, max_interior_divergence, project};
pub use relaxation::relax;
pub use sampler::sample_bilinear;
pub use simulation::*;
pub use simulation_parameters::{PressureBoundary, SimulationParams, DEFAULT_JACOBI_ITERATIONS};
pub use workspace::{FieldArena, FieldSlot, SolverWorkspace};
