/*!
Grid based "stable fluids" solver: semi-Lagrangian advection, implicit
diffusion and pressure projection on a fixed 2D grid.

The numerical core lives in [`simulation`]; the desktop driver (CLI, PNG
frame export) in `platform`.
*/

mod platform;
pub mod simulation;

pub use simulation::*;

pub use platform::start;
