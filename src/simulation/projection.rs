use crate::{
    boundary_handler::{enforce_boundaries, Boundary, BoundaryCondition},
    error::SolverResult,
    field::GridDims,
    floating_type_mod::FT,
    relaxation::relax,
    workspace::SolverWorkspace,
};

/// Central-difference divergence source term at an interior cell, scaled the
/// way the pressure solve expects it: `-0.5 * (du/dx + dv/dy)` over a two
/// cell wide stencil.
#[inline]
pub fn divergence_at(field: &[FT], dims: GridDims, x: usize, y: usize) -> FT {
    let i = dims.index(x, y);
    let stride = dims.row_stride();
    let du_dx = field[i + 2] - field[i - 2];
    let dv_dy = field[i + stride + 1] - field[i - stride + 1];
    -0.5 * (du_dx + dv_dy)
}

/// Largest absolute [`divergence_at`] over the interior cells.
pub fn max_interior_divergence(field: &[FT], dims: GridDims) -> FT {
    let mut max_abs: FT = 0.;
    for y in 1..dims.height() - 1 {
        for x in 1..dims.width() - 1 {
            max_abs = max_abs.max(divergence_at(field, dims, x, y).abs());
        }
    }
    max_abs
}

/// Removes the divergent part of the velocity field `src` and writes the
/// result to `dest` (Helmholtz/Hodge projection).
///
/// Divergence and pressure live in `workspace` and are overwritten by every
/// call; they stay readable afterwards for visualization. `pressure_boundary`
/// is applied to both scalar fields, the free-slip condition to `dest`.
pub fn project(
    dims: GridDims,
    dest: &mut [FT],
    src: &[FT],
    iterations: usize,
    pressure_boundary: Boundary,
    workspace: &mut SolverWorkspace,
) -> SolverResult<()> {
    dims.check_buffer("dest", dest.len())?;
    dims.check_buffer("src", src.len())?;
    workspace.check(dims)?;

    let SolverWorkspace {
        divergence,
        pressure,
        scratch,
        ..
    } = workspace;

    divergence.fill(0.);
    for y in 1..dims.height() - 1 {
        for x in 1..dims.width() - 1 {
            divergence[dims.index(x, y)] = divergence_at(src, dims, x, y);
        }
    }
    pressure_boundary.apply(divergence, dims);

    pressure.fill(0.);
    relax(dims, pressure, &divergence[..], 1., 4., iterations, pressure_boundary, scratch)?;

    let stride = dims.row_stride();
    dest.copy_from_slice(src);
    for y in 1..dims.height() - 1 {
        for x in 1..dims.width() - 1 {
            let i = dims.index(x, y);
            dest[i] = src[i] - 0.5 * (pressure[i + 2] - pressure[i - 2]);
            dest[i + 1] = src[i + 1] - 0.5 * (pressure[i + stride] - pressure[i - stride]);
        }
    }

    enforce_boundaries(dest, dims);

    Ok(())
}
