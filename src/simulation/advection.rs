use crate::{error::SolverResult, field::GridDims, floating_type_mod::FT, sampler::sample_bilinear};

/// Semi-Lagrangian transport of `src` along `velocity` into `dest`.
///
/// Every cell, perimeter included, traces back one time step to its departure
/// point and takes the bilinearly sampled value of `src` there. Stable for any
/// `dt`, at the price of some numerical smoothing.
///
/// `dest` is written while `src` is still being sampled, so the two must be
/// distinct buffers; `&mut` guarantees that here.
pub fn advect(dims: GridDims, dest: &mut [FT], src: &[FT], velocity: &[FT], dt: FT) -> SolverResult<()> {
    dims.check_buffer("dest", dest.len())?;
    dims.check_buffer("src", src.len())?;
    dims.check_buffer("velocity", velocity.len())?;

    let (width, height) = (dims.width(), dims.height());

    for y in 0..height {
        for x in 0..width {
            let i = dims.index(x, y);

            let x_depart = x as FT - dt * velocity[i];
            let y_depart = y as FT - dt * velocity[i + 1];

            let sample = sample_bilinear(src, width, height, x_depart, y_depart);
            dest[i] = sample.x;
            dest[i + 1] = sample.y;
        }
    }

    Ok(())
}
