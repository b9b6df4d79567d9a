use crate::{
    boundary_handler::Boundary, error::SolverResult, field::GridDims, floating_type_mod::FT, relaxation::relax,
};

/// Implicit (backward Euler) viscous diffusion of `src` into `dest`.
///
/// Solves `(1 + 4a) d - a * sum(neighbors of d) = s` with `a = dt * viscosity`,
/// which is stable for any time step.
#[allow(clippy::too_many_arguments)]
pub fn diffuse(
    dims: GridDims,
    dest: &mut [FT],
    src: &[FT],
    viscosity: FT,
    dt: FT,
    iterations: usize,
    boundary: Boundary,
    scratch: &mut [FT],
) -> SolverResult<()> {
    let alpha = dt * viscosity;
    let beta = 1. + 4. * alpha;
    relax(dims, dest, src, alpha, beta, iterations, boundary, scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, FreeSlip, ZeroPerimeter, DEFAULT_JACOBI_ITERATIONS};

    #[test]
    fn zero_field_stays_zero() {
        let dims = GridDims::new(8, 6).unwrap();
        let src = vec![0.; dims.buffer_len()];
        let mut dest = vec![1.; dims.buffer_len()];
        let mut scratch = vec![0.; dims.buffer_len()];

        for (viscosity, dt) in [(0., 0.1), (0.5, 1.), (20., 3.)] {
            diffuse(dims, &mut dest, &src, viscosity, dt, DEFAULT_JACOBI_ITERATIONS, FreeSlip.into(), &mut scratch)
                .unwrap();
            assert!(dest.iter().all(|&v| v == 0.));
        }
    }

    #[test]
    fn inviscid_keeps_interior() {
        let dims = GridDims::new(5, 5).unwrap();
        let src = Field::from_fn(dims, |x, y| crate::vec2f(x as FT, y as FT));
        let mut dest = Field::zeros(dims);
        let mut scratch = vec![0.; dims.buffer_len()];
        diffuse(
            dims,
            dest.as_mut_slice(),
            src.as_slice(),
            0.,
            0.1,
            DEFAULT_JACOBI_ITERATIONS,
            FreeSlip.into(),
            &mut scratch,
        )
        .unwrap();

        for y in 1..4 {
            for x in 1..4 {
                assert_eq!(dest.get(x, y), src.get(x, y));
            }
        }
    }

    #[test]
    fn spreads_a_spike_to_its_neighbors() {
        let dims = GridDims::new(9, 9).unwrap();
        let mut src = Field::zeros(dims);
        src.set(4, 4, crate::vec2f(1., 0.));
        let mut dest = Field::zeros(dims);
        let mut scratch = vec![0.; dims.buffer_len()];
        diffuse(
            dims,
            dest.as_mut_slice(),
            src.as_slice(),
            1.,
            0.5,
            DEFAULT_JACOBI_ITERATIONS,
            ZeroPerimeter.into(),
            &mut scratch,
        )
        .unwrap();

        let center = dest.get(4, 4).x;
        let neighbor = dest.get(5, 4).x;
        assert!(center < 1. && center > 0.);
        assert!(neighbor > 0. && neighbor < center);
        crate::assert_ft_approx_eq(dest.get(3, 4).x, neighbor, 1e-6, || "symmetric spread".into());
        assert_eq!(dest.get(4, 4).y, 0.);
    }
}
