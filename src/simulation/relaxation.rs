use crate::{
    boundary_handler::{Boundary, BoundaryCondition},
    error::SolverResult,
    field::GridDims,
    floating_type_mod::FT,
};

/// Jacobi relaxation of `dest[c] = (src[c] + alpha * sum(dest[neighbors of c])) / beta`
/// over the interior cells, both channels independently.
///
/// `dest` starts out as a copy of `src`. Every sweep reads only the previous
/// iterate and writes into `scratch`, which is then copied back into `dest`
/// and `boundary` is applied. Exactly `iterations` sweeps are performed; there
/// is no convergence test.
///
/// The perimeter of `scratch` is cleared once up front and never written by a
/// sweep, so after the first sweep the perimeter of `dest` is zero before the
/// boundary policy runs.
#[allow(clippy::too_many_arguments)]
pub fn relax(
    dims: GridDims,
    dest: &mut [FT],
    src: &[FT],
    alpha: FT,
    beta: FT,
    iterations: usize,
    boundary: Boundary,
    scratch: &mut [FT],
) -> SolverResult<()> {
    dims.check_buffer("dest", dest.len())?;
    dims.check_buffer("src", src.len())?;
    dims.check_buffer("scratch", scratch.len())?;

    let inv_beta = 1. / beta;
    let stride = dims.row_stride();

    dest.copy_from_slice(src);
    scratch.fill(0.);

    for _ in 0..iterations {
        for y in 1..dims.height() - 1 {
            for x in 1..dims.width() - 1 {
                let i = dims.index(x, y);
                let left = i - 2;
                let right = i + 2;
                let up = i - stride;
                let down = i + stride;

                for k in 0..2 {
                    let neighbors = dest[left + k] + dest[right + k] + dest[up + k] + dest[down + k];
                    scratch[i + k] = (src[i + k] + alpha * neighbors) * inv_beta;
                }
            }
        }

        dest.copy_from_slice(scratch);
        boundary.apply(dest, dims);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FreeSlip, SolverError, ZeroPerimeter};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_buffer(dims: GridDims, seed: u64) -> Vec<FT> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..dims.buffer_len()).map(|_| rng.gen_range(-1. ..1.)).collect()
    }

    #[test]
    fn zero_alpha_divides_by_beta() {
        let dims = GridDims::new(6, 5).unwrap();
        let src = random_buffer(dims, 3);
        let beta: FT = 3.;

        for iterations in [1, 2, 7] {
            let mut dest = vec![0.; dims.buffer_len()];
            let mut scratch = vec![0.; dims.buffer_len()];
            relax(dims, &mut dest, &src, 0., beta, iterations, FreeSlip.into(), &mut scratch).unwrap();

            for y in 1..dims.height() - 1 {
                for x in 1..dims.width() - 1 {
                    let i = dims.index(x, y);
                    assert_eq!(dest[i], src[i] * (1. / beta));
                    assert_eq!(dest[i + 1], src[i + 1] * (1. / beta));
                }
            }
        }
    }

    #[test]
    fn zero_iterations_copies_source() {
        let dims = GridDims::new(4, 4).unwrap();
        let src = random_buffer(dims, 11);
        let mut dest = vec![5.; dims.buffer_len()];
        let mut scratch = vec![0.; dims.buffer_len()];
        relax(dims, &mut dest, &src, 1., 4., 0, ZeroPerimeter.into(), &mut scratch).unwrap();
        assert_eq!(dest, src);
    }

    #[test]
    fn perimeter_is_cleared_after_a_sweep() {
        let dims = GridDims::new(5, 4).unwrap();
        let src = vec![1.; dims.buffer_len()];
        let mut dest = vec![0.; dims.buffer_len()];
        let mut scratch = vec![9.; dims.buffer_len()];
        relax(dims, &mut dest, &src, 0.5, 3., 4, FreeSlip.into(), &mut scratch).unwrap();

        for y in 0..dims.height() {
            for x in 0..dims.width() {
                if dims.is_perimeter(x, y) {
                    let i = dims.index(x, y);
                    assert_eq!((dest[i], dest[i + 1]), (0., 0.), "cell ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn jacobi_reads_only_previous_iterate() {
        // two interior cells; a Gauss-Seidel sweep would see the updated (1,1) when computing (2,1)
        let dims = GridDims::new(4, 3).unwrap();
        let mut src = vec![0.; dims.buffer_len()];
        src[dims.index(1, 1)] = 4.;
        let mut dest = vec![0.; dims.buffer_len()];
        let mut scratch = vec![0.; dims.buffer_len()];
        relax(dims, &mut dest, &src, 1., 4., 1, ZeroPerimeter.into(), &mut scratch).unwrap();

        // sweep 1: cell (1,1) = (4 + 0) / 4, cell (2,1) = (0 + 4) / 4 using the old value of (1,1)
        assert_eq!(dest[dims.index(1, 1)], 1.);
        assert_eq!(dest[dims.index(2, 1)], 1.);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let dims = GridDims::new(3, 3).unwrap();
        let src = vec![0.; dims.buffer_len()];
        let mut dest = vec![0.; dims.buffer_len()];
        let mut scratch = vec![0.; dims.buffer_len() - 2];
        let err = relax(dims, &mut dest, &src, 1., 4., 1, FreeSlip.into(), &mut scratch).unwrap_err();
        assert_eq!(
            err,
            SolverError::BufferSizeMismatch {
                buffer: "scratch",
                expected: 18,
                actual: 16
            }
        );
    }
}
