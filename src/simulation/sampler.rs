use crate::{field::CHANNELS, floating_type_mod::FT, vec2f, V2};

/// Bilinearly samples both channels of `field` at the fractional grid
/// position `(x, y)`.
///
/// The base cell is clamped into the grid, the fractional offsets are not:
/// queries left of / above the grid extrapolate along the first edge, queries
/// right of / below it return the edge value. Integer positions inside the
/// grid return the stored value exactly.
///
/// Takes the raw grid size so it also works on grids without an interior.
pub fn sample_bilinear(field: &[FT], width: usize, height: usize, x: FT, y: FT) -> V2 {
    let max_x = width as isize - 1;
    let max_y = height as isize - 1;

    let x0 = (x.floor() as isize).clamp(0, max_x) as usize;
    let x1 = usize::min(x0 + 1, width - 1);
    let y0 = (y.floor() as isize).clamp(0, max_y) as usize;
    let y1 = usize::min(y0 + 1, height - 1);

    let dx = x - x0 as FT;
    let dy = y - y0 as FT;

    let at = |cx: usize, cy: usize| {
        let i = (cx + cy * width) * CHANNELS;
        vec2f(field[i], field[i + 1])
    };

    let q00 = at(x0, y0);
    let q10 = at(x1, y0);
    let q01 = at(x0, y1);
    let q11 = at(x1, y1);

    let r0 = q00 * (1. - dx) + q10 * dx;
    let r1 = q01 * (1. - dx) + q11 * dx;

    r0 * (1. - dy) + r1 * dy
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn exact_at_grid_nodes() {
        let (width, height) = (5, 4);
        let mut rng = StdRng::seed_from_u64(7);
        let field: Vec<FT> = (0..width * height * 2).map(|_| rng.gen_range(-3. ..3.)).collect();

        for y in 0..height {
            for x in 0..width {
                let i = (x + y * width) * 2;
                let sample = sample_bilinear(&field, width, height, x as FT, y as FT);
                assert_eq!(sample, vec2f(field[i], field[i + 1]), "cell ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn blends_four_corners() {
        // cells (0,0) (1,0) (0,1) (1,1)
        let field = [0., 0., 1., 1., 2., 2., 3., 3.];
        let sample = sample_bilinear(&field, 2, 2, 0.5, 0.5);
        assert_eq!(sample, vec2f(1.5, 1.5));
    }

    #[test]
    fn channels_are_interpolated_independently() {
        // channel 0 grows along x, channel 1 along y
        let field = [0., 0., 1., 0., 0., 1., 1., 1.];
        let sample = sample_bilinear(&field, 2, 2, 0.25, 0.75);
        crate::assert_ft_approx_eq(sample.x, 0.25, 1e-6, || "channel 0".into());
        crate::assert_ft_approx_eq(sample.y, 0.75, 1e-6, || "channel 1".into());
    }

    #[test]
    fn clamps_past_the_far_edge() {
        let field = [0., 0., 1., 10., 2., 20., 3., 30.];
        let sample = sample_bilinear(&field, 2, 2, 5., 9.);
        assert_eq!(sample, vec2f(3., 30.));
    }
}
