use crate::{
    error::{SolverError, SolverResult},
    floating_type_mod::FT,
    vec2f, V2,
};

/// Number of float channels stored per cell.
pub const CHANNELS: usize = 2;

/// Size of a simulation grid. Only constructible with a non-empty interior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDims {
    width: usize,
    height: usize,
}

impl GridDims {
    pub fn new(width: usize, height: usize) -> SolverResult<Self> {
        if width < 3 || height < 3 {
            return Err(SolverError::InvalidDimension { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_cells(&self) -> usize {
        self.width * self.height
    }

    /// Length of a field buffer for this grid.
    pub fn buffer_len(&self) -> usize {
        self.num_cells() * CHANNELS
    }

    /// Index of channel 0 of cell `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (x + y * self.width) * CHANNELS
    }

    /// Offset between vertically adjacent cells.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.width * CHANNELS
    }

    pub fn check_buffer(&self, buffer: &'static str, len: usize) -> SolverResult<()> {
        let expected = self.buffer_len();
        if len != expected {
            return Err(SolverError::BufferSizeMismatch {
                buffer,
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    pub fn is_perimeter(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }
}

/// Owned 2-channel grid buffer. Velocity fields store `(u, v)`, scalar fields
/// store their value in channel 0 and keep channel 1 at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    dims: GridDims,
    data: Vec<FT>,
}

impl Field {
    pub fn zeros(dims: GridDims) -> Self {
        Self {
            dims,
            data: vec![0.; dims.buffer_len()],
        }
    }

    pub fn from_vec(dims: GridDims, data: Vec<FT>) -> SolverResult<Self> {
        dims.check_buffer("field", data.len())?;
        Ok(Self { dims, data })
    }

    pub fn from_fn(dims: GridDims, f: impl Fn(usize, usize) -> V2) -> Self {
        let mut field = Self::zeros(dims);
        for y in 0..dims.height() {
            for x in 0..dims.width() {
                field.set(x, y, f(x, y));
            }
        }
        field
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn as_slice(&self) -> &[FT] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [FT] {
        &mut self.data
    }

    pub fn get(&self, x: usize, y: usize) -> V2 {
        let i = self.dims.index(x, y);
        vec2f(self.data[i], self.data[i + 1])
    }

    pub fn set(&mut self, x: usize, y: usize, value: V2) {
        let i = self.dims.index(x, y);
        self.data[i] = value.x;
        self.data[i + 1] = value.y;
    }

    pub fn scale_in_place(&mut self, scale: FT) {
        for value in &mut self.data {
            *value *= scale;
        }
    }

    /// Sum of `|c|^2 / 2` over all cells.
    pub fn kinetic_energy(&self) -> FT {
        self.data.chunks_exact(CHANNELS).map(|c| 0.5 * (c[0] * c[0] + c[1] * c[1])).sum()
    }
}

/// Smallest and largest finite channel-0 value of a field buffer, `(0, 0)`
/// when there is none.
pub fn channel0_range(field: &[FT]) -> (FT, FT) {
    let mut iter = field.iter().step_by(CHANNELS).filter(|value| value.is_finite());
    let Some(first) = iter.next() else {
        return (0., 0.);
    };
    iter.fold((*first, *first), |(lo, hi), &value| (lo.min(value), hi.max(value)))
}
