use crate::{field::GridDims, floating_type_mod::FT};

use enum_dispatch::enum_dispatch;

/// Boundary condition applied to the perimeter cells of a field.
///
/// Velocity and scalar fields share the same 2-channel layout but need
/// different conditions, so callers pick the policy explicitly instead of
/// having it implied by the buffer shape.
#[enum_dispatch]
pub trait BoundaryCondition {
    fn apply(&self, field: &mut [FT], dims: GridDims);
}

/// Free-slip walls for velocity fields: the wall-normal component is zeroed,
/// the tangential one is left alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreeSlip;

impl BoundaryCondition for FreeSlip {
    fn apply(&self, field: &mut [FT], dims: GridDims) {
        enforce_boundaries(field, dims);
    }
}

/// Homogeneous Dirichlet condition for scalar fields: both channels of every
/// perimeter cell are zeroed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZeroPerimeter;

impl BoundaryCondition for ZeroPerimeter {
    fn apply(&self, field: &mut [FT], dims: GridDims) {
        let (width, height) = (dims.width(), dims.height());
        for x in 0..width {
            for y in [0, height - 1] {
                let i = dims.index(x, y);
                field[i] = 0.;
                field[i + 1] = 0.;
            }
        }
        for y in 1..height - 1 {
            for x in [0, width - 1] {
                let i = dims.index(x, y);
                field[i] = 0.;
                field[i + 1] = 0.;
            }
        }
    }
}

#[enum_dispatch(BoundaryCondition)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    FreeSlip(FreeSlip),
    ZeroPerimeter(ZeroPerimeter),
}

/// Zeroes the wall-normal velocity component on the domain perimeter.
///
/// Top and bottom rows lose channel 1 over their full width. Left and right
/// columns lose channel 0 for the interior rows only, so the four corners keep
/// their channel 0.
pub fn enforce_boundaries(field: &mut [FT], dims: GridDims) {
    let (width, height) = (dims.width(), dims.height());

    for x in 0..width {
        let top = dims.index(x, 0);
        let bottom = dims.index(x, height - 1);
        field[top + 1] = 0.;
        field[bottom + 1] = 0.;
    }

    for y in 1..height - 1 {
        let left = dims.index(0, y);
        let right = dims.index(width - 1, y);
        field[left] = 0.;
        field[right] = 0.;
    }
}
