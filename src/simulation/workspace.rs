use crate::{
    advection::advect,
    boundary_handler::Boundary,
    diffusion::diffuse,
    error::{SolverError, SolverResult},
    field::{Field, GridDims},
    floating_type_mod::FT,
    projection::project,
};

/// Scratch buffers of the solver, sized once per grid and reused every tick.
///
/// `divergence` and `pressure` hold the result of the last projection.
pub struct SolverWorkspace {
    dims: GridDims,
    pub(crate) divergence: Vec<FT>,
    pub(crate) pressure: Vec<FT>,
    pub(crate) scratch: Vec<FT>,
    // copy of the source when a diffusion runs in place
    pub(crate) staging: Vec<FT>,
}

impl SolverWorkspace {
    pub fn new(dims: GridDims) -> Self {
        let len = dims.buffer_len();
        Self {
            dims,
            divergence: vec![0.; len],
            pressure: vec![0.; len],
            scratch: vec![0.; len],
            staging: vec![0.; len],
        }
    }

    pub fn divergence(&self) -> &[FT] {
        &self.divergence
    }

    pub fn pressure(&self) -> &[FT] {
        &self.pressure
    }

    pub(crate) fn check(&self, dims: GridDims) -> SolverResult<()> {
        dims.check_buffer("workspace", self.dims.buffer_len())
    }
}

/// Handle of a field stored in a [`FieldArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSlot(usize);

/// Pre-sized fields of one grid addressed by [`FieldSlot`], together with the
/// solver workspace.
///
/// Since destination and sources are picked by handle, aliasing is checked at
/// runtime here. Callers ping-pong between two slots and swap the handles.
pub struct FieldArena {
    dims: GridDims,
    fields: Vec<Field>,
    workspace: SolverWorkspace,
}

impl FieldArena {
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            fields: Vec::new(),
            workspace: SolverWorkspace::new(dims),
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Adds a zero-filled field.
    pub fn allocate(&mut self) -> FieldSlot {
        self.fields.push(Field::zeros(self.dims));
        FieldSlot(self.fields.len() - 1)
    }

    pub fn get(&self, slot: FieldSlot) -> SolverResult<&Field> {
        self.fields
            .get(slot.0)
            .ok_or(SolverError::UnknownField { slot: slot.0 })
    }

    pub fn get_mut(&mut self, slot: FieldSlot) -> SolverResult<&mut Field> {
        self.fields
            .get_mut(slot.0)
            .ok_or(SolverError::UnknownField { slot: slot.0 })
    }

    pub fn workspace(&self) -> &SolverWorkspace {
        &self.workspace
    }

    /// Semi-Lagrangian advection of `src` along `velocity` into `dest`.
    pub fn advect(&mut self, dest: FieldSlot, src: FieldSlot, velocity: FieldSlot, dt: FT) -> SolverResult<()> {
        if dest == src || dest == velocity {
            return Err(SolverError::AliasedBuffers { operation: "advect" });
        }
        let dims = self.dims;
        let (dest, others) = split_fields(&mut self.fields, dest)?;
        advect(
            dims,
            dest.as_mut_slice(),
            others.get(src)?.as_slice(),
            others.get(velocity)?.as_slice(),
            dt,
        )
    }

    /// Implicit diffusion of `src` into `dest`. `dest == src` is allowed, the
    /// source is staged in the workspace first.
    pub fn diffuse(
        &mut self,
        dest: FieldSlot,
        src: FieldSlot,
        viscosity: FT,
        dt: FT,
        iterations: usize,
        boundary: Boundary,
    ) -> SolverResult<()> {
        let dims = self.dims;
        let SolverWorkspace { scratch, staging, .. } = &mut self.workspace;

        if dest == src {
            let field = self
                .fields
                .get_mut(dest.0)
                .ok_or(SolverError::UnknownField { slot: dest.0 })?;
            staging.copy_from_slice(field.as_slice());
            return diffuse(
                dims,
                field.as_mut_slice(),
                staging,
                viscosity,
                dt,
                iterations,
                boundary,
                scratch,
            );
        }

        let (dest, others) = split_fields(&mut self.fields, dest)?;
        diffuse(
            dims,
            dest.as_mut_slice(),
            others.get(src)?.as_slice(),
            viscosity,
            dt,
            iterations,
            boundary,
            scratch,
        )
    }

    /// Pressure projection of the velocity in `src` into `dest`.
    pub fn project(
        &mut self,
        dest: FieldSlot,
        src: FieldSlot,
        iterations: usize,
        pressure_boundary: Boundary,
    ) -> SolverResult<()> {
        if dest == src {
            return Err(SolverError::AliasedBuffers { operation: "project" });
        }
        let dims = self.dims;
        let (dest, others) = split_fields(&mut self.fields, dest)?;
        project(
            dims,
            dest.as_mut_slice(),
            others.get(src)?.as_slice(),
            iterations,
            pressure_boundary,
            &mut self.workspace,
        )
    }
}

/// Every field of an arena except the one borrowed mutably.
struct OtherFields<'a> {
    before: &'a [Field],
    after: &'a [Field],
    pivot: usize,
}

impl<'a> OtherFields<'a> {
    fn get(&self, slot: FieldSlot) -> SolverResult<&'a Field> {
        let field = if slot.0 < self.pivot {
            self.before.get(slot.0)
        } else {
            slot.0
                .checked_sub(self.pivot + 1)
                .and_then(|i| self.after.get(i))
        };
        field.ok_or(SolverError::UnknownField { slot: slot.0 })
    }
}

fn split_fields(fields: &mut [Field], dest: FieldSlot) -> SolverResult<(&mut Field, OtherFields<'_>)> {
    if dest.0 >= fields.len() {
        return Err(SolverError::UnknownField { slot: dest.0 });
    }
    let (before, rest) = fields.split_at_mut(dest.0);
    let (dest_field, after) = rest
        .split_first_mut()
        .ok_or(SolverError::UnknownField { slot: dest.0 })?;
    Ok((
        dest_field,
        OtherFields {
            before,
            after,
            pivot: dest.0,
        },
    ))
}
