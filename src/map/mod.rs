//! Volumetric density maps.

use std::fmt;

use nalgebra::Vector3;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::{MapSymError, ES_INVALID_MAP};

pub mod synthetic;


// ==================
// Struct definitions
// ==================

/// A structure to manage a processed volumetric density map.
///
/// Voxel $`(i, j, k)`$ sits at the physical position
/// $`((i, j, k) - \mathbf{c}) \odot \mathbf{s}`$, where $`\mathbf{c} = (\mathbf{n} - 1) / 2`$ is the
/// centre of the box in index space and $`\mathbf{s}`$ the voxel size in Ångström. All rotations
/// are taken about this centre.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeMap {
    /// The density values, indexed as `[x, y, z]`.
    values: Array3<f64>,

    /// The size of one voxel along each axis in Ångström.
    voxel_size: Vector3<f64>,

    /// The first index of the box along each axis in the original map frame.
    from: [i64; 3],
}

impl VolumeMap {
    /// Constructs a new map from density values and the physical extent of the box.
    ///
    /// # Arguments
    ///
    /// * `values` - The density values, indexed as `[x, y, z]`.
    /// * `cell_extent` - The physical size of the box along each axis in Ångström.
    ///
    /// # Errors
    ///
    /// Errors if any dimension is zero, any extent is not positive, or any value is not finite.
    pub fn new(values: Array3<f64>, cell_extent: [f64; 3]) -> Result<Self, MapSymError> {
        let dims = values.dim();
        let dims = [dims.0, dims.1, dims.2];
        if dims.iter().any(|&d| d == 0) {
            return Err(MapSymError::configuration(
                ES_INVALID_MAP,
                format!("The map has an empty dimension: {dims:?}."),
            ));
        }
        if cell_extent.iter().any(|&e| !(e.is_finite() && e > 0.0)) {
            return Err(MapSymError::configuration(
                ES_INVALID_MAP,
                format!("The cell extent {cell_extent:?} must be positive along every axis."),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MapSymError::configuration(
                ES_INVALID_MAP,
                "The map contains non-finite density values.",
            ));
        }
        #[allow(clippy::cast_precision_loss)]
        let voxel_size = Vector3::new(
            cell_extent[0] / dims[0] as f64,
            cell_extent[1] / dims[1] as f64,
            cell_extent[2] / dims[2] as f64,
        );
        Ok(Self {
            values,
            voxel_size,
            from: [0, 0, 0],
        })
    }

    /// Sets the first index of the box along each axis in the original map frame.
    #[must_use]
    pub fn with_origin_indices(mut self, from: [i64; 3]) -> Self {
        self.from = from;
        self
    }

    /// Returns the number of voxels along each axis.
    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        let (nx, ny, nz) = self.values.dim();
        [nx, ny, nz]
    }

    /// Returns the physical size of the box along each axis in Ångström.
    #[must_use]
    pub fn physical_extent(&self) -> [f64; 3] {
        let dims = self.dims();
        [
            self.voxel_size[0] * dims[0] as f64,
            self.voxel_size[1] * dims[1] as f64,
            self.voxel_size[2] * dims[2] as f64,
        ]
    }

    /// Returns the size of one voxel along each axis in Ångström.
    #[must_use]
    pub fn voxel_size(&self) -> &Vector3<f64> {
        &self.voxel_size
    }

    /// Returns the first box index along each axis.
    #[must_use]
    pub fn from_indices(&self) -> [i64; 3] {
        self.from
    }

    /// Returns the last box index along each axis, so that `to - from + 1` is the dimension.
    #[must_use]
    pub fn to_indices(&self) -> [i64; 3] {
        let dims = self.dims();
        let mut to = [0; 3];
        for (i, t) in to.iter_mut().enumerate() {
            *t = self.from[i] + i64::try_from(dims[i]).unwrap_or(i64::MAX) - 1;
        }
        to
    }

    /// Returns the density values.
    #[must_use]
    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Returns the density at a voxel, or zero outside the box.
    #[must_use]
    pub fn voxel(&self, i: isize, j: isize, k: isize) -> f64 {
        match (usize::try_from(i), usize::try_from(j), usize::try_from(k)) {
            (Ok(i), Ok(j), Ok(k)) => self.values.get((i, j, k)).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Returns the radius of the sphere inscribed in the largest extent of the box, *i.e.* half of
    /// the largest physical extent.
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        0.5 * self
            .physical_extent()
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }

    /// Evaluates the density at a physical position relative to the centre of the box by
    /// trilinear interpolation. Positions outside the box see zero density.
    #[must_use]
    pub fn value_at(&self, position: &Vector3<f64>) -> f64 {
        let dims = self.dims();
        let mut base = [0isize; 3];
        let mut frac = [0.0; 3];
        for axis in 0..3 {
            #[allow(clippy::cast_precision_loss)]
            let centre = 0.5 * (dims[axis] as f64 - 1.0);
            let u = position[axis] / self.voxel_size[axis] + centre;
            let u_floor = u.floor();
            if !u_floor.is_finite() || u_floor < -1.0 || u_floor > dims[axis] as f64 {
                return 0.0;
            }
            base[axis] = u_floor as isize;
            frac[axis] = u - u_floor;
        }
        let mut value = 0.0;
        for (di, wi) in [(0, 1.0 - frac[0]), (1, frac[0])] {
            for (dj, wj) in [(0, 1.0 - frac[1]), (1, frac[1])] {
                for (dk, wk) in [(0, 1.0 - frac[2]), (1, frac[2])] {
                    let w = wi * wj * wk;
                    if w != 0.0 {
                        value += w * self.voxel(base[0] + di, base[1] + dj, base[2] + dk);
                    }
                }
            }
        }
        value
    }

    /// Returns the mean density of the map.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.values.mean().unwrap_or(0.0)
    }
}

impl fmt::Display for VolumeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self.dims();
        let extent = self.physical_extent();
        writeln!(
            f,
            "Map dimensions: {} × {} × {} voxels",
            dims[0], dims[1], dims[2]
        )?;
        writeln!(
            f,
            "Map extent    : {:.3} × {:.3} × {:.3} Å",
            extent[0], extent[1], extent[2]
        )?;
        writeln!(
            f,
            "Map indices   : {:?} to {:?}",
            self.from_indices(),
            self.to_indices()
        )?;
        Ok(())
    }
}
