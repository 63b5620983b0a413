//! Synthetic density maps built from Gaussian blobs, used to exercise the detection pipeline on
//! structures of known symmetry.

use nalgebra::{Matrix3, Vector3};
use ndarray::Array3;

use crate::error::MapSymError;
use crate::map::VolumeMap;

/// A spherical Gaussian density blob.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianBlob {
    /// The centre of the blob relative to the centre of the box, in Ångström.
    pub centre: Vector3<f64>,

    /// The peak density of the blob.
    pub height: f64,

    /// The standard deviation of the blob in Ångström.
    pub sigma: f64,
}

impl GaussianBlob {
    /// Constructs a blob from cylindrical coordinates about the $`z`$-axis.
    ///
    /// # Arguments
    ///
    /// * `rho` - The distance from the $`z`$-axis.
    /// * `phi_deg` - The azimuth in degrees.
    /// * `z` - The height along $`z`$.
    /// * `height` - The peak density.
    /// * `sigma` - The standard deviation.
    #[must_use]
    pub fn cylindrical(rho: f64, phi_deg: f64, z: f64, height: f64, sigma: f64) -> Self {
        let phi = phi_deg.to_radians();
        Self {
            centre: Vector3::new(rho * phi.cos(), rho * phi.sin(), z),
            height,
            sigma,
        }
    }

    /// Returns a copy of this blob moved by a rotation about the centre of the box.
    #[must_use]
    pub fn rotated(&self, rotation: &Matrix3<f64>) -> Self {
        Self {
            centre: rotation * self.centre,
            height: self.height,
            sigma: self.sigma,
        }
    }

    fn density(&self, position: &Vector3<f64>) -> f64 {
        let d2 = (position - self.centre).norm_squared();
        self.height * (-0.5 * d2 / (self.sigma * self.sigma)).exp()
    }
}

/// Replicates a motif of blobs under every rotation of a set.
#[must_use]
pub fn replicate_motif(motif: &[GaussianBlob], rotations: &[Matrix3<f64>]) -> Vec<GaussianBlob> {
    rotations
        .iter()
        .flat_map(|rot| motif.iter().map(move |blob| blob.rotated(rot)))
        .collect()
}

/// Renders a set of blobs into a cubic map.
///
/// # Arguments
///
/// * `dim` - The number of voxels along each axis.
/// * `voxel_size` - The size of one voxel in Ångström.
/// * `blobs` - The blobs to render.
///
/// # Errors
///
/// Errors if the resulting map is invalid.
pub fn render_blobs(
    dim: usize,
    voxel_size: f64,
    blobs: &[GaussianBlob],
) -> Result<VolumeMap, MapSymError> {
    #[allow(clippy::cast_precision_loss)]
    let centre = 0.5 * (dim as f64 - 1.0);
    let values = Array3::from_shape_fn((dim, dim, dim), |(i, j, k)| {
        #[allow(clippy::cast_precision_loss)]
        let position = Vector3::new(
            (i as f64 - centre) * voxel_size,
            (j as f64 - centre) * voxel_size,
            (k as f64 - centre) * voxel_size,
        );
        blobs.iter().map(|blob| blob.density(&position)).sum()
    });
    #[allow(clippy::cast_precision_loss)]
    let extent = dim as f64 * voxel_size;
    VolumeMap::new(values, [extent; 3])
}
