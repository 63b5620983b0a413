//! Spherical sampling of volumetric maps on concentric shells.

use std::f64::consts::PI;
use std::fmt;

use log;
use nalgebra::Vector3;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::auxiliary::quadrature::GaussLegendre;
use crate::error::{MapSymError, ES_INVALID_RESOLUTION, ES_MAP_TOO_SMALL};
use crate::map::VolumeMap;


/// The smallest number of shells for which a rotation function can be meaningfully integrated.
pub const MIN_SHELLS: usize = 2;

/// The smallest angular bandwidth of any shell.
pub const MIN_BANDWIDTH: usize = 4;

/// The largest automatically determined bandwidth.
pub const MAX_AUTO_BANDWIDTH: usize = 128;

/// The largest automatically determined radial integration order.
pub const MAX_AUTO_INTEGRATION_ORDER: usize = 64;

// ==================
// Struct definitions
// ==================

/// The sampling-related part of the detection settings, where zero requests an automatic choice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplingSettings {
    /// The resolution of the map in Ångström.
    pub resolution: f64,

    /// The harmonic bandwidth $`B`$ (degrees $`0 \le l < B`$), or `0` for automatic.
    pub bandwidth: usize,

    /// The distance between consecutive shells in Ångström, or `0.0` for automatic.
    pub sphere_distance: f64,

    /// The order of the radial Gauss–Legendre quadrature, or `0` for automatic.
    pub integration_order: usize,

    /// Whether inner shells use proportionally smaller angular bandwidths.
    pub progressive: bool,
}

/// The sampling parameters of one structure, with every automatic value resolved.
///
/// This is derived per structure and never written back into the caller's settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSampling {
    /// The resolution of the map in Ångström.
    pub resolution: f64,

    /// The distance between consecutive shells in Ångström.
    pub sphere_distance: f64,

    /// The global harmonic bandwidth.
    pub bandwidth: usize,

    /// The order of the radial Gauss–Legendre quadrature.
    pub integration_order: usize,

    /// The radius of the sphere covered by the shells.
    pub max_radius: f64,

    /// The radius of each shell, in ascending order.
    pub shell_radii: Vec<f64>,

    /// The angular bandwidth of each shell.
    pub shell_bandwidths: Vec<usize>,
}

impl ResolvedSampling {
    /// Resolves the sampling parameters for a map.
    ///
    /// # Arguments
    ///
    /// * `map` - The processed map.
    /// * `settings` - The requested sampling settings.
    ///
    /// # Errors
    ///
    /// Errors if the resolution is not positive, or if the map cannot hold [`MIN_SHELLS`] shells.
    pub fn resolve(map: &VolumeMap, settings: &SamplingSettings) -> Result<Self, MapSymError> {
        if !(settings.resolution.is_finite() && settings.resolution > 0.0) {
            return Err(MapSymError::configuration(
                ES_INVALID_RESOLUTION,
                format!(
                    "The resolution must be positive, but {} was supplied.",
                    settings.resolution
                ),
            ));
        }
        let sphere_distance = if settings.sphere_distance > 0.0 {
            settings.sphere_distance
        } else {
            0.5 * settings.resolution
        };
        let max_radius = map.max_radius();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_shells = (max_radius / sphere_distance + 1e-9).floor() as usize;
        if n_shells < MIN_SHELLS {
            return Err(MapSymError::configuration(
                ES_MAP_TOO_SMALL,
                format!(
                    "A map of radius {max_radius:.3} Å holds only {n_shells} shell(s) spaced by \
                     {sphere_distance:.3} Å, but at least {MIN_SHELLS} are required."
                ),
            ));
        }
        #[allow(clippy::cast_precision_loss)]
        let shell_radii: Vec<f64> = (0..n_shells)
            .map(|s| (s + 1) as f64 * sphere_distance)
            .collect();

        let bandwidth = if settings.bandwidth > 0 {
            settings.bandwidth.max(MIN_BANDWIDTH)
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let auto = (PI * max_radius / settings.resolution).ceil() as usize;
            auto.clamp(MIN_BANDWIDTH, MAX_AUTO_BANDWIDTH)
        };
        let integration_order = if settings.integration_order > 0 {
            settings.integration_order
        } else {
            n_shells.clamp(MIN_SHELLS, MAX_AUTO_INTEGRATION_ORDER)
        };
        let shell_bandwidths = (0..n_shells)
            .map(|s| {
                if settings.progressive {
                    // Integer ceil of B (s + 1) / S.
                    let scaled = (bandwidth * (s + 1) + n_shells - 1) / n_shells;
                    scaled.clamp(MIN_BANDWIDTH, bandwidth)
                } else {
                    bandwidth
                }
            })
            .collect();

        let resolved = Self {
            resolution: settings.resolution,
            sphere_distance,
            bandwidth,
            integration_order,
            max_radius,
            shell_radii,
            shell_bandwidths,
        };
        log::debug!(
            "Resolved sampling: {} shells, bandwidth {}, integration order {}.",
            resolved.n_shells(),
            resolved.bandwidth,
            resolved.integration_order
        );
        Ok(resolved)
    }

    /// Returns the number of shells.
    #[must_use]
    pub fn n_shells(&self) -> usize {
        self.shell_radii.len()
    }
}

impl fmt::Display for ResolvedSampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution              : {:.3} Å", self.resolution)?;
        writeln!(f, "Shell spacing           : {:.3} Å", self.sphere_distance)?;
        writeln!(f, "Number of shells        : {}", self.n_shells())?;
        writeln!(f, "Harmonic bandwidth      : {}", self.bandwidth)?;
        writeln!(f, "Radial integration order: {}", self.integration_order)?;
        Ok(())
    }
}

/// A fixed-radius sphere sampled on a Gauss–Legendre colatitude grid times an equispaced
/// longitude grid.
#[derive(Clone, Debug)]
pub struct SphericalShell {
    /// The radius of the shell in Ångström.
    pub radius: f64,

    /// The angular bandwidth of the shell.
    pub bandwidth: usize,

    /// The colatitude rule, with nodes in $`\cos\theta`$.
    pub colatitudes: GaussLegendre,

    /// The sampled values, indexed as `[colatitude, longitude]`.
    pub values: Array2<f64>,
}

impl SphericalShell {
    /// Samples a map on a shell.
    ///
    /// The shell of bandwidth $`b`$ holds $`2b`$ colatitudes and $`2b + 2`$ longitudes
    /// $`\phi_k = 2\pi k / (2b + 2)`$.
    #[must_use]
    pub fn sample(map: &VolumeMap, radius: f64, bandwidth: usize) -> Self {
        let n_theta = 2 * bandwidth;
        let n_phi = 2 * bandwidth + 2;
        let colatitudes = GaussLegendre::new(n_theta);
        let mut values = Array2::<f64>::zeros((n_theta, n_phi));
        for (j, &cos_theta) in colatitudes.nodes.iter().enumerate() {
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
            for k in 0..n_phi {
                #[allow(clippy::cast_precision_loss)]
                let phi = 2.0 * PI * k as f64 / n_phi as f64;
                let position = Vector3::new(
                    radius * sin_theta * phi.cos(),
                    radius * sin_theta * phi.sin(),
                    radius * cos_theta,
                );
                values[(j, k)] = map.value_at(&position);
            }
        }
        Self {
            radius,
            bandwidth,
            colatitudes,
            values,
        }
    }

    /// Returns the number of longitudes.
    #[must_use]
    pub fn n_phi(&self) -> usize {
        self.values.ncols()
    }
}

// =========
// Functions
// =========

/// Samples a map on every shell of a resolved sampling, from the innermost outwards.
#[must_use]
pub fn sample_shells(map: &VolumeMap, sampling: &ResolvedSampling) -> Vec<SphericalShell> {
    log::debug!("Mapping the density onto {} shells...", sampling.n_shells());
    let shells = sampling
        .shell_radii
        .iter()
        .zip(sampling.shell_bandwidths.iter())
        .map(|(&radius, &bandwidth)| SphericalShell::sample(map, radius, bandwidth))
        .collect();
    log::debug!("Mapping the density onto {} shells... Done.", sampling.n_shells());
    shells
}
