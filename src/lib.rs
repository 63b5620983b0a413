//! # MapSym: rotational symmetry detection for density maps
//!
//! MapSym determines the rotational point group of a three-dimensional density map, such as a
//! cryo-EM reconstruction of a macromolecular assembly, together with the symmetry axes that
//! realise it. The map is sampled on concentric spheres about its centre, each sphere is expanded
//! in spherical harmonics, and the self-rotation function
//!
//! ```math
//! R(g) = \sum_{l \ge 1} \sum_{m', m} E_l(m', m)\, D^l_{m'm}(g)
//! ```
//!
//! is evaluated over $`\mathsf{SO}(3)`$ by an inverse Fourier transform on an Euler-angle grid.
//! The peaks of $`R`$ at rotation angles $`2\pi/n`$ reveal the $`n`$-fold axes of the map, and
//! combinations of axes at the characteristic angles of the finite rotation groups reveal the
//! dihedral, tetrahedral, octahedral and icosahedral groups.
//!
//! The stages of the pipeline are available individually:
//! - [`sampling`] resolves the shell layout and samples the map on spheres,
//! - [`harmonics`] computes the spherical-harmonic coefficients of each shell,
//! - [`rotfun`] integrates the coefficients radially and evaluates the self-rotation function,
//! - [`peaks`] locates its maxima in angle-axis form,
//! - [`pointgroup`] classifies the axes into point groups, recommends one, and generates the
//!   group elements,
//!
//! and [`drivers`] runs the whole pipeline over a batch of structures.
//!
//! ## Logging
//!
//! Diagnostics are emitted through the [`log`](https://docs.rs/log) facade. The detection report
//! is emitted at the `info` level on the dedicated target `mapsym-output`; the helpers in [`io`]
//! configure [`log4rs`](https://docs.rs/log4rs) to route it to its own file.
//!
//! ## Examples and usage
//!
//! For most items (structs, enums, functions, and traits), their usages are illustrated in test
//! functions.

pub mod auxiliary;
pub mod drivers;
pub mod error;
pub mod harmonics;
pub mod io;
pub mod map;
pub mod peaks;
pub mod pointgroup;
pub mod rotfun;
pub mod sampling;
