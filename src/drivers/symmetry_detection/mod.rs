//! Driver for rotational point-group symmetry detection over a batch of density maps.

use std::f64::consts::TAU;
use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::proper_rotation_matrix;
use crate::drivers::MapSymDriver;
use crate::error::{
    MapSymError, ES_INVALID_RESOLUTION, ES_INVALID_THRESHOLD, ES_NEGATIVE_AXIS_TOLERANCE,
    ES_NO_STRUCTURES,
};
use crate::harmonics::compute_harmonics;
use crate::io::format::{
    log_macsec_begin, log_macsec_end, log_subtitle, log_title, mapsym_error, mapsym_output,
    nice_bool, write_subtitle, MapSymOutput,
};
use crate::io::{write_mapsym_binary, MapSymFileType};
use crate::map::VolumeMap;
use crate::peaks::{detect_peaks, folds_to_scan, AxisPeak, PeakSearchSettings};
use crate::pointgroup::classify::{classify, ClassificationSettings, SymmetryClassification};
use crate::pointgroup::group_elements::{
    dihedral_group_elements, generate_group_elements, select_recommended_d_pair,
    GroupElementOutcome, MAX_SYMMETRY_FOLD,
};
use crate::pointgroup::recommend::{recommend, SymmetryRecommendation};
use crate::pointgroup::{PointGroupKind, RequestedSymmetry, SymmetryAxisCandidate};
use crate::rotfun::RotationFunctionGrid;
use crate::sampling::{sample_shells, ResolvedSampling, SamplingSettings};

#[cfg(test)]
#[path = "symmetry_detection_tests.rs"]
mod symmetry_detection_tests;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// A structure containing control parameters for symmetry detection.
///
/// Parameters are never modified by the pipeline. Variants for sub-tasks are derived with
/// [`Self::to_builder`], and the automatic sampling choices are resolved separately for each
/// structure into a [`ResolvedSampling`].
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymmetryDetectionParams {
    /// The resolution of the maps in Ångström.
    #[builder(default = "6.0")]
    pub resolution: f64,

    /// The harmonic bandwidth, or `0` for an automatic choice from the resolution.
    #[builder(default = "0")]
    pub bandwidth: usize,

    /// The distance between consecutive shells in Ångström, or `0.0` for half the resolution.
    #[builder(default = "0.0")]
    pub sphere_distance: f64,

    /// The order of the radial quadrature, or `0` for an automatic choice.
    #[builder(default = "0")]
    pub integration_order: usize,

    /// Boolean indicating if inner shells are sampled with proportionally smaller bandwidths.
    #[builder(default = "true")]
    pub progressive_sphere_mapping: bool,

    /// The largest fold searched for.
    #[builder(default = "30")]
    pub max_symmetry_fold: u32,

    /// Boolean indicating if only prime folds are scanned.
    #[builder(default = "false")]
    pub prime_folds_only: bool,

    /// The neighbourhood radius of the peak search in lattice spacings.
    #[builder(default = "1")]
    pub peak_neighbours: usize,

    /// The IQR multiple defining significant peaks. Negative values disable the filter.
    #[builder(default = "-999.9")]
    pub peak_iqr_threshold: f64,

    /// The largest fraction of the axes of a composite group that may be missing.
    #[builder(default = "0.3")]
    pub missing_peak_threshold: f64,

    /// The tolerance on $`1 - |\hat{a} \cdot \hat{b}|`$ for two axes to be the same, and on
    /// characteristic inter-axis cosines.
    #[builder(default = "0.1")]
    pub axis_comparison_threshold: f64,

    /// The smallest height with which an axis is accepted.
    #[builder(default = "0.3")]
    pub minimum_peak_for_axis: f64,

    /// Boolean indicating if peaks are refined by bicubic interpolation.
    #[builder(default = "true")]
    pub bicubic_interpolation: bool,

    /// The score margin within which a larger group is preferred to a better-scoring one.
    #[builder(default = "0.1")]
    pub peak_height_tolerance: f64,

    /// The requested symmetry type, one of `C`, `D`, `T`, `O` or `I`. If `None`, the best
    /// symmetry is searched for.
    #[builder(default = "None")]
    pub requested_symmetry: Option<String>,

    /// The requested fold, or `0` for any.
    #[builder(default = "0")]
    pub requested_fold: u32,

    /// The largest number of multiplication passes when closing a group.
    #[builder(default = "10")]
    pub group_closure_max_passes: usize,

    /// The number of rotation-function grid points per Euler angle relative to twice the
    /// bandwidth.
    #[builder(default = "2")]
    pub rotation_grid_oversampling: usize,

    /// Boolean indicating if the elements of the recommended group are generated and reported.
    #[builder(default = "false")]
    pub write_group_elements: bool,

    /// Optional name for saving the result as a binary file of type [`MapSymFileType::Sym`]. If
    /// `None`, the result will not be saved.
    #[builder(default = "None")]
    pub result_save_name: Option<String>,
}

impl SymmetryDetectionParams {
    /// Returns a builder to construct a [`SymmetryDetectionParams`] structure.
    pub fn builder() -> SymmetryDetectionParamsBuilder {
        SymmetryDetectionParamsBuilder::default()
    }

    /// Returns a builder initialised with a copy of these parameters, so that a variant can be
    /// derived without modifying the original.
    pub fn to_builder(&self) -> SymmetryDetectionParamsBuilder {
        let mut builder = Self::builder();
        builder
            .resolution(self.resolution)
            .bandwidth(self.bandwidth)
            .sphere_distance(self.sphere_distance)
            .integration_order(self.integration_order)
            .progressive_sphere_mapping(self.progressive_sphere_mapping)
            .max_symmetry_fold(self.max_symmetry_fold)
            .prime_folds_only(self.prime_folds_only)
            .peak_neighbours(self.peak_neighbours)
            .peak_iqr_threshold(self.peak_iqr_threshold)
            .missing_peak_threshold(self.missing_peak_threshold)
            .axis_comparison_threshold(self.axis_comparison_threshold)
            .minimum_peak_for_axis(self.minimum_peak_for_axis)
            .bicubic_interpolation(self.bicubic_interpolation)
            .peak_height_tolerance(self.peak_height_tolerance)
            .requested_symmetry(self.requested_symmetry.clone())
            .requested_fold(self.requested_fold)
            .group_closure_max_passes(self.group_closure_max_passes)
            .rotation_grid_oversampling(self.rotation_grid_oversampling)
            .write_group_elements(self.write_group_elements)
            .result_save_name(self.result_save_name.clone());
        builder
    }

    /// Returns the sampling-related parameters.
    #[must_use]
    pub fn sampling_settings(&self) -> SamplingSettings {
        SamplingSettings {
            resolution: self.resolution,
            bandwidth: self.bandwidth,
            sphere_distance: self.sphere_distance,
            integration_order: self.integration_order,
            progressive: self.progressive_sphere_mapping,
        }
    }

    /// Returns the peak-search parameters.
    #[must_use]
    pub fn peak_search_settings(&self) -> PeakSearchSettings {
        PeakSearchSettings {
            peak_neighbours: self.peak_neighbours,
            iqr_threshold: self.peak_iqr_threshold,
            axis_tolerance: self.axis_comparison_threshold,
            bicubic_refinement: self.bicubic_interpolation,
        }
    }

    /// Returns the classification parameters.
    #[must_use]
    pub fn classification_settings(&self) -> ClassificationSettings {
        ClassificationSettings {
            max_fold: self.max_symmetry_fold,
            axis_tolerance: self.axis_comparison_threshold,
            min_peak_height: self.minimum_peak_for_axis,
            missing_peak_threshold: self.missing_peak_threshold,
            peak_height_tolerance: self.peak_height_tolerance,
            max_closure_passes: self.group_closure_max_passes,
        }
    }

    /// Interprets the requested symmetry.
    ///
    /// # Errors
    ///
    /// Errors if the requested type is not recognised or is inconsistent with the requested
    /// fold.
    pub fn requested(&self) -> Result<Option<RequestedSymmetry>, MapSymError> {
        RequestedSymmetry::parse(
            self.requested_symmetry.as_deref().unwrap_or(""),
            self.requested_fold,
        )
    }
}

impl fmt::Display for SymmetryDetectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auto = |value: String, is_auto: bool| {
            if is_auto {
                "auto".to_string()
            } else {
                value
            }
        };
        writeln!(f, "Resolution: {:.3} Å", self.resolution)?;
        writeln!(
            f,
            "Bandwidth: {}",
            auto(self.bandwidth.to_string(), self.bandwidth == 0)
        )?;
        writeln!(
            f,
            "Shell spacing: {}",
            auto(
                format!("{:.3} Å", self.sphere_distance),
                self.sphere_distance <= 0.0
            )
        )?;
        writeln!(
            f,
            "Radial integration order: {}",
            auto(self.integration_order.to_string(), self.integration_order == 0)
        )?;
        writeln!(
            f,
            "Progressive shell sampling: {}",
            nice_bool(self.progressive_sphere_mapping)
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Folds scanned: {} up to {}",
            if self.prime_folds_only { "primes" } else { "all" },
            self.max_symmetry_fold
        )?;
        writeln!(f, "Peak neighbourhood: {}", self.peak_neighbours)?;
        writeln!(
            f,
            "Peak IQR threshold: {}",
            if self.peak_iqr_threshold < 0.0 {
                "disabled".to_string()
            } else {
                format!("{:.3}", self.peak_iqr_threshold)
            }
        )?;
        writeln!(
            f,
            "Bicubic peak refinement: {}",
            nice_bool(self.bicubic_interpolation)
        )?;
        writeln!(f, "Axis comparison threshold: {:.3e}", self.axis_comparison_threshold)?;
        writeln!(f, "Minimum axis peak height: {:.3}", self.minimum_peak_for_axis)?;
        writeln!(f, "Missing peak threshold: {:.3}", self.missing_peak_threshold)?;
        writeln!(f, "Peak height tolerance: {:.3}", self.peak_height_tolerance)?;
        writeln!(
            f,
            "Requested symmetry: {}",
            match self.requested() {
                Ok(Some(requested)) => requested.to_string(),
                Ok(None) => "none".to_string(),
                Err(_) => format!(
                    "invalid ({}{})",
                    self.requested_symmetry.as_deref().unwrap_or(""),
                    self.requested_fold
                ),
            }
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Report group elements: {}",
            nice_bool(self.write_group_elements)
        )?;
        writeln!(
            f,
            "Save symmetry detection results to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                format!("{name}.{}", MapSymFileType::Sym.ext())
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(f)?;

        Ok(())
    }
}

// -------------------
// External structures
// -------------------

/// A map ready for symmetry detection, as delivered by the reading and preprocessing stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessedStructure {
    /// A name identifying the structure in the report.
    pub name: String,

    /// The processed map, centred on its rotation centre.
    pub map: VolumeMap,

    /// The shift in Ångström applied by preprocessing to move the map centre to the box centre.
    pub centre_shift: Vector3<f64>,
}

/// Trait for anything supplying processed maps to the detection driver.
pub trait StructureSource {
    /// Returns the number of structures.
    fn n_structures(&self) -> usize;

    /// Reads and processes one structure.
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the structure, below [`Self::n_structures`].
    /// * `params` - The detection parameters, which a source may consult when processing.
    fn read_structure(
        &self,
        index: usize,
        params: &SymmetryDetectionParams,
    ) -> Result<ProcessedStructure, anyhow::Error>;
}

impl StructureSource for [ProcessedStructure] {
    fn n_structures(&self) -> usize {
        self.len()
    }

    fn read_structure(
        &self,
        index: usize,
        _: &SymmetryDetectionParams,
    ) -> Result<ProcessedStructure, anyhow::Error> {
        self.get(index)
            .cloned()
            .ok_or_else(|| format_err!("Structure index {index} is out of range."))
    }
}

impl StructureSource for Vec<ProcessedStructure> {
    fn n_structures(&self) -> usize {
        self.as_slice().n_structures()
    }

    fn read_structure(
        &self,
        index: usize,
        params: &SymmetryDetectionParams,
    ) -> Result<ProcessedStructure, anyhow::Error> {
        self.as_slice().read_structure(index, params)
    }
}

// ------
// Result
// ------

/// A structure to contain the symmetry detection results of one structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureSymmetryResult {
    /// The name of the structure.
    pub name: String,

    /// The shift applied by preprocessing to centre the map.
    pub centre_shift: Vector3<f64>,

    /// The sampling used for this structure.
    pub sampling: ResolvedSampling,

    /// Every peak found in the self-rotation function.
    pub peaks: Vec<AxisPeak>,

    /// The detected cyclic axes and the point-group hypotheses built from them.
    pub classification: SymmetryClassification,

    /// The recommended symmetry.
    pub recommendation: SymmetryRecommendation,

    /// The elements of the recommended group, if requested and if a group was recommended.
    pub group_elements: Option<GroupElementOutcome>,
}

impl StructureSymmetryResult {
    /// Returns all detected cyclic axes.
    #[must_use]
    pub fn all_cs(&self) -> &[SymmetryAxisCandidate] {
        &self.classification.all_cs
    }

    /// Returns every perpendicular (principal, twofold) pair of cyclic-axis indices.
    #[must_use]
    pub fn d_axes(&self) -> &[[usize; 2]] {
        &self.classification.d_axes
    }

    /// Returns the indices of the cyclic axes supporting tetrahedral symmetry.
    #[must_use]
    pub fn t_axes(&self) -> &[usize] {
        &self.classification.t_axes
    }

    /// Returns the indices of the cyclic axes supporting octahedral symmetry.
    #[must_use]
    pub fn o_axes(&self) -> &[usize] {
        &self.classification.o_axes
    }

    /// Returns the indices of the cyclic axes supporting icosahedral symmetry.
    #[must_use]
    pub fn i_axes(&self) -> &[usize] {
        &self.classification.i_axes
    }
}

impl fmt::Display for StructureSymmetryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Structure: {}", self.name)?;
        writeln!(
            f,
            "Centre shift: ({})",
            self.centre_shift.iter().map(|x| format!("{x:+.3}")).join(", ")
        )?;
        writeln!(f)?;
        write!(f, "{}", self.sampling)?;
        writeln!(f)?;

        write_subtitle(f, "Detected cyclic axes")?;
        writeln!(f, "{}", "┈".repeat(46))?;
        writeln!(
            f,
            "{:>3} {:>4} {:>9} {:>9} {:>9} {:>8}",
            "#", "Fold", "x", "y", "z", "Height"
        )?;
        writeln!(f, "{}", "┈".repeat(46))?;
        for (i, c) in self.all_cs().iter().enumerate() {
            writeln!(
                f,
                "{i:>3} {:>4} {:>+9.4} {:>+9.4} {:>+9.4} {:>8.4}",
                c.fold, c.axis[0], c.axis[1], c.axis[2], c.height
            )?;
        }
        writeln!(f, "{}", "┈".repeat(46))?;
        writeln!(f)?;

        write_subtitle(f, "Point-group hypotheses")?;
        for hypothesis in self.classification.hypotheses.iter() {
            writeln!(f, "{hypothesis}")?;
        }
        writeln!(f)?;

        write!(f, "{}", self.recommendation)?;
        if let Some(elements) = self.group_elements.as_ref() {
            writeln!(f)?;
            writeln!(f, "Group elements: {elements}")?;
            for (i, element) in elements.elements().to_row_major().iter().enumerate() {
                writeln!(
                    f,
                    "{i:>4}  {}",
                    element.iter().map(|x| format!("{x:+.4}")).join(" ")
                )?;
            }
        }
        Ok(())
    }
}

/// A structure to contain the symmetry detection results of a batch of structures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymmetryDetectionResult {
    /// The control parameters used to obtain this set of results.
    pub parameters: SymmetryDetectionParams,

    /// The results of each structure, in input order.
    pub structures: Vec<StructureSymmetryResult>,
}

// ------
// Driver
// ------

/// A driver for symmetry detection.
#[derive(Clone, Builder)]
pub struct SymmetryDetectionDriver<'a> {
    /// The control parameters for symmetry detection.
    parameters: &'a SymmetryDetectionParams,

    /// The supplier of processed maps.
    source: &'a dyn StructureSource,

    /// The result of the symmetry detection.
    #[builder(setter(skip), default = "None")]
    result: Option<SymmetryDetectionResult>,
}

impl<'a> SymmetryDetectionDriver<'a> {
    /// Returns a builder to construct a [`SymmetryDetectionDriver`] structure.
    pub fn builder() -> SymmetryDetectionDriverBuilder<'a> {
        SymmetryDetectionDriverBuilder::default()
    }

    /// Executes symmetry detection over every structure in turn.
    fn detect_symmetry(&mut self) -> Result<(), anyhow::Error> {
        log_title("Map Symmetry Detection");
        mapsym_output!("");
        let params = self.parameters;
        params.log_output_display();

        let n_structures = self.source.n_structures();
        if let Err(err) = check_symmetry_params(params, n_structures) {
            mapsym_error!("Symmetry detection cannot start with the supplied parameters:");
            mapsym_error!("  {err}");
            return Err(err.into());
        }
        let requested = params.requested()?;

        let mut structures = Vec::with_capacity(n_structures);
        for index in 0..n_structures {
            let structure = self.source.read_structure(index, params)?;
            let section = format!("Structure {} ({})", index + 1, structure.name);
            log_macsec_begin(&section);
            mapsym_output!("");
            let result = detect_structure_symmetry(&structure, params, requested.as_ref())
                .map_err(|err| {
                    mapsym_error!(
                        "Symmetry detection of {} has failed with error:",
                        structure.name
                    );
                    mapsym_error!("  {err}");
                    err
                })?;
            result.log_output_display();
            log_macsec_end(&section);
            mapsym_output!("");
            structures.push(result);
        }

        report_symmetry_results(&structures);

        let result = SymmetryDetectionResult {
            parameters: params.clone(),
            structures,
        };
        if let Some(name) = params.result_save_name.as_ref() {
            write_mapsym_binary(name, MapSymFileType::Sym, &result)?;
            mapsym_output!(
                "Symmetry detection results saved as {name}.{}.",
                MapSymFileType::Sym.ext()
            );
            mapsym_output!("");
        }
        self.result = Some(result);
        Ok(())
    }
}

impl MapSymDriver for SymmetryDetectionDriver<'_> {
    type Params = SymmetryDetectionParams;

    type Outcome = SymmetryDetectionResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No symmetry detection results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.detect_symmetry()
    }
}

// =========
// Functions
// =========

/// Checks the parameters before any computation.
///
/// # Arguments
///
/// * `params` - The parameters to check.
/// * `n_structures` - The number of input structures.
///
/// # Errors
///
/// Errors with the code of the first problem found.
pub fn check_symmetry_params(
    params: &SymmetryDetectionParams,
    n_structures: usize,
) -> Result<(), MapSymError> {
    if n_structures == 0 {
        return Err(MapSymError::configuration(
            ES_NO_STRUCTURES,
            "There is no input structure for symmetry detection.",
        ));
    }
    if !(params.axis_comparison_threshold >= 0.0) {
        return Err(MapSymError::configuration(
            ES_NEGATIVE_AXIS_TOLERANCE,
            format!(
                "The axis comparison threshold must not be negative, but {} was supplied.",
                params.axis_comparison_threshold
            ),
        ));
    }
    if !(params.resolution.is_finite() && params.resolution > 0.0) {
        return Err(MapSymError::configuration(
            ES_INVALID_RESOLUTION,
            format!(
                "The resolution must be positive, but {} was supplied.",
                params.resolution
            ),
        ));
    }
    let invalid = [
        (
            !(0.0..=1.0).contains(&params.missing_peak_threshold),
            "missing peak threshold must lie in [0, 1]",
        ),
        (
            !params.minimum_peak_for_axis.is_finite(),
            "minimum peak height for an axis must be finite",
        ),
        (
            !(params.peak_height_tolerance >= 0.0),
            "peak height tolerance must not be negative",
        ),
        (
            params.peak_iqr_threshold.is_nan(),
            "peak IQR threshold must be a number",
        ),
        (
            params.sphere_distance.is_nan() || params.sphere_distance < 0.0,
            "shell spacing must not be negative",
        ),
        (
            params.max_symmetry_fold < 2,
            "largest fold must be at least 2",
        ),
        (
            params.max_symmetry_fold > MAX_SYMMETRY_FOLD,
            "largest fold must not exceed 120, the largest dihedral fold that can be generated",
        ),
        (
            params.peak_neighbours == 0,
            "peak neighbourhood must be at least 1",
        ),
        (
            params.group_closure_max_passes == 0,
            "number of closure passes must be at least 1",
        ),
        (
            params.rotation_grid_oversampling == 0,
            "rotation grid oversampling must be at least 1",
        ),
    ];
    if let Some((_, description)) = invalid.iter().find(|(bad, _)| *bad) {
        return Err(MapSymError::configuration(
            ES_INVALID_THRESHOLD,
            format!("The {description}."),
        ));
    }
    params.requested()?;
    Ok(())
}

/// Runs the detection pipeline on one structure.
///
/// The map is sampled on shells, expanded in spherical harmonics, turned into a self-rotation
/// function, searched for peaks, and the peaks are classified into point groups from which a
/// recommendation is made. Every intermediate buffer is owned by this call and released when it
/// returns.
///
/// # Arguments
///
/// * `structure` - The processed structure.
/// * `params` - The detection parameters.
/// * `requested` - The interpreted requested symmetry, if any.
///
/// # Errors
///
/// Errors if the sampling cannot be resolved for the map or if a buffer cannot be allocated.
pub fn detect_structure_symmetry(
    structure: &ProcessedStructure,
    params: &SymmetryDetectionParams,
    requested: Option<&RequestedSymmetry>,
) -> Result<StructureSymmetryResult, MapSymError> {
    log::debug!("Detecting the symmetry of {}...", structure.name);
    let sampling = ResolvedSampling::resolve(&structure.map, &params.sampling_settings())?;
    let coefficients = {
        let shells = sample_shells(&structure.map, &sampling);
        compute_harmonics(&shells, sampling.bandwidth)?
    };
    let grid = RotationFunctionGrid::compute(
        &coefficients,
        sampling.integration_order,
        params.rotation_grid_oversampling,
    )?;
    let folds = folds_to_scan(params.max_symmetry_fold, params.prime_folds_only);
    let peaks = detect_peaks(&grid, &folds, &params.peak_search_settings());
    let classification = classify(&peaks, Some(&grid), &params.classification_settings());
    let recommendation = recommend(&classification, requested, params.peak_height_tolerance);
    let group_elements = if params.write_group_elements {
        recommended_group_elements(&classification, &recommendation, params)
    } else {
        None
    };
    log::debug!("Detecting the symmetry of {}... Done.", structure.name);
    Ok(StructureSymmetryResult {
        name: structure.name.clone(),
        centre_shift: structure.centre_shift,
        sampling,
        peaks,
        classification,
        recommendation,
        group_elements,
    })
}

/// Generates the elements of the recommended group.
///
/// A dihedral group is expanded from the stored perpendicular pair matching the recommended
/// axes; any other group, or a dihedral group without such a pair, is expanded from the
/// idealised generators of its hypothesis.
///
/// # Returns
///
/// The outcome of the generation, or `None` if no group was recommended.
#[must_use]
pub fn recommended_group_elements(
    classification: &SymmetryClassification,
    recommendation: &SymmetryRecommendation,
    params: &SymmetryDetectionParams,
) -> Option<GroupElementOutcome> {
    let SymmetryRecommendation::Found {
        kind,
        axes,
        hypothesis,
        ..
    } = recommendation
    else {
        return None;
    };
    let tol = params.axis_comparison_threshold;
    let passes = params.group_closure_max_passes;
    if let PointGroupKind::Dihedral(_) = kind {
        if let Some(pair) =
            select_recommended_d_pair(&classification.all_cs, &classification.d_axes, axes, tol)
        {
            return Some(dihedral_group_elements(
                &classification.all_cs,
                pair,
                tol,
                passes,
            ));
        }
        log::debug!("No stored perpendicular pair matches the recommended dihedral axes.");
    }
    let generators: Vec<Matrix3<f64>> = classification
        .hypotheses
        .get(*hypothesis)?
        .generators
        .iter()
        .map(|(fold, axis)| proper_rotation_matrix(TAU / f64::from(*fold), axis, 1))
        .collect();
    Some(generate_group_elements(kind, &generators, tol, passes))
}

/// Logs a summary table of the recommended symmetry of every structure.
pub fn report_symmetry_results(results: &[StructureSymmetryResult]) {
    log_subtitle("Symmetry detection summary");
    mapsym_output!("");
    mapsym_output!("{}", "┈".repeat(64));
    mapsym_output!(
        "{:<24} {:>6} {:>8} {:>8} {:>14}",
        "Structure",
        "Type",
        "Fold(s)",
        "Score",
        "Cyclic axes"
    );
    mapsym_output!("{}", "┈".repeat(64));
    for result in results {
        let (tag, folds, score) = match &result.recommendation {
            SymmetryRecommendation::Found { kind, score, .. } => (
                kind.type_tag().to_string(),
                result.recommendation.folds().iter().join(","),
                format!("{score:.4}"),
            ),
            SymmetryRecommendation::NotFound { .. } => {
                ("-".to_string(), "-".to_string(), "-".to_string())
            }
        };
        mapsym_output!(
            "{:<24} {:>6} {:>8} {:>8} {:>14}",
            result.name,
            tag,
            folds,
            score,
            result.all_cs().len()
        );
    }
    mapsym_output!("{}", "┈".repeat(64));
    mapsym_output!("");
}
