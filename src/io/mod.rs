//! Persistence of detection results and parameters, and logging set-up.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{self, format_err};
use bincode;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::{de::DeserializeOwned, Serialize};
use serde_yaml;

pub(crate) mod format;


/// An enumerated type for `MapSym` file types.
pub enum MapSymFileType {
    /// Variant for binary files containing symmetry-detection results.
    Sym,
}

impl MapSymFileType {
    /// Returns the extension of the file type.
    pub fn ext(&self) -> String {
        match self {
            MapSymFileType::Sym => "mapsym.sym".to_string(),
        }
    }
}

/// Reads a `MapSym` binary file and deserialises it into an appropriate structure.
///
/// # Arguments
///
/// * `name` - The name of the file to be read in (without `MapSym`-specific extensions).
/// * `file_type` - The type of the `MapSym` file to be read in.
///
/// # Returns
///
/// A `Result` containing the structure deserialised from the read-in file.
pub fn read_mapsym_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: MapSymFileType,
) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut reader = BufReader::new(File::open(path).map_err(|err| format_err!(err))?);
    bincode::deserialize_from(&mut reader).map_err(|err| format_err!(err))
}

/// Serialises a structure and writes into a `MapSym` binary file.
///
/// # Arguments
///
/// * `name` - The name of the file to be written (without `MapSym`-specific extensions).
/// * `file_type` - The type of the `MapSym` file to be written.
///
/// # Returns
///
/// A `Result` indicating if the serialisation and writing processes have been successful.
pub fn write_mapsym_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: MapSymFileType,
    value: &T,
) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, value).map_err(|err| format_err!(err))
}

/// Reads a YAML file of parameters and deserialises it into an appropriate structure.
///
/// # Arguments
///
/// * `name` - The name of the file to be read in (with its `.yml` or `.yaml` extension).
pub fn read_mapsym_yaml<T, P: AsRef<Path>>(name: P) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut reader = BufReader::new(File::open(name).map_err(|err| format_err!(err))?);
    serde_yaml::from_reader(&mut reader).map_err(|err| format_err!(err))
}

/// Serialises a structure and writes it into a YAML file.
///
/// # Arguments
///
/// * `name` - The name of the YAML file to be written (without extensions). The resulting file
/// will have the `.yml` extension.
pub fn write_mapsym_yaml<T, P: AsRef<Path>>(name: P, value: &T) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension("yml");
    let mut writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(&mut writer, value).map_err(|err| format_err!(err))
}

/// Initialises logging from a `log4rs` YAML configuration file.
///
/// The detection report is emitted on the `mapsym-output` target, so a configuration would
/// normally route that target to its own appender.
pub fn init_logging_from_file<P: AsRef<Path>>(config: P) -> Result<(), anyhow::Error> {
    log4rs::init_file(config, Default::default()).map_err(|err| format_err!(err))
}

/// Initialises logging so that the detection report is written to one file and diagnostics at
/// or above `level` to another.
///
/// # Arguments
///
/// * `output_path` - The file receiving the `mapsym-output` report.
/// * `diagnostics_path` - The file receiving every other log record.
/// * `level` - The lowest level of diagnostics to keep.
pub fn init_logging_to_files<P: AsRef<Path>>(
    output_path: P,
    diagnostics_path: P,
    level: LevelFilter,
) -> Result<(), anyhow::Error> {
    let output = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build(output_path)?;
    let diagnostics = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}",
        )))
        .build(diagnostics_path)?;
    let config = Config::builder()
        .appender(Appender::builder().build("output", Box::new(output)))
        .appender(Appender::builder().build("diagnostics", Box::new(diagnostics)))
        .logger(
            Logger::builder()
                .appender("output")
                .additive(false)
                .build("mapsym-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("diagnostics").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}
