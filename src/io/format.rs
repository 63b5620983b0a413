//! Formatting of the user-facing detection report.

use std::fmt;

use log;

const MAPSYM_BANNER_LENGTH: usize = 91;

/// Logs an error to the default logger and to the `mapsym-output` logger.
macro_rules! mapsym_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "mapsym-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `mapsym-output` logger.
macro_rules! mapsym_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "mapsym-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `mapsym-output` logger.
macro_rules! mapsym_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "mapsym-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {mapsym_error, mapsym_output, mapsym_warn};

/// Logs a nicely formatted section title to the `mapsym-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(MAPSYM_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    mapsym_output!("┌──{bar}──┐");
    mapsym_output!("│§ {title:^length$} §│");
    mapsym_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let bar = "═".repeat(subtitle.chars().count());
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `mapsym-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let bar = "═".repeat(subtitle.chars().count());
    mapsym_output!("{}", subtitle);
    mapsym_output!("{}", bar);
}

/// Logs the beginning of a per-structure section to the `mapsym-output` logger.
pub(crate) fn log_macsec_begin(sectitle: &str) {
    let width = MAPSYM_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    mapsym_output!("❬❬❬❬❬ [Begin] {sectitle_space:❬<width$}");
}

/// Logs the end of a per-structure section to the `mapsym-output` logger.
pub(crate) fn log_macsec_end(sectitle: &str) {
    let width = MAPSYM_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    mapsym_output!("❭❭❭❭❭ [ End ] {sectitle_space:❭<width$}");
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging report blocks line by line.
pub(crate) trait MapSymOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            mapsym_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> MapSymOutput for T where T: fmt::Debug + fmt::Display {}
