//! User interface module - interaction (prompts) and formatting.
//!
//! Prompts are generic over their input and output so the release engine can be driven from a
//! terminal while tests feed them in-memory buffers.

use std::io::{BufRead, Write};

use anyhow::Result;
use console::style;

use crate::domain::{ReleaseKind, ReleaseVersion};

pub mod formatter;

pub use formatter::{
    display_error, display_latest, display_plan, display_status, display_success, format_error,
    format_plan,
};

/// Asks for the first version until a valid `MAJOR.MINOR.PATCH` is entered.
///
/// # Returns
/// * `Ok(Some(version))` - A valid version was entered
/// * `Ok(None)` - Input ended before a valid version was entered
/// * `Err` - If reading or writing fails
pub fn prompt_initial_version<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<Option<ReleaseVersion>> {
    loop {
        write!(
            output,
            "There are no versions yet. Please, input an initial one: "
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(None);
        }

        match ReleaseVersion::parse(&line) {
            Ok(version) => return Ok(Some(version)),
            Err(e) => writeln!(output, "{}", format_error(&e.to_string()))?,
        }
    }
}

/// Asks to confirm a release. Default is "no".
///
/// # Returns
/// * `Ok(true)` - If user entered "y" or "yes"
/// * `Ok(false)` - Otherwise (including Enter and end of input)
pub fn confirm_release<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    kind: ReleaseKind,
    version: &ReleaseVersion,
) -> Result<bool> {
    write!(
        output,
        "Release {} version {}? (y/N): ",
        kind,
        style(version).green().bold()
    )?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
