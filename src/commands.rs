//! Entry points behind the command-line subcommands

use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use clap::ArgMatches;
use log::{debug, warn};

use crate::cli::{check_for_stdout_stream, conversion_formats, conversion_options};
use crate::config::Settings;
use crate::convert::{default_output_path, run_conversion};
use crate::formats::{Format, SOURCE_FORMATS, supported_targets};
use crate::logging::{notice_line, success_line};
use crate::menu::run_menu;
use crate::tools::Tools;
use crate::translate::{GoogleTranslator, default_translation_path, translate_file};

/// Dispatch to the subcommand, or start the interactive menu without one
///
/// # Errors
/// Returns the error of the failed conversion, translation or listing
pub fn run_command(matches: &ArgMatches, settings: &Settings) -> Result<()> {
    match matches.subcommand() {
        Some(("convert", sub)) => convert(sub, settings),
        Some(("translate", sub)) => translate(sub, settings),
        Some(("formats", sub)) => list_formats(sub, &mut io::stdout()),
        _ => interactive(settings),
    }
}

fn input_path(matches: &ArgMatches) -> Result<PathBuf> {
    matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Input path is required"))
}

fn convert(matches: &ArgMatches, settings: &Settings) -> Result<()> {
    let input = input_path(matches)?;
    let (source, target) = conversion_formats(matches, &input)?;
    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_path(&input, target));
    let options = conversion_options(matches, settings)?;
    debug!("Options: {options:?}");

    let result = run_conversion(source, target, &input, &output, &options)?;
    println!(
        "{}",
        success_line(&format!("Converted successfully: {}", result.path.display()))
    );
    for extra in &result.extras {
        println!("Also wrote: {}", extra.display());
    }
    for note in &result.notes {
        println!("{}", notice_line(note));
    }
    // The process is about to exit, so wait for the scheduled removals
    for handle in result.cleanup {
        if handle.join().is_err() {
            warn!("A cleanup thread panicked");
        }
    }
    Ok(())
}

fn translate(matches: &ArgMatches, settings: &Settings) -> Result<()> {
    let input = input_path(matches)?;
    if !input.is_file() {
        return Err(anyhow!("Input file not found: {}", input.display()));
    }
    let defaults = &settings.translate;
    let source = matches
        .get_one::<String>("src")
        .unwrap_or(&defaults.source);
    let target = matches
        .get_one::<String>("dest")
        .unwrap_or(&defaults.target);
    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_translation_path(&input));

    let translator = GoogleTranslator::from_settings(defaults)?;
    let tools = Tools::new(settings.tools.clone());
    let chars = translate_file(
        &translator,
        &input,
        &output,
        source,
        target,
        defaults.chunk_size,
        &tools,
    )?;
    debug!("Wrote {chars} translated characters");
    println!(
        "{}",
        success_line(&format!("Translated successfully: {}", output.display()))
    );
    Ok(())
}

/// Print the conversion table, one source format per line
///
/// # Errors
/// Returns an error for an unknown source format or a failed write
pub fn list_formats<W: Write>(matches: &ArgMatches, writer: &mut W) -> Result<()> {
    let sources: Vec<Format> = match matches.get_one::<String>("source") {
        Some(source) => vec![Format::from_str(source)?],
        None => SOURCE_FORMATS.to_vec(),
    };
    for source in sources {
        let targets: Vec<String> = supported_targets(source)
            .iter()
            .map(|target| target.to_string())
            .collect();
        writeln!(writer, "{source} → {}", targets.join(", "))?;
    }
    Ok(())
}

fn interactive(settings: &Settings) -> Result<()> {
    let translator = GoogleTranslator::from_settings(&settings.translate)?;
    let stdin = io::stdin();
    run_menu(stdin.lock(), io::stdout(), settings, &translator)?;
    check_for_stdout_stream();
    Ok(())
}
