use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use atty::Stream;
use clap::{
    Arg, ArgAction, ArgMatches, Command, command, crate_authors, crate_description, crate_name,
    crate_version,
};

use crate::config::Settings;
use crate::constants::{
    CONFIG_HELP, DEFAULT_CONFIG_PATH, LOCAL_LOGGING_HELP, LOG_FILE_DEFAULT, LOG_FILE_HELP,
    VERBOSE_HELP,
};
use crate::convert::{ConversionOptions, DocxPdfMode};
use crate::errors::{Result, generic_error};
use crate::formats::{Format, Target, infer_format};
use crate::logging::LogLevel;
use crate::utils::find_project_folder;

/// Checks if stdout is a terminal and waits for user input if it is
///
/// This function is used to prevent the console window from closing
/// immediately after the program finishes when run from a GUI.
pub fn check_for_stdout_stream() {
    if atty::is(Stream::Stdout) {
        dont_disappear::enter_to_continue::default();
    }
}

fn convert_command() -> Command {
    Command::new("convert")
        .about("Convert a file to another format")
        .arg(Arg::new("input").value_name("INPUT").required(true))
        .arg(
            Arg::new("to")
                .short('t')
                .long("to")
                .value_name("FORMAT")
                .required(true)
                .help("Target format, e.g. xlsx, png or \"txt ocr\""),
        )
        .arg(
            Arg::new("from")
                .short('f')
                .long("from")
                .value_name("FORMAT")
                .help("Source format; inferred from the extension when omitted"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Output path; defaults to the input name with the target extension"),
        )
        .arg(
            Arg::new("delimiter")
                .long("delimiter")
                .value_name("CHAR")
                .help("Column delimiter of delimited text, e.g. ',' or '\\t'"),
        )
        .arg(
            Arg::new("auto_delimiter")
                .long("auto-delimiter")
                .action(ArgAction::SetTrue)
                .help("Detect the delimiter of text input"),
        )
        .arg(
            Arg::new("sheet")
                .long("sheet")
                .value_name("NAME")
                .help("Workbook sheet to read"),
        )
        .arg(
            Arg::new("dpi")
                .long("dpi")
                .value_name("DPI")
                .value_parser(clap::value_parser!(u32))
                .help("Resolution for rasterising PDF pages"),
        )
        .arg(
            Arg::new("font_size")
                .long("font-size")
                .value_name("POINTS")
                .value_parser(clap::value_parser!(f32))
                .help("Font size of rendered output"),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .value_name("CODES")
                .help("OCR languages, e.g. \"en,hi\" or \"auto\""),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_parser(["auto", "image"])
                .help("DOCX → PDF rendering mode"),
        )
        .arg(
            Arg::new("split")
                .long("split")
                .action(ArgAction::SetTrue)
                .conflicts_with("single")
                .help("Split long image output into several images"),
        )
        .arg(
            Arg::new("single")
                .long("single")
                .action(ArgAction::SetTrue)
                .help("Render image output as one image"),
        )
        .arg(
            Arg::new("merge")
                .long("merge")
                .action(ArgAction::SetTrue)
                .conflicts_with("separate")
                .help("Merge document pages into one image"),
        )
        .arg(
            Arg::new("separate")
                .long("separate")
                .action(ArgAction::SetTrue)
                .help("Write one image per document page"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Skip PDF pages without table rows"),
        )
        .arg(
            Arg::new("xlsx_copy")
                .long("xlsx-copy")
                .action(ArgAction::SetTrue)
                .help("Also write an XLSX copy of CSV output"),
        )
        .arg(
            Arg::new("delete_after")
                .long("delete-after")
                .value_name("SECS")
                .value_parser(clap::value_parser!(u64))
                .help("Remove the output after this many seconds; the command waits until then"),
        )
}

fn translate_command() -> Command {
    Command::new("translate")
        .about("Translate the text of a TXT, PDF or DOCX file")
        .arg(Arg::new("input").value_name("INPUT").required(true))
        .arg(
            Arg::new("src")
                .long("src")
                .value_name("LANG")
                .help("Source language; defaults to the configured one"),
        )
        .arg(
            Arg::new("dest")
                .long("dest")
                .value_name("LANG")
                .help("Target language; defaults to the configured one"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Output path; defaults to <name>.translated.txt"),
        )
}

fn formats_command() -> Command {
    Command::new("formats")
        .about("List the supported conversions")
        .arg(Arg::new("source").value_name("SOURCE"))
}

/// Builds the command-line interface
///
/// Defines the global `config`, `verbose`, `log_file` and `log_locally`
/// arguments plus the `convert`, `translate` and `formats` subcommands.
/// Without a subcommand the interactive menu starts.
pub fn build_cli() -> Command {
    // define arg for reading from a specific config file
    let arg_config = Arg::new("config")
        .short('c')
        .long("config")
        .help(CONFIG_HELP)
        .global(true)
        .default_value(DEFAULT_CONFIG_PATH);

    // define arg for verbosity level
    let arg_verbose = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help(VERBOSE_HELP)
        .global(true)
        .action(ArgAction::Count);

    // define arg for log file
    let log_file = Arg::new("log_file")
        .short('l')
        .long("log-file")
        .help(LOG_FILE_HELP)
        .global(true);

    // define arg for local logging
    let log_locally = Arg::new("log_locally")
        .short('L')
        .long("log-locally")
        .help(LOCAL_LOGGING_HELP)
        .global(true)
        .action(ArgAction::SetTrue);

    command!()
        .author(crate_authors!())
        .about(crate_description!())
        .name(crate_name!())
        .version(crate_version!())
        .arg(arg_config)
        .arg(log_file)
        .arg(log_locally)
        .arg(arg_verbose)
        .subcommand(convert_command())
        .subcommand(translate_command())
        .subcommand(formats_command())
}

/// Parses the process arguments
pub fn get_matches() -> ArgMatches {
    build_cli().get_matches()
}

/// Gets the verbosity level from the command-line arguments
///
/// Counts the occurrences of the `verbose` flag: none is Info, one is Debug
/// and more is Trace.
///
/// # Examples
/// ```
/// # use file_toolkit::cli::{build_cli, get_verbosity};
/// # use file_toolkit::logging::LogLevel;
/// let matches = build_cli().get_matches_from(["ftk", "-v", "formats"]);
/// assert_eq!(get_verbosity(&matches), LogLevel::Debug);
/// ```
pub fn get_verbosity(matches: &ArgMatches) -> LogLevel {
    let verbose_count = matches.get_count("verbose");
    LogLevel::from_occurrences(verbose_count)
}

/// Gets the log file location, if logging to a file was requested
///
/// The file lives in the configuration directory unless `--log-locally`
/// is given.
///
/// # Errors
/// Returns an error if the configuration directory cannot be determined
pub fn get_log_file(matches: &ArgMatches) -> Result<Option<PathBuf>> {
    let log_locally = matches.get_flag("log_locally");
    let filename = match matches.get_one::<String>("log_file") {
        Some(name) => name.clone(),
        None if log_locally => LOG_FILE_DEFAULT.to_string(),
        None => return Ok(None),
    };
    if log_locally {
        Ok(Some(PathBuf::from(filename)))
    } else {
        let folder = find_project_folder()?;
        Ok(Some(folder.config_dir().join(filename)))
    }
}

/// Gets the configuration file argument
pub fn get_config_path(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Parses a delimiter argument; `\t` and `tab` name the tab character
///
/// # Errors
/// Returns an error unless the value is a single character
pub fn parse_delimiter(value: &str) -> Result<char> {
    match value {
        "\\t" | "tab" | "TAB" => return Ok('\t'),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(generic_error(&format!(
            "Delimiter must be a single character, got '{value}'"
        ))),
    }
}

/// Source and target formats of a `convert` invocation
///
/// # Errors
/// Returns an error for unknown formats or when the source cannot be inferred
pub fn conversion_formats(matches: &ArgMatches, input: &Path) -> Result<(Format, Target)> {
    let to = matches
        .get_one::<String>("to")
        .ok_or_else(|| generic_error("Target format is required"))?;
    let target = Target::from_str(to)?;
    let source = match matches.get_one::<String>("from") {
        Some(from) => Format::from_str(from)?,
        None => infer_format(input).ok_or_else(|| {
            generic_error(&format!(
                "Cannot infer the format of {}, pass --from",
                input.display()
            ))
        })?,
    };
    Ok((source, target))
}

/// Builds conversion options from `convert` arguments over the settings
///
/// # Errors
/// Returns an error for an invalid delimiter or mode
pub fn conversion_options(matches: &ArgMatches, settings: &Settings) -> Result<ConversionOptions> {
    let mut options = ConversionOptions::from_settings(settings);

    if let Some(delimiter) = matches.get_one::<String>("delimiter") {
        options.delimiter = Some(parse_delimiter(delimiter)?);
    }
    if matches.get_flag("auto_delimiter") {
        options.auto_delimiter = true;
    }
    options.sheet = matches.get_one::<String>("sheet").cloned();
    if let Some(dpi) = matches.get_one::<u32>("dpi") {
        options.dpi = *dpi;
    }
    options.font_size = matches.get_one::<f32>("font_size").copied();
    if let Some(lang) = matches.get_one::<String>("lang") {
        options.lang = lang.clone();
    }
    if let Some(mode) = matches.get_one::<String>("mode") {
        options.docx_mode = DocxPdfMode::from_str(mode)?;
    }

    options.split = flag_pair(matches, "split", "single");
    options.merge_pages = flag_pair(matches, "merge", "separate");
    options.strict_tables = matches.get_flag("strict");
    if matches.get_flag("xlsx_copy") {
        options.xlsx_copy = true;
    }
    if let Some(secs) = matches.get_one::<u64>("delete_after") {
        options.delete_after = Some(Duration::from_secs(*secs));
    }
    Ok(options)
}

/// `Some(true)` for `yes`, `Some(false)` for `no`, `None` to ask later
fn flag_pair(matches: &ArgMatches, yes: &str, no: &str) -> Option<bool> {
    if matches.get_flag(yes) {
        Some(true)
    } else if matches.get_flag(no) {
        Some(false)
    } else {
        None
    }
}
