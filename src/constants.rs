/// Constants used throughout the application
///
/// This module centralises the identifiers, CLI help strings and layout
/// defaults so they are easier to manage and update.

/// Qualifier string used for application identification
pub const QUALIFIER: &str = "com";

/// Organisation name used for application identification
pub const ORGANIZATION: &str = "Ondřej Vágner";

/// Application name used for identification
///
/// Used for the configuration directory and the log file location.
pub const APPLICATION: &str = "file_toolkit";

/// Help text for the config command-line option
pub const CONFIG_HELP: &str = "Read settings from a specific config file";

/// Help text for the verbose command-line option
pub const VERBOSE_HELP: &str = "Increase verbosity level (can be used multiple times)";

/// Help text for the log-file command-line option
pub const LOG_FILE_HELP: &str = "Write the log to this file as well";

/// Help text for the log-locally command-line option
pub const LOCAL_LOGGING_HELP: &str =
    "Keep the log file in the current directory instead of the config directory";

/// Default path for the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Default log file name
pub const LOG_FILE_DEFAULT: &str = "file_toolkit.log";

/// Default source language for translation
pub const DEFAULT_SOURCE_LANG: &str = "auto";

/// Default target language for translation
pub const DEFAULT_TARGET_LANG: &str = "en";

/// Public Google Translate endpoint used without an API key
pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Largest piece of text sent in one translation request
pub const TRANSLATE_CHUNK_CHARS: usize = 4000;

/// Seconds before a scheduled output is removed
pub const DEFAULT_DELETE_AFTER_SECS: u64 = 300;

/// Row separator used when table rows are rendered as text lines
pub const ROW_SEPARATOR: &str = " | ";

/// Hard line length for tabular rows in PDF output
pub const PDF_TABLE_CHUNK_CHARS: usize = 180;

/// Tabular text renders switch to split mode above this many lines
pub const TABLE_LINES_PER_IMAGE: usize = 60;

/// JSON text is cut into chunks of this many lines in split mode
pub const JSON_LINES_PER_IMAGE: usize = 30;

/// Plain text up to this many lines always becomes a single image
pub const TXT_SINGLE_IMAGE_LINES: usize = 20;

/// Rendered images taller than this are reported as risky
pub const MAX_SAFE_IMAGE_HEIGHT: u32 = 30_000;

/// PDF→CSV logs progress every this many rows
pub const PROGRESS_EVERY_ROWS: usize = 1000;

/// Notice shown when a CSV holds non-ASCII text
pub const EXCEL_UTF8_NOTICE: &str = "The CSV contains non-English text. If Excel shows garbled characters, \
import it through Data → From Text/CSV and choose File Origin: 65001 : Unicode (UTF-8).";
