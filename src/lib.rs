//! File Toolkit
//!
//! Converts documents between CSV, XLSX, TXT, JSON, DOCX, PDF and raster
//! image formats, recognises text in scans and translates documents.
//! The `ftk` binary offers the same operations as subcommands and as an
//! interactive menu.

pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod convert;
pub mod errors;
pub mod fonts;
pub mod formats;
pub mod logging;
pub mod menu;
pub mod ocr;
pub mod render;
pub mod script;
pub mod tools;
pub mod translate;
pub mod utils;

pub mod prelude {
    pub use crate::cli::{build_cli, get_config_path, get_log_file, get_matches, get_verbosity};
    pub use crate::commands::run_command;
    pub use crate::config::{Settings, load_or_default, load_settings};
    pub use crate::convert::{
        ConversionOptions, ConversionOutput, default_output_path, run_conversion,
    };
    pub use crate::errors::{
        document_error, external_tool_error, file_operation_error, generic_error,
        invalid_input_error, no_table_error, parsing_error, pdf_error, spreadsheet_error,
        tool_missing_error, translation_error, unknown_format_error, unsupported_conversion_error,
    };
    pub use crate::errors::{Error, Result};
    pub use crate::formats::{Format, Target, infer_format, menu_entries, supported_targets};
    pub use crate::logging::{
        LogLevel, failure_line, format_message, init_default_logger, init_logger, notice_line,
        success_line,
    };
    pub use crate::menu::{SessionStats, run_menu};
    pub use crate::translate::{GoogleTranslator, Translator, translate_file};
}
