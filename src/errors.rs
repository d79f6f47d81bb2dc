use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

use image::ImageError;

/// Custom error type for the File Toolkit application
#[derive(Debug)]
pub enum Error {
    /// Error related to file operations
    FileOperation {
        source: io::Error,
        path: PathBuf,
        operation: String,
    },
    /// No converter is registered for the source/target pair
    UnsupportedConversion { from: String, to: String },
    /// A format name or extension that is not recognised
    UnknownFormat { value: String },
    /// Input that exists but cannot be used for the requested conversion
    InvalidInput { path: PathBuf, detail: String },
    /// An external program (LibreOffice, pdftoppm, tesseract) is not installed
    ToolMissing { tool: String },
    /// An external program ran but failed
    ExternalTool { tool: String, detail: String },
    /// Error while parsing an input document
    Parsing { format: String, detail: String },
    /// Error raised by the image codec
    Image { source: ImageError },
    /// Error while reading or writing a PDF
    Pdf { detail: String },
    /// Error while reading or writing a workbook
    Spreadsheet { detail: String },
    /// Error while reading or writing a word-processing document
    Document { detail: String },
    /// Error from the translation service
    Translation { detail: String },
    /// The input holds no table that can be exported
    NoTable { path: PathBuf },
    /// Generic error with a message
    Generic { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileOperation {
                path, operation, ..
            } => {
                write!(f, "Failed to {} file: {}", operation, path.display())
            }
            Error::UnsupportedConversion { from, to } => {
                write!(f, "Conversion not supported: {from} → {to}")
            }
            Error::UnknownFormat { value } => {
                write!(f, "Unknown format: {value}")
            }
            Error::InvalidInput { path, detail } => {
                write!(f, "Invalid input {}: {}", path.display(), detail)
            }
            Error::ToolMissing { tool } => {
                write!(
                    f,
                    "{tool} not found. Install it and make sure it is on PATH, or set its path under `tools` in the configuration."
                )
            }
            Error::ExternalTool { tool, detail } => {
                write!(f, "{tool} failed: {detail}")
            }
            Error::Parsing { format, detail } => {
                write!(f, "Failed to parse {format}: {detail}")
            }
            Error::Image { source } => {
                write!(f, "Image processing failed: {source}")
            }
            Error::Pdf { detail } => {
                write!(f, "PDF error: {detail}")
            }
            Error::Spreadsheet { detail } => {
                write!(f, "Spreadsheet error: {detail}")
            }
            Error::Document { detail } => {
                write!(f, "Document error: {detail}")
            }
            Error::Translation { detail } => {
                write!(f, "Translation failed: {detail}")
            }
            Error::NoTable { path } => {
                write!(f, "No table found in {}", path.display())
            }
            Error::Generic { message } => {
                write!(f, "{message}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::FileOperation { source, .. } => Some(source),
            Error::Image { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::FileOperation {
            source: err,
            path: PathBuf::new(),
            operation: "perform operation on".to_string(),
        }
    }
}

impl From<ImageError> for Error {
    fn from(err: ImageError) -> Self {
        Error::Image { source: err }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Parsing {
            format: "CSV".to_string(),
            detail: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parsing {
            format: "JSON".to_string(),
            detail: err.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::Spreadsheet {
            detail: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Generic {
            message: format!("Archive error: {err}"),
        }
    }
}

/// Custom Result type for the File Toolkit application
///
/// # Examples
/// ```
/// use file_toolkit::prelude::{Result, generic_error};
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
///
///     // Or return an error
///     // Err(generic_error("Something went wrong"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Helper function to create a file operation error
pub fn file_operation_error(err: io::Error, path: PathBuf, operation: &str) -> Error {
    Error::FileOperation {
        source: err,
        path,
        operation: operation.to_string(),
    }
}

/// Helper function to create an unsupported conversion error
pub fn unsupported_conversion_error(from: &str, to: &str) -> Error {
    Error::UnsupportedConversion {
        from: from.to_string(),
        to: to.to_string(),
    }
}

/// Helper function to create an unknown format error
pub fn unknown_format_error(value: &str) -> Error {
    Error::UnknownFormat {
        value: value.to_string(),
    }
}

/// Helper function to create an invalid input error
pub fn invalid_input_error(path: PathBuf, detail: &str) -> Error {
    Error::InvalidInput {
        path,
        detail: detail.to_string(),
    }
}

/// Helper function to create a missing tool error
pub fn tool_missing_error(tool: &str) -> Error {
    Error::ToolMissing {
        tool: tool.to_string(),
    }
}

/// Helper function to create an external tool error
pub fn external_tool_error(tool: &str, detail: &str) -> Error {
    Error::ExternalTool {
        tool: tool.to_string(),
        detail: detail.to_string(),
    }
}

/// Helper function to create a parsing error
pub fn parsing_error(format: &str, detail: &str) -> Error {
    Error::Parsing {
        format: format.to_string(),
        detail: detail.to_string(),
    }
}

/// Helper function to create a PDF error
pub fn pdf_error(detail: &str) -> Error {
    Error::Pdf {
        detail: detail.to_string(),
    }
}

/// Helper function to create a spreadsheet error
pub fn spreadsheet_error(detail: &str) -> Error {
    Error::Spreadsheet {
        detail: detail.to_string(),
    }
}

/// Helper function to create a document error
pub fn document_error(detail: &str) -> Error {
    Error::Document {
        detail: detail.to_string(),
    }
}

/// Helper function to create a translation error
pub fn translation_error(detail: &str) -> Error {
    Error::Translation {
        detail: detail.to_string(),
    }
}

/// Helper function to create a no-table error
pub fn no_table_error(path: PathBuf) -> Error {
    Error::NoTable { path }
}

/// Helper function to create a generic error
pub fn generic_error(message: &str) -> Error {
    Error::Generic {
        message: message.to_string(),
    }
}
