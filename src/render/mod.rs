//! Output writers shared by the converters
//!
//! Converters read their input into a [`table::Table`], a list of lines or a
//! JSON value, and hand it to one of these writers.

pub mod archive;
pub mod docx;
pub mod pdf;
pub mod raster;
pub mod sheet;
pub mod table;

pub use table::Table;
