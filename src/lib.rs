#![doc = "onbase-export: convert an OnBase disk dump into per-document files and metadata tables."]

//! The pipeline runs in three strictly sequential phases over one `Vec<Document>`:
//!
//! 1. [`import`] parses the dump text into documents, renaming duplicate handles.
//! 2. [`combine`] produces one artifact per document (copy or multi-page PDF).
//! 3. [`export`] writes the metadata table as CSV and/or Excel.
//!
//! [`convert`] wires the phases together from a [`config::Config`]; [`cli`] is the binary's front end.

pub mod cli;
pub mod combine;
pub mod config;
pub mod contract;
pub mod convert;
pub mod document;
pub mod export;
pub mod images_to_pdf;
pub mod import;
pub mod load_config;
pub mod schema;

pub use cli::{run, Cli, Commands};
