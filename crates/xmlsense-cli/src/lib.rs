//! xmlsense CLI - Command-line interface library
//!
//! This library provides the CLI functionality for xmlsense, including:
//! - Format: print or rewrite formatted XML
//! - Check: report files whose formatting would change
//! - Tree: dump the tolerant parse tree as JSON
//!
//! # Library Usage
//!
//! ```ignore
//! use xmlsense_cli::{run_cli, check_files, load_settings};
//!
//! // Run the full CLI
//! run_cli();
//!
//! // Or use individual commands programmatically
//! let settings = load_settings(None)?;
//! let reports = check_files(&paths, &settings)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Print a formatted file
//! xmlsense format pom.xml
//!
//! # Rewrite every XML file under docs/
//! xmlsense format 'docs/**/*.xml' --write
//!
//! # Fail a CI job when a file is not formatted
//! xmlsense check 'src/**/*.xml' --format json
//!
//! # Inspect the parse tree of a DTD
//! xmlsense tree schema.ent --dtd
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    check_command, check_files, expand_inputs, format_command, format_file, load_settings,
    tree_command, tree_json,
};
pub use app::{run_cli, FileReport, FormattedFile, OutputFormat};
