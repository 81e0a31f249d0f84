//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use serde::Serialize;
use tracing::{debug, info};

use xmlsense_core::{apply_edits, parse, TextEdit};
use xmlsense_dom::{Dialect, Document, NodeId, NodeKind, Range, Span};
use xmlsense_lsp::config::{Settings, CONFIG_FILE_NAME};
use xmlsense_lsp::format_tree;

/// Output format for check reports
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for CI/CD integration
    Json,
}

#[derive(Parser)]
#[command(name = "xmlsense")]
#[command(author, version, about = "Tolerant XML formatter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format XML files, printing the result or rewriting them in place
    Format {
        /// Files or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Rewrite files in place instead of printing them
        #[arg(short, long)]
        write: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Parse every input as a standalone DTD
        #[arg(long)]
        dtd: bool,
    },

    /// Report files whose formatting would change (exits with 1 if any)
    Check {
        /// Files or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the parsed node tree as JSON
    Tree {
        /// Input file
        input: PathBuf,

        /// Parse the input as a standalone DTD
        #[arg(long)]
        dtd: bool,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Format {
            inputs,
            write,
            config,
            dtd,
        } => {
            format_command(&inputs, write, config.as_deref(), dtd)?;
        }
        Commands::Check {
            inputs,
            format,
            config,
        } => {
            if !check_command(&inputs, format, config.as_deref())? {
                std::process::exit(1);
            }
        }
        Commands::Tree { input, dtd } => {
            tree_command(&input, dtd)?;
        }
    }

    Ok(())
}

/// A file together with the edits that format it
#[derive(Debug, Clone)]
pub struct FormattedFile {
    pub path: PathBuf,
    pub source: String,
    pub edits: Vec<TextEdit>,
}

impl FormattedFile {
    pub fn formatted(&self) -> String {
        apply_edits(&self.source, &self.edits)
    }
}

/// Formatting status of one file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub edits: usize,
    /// One-based line and column of the first edit
    pub first_edit: Option<(u32, u32)>,
}

impl FileReport {
    pub fn is_formatted(&self) -> bool {
        self.edits == 0
    }
}

/// Execute the format command
pub fn format_command(
    inputs: &[String],
    write: bool,
    config: Option<&Path>,
    dtd: bool,
) -> Result<()> {
    let settings = load_settings(config)?;
    for path in expand_inputs(inputs)? {
        let file = format_file(&path, &settings, dtd)?;
        if !write {
            print!("{}", file.formatted());
            continue;
        }
        if file.edits.is_empty() {
            debug!("Already formatted: {}", path.display());
            continue;
        }
        fs::write(&path, file.formatted())
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        info!("Formatted {} ({} edits)", path.display(), file.edits.len());
    }
    Ok(())
}

/// Execute the check command
///
/// Returns whether every file is already formatted.
pub fn check_command(
    inputs: &[String],
    format: OutputFormat,
    config: Option<&Path>,
) -> Result<bool> {
    let settings = load_settings(config)?;
    let reports = check_files(&expand_inputs(inputs)?, &settings)?;
    let unformatted = reports.iter().filter(|r| !r.is_formatted()).count();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports)
                .context("Failed to serialize reports to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for report in &reports {
                match report.first_edit {
                    Some((line, column)) => println!(
                        "✗ {}: {} edit(s), first at {}:{}",
                        report.path, report.edits, line, column
                    ),
                    None => println!("✓ {}", report.path),
                }
            }
            println!();
            println!(
                "{} of {} file(s) would be reformatted",
                unformatted,
                reports.len()
            );
        }
    }

    Ok(unformatted == 0)
}

/// Execute the tree command
pub fn tree_command(input: &Path, dtd: bool) -> Result<()> {
    let json = tree_json(input, dtd)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Format one file with `settings`
pub fn format_file(path: &Path, settings: &Settings, dtd: bool) -> Result<FormattedFile> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let dialect = if dtd {
        Dialect::Dtd
    } else {
        settings.dialect_for(path)
    };
    let doc = parse(&source, dialect);
    let edits = format_tree(&doc, &settings.format, None, None)
        .with_context(|| format!("Failed to format: {}", path.display()))?;
    debug!("{}: {} edits", path.display(), edits.len());
    Ok(FormattedFile {
        path: path.to_path_buf(),
        source,
        edits,
    })
}

/// Formatting status of every file
pub fn check_files(paths: &[PathBuf], settings: &Settings) -> Result<Vec<FileReport>> {
    paths
        .iter()
        .map(|path| {
            let file = format_file(path, settings, false)?;
            Ok(FileReport {
                path: path.display().to_string(),
                edits: file.edits.len(),
                first_edit: file
                    .edits
                    .first()
                    .map(|edit| (edit.range.start.line + 1, edit.range.start.character + 1)),
            })
        })
        .collect()
}

/// One node of the `tree` output
#[derive(Serialize)]
struct TreeNode<'a> {
    node: &'a NodeKind,
    span: Span,
    range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<TreeNode<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode<'a>>,
}

impl<'a> TreeNode<'a> {
    fn build(doc: &'a Document, id: NodeId) -> Result<Self> {
        let span = doc.span(id);
        let node = doc.kind(id);
        Ok(Self {
            node,
            span,
            range: doc.range_of(span)?,
            text: node.is_text().then(|| doc.slice(span)),
            attributes: Self::build_all(doc, doc.attributes(id))?,
            children: Self::build_all(doc, doc.children(id))?,
        })
    }

    fn build_all(doc: &'a Document, ids: &[NodeId]) -> Result<Vec<Self>> {
        ids.iter().map(|&id| Self::build(doc, id)).collect()
    }
}

/// Parsed node tree of a file as JSON
pub fn tree_json(input: &Path, dtd: bool) -> Result<serde_json::Value> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let dialect = if dtd {
        Dialect::Dtd
    } else {
        Dialect::from_path(input)
    };
    let doc = parse(&source, dialect);
    let tree = TreeNode::build(&doc, NodeId::ROOT)?;
    serde_json::to_value(&tree).context("Failed to serialize tree to JSON")
}

/// Expand file names and glob patterns into existing files
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            let path = PathBuf::from(input);
            if !path.is_file() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            paths.push(path);
            continue;
        }
        let before = paths.len();
        for entry in glob(input).with_context(|| format!("Invalid glob pattern: {}", input))? {
            let path = entry.with_context(|| format!("Could not read match of {}", input))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        if paths.len() == before {
            anyhow::bail!("No files match: {}", input);
        }
    }
    Ok(paths)
}

/// Load settings from a config file, `xmlsense.toml` in the current
/// directory, or the defaults
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Ok(Settings::load_file(path)?)
        }
        None => Settings::load_from_dir(Path::new("."))
            .with_context(|| format!("Failed to load {}", CONFIG_FILE_NAME)),
    }
}
