//! PSSG CLI - Command-line tool for inspecting and rewriting PSSG files.
//!
//! This is the main entry point for the PSSG command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use pssg::format::{unwrap_envelope, xml};
use pssg::prelude::*;

/// PSSG - game asset tree inspection and rewriting tool
#[derive(Parser)]
#[command(name = "pssg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logs (RUST_LOG is honoured when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logs
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show schema and tree statistics for a PSSG file
    Info {
        /// Input PSSG file
        #[arg(short, long, env = "INPUT_PSSG")]
        input: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the node tree
    Tree {
        /// Input PSSG file
        #[arg(short, long, env = "INPUT_PSSG")]
        input: PathBuf,

        /// Maximum depth to print
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Export the node tree as XML with hex-encoded values
    ExportXml {
        /// Input PSSG file
        #[arg(short, long, env = "INPUT_PSSG")]
        input: PathBuf,

        /// Output XML file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode and re-encode a PSSG file
    Rewrite {
        /// Input PSSG file
        #[arg(short, long, env = "INPUT_PSSG")]
        input: PathBuf,

        /// Output PSSG file
        #[arg(short, long)]
        output: PathBuf,

        /// Rebuild the schema from the tree instead of reusing the file's
        #[arg(long)]
        rebuild_schema: bool,

        /// Wrap the output in a GZip envelope
        #[arg(long)]
        gzip: bool,

        /// Write the output uncompressed
        #[arg(long, conflicts_with = "gzip")]
        raw: bool,
    },

    /// Check that files re-encode byte for byte
    Verify {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Info { input, json } => {
            cmd_info(&input, json)?;
        }
        Commands::Tree { input, depth } => {
            cmd_tree(&input, depth)?;
        }
        Commands::ExportXml { input, output } => {
            cmd_export_xml(&input, &output)?;
        }
        Commands::Rewrite {
            input,
            output,
            rebuild_schema,
            gzip,
            raw,
        } => {
            cmd_rewrite(&input, &output, rebuild_schema, gzip, raw)?;
        }
        Commands::Verify { inputs } => {
            cmd_verify(&inputs)?;
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn open(input: &Path) -> Result<PssgFile> {
    PssgFile::open(input).with_context(|| format!("Failed to parse {}", input.display()))
}

fn cmd_info(input: &Path, json: bool) -> Result<()> {
    let start = Instant::now();
    let file = open(input)?;
    let elapsed = start.elapsed();
    let stats = TreeStats::collect(file.root());
    let schema = file.schema();

    if json {
        let value = serde_json::json!({
            "path": input.display().to_string(),
            "envelope": file.envelope(),
            "declared_length": file.declared_length(),
            "schema": {
                "node_types": schema.node_count(),
                "attributes": schema.attribute_count(),
                "declared_attributes": schema.declared_attribute_count(),
            },
            "tree": stats,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File: {}", input.display());
    println!("Envelope: {:?}", file.envelope());
    println!("Declared length: {} bytes", file.declared_length());
    println!(
        "Schema: {} node types, {} attributes ({} declared)",
        schema.node_count(),
        schema.attribute_count(),
        schema.declared_attribute_count()
    );
    println!(
        "Nodes: {}, Meshes: {}, Textures: {}",
        stats.node_count,
        stats.count_named("MESH"),
        stats.count_named("TEXTURE")
    );
    println!(
        "Leaves: {} ({} with data, {} bytes), max depth {}",
        stats.leaf_count, stats.data_node_count, stats.data_bytes, stats.max_depth
    );
    println!(
        "Attributes: {} ({} bytes)",
        stats.attribute_count, stats.attribute_bytes
    );
    println!("Parsed in {:?}", elapsed);

    println!("\nNode types:");
    for (name, count) in &stats.by_name {
        println!("{:>8}  {}", count, name);
    }

    Ok(())
}

fn cmd_tree(input: &Path, depth: Option<usize>) -> Result<()> {
    let file = open(input)?;
    print_node(file.root(), 0, depth.unwrap_or(usize::MAX));
    Ok(())
}

fn print_node(node: &Node, level: usize, max_depth: usize) {
    if level >= max_depth {
        return;
    }

    let indent = "  ".repeat(level);
    let attrs: Vec<String> = node
        .attributes
        .iter()
        .map(|a| format!("{}[{}]", a.name, a.value.len()))
        .collect();

    match &node.data {
        Some(data) if node.is_leaf() => {
            println!("{}{} {} <{} bytes>", indent, node.name, attrs.join(" "), data.len())
        }
        _ => println!("{}{} {}", indent, node.name, attrs.join(" ")),
    }

    for child in &node.children {
        print_node(child, level + 1, max_depth);
    }
}

fn cmd_export_xml(input: &Path, output: &Path) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), output.display());

    let file = open(input)?;
    let xml = xml::to_xml_string(file.root()).context("Failed to convert to XML")?;
    fs::write(output, xml).context("Failed to write output file")?;

    println!("Conversion complete");

    Ok(())
}

fn cmd_rewrite(
    input: &Path,
    output: &Path,
    rebuild_schema: bool,
    gzip: bool,
    raw: bool,
) -> Result<()> {
    println!("Rewriting: {} -> {}", input.display(), output.display());

    let mut file = open(input)?;
    if rebuild_schema {
        file.rebuild_schema();
    }

    let envelope = output_envelope(file.envelope(), gzip, raw);
    file.write_to_with(output, envelope)
        .context("Failed to write output file")?;

    println!("Output written");

    Ok(())
}

/// Envelope for rewritten output: the input's, unless overridden.
fn output_envelope(input: Envelope, gzip: bool, raw: bool) -> Envelope {
    if gzip {
        Envelope::Gzip
    } else if raw {
        Envelope::Raw
    } else {
        input
    }
}

/// Outcome of a single round-trip check.
enum Verdict {
    Identical,
    Differs { offset: usize, original: usize, encoded: usize },
    Failed(String),
}

fn cmd_verify(inputs: &[String]) -> Result<()> {
    let paths = collect_inputs(inputs)?;
    if paths.is_empty() {
        anyhow::bail!("No PSSG files matched");
    }

    println!("Verifying {} files...", paths.len());

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let results: Vec<(PathBuf, Verdict)> = paths
        .into_par_iter()
        .map(|path| {
            let verdict = verify_file(&path);
            if let Verdict::Failed(e) = &verdict {
                tracing::debug!(path = %path.display(), error = %e, "verification failed");
            }
            pb.inc(1);
            (path, verdict)
        })
        .collect();
    pb.finish_with_message("Done");

    let mut failures = 0;
    for (path, verdict) in &results {
        match verdict {
            Verdict::Identical => {}
            Verdict::Differs {
                offset,
                original,
                encoded,
            } => {
                failures += 1;
                eprintln!(
                    "MISMATCH {}: first difference at byte {} ({} vs {} bytes)",
                    path.display(),
                    offset,
                    original,
                    encoded
                );
            }
            Verdict::Failed(e) => {
                failures += 1;
                eprintln!("ERROR {}: {}", path.display(), e);
            }
        }
    }

    println!(
        "Verified {} files in {:?} ({} failures)",
        results.len(),
        start.elapsed(),
        failures
    );

    if failures > 0 {
        anyhow::bail!("{} of {} files did not round-trip", failures, results.len());
    }

    Ok(())
}

fn verify_file(path: &Path) -> Verdict {
    let run = || -> Result<Verdict> {
        let data = fs::read(path)?;
        let original = unwrap_envelope(&data)?;
        let encoded = PssgFile::parse(&original)?.to_bytes()?;

        if encoded[..] == original[..] {
            return Ok(Verdict::Identical);
        }

        let offset = original
            .iter()
            .zip(&encoded)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| original.len().min(encoded.len()));

        Ok(Verdict::Differs {
            offset,
            original: original.len(),
            encoded: encoded.len(),
        })
    };

    run().unwrap_or_else(|e| Verdict::Failed(format!("{:#}", e)))
}

/// Expand directories (recursively) and glob patterns into PSSG file paths.
fn collect_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path) {
                let entry = entry?;
                if entry.file_type().is_file() && has_pssg_extension(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
        } else if path.is_file() {
            paths.push(path.to_path_buf());
        } else {
            for entry in glob::glob(input).with_context(|| format!("Invalid pattern {}", input))? {
                let entry = entry?;
                if entry.is_file() {
                    paths.push(entry);
                }
            }
        }
    }

    paths.sort();
    paths.dedup();
    tracing::debug!(patterns = inputs.len(), files = paths.len(), "collected inputs");
    Ok(paths)
}

fn has_pssg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pssg") || e.eq_ignore_ascii_case("ens"))
        .unwrap_or(false)
}
