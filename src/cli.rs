//! Minimal CLI: HAR files → (check | normalize), plus a dump of the schema tables.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use har_schema::{har, DecodeFailure, Decoded, Diagnostics, FieldValue};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate and normalize HTTP Archive (HAR 1.2) files against the built-in schema
#[derive(Parser, Debug)]
#[command(name = "har-schema", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode every input and report failures and diagnostics
    Check(CheckOut),
    /// decode then re-encode: unknown fields and nulls dropped, schema field order
    Normalize(NormalizeOut),
    /// print the HAR record-type tables
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /payload/har)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one archive
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// only report failures, not diagnostics
    #[arg(long, short)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct NormalizeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .har/.json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// single-line JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    /// only this record type (e.g. Entry)
    #[arg(long)]
    record: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One archive to decode: a file, or one jq output of a file.
#[derive(Debug)]
struct Document {
    source: String,
    value: Value,
}

#[derive(Serialize)]
struct FileReport<'a> {
    source: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<usize>,
    diagnostics: &'a Diagnostics,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let per_file = source_paths
            .par_iter()
            .map(|path| self.load_file(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }

    fn load_file(&self, source_path: &Path) -> Result<Vec<Document>> {
        let source_path_str = source_path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file ({source_path_str})"))?;
        let mut json_value = serde_json::from_str::<Value>(&source)
            .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
        if let Some(pointer) = self.json_pointer.as_deref() {
            json_value = json_value
                .pointer(pointer)
                .cloned()
                .with_context(|| format!("JSON pointer {pointer} matched nothing in {source_path_str}"))?;
        }
        let Some(jq_expr) = self.jq_expr.as_ref() else {
            return Ok(vec![Document { source: source_path_str, value: json_value }]);
        };
        let outputs = crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
            format!("failed to apply jq expression to source file ({source_path_str})")
        })?;
        let single = outputs.len() == 1;
        Ok(outputs
            .into_iter()
            .enumerate()
            .map(|(i, value)| Document {
                source: if single { source_path_str.clone() } else { format!("{source_path_str}#{i}") },
                value,
            })
            .collect())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns false when at least one input failed to decode.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Normalize(target) => target.run().map(|()| true),
            Command::Schema(target) => target.run().map(|()| true),
        }
    }
}

impl CheckOut {
    fn run(&self) -> Result<bool> {
        let documents = self.input_settings.load_documents()?;
        tracing::info!(documents = documents.len(), "checking archives");

        let results: Vec<(&Document, Result<Decoded, DecodeFailure>)> = documents
            .par_iter()
            .map(|doc| (doc, har::decode_archive(&doc.value)))
            .collect();

        let all_ok = results.iter().all(|(_, result)| result.is_ok());
        match self.format {
            ReportFormat::Text => {
                for (doc, result) in &results {
                    self.print_text(doc, result);
                }
            }
            ReportFormat::Json => {
                let reports = results
                    .iter()
                    .map(|(doc, result)| file_report(doc, result))
                    .collect::<Vec<_>>();
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
        Ok(all_ok)
    }

    fn print_text(&self, doc: &Document, result: &Result<Decoded, DecodeFailure>) {
        let diagnostics = match result {
            Ok(decoded) => {
                let entries = entry_count(decoded).unwrap_or(0);
                println!(
                    "{} {} ({entries} entries, {} diagnostics)",
                    "✅".green(),
                    doc.source.bold(),
                    decoded.diagnostics.len(),
                );
                &decoded.diagnostics
            }
            Err(failure) => {
                println!("{} {}: {}", "❌".red(), doc.source.bold(), failure.error.to_string().red());
                &failure.diagnostics
            }
        };
        if self.quiet {
            return;
        }
        for diagnostic in diagnostics {
            println!("   {} {diagnostic}", "warning:".yellow());
        }
    }
}

impl NormalizeOut {
    fn run(&self) -> Result<()> {
        let documents = self.input_settings.load_documents()?;
        let mut normalized = Vec::with_capacity(documents.len());
        for doc in &documents {
            let decoded = har::decode_archive(&doc.value)
                .with_context(|| format!("failed to decode HAR archive ({})", doc.source))?;
            if !decoded.diagnostics.is_empty() {
                tracing::info!(
                    source = %doc.source,
                    diagnostics = decoded.diagnostics.len(),
                    "input normalized with diagnostics"
                );
            }
            normalized.push(serde_json::to_value(&decoded.record)?);
        }
        let output = match normalized.len() {
            0 => bail!("no input documents"),
            1 => normalized.remove(0),
            _ => Value::Array(normalized),
        };
        let text = if self.compact {
            serde_json::to_string(&output)?
        } else {
            serde_json::to_string_pretty(&output)?
        };
        write_output(self.out.as_deref(), &text)
    }
}

impl SchemaOut {
    fn run(&self) -> Result<()> {
        let doc = match self.record.as_deref() {
            None => har::describe_registry(),
            Some(name) => match har::schema_named(name) {
                Some(schema) => schema.describe(),
                None => bail!("unknown HAR record type: {name}"),
            },
        };
        write_output(self.out.as_deref(), &serde_json::to_string_pretty(&doc)?)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn file_report<'a>(doc: &'a Document, result: &'a Result<Decoded, DecodeFailure>) -> FileReport<'a> {
    match result {
        Ok(decoded) => FileReport {
            source: &doc.source,
            ok: true,
            error: None,
            entries: entry_count(decoded),
            diagnostics: &decoded.diagnostics,
        },
        Err(failure) => FileReport {
            source: &doc.source,
            ok: false,
            error: Some(failure.error.to_string()),
            entries: None,
            diagnostics: &failure.diagnostics,
        },
    }
}

fn entry_count(decoded: &Decoded) -> Option<usize> {
    decoded
        .record
        .get("log")
        .and_then(FieldValue::as_record)
        .and_then(|log| log.get("entries"))
        .and_then(FieldValue::as_list)
        .map(<[_]>::len)
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // an explicit glob that matched nothing is an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
