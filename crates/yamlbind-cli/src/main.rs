mod diagnostic;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yamlbind::{Codec, CodecOptions, DynamicAccessor, Node, Schema, SchemaId};
use yamlbind_tree::{ParseMode, parse_named};

use diagnostic::Sources;

/// Schema-driven YAML codec
#[derive(Parser, Debug)]
#[command(name = "yamlbind", version)]
#[command(about = "Parse, validate and decode YAML documents against schemas", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    options: OptionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct OptionArgs {
    /// Indentation width of emitted documents
    #[arg(long, global = true, value_name = "WIDTH")]
    indent: Option<usize>,

    /// Quote character for emitted strings (`"` or `'`)
    #[arg(long, global = true, value_name = "CHAR")]
    quote: Option<char>,

    /// Maximum nesting depth accepted while parsing
    #[arg(long, global = true, value_name = "DEPTH")]
    max_depth: Option<usize>,
}

impl OptionArgs {
    fn to_options(&self) -> CodecOptions {
        let mut options = CodecOptions::new();
        if let Some(width) = self.indent {
            options = options.with_indent_width(width);
        }
        if let Some(quote) = self.quote {
            options = options.with_quote(quote);
        }
        if let Some(depth) = self.max_depth {
            options = options.with_max_depth(depth);
        }
        options
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node tree of a document as JSON
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Keep unresolved `*name` scalars, as schema documents do
        #[arg(long)]
        schema_mode: bool,
    },

    /// Compile a schema and list its definitions and root properties
    CheckSchema {
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,
    },

    /// Validate a YAML document against a schema
    Validate {
        /// Path to the YAML schema file
        #[arg(long, value_name = "FILE")]
        schema: PathBuf,

        /// Path to the YAML document to validate
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Decode a document and print the bound object as JSON
    Decode {
        #[arg(long, value_name = "FILE")]
        schema: PathBuf,

        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Class name of the root object
        #[arg(long, value_name = "NAME", default_value = "Document")]
        class: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "yamlbind=debug" } else { "yamlbind=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Codec errors are rendered as diagnostics; anything else (unreadable
/// files, JSON output) falls through to `main`.
fn run(cli: Cli) -> Result<ExitCode> {
    let options = cli.options.to_options();
    let mut sources = Sources::default();

    match execute(&cli.command, &options, &mut sources) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast_ref::<yamlbind::Error>() {
            Some(error) => {
                let color = std::io::stderr().is_terminal();
                eprint!("{}", diagnostic::render(error, &sources, color));
                Ok(ExitCode::FAILURE)
            }
            None => Err(e),
        },
    }
}

fn execute(command: &Command, options: &CodecOptions, sources: &mut Sources) -> Result<()> {
    match command {
        Command::Parse { file, schema_mode } => {
            let mode = if *schema_mode {
                ParseMode::Schema
            } else {
                ParseMode::Data
            };
            let tree = parse_document(file, options, mode, sources)?;
            print_json(&tree)
        }
        Command::CheckSchema { schema } => {
            let codec = load_codec(schema, options, sources)?;
            print_schema(codec.schema());
            Ok(())
        }
        Command::Validate { schema, input } => {
            let codec = load_codec(schema, options, sources)?;
            let document = parse_document(input, codec.options(), ParseMode::Data, sources)?;
            codec.validate_tree(&document)?;

            println!("✓ Validation successful");
            println!("  Input: {}", input.display());
            println!("  Schema: {}", schema.display());
            Ok(())
        }
        Command::Decode {
            schema,
            input,
            class,
        } => {
            let codec = load_codec(schema, options, sources)?;
            let document = parse_document(input, codec.options(), ParseMode::Data, sources)?;
            let object = codec.decode_tree(&document, class, &DynamicAccessor)?;
            print_json(&object)
        }
    }
}

fn read(path: &Path, sources: &mut Sources) -> Result<(String, String)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path.display().to_string();
    sources.add(name.clone(), content.clone());
    Ok((name, content))
}

fn parse_document(
    path: &Path,
    options: &CodecOptions,
    mode: ParseMode,
    sources: &mut Sources,
) -> Result<Node> {
    let (name, content) = read(path, sources)?;
    tracing::debug!(file = %name, ?mode, "parsing document");
    options.validate().map_err(yamlbind::Error::from)?;
    let tree = parse_named(&content, &name, options, mode).map_err(yamlbind::Error::from)?;
    Ok(tree)
}

fn load_codec(path: &Path, options: &CodecOptions, sources: &mut Sources) -> Result<Codec> {
    let tree = parse_document(path, options, ParseMode::Schema, sources)?;
    Ok(Codec::from_tree_with_options(&tree, options.clone())?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn describe(schema: &Schema, id: SchemaId) -> String {
    let node = schema.node(id);
    let kind = schema.effective_type(id).map_or("untyped", |t| t.as_str());
    let mut line = format!("{} ({})", node.name, kind);
    if node.primitive_array {
        line.push_str("[]");
    }
    if node.required {
        line.push_str(" required");
    }
    if let Some(target) = node.reference {
        line.push_str(&format!(" -> *{}", schema.node(target).name));
    }
    if node.member_name() != node.name {
        line.push_str(&format!(" as {}", node.member_name()));
    }
    line
}

fn print_schema(schema: &Schema) {
    println!("✓ Schema compiled ({} nodes)", schema.len());

    let definitions: Vec<_> = schema.definitions().collect();
    if !definitions.is_empty() {
        println!("Definitions:");
        for (name, id) in definitions {
            println!("  {}: {}", name, schema.container(id));
            for child in schema.children(id) {
                println!("    {}", describe(schema, *child));
            }
        }
    }

    println!("Properties:");
    for child in schema.children(schema.root()) {
        println!("  {}", describe(schema, *child));
    }
}
