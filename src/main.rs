use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use valuer::{
    AssemblyFailure, AssemblyRequest, ConfigStore, DataSource, FilesystemConfigStore, InMemoryConfigStore,
    ReportAssembler, SchemaModel, SchemaParseError, StoreError, TemplateInput, Validator,
};

/// Assembles property-valuation reports from a schema, ranked data sources
/// and a document template.
#[derive(Parser, Debug)]
#[command(name = "valuer", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge the sources and render them into the template.
    Render(RenderArgs),
    /// Check data files against a schema without rendering.
    Validate {
        #[arg(long)]
        schema: PathBuf,
        /// Data files to check.
        #[arg(long = "data", required = true)]
        data: Vec<PathBuf>,
    },
    /// List the template tokens a schema declares.
    Tokens {
        #[arg(long)]
        schema: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Schema document (a store key when --store is given).
    #[arg(long)]
    schema: String,
    /// Template document (a store key when --store is given).
    #[arg(long)]
    template: String,
    /// Image size table (a store key when --store is given).
    #[arg(long)]
    image_config: Option<String>,
    /// Directory to read schema, template and image table from.
    #[arg(long)]
    store: Option<PathBuf>,
    /// Data source as `[NAME=]PATH`, highest priority first. The names
    /// `draft`, `extracted` and `defaults` mark well-known sources.
    #[arg(long = "source")]
    sources: Vec<String>,
    /// Image file as `TOKEN=PATH`.
    #[arg(long = "image")]
    images: Vec<String>,
    /// JSON object mapping image tokens to data-URIs or base64 text.
    #[arg(long = "images")]
    image_map: Option<PathBuf>,
    /// Render unmapped template tokens as empty text instead of failing.
    #[arg(long)]
    lenient: bool,
    #[arg(long, short)]
    out: PathBuf,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid argument '{0}': expected NAME=PATH")]
    Argument(String),

    #[error("'{}' must be a JSON object of token to image text", .0.display())]
    ImageMap(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaParseError),

    #[error(transparent)]
    Assembly(#[from] Box<AssemblyFailure>),

    #[error("{0} data file(s) failed validation")]
    Invalid(usize),
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let bytes = read_file(path)?;
    serde_json::from_slice(&bytes).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn split_pair(arg: &str) -> Option<(&str, &str)> {
    arg.split_once('=').filter(|(name, path)| !name.is_empty() && !path.is_empty())
}

fn load_source(arg: &str) -> Result<DataSource, CliError> {
    let (name, path) = match split_pair(arg) {
        Some((name, path)) => (name.to_string(), Path::new(path)),
        None => {
            let path = Path::new(arg);
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned());
            (stem.unwrap_or_else(|| arg.to_string()), path)
        }
    };
    let value = read_json(path)?;
    Ok(match name.as_str() {
        "draft" => DataSource::draft(value),
        "extracted" => DataSource::extracted(value),
        "defaults" => DataSource::defaults(value),
        _ => DataSource::new(name, value),
    })
}

fn render(args: RenderArgs) -> Result<(), CliError> {
    // Without --store the documents are plain files, loaded into memory
    // under their own paths as keys.
    let store: Arc<dyn ConfigStore> = match &args.store {
        Some(dir) => Arc::new(FilesystemConfigStore::new(dir)),
        None => {
            let store = InMemoryConfigStore::new();
            store.add(args.schema.clone(), read_file(Path::new(&args.schema))?)?;
            if let Some(key) = &args.image_config {
                store.add(key.clone(), read_file(Path::new(key))?)?;
            }
            Arc::new(store)
        }
    };
    let template = match &args.store {
        Some(_) => TemplateInput::Key(args.template.clone()),
        None => TemplateInput::Inline(read_file(Path::new(&args.template))?),
    };

    let mut request = AssemblyRequest::new(args.schema.clone(), template);
    if let Some(key) = &args.image_config {
        request = request.with_image_config(key.clone());
    }
    for arg in &args.sources {
        request = request.with_source(load_source(arg)?);
    }
    for arg in &args.images {
        let (token, path) = split_pair(arg).ok_or_else(|| CliError::Argument(arg.clone()))?;
        request = request.with_image(token, read_file(Path::new(path))?);
    }
    if let Some(path) = &args.image_map {
        let Value::Object(entries) = read_json(path)? else {
            return Err(CliError::ImageMap(path.clone()));
        };
        for (token, image) in entries {
            let Value::String(text) = image else {
                return Err(CliError::ImageMap(path.clone()));
            };
            request = request.with_image(token, text);
        }
    }

    let assembler = ReportAssembler::builder()
        .with_shared_store(store)
        .with_strict_unknown_tokens(!args.lenient)
        .build();
    let report = assembler.assemble(request).map_err(Box::new)?;

    for issue in &report.schema_issues {
        eprintln!("schema: {issue}");
    }
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &report.image_errors {
        eprintln!("warning: {error}");
    }
    for token in &report.unknown_tokens {
        eprintln!("unmapped token: {token}");
    }

    fs::write(&args.out, &report.result.document_bytes).map_err(|source| CliError::Io {
        path: args.out.clone(),
        source,
    })?;
    println!(
        "Wrote {} ({} replacement(s), {} image(s))",
        args.out.display(),
        report.result.replacements_count,
        report.result.images_replaced_count
    );
    Ok(())
}

fn validate(schema: &Path, data: &[PathBuf]) -> Result<(), CliError> {
    let model = SchemaModel::parse(&read_json(schema)?)?;
    let validator = Validator::build(&model);
    let mut failed = 0;
    for path in data {
        let result = validator.check(&read_json(path)?);
        if result.is_clean() {
            println!("{}: ok", path.display());
            continue;
        }
        failed += 1;
        let name = path.display().to_string();
        for warning in result.into_warnings(Some(&name)) {
            println!("{warning}");
        }
    }
    if failed > 0 {
        return Err(CliError::Invalid(failed));
    }
    Ok(())
}

fn tokens(schema: &Path) -> Result<(), CliError> {
    let model = SchemaModel::parse(&read_json(schema)?)?;
    for issue in model.issues() {
        eprintln!("schema: {issue}");
    }
    for (path, leaf) in model.traverse_leaves() {
        println!("{}\t{}\t{}", leaf.token, path, leaf.label);
    }
    Ok(())
}

fn main() -> Result<(), CliError> {
    env_logger::init();

    match Cli::parse().command {
        Command::Render(args) => render(args),
        Command::Validate { schema, data } => validate(&schema, &data),
        Command::Tokens { schema } => tokens(&schema),
    }
}
