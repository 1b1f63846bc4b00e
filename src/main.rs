use anyhow::{bail, Context, Result};
use clap::Parser;
use pmx2obj::{ExportConfig, Model, ObjWriter};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Convert a PMX model into Wavefront OBJ and MTL files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// PMX file to convert, read as a line from stdin when omitted
    input: Option<PathBuf>,

    /// Directory the .obj and .mtl files are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// File stem of the outputs, defaults to the input's stem
    #[arg(long)]
    name: Option<String>,

    /// Decimals written for vertex positions
    #[arg(long, default_value_t = 7, conflicts_with = "no_fixed_precision")]
    precision: usize,

    /// Write vertex positions with the shortest exact representation
    #[arg(long)]
    no_fixed_precision: bool,

    /// Keep texture V coordinates as stored instead of negating them
    #[arg(long)]
    no_flip_v: bool,

    /// Log every decoded section
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();

    let input = match cli.input {
        Some(input) => input,
        None => read_input_path(std::io::stdin().lock())?,
    };
    let data =
        std::fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    let model =
        Model::decode(&data).with_context(|| format!("failed to decode {}", input.display()))?;
    info!("Parsed PMX v{} successfully", model.header().version);

    let stem = match cli.name {
        Some(name) => name,
        None => input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("input path has no file name")?,
    };
    let config = ExportConfig {
        position_precision: if cli.no_fixed_precision {
            None
        } else {
            Some(cli.precision)
        },
        flip_v: !cli.no_flip_v,
        ..ExportConfig::default()
    };

    let (obj_path, mtl_path) = ObjWriter::new(&model, config)
        .write_files(&cli.output_dir, &stem)
        .with_context(|| format!("failed to export into {}", cli.output_dir.display()))?;
    info!("Wrote {}", mtl_path.display());
    info!("Wrote {}", obj_path.display());
    Ok(())
}

fn read_input_path<R: BufRead>(mut reader: R) -> Result<PathBuf> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("failed to read the input path from stdin")?;
    let path = line.trim_end_matches(&['\r', '\n'][..]);
    if path.is_empty() {
        bail!("no input path given");
    }
    Ok(PathBuf::from(path))
}
