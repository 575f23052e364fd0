use crate::{constants::*, io::vcf_writer::OutputType};
use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

/// Full version string including the crate version and git description.
///
/// # Examples
/// * `0.1.0-1ba958a-dirty` - while on a dirty branch
/// * `0.1.0-1ba958a` - with a fresh commit
pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    let git_describe = env!("VERGEN_GIT_DESCRIBE");
    if git_describe.is_empty() {
        env!("CARGO_PKG_VERSION").to_string()
    } else {
        format!("{}-{}", env!("CARGO_PKG_VERSION"), git_describe)
    }
});

#[derive(Parser, Debug)]
#[command(name="vcfcodec",
          version=&**FULL_VERSION,
          about="VCF 3.x/4.0 validator and normaliser",
          long_about = None,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode every record and report malformed lines
    Validate(ValidateArgs),
    /// Decode and re-encode a VCF
    View(ViewArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Validate(_) => "validate",
            Command::View(_) => "view",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct ValidateArgs {
    /// VCF file to validate (plain or gzip compressed)
    #[arg(long = "vcf", value_name = "VCF", value_parser = check_file_exists)]
    pub vcf: PathBuf,

    /// Number of threads to use
    #[arg(
        short = '@',
        value_name = "THREADS",
        default_value_t = DEFAULT_THREADS,
        value_parser = threads_in_range
    )]
    pub num_threads: usize,

    /// Do not decode the sample columns
    #[arg(long = "skip-genotypes", default_value_t = DEFAULT_SKIP_GENOTYPES)]
    pub skip_genotypes: bool,

    /// Report every malformed line instead of stopping at the first
    #[arg(long = "catch-all", default_value_t = DEFAULT_CATCH_ALL)]
    pub catch_all: bool,

    /// Accept columns separated by runs of spaces
    #[arg(long = "space-delimited", help_heading = "Advanced")]
    pub space_delimited: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct ViewArgs {
    /// VCF file to read (plain or gzip compressed)
    #[arg(long = "vcf", value_name = "VCF", value_parser = check_file_exists)]
    pub vcf: PathBuf,

    /// Write output to a file [default: standard output]
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path
    )]
    pub output: Option<String>,

    /// Output type: v|z, v/z: un/compressed VCF
    #[arg(
        short = 'O',
        long = "output-type",
        value_name = "OUTPUT_TYPE",
        value_parser = view_validate_output_type,
        help_heading = "Advanced"
    )]
    pub output_type: Option<OutputType>,

    /// Print only the header and exit
    #[arg(long = "header-only")]
    pub header_only: bool,

    /// Write a sites-only VCF without FORMAT and sample columns
    #[arg(long = "drop-genotypes")]
    pub drop_genotypes: bool,

    /// Do not decode the sample columns, writing no-calls in their place
    #[arg(long = "skip-genotypes", default_value_t = DEFAULT_SKIP_GENOTYPES)]
    pub skip_genotypes: bool,

    /// Accept columns separated by runs of spaces
    #[arg(long = "space-delimited", help_heading = "Advanced")]
    pub space_delimited: bool,
}

/// Initializes the verbosity level for logging based on the command-line arguments.
///
/// Sets up the logger with a specific verbosity level that is determined
/// by the number of occurrences of the `-v` or `--verbose` flag in the command-line arguments.
pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.module_path().unwrap_or("unknown_module"),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

/// Validates that the provided string represents a valid number of threads.
fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse::<usize>()
        .map_err(|_| anyhow!("`{}` is not a valid thread number", s))?;
    if thread == 0 {
        return Err(anyhow!("Number of threads must be >= 1"));
    }
    Ok(thread)
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(anyhow!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(anyhow!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn view_validate_output_type(s: &str) -> Result<OutputType> {
    match s {
        "v" => Ok(OutputType::Vcf {
            is_uncompressed: true,
            level: None,
        }),
        "z" => Ok(OutputType::Vcf {
            is_uncompressed: false,
            level: None,
        }),
        _ if s.len() == 2 && s.starts_with('z') => {
            let level = s[1..]
                .parse::<u32>()
                .map_err(|_| anyhow!("Invalid compression level in output type: {}", s))?;
            Ok(OutputType::Vcf {
                is_uncompressed: false,
                level: Some(level),
            })
        }
        _ => Err(anyhow!("Invalid output type: {}. Must be one of v, z, z0-z9.", s)),
    }
}
