mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ConfigureArgs, ExportTarget, PackageType};
use output::{OutputFormat, print_error};

/// Bootstrap third-party dependencies and configure C/C++ builds.
#[derive(Parser)]
#[command(name = "bootwaf")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Project root (the directory holding bootwaf.lua)
  #[arg(short = 'C', long, global = true, default_value = ".")]
  dir: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Write a template bootwaf.lua
  Init {
    /// Directory to create the project file in (default: --dir)
    path: Option<PathBuf>,
  },

  /// Install OS packages and fetch and build missing dependencies
  Bootstrap {
    /// Print the actions without running them
    #[arg(long)]
    dry_run: bool,
  },

  /// Derive and store toolchain environments
  Configure(ConfigureArgs),

  /// Show discovered packages and their targets
  List {
    /// Variant whose environment descriptors are evaluated against
    #[arg(long, default_value = bootwaf_lib::consts::NATIVE_VARIANT)]
    variant: String,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Write makefiles or Code::Blocks workspaces for configured variants
  Export {
    /// Variants to export (default: every configured variant)
    #[arg(long = "variant")]
    variants: Vec<String>,

    /// Formats to write, comma separated
    #[arg(long = "export_to", value_enum, value_delimiter = ',', default_value = "makefile")]
    export_to: Vec<ExportTarget>,
  },

  /// Install a variant into a staging directory and archive it
  Package {
    /// Variant to package
    #[arg(long, default_value = bootwaf_lib::consts::NATIVE_VARIANT)]
    variant: String,

    /// Outputs to produce, comma separated
    #[arg(long = "package_types", value_enum, value_delimiter = ',', default_value = "all")]
    package_types: Vec<PackageType>,
  },

  /// Show platform, OS release and package manager
  Info {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  match cli.command {
    Commands::Init { path } => cmd::cmd_init(path.as_deref().unwrap_or(&cli.dir)),
    Commands::Bootstrap { dry_run } => cmd::cmd_bootstrap(&cli.dir, dry_run),
    Commands::Configure(args) => cmd::cmd_configure(&cli.dir, &args),
    Commands::List { variant, output } => cmd::cmd_list(&cli.dir, &variant, output),
    Commands::Export { variants, export_to } => cmd::cmd_export(&cli.dir, &variants, &export_to),
    Commands::Package { variant, package_types } => cmd::cmd_package(&cli.dir, &variant, &package_types),
    Commands::Info { output } => cmd::cmd_info(output),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
