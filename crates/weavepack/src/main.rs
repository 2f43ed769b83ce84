use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use weavepack::{BuildResult, Weavepack, WeavepackError};
use weavepack_core::bundle_graph::BundleTree;
use weavepack_core::types::{BuildMode, BuildOptions, LogLevel};
use weavepack_monitoring::{close_monitoring, initialize_monitoring, MonitoringOptions, TracerMode};

#[derive(Debug, Subcommand)]
pub enum WeavepackCommandType {
  /// Bundle an entry document and its references into the dist directory
  Build(BuildCommand),
}

#[derive(Parser, Debug)]
#[command(name = "weavepack", version)]
pub struct WeavepackCommand {
  #[clap(subcommand)]
  pub command: WeavepackCommandType,
}

#[derive(Parser, Debug)]
pub struct BuildCommand {
  /// The entry document, usually an HTML file
  pub entry: PathBuf,
  /// [default value: "<project root>/dist"]
  #[arg(long)]
  pub dist_dir: Option<PathBuf>,
  /// [default value: "/<dist dir name>"]
  #[arg(long)]
  pub public_url: Option<String>,
  /// Minify output documents
  #[arg(long)]
  pub production: bool,
  /// Add the hot reload runtime to script and style bundles
  #[arg(long)]
  pub hmr: bool,
  /// [default value: the entry's directory]
  #[arg(long)]
  pub project_root: Option<PathBuf>,
  /// Use this `.weavepackrc` instead of searching for one
  #[arg(long)]
  pub config: Option<PathBuf>,
  /// [possible values: "none", "error", "warn", "info", "verbose"]
  #[arg(long, default_value = "info", value_parser = parse_log_level)]
  pub log_level: LogLevel,
  /// Print the bundle tree and output files as JSON
  #[arg(long)]
  pub json: bool,
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
  serde_json::from_value(serde_json::Value::String(value.to_string()))
    .map_err(|_| format!("Unknown log level {value}"))
}

impl From<BuildCommand> for BuildOptions {
  fn from(cmd: BuildCommand) -> Self {
    BuildOptions {
      entry: cmd.entry,
      project_root: cmd.project_root.unwrap_or_default(),
      dist_dir: cmd.dist_dir,
      public_url: cmd.public_url,
      mode: if cmd.production {
        BuildMode::Production
      } else {
        BuildMode::Development
      },
      hmr: cmd.hmr,
      log_level: cmd.log_level,
      config: cmd.config,
    }
  }
}

fn main() -> ExitCode {
  let args = WeavepackCommand::parse();

  match args.command {
    WeavepackCommandType::Build(cmd) => {
      if let Err(error) = init_monitoring(cmd.log_level) {
        eprintln!("Failed to initialise logging: {error:#}");
      }

      let json = cmd.json;
      let result = Weavepack::new(cmd.into(), None).and_then(|weavepack| weavepack.build());
      let code = match result {
        Ok(result) => report(&result, json),
        Err(error) => {
          let error = WeavepackError::from(&error);
          tracing::error!(%error, "Build failed");
          eprintln!("{error}");
          ExitCode::FAILURE
        }
      };

      close_monitoring();
      code
    }
  }
}

fn init_monitoring(log_level: LogLevel) -> anyhow::Result<()> {
  let mut options = MonitoringOptions::from_env(log_level.as_filter())?;
  if options.tracing_options.is_empty() {
    options.tracing_options.push(TracerMode::Stdout);
  }

  initialize_monitoring(options)
}

fn report(result: &BuildResult, json: bool) -> ExitCode {
  if json {
    return match serde_json::to_string_pretty(&result.report()) {
      Ok(report) => {
        println!("{report}");
        ExitCode::SUCCESS
      }
      Err(error) => {
        eprintln!("Failed to serialise the build report: {error}");
        ExitCode::FAILURE
      }
    };
  }

  for warning in &result.warnings {
    eprintln!("warning: {}", WeavepackError::Diagnostic(warning.clone()));
  }

  let mut lines = Vec::new();
  print_tree(&result.bundle_tree(), 0, &mut lines);
  println!("{}", lines.join("\n"));

  for file in &result.output_files {
    println!("{} ({} bytes)", file.path.display(), file.size);
  }

  ExitCode::SUCCESS
}

fn print_tree(tree: &BundleTree, depth: usize, lines: &mut Vec<String>) {
  lines.push(format!(
    "{}{} [{}] {}",
    "  ".repeat(depth),
    tree.name.as_deref().unwrap_or("(virtual)"),
    tree.bundle_type.extension(),
    tree.assets.join(", ")
  ));

  for child in &tree.child_bundles {
    print_tree(child, depth + 1, lines);
  }
}
