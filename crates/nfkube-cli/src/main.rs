//! nfkube CLI tool.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::LaunchArgs;

#[derive(Parser)]
#[command(name = "nfkube")]
#[command(about = "Launch a Nextflow head job on Kubernetes", long_about = None)]
#[command(version)]
struct Cli {
    /// Print the secret and job manifests instead of creating them
    #[arg(long, env = "NFKUBE_DRY_RUN")]
    dry_run: bool,

    /// Nextflow-style arguments, e.g. `run hello -v pvc:/data -head-cpus 2`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let launch_args = LaunchArgs::parse(&cli.args)?;

    commands::run(launch_args, cli.dry_run).await
}
