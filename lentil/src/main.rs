mod cli;

use cli::point_cmd::*;
use cli::svi_cmd::*;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lentil")]
#[command(about = "Bayesian linear regression by stochastic variational inference")]
struct Cli {
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a noisy line and fit (w, b) by least squares with Adam
    Point(PointArgs),
    /// Simulate a noisy line, fit the posterior of (w, b, sigma) by SVI
    /// and print posterior-predictive bands
    Svi(SviArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match &cli.commands {
        Commands::Point(args) => {
            fit_point(args, cli.verbose)?;
        }
        Commands::Svi(args) => {
            fit_svi(args, cli.verbose)?;
        }
    }

    Ok(())
}
