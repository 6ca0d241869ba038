//! kmf-export - KMF model export tool
//!
//! Converts glTF/GLB/OBJ scenes into .kmf model files and inspects
//! existing ones.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Use modules from library
use kmf_export::{export, inspect, manifest};

#[derive(Parser)]
#[command(name = "kmf-export")]
#[command(about = "KMF model export tool")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one scene file to .kmf
    #[command(alias = "p")]
    Parse {
        /// Downscale exponent stored in the header (clamped to 0-8)
        scale: u32,

        /// Input scene (glTF/GLB/OBJ)
        input: PathBuf,

        /// Output .kmf file (must not exist)
        output: PathBuf,
    },

    /// Build models from a manifest file
    Build {
        /// Path to kmf.toml manifest
        #[arg(default_value = "kmf.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to kmf.toml manifest
        #[arg(default_value = "kmf.toml")]
        manifest: PathBuf,
    },

    /// Print the contents of a .kmf file
    Inspect {
        /// .kmf file to decode
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Parse {
            scale,
            input,
            output,
        } => {
            export::parse_model(scale, &input, &output)?;
            tracing::info!("Done!");
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building models from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let built = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} model file(s) written", built.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { file } => {
            inspect::inspect(&file)?;
        }
    }

    Ok(())
}
