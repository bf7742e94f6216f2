//! `bundlekit` - assembles a declarative manifest into a bundle artifact.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bundlekit_core::assembler::Assembler;
use bundlekit_core::{compress, dispatch, encode};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Assembles a bundle manifest into a Base85 artifact", long_about = None)]
struct Args {
    /// Path to the manifest JSON file.
    manifest: PathBuf,

    /// Fold Base85 output to 70-character lines.
    #[arg(short = 'l', long)]
    multiline: bool,

    /// Increase logging verbosity (stack for more: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write the artifact to a file instead of stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Run the dictionary compressor over the chunk stream before encoding.
    #[arg(short = 'z', long)]
    compress: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .init();

    let manifest_text = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("reading manifest {}", args.manifest.display()))?;
    let manifest: serde_json::Value = serde_json::from_str(&manifest_text)
        .with_context(|| format!("parsing manifest {}", args.manifest.display()))?;
    let base_dir = args
        .manifest
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut asm = Assembler::new();
    dispatch::dispatch_manifest(&mut asm, &manifest, &base_dir);
    let chunk_bytes = match asm.assemble() {
        Ok(bytes) => bytes,
        Err(problems) => {
            for problem in &problems {
                tracing::error!("{problem}");
            }
            anyhow::bail!("{} problem(s) encountered while assembling the bundle", problems.len());
        }
    };

    let payload = if args.compress {
        compress::compress(&chunk_bytes)
    } else {
        chunk_bytes
    };
    let encoded = encode::encode(&payload, args.multiline);

    match &args.out {
        Some(path) => std::fs::write(path, &encoded)
            .with_context(|| format!("writing artifact to {}", path.display()))?,
        None => println!("{encoded}"),
    }

    Ok(())
}
