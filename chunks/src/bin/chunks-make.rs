use std::{fs::read_to_string, fs::File, path::PathBuf};

use anyhow::Context;
use clap::Parser;

use chunks::{Catalog, Manifest};
use log::LevelFilter::Info;
use simple_logger::SimpleLogger;

#[derive(Parser)]
struct Args {
    /// TOML manifest describing the footprints
    manifest: PathBuf,
    outfile: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let Args { manifest, outfile } = Args::parse();
    SimpleLogger::new()
        .without_timestamps()
        .with_level(Info)
        .env()
        .init()
        .expect("Failed to init logger");
    let manifest = read_to_string(&manifest)
        .context("Cannot read manifest file")
        .and_then(|s| Manifest::parse(&s).context("Cannot parse manifest file"))?;
    let catalog = Catalog::from(manifest);
    log::info!("Writing {} footprints", catalog.len());
    catalog
        .write(File::create(outfile).context("While creating catalog file")?)
        .context("While writing catalog")
}
