use std::{fs::File, io::BufReader, path::PathBuf};

use clap::Parser;

use deepsize::DeepSizeOf;
use humansize::{format_size, BINARY};
use log::LevelFilter::Info;
use simple_logger::SimpleLogger;

use chunks::Catalog;

#[derive(Parser)]
struct Args {
    /// File to show info for
    infile: PathBuf,
    /// List every footprint
    #[clap(long, short)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    let Args { infile, list } = Args::parse();
    SimpleLogger::new()
        .without_timestamps()
        .with_level(Info)
        .env()
        .init()
        .expect("Failed to init logger");
    let catalog = Catalog::bufread(BufReader::new(File::open(&infile)?))?;

    println!("File: {}", infile.to_string_lossy());
    println!("Format version: {}", chunks::VERSION);
    println!("Total footprints: {}", catalog.len());
    for (doors, count) in catalog.door_counts() {
        println!("  {doors} doors: {count}");
    }
    println!(
        "Unpacked memory: {}",
        format_size(catalog.deep_size_of(), BINARY)
    );
    if list {
        for footprint in catalog.footprints.iter() {
            println!("{footprint}");
        }
    }

    Ok(())
}
