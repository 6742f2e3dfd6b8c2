//! blockcompress - command line driver
//!
//! # Commands
//!
//! - `parse` - Print the header and index summary of a container
//! - `create` - Pack every non-bootable partition of a raw disk image
//! - `extract` - Restore the original stream from a container
//!
//! # Examples
//!
//! ```bash
//! blockcompress create disk.img -o ./out
//! blockcompress parse ./out/disk.p1.gbcm --json
//! blockcompress extract ./out/disk.p1.gbcm partition.raw
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use blockcompress::config::DEFAULT_SECTOR_SIZE;
use blockcompress::format::DEFAULT_BLOCK_SIZE;
use blockcompress::image::MbrImage;
use blockcompress::{pack, ContainerReader, CoreHeader, Options};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "blockcompress")]
#[command(version, about = "Sparse-block containers for raw disk images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header fields and index length of a container
    Parse {
        /// Path to the container
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pack every non-bootable partition of a disk image into a container
    Create {
        /// Path to the raw disk image
        image: PathBuf,

        /// Directory for the containers
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Block size in bytes
        #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: u32,

        /// Sector size of the image in bytes
        #[arg(long, default_value_t = DEFAULT_SECTOR_SIZE)]
        sector_size: u64,

        /// Skip syncing containers to disk
        #[arg(long)]
        no_sync: bool,
    },

    /// Restore the original stream from a container
    Extract {
        /// Path to the container
        file: PathBuf,

        /// Where to write the restored stream
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct Summary {
    header: CoreHeader,
    index_len: usize,
    zero_blocks: u64,
    logical_blocks: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { file, json } => parse(file, json),
        Commands::Create { image, output, block_size, sector_size, no_sync } => {
            let options = Options::new()
                .block_size(block_size)
                .sector_size(sector_size)
                .sync_on_close(!no_sync);
            create(image, output, options)
        }
        Commands::Extract { file, output } => extract(file, output),
    }
}

fn parse(file: PathBuf, json: bool) -> Result<()> {
    let reader = ContainerReader::open_file(&file)
        .with_context(|| format!("Failed to open container {}", file.display()))?;

    let summary = Summary {
        header: *reader.header(),
        index_len: reader.index().len(),
        zero_blocks: reader.index().zero_block_count(),
        logical_blocks: reader.logical_block_count(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    } else {
        let h = &summary.header;
        writeln!(out, "magic:         {:#x}", h.magic)?;
        writeln!(out, "block_size:    {}", h.block_size)?;
        writeln!(out, "logical_size:  {}", h.logical_size)?;
        writeln!(out, "index_size:    {}", h.index_size)?;
        writeln!(out, "payload_size:  {}", h.payload_size)?;
        writeln!(out, "index nodes:   {}", summary.index_len)?;
        writeln!(out, "zero blocks:   {}", summary.zero_blocks)?;
    }
    Ok(())
}

fn create(image_path: PathBuf, output: PathBuf, options: Options) -> Result<()> {
    let file = File::open(&image_path)
        .with_context(|| format!("Failed to open image {}", image_path.display()))?;
    let mut image = MbrImage::new(file, options.sector_size)
        .with_context(|| format!("Failed to read partition table of {}", image_path.display()))?;

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();

    let packed = pack::pack_image(&mut image, &output, &stem, &options)?;
    info!("Created {} container(s) from {}", packed.len(), image_path.display());
    for p in &packed {
        println!("{}", p.path.display());
    }
    Ok(())
}

fn extract(file: PathBuf, output: PathBuf) -> Result<()> {
    let mut reader = ContainerReader::open_file(&file)
        .with_context(|| format!("Failed to open container {}", file.display()))?;
    let out = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut out = BufWriter::new(out);

    let written = pack::unpack(&mut reader, &mut out)?;
    info!("Restored {} bytes into {}", written, output.display());
    Ok(())
}
