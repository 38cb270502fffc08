use anyhow::Result;
use clap::Parser;
use log::info;
use std::time::Instant;

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use pairextract::args::Args;
use pairextract::extract::extract_read_pairs;
use pairextract::utils::format_elapsed;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let total_start = Instant::now();

    let extract_fns = args.extract_fns();
    let results = extract_read_pairs(
        &args.bam,
        &args.region,
        &args.prefix,
        &extract_fns,
        args.pad,
        args.max_read_pairs,
    )?;

    for ((end1, end2), count) in &results {
        info!(
            "{} pairs written to {} and {}",
            count,
            end1.display(),
            end2.display()
        );
    }
    info!("done in {}", format_elapsed(total_start.elapsed()));

    Ok(())
}
