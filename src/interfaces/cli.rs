use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bookmap")]
#[command(about = "Build a static map of where your books take place.")]
#[command(version)]
pub struct Cli {
    /// Input document (overrides config)
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip cache reads for this run (fresh results still write back)
    #[arg(short = 'n', long)]
    pub nocache: bool,

    /// Print the build summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Fill missing book metadata instead of building
    #[arg(long)]
    pub enrich: bool,

    /// With --enrich, also mine setting locations from article text
    #[arg(long)]
    pub locations: bool,

    /// With --enrich, write proposed changes to the input file
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// With --enrich, process only this book
    #[arg(long, value_name = "TITLE")]
    pub book_title: Option<String>,

    /// Generate config sample
    #[arg(long)]
    pub generate_config: bool,

    /// Show cache and config status
    #[arg(long)]
    pub status: bool,
}
