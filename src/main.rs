use clap::{Parser, Subcommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::Path;
use vpc_cidr_summary::source::read_snapshot;
use vpc_cidr_summary::{run_adjacent, run_map, run_next, run_resolve, Config};

/// CIDR allocation maps and route lookups for an exported VPC snapshot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snapshot JSON file (default: today's cidr_cache_<date>.json)
    #[arg(short, long, global = true)]
    input: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show mapped and available blocks of a VPC
    Map {
        /// VPC id or Name tag
        vpc: String,
        /// Only map this VPC CIDR block
        #[arg(long)]
        cidr: Option<String>,
    },
    /// Show the next free subnet in each VPC block
    Next {
        vpc: String,
        /// Prefix length of the new subnet (default: most common in the VPC)
        #[arg(short, long)]
        mask: Option<u8>,
    },
    /// Show the next free same-size subnet after an existing one
    Adjacent { vpc: String, subnet: String },
    /// Find the route a destination address or CIDR uses
    Resolve {
        /// Route table id or Name tag
        route_table: String,
        destination: String,
    },
}

/// Use the log4rs file when present, else warnings to stderr.
fn init_logging(log_config: &str) -> Result<(), Box<dyn Error>> {
    if Path::new(log_config).exists() {
        log4rs::init_file(log_config, Default::default())
            .map_err(|e| format!("Error initializing log4rs from {log_config}: {e}"))?;
        return Ok(());
    }

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    init_logging(&config.log_config)?;
    log::info!("#Start main()");

    let args = Args::parse();
    let input = args.input.as_deref().or(config.cache_file.as_deref());
    let snapshot = read_snapshot(input)?;

    match &args.cmd {
        Cmd::Map { vpc, cidr } => run_map(&snapshot, vpc, cidr.as_deref(), &config)?,
        Cmd::Next { vpc, mask } => run_next(&snapshot, vpc, *mask, &config)?,
        Cmd::Adjacent { vpc, subnet } => run_adjacent(&snapshot, vpc, subnet, &config)?,
        Cmd::Resolve {
            route_table,
            destination,
        } => {
            run_resolve(&snapshot, route_table, destination)?;
        }
    }

    Ok(())
}
