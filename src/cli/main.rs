#![warn(clippy::all, clippy::pedantic)]

use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::de::DeserializeOwned;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use flowplan::{
    plan, report, Aggregate, CbcEngine, GlpkEngine, Network, NodeEntry, RouteEntry,
};

/// Compute a minimum-cost distribution plan for a transshipment network.
#[derive(Parser)]
#[command(version, about)]
struct Opts {
    /// CSV file with node declarations (id,role,quantity)
    #[arg(long)]
    nodes: PathBuf,
    /// CSV file with route declarations (from,to,cost,capacity)
    #[arg(long)]
    routes: PathBuf,
    /// CSV file with aggregate constraints (name,routes,bound,limit)
    #[arg(long)]
    aggregates: Option<PathBuf>,
    /// LP engine to invoke
    #[arg(long, value_enum, default_value = "cbc")]
    engine: Engine,
    /// Write the solved flow diagram in DOT format to this file
    #[arg(long)]
    dot: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Engine {
    Cbc,
    Glpk,
}

// Read one CSV file into validated records.
fn read_records<T: DeserializeOwned>(filepath: &Path) -> Result<Vec<T>, Box<dyn Error>> {
    let file = File::open(filepath)
        .map_err(|e| format!("cannot open {}: {e}", filepath.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let rows: Result<Vec<T>, _> = rdr.deserialize().collect();
    Ok(rows?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let opts = Opts::parse();

    let level = match opts.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let nodes: Vec<NodeEntry> = read_records(&opts.nodes)?;
    let routes: Vec<RouteEntry> = read_records(&opts.routes)?;
    let aggregates: Vec<Aggregate> = match &opts.aggregates {
        Some(filepath) => read_records(filepath)?,
        None => Vec::new(),
    };

    let network = Network::new(nodes, routes, aggregates)?;
    let solution = match opts.engine {
        Engine::Cbc => plan(&network, &CbcEngine)?,
        Engine::Glpk => plan(&network, &GlpkEngine)?,
    };

    print!("{}", report::render_text(&network, &solution));

    if let Some(filepath) = &opts.dot {
        match solution.plan() {
            Some(p) => std::fs::write(filepath, report::render_dot(&network, p))?,
            None => log::warn!("no optimal plan, skipping DOT output"),
        }
    }

    Ok(())
}
