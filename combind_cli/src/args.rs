//! Command-line argument parsing for the `combind` binary.

use clap::{Parser, Subcommand};

/// Build and persist a denormalized search index from a demo component DAG.
#[derive(Parser, Debug)]
#[command(name = "combind")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serving alias name the search-box store swaps after each save.
    #[arg(short = 'i', long, default_value = "combind-demo")]
    pub index: String,

    /// What to do with the demo DAG.
    #[command(subcommand)]
    pub command: Command,
}

/// The operation to run against the assembled demo DAG.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every top-level component and persist the result, swapping the
    /// serving alias.
    Save,
    /// Simulate a change to one backend record, then rebuild and diff only
    /// the components whose root set is affected.
    Update {
        /// Backend component type that changed (e.g. `policy`).
        #[arg(long)]
        changed_type: String,
        /// Backend component code that changed (e.g. `p1`).
        #[arg(long)]
        changed_code: String,
    },
}
