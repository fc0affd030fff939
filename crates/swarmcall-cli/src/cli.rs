//! Clap CLI definitions for SwarmCall.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  swarmcall ping                               Ping every node in the local swarm
  swarmcall call beta add x=1 y=2 z=3          Call one node
  swarmcall call '#anyone' endpoint-info name=add
  swarmcall call '#everyone' ping --nodes a,b,c --timeout-ms 500";

/// SwarmCall: request/response over a shared broadcast channel.
#[derive(Parser, Debug)]
#[command(name = "swarmcall", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Call an endpoint and print every reply.
    Call {
        /// Destination node, `#everyone` or `#anyone`.
        dst: String,
        /// Endpoint name.
        endpoint: String,
        /// Arguments as key=value pairs.
        args: Vec<String>,
        #[command(flatten)]
        swarm: SwarmArgs,
    },
    /// Ping every node in the swarm.
    Ping {
        #[command(flatten)]
        swarm: SwarmArgs,
    },
}

/// Options shaping the in-process swarm a command runs against.
#[derive(clap::Args, Debug, Clone)]
pub struct SwarmArgs {
    /// Peer node identities to start alongside the caller.
    #[arg(long, value_delimiter = ',', default_value = "alpha,beta,gamma")]
    pub nodes: Vec<String>,
    /// Override the configured call timeout.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Print replies as raw wire JSON.
    #[arg(long)]
    pub json: bool,
}
