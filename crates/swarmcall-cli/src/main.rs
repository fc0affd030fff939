//! SwarmCall CLI: call endpoints on a swarm of nodes sharing one channel.
//!
//! Every invocation boots an in-process swarm on a loopback bus: the caller
//! node plus one node per `--nodes` identity. The call runs against that
//! swarm and the replies are printed.

mod cli;
mod config;
mod render;

use crate::cli::{Cli, Commands, SwarmArgs};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use swarmcall_types::config::NodeConfig;
use swarmcall_types::error::SwarmResult;
use swarmcall_wire::{Body, CallOptions, LoopbackBus, Node, Packet, EVERYONE};
use tracing::{debug, info};

fn init_tracing_stderr(default_level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref());
    init_tracing_stderr(&config.log_level);

    let (dst, endpoint, body, swarm) = match cli.command {
        Commands::Call {
            dst,
            endpoint,
            args,
            swarm,
        } => (dst, endpoint, render::parse_call_args(&args), swarm),
        Commands::Ping { swarm } => (EVERYONE.to_string(), "ping".to_string(), Body::new(), swarm),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(&format!("Failed to start runtime: {e}")),
    };
    match rt.block_on(cmd_call(config, &dst, &endpoint, body, &swarm)) {
        Ok(replies) => print_replies(&replies, swarm.json),
        Err(e) => fail(&e.to_string()),
    }
}

/// Boot the swarm, run one call from the caller node and return its replies.
async fn cmd_call(
    config: NodeConfig,
    dst: &str,
    endpoint: &str,
    body: Body,
    swarm: &SwarmArgs,
) -> SwarmResult<Vec<Packet>> {
    config.validate()?;
    let bus = LoopbackBus::new(config.bus_capacity);

    // Peers stay alive for the whole call; the bus only holds weak references.
    let mut peers = Vec::with_capacity(swarm.nodes.len());
    for peer_id in swarm.nodes.iter().filter(|id| !id.is_empty()) {
        let peer = Arc::new(Node::new(NodeConfig {
            node_id: Some(peer_id.clone()),
            ..config.clone()
        })?);
        bus.connect(peer.clone())?;
        peers.push(peer);
    }

    let caller = Arc::new(Node::new(config)?);
    bus.connect(caller.clone())?;
    info!(
        caller = %caller.node_id(),
        members = ?bus.members(),
        "Swarm ready"
    );

    let mut options = CallOptions::for_destination(dst, caller.config());
    if let Some(ms) = swarm.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }
    debug!(?options, peers = peers.len(), "Call options");
    caller.call_with(dst, endpoint, body, options).await
}

fn print_replies(replies: &[Packet], json: bool) {
    if replies.is_empty() {
        println!("{}", "No response.".yellow());
        return;
    }
    for reply in replies {
        if json {
            match reply.to_wire() {
                Ok(text) => println!("{text}"),
                Err(e) => eprintln!("  {} {e}", "\u{2718}".bright_red()),
            }
        } else {
            println!("{}\n", render::render_packet(reply));
        }
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("  {} {}", "\u{2718}".bright_red(), msg.bright_red());
    std::process::exit(1);
}
