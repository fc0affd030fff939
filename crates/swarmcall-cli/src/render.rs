//! Argument parsing and reply rendering for the `call` command.
//!
//! Uses `colored` for terminal output.

use colored::Colorize;
use serde_json::Value;
use swarmcall_wire::{Body, Packet};
use tracing::warn;

/// Turn `key=value` arguments into a request body.
///
/// Splits on the first `=`; values stay strings. Arguments without `=` or
/// with an empty key are skipped.
pub fn parse_call_args(args: &[String]) -> Body {
    let mut body = Body::new();
    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                body.insert(key.to_string(), Value::String(value.to_string()));
            }
            _ => warn!(arg = %arg, "Skipping malformed argument, expected key=value"),
        }
    }
    body
}

/// Render one reply as a titled block of `key: value` lines.
pub fn render_packet(packet: &Packet) -> String {
    let title = format!(
        "[{}] {} -> {}",
        packet.endpoint(),
        packet.src(),
        packet.dst()
    );
    let mut out = if packet.is_error() {
        format!("{} {}\n", title.bold(), "ERROR".bright_red().bold())
    } else {
        format!("{}\n", title.bold())
    };

    for (key, value) in packet.body() {
        out.push_str(&format!("  {:<12}{}\n", format!("{key}:"), display_value(value)));
    }

    let footer = if packet.is_reply() {
        format!("id {} re {}", packet.id(), packet.backlink())
    } else {
        format!("id {}", packet.id())
    };
    out.push_str(&format!("  {}", footer.dimmed()));
    out
}

/// Strings print bare; everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
