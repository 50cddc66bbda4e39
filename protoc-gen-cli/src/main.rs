//! protoc-gen-cli
//!
//! A protoc plugin that turns gRPC services into a resource/verb command tree
//! and flattens every request message into command-line flags.
//!
//! Usage:
//!   protoc --cli_out=./gen proto/*.proto
//!   protoc --cli_out=layout=resource,request_short=none:./gen proto/*.proto
//!
//! Logs go to stderr; set `RUST_LOG` or pass `log=debug` to see how each
//! method was classified.

#![deny(warnings)]
#![deny(missing_docs)]

use std::io::{self, Read, Write};

use prost::Message;
use prost_types::compiler::CodeGeneratorResponse;
use prost_types::compiler::code_generator_response::Feature;
use tracing_subscriber::EnvFilter;

mod command;
mod config;
mod error;
#[cfg(test)]
mod fixtures;
mod flags;
mod generator;
mod reflect;
mod render;
mod resolver;
mod schema;

use config::Config;
use render::ClapRenderer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Read the CodeGeneratorRequest from stdin
    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input)?;

    // Peek at the parameter so logging is configured before generation starts
    let log = reflect::peek_parameter(&input)
        .ok()
        .and_then(|param| Config::parse(&param).ok())
        .and_then(|config| config.log);
    init_tracing(log.as_deref());

    let response = match generator::generate_from_bytes(&input, &ClapRenderer) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            CodeGeneratorResponse {
                error: Some(e.to_string()),
                supported_features: Some(Feature::Proto3Optional as u64),
                ..Default::default()
            }
        }
    };

    // Write the response to stdout
    let mut output = Vec::new();
    response.encode(&mut output)?;
    io::stdout().write_all(&output)?;

    Ok(())
}

/// Install a stderr subscriber; stdout belongs to protoc
fn init_tracing(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
