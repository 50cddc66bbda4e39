//! Renderers for command trees
//!
//! A renderer turns the command tree and flag schemas of one proto file into
//! the text of one generated file.

mod clap;

use std::collections::BTreeMap;

use crate::command::Command;
use crate::error::GeneratorError;
use crate::flags::FlagSchema;

pub use self::clap::ClapRenderer;

/// Everything a renderer needs for one output file
#[derive(Debug)]
pub struct RenderInput<'a> {
    /// Proto file the commands were generated from
    pub source: &'a str,

    /// Top-level commands of every service in the file
    pub commands: &'a [Command],

    /// Flag schemas referenced by `commands`, keyed by fully-qualified name
    pub flagsets: &'a BTreeMap<String, FlagSchema>,

    /// Short flag for the raw JSON `request` flag
    pub request_short: Option<char>,
}

/// A code generation target
pub trait Renderer {
    /// Renderer name, for logging
    fn name(&self) -> &str;

    /// Output path for commands generated from `proto_file`
    fn file_name(&self, proto_file: &str) -> String;

    /// Produce the generated file contents
    fn render(&self, input: &RenderInput<'_>) -> Result<String, GeneratorError>;
}
