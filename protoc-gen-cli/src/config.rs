//! Plugin parameters
//!
//! protoc passes everything between `--cli_out=` and `:` as a single
//! comma-separated string:
//!
//!   protoc --cli_out=layout=resource,request_short=none:./gen proto/*.proto

use crate::error::GeneratorError;

/// How commands are grouped under their parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Parent per verb, leaves named `<Service><Verb><Resource>`
    #[default]
    Verb,
    /// Parent per resource, leaves named `<Service><Resource><Verb>`
    Resource,
}

/// Parsed plugin parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Command grouping
    pub layout: Layout,

    /// Short flag for the raw JSON `request` flag
    pub request_short: Option<char>,

    /// Log filter directive, overrides `RUST_LOG`
    pub log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: Layout::Verb,
            request_short: Some('d'),
            log: None,
        }
    }
}

impl Config {
    /// Parse the protoc parameter string
    pub fn parse(param: &str) -> Result<Self, GeneratorError> {
        let mut config = Config::default();

        for part in param.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| GeneratorError::InvalidParameter(format!("expected key=value, got `{part}`")))?;

            match key.trim() {
                "layout" => config.layout = parse_layout(value.trim())?,
                "request_short" => config.request_short = parse_short(value.trim())?,
                "log" => config.log = Some(value.trim().to_string()),
                other => {
                    return Err(GeneratorError::InvalidParameter(format!(
                        "unknown parameter `{other}`"
                    )));
                }
            }
        }

        Ok(config)
    }
}

fn parse_layout(value: &str) -> Result<Layout, GeneratorError> {
    match value {
        "verb" => Ok(Layout::Verb),
        "resource" => Ok(Layout::Resource),
        other => Err(GeneratorError::InvalidParameter(format!(
            "layout must be `verb` or `resource`, got `{other}`"
        ))),
    }
}

fn parse_short(value: &str) -> Result<Option<char>, GeneratorError> {
    if value.is_empty() || value == "none" {
        return Ok(None);
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(Some(c)),
        _ => Err(GeneratorError::InvalidParameter(format!(
            "request_short must be a single letter or `none`, got `{value}`"
        ))),
    }
}
