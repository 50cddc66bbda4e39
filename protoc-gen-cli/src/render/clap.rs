//! clap command builders
//!
//! Generates one `<name>_command()` function per command returning a
//! `clap::Command`, and one `<request>_flags(cmd)` function per flag schema
//! that registers every flattened flag on a command.
//!
//! Bytes flags are checked to be standard base64 on the command line but are
//! handed to the caller as the base64 text; decoding is left to the code that
//! builds the request.

use std::collections::{BTreeMap, HashMap};

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{RenderInput, Renderer};
use crate::command::{Command, REQUEST_FLAG};
use crate::error::GeneratorError;
use crate::flags::{FlagKind, FlagSchema, FlagType};

/// Renders Rust source that builds the CLI with clap's builder API
#[derive(Debug, Default, Clone, Copy)]
pub struct ClapRenderer;

impl Renderer for ClapRenderer {
    fn name(&self) -> &str {
        "clap"
    }

    fn file_name(&self, proto_file: &str) -> String {
        let stem = proto_file.strip_suffix(".proto").unwrap_or(proto_file);
        format!("{stem}.cli.rs")
    }

    fn render(&self, input: &RenderInput<'_>) -> Result<String, GeneratorError> {
        let flagset_fns = flagset_fn_names(input.flagsets)?;

        let mut items = Vec::new();
        for command in input.commands {
            command_tokens(command, &flagset_fns, input.request_short, &mut items)?;
        }

        let uses_string_map = input
            .flagsets
            .values()
            .flat_map(|schema| schema.flags.values())
            .any(|flag| flag.kind == FlagKind::StringMap);
        if uses_string_map {
            items.push(key_value_parser());
        }
        let uses_bytes = input
            .flagsets
            .values()
            .flat_map(|schema| schema.flags.values())
            .any(|flag| flag.kind == FlagKind::Bytes);
        if uses_bytes {
            items.push(base64_parser());
        }

        for (full_name, schema) in input.flagsets {
            items.push(flagset_tokens(schema, &flagset_fns[full_name.as_str()]));
        }

        let code = format_code(quote! { #(#items)* })?;
        Ok(format!(
            "// @generated by protoc-gen-cli. DO NOT EDIT.\n// source: {}\n\n{}",
            input.source, code
        ))
    }
}

/// Function name for every flag schema
///
/// Schemas are named after their short message name unless another schema
/// in the file shares it, in which case the fully-qualified name is used.
fn flagset_fn_names(
    flagsets: &BTreeMap<String, FlagSchema>,
) -> Result<HashMap<&str, String>, GeneratorError> {
    let mut short_names: HashMap<String, usize> = HashMap::new();
    for schema in flagsets.values() {
        *short_names.entry(schema.name.to_snake_case()).or_default() += 1;
    }

    let mut names: HashMap<&str, String> = HashMap::new();
    let mut owners: HashMap<String, &str> = HashMap::new();

    for (full_name, schema) in flagsets {
        let short = schema.name.to_snake_case();
        let stem = if short_names.get(&short).copied().unwrap_or_default() > 1 {
            full_name.to_snake_case()
        } else {
            short
        };
        let fn_name = format!("{stem}_flags");
        if let Some(other) = owners.insert(fn_name.clone(), full_name) {
            return Err(GeneratorError::CodeGen(format!(
                "`{other}` and `{full_name}` both generate `{fn_name}`"
            )));
        }
        names.insert(full_name, fn_name);
    }

    Ok(names)
}

fn command_fn(command: &Command) -> proc_macro2::Ident {
    format_ident!("{}_command", command.name.to_snake_case())
}

/// Emit `command` after all of its children
fn command_tokens(
    command: &Command,
    flagset_fns: &HashMap<&str, String>,
    request_short: Option<char>,
    items: &mut Vec<TokenStream>,
) -> Result<(), GeneratorError> {
    for child in &command.children {
        command_tokens(child, flagset_fns, request_short, items)?;
    }

    let fn_ident = command_fn(command);
    let use_name = command.use_name();

    let alias = command.alias.as_ref().map(|alias| quote! { .alias(#alias) });

    let required = (!command.runnable && !command.children.is_empty()).then(|| {
        quote! {
            .subcommand_required(true)
            .arg_required_else_help(true)
        }
    });

    let subcommands = command.children.iter().map(|child| {
        let child_fn = command_fn(child);
        quote! { .subcommand(#child_fn()) }
    });

    let request = command.has_request.then(|| {
        let short = request_short.map(|c| quote! { .short(#c) });
        quote! {
            .arg(
                ::clap::Arg::new(#REQUEST_FLAG)
                    #short
                    .long(#REQUEST_FLAG)
                    .help("request object in json format")
            )
        }
    });

    let flags = match &command.request_type {
        Some(request_type) => {
            let flags_fn = flagset_fns.get(request_type.as_str()).ok_or_else(|| {
                GeneratorError::CodeGen(format!(
                    "no flag schema for `{request_type}` used by `{}`",
                    command.name
                ))
            })?;
            let flags_fn = format_ident!("{}", flags_fn);
            quote! { #flags_fn(cmd) }
        }
        None => quote! { cmd },
    };

    items.push(quote! {
        pub fn #fn_ident() -> ::clap::Command {
            let cmd = ::clap::Command::new(#use_name)
                #alias
                #required
                #(#subcommands)*
                #request;
            #flags
        }
    });
    Ok(())
}

fn flagset_tokens(schema: &FlagSchema, fn_name: &str) -> TokenStream {
    let fn_ident = format_ident!("{}", fn_name);
    let doc = format!(" Registers the flags that populate `{}`.", schema.full_name);
    let args = schema.flags.iter().map(|(path, flag)| flag_arg(path, flag));

    quote! {
        #[doc = #doc]
        pub fn #fn_ident(cmd: ::clap::Command) -> ::clap::Command {
            cmd #(.arg(#args))*
        }
    }
}

/// One `clap::Arg` per flag, following the flag's registration and default
fn flag_arg(path: &str, flag: &FlagType) -> TokenStream {
    let action = if flag.slice || flag.kind == FlagKind::StringMap {
        quote! { ::clap::ArgAction::Append }
    } else if flag.kind == FlagKind::Bool {
        quote! { ::clap::ArgAction::SetTrue }
    } else {
        quote! { ::clap::ArgAction::Set }
    };

    let value_name = flag.registration().to_uppercase();
    let parser = match flag.kind {
        FlagKind::StringMap => quote! { .value_parser(parse_key_value).value_name("KEY=VALUE") },
        FlagKind::Bytes => quote! { .value_parser(parse_base64).value_name(#value_name) },
        FlagKind::Bool if !flag.slice => quote! {},
        kind => {
            let ty = value_type(kind);
            quote! { .value_parser(::clap::value_parser!(#ty)).value_name(#value_name) }
        }
    };

    let default = flag
        .default_value()
        .literal()
        .map(|value| quote! { .default_value(#value) });

    quote! {
        ::clap::Arg::new(#path)
            .long(#path)
            .action(#action)
            #parser
            #default
    }
}

fn value_type(kind: FlagKind) -> TokenStream {
    match kind {
        FlagKind::Bool => quote! { bool },
        FlagKind::Int32 => quote! { i32 },
        FlagKind::Int64 => quote! { i64 },
        FlagKind::Uint32 => quote! { u32 },
        FlagKind::Uint64 => quote! { u64 },
        FlagKind::Float32 => quote! { f32 },
        FlagKind::Float64 => quote! { f64 },
        FlagKind::Bytes | FlagKind::String | FlagKind::StringMap => quote! { String },
    }
}

fn key_value_parser() -> TokenStream {
    quote! {
        fn parse_key_value(s: &str) -> Result<(String, String), String> {
            s.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))
        }
    }
}

fn base64_parser() -> TokenStream {
    quote! {
        fn parse_base64(s: &str) -> Result<String, String> {
            let body = s.trim_end_matches('=');
            let valid = s.len() % 4 == 0
                && s.len() - body.len() <= 2
                && body
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/');
            if valid {
                Ok(s.to_string())
            } else {
                Err(format!("expected standard base64, got `{s}`"))
            }
        }
    }
}

/// Format the generated code using prettyplease
fn format_code(tokens: TokenStream) -> Result<String, GeneratorError> {
    let code = tokens.to_string();
    let parsed = syn::parse_file(&code)
        .map_err(|e| GeneratorError::CodeGen(format!("Failed to parse generated code: {}", e)))?;
    Ok(prettyplease::unparse(&parsed))
}
