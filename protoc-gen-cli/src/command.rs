//! Command tree assembly
//!
//! Turns the resource/verb table of one service into a two-level command tree:
//! one parent command per group, one runnable leaf per method.

use std::collections::HashSet;

use heck::ToSnakeCase;

use crate::config::Layout;
use crate::error::GeneratorError;
use crate::resolver::ResourceVerbTable;

/// Name of the flag that takes the whole request as JSON
pub const REQUEST_FLAG: &str = "request";

/// A command in the generated CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// PascalCase name, e.g. `AccountsListAccount`
    pub name: String,

    /// Alternative name the command can be invoked by
    pub alias: Option<String>,

    /// Sub-commands in registration order
    pub children: Vec<Command>,

    /// Fully-qualified request message whose flags the command registers
    pub request_type: Option<String>,

    /// Whether the command registers the raw JSON `request` flag
    pub has_request: bool,

    /// Whether the command does something on its own (leaves only)
    pub runnable: bool,
}

impl Command {
    /// Name the command is invoked by on the command line
    pub fn use_name(&self) -> String {
        self.name.to_lowercase()
    }

    fn leaf(name: String, alias: &str, request_type: &str) -> Self {
        Self {
            name,
            alias: Some(alias.to_lowercase()),
            children: Vec::new(),
            request_type: Some(request_type.to_string()),
            has_request: true,
            runnable: true,
        }
    }

    fn group(name: String, alias: &str, children: Vec<Command>) -> Self {
        Self {
            name,
            alias: Some(alias.to_lowercase()),
            children,
            request_type: None,
            has_request: false,
            runnable: false,
        }
    }
}

/// Build the command tree of `service`
///
/// Leaves are aliased by the part of their name their parent does not
/// already carry (`accounts list account`), parents by their own group key.
/// Two commands that would share a generated function or an invocation name
/// among siblings are a [`GeneratorError::DuplicateCommand`].
pub fn assemble(
    service: &str,
    table: &ResourceVerbTable,
    layout: Layout,
) -> Result<Vec<Command>, GeneratorError> {
    let commands: Vec<Command> = match layout {
        Layout::Resource => table
            .resources()
            .iter()
            .map(|entry| {
                let children = entry
                    .verbs
                    .iter()
                    .map(|v| {
                        let name = pascal_case(&[service, entry.resource.as_str(), v.verb.as_str()]);
                        Command::leaf(name, &v.verb, &v.request_type)
                    })
                    .collect();
                let name = pascal_case(&[service, entry.resource.as_str()]);
                Command::group(name, &entry.resource, children)
            })
            .collect(),
        Layout::Verb => {
            let mut groups: Vec<(&str, Vec<Command>)> = Vec::new();
            for entry in table.resources() {
                for v in &entry.verbs {
                    let name = pascal_case(&[service, v.verb.as_str(), entry.resource.as_str()]);
                    let leaf = Command::leaf(name, &entry.resource, &v.request_type);
                    match groups.iter_mut().find(|(verb, _)| *verb == v.verb) {
                        Some((_, children)) => children.push(leaf),
                        None => groups.push((v.verb.as_str(), vec![leaf])),
                    }
                }
            }
            groups
                .into_iter()
                .map(|(verb, children)| Command::group(pascal_case(&[service, verb]), verb, children))
                .collect()
        }
    };

    check_unique(&commands, &mut HashSet::new())?;
    Ok(commands)
}

/// Reject repeated function names anywhere in the tree and repeated
/// invocation names (name or alias) among siblings
fn check_unique(commands: &[Command], fn_names: &mut HashSet<String>) -> Result<(), GeneratorError> {
    let mut invoked = HashSet::new();
    for command in commands {
        let duplicate = || GeneratorError::DuplicateCommand {
            name: command.name.clone(),
        };
        if !fn_names.insert(command.name.to_snake_case()) {
            return Err(duplicate());
        }
        for name in std::iter::once(command.use_name()).chain(command.alias.clone()) {
            if !invoked.insert(name) {
                return Err(duplicate());
            }
        }
        check_unique(&command.children, fn_names)?;
    }
    Ok(())
}

/// Concatenate `parts` with the first character of each upper-cased
///
/// The rest of every part is kept as is: `["Accounts", "list", "account"]`
/// becomes `AccountsListAccount`.
pub fn pascal_case(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
