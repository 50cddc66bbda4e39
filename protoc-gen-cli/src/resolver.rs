//! Resource/verb resolution
//!
//! Every RPC is classified as a `(resource, verb)` pair, either from its name
//! (`VERB_RESOURCE` or `VERB_RESOURCE_LIST`) or from explicit
//! `(cli.resource)` / `(cli.verb)` options. The pairs are collected into a
//! [`ResourceVerbTable`] that rejects conflicting registrations.

use heck::ToSnakeCase;
use inflector::string::singularize::to_singular;

use crate::error::GeneratorError;
use crate::schema::MethodAnnotations;

/// A resolved resource and verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceVerb {
    /// Singular noun, e.g. `account`
    pub resource: String,
    /// Action, e.g. `list`
    pub verb: String,
}

/// Resolve a method to a resource and verb
///
/// Returns `Ok(None)` when no usable pair can be derived; that method is then
/// left out of the command tree. Malformed annotations are errors.
pub fn resolve(
    method_name: &str,
    annotations: &impl MethodAnnotations,
) -> Result<Option<ResourceVerb>, GeneratorError> {
    let (derived_resource, derived_verb) = split_rpc_name(method_name);

    let resource = annotations.try_resource()?.unwrap_or(derived_resource);
    let verb = annotations.try_verb()?.unwrap_or(derived_verb);

    if resource.is_empty() || verb.is_empty() {
        return Ok(None);
    }
    Ok(Some(ResourceVerb { resource, verb }))
}

/// Split an RPC name into `(resource, verb)`
///
/// Accepts `VERB_RESOURCE` and `VERB_RESOURCE_LIST` in any casing
/// (`GetAccountList`, `GET_ACCOUNT_LIST`). Any other shape yields two empty
/// strings.
pub fn split_rpc_name(name: &str) -> (String, String) {
    let lowered = name.to_snake_case().to_lowercase();
    let parts: Vec<&str> = lowered.split('_').collect();

    let (verb, resource, suffix) = match parts.as_slice() {
        [verb, resource] => (*verb, *resource, None),
        [verb, resource, suffix] => (*verb, *resource, Some(*suffix)),
        _ => return (String::new(), String::new()),
    };

    let verb = if verb == "get" && suffix == Some("list") {
        "list"
    } else {
        verb
    };

    (to_singular(resource), verb.to_string())
}

/// One verb registered under a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbEntry {
    /// Verb name
    pub verb: String,
    /// Fully-qualified request message type
    pub request_type: String,
}

/// All verbs of one resource, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Resource name
    pub resource: String,
    /// Verbs in the order their methods were declared
    pub verbs: Vec<VerbEntry>,
}

/// Mapping from resource to verb to request type
///
/// Resources keep the order in which they were first seen; verbs keep the
/// order their methods were declared in.
#[derive(Debug, Clone, Default)]
pub struct ResourceVerbTable {
    resources: Vec<ResourceEntry>,
}

impl ResourceVerbTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `request_type` under `resource`/`verb`
    ///
    /// Registering the exact same triple again is a no-op. Registering a
    /// different request type for an existing pair is a
    /// [`GeneratorError::VerbCollision`].
    pub fn insert(
        &mut self,
        resource: &str,
        verb: &str,
        request_type: &str,
    ) -> Result<(), GeneratorError> {
        let entry = match self.resources.iter().position(|r| r.resource == resource) {
            Some(idx) => &mut self.resources[idx],
            None => {
                self.resources.push(ResourceEntry {
                    resource: resource.to_string(),
                    verbs: Vec::new(),
                });
                let last = self.resources.len() - 1;
                &mut self.resources[last]
            }
        };

        if let Some(existing) = entry.verbs.iter().find(|v| v.verb == verb) {
            if existing.request_type == request_type {
                return Ok(());
            }
            return Err(GeneratorError::VerbCollision {
                resource: resource.to_string(),
                verb: verb.to_string(),
                existing: existing.request_type.clone(),
                conflicting: request_type.to_string(),
            });
        }

        entry.verbs.push(VerbEntry {
            verb: verb.to_string(),
            request_type: request_type.to_string(),
        });
        Ok(())
    }

    /// Resources in discovery order
    pub fn resources(&self) -> &[ResourceEntry] {
        &self.resources
    }

    /// Whether no method has been registered
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
