//! Code generation orchestration
//!
//! One run covers one `CodeGeneratorRequest`: every targeted service is
//! resolved, its request types are compiled into flag schemas (shared across
//! the whole run), its command tree is assembled, and each proto file with at
//! least one service yields one generated file.

use std::collections::BTreeMap;

use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::CodeGeneratorResponse;

use crate::command::{self, Command, REQUEST_FLAG};
use crate::config::Config;
use crate::error::GeneratorError;
use crate::flags::{FlagCompiler, FlagSchema};
use crate::reflect;
use crate::render::{RenderInput, Renderer};
use crate::resolver::{self, ResourceVerbTable};
use crate::schema::{Schema, Service};

/// Generate command trees from a serialized `CodeGeneratorRequest`
pub fn generate_from_bytes(
    bytes: &[u8],
    renderer: &dyn Renderer,
) -> Result<CodeGeneratorResponse, GeneratorError> {
    let request = reflect::decode_request(bytes)?;
    let config = Config::parse(&request.parameter)?;
    generate(&request.schema, &config, renderer)
}

/// Generate command trees for every targeted file in `schema`
pub fn generate(
    schema: &Schema,
    config: &Config,
    renderer: &dyn Renderer,
) -> Result<CodeGeneratorResponse, GeneratorError> {
    let mut compiler = FlagCompiler::new(schema);
    let mut files = Vec::new();

    for proto_file in &schema.files {
        if proto_file.services.is_empty() {
            continue;
        }

        let mut commands = Vec::new();
        let mut flagsets = BTreeMap::new();
        for service in &proto_file.services {
            let service_commands = generate_service(service, config, &mut compiler, &mut flagsets)?;
            commands.extend(service_commands);
        }

        let content = renderer.render(&RenderInput {
            source: &proto_file.name,
            commands: &commands,
            flagsets: &flagsets,
            request_short: config.request_short,
        })?;

        let name = renderer.file_name(&proto_file.name);
        tracing::info!(file = %name, renderer = renderer.name(), "generated");
        files.push(File {
            name: Some(name),
            content: Some(content),
            ..Default::default()
        });
    }

    tracing::debug!(walks = compiler.walks(), "flag schemas compiled");

    Ok(CodeGeneratorResponse {
        file: files,
        error: None,
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    })
}

/// Resolve, compile and assemble one service
///
/// Every method's request type gets a flag schema, resolved or not. Only
/// resolved methods end up in the command tree.
fn generate_service(
    service: &Service,
    config: &Config,
    compiler: &mut FlagCompiler<'_>,
    flagsets: &mut BTreeMap<String, FlagSchema>,
) -> Result<Vec<Command>, GeneratorError> {
    let _span = tracing::debug_span!("service", name = %service.full_name).entered();

    let mut table = ResourceVerbTable::new();
    for method in &service.methods {
        match resolver::resolve(&method.name, &method.overrides)? {
            Some(rv) => {
                tracing::debug!(
                    method = %method.full_name,
                    resource = %rv.resource,
                    verb = %rv.verb,
                    "resolved method"
                );
                table.insert(&rv.resource, &rv.verb, &method.input_type)?;
            }
            None => {
                tracing::debug!(method = %method.full_name, "no resource/verb for method, skipping command");
            }
        }

        if !flagsets.contains_key(&method.input_type) {
            let schema = compiler.compile(&method.input_type)?;
            tracing::debug!(message = %schema.full_name, flags = schema.len(), "compiled flag schema");
            if schema.flags.contains_key(REQUEST_FLAG) {
                return Err(GeneratorError::ReservedFlag {
                    message: schema.full_name.clone(),
                });
            }
            flagsets.insert(method.input_type.clone(), schema.clone());
        }
    }

    if table.is_empty() {
        tracing::warn!(service = %service.full_name, "no method resolved to a resource and verb");
    }

    command::assemble(&service.name, &table, config.layout)
}
