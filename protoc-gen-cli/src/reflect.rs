//! prost-reflect descriptor backend
//!
//! prost drops unknown fields when it decodes `FileDescriptorProto`, which
//! would lose our custom method options. The request is therefore decoded in
//! two steps: first into [`RawCodeGeneratorRequest`] with every proto file
//! kept as raw bytes, then into a prost-reflect [`DescriptorPool`], which keeps
//! extension values and lets us read `(cli.resource)` and `(cli.verb)`.

use prost::Message;
use prost_reflect::{
    DescriptorPool, ExtensionDescriptor, FieldDescriptor, Kind, MessageDescriptor,
    MethodDescriptor, ReflectMessage, Value,
};

use crate::error::GeneratorError;
use crate::schema::{
    Field, FieldKind, MessageType, Method, MethodAnnotations, Overrides, ProtoFile, Scalar,
    Schema, Service,
};

/// Extension carrying the resource override
pub const RESOURCE_EXTENSION_NAME: &str = "cli.resource";

/// Extension carrying the verb override
pub const VERB_EXTENSION_NAME: &str = "cli.verb";

#[derive(Clone, PartialEq, prost::Message)]
struct RawCodeGeneratorRequest {
    #[prost(string, repeated, tag = "1")]
    file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    parameter: Option<String>,
    #[prost(bytes = "vec", repeated, tag = "15")]
    proto_file: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct RawFileDescriptorSet {
    #[prost(bytes = "vec", repeated, tag = "1")]
    file: Vec<Vec<u8>>,
}

/// A decoded code generator request
#[derive(Debug)]
pub struct Request {
    /// Raw plugin parameter string
    pub parameter: String,

    /// Targeted services and every known message type
    pub schema: Schema,
}

/// Decode a serialized `CodeGeneratorRequest`
pub fn decode_request(bytes: &[u8]) -> Result<Request, GeneratorError> {
    let raw = RawCodeGeneratorRequest::decode(bytes)?;

    let fds = RawFileDescriptorSet {
        file: raw.proto_file,
    };
    let pool = DescriptorPool::decode(fds.encode_to_vec().as_slice())?;

    let schema = build_schema(&pool, &raw.file_to_generate)?;
    Ok(Request {
        parameter: raw.parameter.unwrap_or_default(),
        schema,
    })
}

/// Read only the plugin parameter of a serialized `CodeGeneratorRequest`
pub fn peek_parameter(bytes: &[u8]) -> Result<String, GeneratorError> {
    let raw = RawCodeGeneratorRequest::decode(bytes)?;
    Ok(raw.parameter.unwrap_or_default())
}

/// Build the backend-neutral schema for the files in `targets`
pub fn build_schema(pool: &DescriptorPool, targets: &[String]) -> Result<Schema, GeneratorError> {
    let extensions = CliExtensions::lookup(pool);
    let mut schema = Schema::default();

    for message in pool.all_messages() {
        if message.is_map_entry() {
            continue;
        }
        schema.insert_message(convert_message(&message)?);
    }

    for target in targets {
        let file = pool.get_file_by_name(target).ok_or_else(|| {
            GeneratorError::Decode(format!("file descriptor not found: {target}"))
        })?;

        let mut services = Vec::new();
        for svc in file.services() {
            let mut methods = Vec::new();
            for method in svc.methods() {
                let annotations = ProtoMethod {
                    method: &method,
                    extensions: &extensions,
                };
                methods.push(Method {
                    name: method.name().to_string(),
                    full_name: method.full_name().to_string(),
                    input_type: method.input().full_name().to_string(),
                    overrides: Overrides::collect(&annotations)?,
                });
            }
            services.push(Service {
                name: svc.name().to_string(),
                full_name: svc.full_name().to_string(),
                methods,
            });
        }

        schema.files.push(ProtoFile {
            name: file.name().to_string(),
            services,
        });
    }

    Ok(schema)
}

fn convert_message(message: &MessageDescriptor) -> Result<MessageType, GeneratorError> {
    let mut fields = Vec::new();
    for field in message.fields() {
        let kind = if field.is_map() {
            map_kind(message, &field)?
        } else {
            field_kind(message, &field)?
        };
        fields.push(if field.is_list() {
            Field::repeated(field.name(), kind)
        } else {
            Field::singular(field.name(), kind)
        });
    }

    Ok(MessageType {
        name: message.name().to_string(),
        full_name: message.full_name().to_string(),
        fields,
    })
}

fn map_kind(message: &MessageDescriptor, field: &FieldDescriptor) -> Result<FieldKind, GeneratorError> {
    let Kind::Message(entry) = field.kind() else {
        return Err(unsupported(message, field, "map without entry message"));
    };
    Ok(FieldKind::Map {
        key: Box::new(field_kind(&entry, &entry.map_entry_key_field())?),
        value: Box::new(field_kind(&entry, &entry.map_entry_value_field())?),
    })
}

fn field_kind(message: &MessageDescriptor, field: &FieldDescriptor) -> Result<FieldKind, GeneratorError> {
    let scalar = match field.kind() {
        Kind::Message(m) if field.is_group() => return Ok(FieldKind::Group(m.full_name().to_string())),
        Kind::Message(m) => return Ok(FieldKind::Message(m.full_name().to_string())),
        Kind::Enum(e) => return Ok(FieldKind::Enum(e.full_name().to_string())),
        Kind::Double => Scalar::Double,
        Kind::Float => Scalar::Float,
        Kind::Int32 => Scalar::Int32,
        Kind::Sint32 => Scalar::Sint32,
        Kind::Sfixed32 => Scalar::Sfixed32,
        Kind::Uint32 => Scalar::Uint32,
        Kind::Fixed32 => Scalar::Fixed32,
        Kind::Int64 => Scalar::Int64,
        Kind::Sint64 => Scalar::Sint64,
        Kind::Sfixed64 => Scalar::Sfixed64,
        Kind::Uint64 => Scalar::Uint64,
        Kind::Fixed64 => Scalar::Fixed64,
        Kind::Bool => Scalar::Bool,
        Kind::String => Scalar::String,
        Kind::Bytes => Scalar::Bytes,
        #[allow(unreachable_patterns)]
        other => return Err(unsupported(message, field, &format!("{other:?}"))),
    };
    Ok(FieldKind::Scalar(scalar))
}

fn unsupported(message: &MessageDescriptor, field: &FieldDescriptor, kind: &str) -> GeneratorError {
    GeneratorError::UnsupportedFieldKind {
        message: message.full_name().to_string(),
        field: field.name().to_string(),
        kind: kind.to_string(),
    }
}

/// Handles to the `cli.*` extensions, absent when no file declares them
struct CliExtensions {
    resource: Option<ExtensionDescriptor>,
    verb: Option<ExtensionDescriptor>,
}

impl CliExtensions {
    fn lookup(pool: &DescriptorPool) -> Self {
        Self {
            resource: pool.get_extension_by_name(RESOURCE_EXTENSION_NAME),
            verb: pool.get_extension_by_name(VERB_EXTENSION_NAME),
        }
    }
}

/// A method together with the extensions to read its overrides from
struct ProtoMethod<'a> {
    method: &'a MethodDescriptor,
    extensions: &'a CliExtensions,
}

impl ProtoMethod<'_> {
    fn read(&self, ext: Option<&ExtensionDescriptor>) -> Result<Option<String>, GeneratorError> {
        let Some(ext) = ext else {
            return Ok(None);
        };
        let options = self.method.options();
        if !options.has_extension(ext) {
            return Ok(None);
        }
        string_option(self.method.full_name(), ext.full_name(), &options.get_extension(ext))
    }
}

impl MethodAnnotations for ProtoMethod<'_> {
    fn try_resource(&self) -> Result<Option<String>, GeneratorError> {
        self.read(self.extensions.resource.as_ref())
    }

    fn try_verb(&self) -> Result<Option<String>, GeneratorError> {
        self.read(self.extensions.verb.as_ref())
    }
}

/// Interpret an option value that must be a string
fn string_option(method: &str, extension: &str, value: &Value) -> Result<Option<String>, GeneratorError> {
    match value {
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(GeneratorError::MalformedAnnotation {
            method: method.to_string(),
            extension: extension.to_string(),
            found: describe(other),
        }),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Bool(v) => format!("bool {v}"),
        Value::I32(v) => format!("int32 {v}"),
        Value::I64(v) => format!("int64 {v}"),
        Value::U32(v) => format!("uint32 {v}"),
        Value::U64(v) => format!("uint64 {v}"),
        Value::F32(v) => format!("float {v}"),
        Value::F64(v) => format!("double {v}"),
        Value::EnumNumber(v) => format!("enum value {v}"),
        Value::Bytes(_) => "bytes".to_string(),
        Value::Message(m) => format!("message {}", m.descriptor().full_name()),
        Value::List(_) => "list".to_string(),
        Value::Map(_) => "map".to_string(),
        Value::String(s) => format!("string {s:?}"),
        #[allow(unreachable_patterns)]
        _ => "unknown value".to_string(),
    }
}
