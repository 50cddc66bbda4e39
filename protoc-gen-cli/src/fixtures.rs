//! Descriptor builders for tests
//!
//! Builds `FileDescriptorProto`s by hand and wraps them in an encoded
//! `CodeGeneratorRequest`, the same bytes protoc would write to our stdin.

use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::descriptor_proto::ExtensionRange;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, MethodDescriptorProto, ServiceDescriptorProto,
};

pub fn field(name: &str, number: i32, ty: Type, type_name: Option<&str>) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        type_name: type_name.map(str::to_string),
        json_name: Some(heck::ToLowerCamelCase::to_lower_camel_case(name)),
        ..Default::default()
    }
}

pub fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

/// Add a `map<string, value>` field (and its entry message) to `msg`
///
/// `parent` is the fully-qualified name of `msg` with a leading dot.
pub fn with_map(
    mut msg: DescriptorProto,
    parent: &str,
    name: &str,
    number: i32,
    value: Type,
    value_type_name: Option<&str>,
) -> DescriptorProto {
    let entry_name = format!("{}Entry", heck::ToUpperCamelCase::to_upper_camel_case(name));
    msg.nested_type.push(DescriptorProto {
        name: Some(entry_name.clone()),
        field: vec![
            field("key", 1, Type::String, None),
            field("value", 2, value, value_type_name),
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    });
    msg.field.push(repeated(field(
        name,
        number,
        Type::Message,
        Some(&format!("{parent}.{entry_name}")),
    )));
    msg
}

pub fn enumeration(name: &str, values: &[&str]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .zip(0..)
            .map(|(value, number)| EnumValueDescriptorProto {
                name: Some(value.to_string()),
                number: Some(number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// A unary method whose response type is its request type
pub fn method(name: &str, input: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(input.to_string()),
        ..Default::default()
    }
}

pub fn service(name: &str, methods: Vec<MethodDescriptorProto>) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.to_string()),
        method: methods,
        ..Default::default()
    }
}

pub fn file(
    name: &str,
    package: &str,
    messages: Vec<DescriptorProto>,
    enums: Vec<EnumDescriptorProto>,
    services: Vec<ServiceDescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        message_type: messages,
        enum_type: enums,
        service: services,
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

/// Encode a `CodeGeneratorRequest` for `targets`
pub fn request(targets: &[&str], parameter: &str, files: Vec<FileDescriptorProto>) -> Vec<u8> {
    CodeGeneratorRequest {
        file_to_generate: targets.iter().map(|t| t.to_string()).collect(),
        parameter: Some(parameter.to_string()),
        proto_file: files,
        ..Default::default()
    }
    .encode_to_vec()
}

// prost_types::MethodOptions drops extension fields, so methods carrying
// `(cli.*)` options are encoded from these wire-compatible mirrors instead.

#[derive(Clone, PartialEq, prost::Message)]
pub struct RawMethod {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub input_type: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub output_type: Option<String>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub options: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RawService {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub method: Vec<RawMethod>,
}

/// The `service` field of `FileDescriptorProto` on its own
#[derive(Clone, PartialEq, prost::Message)]
struct RawFileServices {
    #[prost(message, repeated, tag = "6")]
    service: Vec<RawService>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct RawRequest {
    #[prost(string, repeated, tag = "1")]
    file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    parameter: Option<String>,
    #[prost(bytes = "vec", repeated, tag = "15")]
    proto_file: Vec<Vec<u8>>,
}

/// Encoded `MethodOptions` carrying a string `(cli.resource)` and `(cli.verb)`
pub fn cli_options(resource: Option<&str>, verb: Option<&str>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(resource) = resource {
        prost::encoding::string::encode(52001, &resource.to_string(), &mut buf);
    }
    if let Some(verb) = verb {
        prost::encoding::string::encode(52002, &verb.to_string(), &mut buf);
    }
    buf
}

/// Encoded `MethodOptions` carrying an int32 `(cli.verb)`
pub fn int32_verb_option(value: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    prost::encoding::int32::encode(52002, &value, &mut buf);
    buf
}

/// A unary method with raw `options`, response type = request type
pub fn annotated_method(name: &str, input: &str, options: Vec<u8>) -> RawMethod {
    RawMethod {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(input.to_string()),
        options: Some(options),
    }
}

pub fn raw_service(name: &str, methods: Vec<RawMethod>) -> RawService {
    RawService {
        name: Some(name.to_string()),
        method: methods,
    }
}

/// `google/protobuf/descriptor.proto`, trimmed to an extendable `MethodOptions`
pub fn descriptor_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/descriptor.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("MethodOptions".to_string()),
            extension_range: vec![ExtensionRange {
                start: Some(1000),
                end: Some(536_870_912),
                ..Default::default()
            }],
            ..Default::default()
        }],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    }
}

/// `cli/options.proto` with `cli.verb` declared as `verb_type`
pub fn cli_options_file(verb_type: Type) -> FileDescriptorProto {
    let extension = |name: &str, number: i32, ty: Type| FieldDescriptorProto {
        extendee: Some(".google.protobuf.MethodOptions".to_string()),
        ..field(name, number, ty, None)
    };
    FileDescriptorProto {
        name: Some("cli/options.proto".to_string()),
        package: Some("cli".to_string()),
        dependency: vec!["google/protobuf/descriptor.proto".to_string()],
        extension: vec![
            extension("resource", 52001, Type::String),
            extension("verb", 52002, verb_type),
        ],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

/// Encode `file` with `services` appended as raw service descriptors
pub fn with_raw_services(file: FileDescriptorProto, services: Vec<RawService>) -> Vec<u8> {
    let mut bytes = file.encode_to_vec();
    bytes.extend(RawFileServices { service: services }.encode_to_vec());
    bytes
}

/// Encode a `CodeGeneratorRequest` from already encoded files
pub fn raw_request(targets: &[&str], parameter: &str, files: Vec<Vec<u8>>) -> Vec<u8> {
    RawRequest {
        file_to_generate: targets.iter().map(|t| t.to_string()).collect(),
        parameter: Some(parameter.to_string()),
        proto_file: files,
    }
    .encode_to_vec()
}

/// `acme/accounts.proto` whose `Accounts.GetAccounts` method carries raw
/// `options`, together with the option declarations it depends on
pub fn annotated_request(verb_type: Type, options: Vec<u8>) -> Vec<u8> {
    let mut accounts = file(
        "acme/accounts.proto",
        "acme",
        vec![message("GetAccountsRequest", vec![field("id", 1, Type::String, None)])],
        vec![],
        vec![],
    );
    accounts.dependency = vec!["cli/options.proto".to_string()];

    let service = raw_service(
        "Accounts",
        vec![annotated_method("GetAccounts", ".acme.GetAccountsRequest", options)],
    );
    raw_request(
        &["acme/accounts.proto"],
        "",
        vec![
            descriptor_file().encode_to_vec(),
            cli_options_file(verb_type).encode_to_vec(),
            with_raw_services(accounts, vec![service]),
        ],
    )
}
