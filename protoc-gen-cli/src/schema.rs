//! Backend-neutral descriptor model
//!
//! The generator core (resolver, flag compiler, assembler) only sees these
//! types. A descriptor backend (see [`crate::reflect`]) is responsible for
//! producing them from whatever schema representation it reads.

use std::collections::HashMap;

use crate::error::GeneratorError;

/// A fully resolved set of services and the message types they reference
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Proto files targeted for generation, in request order
    pub files: Vec<ProtoFile>,

    /// Every message type known to the request, keyed by fully-qualified name
    pub messages: HashMap<String, MessageType>,
}

impl Schema {
    /// Look up a message type by fully-qualified name
    pub fn message(&self, full_name: &str) -> Result<&MessageType, GeneratorError> {
        self.messages
            .get(full_name)
            .ok_or_else(|| GeneratorError::UnknownMessage(full_name.to_string()))
    }

    /// Register a message type, replacing any previous one with the same name
    pub fn insert_message(&mut self, message: MessageType) {
        self.messages.insert(message.full_name.clone(), message);
    }
}

/// A proto file that protoc asked us to generate for
#[derive(Debug, Clone)]
pub struct ProtoFile {
    /// File path as given to protoc, e.g. `acme/accounts.proto`
    pub name: String,

    /// Services declared in the file
    pub services: Vec<Service>,
}

/// A gRPC service
#[derive(Debug, Clone)]
pub struct Service {
    /// Short name, e.g. `Accounts`
    pub name: String,

    /// Fully-qualified name, e.g. `acme.Accounts`
    pub full_name: String,

    /// Methods in declaration order
    pub methods: Vec<Method>,
}

/// A service method
#[derive(Debug, Clone)]
pub struct Method {
    /// Short name, e.g. `GetAccountList`
    pub name: String,

    /// Fully-qualified name, e.g. `acme.Accounts.GetAccountList`
    pub full_name: String,

    /// Fully-qualified input message name
    pub input_type: String,

    /// Explicit overrides read from method options
    pub overrides: Overrides,
}

/// A message type
#[derive(Debug, Clone)]
pub struct MessageType {
    /// Short name, e.g. `GetAccountListRequest`
    pub name: String,

    /// Fully-qualified name, e.g. `acme.GetAccountListRequest`
    pub full_name: String,

    /// Fields in declaration order
    pub fields: Vec<Field>,
}

/// A message field
#[derive(Debug, Clone)]
pub struct Field {
    /// Proto field name
    pub name: String,

    /// Element kind (for repeated fields, the kind of each element)
    pub kind: FieldKind,

    /// `repeated` label. Map fields are never marked repeated.
    pub repeated: bool,
}

impl Field {
    /// A singular field
    pub fn singular(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            repeated: false,
        }
    }

    /// A repeated field
    pub fn repeated(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            repeated: true,
        }
    }
}

/// What a field holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A primitive value
    Scalar(Scalar),

    /// An enum, by fully-qualified name
    Enum(String),

    /// An embedded message, by fully-qualified name
    Message(String),

    /// A map field
    Map {
        /// Key kind
        key: Box<FieldKind>,
        /// Value kind
        value: Box<FieldKind>,
    },

    /// A proto2 group, by fully-qualified name
    Group(String),
}

impl FieldKind {
    /// Whether values of this kind are messages
    pub fn is_message(&self) -> bool {
        matches!(self, FieldKind::Message(_) | FieldKind::Group(_))
    }
}

/// Primitive proto types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Double,
    Float,
    Int32,
    Sint32,
    Sfixed32,
    Uint32,
    Fixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint64,
    Fixed64,
    Bool,
    String,
    Bytes,
}

/// Explicit resource / verb overrides attached to a method
///
/// Both values are independent; either may be set without the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `(cli.resource)`
    pub resource: Option<String>,

    /// `(cli.verb)`
    pub verb: Option<String>,
}

impl Overrides {
    /// Read both overrides from an annotation source
    pub fn collect(source: &impl MethodAnnotations) -> Result<Self, GeneratorError> {
        Ok(Self {
            resource: source.try_resource()?,
            verb: source.try_verb()?,
        })
    }
}

/// Access to the per-method resource / verb annotations of a descriptor backend
pub trait MethodAnnotations {
    /// Explicit resource, if the method carries one
    fn try_resource(&self) -> Result<Option<String>, GeneratorError>;

    /// Explicit verb, if the method carries one
    fn try_verb(&self) -> Result<Option<String>, GeneratorError>;
}

impl MethodAnnotations for Overrides {
    fn try_resource(&self) -> Result<Option<String>, GeneratorError> {
        Ok(self.resource.clone())
    }

    fn try_verb(&self) -> Result<Option<String>, GeneratorError> {
        Ok(self.verb.clone())
    }
}
