//! Error types for code generation
//!
//! Every fatal condition of a generation run is a variant here. Methods whose
//! names cannot be resolved to a resource/verb pair are not errors; they are
//! skipped by the resolver.

/// Error type for code generation
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Two methods map to the same resource and verb with different requests
    #[error(
        "verb clash: resource `{resource}`, verb `{verb}` maps to both `{existing}` and `{conflicting}`"
    )]
    VerbCollision {
        /// Resource both methods resolved to
        resource: String,
        /// Verb both methods resolved to
        verb: String,
        /// Request type already registered
        existing: String,
        /// Request type that was rejected
        conflicting: String,
    },

    /// A `(cli.resource)` or `(cli.verb)` option is present but not a string
    #[error("error reading option `{extension}` on method `{method}`: expected a string, found {found}")]
    MalformedAnnotation {
        /// Fully-qualified method name
        method: String,
        /// Extension name, e.g. `cli.verb`
        extension: String,
        /// Description of the value that was found
        found: String,
    },

    /// A field kind with no flag mapping
    #[error("field `{field}` of `{message}` has unsupported kind `{kind}`")]
    UnsupportedFieldKind {
        /// Fully-qualified message name
        message: String,
        /// Field name
        field: String,
        /// Kind as reported by the descriptor
        kind: String,
    },

    /// Two fields flatten to the same flag path
    #[error("flag `{flag}` is produced twice while flattening `{message}`")]
    FlagCollision {
        /// Fully-qualified message name
        message: String,
        /// Flattened flag path
        flag: String,
    },

    /// A request message declares a field that shadows the `request` flag
    #[error("request message `{message}` has a field named `request`, which is reserved")]
    ReservedFlag {
        /// Fully-qualified message name
        message: String,
    },

    /// Two methods would generate the same command
    #[error("command `{name}` would be generated twice; resource and verb names must differ by more than case")]
    DuplicateCommand {
        /// PascalCase command name
        name: String,
    },

    /// A method or field refers to a message that is not in the request
    #[error("message type not found: {0}")]
    UnknownMessage(String),

    /// A plugin parameter could not be understood
    #[error("invalid plugin parameter: {0}")]
    InvalidParameter(String),

    /// Failed to decode the code generator request
    #[error("decode error: {0}")]
    Decode(String),

    /// Generated code could not be produced
    #[error("code generation error: {0}")]
    CodeGen(String),
}

impl From<prost::DecodeError> for GeneratorError {
    fn from(e: prost::DecodeError) -> Self {
        GeneratorError::Decode(e.to_string())
    }
}

impl From<prost_reflect::DescriptorError> for GeneratorError {
    fn from(e: prost_reflect::DescriptorError) -> Self {
        GeneratorError::Decode(e.to_string())
    }
}
