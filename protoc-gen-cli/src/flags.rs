//! Flag schema compilation
//!
//! A request message is flattened into a set of command-line flags, one per
//! reachable scalar, enum, repeated scalar or string-keyed map field. Embedded
//! messages contribute their own flags under a dotted prefix
//! (`address.city`), so arbitrarily nested requests end up in a single flat
//! namespace.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::error::GeneratorError;
use crate::schema::{Field, FieldKind, Scalar, Schema};

/// Value kind of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Bytes,
    String,
    StringMap,
}

impl FlagKind {
    /// Flag kind for a primitive proto type
    pub fn from_scalar(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Float => FlagKind::Float32,
            Scalar::Double => FlagKind::Float64,
            Scalar::Int32 | Scalar::Sint32 | Scalar::Sfixed32 => FlagKind::Int32,
            Scalar::Uint32 | Scalar::Fixed32 => FlagKind::Uint32,
            Scalar::Int64 | Scalar::Sint64 | Scalar::Sfixed64 => FlagKind::Int64,
            Scalar::Uint64 | Scalar::Fixed64 => FlagKind::Uint64,
            Scalar::Bytes => FlagKind::Bytes,
            Scalar::String => FlagKind::String,
            Scalar::Bool => FlagKind::Bool,
        }
    }

    fn registration(self) -> &'static str {
        match self {
            FlagKind::Bool => "bool",
            FlagKind::Int32 => "int32",
            FlagKind::Int64 => "int64",
            FlagKind::Uint32 => "uint32",
            FlagKind::Uint64 => "uint64",
            FlagKind::Float32 => "float32",
            FlagKind::Float64 => "float64",
            FlagKind::Bytes => "bytes_base64",
            FlagKind::String => "string",
            FlagKind::StringMap => "string_to_string",
        }
    }
}

/// Default value a flag is registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagDefault {
    /// `false`
    False,
    /// `0`
    Zero,
    /// `""`
    EmptyString,
    /// No bytes
    EmptyBytes,
    /// No `key=value` pairs
    EmptyMap,
    /// No values
    EmptySlice,
}

impl FlagDefault {
    /// Literal for defaults that are a single value, `None` for empty
    /// collections
    pub fn literal(self) -> Option<&'static str> {
        match self {
            FlagDefault::False => Some("false"),
            FlagDefault::Zero => Some("0"),
            FlagDefault::EmptyString => Some(""),
            FlagDefault::EmptyBytes | FlagDefault::EmptyMap | FlagDefault::EmptySlice => None,
        }
    }
}

impl fmt::Display for FlagDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagDefault::False => f.write_str("false"),
            FlagDefault::Zero => f.write_str("0"),
            FlagDefault::EmptyString => f.write_str("\"\""),
            FlagDefault::EmptyBytes | FlagDefault::EmptySlice => f.write_str("[]"),
            FlagDefault::EmptyMap => f.write_str("{}"),
        }
    }
}

/// Type of a single flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagType {
    /// Value kind
    pub kind: FlagKind,
    /// Whether the flag collects several values
    pub slice: bool,
}

impl FlagType {
    /// A single-valued flag
    pub fn scalar(kind: FlagKind) -> Self {
        Self { kind, slice: false }
    }

    /// A multi-valued flag
    pub fn slice(kind: FlagKind) -> Self {
        Self { kind, slice: true }
    }

    /// Name of the registration used for this flag type
    ///
    /// Bytes and string maps have a dedicated registration whether or not
    /// they repeat; every other slice appends `_slice`.
    pub fn registration(&self) -> String {
        match self.kind {
            FlagKind::Bytes | FlagKind::StringMap => self.kind.registration().to_string(),
            kind if self.slice => format!("{}_slice", kind.registration()),
            kind => kind.registration().to_string(),
        }
    }

    /// Default value the flag is registered with
    pub fn default_value(&self) -> FlagDefault {
        if self.kind == FlagKind::StringMap {
            return FlagDefault::EmptyMap;
        }
        if self.slice {
            return FlagDefault::EmptySlice;
        }
        match self.kind {
            FlagKind::Bool => FlagDefault::False,
            FlagKind::Int32
            | FlagKind::Int64
            | FlagKind::Uint32
            | FlagKind::Uint64
            | FlagKind::Float32
            | FlagKind::Float64 => FlagDefault::Zero,
            FlagKind::Bytes => FlagDefault::EmptyBytes,
            FlagKind::String => FlagDefault::EmptyString,
            FlagKind::StringMap => FlagDefault::EmptyMap,
        }
    }
}

/// Flattened flags of one message type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSchema {
    /// Short message name, e.g. `GetAccountListRequest`
    pub name: String,

    /// Fully-qualified message name
    pub full_name: String,

    /// Flag path to flag type, sorted by path
    pub flags: BTreeMap<String, FlagType>,
}

impl FlagSchema {
    /// Flag type registered for `path`
    #[cfg(test)]
    pub fn get(&self, path: &str) -> Option<FlagType> {
        self.flags.get(path).copied()
    }

    /// Number of flags
    pub fn len(&self) -> usize {
        self.flags.len()
    }
}

/// Memoizing compiler from message types to flag schemas
///
/// Each message type is walked at most once per compiler; later requests for
/// the same type (from another method, or as an embedded field) reuse the
/// stored schema.
pub struct FlagCompiler<'a> {
    schema: &'a Schema,
    compiled: HashMap<String, FlagSchema>,
    in_progress: HashSet<String>,
    walks: usize,
}

impl<'a> FlagCompiler<'a> {
    /// Create a compiler over `schema`
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            compiled: HashMap::new(),
            in_progress: HashSet::new(),
            walks: 0,
        }
    }

    /// Compile (or fetch) the flag schema of `full_name`
    pub fn compile(&mut self, full_name: &str) -> Result<&FlagSchema, GeneratorError> {
        if !self.compiled.contains_key(full_name) {
            let compiled = self.walk(full_name)?;
            self.compiled.insert(full_name.to_string(), compiled);
        }
        self.compiled
            .get(full_name)
            .ok_or_else(|| GeneratorError::UnknownMessage(full_name.to_string()))
    }

    /// Number of message types actually walked so far
    pub fn walks(&self) -> usize {
        self.walks
    }

    fn walk(&mut self, full_name: &str) -> Result<FlagSchema, GeneratorError> {
        let schema = self.schema;
        let message = schema.message(full_name)?;
        self.walks += 1;
        self.in_progress.insert(full_name.to_string());
        tracing::trace!(message = full_name, "compiling flag schema");

        let mut flags = BTreeMap::new();
        for field in &message.fields {
            for (path, flag) in self.field_flags(full_name, field)? {
                if flags.insert(path.clone(), flag).is_some() {
                    return Err(GeneratorError::FlagCollision {
                        message: full_name.to_string(),
                        flag: path,
                    });
                }
            }
        }

        self.in_progress.remove(full_name);
        Ok(FlagSchema {
            name: message.name.clone(),
            full_name: message.full_name.clone(),
            flags,
        })
    }

    fn field_flags(
        &mut self,
        message: &str,
        field: &Field,
    ) -> Result<Vec<(String, FlagType)>, GeneratorError> {
        let name = field.name.to_lowercase();

        if field.repeated {
            return Ok(match element_kind(message, field, &field.kind)? {
                Some(kind) => vec![(name, FlagType::slice(kind))],
                None => Vec::new(),
            });
        }

        match &field.kind {
            FieldKind::Enum(_) => Ok(vec![(name, FlagType::scalar(FlagKind::String))]),
            FieldKind::Map { key, value } => {
                let string_keys = **key == FieldKind::Scalar(Scalar::String);
                if string_keys && !value.is_message() {
                    Ok(vec![(name, FlagType::scalar(FlagKind::StringMap))])
                } else {
                    tracing::debug!(message, field = %field.name, "skipping map field");
                    Ok(Vec::new())
                }
            }
            FieldKind::Message(embedded) => {
                if self.in_progress.contains(embedded) {
                    tracing::warn!(
                        message,
                        field = %field.name,
                        embedded = %embedded,
                        "skipping recursive message field"
                    );
                    return Ok(Vec::new());
                }
                let sub = self.compile(embedded)?;
                Ok(sub
                    .flags
                    .iter()
                    .map(|(path, flag)| (format!("{name}.{path}").to_lowercase(), *flag))
                    .collect())
            }
            FieldKind::Scalar(scalar) => {
                Ok(vec![(name, FlagType::scalar(FlagKind::from_scalar(*scalar)))])
            }
            FieldKind::Group(_) => Err(unsupported(message, field)),
        }
    }
}

/// Flag kind of one element of a repeated field, `None` for message elements
fn element_kind(
    message: &str,
    field: &Field,
    kind: &FieldKind,
) -> Result<Option<FlagKind>, GeneratorError> {
    match kind {
        FieldKind::Scalar(scalar) => Ok(Some(FlagKind::from_scalar(*scalar))),
        FieldKind::Enum(_) => Ok(Some(FlagKind::String)),
        FieldKind::Message(_) => Ok(None),
        FieldKind::Map { .. } | FieldKind::Group(_) => Err(unsupported(message, field)),
    }
}

fn unsupported(message: &str, field: &Field) -> GeneratorError {
    let kind = match &field.kind {
        FieldKind::Group(name) => format!("group {name}"),
        FieldKind::Map { .. } => "repeated map".to_string(),
        other => format!("{other:?}"),
    };
    GeneratorError::UnsupportedFieldKind {
        message: message.to_string(),
        field: field.name.clone(),
        kind,
    }
}
