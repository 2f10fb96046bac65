use std::{convert::TryFrom, fmt};

use strum::EnumIter;

use crate::{
    metadata::typesystem::{types, TypeRef},
    Error::{self, TypeConversionInvalid},
    Object, Result,
};

/// The primitive-like value kinds.
///
/// Every kind exists in two spellings, a bare primitive type (`i32`) and a boxed counterpart
/// (`core.Int32`); both are reachable through [`types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum PrimitiveKind {
    /// Boolean
    Boolean,
    /// Unicode scalar value
    Char,
    /// signed 8-bit integer
    I1,
    /// signed 16-bit integer
    I2,
    /// signed 32-bit integer
    I4,
    /// signed 64-bit integer
    I8,
    /// 32-bit floating point
    R4,
    /// 64-bit floating point
    R8,
}

impl PrimitiveKind {
    /// Name of the bare primitive type
    #[must_use]
    pub fn primitive_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::I1 => "i8",
            PrimitiveKind::I2 => "i16",
            PrimitiveKind::I4 => "i32",
            PrimitiveKind::I8 => "i64",
            PrimitiveKind::R4 => "f32",
            PrimitiveKind::R8 => "f64",
        }
    }

    /// Simple name of the boxed counterpart
    #[must_use]
    pub fn boxed_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::I1 => "Int8",
            PrimitiveKind::I2 => "Int16",
            PrimitiveKind::I4 => "Int32",
            PrimitiveKind::I8 => "Int64",
            PrimitiveKind::R4 => "Float32",
            PrimitiveKind::R8 => "Float64",
        }
    }

    /// The value a freshly initialized slot of this kind holds
    #[must_use]
    pub fn zero_value(&self) -> Value {
        match self {
            PrimitiveKind::Boolean => Value::Boolean(false),
            PrimitiveKind::Char => Value::Char('\0'),
            PrimitiveKind::I1 => Value::I1(0),
            PrimitiveKind::I2 => Value::I2(0),
            PrimitiveKind::I4 => Value::I4(0),
            PrimitiveKind::I8 => Value::I8(0),
            PrimitiveKind::R4 => Value::R4(0.0),
            PrimitiveKind::R8 => Value::R8(0.0),
        }
    }
}

/// A dynamically typed value flowing through field accessors, methods and constructors.
///
/// Scalars behave like boxed values: their [`Value::runtime_type`] is the boxed type of their
/// [`PrimitiveKind`], never the bare primitive type.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Character value
    Char(char),
    /// 8-bit signed integer
    I1(i8),
    /// 16-bit signed integer
    I2(i16),
    /// 32-bit signed integer
    I4(i32),
    /// 64-bit signed integer
    I8(i64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// String value
    String(String),
    /// Reference to an object
    Object(Object),
}

impl Value {
    /// Returns `true` for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The primitive kind of a scalar value
    #[must_use]
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Boolean(_) => Some(PrimitiveKind::Boolean),
            Value::Char(_) => Some(PrimitiveKind::Char),
            Value::I1(_) => Some(PrimitiveKind::I1),
            Value::I2(_) => Some(PrimitiveKind::I2),
            Value::I4(_) => Some(PrimitiveKind::I4),
            Value::I8(_) => Some(PrimitiveKind::I8),
            Value::R4(_) => Some(PrimitiveKind::R4),
            Value::R8(_) => Some(PrimitiveKind::R8),
            Value::Null | Value::String(_) | Value::Object(_) => None,
        }
    }

    /// The type this value reports at runtime.
    ///
    /// Scalars report their boxed type, strings the string type, objects their own type and
    /// `Null` the universal base type.
    #[must_use]
    pub fn runtime_type(&self) -> TypeRef {
        match self {
            Value::Null => types::object(),
            Value::String(_) => types::string(),
            Value::Object(object) => object.type_ref().clone(),
            scalar => match scalar.primitive_kind() {
                Some(kind) => types::boxed(kind),
                None => types::object(),
            },
        }
    }

    /// Try to convert to a boolean value
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to convert to a character value
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to convert to an 8-bit integer value
    #[must_use]
    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Value::I1(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to convert to a 16-bit integer value, widening smaller integers
    #[must_use]
    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Value::I1(value) => Some(i16::from(*value)),
            Value::I2(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to convert to a 32-bit integer value, widening smaller integers
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I1(value) => Some(i32::from(*value)),
            Value::I2(value) => Some(i32::from(*value)),
            Value::I4(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to convert to a 64-bit integer value, widening smaller integers
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I1(value) => Some(i64::from(*value)),
            Value::I2(value) => Some(i64::from(*value)),
            Value::I4(value) => Some(i64::from(*value)),
            Value::I8(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to convert to a 32-bit floating point value
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::I1(value) => Some(f32::from(*value)),
            Value::I2(value) => Some(f32::from(*value)),
            Value::R4(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to convert to a 64-bit floating point value, widening integers and `f32`
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I1(value) => Some(f64::from(*value)),
            Value::I2(value) => Some(f64::from(*value)),
            Value::I4(value) => Some(f64::from(*value)),
            Value::R4(value) => Some(f64::from(*value)),
            Value::R8(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to borrow the string payload
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Try to borrow the object payload
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    fn conversion_error(&self, expected: &str) -> Error {
        TypeConversionInvalid {
            expected: expected.to_string(),
            found: self.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I1(a), Value::I1(b)) => a == b,
            (Value::I2(a), Value::I2(b)) => a == b,
            (Value::I4(a), Value::I4(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::R4(a), Value::R4(b)) => a == b,
            (Value::R8(a), Value::R8(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Char(value) => write!(f, "'{}'", value),
            Value::I1(value) => write!(f, "{}", value),
            Value::I2(value) => write!(f, "{}", value),
            Value::I4(value) => write!(f, "{}", value),
            Value::I8(value) => write!(f, "{}", value),
            Value::R4(value) => write!(f, "{}", value),
            Value::R8(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "\"{}\"", value),
            Value::Object(object) => write!(f, "{}", object),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::I1(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::I2(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I4(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I8(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::R4(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::R8(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_boolean()
            .ok_or_else(|| value.conversion_error("bool"))
    }
}

impl TryFrom<Value> for char {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_char().ok_or_else(|| value.conversion_error("char"))
    }
}

impl TryFrom<Value> for i8 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_i8().ok_or_else(|| value.conversion_error("i8"))
    }
}

impl TryFrom<Value> for i16 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_i16().ok_or_else(|| value.conversion_error("i16"))
    }
}

impl TryFrom<Value> for i32 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_i32().ok_or_else(|| value.conversion_error("i32"))
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| value.conversion_error("i64"))
    }
}

impl TryFrom<Value> for f32 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_f32().ok_or_else(|| value.conversion_error("f32"))
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| value.conversion_error("f64"))
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(value) => Ok(value),
            other => Err(other.conversion_error("String")),
        }
    }
}

impl TryFrom<Value> for Object {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(other.conversion_error("Object")),
        }
    }
}
