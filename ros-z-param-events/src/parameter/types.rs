//! User-facing parameter types.
//!
//! These types are what callbacks receive. They convert to/from the wire
//! format types for CDR serialization.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::wire_types::{
    WireParameter, WireParameterEvent, WireParameterValue, WireTime, parameter_type,
};

/// The type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ParameterType {
    NotSet,
    Bool,
    Integer,
    Double,
    String,
    ByteArray,
    BoolArray,
    IntegerArray,
    DoubleArray,
    StringArray,
}

impl ParameterType {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::NotSet => parameter_type::NOT_SET,
            Self::Bool => parameter_type::BOOL,
            Self::Integer => parameter_type::INTEGER,
            Self::Double => parameter_type::DOUBLE,
            Self::String => parameter_type::STRING,
            Self::ByteArray => parameter_type::BYTE_ARRAY,
            Self::BoolArray => parameter_type::BOOL_ARRAY,
            Self::IntegerArray => parameter_type::INTEGER_ARRAY,
            Self::DoubleArray => parameter_type::DOUBLE_ARRAY,
            Self::StringArray => parameter_type::STRING_ARRAY,
        }
    }

    /// Unknown type ids map to `NotSet`.
    pub fn from_u8(v: u8) -> Self {
        match v {
            parameter_type::BOOL => Self::Bool,
            parameter_type::INTEGER => Self::Integer,
            parameter_type::DOUBLE => Self::Double,
            parameter_type::STRING => Self::String,
            parameter_type::BYTE_ARRAY => Self::ByteArray,
            parameter_type::BOOL_ARRAY => Self::BoolArray,
            parameter_type::INTEGER_ARRAY => Self::IntegerArray,
            parameter_type::DOUBLE_ARRAY => Self::DoubleArray,
            parameter_type::STRING_ARRAY => Self::StringArray,
            _ => Self::NotSet,
        }
    }
}

/// A typed parameter value. `NotSet` marks a parameter that does not hold a
/// value, e.g. one that was deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParameterValue {
    #[default]
    NotSet,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(std::string::String),
    ByteArray(Vec<u8>),
    BoolArray(Vec<bool>),
    IntegerArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<std::string::String>),
}

impl ParameterValue {
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Self::NotSet => ParameterType::NotSet,
            Self::Bool(_) => ParameterType::Bool,
            Self::Integer(_) => ParameterType::Integer,
            Self::Double(_) => ParameterType::Double,
            Self::String(_) => ParameterType::String,
            Self::ByteArray(_) => ParameterType::ByteArray,
            Self::BoolArray(_) => ParameterType::BoolArray,
            Self::IntegerArray(_) => ParameterType::IntegerArray,
            Self::DoubleArray(_) => ParameterType::DoubleArray,
            Self::StringArray(_) => ParameterType::StringArray,
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Self::NotSet)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn to_wire(&self) -> WireParameterValue {
        let mut wire = WireParameterValue {
            r#type: self.parameter_type().to_u8(),
            ..Default::default()
        };
        match self {
            Self::NotSet => {}
            Self::Bool(v) => wire.bool_value = *v,
            Self::Integer(v) => wire.integer_value = *v,
            Self::Double(v) => wire.double_value = *v,
            Self::String(v) => wire.string_value = v.clone(),
            Self::ByteArray(v) => wire.byte_array_value = v.clone(),
            Self::BoolArray(v) => wire.bool_array_value = v.clone(),
            Self::IntegerArray(v) => wire.integer_array_value = v.clone(),
            Self::DoubleArray(v) => wire.double_array_value = v.clone(),
            Self::StringArray(v) => wire.string_array_value = v.clone(),
        }
        wire
    }

    pub(crate) fn from_wire(wire: WireParameterValue) -> Self {
        match wire.r#type {
            parameter_type::BOOL => Self::Bool(wire.bool_value),
            parameter_type::INTEGER => Self::Integer(wire.integer_value),
            parameter_type::DOUBLE => Self::Double(wire.double_value),
            parameter_type::STRING => Self::String(wire.string_value),
            parameter_type::BYTE_ARRAY => Self::ByteArray(wire.byte_array_value),
            parameter_type::BOOL_ARRAY => Self::BoolArray(wire.bool_array_value),
            parameter_type::INTEGER_ARRAY => Self::IntegerArray(wire.integer_array_value),
            parameter_type::DOUBLE_ARRAY => Self::DoubleArray(wire.double_array_value),
            parameter_type::STRING_ARRAY => Self::StringArray(wire.string_array_value),
            _ => Self::NotSet,
        }
    }
}

macro_rules! impl_from_for_parameter_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParameterValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_parameter_value!(
    bool => Bool,
    i64 => Integer,
    i32 => Integer,
    f64 => Double,
    std::string::String => String,
    &str => String,
    Vec<u8> => ByteArray,
    Vec<bool> => BoolArray,
    Vec<i64> => IntegerArray,
    Vec<f64> => DoubleArray,
    Vec<std::string::String> => StringArray,
);

/// A parameter with its name and value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    pub name: std::string::String,
    pub value: ParameterValue,
}

impl Parameter {
    pub fn new(name: impl Into<std::string::String>, value: impl Into<ParameterValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// A parameter carrying the `NotSet` value.
    pub fn not_set(name: impl Into<std::string::String>) -> Self {
        Self::new(name, ParameterValue::NotSet)
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.value.parameter_type()
    }

    pub(crate) fn to_wire(&self) -> WireParameter {
        WireParameter {
            name: self.name.clone(),
            value: self.value.to_wire(),
        }
    }

    pub(crate) fn from_wire(wire: WireParameter) -> Self {
        Self {
            name: wire.name,
            value: ParameterValue::from_wire(wire.value),
        }
    }
}

/// Seconds and nanoseconds since the epoch, as in `builtin_interfaces/msg/Time`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

impl Time {
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_duration(since_epoch)
    }

    /// Saturates at `i32::MAX` seconds.
    fn from_duration(since_epoch: Duration) -> Self {
        Self {
            sec: i32::try_from(since_epoch.as_secs()).unwrap_or(i32::MAX),
            nanosec: since_epoch.subsec_nanos(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.sec == 0 && self.nanosec == 0
    }
}

/// One atomic batch of parameter changes reported by a single node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterEvent {
    pub stamp: Time,
    /// Fully qualified name of the node owning the parameters.
    pub node: std::string::String,
    pub new_parameters: Vec<Parameter>,
    pub changed_parameters: Vec<Parameter>,
    pub deleted_parameters: Vec<Parameter>,
}

impl ParameterEvent {
    pub fn new(node: impl Into<std::string::String>) -> Self {
        Self {
            node: node.into(),
            ..Default::default()
        }
    }

    pub fn with_stamp(mut self, stamp: Time) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn with_new(mut self, parameter: Parameter) -> Self {
        self.new_parameters.push(parameter);
        self
    }

    pub fn with_changed(mut self, parameter: Parameter) -> Self {
        self.changed_parameters.push(parameter);
        self
    }

    /// Deleted entries only carry a name; the value is not meaningful.
    pub fn with_deleted(mut self, name: impl Into<std::string::String>) -> Self {
        self.deleted_parameters.push(Parameter::not_set(name));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.new_parameters.is_empty()
            && self.changed_parameters.is_empty()
            && self.deleted_parameters.is_empty()
    }

    pub(crate) fn to_wire(&self) -> WireParameterEvent {
        let to_wire = |params: &[Parameter]| params.iter().map(Parameter::to_wire).collect();
        WireParameterEvent {
            stamp: WireTime {
                sec: self.stamp.sec,
                nanosec: self.stamp.nanosec,
            },
            node: self.node.clone(),
            new_parameters: to_wire(&self.new_parameters),
            changed_parameters: to_wire(&self.changed_parameters),
            deleted_parameters: to_wire(&self.deleted_parameters),
        }
    }

    pub(crate) fn from_wire(wire: WireParameterEvent) -> Self {
        let from_wire =
            |params: Vec<WireParameter>| params.into_iter().map(Parameter::from_wire).collect();
        Self {
            stamp: Time {
                sec: wire.stamp.sec,
                nanosec: wire.stamp.nanosec,
            },
            node: wire.node,
            new_parameters: from_wire(wire.new_parameters),
            changed_parameters: from_wire(wire.changed_parameters),
            deleted_parameters: from_wire(wire.deleted_parameters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_type_u8_mapping() {
        for ty in [
            ParameterType::NotSet,
            ParameterType::Bool,
            ParameterType::Integer,
            ParameterType::Double,
            ParameterType::String,
            ParameterType::ByteArray,
            ParameterType::BoolArray,
            ParameterType::IntegerArray,
            ParameterType::DoubleArray,
            ParameterType::StringArray,
        ] {
            assert_eq!(ParameterType::from_u8(ty.to_u8()), ty);
        }
        assert_eq!(ParameterType::from_u8(42), ParameterType::NotSet);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(ParameterValue::from(3.5), ParameterValue::Double(3.5));
        assert_eq!(ParameterValue::from(7i32), ParameterValue::Integer(7));
        assert_eq!(
            ParameterValue::from("fast"),
            ParameterValue::String("fast".to_string())
        );
        assert_eq!(ParameterValue::from(true).as_bool(), Some(true));
        assert_eq!(ParameterValue::Integer(2).as_f64(), None);
        assert!(!ParameterValue::NotSet.is_set());
    }

    #[test]
    fn test_unknown_wire_type_is_not_set() {
        let wire = WireParameterValue {
            r#type: 200,
            integer_value: 5,
            ..Default::default()
        };
        assert_eq!(ParameterValue::from_wire(wire), ParameterValue::NotSet);
    }

    #[test]
    fn test_wire_keeps_only_active_field() {
        let wire = ParameterValue::IntegerArray(vec![1, 2, 3]).to_wire();
        assert_eq!(wire.r#type, parameter_type::INTEGER_ARRAY);
        assert_eq!(wire.integer_array_value, vec![1, 2, 3]);
        assert!(wire.string_value.is_empty());
        assert_eq!(wire.integer_value, 0);
    }

    #[test]
    fn test_time_saturates_past_i32_seconds() {
        let time = Time::from_duration(Duration::new(u64::from(u32::MAX) + 5, 7));
        assert_eq!(time, Time { sec: i32::MAX, nanosec: 7 });

        let time = Time::from_duration(Duration::new(1_700_000_000, 42));
        assert_eq!(time, Time { sec: 1_700_000_000, nanosec: 42 });
        assert!(!Time::now().is_zero());
    }

    #[test]
    fn test_event_builder() {
        let event = ParameterEvent::new("/robot1")
            .with_new(Parameter::new("mode", "auto"))
            .with_changed(Parameter::new("speed", 3.5))
            .with_deleted("legacy");
        assert_eq!(event.node, "/robot1");
        assert_eq!(event.new_parameters.len(), 1);
        assert_eq!(event.changed_parameters[0].value, ParameterValue::Double(3.5));
        assert_eq!(event.deleted_parameters[0], Parameter::not_set("legacy"));
        assert!(!event.is_empty());
        assert!(ParameterEvent::new("/x").is_empty());
    }
}
