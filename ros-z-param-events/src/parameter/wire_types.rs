//! CDR wire layout of `rcl_interfaces/msg/ParameterEvent` and the types it
//! embeds. Field order matters: it is the serialization order.

use serde::{Deserialize, Serialize};

use crate::entity::TypeInfo;
use crate::msg::MessageTypeInfo;

/// Values of `rcl_interfaces/msg/ParameterType`.
pub mod parameter_type {
    pub const NOT_SET: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const INTEGER: u8 = 2;
    pub const DOUBLE: u8 = 3;
    pub const STRING: u8 = 4;
    pub const BYTE_ARRAY: u8 = 5;
    pub const BOOL_ARRAY: u8 = 6;
    pub const INTEGER_ARRAY: u8 = 7;
    pub const DOUBLE_ARRAY: u8 = 8;
    pub const STRING_ARRAY: u8 = 9;
}

/// `builtin_interfaces/msg/Time`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireTime {
    pub sec: i32,
    pub nanosec: u32,
}

/// `rcl_interfaces/msg/ParameterValue`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireParameterValue {
    pub r#type: u8,
    pub bool_value: bool,
    pub integer_value: i64,
    pub double_value: f64,
    pub string_value: String,
    pub byte_array_value: Vec<u8>,
    pub bool_array_value: Vec<bool>,
    pub integer_array_value: Vec<i64>,
    pub double_array_value: Vec<f64>,
    pub string_array_value: Vec<String>,
}

/// `rcl_interfaces/msg/Parameter`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireParameter {
    pub name: String,
    pub value: WireParameterValue,
}

/// `rcl_interfaces/msg/ParameterEvent`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireParameterEvent {
    pub stamp: WireTime,
    pub node: String,
    pub new_parameters: Vec<WireParameter>,
    pub changed_parameters: Vec<WireParameter>,
    pub deleted_parameters: Vec<WireParameter>,
}

impl MessageTypeInfo for WireParameterEvent {
    fn type_info() -> TypeInfo {
        TypeInfo::new("rcl_interfaces::msg::dds_::ParameterEvent_")
    }
}
