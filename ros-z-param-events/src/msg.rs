use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::entity::TypeInfo;

pub trait ZSerializer {
    type Input<'a>
    where
        Self: 'a;
    fn serialize(input: Self::Input<'_>) -> Result<Vec<u8>, SerdesError>;
}

pub trait ZDeserializer {
    type Input<'a>;
    type Output;
    fn deserialize(input: Self::Input<'_>) -> Result<Self::Output, SerdesError>;
}

/// Messages that know their ROS type name.
pub trait MessageTypeInfo {
    fn type_info() -> TypeInfo;
}

#[derive(Debug)]
pub struct SerdesError(String);

impl std::fmt::Display for SerdesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CDR serdes error: {}", self.0)
    }
}

impl std::error::Error for SerdesError {}

impl From<cdr::Error> for SerdesError {
    fn from(e: cdr::Error) -> Self {
        SerdesError(e.to_string())
    }
}

/// CDR little endian with the 4-byte encapsulation header, as ROS 2 uses
pub struct CdrSerdes<T>(PhantomData<T>);

impl<T> ZSerializer for CdrSerdes<T>
where
    T: Serialize,
{
    type Input<'a>
        = &'a T
    where
        T: 'a;

    fn serialize(input: &T) -> Result<Vec<u8>, SerdesError> {
        Ok(cdr::serialize::<_, _, cdr::CdrLe>(input, cdr::Infinite)?)
    }
}

impl<T> ZDeserializer for CdrSerdes<T>
where
    for<'a> T: Deserialize<'a>,
{
    type Input<'b> = &'b [u8];
    type Output = T;

    fn deserialize(input: &[u8]) -> Result<T, SerdesError> {
        Ok(cdr::deserialize::<T>(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::wire_types::{WireParameter, WireParameterEvent, WireParameterValue};

    #[test]
    fn test_cdr_header_is_little_endian() {
        let bytes = CdrSerdes::<u32>::serialize(&1).unwrap();
        assert_eq!(&bytes[..4], &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(&bytes[4..], &[0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_parameter_event_through_cdr() {
        let event = WireParameterEvent {
            node: "/robot1".into(),
            changed_parameters: vec![WireParameter {
                name: "speed".into(),
                value: WireParameterValue {
                    r#type: 3,
                    double_value: 3.5,
                    ..Default::default()
                },
            }],
            ..Default::default()
        };
        let bytes = CdrSerdes::<WireParameterEvent>::serialize(&event).unwrap();
        let decoded = CdrSerdes::<WireParameterEvent>::deserialize(&bytes).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let event = WireParameterEvent {
            node: "/robot1".into(),
            ..Default::default()
        };
        let bytes = CdrSerdes::<WireParameterEvent>::serialize(&event).unwrap();
        assert!(CdrSerdes::<WireParameterEvent>::deserialize(&bytes[..bytes.len() - 6]).is_err());
    }
}
