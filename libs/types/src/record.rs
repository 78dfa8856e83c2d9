//! Typed records: the application-facing form of a message payload

use crate::schema::MessageSchema;
use crate::value::FieldValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Field values of one message, in schema field order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    pub message_id: u32,
    pub fields: Vec<FieldValue>,
}

impl Record {
    pub fn new(message_id: u32, fields: Vec<FieldValue>) -> Self {
        Self { message_id, fields }
    }

    pub fn field(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }

    /// Look a field up by the name its schema gives it
    pub fn get<'a>(&'a self, schema: &MessageSchema, name: &str) -> Option<&'a FieldValue> {
        schema.field_index(name).and_then(|i| self.fields.get(i))
    }

    /// Pairs of (field name, value), for logging and display
    pub fn named<'a>(
        &'a self,
        schema: &'a MessageSchema,
    ) -> impl Iterator<Item = (&'a str, &'a FieldValue)> + 'a {
        schema
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.fields.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeType;
    use crate::schema::FieldDescriptor;
    use crate::value::Value;

    #[test]
    fn test_lookup_by_name() {
        let schema = MessageSchema::new(
            1,
            "PAIR",
            0,
            vec![
                FieldDescriptor::scalar("a", NativeType::UInt16),
                FieldDescriptor::scalar("b", NativeType::Int8),
            ],
        )
        .unwrap();
        let record = Record::new(1, vec![FieldValue::from(500u16), FieldValue::from(-3i8)]);

        assert_eq!(record.get(&schema, "b"), Some(&FieldValue::Scalar(Value::Int8(-3))));
        assert_eq!(record.get(&schema, "c"), None);

        let names: Vec<&str> = record.named(&schema).map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
