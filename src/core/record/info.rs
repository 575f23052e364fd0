use crate::{
    constants::{ALLELE_SEPARATOR, MISSING_VALUE_V4},
    core::header::{CompoundHeaderLine, ValueType},
    error::{VcfError, VcfResult},
};

/// An INFO value interpreted through its header definition.
///
/// List elements are `None` where the file holds the missing marker `.`.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Flag,
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Character(Vec<Option<char>>),
    String(Vec<Option<String>>),
}

impl InfoValue {
    /// Interpret a raw INFO value. Keys without a definition are read as flags
    /// when bare and as strings otherwise.
    pub fn decode(key: &str, raw: &str, definition: Option<&CompoundHeaderLine>) -> VcfResult<Self> {
        let value_type = match definition {
            Some(definition) => definition.value_type,
            None if raw.is_empty() => ValueType::Flag,
            None => ValueType::String,
        };

        if value_type == ValueType::Flag {
            if !raw.is_empty() {
                return Err(VcfError::schema(format!(
                    "INFO flag {key} carries a value {raw}"
                )));
            }
            return Ok(InfoValue::Flag);
        }

        let items = raw.split(ALLELE_SEPARATOR).map(|item| {
            if item == MISSING_VALUE_V4 || item.is_empty() {
                None
            } else {
                Some(item)
            }
        });
        let invalid = |item: &str| {
            VcfError::schema(format!(
                "INFO {key} value {item} is not a valid {value_type}"
            ))
        };

        Ok(match value_type {
            ValueType::Integer => InfoValue::Integer(
                items
                    .map(|item| item.map(|s| s.parse::<i64>().map_err(|_| invalid(s))).transpose())
                    .collect::<VcfResult<_>>()?,
            ),
            ValueType::Float => InfoValue::Float(
                items
                    .map(|item| item.map(|s| s.parse::<f64>().map_err(|_| invalid(s))).transpose())
                    .collect::<VcfResult<_>>()?,
            ),
            ValueType::Character => InfoValue::Character(
                items
                    .map(|item| {
                        item.map(|s| {
                            let mut chars = s.chars();
                            match (chars.next(), chars.next()) {
                                (Some(c), None) => Ok(c),
                                _ => Err(invalid(s)),
                            }
                        })
                        .transpose()
                    })
                    .collect::<VcfResult<_>>()?,
            ),
            ValueType::String | ValueType::Flag => {
                InfoValue::String(items.map(|item| item.map(str::to_string)).collect())
            }
        })
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, InfoValue::Flag)
    }
}
