//! The enum codec: a two-way mapping between constants and integers.

use std::collections::HashMap;

use crate::EnumConstant;

/// A built enum type.
///
/// `to_int` is total (every constant has a value) and injective (the
/// builder rejects duplicate values). `from_int` is partial: integers the
/// schema doesn't know come back as `None`, and the codec's configured
/// policy decides what happens to them.
#[derive(Debug, Clone)]
pub struct EnumType {
    full_name: String,
    constants: Vec<EnumConstant>,
    by_value: HashMap<i32, usize>,
    by_name: HashMap<String, usize>,
}

impl EnumType {
    /// Callers guarantee `constants` is non-empty with unique values.
    pub(crate) fn new(full_name: String, constants: Vec<EnumConstant>) -> Self {
        let by_value = constants
            .iter()
            .enumerate()
            .map(|(i, c)| (c.value, i))
            .collect();
        let by_name = constants
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self {
            full_name,
            constants,
            by_value,
            by_name,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// All constants, in declaration order.
    pub fn constants(&self) -> &[EnumConstant] {
        &self.constants
    }

    /// The integer written on the wire for `constant`.
    pub fn to_int(&self, constant: &EnumConstant) -> i32 {
        constant.value
    }

    /// The constant with wire value `value`, if the schema declares one.
    pub fn from_int(&self, value: i32) -> Option<&EnumConstant> {
        self.by_value.get(&value).map(|&i| &self.constants[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&EnumConstant> {
        self.by_name.get(name).map(|&i| &self.constants[i])
    }

    /// Returns `true` if `value` is one of the declared constants.
    pub fn is_known(&self, value: i32) -> bool {
        self.by_value.contains_key(&value)
    }

    /// The first declared constant.
    pub fn default_constant(&self) -> &EnumConstant {
        // The builder rejects empty enums.
        &self.constants[0]
    }
}
