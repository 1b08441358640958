use crate::core::Vec2;
use crate::registry::ActionMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Vec2,
    Int,
    Float,
    Text,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SlotValue {
    Vec2(Vec2),
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl SlotValue {
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotValue::Vec2(_) => SlotKind::Vec2,
            SlotValue::Int(_) => SlotKind::Int,
            SlotValue::Float(_) => SlotKind::Float,
            SlotValue::Text(_) => SlotKind::Text,
            SlotValue::Bool(_) => SlotKind::Bool,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            SlotValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SlotValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SlotValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SlotValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SlotValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlotError {
    #[error("unknown slot '{0}'")]
    Unknown(String),

    #[error("slot '{name}' is not an {expected:?} slot")]
    WrongDirection {
        name: String,
        expected: SlotDirection,
    },

    #[error("slot '{name}' holds {expected:?}, got {actual:?}")]
    KindMismatch {
        name: String,
        expected: SlotKind,
        actual: SlotKind,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub kind: SlotKind,
    pub direction: SlotDirection,
    pub value: Option<SlotValue>,
}

/// Named, typed data slots of one action. Inputs and outputs share one
/// namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionSlots {
    slots: BTreeMap<String, Slot>,
}

impl ActionSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots as listed in an action's catalogue entry
    pub fn declare(metadata: &ActionMetadata) -> Self {
        let mut slots = Self::new();
        for input in &metadata.inputs {
            slots.add(&input.name, input.kind, SlotDirection::Input);
        }
        for output in &metadata.outputs {
            slots.add(&output.name, output.kind, SlotDirection::Output);
        }
        slots
    }

    pub fn add(&mut self, name: &str, kind: SlotKind, direction: SlotDirection) {
        self.slots.insert(
            name.to_string(),
            Slot {
                kind,
                direction,
                value: None,
            },
        );
    }

    pub fn with_input(mut self, name: &str, kind: SlotKind) -> Self {
        self.add(name, kind, SlotDirection::Input);
        self
    }

    pub fn with_output(mut self, name: &str, kind: SlotKind) -> Self {
        self.add(name, kind, SlotDirection::Output);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    /// Check that `name` exists with the given direction and return its kind
    pub fn expect(&self, name: &str, direction: SlotDirection) -> Result<SlotKind, SlotError> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| SlotError::Unknown(name.to_string()))?;
        if slot.direction != direction {
            return Err(SlotError::WrongDirection {
                name: name.to_string(),
                expected: direction,
            });
        }
        Ok(slot.kind)
    }

    fn set(&mut self, name: &str, direction: SlotDirection, value: SlotValue) -> Result<(), SlotError> {
        let expected = self.expect(name, direction)?;
        if value.kind() != expected {
            return Err(SlotError::KindMismatch {
                name: name.to_string(),
                expected,
                actual: value.kind(),
            });
        }
        if let Some(slot) = self.slots.get_mut(name) {
            slot.value = Some(value);
        }
        Ok(())
    }

    pub fn set_input(&mut self, name: &str, value: SlotValue) -> Result<(), SlotError> {
        self.set(name, SlotDirection::Input, value)
    }

    pub fn set_output(&mut self, name: &str, value: SlotValue) -> Result<(), SlotError> {
        self.set(name, SlotDirection::Output, value)
    }

    fn value(&self, name: &str, direction: SlotDirection) -> Option<&SlotValue> {
        self.slots
            .get(name)
            .filter(|slot| slot.direction == direction)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn input(&self, name: &str) -> Option<&SlotValue> {
        self.value(name, SlotDirection::Input)
    }

    pub fn output(&self, name: &str) -> Option<&SlotValue> {
        self.value(name, SlotDirection::Output)
    }

    pub fn input_vec2(&self, name: &str) -> Option<Vec2> {
        self.input(name).and_then(SlotValue::as_vec2)
    }

    pub fn input_bool(&self, name: &str) -> Option<bool> {
        self.input(name).and_then(SlotValue::as_bool)
    }

    pub fn names(&self, direction: SlotDirection) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.direction == direction)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Forget every stored value, keeping the declarations
    pub fn clear(&mut self) {
        self.slots.values_mut().for_each(|slot| slot.value = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots() -> ActionSlots {
        ActionSlots::new()
            .with_input("coordinate", SlotKind::Vec2)
            .with_output("clicked", SlotKind::Bool)
    }

    #[test]
    fn test_set_and_read() {
        let mut s = slots();
        s.set_input("coordinate", SlotValue::Vec2(Vec2::new(1.0, 2.0))).unwrap();
        s.set_output("clicked", SlotValue::Bool(true)).unwrap();
        assert_eq!(s.input_vec2("coordinate"), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(s.output("clicked"), Some(&SlotValue::Bool(true)));
        assert!(s.output("coordinate").is_none());
    }

    #[test]
    fn test_errors() {
        let mut s = slots();
        assert_eq!(
            s.set_input("missing", SlotValue::Int(1)),
            Err(SlotError::Unknown("missing".into()))
        );
        assert!(matches!(
            s.set_output("coordinate", SlotValue::Vec2(Vec2::ZERO)),
            Err(SlotError::WrongDirection { .. })
        ));
        assert!(matches!(
            s.set_input("coordinate", SlotValue::Float(1.0)),
            Err(SlotError::KindMismatch { expected: SlotKind::Vec2, actual: SlotKind::Float, .. })
        ));
    }

    #[test]
    fn test_clear_keeps_declarations() {
        let mut s = slots();
        s.set_output("clicked", SlotValue::Bool(false)).unwrap();
        s.clear();
        assert!(s.output("clicked").is_none());
        assert_eq!(s.expect("clicked", SlotDirection::Output), Ok(SlotKind::Bool));
    }
}
