use crate::engine::{Action, SlotKind};
use serde::{Deserialize, Serialize};

/// Metadata describing an input or output slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotMetadata {
    pub name: String,
    pub kind: SlotKind,
}

/// Schema for a configurable parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub default: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Factory function type for creating action instances
pub type ActionFactory = fn() -> Box<dyn Action>;

/// Complete metadata for an action type
#[derive(Clone)]
pub struct ActionMetadata {
    pub id: String,
    pub name: String,
    pub category: String,
    pub inputs: Vec<SlotMetadata>,
    pub outputs: Vec<SlotMetadata>,
    pub parameters: Vec<ParameterSchema>,
    pub factory: ActionFactory,
}

impl ActionMetadata {
    /// Create a new, unconfigured instance of this action type
    pub fn create_instance(&self) -> Box<dyn Action> {
        (self.factory)()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSchema> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl std::fmt::Debug for ActionMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionMetadata")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("parameters", &self.parameters)
            .finish()
    }
}

// Factory type for creating action metadata at runtime
pub type ActionMetadataFactory = fn() -> ActionMetadata;

// Wrapper for inventory collection
pub struct ActionMetadataFactoryWrapper(pub ActionMetadataFactory);

// Inventory submission type
inventory::collect!(ActionMetadataFactoryWrapper);
