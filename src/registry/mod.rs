pub mod metadata;

pub use metadata::{
    ActionFactory, ActionMetadata, ActionMetadataFactory, ActionMetadataFactoryWrapper,
    ParameterSchema, SlotMetadata,
};

use crate::engine::Action;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Catalogue of every action type submitted through `#[derive(ActionMeta)]`
pub struct ActionRegistry {
    actions: BTreeMap<String, ActionMetadata>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }

    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for wrapper in inventory::iter::<ActionMetadataFactoryWrapper> {
            // Call the factory to create metadata at runtime
            registry.register((wrapper.0)());
        }
        registry
    }

    pub fn register(&mut self, metadata: ActionMetadata) {
        self.actions.insert(metadata.id.clone(), metadata);
    }

    pub fn get(&self, id: &str) -> Option<&ActionMetadata> {
        self.actions.get(id)
    }

    /// Sorted action ids
    pub fn list(&self) -> Vec<&str> {
        self.actions.keys().map(|id| id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Instantiate and configure an action. `params` may be null.
    pub fn create(&self, id: &str, params: &Value) -> Result<Box<dyn Action>> {
        let metadata = self
            .actions
            .get(id)
            .ok_or_else(|| anyhow!("Unknown action '{}'. Available: {:?}", id, self.list()))?;
        let mut action = metadata.create_instance();
        action
            .configure(params)
            .with_context(|| format!("Invalid parameters for action '{}'", id))?;
        Ok(action)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::from_inventory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inventory_collects_builtin_actions() {
        let registry = ActionRegistry::from_inventory();
        for id in [
            "dwell_coordinate",
            "gaze_scroll",
            "left_click",
            "magnify",
            "selection_end",
            "selection_start",
        ] {
            assert!(registry.get(id).is_some(), "missing {}", id);
        }
        let ids = registry.list();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_metadata_describes_slots_and_params() {
        let registry = ActionRegistry::from_inventory();
        let magnify = registry.get("magnify").unwrap();
        assert_eq!(magnify.category, "Coordinate");
        assert!(magnify.inputs.is_empty());
        assert_eq!(magnify.outputs[0].name, "coordinate");
        assert_eq!(magnify.outputs[0].kind, crate::engine::SlotKind::Vec2);
        let zoom = magnify.parameter("zoom").unwrap();
        assert_eq!(zoom.default, json!(0.5));
        assert_eq!(zoom.max, Some(1.0));

        let click = registry.get("left_click").unwrap();
        assert_eq!(click.inputs[0].name, "coordinate");
    }

    #[test]
    fn test_create_applies_params() {
        let registry = ActionRegistry::from_inventory();
        assert!(registry.create("magnify", &json!({ "zoom": 0.25 })).is_ok());
        assert!(registry.create("magnify", &json!({ "zoom": 3.0 })).is_err());

        let err = registry.create("double_click", &Value::Null).err().unwrap();
        assert!(err.to_string().contains("double_click"));
    }
}
