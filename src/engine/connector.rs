use super::action::Action;
use super::slots::{SlotDirection, SlotError};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Edge from an output slot of one action to an input slot of a later one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConnector {
    pub source: usize,
    pub source_slot: String,
    pub target: usize,
    pub target_slot: String,
}

impl ActionConnector {
    pub fn new(source: usize, source_slot: &str, target: usize, target_slot: &str) -> Self {
        Self {
            source,
            source_slot: source_slot.to_string(),
            target,
            target_slot: target_slot.to_string(),
        }
    }

    /// Check the edge against the actions it joins. Only forward edges are
    /// accepted, so a pipeline's connectors never form a cycle.
    pub fn validate(&self, actions: &[Box<dyn Action>]) -> Result<()> {
        if self.source >= self.target {
            return Err(anyhow!(
                "Connector {}.{} -> {}.{} must point forward",
                self.source,
                self.source_slot,
                self.target,
                self.target_slot
            ));
        }
        let source = actions
            .get(self.source)
            .ok_or_else(|| anyhow!("Connector source action {} does not exist", self.source))?;
        let target = actions
            .get(self.target)
            .ok_or_else(|| anyhow!("Connector target action {} does not exist", self.target))?;

        let source_kind = source
            .slots()
            .expect(&self.source_slot, SlotDirection::Output)
            .with_context(|| format!("Connector source '{}'", source.id()))?;
        let target_kind = target
            .slots()
            .expect(&self.target_slot, SlotDirection::Input)
            .with_context(|| format!("Connector target '{}'", target.id()))?;

        if source_kind != target_kind {
            let mismatch = SlotError::KindMismatch {
                name: self.target_slot.clone(),
                expected: target_kind,
                actual: source_kind,
            };
            return Err(anyhow::Error::new(mismatch)
                .context(format!("Connector {} -> {}", source.id(), target.id())));
        }
        Ok(())
    }

    /// Copy the source's output value into the target's input slot.
    ///
    /// An unset source slot is a programming error in the source action:
    /// debug builds panic, release builds log and leave the target unset.
    pub fn propagate(&self, actions: &mut [Box<dyn Action>]) {
        let (head, tail) = actions.split_at_mut(self.target);
        let (Some(source), Some(target)) = (head.get(self.source), tail.first_mut()) else {
            return;
        };

        let Some(value) = source.slots().output(&self.source_slot).cloned() else {
            debug_assert!(
                false,
                "action '{}' finished without setting output '{}'",
                source.id(),
                self.source_slot
            );
            error!(
                action = source.id(),
                slot = %self.source_slot,
                "Action finished without setting connected output"
            );
            return;
        };

        if let Err(e) = target.slots_mut().set_input(&self.target_slot, value) {
            error!(action = target.id(), error = %e, "Failed to propagate slot value");
        }
    }
}
