use super::action::{Action, ActionContext, ActionState, DrawCommand};
use super::connector::ActionConnector;
use super::state::PipelineState;
use crate::core::GazeInputState;
use crate::registry::ActionRegistry;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::{debug, error};

/// Ordered sequence of actions advanced one at a time.
///
/// At most one action is active. When it finishes, its connected outputs
/// are copied forward, it is deactivated and the next one is activated.
pub struct Pipeline {
    name: String,
    actions: Vec<Box<dyn Action>>,
    states: Vec<ActionState>,
    connectors: Vec<ActionConnector>,
    current: usize,
    state: PipelineState,
}

pub struct PipelineBuilder {
    name: String,
    actions: Vec<Box<dyn Action>>,
    connectors: Vec<ActionConnector>,
}

impl PipelineBuilder {
    /// Append an action, returning its index
    pub fn add_action(&mut self, action: Box<dyn Action>) -> usize {
        self.actions.push(action);
        self.actions.len() - 1
    }

    pub fn connect(
        &mut self,
        source: usize,
        source_slot: &str,
        target: usize,
        target_slot: &str,
    ) -> Result<()> {
        self.add_connector(ActionConnector::new(source, source_slot, target, target_slot))
    }

    pub fn add_connector(&mut self, connector: ActionConnector) -> Result<()> {
        connector
            .validate(&self.actions)
            .with_context(|| format!("Invalid connector in pipeline '{}'", self.name))?;
        self.connectors.push(connector);
        Ok(())
    }

    pub fn build(self) -> Pipeline {
        let states = vec![ActionState::Inactive; self.actions.len()];
        Pipeline {
            name: self.name,
            actions: self.actions,
            states,
            connectors: self.connectors,
            current: 0,
            state: PipelineState::Idle,
        }
    }
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            actions: Vec::new(),
            connectors: Vec::new(),
        }
    }

    /// Build from a description such as
    /// `{"name": "click", "actions": [{"id": "magnify", "params": {}}, {"id": "left_click"}],
    ///   "connectors": [{"source": 0, "source_slot": "coordinate", "target": 1, "target_slot": "coordinate"}]}`
    pub fn from_json(config: &Value, registry: &ActionRegistry) -> Result<Self> {
        let name = config["name"].as_str().unwrap_or("pipeline");
        let mut builder = Pipeline::builder(name);

        let actions = config["actions"]
            .as_array()
            .ok_or(anyhow!("Pipeline '{}' missing actions", name))?;
        for (index, action_config) in actions.iter().enumerate() {
            let id = action_config["id"]
                .as_str()
                .ok_or(anyhow!("Action {} in pipeline '{}' missing id", index, name))?;
            let action = registry
                .create(id, &action_config["params"])
                .with_context(|| format!("Failed to create action {} of pipeline '{}'", index, name))?;
            builder.add_action(action);
        }

        if let Some(connectors) = config["connectors"].as_array() {
            for connector in connectors {
                let connector: ActionConnector = serde_json::from_value(connector.clone())
                    .with_context(|| format!("Malformed connector in pipeline '{}'", name))?;
                builder.add_connector(connector)?;
            }
        }

        Ok(builder.build())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn action_state(&self, index: usize) -> Option<ActionState> {
        self.states.get(index).copied()
    }

    pub fn current_action(&self) -> Option<&dyn Action> {
        if self.state.is_terminal() {
            return None;
        }
        self.actions.get(self.current).map(|a| a.as_ref())
    }

    /// Number of actions currently active, never more than one
    pub fn active_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == ActionState::Active)
            .count()
    }

    /// Advance by one frame. Returns true once the pipeline is terminal.
    pub fn update(&mut self, dt: f64, input: &GazeInputState, ctx: &mut ActionContext) -> bool {
        match self.state {
            PipelineState::Idle => {
                self.transition(PipelineState::Running);
                if self.actions.is_empty() {
                    self.transition(PipelineState::Finished);
                    return true;
                }
                self.activate_current(ctx);
            }
            PipelineState::Suspended => return false,
            PipelineState::Finished | PipelineState::Aborted => return true,
            PipelineState::Running => {}
        }

        let index = self.current;
        let Some(action) = self.actions.get_mut(index) else {
            self.transition(PipelineState::Finished);
            return true;
        };
        if !action.update(dt, input, ctx) {
            return false;
        }

        for connector in self.connectors.iter().filter(|c| c.source == index) {
            connector.propagate(&mut self.actions);
        }
        self.actions[index].deactivate(ctx);
        self.set_action_state(index, ActionState::Finished);
        debug!(pipeline = %self.name, action = self.actions[index].id(), index, "Action finished");

        self.current += 1;
        if self.current < self.actions.len() {
            self.activate_current(ctx);
            false
        } else {
            self.transition(PipelineState::Finished);
            true
        }
    }

    /// Cancel immediately. The current action runs its abort path and is
    /// deactivated before this returns.
    pub fn abort(&mut self, ctx: &mut ActionContext) {
        if self.state.is_terminal() {
            return;
        }
        if self.state != PipelineState::Idle {
            if let Some(action) = self.actions.get_mut(self.current) {
                action.abort(ctx);
                action.deactivate(ctx);
                self.set_action_state(self.current, ActionState::Aborted);
            }
        }
        self.transition(PipelineState::Aborted);
    }

    /// Resume a suspended pipeline
    pub fn activate(&mut self, ctx: &mut ActionContext) {
        if self.state != PipelineState::Suspended {
            return;
        }
        if let Some(action) = self.actions.get_mut(self.current) {
            action.resume(ctx);
        }
        self.transition(PipelineState::Running);
    }

    /// Suspend a running pipeline without tearing its current action down
    pub fn deactivate(&mut self, ctx: &mut ActionContext) {
        if self.state != PipelineState::Running {
            return;
        }
        if let Some(action) = self.actions.get_mut(self.current) {
            action.suspend(ctx);
        }
        self.transition(PipelineState::Suspended);
    }

    pub fn draw(&self, out: &mut Vec<DrawCommand>) {
        if matches!(self.state, PipelineState::Running | PipelineState::Suspended) {
            if let Some(action) = self.actions.get(self.current) {
                action.draw(out);
            }
        }
    }

    fn activate_current(&mut self, ctx: &mut ActionContext) {
        let index = self.current;
        if let Some(action) = self.actions.get_mut(index) {
            action.activate(ctx);
            debug!(pipeline = %self.name, action = action.id(), index, "Action activated");
            self.set_action_state(index, ActionState::Active);
        }
    }

    fn set_action_state(&mut self, index: usize, next: ActionState) {
        if let Some(state) = self.states.get_mut(index) {
            if !state.can_transition_to(next) {
                error!(pipeline = %self.name, index, from = ?state, to = ?next, "Invalid action transition");
                debug_assert!(false, "invalid action transition {:?} -> {:?}", state, next);
            }
            *state = next;
        }
    }

    fn transition(&mut self, next: PipelineState) {
        if !self.state.can_transition_to(next) {
            error!(pipeline = %self.name, from = self.state.name(), to = next.name(), "Invalid pipeline transition");
            debug_assert!(false, "invalid pipeline transition");
        }
        debug!(pipeline = %self.name, from = self.state.name(), to = next.name(), "Pipeline state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PageView;
    use crate::engine::slots::{ActionSlots, SlotKind, SlotValue};
    use crate::estimator::DriftGrid;
    use crate::core::Vec2;

    struct Emit {
        slots: ActionSlots,
        frames: u32,
    }

    impl Action for Emit {
        fn id(&self) -> &str {
            "emit"
        }
        fn slots(&self) -> &ActionSlots {
            &self.slots
        }
        fn slots_mut(&mut self) -> &mut ActionSlots {
            &mut self.slots
        }
        fn update(&mut self, _dt: f64, _input: &GazeInputState, _ctx: &mut ActionContext) -> bool {
            self.frames += 1;
            if self.frames < 2 {
                return false;
            }
            let _ = self.slots.set_output("point", SlotValue::Vec2(Vec2::new(3.0, 4.0)));
            true
        }
    }

    struct Receive {
        slots: ActionSlots,
    }

    impl Action for Receive {
        fn id(&self) -> &str {
            "receive"
        }
        fn slots(&self) -> &ActionSlots {
            &self.slots
        }
        fn slots_mut(&mut self) -> &mut ActionSlots {
            &mut self.slots
        }
        fn update(&mut self, _dt: f64, _input: &GazeInputState, _ctx: &mut ActionContext) -> bool {
            true
        }
    }

    fn two_step() -> Pipeline {
        let mut builder = Pipeline::builder("test");
        let a = builder.add_action(Box::new(Emit {
            slots: ActionSlots::new().with_output("point", SlotKind::Vec2),
            frames: 0,
        }));
        let b = builder.add_action(Box::new(Receive {
            slots: ActionSlots::new().with_input("point", SlotKind::Vec2),
        }));
        builder.connect(a, "point", b, "point").unwrap();
        builder.build()
    }

    #[test]
    fn test_connector_copies_on_finish() {
        let view = PageView::default();
        let drift = DriftGrid::default();
        let mut commands = Vec::new();
        let mut ctx = ActionContext::new(&view, &drift, &mut commands);
        let input = GazeInputState::default();

        let mut pipeline = two_step();
        assert!(!pipeline.update(0.016, &input, &mut ctx));
        assert_eq!(pipeline.current_index(), 0);
        assert!(!pipeline.update(0.016, &input, &mut ctx));
        assert_eq!(pipeline.current_index(), 1);
        let received = pipeline
            .current_action()
            .and_then(|a| a.slots().input_vec2("point"));
        assert_eq!(received, Some(Vec2::new(3.0, 4.0)));
        assert!(pipeline.update(0.016, &input, &mut ctx));
        assert_eq!(pipeline.state(), PipelineState::Finished);
        assert_eq!(pipeline.active_count(), 0);
    }

    #[test]
    fn test_backward_connector_rejected() {
        let mut builder = Pipeline::builder("test");
        builder.add_action(Box::new(Receive {
            slots: ActionSlots::new().with_input("point", SlotKind::Vec2),
        }));
        builder.add_action(Box::new(Emit {
            slots: ActionSlots::new().with_output("point", SlotKind::Vec2),
            frames: 0,
        }));
        assert!(builder.connect(1, "point", 0, "point").is_err());
        assert!(builder.connect(0, "point", 1, "point").is_err());
    }

    #[test]
    fn test_suspended_pipeline_does_not_advance() {
        let view = PageView::default();
        let drift = DriftGrid::default();
        let mut commands = Vec::new();
        let mut ctx = ActionContext::new(&view, &drift, &mut commands);
        let input = GazeInputState::default();

        let mut pipeline = two_step();
        pipeline.update(0.016, &input, &mut ctx);
        pipeline.deactivate(&mut ctx);
        for _ in 0..5 {
            assert!(!pipeline.update(0.016, &input, &mut ctx));
        }
        assert_eq!(pipeline.current_index(), 0);
        pipeline.activate(&mut ctx);
        pipeline.update(0.016, &input, &mut ctx);
        assert_eq!(pipeline.current_index(), 1);
    }

    #[test]
    fn test_empty_pipeline_finishes_immediately() {
        let view = PageView::default();
        let drift = DriftGrid::default();
        let mut commands = Vec::new();
        let mut ctx = ActionContext::new(&view, &drift, &mut commands);
        let mut pipeline = Pipeline::builder("empty").build();
        assert!(pipeline.update(0.016, &GazeInputState::default(), &mut ctx));
        assert_eq!(pipeline.state(), PipelineState::Finished);
    }
}
