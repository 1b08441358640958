use super::{GazeScrollAction, LeftClickAction, MagnifyAction, SelectionEndAction, SelectionStartAction};
use crate::config::GazeConfig;
use crate::engine::Pipeline;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Interaction a trigger starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Click,
    TextSelection,
    Scroll,
}

impl PipelineKind {
    pub fn build(&self, config: &GazeConfig) -> Result<Pipeline> {
        match self {
            Self::Click => click(config),
            Self::TextSelection => text_selection(config),
            Self::Scroll => scroll(config),
        }
    }
}

/// Magnify, then click at the committed coordinate
pub fn click(config: &GazeConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder("click");
    let magnify = builder.add_action(Box::new(MagnifyAction::from_config(&config.magnification)));
    let click = builder.add_action(Box::new(LeftClickAction::default()));
    builder.connect(magnify, "coordinate", click, "coordinate")?;
    Ok(builder.build())
}

/// Magnify and anchor the selection, then magnify and extend it
pub fn text_selection(config: &GazeConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder("text_selection");
    let first = builder.add_action(Box::new(MagnifyAction::from_config(&config.magnification)));
    let start = builder.add_action(Box::new(SelectionStartAction::default()));
    let second = builder.add_action(Box::new(MagnifyAction::from_config(&config.magnification)));
    let end = builder.add_action(Box::new(SelectionEndAction::default()));
    builder.connect(first, "coordinate", start, "coordinate")?;
    builder.connect(second, "coordinate", end, "coordinate")?;
    Ok(builder.build())
}

pub fn scroll(config: &GazeConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder("scroll");
    builder.add_action(Box::new(GazeScrollAction::from_config(&config.scroll)));
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_build() {
        let config = GazeConfig::default();
        assert_eq!(click(&config).unwrap().len(), 2);
        assert_eq!(text_selection(&config).unwrap().len(), 4);
        assert_eq!(PipelineKind::Scroll.build(&config).unwrap().name(), "scroll");
    }
}
