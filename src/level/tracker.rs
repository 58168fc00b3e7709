// LevelTracker - edge detection on the is-level flag

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelEdge {
    Entered,
    Left,
    Unchanged,
}

/// Remembers whether the previous reading was level; starts not level
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelTracker {
    is_level: bool,
}

impl LevelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, is_level: bool) -> LevelEdge {
        let edge = match (self.is_level, is_level) {
            (false, true) => LevelEdge::Entered,
            (true, false) => LevelEdge::Left,
            _ => LevelEdge::Unchanged,
        };
        self.is_level = is_level;
        edge
    }

    pub fn is_level(&self) -> bool {
        self.is_level
    }
}
