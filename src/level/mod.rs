//! Bubble level: tilt mapping, level edge detection and the leveling tool.

pub mod mapper;
pub mod tool;
pub mod tracker;

pub use mapper::{BubbleMapper, BubblePosition};
pub use tool::{LevelReadout, LevelingTool, ZeroOutcome};
pub use tracker::{LevelEdge, LevelTracker};
