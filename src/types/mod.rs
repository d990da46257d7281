//! Small shared enums used across commands, config and lint output.

mod level;
mod output;

pub use level::*;
pub use output::*;
