pub mod enums;
pub mod exercise;
pub mod program;

pub use enums::*;
pub use exercise::*;
pub use program::*;
