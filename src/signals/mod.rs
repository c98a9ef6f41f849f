//! Signal evaluation: window statistics, classification and alert rules.

pub mod alert;
pub mod engine;
pub mod window;

pub use alert::*;
pub use engine::*;
