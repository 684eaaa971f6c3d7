pub mod align;
pub mod engine;
pub mod error;
pub mod features;

pub use align::*;
pub use engine::*;
pub use error::*;
pub use features::*;
