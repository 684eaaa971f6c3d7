pub mod series;
pub mod timestamp;

pub use series::*;
pub use timestamp::*;
