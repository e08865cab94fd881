pub mod posting;
pub mod trend;

pub use posting::*;
pub use trend::*;
