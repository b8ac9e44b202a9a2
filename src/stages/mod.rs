pub mod analyze;
pub mod completeness;
pub mod resolve;
pub mod segment;

pub use analyze::*;
pub use completeness::*;
pub use resolve::*;
pub use segment::*;
