pub mod aggregate;
pub mod analysis;
pub mod recording;
pub mod transcript;

pub use aggregate::*;
pub use analysis::*;
pub use recording::*;
pub use transcript::*;
