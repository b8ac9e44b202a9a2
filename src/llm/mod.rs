pub mod client;
pub mod generator;
pub mod interpret;
pub mod prompts;

pub use client::*;
pub use generator::*;
pub use interpret::*;
pub use prompts::*;
