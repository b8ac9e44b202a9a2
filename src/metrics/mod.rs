pub mod loudness;
pub mod talk_time;
pub mod word_cloud;

pub use loudness::*;
pub use talk_time::*;
pub use word_cloud::*;
