pub mod file;
pub mod partner;

pub use file::*;
pub use partner::*;
