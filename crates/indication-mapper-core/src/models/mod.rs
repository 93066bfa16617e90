//! Domain models for the indication mapper.

mod code;
mod label;
mod mapping;

pub use code::*;
pub use label::*;
pub use mapping::*;
