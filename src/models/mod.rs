pub mod generation;
pub mod media;
pub mod registry;

pub use generation::*;
pub use media::*;
pub use registry::*;
