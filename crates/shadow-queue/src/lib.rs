pub mod cancel;
pub mod queue;

pub use cancel::*;
pub use queue::*;
