pub mod classify;
pub mod error;
pub mod sequence;
pub mod snapshot;

pub use classify::*;
pub use error::*;
pub use sequence::*;
pub use snapshot::*;
