pub mod audit;
pub mod ladder;
pub mod message;
pub mod standing;
pub mod verdict;

pub use audit::*;
pub use ladder::*;
pub use message::*;
pub use standing::*;
pub use verdict::*;
