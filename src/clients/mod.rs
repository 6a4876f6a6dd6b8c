pub mod groq;
pub mod mock;

pub use groq::*;
pub use mock::*;
