pub mod clock;
pub mod errors;
pub mod filter;
pub mod timestamp;
pub mod todo;
pub mod validation;

pub use clock::*;
pub use errors::*;
pub use filter::*;
pub use todo::*;
pub use validation::*;
