pub mod envelope;
pub mod generate;
pub mod task;

pub use envelope::*;
pub use generate::*;
pub use task::*;
