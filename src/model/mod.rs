pub mod month;
pub mod records;

pub use month::*;
pub use records::*;
