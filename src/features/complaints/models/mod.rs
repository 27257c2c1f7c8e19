mod complaint;

pub use complaint::*;
