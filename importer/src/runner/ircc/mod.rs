mod walker;

pub use walker::*;
