mod discovery;
mod graph;

pub use discovery::*;
pub use graph::*;
