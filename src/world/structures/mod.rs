//! Templates stamped into the world by the decoration pass.

mod structure;
mod tree;

pub use structure::Structure;
pub use tree::TREE;
