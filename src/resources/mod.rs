//! Filesystem primitives: the symlink model, the conflict classifier, and the
//! helpers the planners and executors share.
pub mod conflict;
pub mod fs;
pub mod symlink;

pub use conflict::{Conflict, ConflictMode, classify};
pub use symlink::Symlink;
