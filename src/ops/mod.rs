//! high-level operations on arbor repositories

mod commit;
mod fsck;
mod restore;

pub use commit::{build_tree, commit};
pub use fsck::{fsck, CorruptObject, FsckReport, MissingObject};
pub use restore::{restore, restore_commit};
