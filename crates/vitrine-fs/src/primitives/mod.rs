pub mod dir;
pub mod link;
pub mod rw;

pub use dir::{move_dir, remove_dir_best_effort};
pub use link::{entry_exists, read_link, remove_symlink, replace_symlink_dir, symlink_dir};
pub use rw::atomic_write;
