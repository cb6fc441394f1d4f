mod transaction;
mod workspace;

pub use transaction::Transaction;
pub use workspace::Workspace;
