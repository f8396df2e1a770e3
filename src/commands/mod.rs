//! Command handlers for the icms CLI.

mod init;
mod refresh;
mod report;
mod serve;

pub use init::init;
pub use refresh::refresh;
pub use report::report;
pub use serve::serve;
