//! CLI command handlers. Each command is in its own file.

mod resume;
mod scan;
mod upload;
mod worklist;

pub use resume::run_resume;
pub use scan::run_scan;
pub use upload::run_upload;
