//! Concrete pipeline steps, in run order.

mod discover;
mod extract;
mod report;
mod stitch;
mod sync_check;

pub use discover::DiscoverStep;
pub use extract::ExtractStep;
pub use report::ReportStep;
pub use stitch::StitchStep;
pub use sync_check::SyncCheckStep;
