pub mod job;
pub mod ledger;
pub mod region;

pub use job::{normalize_link, JobPosting, SALARY_PLACEHOLDER};
pub use ledger::LedgerRecord;
pub use region::Region;
