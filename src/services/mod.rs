pub mod job_search;
pub mod ledger_writer;
pub mod session;
pub mod throttle;

pub use job_search::JobDiscovery;
pub use ledger_writer::LedgerWriter;
pub use session::{Credentials, Session, SessionManager};
pub use throttle::{Pace, QuotaController};
