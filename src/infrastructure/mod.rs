pub mod chromium;
pub mod driver;
pub mod ledger;

pub use chromium::{ChromiumDriver, ChromiumElement};
pub use driver::{BrowserDriver, DomElement, SessionCookie};
pub use ledger::{LedgerService, Worksheet};
