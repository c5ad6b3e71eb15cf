pub mod clauses;
pub mod diff;
pub mod poller;
pub mod session;
pub mod store;

pub use clauses::{ClauseCache, ClauseToggle};
pub use diff::DiffService;
pub use poller::{PollSnapshot, VersionStatusPoller};
pub use session::AnalysisSession;
pub use store::ProjectVersionStore;
