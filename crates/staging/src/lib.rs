pub mod commit;
pub mod config;
pub mod session;
pub mod store;

pub use commit::{finalize, CommitError, ExpenseSink, HttpSink};
pub use config::{ConfigError, EngineConfig};
pub use session::{ImportSession, SessionError};
pub use store::StagingStore;
