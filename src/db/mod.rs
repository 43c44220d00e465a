pub mod batch;
pub mod command;
pub mod connection;
pub mod error_context;
pub mod live_runner;

pub use batch::{BatchExecutor, BatchItem, BatchReader, ResultRow, ResultSet};
pub use command::{Command, CommandBuilder, DbParam, DbType};
pub use connection::{connect_to_database, mask_url_password};
pub use live_runner::LiveDdlRunner;
