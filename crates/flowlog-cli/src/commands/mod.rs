//! Command implementations for the CLI.

mod delay;
mod record;
mod send;
mod stats;

pub use delay::cmd_delay;
pub use record::{RecordArgs, cmd_record};
pub use send::cmd_send;
pub use stats::cmd_stats;
