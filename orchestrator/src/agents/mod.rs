//! Built-in agents
//!
//! Each agent answers a fixed set of actions with structured responses.

pub mod coder;
pub mod debugger;
pub mod deeper_searcher;
pub mod memory_bank;

pub use coder::CoderAgent;
pub use debugger::DebuggerAgent;
pub use deeper_searcher::DeeperSearcherAgent;
pub use memory_bank::MemoryBankAgent;
