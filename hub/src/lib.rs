//! Agent hub: a WebSocket front end for tools, agents and workflows
//!
//! Clients send either inline tool calls:
//!
//! ```text
//! <view_file>{"AbsolutePath": "/src/main.rs", "StartLine": 0, "EndLine": 20, "IncludeSummaryOfOtherLines": false}</view_file>
//! ```
//!
//! answered with one `<view_file_response>` frame per call, or a JSON message
//! addressed to the orchestrator or an agent:
//!
//! ```text
//! {"target": "orchestrator", "action": "start_workflow", "workflow_name": "bug_fixing"}
//! ```
//!
//! answered with a single JSON frame.

pub mod config;
pub mod error;
pub mod registry;
pub mod router;
pub mod server;

pub use config::HubConfig;
pub use error::{HubError, HubResult};
pub use registry::ToolRegistry;
pub use router::{extract_inline_calls, InlineCall, MessageRouter};
pub use server::{create_router, serve, HubState};
