//! Tool Common - Shared building blocks for agent-hub tools
//!
//! This crate provides the pieces every tool crate and the hub share:
//!
//! - **Descriptors**: [`CapabilityDescriptor`] - the immutable (name, description,
//!   parameter-schema) triple used by tools and agents for discovery and validation
//! - **Tools**: the [`Tool`] trait every capability provider implements
//! - **Errors**: [`ToolError`] plus helpers for converting foreign errors
//! - **Results**: helpers for parsing typed parameters and formatting tool replies
//! - **Initialization**: [`init_tracing`] for consistent logging setup
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use tool_common::{parse_params, CapabilityDescriptor, Tool, ToolResult};
//!
//! struct EchoTool {
//!     descriptor: CapabilityDescriptor,
//! }
//!
//! #[async_trait]
//! impl Tool for EchoTool {
//!     fn descriptor(&self) -> &CapabilityDescriptor {
//!         &self.descriptor
//!     }
//!
//!     async fn execute(&self, params: serde_json::Value) -> ToolResult<serde_json::Value> {
//!         let params: EchoParams = parse_params(params)?;
//!         Ok(serde_json::json!({ "echo": params.text }))
//!     }
//! }
//! ```

pub mod descriptor;
pub mod error;
pub mod init;
pub mod result;
pub mod tool;

// Re-export commonly used items at crate root
pub use descriptor::CapabilityDescriptor;
pub use error::{IntoToolError, ResultExt, ToolError, ToolResult};
pub use init::init_tracing;
pub use result::{error_value, format_tool_response, parse_params};
pub use tool::Tool;
