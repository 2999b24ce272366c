//! Filesystem Tool Library
//!
//! Provides the `view_file`, `write_to_file` and `edit_file` tools. User paths
//! are sanitised by stripping `../` sequences before any access.
//!
//! # Usage
//!
//! ```rust,ignore
//! use filesystem_tool::{filesystem_tools, Config};
//!
//! for tool in filesystem_tools(Config::default()) {
//!     registry.register(tool);
//! }
//! ```

pub mod edit;
pub mod handlers;
pub mod params;
pub mod sanitize;
pub mod tool;
pub mod types;

pub use params::*;
pub use tool::{filesystem_tools, EditFileTool, ViewFileTool, WriteToFileTool};
pub use types::{Config, FsError};
