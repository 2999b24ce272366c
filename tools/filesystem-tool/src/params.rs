//! Parameter types for the filesystem tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ViewFileParams {
    #[schemars(description = "Path to file to view. Must be an absolute path.")]
    pub absolute_path: String,

    #[schemars(description = "Startline to view (0-indexed)")]
    pub start_line: i64,

    #[schemars(
        description = "Endline to view, inclusive. This cannot be more than 200 lines away from StartLine"
    )]
    pub end_line: i64,

    #[schemars(
        description = "If true, also return a condensed summary of the lines outside StartLine..EndLine"
    )]
    pub include_summary_of_other_lines: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct WriteToFileParams {
    #[schemars(description = "The target file to create and write code to")]
    pub target_file: String,

    #[schemars(description = "The code contents to write to the file")]
    pub code_content: String,

    #[schemars(description = "Set this to true to create an empty file")]
    pub empty_file: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct EditFileParams {
    #[schemars(description = "Markdown language for the code block, e.g 'python' or 'rust'")]
    pub code_markdown_language: String,

    #[schemars(description = "The target file to modify")]
    pub target_file: String,

    #[schemars(description = "A description of the changes that you are making to the file")]
    pub instruction: String,

    #[schemars(description = "IDs of lint errors this edit aims to fix, if any")]
    pub target_lint_error_ids: Vec<String>,

    #[schemars(
        description = "Only the lines to change; unchanged code is represented by the placeholder {{ ... }}"
    )]
    pub code_edit: String,
}
