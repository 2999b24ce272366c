//! Filesystem operation handlers
//!
//! Each handler takes the config and typed params and returns a typed
//! response; conversion to the wire value happens in the tool layer.

use tokio::fs;

use crate::edit::apply_edits;
use crate::params::{EditFileParams, ViewFileParams, WriteToFileParams};
use crate::sanitize::{display, safe_path};
use crate::types::{
    Config, EditFileResponse, FsError, FsResult, ViewFileResponse, WriteToFileResponse,
};

const UNEDITABLE_EXTENSIONS: &[&str] = &[".ipynb"];

// ============================================================================
// Helper Functions
// ============================================================================

async fn is_file(path: &std::path::Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

async fn read_lossy(path: &std::path::Path, config: &Config) -> FsResult<String> {
    let metadata = fs::metadata(path).await.map_err(FsError::io("read"))?;
    if metadata.len() > config.limits.max_file_size as u64 {
        return Err(FsError::FileTooLarge {
            size: metadata.len(),
            max: config.limits.max_file_size,
        });
    }

    let bytes = fs::read(path).await.map_err(FsError::io("read"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Summary lines for the parts of the file outside `start..=end`
fn summarize_hidden(start: usize, end: usize, total: usize) -> Option<String> {
    let mut summary = Vec::new();
    if start > 0 {
        summary.push(format!("Lines 0-{} (not shown): {} lines", start - 1, start));
    }
    if end + 1 < total {
        summary.push(format!(
            "Lines {}-{} (not shown): {} lines",
            end + 1,
            total - 1,
            total - end - 1
        ));
    }

    if summary.is_empty() {
        None
    } else {
        Some(summary.join("\n"))
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

pub async fn view_file(config: &Config, params: ViewFileParams) -> FsResult<ViewFileResponse> {
    let path = safe_path(&params.absolute_path);
    if !is_file(&path).await {
        return Err(FsError::NotFound(display(&path)));
    }

    if params.end_line < params.start_line {
        return Err(FsError::InvertedRange);
    }
    if params.end_line.saturating_sub(params.start_line) > config.limits.max_view_lines as i64 {
        return Err(FsError::RangeTooLarge(config.limits.max_view_lines));
    }

    let content = read_lossy(&path, config).await?;
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let total_lines = lines.len();

    // Clamp into the file; an empty file yields the 0..=0 window with no content
    let last = total_lines as i64 - 1;
    let start_line = params.start_line.min(last).max(0) as usize;
    let end_line = params.end_line.min(last).max(0) as usize;

    let shown = if total_lines == 0 {
        String::new()
    } else {
        lines[start_line..=end_line].concat()
    };

    let summary = if params.include_summary_of_other_lines {
        summarize_hidden(start_line, end_line, total_lines)
    } else {
        None
    };

    tracing::debug!(path = %path.display(), start_line, end_line, total_lines, "viewed file");

    Ok(ViewFileResponse {
        file_path: display(&path),
        start_line,
        end_line,
        total_lines,
        content: shown,
        summary,
    })
}

pub async fn write_to_file(
    config: &Config,
    params: WriteToFileParams,
) -> FsResult<WriteToFileResponse> {
    let path = safe_path(&params.target_file);
    if fs::try_exists(&path).await.unwrap_or(false) {
        return Err(FsError::AlreadyExists(display(&path)));
    }

    if params.code_content.len() > config.limits.max_file_size {
        return Err(FsError::FileTooLarge {
            size: params.code_content.len() as u64,
            max: config.limits.max_file_size,
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(FsError::io("write"))?;
    }

    let content = if params.empty_file {
        ""
    } else {
        params.code_content.as_str()
    };
    fs::write(&path, content).await.map_err(FsError::io("write"))?;

    tracing::info!(path = %path.display(), bytes = content.len(), "created file");

    Ok(WriteToFileResponse {
        success: true,
        message: format!("File created: {}", display(&path)),
        file_path: display(&path),
        is_empty: params.empty_file,
    })
}

pub async fn edit_file(config: &Config, params: EditFileParams) -> FsResult<EditFileResponse> {
    let path = safe_path(&params.target_file);
    if !is_file(&path).await {
        return Err(FsError::NotFound(display(&path)));
    }

    let target = display(&path);
    if let Some(ext) = UNEDITABLE_EXTENSIONS.iter().find(|ext| target.ends_with(*ext)) {
        return Err(FsError::UnsupportedExtension(ext.to_string()));
    }

    let original = read_lossy(&path, config).await.map_err(|e| match e {
        FsError::Io { source, .. } => FsError::io("edit")(source),
        other => other,
    })?;
    let updated = apply_edits(&original, &params.code_edit);
    fs::write(&path, updated).await.map_err(FsError::io("edit"))?;

    tracing::info!(path = %target, instruction = %params.instruction, "edited file");

    Ok(EditFileResponse {
        success: true,
        message: format!("File edited: {}", target),
        file_path: target,
        instruction: params.instruction,
        language: params.code_markdown_language,
        lint_error_ids: params.target_lint_error_ids,
    })
}
