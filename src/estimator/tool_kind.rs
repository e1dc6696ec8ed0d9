//! Closed set of edit-tool kinds understood by the estimator.

use std::fmt;

/// Category of edit operation that produced a change.
///
/// Names outside the known set are kept verbatim in [`ToolKind::Unknown`]
/// so the record still carries whatever the caller reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Full-file write (`Write`).
    WriteFile,
    /// String-replace edit (`Edit`).
    EditFile,
    /// Notebook cell edit (`NotebookEdit`).
    EditNotebookCell,
    /// Anything else; contributes no delta.
    Unknown(String),
}

impl ToolKind {
    /// Map a tool name as reported by the hook caller.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Write" => Self::WriteFile,
            "Edit" => Self::EditFile,
            "NotebookEdit" => Self::EditNotebookCell,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Name written to the `tool` field of a record.
    pub fn as_str(&self) -> &str {
        match self {
            Self::WriteFile => "Write",
            Self::EditFile => "Edit",
            Self::EditNotebookCell => "NotebookEdit",
            Self::Unknown(name) => name,
        }
    }

    /// Whether the estimator knows how to count this kind.
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
