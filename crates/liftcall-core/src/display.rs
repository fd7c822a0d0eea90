//! Two-line status display content.

/// Text for the robot's two-line status display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayLines {
    /// Top line
    pub line1: String,
    /// Bottom line (may be empty)
    pub line2: String,
}

impl DisplayLines {
    /// Both lines.
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        Self { line1: line1.into(), line2: line2.into() }
    }

    /// Top line only.
    pub fn single(line1: impl Into<String>) -> Self {
        Self::new(line1, String::new())
    }
}
