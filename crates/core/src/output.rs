//! Output assembly.

/// Indentation written once per nesting level.
pub const INDENT_UNIT: &str = "  ";

/// Ordered `(level, text)` entries collected during one compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    entries: Vec<(usize, String)>,
}

impl OutputBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one fragment at the given nesting level.
    pub fn push(&mut self, level: usize, text: impl Into<String>) {
        self.entries.push((level, text.into()));
    }

    /// Buffered entries in emission order.
    pub fn entries(&self) -> &[(usize, String)] {
        &self.entries
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render entries newline-joined, each prefixed by its indentation.
    pub fn render(&self) -> String {
        let capacity = self
            .entries
            .iter()
            .map(|(level, text)| level * INDENT_UNIT.len() + text.len() + 1)
            .sum();
        let mut out = String::with_capacity(capacity);

        for (i, (level, text)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for _ in 0..*level {
                out.push_str(INDENT_UNIT);
            }
            out.push_str(text);
        }

        out
    }
}
