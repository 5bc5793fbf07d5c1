//! Nesting stack.
//!
//! Tracks the lines that opened a level and are still waiting for their
//! closing fragment. Frames close in LIFO order, each exactly once.

use crate::line::SourceLine;
use crate::output::OutputBuffer;

/// An opened, not yet closed level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Level the opening fragment was emitted at.
    pub indent: usize,
    /// Fragment emitted when the frame is popped.
    pub close: String,
}

/// LIFO stack of open frames for one compile run.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether every opened frame has been closed.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame on top of the stack, if any.
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Close every frame that is not a strict ancestor of `indent`.
    /// Returns the number of frames closed.
    pub fn close_to(&mut self, indent: usize, out: &mut OutputBuffer) -> usize {
        let mut closed = 0;
        while self.top().is_some_and(|frame| frame.indent >= indent) {
            self.pop(out);
            closed += 1;
        }
        closed
    }

    /// Close stale frames, then emit `line`: its opening fragment plus a new
    /// frame when it opens a level, its full rendering otherwise.
    pub fn reconcile(&mut self, line: &SourceLine, out: &mut OutputBuffer) {
        self.close_to(line.indent, out);

        if line.opens_level() {
            out.push(line.indent, fragment(line.open.as_deref()));
            let frame = Frame {
                indent: line.indent,
                close: fragment(line.close.as_deref()),
            };
            log::trace!("line {}: open frame at level {}", line.number, frame.indent);
            self.frames.push(frame);
        } else {
            out.push(line.indent, line.render());
        }
    }

    /// Close all remaining frames, innermost first.
    pub fn flush(&mut self, out: &mut OutputBuffer) -> usize {
        let remaining = self.frames.len();
        while !self.frames.is_empty() {
            self.pop(out);
        }
        remaining
    }

    fn pop(&mut self, out: &mut OutputBuffer) {
        if let Some(frame) = self.frames.pop() {
            out.push(frame.indent, frame.close);
        }
    }
}

fn fragment(text: Option<&str>) -> String {
    text.unwrap_or_default().trim().to_string()
}
