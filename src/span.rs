use std::cmp::{max, min};

/// Half-open byte range into the original source buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Span { start: at, end: at }
    }

    pub fn merge(self, other: Span) -> Self {
        Span {
            start: min(self.start, other.start),
            end: max(self.end, other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap {
    src: Vec<u8>,
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(src: &[u8]) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in src.iter().enumerate() {
            if *b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        SourceMap {
            src: src.to_vec(),
            line_starts,
        }
    }

    /// 1-based line and column of a byte offset. Columns count characters, not bytes.
    pub fn line_col(&self, pos: usize) -> (usize, usize) {
        let pos = min(pos, self.src.len());
        let line_idx = self
            .line_starts
            .binary_search(&pos)
            .unwrap_or_else(|x| x - 1);

        let line_start = self.line_starts[line_idx];
        let col = String::from_utf8_lossy(&self.src[line_start..pos]).chars().count() + 1;
        (line_idx + 1, col)
    }

    pub fn line_snippet(&self, line: usize) -> String {
        if line < 1 || line > self.line_starts.len() {
            return String::new();
        }
        let start = self.line_starts[line - 1];
        let end = if line == self.line_starts.len() {
            self.src.len()
        } else {
            self.line_starts[line] - 1 // Exclude newline
        };
        if start > end {
            return String::new();
        }
        String::from_utf8_lossy(&self.src[start..end])
            .trim_end_matches('\r')
            .to_string()
    }

    /// The source line holding `span.start`, with carets under the part of the span
    /// that lies on that line.
    pub fn excerpt(&self, span: Span) -> String {
        let (line, col) = self.line_col(span.start);
        let start = min(span.start, self.src.len());
        let line_end = self
            .line_starts
            .get(line)
            .map_or(self.src.len(), |next| next - 1);
        let end = max(min(span.end, line_end), start);
        let width = String::from_utf8_lossy(&self.src[start..end])
            .trim_end_matches('\r')
            .chars()
            .count();
        format!(
            "{}\n{}{}",
            self.line_snippet(line),
            " ".repeat(col - 1),
            "^".repeat(max(width, 1))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        let sm = SourceMap::new(b"let a = 1\nlet b = 2\n");
        assert_eq!(sm.line_col(0), (1, 1));
        assert_eq!(sm.line_col(4), (1, 5));
        assert_eq!(sm.line_col(10), (2, 1));
        assert_eq!(sm.line_col(14), (2, 5));
    }

    #[test]
    fn line_col_clamps_past_end() {
        let sm = SourceMap::new(b"ab");
        assert_eq!(sm.line_col(99), (1, 3));
    }

    #[test]
    fn snippet_drops_carriage_return() {
        let sm = SourceMap::new(b"print(:a)\r\nlet b = 2");
        assert_eq!(sm.line_snippet(1), "print(:a)");
        assert_eq!(sm.line_snippet(2), "let b = 2");
        assert_eq!(sm.line_snippet(3), "");
    }

    #[test]
    fn excerpt_marks_the_span() {
        let sm = SourceMap::new(b"let a = 1\nlett b = 2\n");
        assert_eq!(sm.excerpt(Span::new(10, 14)), "lett b = 2\n^^^^");
        assert_eq!(sm.excerpt(Span::new(15, 16)), "lett b = 2\n     ^");
        // an empty span at the end of input still gets one caret
        assert_eq!(sm.excerpt(Span::empty(21)), "\n^");
    }

    #[test]
    fn merge_covers_both() {
        let span = Span::new(4, 6).merge(Span::new(1, 2));
        assert_eq!(span, Span::new(1, 6));
        assert_eq!(span.len(), 5);
    }
}
