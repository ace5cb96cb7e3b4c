//! Line input shared by the interactive shell and the app runner.

use std::io::{self, BufRead};

/// Buffered line reader with carriage-return trimming and multi-line
/// body capture.
pub struct Input<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> Input<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Read the next line, with any trailing carriage return removed.
    ///
    /// Returns `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        match self.lines.next() {
            Some(line) => {
                let mut line = line?;
                if line.ends_with('\r') {
                    line.pop();
                }
                Ok(Some(line))
            }
            None => Ok(None),
        }
    }

    /// Accumulate lines until a line equal to `terminator` or end of input.
    ///
    /// Each accumulated line keeps its newline; the terminator itself is
    /// consumed and discarded.
    pub fn read_body(&mut self, terminator: &str) -> io::Result<String> {
        let mut body = String::new();
        while let Some(line) = self.next_line()? {
            if line == terminator {
                break;
            }
            body.push_str(&line);
            body.push('\n');
        }
        Ok(body)
    }
}
