use std::collections::VecDeque;

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// A source of operator input, one line at a time.
pub trait LineSource {
    /// Reads the next line without its line ending. Returns `None` at the
    /// end of input.
    fn read_line(&mut self) -> impl Future<Output = Option<String>>;
}

/// Lines typed on the terminal.
///
/// Bytes that are not valid UTF-8 are replaced with `U+FFFD` rather than
/// ending the session.
#[derive(Debug)]
pub struct StdinLines<R = BufReader<Stdin>> {
    reader: R,
}

impl StdinLines {
    /// Reads from the process's standard input.
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> StdinLines<R> {
    /// Reads from any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin> LineSource for StdinLines<R> {
    async fn read_line(&mut self) -> Option<String> {
        let mut buf = vec![];
        match self.reader.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => {
                let line = match String::from_utf8(buf) {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("input is not valid UTF-8: {err}");
                        String::from_utf8_lossy(err.as_bytes()).into_owned()
                    }
                };
                Some(strip_line_ending(line))
            }
            Err(err) => {
                error!("error reading input: {err}");
                eprintln!("❌ Error reading input: {err}");
                None
            }
        }
    }
}

/// Lines given up front, handy for scripted sessions.
#[derive(Clone, Debug, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    /// Creates a source that yields `lines` and then ends.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns how many lines have not been read yet.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedLines {
    async fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
