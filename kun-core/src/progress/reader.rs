//! Line splitting for engine stderr.
//!
//! ffmpeg rewrites its stats line in place with `\r`, so a plain
//! `BufRead::lines` would deliver a whole encode's progress as one line at
//! exit. This reader treats `\r`, `\n` and `\r\n` alike.

use std::io::{self, BufRead, BufReader, Read};

/// Iterator over the non-empty, trimmed lines of a diagnostic stream.
pub struct DiagnosticLines<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    finished: bool,
}

impl<R: Read> DiagnosticLines<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
            finished: false,
        }
    }

    fn take_pending(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        (!line.is_empty()).then_some(line)
    }
}

impl<R: Read> Iterator for DiagnosticLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            if available.is_empty() {
                self.finished = true;
                return self.take_pending().map(Ok);
            }

            match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(end) => {
                    self.pending.extend_from_slice(&available[..end]);
                    self.reader.consume(end + 1);
                    if let Some(line) = self.take_pending() {
                        return Some(Ok(line));
                    }
                }
                None => {
                    let len = available.len();
                    self.pending.extend_from_slice(available);
                    self.reader.consume(len);
                }
            }
        }
        None
    }
}
