/// Reassembles a delimited byte stream into discrete text lines.
///
/// Bytes are buffered until a `\n` is observed; the delimiter is stripped
/// from the yielded line and a trailing partial line stays buffered until a
/// later chunk completes it. Buffering happens at the byte level so a UTF-8
/// sequence split across chunks is decoded intact once its line completes.
pub struct LineFramer {
    buffer: Vec<u8>,
}

const DELIMITER: u8 = b'\n';

impl LineFramer {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed raw bytes into the framer.
    /// Returns a draining iterator over the complete lines now available.
    pub fn feed<'a>(&'a mut self, chunk: &[u8]) -> Lines<'a> {
        self.buffer.extend_from_slice(chunk);
        Lines { framer: self }
    }

    /// Bytes received after the last delimiter, not yet forming a line.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == DELIMITER)?;
        let line = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
        self.buffer.drain(..=pos);
        Some(line)
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the complete lines currently buffered in a [`LineFramer`].
/// Lines are extracted lazily; dropping the iterator leaves unread lines
/// buffered for the next call.
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.framer.next_line()
    }
}
