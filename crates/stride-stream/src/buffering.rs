use std::collections::VecDeque;

/// Buffer that reassembles newline-delimited records from arbitrary
/// byte fragments.
///
/// Fragment boundaries carry no meaning: a record may span any number of
/// fragments, and one fragment may hold any number of records. A record is
/// only emitted once its terminator has been observed; a trailing partial
/// record stays buffered until more bytes arrive (and is simply discarded
/// when the buffer is dropped at stream close).
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete record, if any.
    ///
    /// Tolerates CRLF and LF terminators. Invalid UTF-8 is decoded lossily;
    /// the interpreter will reject the record downstream as malformed.
    pub fn next_record(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut record_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        record_bytes.pop(); // the \n
        if record_bytes.last() == Some(&b'\r') {
            record_bytes.pop();
        }

        Some(String::from_utf8_lossy(&record_bytes).into_owned())
    }

    /// Number of buffered bytes not yet emitted
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_records() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"record1\nrecord2\n");

        assert_eq!(buffer.next_record().unwrap(), "record1");
        assert_eq!(buffer.next_record().unwrap(), "record2");
        assert!(buffer.next_record().is_none());
    }

    #[test]
    fn test_partial_record_spans_fragments() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_record().is_none());

        buffer.extend(b" record\n");
        assert_eq!(buffer.next_record().unwrap(), "partial record");
    }

    #[test]
    fn test_crlf_terminator() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"data: {}\r\nnext\r\n");
        assert_eq!(buffer.next_record().unwrap(), "data: {}");
        assert_eq!(buffer.next_record().unwrap(), "next");
    }

    #[test]
    fn test_empty_record() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"\n\nx\n");
        assert_eq!(buffer.next_record().unwrap(), "");
        assert_eq!(buffer.next_record().unwrap(), "");
        assert_eq!(buffer.next_record().unwrap(), "x");
    }

    #[test]
    fn test_unterminated_remainder_stays_buffered() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"done\ntrailing");
        assert_eq!(buffer.next_record().unwrap(), "done");
        assert!(buffer.next_record().is_none());
        assert_eq!(buffer.len(), 8);
    }
}
