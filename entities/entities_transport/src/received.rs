//! Outcome of a successful stream receive.

/// Result of a blocking receive
///
/// End-of-stream is a normal terminal signal, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// `n > 0` bytes were written to the front of the buffer
    Data(usize),
    /// The peer performed an orderly close
    EndOfStream,
}

impl Received {
    /// Number of bytes received (zero at end of stream)
    pub fn len(&self) -> usize {
        match self {
            Received::Data(n) => *n,
            Received::EndOfStream => 0,
        }
    }

    /// True when no bytes were delivered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Received::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_received_len() {
        assert_eq!(Received::Data(12).len(), 12);
        assert_eq!(Received::EndOfStream.len(), 0);
        assert!(Received::EndOfStream.is_end_of_stream());
        assert!(!Received::Data(1).is_end_of_stream());
    }

    #[test]
    fn test_received_is_empty() {
        assert!(Received::EndOfStream.is_empty());
        assert!(!Received::Data(3).is_empty());
    }
}
