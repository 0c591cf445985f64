//! Line framing over a byte stream.
//!
//! Each message is one line of text ending in `\n`. A `Protocol`
//! belongs to one connection and is dropped with it.

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};

use crate::error::TcpError;

/// Reads and writes whole lines on one stream.
#[derive(Debug)]
pub struct Protocol<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
}

impl<S: AsyncRead + AsyncWrite> Protocol<S> {
    pub fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Write `line` followed by `\n`, then flush.
    ///
    /// # Errors
    ///
    /// Returns [`TcpError::Io`] if the stream rejects the write.
    pub async fn send_message(&mut self, line: &str) -> Result<(), TcpError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read the next line, without its terminator.
    ///
    /// Returns `Ok(None)` when the peer closed the stream between lines.
    /// Bytes that are not UTF-8 are replaced with `U+FFFD`, so such a line
    /// still reaches the codec and gets an error reply.
    ///
    /// # Errors
    ///
    /// - [`TcpError::ConnectionClosed`] if the stream ends inside a line.
    /// - [`TcpError::Io`] on read failure.
    pub async fn read_message(&mut self) -> Result<Option<String>, TcpError> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(None);
        }
        if buf.last() != Some(&b'\n') {
            return Err(TcpError::ConnectionClosed);
        }
        while matches!(buf.last(), Some(b'\r' | b'\n')) {
            buf.pop();
        }
        let line = String::from_utf8(buf).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "line is not valid UTF-8");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        });
        Ok(Some(line))
    }

    /// Shut down the write side so the peer sees end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`TcpError::Io`] if the shutdown fails.
    pub async fn close(mut self) -> Result<(), TcpError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use super::*;

    #[tokio::test]
    async fn should_deliver_lines_in_order() {
        let (left, right) = duplex(256);
        let mut sender = Protocol::new(left);
        let mut receiver = Protocol::new(right);

        sender.send_message("first").await.unwrap();
        sender.send_message("second").await.unwrap();

        assert_eq!(receiver.read_message().await.unwrap().as_deref(), Some("first"));
        assert_eq!(receiver.read_message().await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn should_return_none_when_peer_closes_between_lines() {
        let (left, right) = duplex(256);
        let mut sender = Protocol::new(left);
        let mut receiver = Protocol::new(right);

        sender.send_message("only").await.unwrap();
        sender.close().await.unwrap();

        assert_eq!(receiver.read_message().await.unwrap().as_deref(), Some("only"));
        assert!(receiver.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_fail_when_stream_ends_inside_a_line() {
        let (mut left, right) = duplex(256);
        let mut receiver = Protocol::new(right);

        left.write_all(b"half a li").await.unwrap();
        drop(left);

        assert!(matches!(
            receiver.read_message().await,
            Err(TcpError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn should_strip_carriage_return() {
        let (mut left, right) = duplex(256);
        let mut receiver = Protocol::new(right);

        left.write_all(b"EXIT\r\n").await.unwrap();

        assert_eq!(receiver.read_message().await.unwrap().as_deref(), Some("EXIT"));
    }

    #[tokio::test]
    async fn should_replace_invalid_utf8_when_reading_line() {
        let (mut left, right) = duplex(256);
        let mut receiver = Protocol::new(right);

        left.write_all(b"ok\xff\xfe\nnext\n").await.unwrap();

        assert_eq!(
            receiver.read_message().await.unwrap().as_deref(),
            Some("ok\u{fffd}\u{fffd}")
        );
        assert_eq!(receiver.read_message().await.unwrap().as_deref(), Some("next"));
    }
}
