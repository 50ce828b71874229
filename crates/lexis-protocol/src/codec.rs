use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::Message;

/// Longest accepted line, excluding the terminator.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

const LINE_ENDINGS: &[char] = &['\r', '\n'];

/// Codec for one-message-per-line JSON framing.
pub struct LineCodec;

impl LineCodec {
    /// Encode a message as a single line, including the trailing `\n`.
    ///
    /// JSON string escaping guarantees no raw newline appears inside a field.
    pub fn encode(msg: &Message) -> ProtocolResult<String> {
        let mut line =
            serde_json::to_string(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if line.len() > MAX_LINE_LENGTH {
            return Err(ProtocolError::MessageTooLarge {
                size: line.len(),
                max: MAX_LINE_LENGTH,
            });
        }
        line.push('\n');
        Ok(line)
    }

    /// Decode one line. A trailing line terminator is ignored.
    pub fn decode(line: &str) -> ProtocolResult<Message> {
        let line = line.trim_end_matches(LINE_ENDINGS);
        if line.trim().is_empty() {
            return Err(ProtocolError::Decode("empty line".into()));
        }
        serde_json::from_str(line).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Read the next message from `reader`.
///
/// Returns `Ok(None)` at end of stream. A line that cannot be decoded is
/// consumed in full and reported as a recoverable error, so the caller can
/// answer it and keep reading.
pub async fn read_message<R>(reader: &mut R) -> ProtocolResult<Option<Message>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = MAX_LINE_LENGTH as u64 + 2;
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(None);
    }

    if !buf.ends_with(b"\n") && buf.len() as u64 >= limit {
        let discarded = discard_line(reader).await?;
        debug!(read = buf.len(), discarded, max = MAX_LINE_LENGTH, "skipping oversized line");
        return Err(ProtocolError::MessageTooLarge {
            size: buf.len(),
            max: MAX_LINE_LENGTH,
        });
    }

    let line = String::from_utf8(buf).map_err(|e| ProtocolError::Decode(e.to_string()))?;
    LineCodec::decode(&line).map(Some)
}

/// Write one message and flush.
pub async fn write_message<W>(writer: &mut W, msg: &Message) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let line = LineCodec::encode(msg)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Consume up to and including the next `\n`. Returns the bytes skipped.
async fn discard_line<R>(reader: &mut R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(skipped);
        }
        if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
            reader.consume(pos + 1);
            return Ok(skipped + pos + 1);
        }
        let len = buf.len();
        reader.consume(len);
        skipped += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Operation, Status};
    use tokio::io::BufReader;

    #[test]
    fn encode_is_single_line() {
        let msg = Message::error("line one\nline two");
        let line = LineCodec::encode(&msg).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(LineCodec::decode(&line).unwrap(), msg);
    }

    #[test]
    fn decode_tolerates_crlf() {
        let msg = LineCodec::decode("{\"operation\":\"SEARCH\",\"word\":\"hello\"}\r\n").unwrap();
        assert_eq!(msg.word.as_deref(), Some("hello"));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(LineCodec::decode("not json"), Err(ProtocolError::Decode(_))));
        assert!(matches!(LineCodec::decode("   \n"), Err(ProtocolError::Decode(_))));
        assert!(matches!(
            LineCodec::decode(r#"{"status":"MAYBE"}"#),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn decode_error_message_prefix() {
        let err = LineCodec::decode("{").unwrap_err();
        assert!(err.to_string().starts_with("Invalid request format: "));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn read_sequence_then_eof() {
        let input = b"{\"operation\":\"SEARCH\",\"word\":\"a\"}\nbogus\n{\"operation\":\"REMOVE\",\"word\":\"b\"}";
        let mut reader = BufReader::new(&input[..]);

        let first = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(first.word.as_deref(), Some("a"));

        let second = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(second, ProtocolError::Decode(_)));

        let third = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(third.operation_kind().unwrap(), Operation::Remove);

        assert!(read_message(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_is_recoverable() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"{\"operation\":\"SEARCH\",\"word\":\"ok\"}\n");
        let mut reader = BufReader::new(&input[..]);

        let err = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        let next = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(next.word.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn oversized_line_is_skipped() {
        let mut input = vec![b'x'; MAX_LINE_LENGTH + 10];
        input.push(b'\n');
        input.extend_from_slice(b"{\"operation\":\"SEARCH\",\"word\":\"after\"}\n");
        let mut reader = BufReader::new(&input[..]);

        let err = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
        let next = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(next.word.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn write_then_read() {
        let msg = Message::response(Operation::Add, Status::Duplicate).with_word("cat");
        let mut out = Vec::new();
        write_message(&mut out, &msg).await.unwrap();

        let mut reader = BufReader::new(&out[..]);
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(msg));
    }
}
