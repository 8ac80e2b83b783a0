//! Newline-delimited JSON envelopes over a byte stream.
//!
//! **Entry**: `interplay serve --stdio`
//!
//! One envelope per line. Inbound lines are size-limited; oversized or
//! malformed lines are dropped with a debug log and the loop continues. Any
//! other read error ends the loop.

use super::Transport;
use crate::error::TransportError;
use crate::host::{HostCapabilities, HostRouter};
use anyhow::{Context, Result};
use interplay_core::envelope::Envelope;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;

/// Maximum inbound line size (10 MB) to prevent OOM DoS.
pub const MAX_LINE_SIZE: usize = 10 * 1024 * 1024;

/// Outbound NDJSON transport. Writes happen on a dedicated thread so `post`
/// never blocks on the sink.
pub struct StdioTransport {
    name: String,
    tx: Mutex<Option<mpsc::Sender<String>>>,
    writer: Mutex<Option<thread::JoinHandle<io::Result<()>>>>,
}

impl StdioTransport {
    pub fn stdout() -> Self {
        Self::spawn("stdout", io::stdout())
    }

    pub fn spawn<W>(name: impl Into<String>, mut sink: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<String>();
        // Writer thread: receives encoded lines and writes them in order
        let handle = thread::spawn(move || -> io::Result<()> {
            for line in rx {
                writeln!(sink, "{}", line)?;
                sink.flush()?;
            }
            Ok(())
        });
        Self {
            name: name.into(),
            tx: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(handle)),
        }
    }

    /// Stop accepting envelopes, flush what is queued and join the writer.
    pub fn shutdown(&self) -> Result<()> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let handle = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("Writer thread panicked"))?
                .context("Failed to write envelope")?;
        }
        Ok(())
    }
}

impl Transport for StdioTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, envelope: Envelope) -> Result<(), TransportError> {
        let line = envelope.to_json()?;
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = guard
            .as_ref()
            .ok_or_else(|| TransportError::Closed(self.name.clone()))?;
        tx.send(line)
            .map_err(|_| TransportError::Closed(self.name.clone()))
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::debug!("stdio transport shutdown: {}", e);
        }
    }
}

/// Read envelopes from `reader` until EOF or a read failure, handing each to
/// `on_envelope`. Returns the number of envelopes delivered.
pub fn pump_lines<R, F>(reader: &mut R, mut on_envelope: F) -> usize
where
    R: BufRead,
    F: FnMut(Envelope),
{
    let mut delivered = 0usize;
    loop {
        let line = match read_line_limited(reader) {
            Ok(None) => break, // EOF
            Ok(Some(l)) => l,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::debug!("dropping inbound line: {}", e);
                continue;
            }
            Err(e) => {
                tracing::warn!("inbound stream failed: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Envelope::from_json(line) {
            Ok(envelope) => {
                delivered += 1;
                on_envelope(envelope);
            }
            Err(e) => tracing::debug!("dropping malformed envelope: {}", e),
        }
    }
    delivered
}

/// Route every envelope from `reader` through `router` until EOF.
pub fn serve_lines<R, H>(reader: &mut R, router: &mut HostRouter<H>) -> usize
where
    R: BufRead,
    H: HostCapabilities,
{
    pump_lines(reader, |envelope| {
        if let Err(e) = router.handle(envelope) {
            tracing::warn!("failed to route envelope: {}", e);
        }
    })
}

/// Run a host over stdin/stdout. Blocks until stdin closes.
pub fn serve_stdio<H: HostCapabilities>(host: H) -> Result<H> {
    let transport = Arc::new(StdioTransport::stdout());
    let mut router = HostRouter::new(host, transport.clone());

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let handled = serve_lines(&mut reader, &mut router);
    tracing::debug!(handled, "stdin closed");

    transport.shutdown()?;
    Ok(router.into_host())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Size-limited line reader
// ═══════════════════════════════════════════════════════════════════════════════

/// Read a single line from `reader`, enforcing [`MAX_LINE_SIZE`].
/// Returns `Ok(None)` on EOF, `Ok(Some(line))` on success.
pub(crate) fn read_line_limited(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    read_line_with_limit(reader, MAX_LINE_SIZE)
}

fn read_line_with_limit(reader: &mut impl BufRead, limit: usize) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    loop {
        let available = match reader.fill_buf() {
            Ok(b) => b,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return if buf.is_empty() {
                Ok(None)
            } else {
                finish_line(buf).map(Some)
            };
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                if buf.len() + pos > limit {
                    reader.consume(pos + 1);
                    return Err(oversized(limit));
                }
                buf.extend_from_slice(&available[..pos]);
                reader.consume(pos + 1);
                return finish_line(buf).map(Some);
            }
            None => {
                let len = available.len();
                if buf.len() + len > limit {
                    reader.consume(len);
                    skip_until_newline(reader);
                    return Err(oversized(limit));
                }
                buf.extend_from_slice(available);
                reader.consume(len);
            }
        }
    }
}

fn finish_line(mut buf: Vec<u8>) -> io::Result<String> {
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8(buf).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Invalid UTF-8"))
}

fn oversized(limit: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Line exceeds {} byte limit", limit),
    )
}

fn skip_until_newline(reader: &mut impl BufRead) {
    loop {
        match reader.fill_buf() {
            Ok(b) if b.is_empty() => break,
            Ok(b) => {
                if let Some(pos) = b.iter().position(|&c| c == b'\n') {
                    reader.consume(pos + 1);
                    break;
                }
                let len = b.len();
                reader.consume(len);
            }
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview_host::PreviewHost;
    use interplay_core::envelope::MessageType;
    use serde_json::{json, Map, Value};
    use std::io::Cursor;

    /// `Write` sink shared with the test.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedSink {
        fn lines(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    #[test]
    fn test_read_line_limited_skips_oversized() {
        let mut reader = Cursor::new(b"0123456789abcdef\nok\r\n".to_vec());
        assert!(read_line_with_limit(&mut reader, 8).is_err());
        assert_eq!(read_line_with_limit(&mut reader, 8).unwrap().as_deref(), Some("ok"));
        assert_eq!(read_line_with_limit(&mut reader, 8).unwrap(), None);
    }

    #[test]
    fn test_pump_skips_malformed_lines() {
        let input = "not json\n\n{\"type\":\"ready\",\"correlationId\":\"a\"}\n";
        let mut seen = Vec::new();
        let delivered = pump_lines(&mut Cursor::new(input.as_bytes()), |e| seen.push(e));
        assert_eq!(delivered, 1);
        assert_eq!(seen[0].kind(), Some(MessageType::Ready));
    }

    /// Serves its buffer, then fails every read.
    struct BrokenReader(Cursor<Vec<u8>>);

    impl io::Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.fill_buf()?.len() {
                0 => Ok(0),
                _ => io::Read::read(&mut self.0, buf),
            }
        }
    }

    impl BufRead for BrokenReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.0.position() as usize >= self.0.get_ref().len() {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"));
            }
            self.0.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.0.consume(amt)
        }
    }

    #[test]
    fn test_pump_stops_on_read_failure() {
        let input = b"{\"type\":\"ready\",\"correlationId\":\"a\"}\n".to_vec();
        let mut reader = BrokenReader(Cursor::new(input));
        let mut seen = Vec::new();
        let delivered = pump_lines(&mut reader, |e| seen.push(e));
        assert_eq!(delivered, 1);
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_serve_lines_replies_on_sink() {
        let sink = SharedSink::default();
        let transport = Arc::new(StdioTransport::spawn("test", sink.clone()));
        let mut router = HostRouter::new(PreviewHost::new(), transport.clone());

        let request = Envelope::new(
            MessageType::PostToChat,
            "rpc-1-1",
            interplay_core::envelope::payload_from(json!({"message": "hello"})),
        );
        let notify = Envelope::new(MessageType::EnterFullscreen, "rpc-1-2", Map::new());
        let input = format!("{}\n{}\n", request.to_json().unwrap(), notify.to_json().unwrap());

        let handled = serve_lines(&mut Cursor::new(input.into_bytes()), &mut router);
        transport.shutdown().unwrap();

        assert_eq!(handled, 2);
        assert!(router.host().fullscreen);
        assert_eq!(router.host().chat_log, vec!["hello".to_string()]);
        let written = sink.lines();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["type"], "post-to-chat-response");
        assert_eq!(written[0]["correlationId"], "rpc-1-1");
        assert_eq!(written[0]["payload"]["result"]["posted"], true);
    }

    #[test]
    fn test_post_after_shutdown_is_closed() {
        let transport = StdioTransport::spawn("test", SharedSink::default());
        transport.shutdown().unwrap();
        let err = transport
            .post(Envelope::new(MessageType::Ready, "x", Map::new()))
            .unwrap_err();
        assert!(matches!(err, TransportError::Closed(_)));
    }
}
