use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::net::TcpStream;
use std::time::Duration;

use uia_bridge_protocol::CommandResult;
use uia_bridge_protocol::Envelope;

use super::TransportConnection;
use super::TransportError;
use super::TransportListener;

/// Reads `\n`-terminated lines of at most `max_size` bytes each.
///
/// The limit applies per line, excluding the terminator; an over-long line
/// is reported without consuming more than `max_size + 1` bytes of it.
struct SizeLimitedReader<R> {
    inner: R,
    max_size: usize,
}

impl<R> SizeLimitedReader<R> {
    fn new(inner: R, max_size: usize) -> Self {
        Self { inner, max_size }
    }
}

impl<R: BufRead> SizeLimitedReader<R> {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        let mut buf = Vec::new();
        let limit = self.max_size as u64 + 1;
        let n = (&mut self.inner).take(limit).read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        } else if n > self.max_size {
            return Err(TransportError::SizeLimit {
                max_bytes: self.max_size,
            });
        }
        String::from_utf8(buf)
            .map(Some)
            .map_err(|_| TransportError::Parse("Request is not valid UTF-8".to_string()))
    }
}

pub struct TcpConnection {
    reader: SizeLimitedReader<BufReader<TcpStream>>,
    writer: TcpStream,
}

impl TcpConnection {
    pub fn new(stream: TcpStream, max_request_bytes: usize) -> Result<Self, TransportError> {
        // Accepted sockets inherit non-blocking mode on some platforms.
        stream.set_nonblocking(false)?;
        let _ = stream.set_nodelay(true);
        let reader_stream = stream.try_clone()?;
        Ok(Self {
            reader: SizeLimitedReader::new(BufReader::new(reader_stream), max_request_bytes),
            writer: stream,
        })
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.writer.peer_addr().ok()
    }
}

impl TransportConnection for TcpConnection {
    fn read_request(&mut self) -> Result<Envelope, TransportError> {
        loop {
            match self.reader.read_line()? {
                None => return Err(TransportError::ConnectionClosed),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    return Envelope::decode(&line)
                        .map_err(|e| TransportError::Parse(e.to_string()));
                }
            }
        }
    }

    fn write_response(&mut self, response: &CommandResult) -> Result<(), TransportError> {
        let json = response
            .to_line()
            .map_err(|e| TransportError::Serialize(e.to_string()))?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError> {
        self.writer.set_read_timeout(timeout)?;
        Ok(())
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError> {
        self.writer.set_write_timeout(timeout)?;
        Ok(())
    }
}

pub struct TcpTransportListener {
    inner: TcpListener,
    max_request_bytes: usize,
}

impl TcpTransportListener {
    pub fn bind(addr: SocketAddr, max_request_bytes: usize) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            inner: listener,
            max_request_bytes,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.inner.local_addr()?)
    }
}

impl TransportListener for TcpTransportListener {
    type Connection = TcpConnection;

    fn accept(&self) -> Result<Self::Connection, TransportError> {
        let (stream, _addr) = self.inner.accept()?;
        TcpConnection::new(stream, self.max_request_bytes)
    }

    fn set_nonblocking(&self, nonblocking: bool) -> Result<(), TransportError> {
        self.inner.set_nonblocking(nonblocking)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::Ipv4Addr;
    use uia_bridge_protocol::Status;

    fn reader(data: &str, max: usize) -> SizeLimitedReader<BufReader<Cursor<Vec<u8>>>> {
        SizeLimitedReader::new(BufReader::new(Cursor::new(data.as_bytes().to_vec())), max)
    }

    #[test]
    fn test_size_limited_reader_within_limit() {
        let mut reader = reader("hello\nworld\n", 100);
        assert_eq!(reader.read_line().unwrap(), Some("hello".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("world".to_string()));
        assert_eq!(reader.read_line().unwrap(), None);
    }

    #[test]
    fn test_limit_is_per_line() {
        let mut reader = reader("12345\n67890\nabcde", 5);
        assert_eq!(reader.read_line().unwrap(), Some("12345".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("67890".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("abcde".to_string()));
    }

    #[test]
    fn test_size_limited_reader_exceeds_limit() {
        let mut reader = reader("this is a long line that exceeds the limit\n", 10);
        let result = reader.read_line();
        assert!(matches!(
            result,
            Err(TransportError::SizeLimit { max_bytes: 10 })
        ));
    }

    #[test]
    fn test_size_limited_reader_strips_newlines() {
        let mut reader = reader("line with crlf\r\n", 100);
        assert_eq!(
            reader.read_line().unwrap(),
            Some("line with crlf".to_string())
        );
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let mut reader = SizeLimitedReader::new(BufReader::new(Cursor::new(vec![0xff, b'\n'])), 10);
        assert!(matches!(reader.read_line(), Err(TransportError::Parse(_))));
    }

    #[test]
    fn test_transport_error_from_io() {
        let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(matches!(
            TransportError::from(timeout),
            TransportError::Timeout
        ));

        let would_block = std::io::Error::new(std::io::ErrorKind::WouldBlock, "would block");
        assert!(matches!(
            TransportError::from(would_block),
            TransportError::Timeout
        ));

        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(
            TransportError::from(reset),
            TransportError::ConnectionClosed
        ));

        let other = std::io::Error::other("other");
        assert!(matches!(TransportError::from(other), TransportError::Io(_)));
    }

    #[test]
    fn test_tcp_round_trip() {
        let listener =
            TcpTransportListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), 1024).unwrap();
        let addr = listener.local_addr().unwrap();

        let client = std::thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream
                .write_all(b"\r\n{\"cmd\":\"pressBack\"}\r\n")
                .unwrap();
            let mut line = String::new();
            BufReader::new(stream).read_line(&mut line).unwrap();
            line
        });

        let mut conn = listener.accept().unwrap();
        assert!(conn.peer_addr().is_some());
        match conn.read_request().unwrap() {
            Envelope::Command(cmd) => assert_eq!(cmd.name, "pressBack"),
            Envelope::Shutdown => panic!("unexpected shutdown"),
        }
        conn.write_response(&CommandResult::error(Status::UnknownCommand, "nope"))
            .unwrap();

        let line = client.join().unwrap();
        assert_eq!(line, "{\"status\":9,\"value\":\"nope\"}\n");
    }
}
