use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use crate::error::SetModeError;

/// Per-call write timeout required by the serial driver.
const SERIAL_WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Write-only byte channel to a TNC.
pub trait Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    /// Release the underlying resource. Calling it again is a no-op.
    fn close(&mut self) -> io::Result<()>;
    fn describe(&self) -> String;
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport closed")
}

pub struct TcpTransport {
    addr: String,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn connect(host: &str, port: u16) -> Result<Self, SetModeError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect((host, port)).map_err(|source| SetModeError::Connection {
            target: addr.clone(),
            source,
        })?;
        info!("connected to {} via TCP", addr);
        Ok(Self {
            addr,
            stream: Some(stream),
        })
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.as_mut().ok_or_else(not_connected)?.write(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.stream.take() {
            Some(stream) => {
                debug!("closing TCP connection to {}", self.addr);
                match stream.shutdown(Shutdown::Both) {
                    // peer already hung up; the socket is released on drop either way
                    Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
                    other => other,
                }
            }
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

pub struct SerialTransport {
    dev: String,
    baud: u32,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open `dev` as 8N1 without flow control.
    pub fn open(dev: &str, baud: u32) -> Result<Self, SetModeError> {
        let port = serialport::new(dev, baud)
            .timeout(SERIAL_WRITE_TIMEOUT)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| SetModeError::Connection {
                target: dev.to_string(),
                source: e.into(),
            })?;
        info!("opened serial port {} at {} baud", dev, baud);
        Ok(Self {
            dev: dev.to_string(),
            baud,
            port: Some(port),
        })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.as_mut().ok_or_else(not_connected)?.write(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.port.take() {
            Some(mut port) => {
                debug!("closing serial port {}", self.dev);
                port.flush()
            }
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        format!("serial://{}@{}", self.dev, self.baud)
    }
}

/// Owns a transport for the length of one command and closes it exactly once,
/// either through [`Link::close`] or on drop.
pub struct Link {
    inner: Box<dyn Transport>,
    closed: bool,
}

impl Link {
    pub fn new(inner: Box<dyn Transport>) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    pub fn describe(&self) -> String {
        self.inner.describe()
    }

    pub fn close(mut self) -> io::Result<()> {
        self.closed = true;
        self.inner.close()
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.inner.close() {
            warn!("closing {}: {}", self.inner.describe(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Read;
    use std::net::TcpListener;
    use std::rc::Rc;

    struct Counting {
        closes: Rc<Cell<u32>>,
        fail_close: bool,
    }

    impl Transport for Counting {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        fn close(&mut self) -> io::Result<()> {
            self.closes.set(self.closes.get() + 1);
            if self.fail_close {
                Err(io::Error::other("close failed"))
            } else {
                Ok(())
            }
        }
        fn describe(&self) -> String {
            "counting".into()
        }
    }

    fn counting(fail_close: bool) -> (Link, Rc<Cell<u32>>) {
        let closes = Rc::new(Cell::new(0));
        let link = Link::new(Box::new(Counting {
            closes: closes.clone(),
            fail_close,
        }));
        (link, closes)
    }

    #[test]
    fn link_closes_on_drop() {
        let (link, closes) = counting(false);
        drop(link);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn explicit_close_is_not_repeated_on_drop() {
        let (link, closes) = counting(false);
        link.close().unwrap();
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn close_error_on_drop_is_swallowed() {
        let (link, closes) = counting(true);
        drop(link);
        assert_eq!(closes.get(), 1);
    }

    fn refused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
        // listener dropped here, nothing accepts on the port
    }

    #[test]
    fn tcp_connect_refused_is_connection_error() {
        let port = refused_port();
        match TcpTransport::connect("127.0.0.1", port) {
            Err(SetModeError::Connection { target, .. }) => {
                assert_eq!(target, format!("127.0.0.1:{}", port));
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("connect to a closed port succeeded"),
        }
    }

    #[test]
    fn tcp_write_then_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let reader = std::thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut got = Vec::new();
            sock.read_to_end(&mut got).unwrap();
            got
        });

        let mut tcp = TcpTransport::connect("127.0.0.1", port).unwrap();
        assert_eq!(tcp.describe(), format!("tcp://127.0.0.1:{}", port));
        assert_eq!(tcp.write(&[1, 2, 3]).unwrap(), 3);
        tcp.close().unwrap();
        tcp.close().unwrap();
        let err = tcp.write(&[4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        assert_eq!(reader.join().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_serial_device_is_connection_error() {
        let dev = "/dev/kiss-setmode-no-such-device";
        match SerialTransport::open(dev, 57_600) {
            Err(SetModeError::Connection { target, .. }) => assert_eq!(target, dev),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("opened a device that does not exist"),
        }
    }
}
