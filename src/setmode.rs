use std::fmt;
use std::io;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::SetModeError;
use crate::kiss::{CMD_SET_HARDWARE, build_frame};
use crate::transport::{Link, SerialTransport, TcpTransport, Transport};

/// Baud rate the TNC listens on for configuration commands.
pub const CONFIG_BAUD: u32 = 57_600;
/// Time the TNC needs to act on the command before the link is torn down.
pub const SETTLE_TIME: Duration = Duration::from_millis(500);
/// Mode offset that applies a mode until the next power cycle only.
const VOLATILE_OFFSET: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRequest {
    mode: u8,
    persist: bool,
}

impl ModeRequest {
    /// Zero is reserved for "not supplied" and is rejected.
    pub fn new(mode: i64, persist: bool) -> Result<Self, SetModeError> {
        if mode == 0 {
            return Err(SetModeError::config("mode is required and must be non-zero"));
        }
        let max = if persist {
            u8::MAX
        } else {
            u8::MAX - VOLATILE_OFFSET
        };
        match u8::try_from(mode) {
            Ok(m) if m <= max => Ok(Self { mode: m, persist }),
            _ => Err(SetModeError::config(format!(
                "mode {} out of range (1..={}{})",
                mode,
                max,
                if persist { "" } else { " without --write" }
            ))),
        }
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn persist(&self) -> bool {
        self.persist
    }

    /// Byte the TNC receives as the command payload.
    pub fn wire_byte(&self) -> u8 {
        if self.persist {
            self.mode
        } else {
            self.mode + VOLATILE_OFFSET
        }
    }

    pub fn frame(&self) -> Vec<u8> {
        build_frame(CMD_SET_HARDWARE, &[self.wire_byte()])
    }
}

impl fmt::Display for ModeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.persist {
            write!(f, "{} ({})", self.wire_byte(), self.mode)
        } else {
            write!(f, "{} ({} + {})", self.wire_byte(), self.mode, VOLATILE_OFFSET)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Tcp { host: String, port: u16 },
    Serial { dev: String },
}

impl Target {
    pub fn open(&self) -> Result<Box<dyn Transport>, SetModeError> {
        Ok(match self {
            Target::Tcp { host, port } => Box::new(TcpTransport::connect(host, *port)?),
            Target::Serial { dev } => Box::new(SerialTransport::open(dev, CONFIG_BAUD)?),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Tcp { host, port } => write!(f, "tcp {}:{}", host, port),
            Target::Serial { dev } => write!(f, "serial {}", dev),
        }
    }
}

/// Fully resolved options for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub request: ModeRequest,
    pub target: Target,
}

pub fn run(cfg: &Config) -> Result<(), SetModeError> {
    debug!(
        mode = cfg.request.mode(),
        persist = cfg.request.persist(),
        "building set-hardware frame"
    );
    let frame = cfg.request.frame();
    let link = Link::new(cfg.target.open()?);
    deliver(link, &cfg.request, &frame, SETTLE_TIME)
}

/// Write `frame` once and wait `settle` before closing the link. The link is
/// closed on every path, including a failed write.
pub fn deliver(
    mut link: Link,
    request: &ModeRequest,
    frame: &[u8],
    settle: Duration,
) -> Result<(), SetModeError> {
    debug!("writing {:02X?} to {}", frame, link.describe());
    let sent = match link.write(frame) {
        Ok(n) if n < frame.len() => Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("wrote {} of {} bytes", n, frame.len()),
        )),
        Ok(_) => Ok(()),
        Err(e) => Err(e),
    };
    if sent.is_ok() {
        info!("sent KISS packet to set mode to {}", request);
    }
    thread::sleep(settle);
    sent.map_err(|source| SetModeError::Transmission { source })?;

    let target = link.describe();
    if let Err(e) = link.close() {
        warn!("closing {}: {}", target, e);
    }
    Ok(())
}
