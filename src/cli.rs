use clap::Parser;

use crate::error::SetModeError;
use crate::setmode::{Config, ModeRequest, Target};

const MODE_HELP: &str = "\
Modern Modes:
  Mode    DIP    Baud   bps   Mod    Proto    Usage     BW
  1       0001   19200  19200 4FSK   IL2Pc    FM        25k
  3       0011   9600   9600  4FSK   IL2Pc    FM        12.5k
  2       0010   9600   9600  GFSK   IL2Pc    FM        25k
  5       0101   3600   3600  QPSK   IL2Pc    FM        12.5k
  11      1011   1200   2400  QPSK   IL2Pc    SSB/FM    2.4kHz
  10      1010   1200   1200  BPSK   IL2Pc    SSB/FM    2.4kHz
  9       1001   300    600   QPSK   IL2Pc    SSB       500Hz
  8       1000   300    300   BPSK   IL2Pc    SSB       500Hz
  14      1110   300    300   AFSK   IL2Pc    SSB       500Hz

Legacy Modes:
  Mode    DIP    Baud   bps   Mod    Proto    Superseded by        Usage  BW
  0       0000   9600   9600  GFSK   AX.25    9600 GFSK IL2P       FM     25k
  4       0100   4800   4800  GFSK   IL2Pc    9600 4FSK IL2Pc      FM     12.5k
  7       0111   1200   1200  AFSK   IL2P     4800 GFSK IL2Pc      FM     12.5k
  6       0110   1200   1200  AFSK   AX.25    1200 AFSK IL2P       FM     12.5k
  12      1100   300    300   AFSK   AX.25    300 AFSK IL2P        SSB    500Hz
  13      1101   300    300   AFSK   IL2P     300 AFSK IL2Pc       SSB    500Hz

Before running this utility ensure the mode DIP switches are all set to ON (1111)
and the firmware is at least v41.

Example, set mode to 3 without permanently storing to memory:

  kiss-setmode --mode 3

More info at https://wiki.oarc.uk/packet:ninotnc";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "kiss-setmode",
    about = "Set the operating mode of a KISS TNC over serial or TCP",
    after_long_help = MODE_HELP
)]
pub struct Cli {
    /// Connection type: tcp or serial
    #[arg(long, default_value = "serial", env = "SETMODE_CONNECTION")]
    pub connection: String,
    /// TCP host (if connection is tcp)
    #[arg(long, default_value = "127.0.0.1", env = "SETMODE_HOST")]
    pub host: String,
    /// TCP port (if connection is tcp)
    #[arg(long, default_value_t = 5001, env = "SETMODE_PORT")]
    pub port: u16,
    /// Serial device (if connection is serial)
    #[arg(long = "serial-port", default_value = "/dev/ttyACM0", env = "SETMODE_SERIAL_PORT")]
    pub serial_port: String,
    /// Mode value to set (required)
    #[arg(long, allow_negative_numbers = true)]
    pub mode: Option<i64>,
    /// Permanently store the mode (does not add 16 to the provided mode)
    #[arg(long, default_value_t = false)]
    pub write: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<Config, SetModeError> {
        let mode = self
            .mode
            .ok_or_else(|| SetModeError::config("--mode is required and must be non-zero"))?;
        let request = ModeRequest::new(mode, self.write)?;

        let target = if self.connection.eq_ignore_ascii_case("tcp") {
            Target::Tcp {
                host: self.host,
                port: self.port,
            }
        } else if self.connection.eq_ignore_ascii_case("serial") {
            if self.serial_port.is_empty() {
                return Err(SetModeError::config(
                    "--serial-port is required for serial connection",
                ));
            }
            Target::Serial {
                dev: self.serial_port,
            }
        } else {
            return Err(SetModeError::config(format!(
                "unknown connection type: {}",
                self.connection
            )));
        };

        Ok(Config { request, target })
    }
}
