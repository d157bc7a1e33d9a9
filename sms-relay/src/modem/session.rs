use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, trace};

use super::data::RawResponse;
use crate::error::ConnectionError;

pub const BAUD_RATE: u32 = 115_200;
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub const CHECK_COMMAND: &str = "AT";
pub const TEXT_MODE_COMMAND: &str = "AT+CMGF=1";

/// A byte stream to a modem.
pub trait SerialLink: Read + Write + Send {
    /// Discards anything pending in the input and output buffers.
    fn clear_buffers(&mut self) -> io::Result<()>;
}

impl SerialLink for Box<dyn SerialPort> {
    fn clear_buffers(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::All).map_err(io::Error::from)
    }
}

/// Opens links to modems by interface path.
pub trait Connector {
    fn connect(&self, interface: &str) -> io::Result<Box<dyn SerialLink>>;
}

impl<C: Connector + ?Sized> Connector for &C {
    fn connect(&self, interface: &str) -> io::Result<Box<dyn SerialLink>> {
        (**self).connect(interface)
    }
}

/// Opens real serial devices.
#[derive(Debug, Clone)]
pub struct SerialPortConnector {
    baud_rate: u32,
    timeout: Duration,
}

impl Default for SerialPortConnector {
    fn default() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            timeout: READ_TIMEOUT,
        }
    }
}

impl Connector for SerialPortConnector {
    fn connect(&self, interface: &str) -> io::Result<Box<dyn SerialLink>> {
        let port = serialport::new(interface, self.baud_rate)
            .timeout(self.timeout)
            .open()?;
        Ok(Box::new(port))
    }
}

/// An open exchange with one modem. Dropping it closes the line.
pub struct Session {
    interface: String,
    link: Option<Box<dyn SerialLink>>,
}

impl Session {
    /// Opens `interface`, checks that a modem answers `AT` and switches it to
    /// text mode.
    pub fn open(connector: &dyn Connector, interface: &str) -> Result<Self, ConnectionError> {
        debug!("opening connection");
        let link = connector
            .connect(interface)
            .map_err(|source| ConnectionError::Open {
                interface: interface.to_owned(),
                source,
            })?;
        let mut session = Self {
            interface: interface.to_owned(),
            link: Some(link),
        };

        session.send_command(CHECK_COMMAND)?;
        let response = session.read_lines()?;
        if !response.contains_token("OK") {
            session.close();
            return Err(ConnectionError::NoModem {
                interface: interface.to_owned(),
                response: response.to_strings(),
            });
        }
        session.send_command(TEXT_MODE_COMMAND)?;
        session.flush_buffers()?;
        Ok(session)
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Writes `command` followed by `\r` and waits until it left the buffer.
    pub fn send_command(&mut self, command: &str) -> Result<(), ConnectionError> {
        trace!(command, "sending command");
        let mut frame = Vec::with_capacity(command.len() + 1);
        frame.extend_from_slice(command.as_bytes());
        frame.push(b'\r');
        let link = self.link()?;
        let result = link.write_all(&frame).and_then(|()| link.flush());
        result.map_err(|source| self.io_error(source))
    }

    /// Collects output until the line stays quiet for the read timeout.
    pub fn read_lines(&mut self) -> Result<RawResponse, ConnectionError> {
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        let link = self.link()?;
        let outcome = loop {
            match link.read(&mut buf) {
                Ok(0) => break Ok(()),
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    break Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        outcome.map_err(|source| self.io_error(source))?;

        let response = RawResponse::from_bytes(&received);
        trace!(lines = ?response.to_strings(), "received");
        Ok(response)
    }

    pub fn flush_buffers(&mut self) -> Result<(), ConnectionError> {
        trace!("flushing");
        let result = self.link()?.clear_buffers();
        result.map_err(|source| self.io_error(source))
    }

    /// Releases the line. Calling it on a closed session does nothing.
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            debug!("closing connection");
        }
    }

    fn link(&mut self) -> Result<&mut Box<dyn SerialLink>, ConnectionError> {
        let interface = &self.interface;
        self.link.as_mut().ok_or_else(|| ConnectionError::Io {
            interface: interface.clone(),
            source: io::Error::from(io::ErrorKind::NotConnected),
        })
    }

    fn io_error(&self, source: io::Error) -> ConnectionError {
        ConnectionError::Io {
            interface: self.interface.clone(),
            source,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
