//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that plays the role of the modem: tests
//! enqueue the lines the device would emit (`OK`, `CONNECT`, `RING`, caller
//! ID tags) and inspect everything the daemon wrote. Clones share state, so
//! a test can keep a handle while the port itself is owned by the modem.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Inner state of the mock port, protected by a mutex for interior mutability.
#[derive(Debug)]
struct MockPortState {
    /// Bytes the scripted device will emit, in order.
    read_queue: VecDeque<u8>,
    /// Log of all write calls made against the port.
    write_log: Vec<Vec<u8>>,
    /// Configured timeout duration, reported in simulated timeouts.
    timeout: Duration,
    /// Whether `clear_buffers` has been called.
    buffers_cleared: bool,
}

/// Mock serial port for driving the modem state machine in tests.
///
/// A read with an empty script behaves like a blocking port whose timeout
/// elapsed: it returns `PortError::Timeout`. `clear_buffers` is recorded but
/// does not consume the script; enqueued lines model *future* device
/// output, which a buffer flush cannot discard.
///
/// # Example
/// ```
/// use modem_answer_agent::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_line("RING");
///
/// let mut buffer = [0u8; 16];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"RING\r\n");
///
/// port.write_bytes(b"ATH\r").unwrap();
/// assert_eq!(port.write_log(), vec![b"ATH\r".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// Shared state so cloned handles observe the same script and log.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                read_queue: VecDeque::new(),
                write_log: Vec::new(),
                timeout: Duration::from_secs(3),
                buffers_cleared: false,
            })),
        }
    }

    /// Enqueue raw bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.read_queue.extend(data);
    }

    /// Enqueue a device line followed by CRLF, the framing a modem uses.
    pub fn enqueue_line(&mut self, line: &str) {
        self.enqueue_read(line.as_bytes());
        self.enqueue_read(b"\r\n");
    }

    /// Enqueue a full command exchange as the device would answer it with
    /// echo enabled: the echoed command, then the result line.
    pub fn enqueue_exchange(&mut self, echoed: &str, result: &str) {
        self.enqueue_read(echoed.as_bytes());
        self.enqueue_read(b"\r");
        self.enqueue_line("");
        self.enqueue_line(result);
    }

    /// Get a copy of all write calls made against the port.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.write_log.clone()
    }

    /// All written bytes, flattened, decoded lossily. Convenient for
    /// asserting on the command stream as a whole.
    pub fn written_string(&self) -> String {
        let state = self.state.lock().unwrap();
        let bytes: Vec<u8> = state.write_log.iter().flatten().copied().collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Whether `clear_buffers` has been called.
    pub fn was_cleared(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.buffers_cleared
    }

    /// Number of scripted bytes not yet consumed.
    pub fn remaining_script(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.read_queue.len()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();
        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued_byte) => {
                    *byte = queued_byte;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // Script exhausted: the device is silent, the blocking read
            // would have run out its timeout.
            Err(PortError::timeout(state.timeout))
        } else {
            Ok(bytes_read)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.timeout = timeout;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.buffers_cleared = true;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("remaining_script", &self.remaining_script())
            .finish()
    }
}
