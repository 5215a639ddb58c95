//! Port abstraction layer for the modem's serial link.
//!
//! Provides the adapter trait plus a blocking hardware implementation and a
//! scripted mock, so the command/response state machine can be exercised
//! without a physical modem.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockSerialPort;
pub use sync_port::SyncSerialPort;
pub use traits::{
    DataBits, FlowControl, Parity, PortConfiguration, SerialPortAdapter, StopBits,
};
