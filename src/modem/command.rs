//! AT command definitions and acceptance policy.
//!
//! A command exchange is accepted by matching a keyword anywhere in the
//! response text, the way Hayes-compatible devices are actually scripted:
//! verbose result codes vary between firmwares, the keywords do not.

/// What the modem must say for an exchange to count as accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// The response must contain `OK`.
    Ok,
    /// The response must contain `OK` or `CONNECT`. Voice transmit/receive
    /// commands answer `CONNECT` when the stream channel opens.
    OkOrConnect,
}

/// A single AT exchange: the command string and its acceptance policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtCommand {
    /// The command text, without the trailing carriage return.
    pub command: &'static str,
    /// Keyword policy for the response.
    pub accept: Accept,
}

impl AtCommand {
    /// A command that succeeds on `OK`.
    pub const fn new(command: &'static str) -> Self {
        Self {
            command,
            accept: Accept::Ok,
        }
    }

    /// A voice-channel command that also succeeds on `CONNECT`.
    pub const fn voice(command: &'static str) -> Self {
        Self {
            command,
            accept: Accept::OkOrConnect,
        }
    }

    /// Check the gathered response lines against the acceptance policy.
    pub fn matches(&self, response: &str) -> bool {
        match self.accept {
            Accept::Ok => response.contains("OK"),
            Accept::OkOrConnect => response.contains("OK") || response.contains("CONNECT"),
        }
    }
}

/// Basic attention check.
pub const ATTENTION: AtCommand = AtCommand::new("AT");
/// Reset to stored profile 3.
pub const RESET_PROFILE: AtCommand = AtCommand::new("ATZ3");
/// Verbose (text) result codes.
pub const VERBOSE_RESULTS: AtCommand = AtCommand::new("ATV1");
/// Command echo on; exchanges read the echo plus the result line.
pub const ECHO_ON: AtCommand = AtCommand::new("ATE1");
/// Enable formatted caller ID reporting between rings.
pub const CALLER_ID_ON: AtCommand = AtCommand::new("AT+VCID=1");

/// Switch the modem into voice service class.
pub const VOICE_CLASS: AtCommand = AtCommand::new("AT+FCLASS=8");
/// 8-bit linear samples at 8000 Hz, the format the announcement is streamed in.
pub const VOICE_SAMPLING: AtCommand = AtCommand::new("AT+VSM=128,8000");
/// Select the telephone line as the analog source/sink.
pub const LINE_SELECT: AtCommand = AtCommand::new("AT+VLS=1");
/// Open the voice transmit channel; answers `CONNECT`.
pub const VOICE_TX: AtCommand = AtCommand::voice("AT+VTX");
/// Open the voice receive channel; answers `CONNECT`.
pub const VOICE_RX: AtCommand = AtCommand::voice("AT+VRX");
/// Go on-hook.
pub const HANG_UP: AtCommand = AtCommand::new("ATH");

/// The startup sequence that puts the modem into a known command state.
/// Each step must be accepted; a rejection aborts startup.
pub const INIT_SEQUENCE: [AtCommand; 5] = [
    ATTENTION,
    RESET_PROFILE,
    VERBOSE_RESULTS,
    ECHO_ON,
    CALLER_ID_ON,
];

/// The sequence that answers a call and opens the voice transmit channel.
pub const VOICE_SETUP: [AtCommand; 4] = [VOICE_CLASS, VOICE_SAMPLING, LINE_SELECT, VOICE_TX];

/// In-band terminator for a voice data stream: DLE (0x10) followed by
/// ETX (0x03). Written once after the last audio chunk.
pub const DLE_ETX: [u8; 2] = [0x10, 0x03];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_policy() {
        let cmd = ATTENTION;
        assert!(cmd.matches("AT\nOK"));
        assert!(cmd.matches("OK"));
        assert!(!cmd.matches("AT\nERROR"));
        assert!(!cmd.matches(""));
    }

    #[test]
    fn test_voice_commands_accept_connect() {
        assert!(VOICE_TX.matches("AT+VTX\nCONNECT"));
        assert!(VOICE_TX.matches("OK"));
        assert!(VOICE_RX.matches("CONNECT"));
        assert!(!VOICE_TX.matches("NO CARRIER"));
    }

    #[test]
    fn test_non_voice_commands_reject_connect() {
        assert!(!VOICE_CLASS.matches("CONNECT"));
    }

    #[test]
    fn test_init_sequence_order() {
        let commands: Vec<&str> = INIT_SEQUENCE.iter().map(|c| c.command).collect();
        assert_eq!(commands, vec!["AT", "ATZ3", "ATV1", "ATE1", "AT+VCID=1"]);
    }

    #[test]
    fn test_voice_setup_ends_with_transmit() {
        assert_eq!(VOICE_SETUP[3], VOICE_TX);
        assert_eq!(VOICE_SETUP[0].command, "AT+FCLASS=8");
    }

    #[test]
    fn test_dle_etx_bytes() {
        assert_eq!(DLE_ETX, [0x10, 0x03]);
    }
}
