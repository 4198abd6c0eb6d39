//! MIDI CC (Control Change) input: NRPN/RPN parsing and parameter bindings.

pub mod binding;
pub mod event;
pub mod manager;
pub mod parser;

pub use binding::{BindingId, CcBinding, CcValue, MidiChannel};
pub use event::{CcEvent, CcKind};
pub use manager::{CcBindingManager, CcProcessResult};
pub use parser::{CcParser, ParserState};

/// Number of MIDI channels tracked by the parser.
pub const CHANNELS: usize = 16;

/// Highest 7-bit data value.
pub const MAX_7BIT: u8 = 127;

/// Highest 14-bit parameter number or data value.
pub const MAX_14BIT: u16 = 0x3FFF;

/// Controller numbers with a role in the NRPN/RPN protocol.
pub mod numbers {
    /// Data Entry MSB (CC6).
    pub const DATA_ENTRY_MSB: u8 = 6;
    /// Data Entry LSB (CC38).
    pub const DATA_ENTRY_LSB: u8 = 38;
    /// Data Increment (CC96).
    pub const DATA_INCREMENT: u8 = 96;
    /// Data Decrement (CC97).
    pub const DATA_DECREMENT: u8 = 97;
    /// NRPN LSB (CC98).
    pub const NRPN_LSB: u8 = 98;
    /// NRPN MSB (CC99).
    pub const NRPN_MSB: u8 = 99;
    /// RPN LSB (CC100).
    pub const RPN_LSB: u8 = 100;
    /// RPN MSB (CC101).
    pub const RPN_MSB: u8 = 101;
    /// Value that, sent on CC100 or CC101, deselects the RPN.
    pub const RPN_NULL: u8 = 127;
}
