//! Per-channel NRPN/RPN state machine.
//!
//! Raw controller triples go in; resolved [`CcEvent`]s come out. Controllers
//! outside the NRPN/RPN protocol pass straight through as raw events and
//! never disturb an address in progress.

use super::event::{CcEvent, CcKind};
use super::numbers::*;
use super::CHANNELS;
use tracing::{trace, warn};

/// Where a channel is in the NRPN/RPN address/data protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Idle,
    /// NRPN MSB seen, waiting for the LSB.
    NrpnStart,
    /// NRPN address complete, accepting data.
    NrpnReady,
    /// RPN MSB seen, waiting for the LSB.
    RpnStart,
    /// RPN address complete, accepting data.
    RpnReady,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    state: ParserState,
    param_msb: u8,
    param_lsb: u8,
    data_msb: Option<u8>,
    data_lsb: Option<u8>,
}

impl ChannelState {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn address_complete(&mut self, state: ParserState, lsb: u8) {
        self.state = state;
        self.param_lsb = lsb;
        self.data_msb = None;
        self.data_lsb = None;
    }

    fn ready_kind(&self) -> Option<CcKind> {
        match self.state {
            ParserState::NrpnReady => Some(CcKind::Nrpn),
            ParserState::RpnReady => Some(CcKind::Rpn),
            _ => None,
        }
    }

    fn address(&self) -> u16 {
        (u16::from(self.param_msb) << 7) | u16::from(self.param_lsb)
    }

    fn data_value(&self) -> i32 {
        let msb = i32::from(self.data_msb.unwrap_or(0));
        let lsb = i32::from(self.data_lsb.unwrap_or(0));
        (msb << 7) | lsb
    }
}

/// Controller-change parser holding one state machine per MIDI channel.
#[derive(Debug, Clone, Default)]
pub struct CcParser {
    channels: [ChannelState; CHANNELS],
}

impl CcParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, channel: u8) -> ParserState {
        self.channels
            .get(usize::from(channel))
            .map_or(ParserState::Idle, |c| c.state)
    }

    pub fn reset(&mut self) {
        self.channels.iter_mut().for_each(ChannelState::reset);
    }

    /// Feed one controller-change triple.
    ///
    /// Returns the event it completes, if any. A data-entry MSB emits
    /// immediately with the LSB taken as 0; a following LSB emits again with
    /// the combined value. Out-of-order protocol bytes reset the channel.
    pub fn parse(&mut self, channel: u8, number: u8, value: u8) -> Option<CcEvent> {
        let Some(ch) = self.channels.get_mut(usize::from(channel)) else {
            warn!("Ignoring controller on invalid channel {}", channel);
            return None;
        };
        let number = number & 0x7F;
        let value = value & 0x7F;

        match number {
            NRPN_MSB => {
                ch.state = ParserState::NrpnStart;
                ch.param_msb = value;
                None
            }
            NRPN_LSB => {
                if ch.state == ParserState::NrpnStart {
                    ch.address_complete(ParserState::NrpnReady, value);
                } else {
                    desync(ch, channel, number);
                }
                None
            }
            RPN_MSB => {
                if value == RPN_NULL {
                    ch.reset();
                } else {
                    ch.state = ParserState::RpnStart;
                    ch.param_msb = value;
                }
                None
            }
            RPN_LSB => {
                if value == RPN_NULL {
                    ch.reset();
                } else if ch.state == ParserState::RpnStart {
                    ch.address_complete(ParserState::RpnReady, value);
                } else {
                    desync(ch, channel, number);
                }
                None
            }
            DATA_ENTRY_MSB | DATA_ENTRY_LSB => {
                let Some(kind) = ch.ready_kind() else {
                    desync(ch, channel, number);
                    return None;
                };
                if number == DATA_ENTRY_MSB {
                    ch.data_msb = Some(value);
                } else {
                    ch.data_lsb = Some(value);
                }
                Some(CcEvent {
                    kind,
                    number: ch.address(),
                    value: ch.data_value(),
                    channel,
                    increment: false,
                })
            }
            DATA_INCREMENT | DATA_DECREMENT => {
                let Some(kind) = ch.ready_kind() else {
                    desync(ch, channel, number);
                    return None;
                };
                let step = if value == 0 { 1 } else { i32::from(value) };
                let delta = if number == DATA_INCREMENT { step } else { -step };
                Some(CcEvent {
                    kind,
                    number: ch.address(),
                    value: delta,
                    channel,
                    increment: true,
                })
            }
            _ => Some(CcEvent::raw(channel, number, value)),
        }
    }
}

fn desync(ch: &mut ChannelState, channel: u8, number: u8) {
    trace!(
        "CC {} out of sequence on channel {} (state {:?}), resetting",
        number,
        channel,
        ch.state
    );
    ch.reset();
}
