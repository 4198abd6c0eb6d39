//! CC binding types.
//!
//! For the thread-safe binding table with MIDI learn, see [`CcBindingManager`](super::CcBindingManager).

use super::event::{CcEvent, CcKind};
use super::{MAX_14BIT, MAX_7BIT};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// MIDI channel (0-15, where 0 = channel 1)
pub type MidiChannel = u8;

/// Unique ID for a CC binding
pub type BindingId = u64;

/// Binds one controller address to one model key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcBinding {
    /// `None` = any channel.
    pub channel: Option<MidiChannel>,
    pub kind: CcKind,
    /// CC number or 14-bit NRPN/RPN address.
    pub number: u16,
    /// Model key the value is written to.
    pub key: String,
    /// Store NRPN/RPN values as received instead of scaling them.
    pub raw: bool,
    pub enabled: bool,
}

impl CcBinding {
    pub fn new(channel: Option<MidiChannel>, kind: CcKind, number: u16, key: impl Into<String>) -> Self {
        Self {
            channel,
            kind,
            number,
            key: key.into(),
            raw: false,
            enabled: true,
        }
    }

    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Reject channels above 15 and numbers outside the kind's range.
    pub fn validate(&self) -> Result<()> {
        if let Some(channel) = self.channel {
            if usize::from(channel) >= super::CHANNELS {
                return Err(Error::InvalidChannel(channel));
            }
        }
        let limit = match self.kind {
            CcKind::RawCc => u16::from(MAX_7BIT),
            CcKind::Nrpn | CcKind::Rpn => MAX_14BIT,
        };
        if self.number > limit {
            return Err(Error::InvalidController(self.number));
        }
        Ok(())
    }

    #[inline]
    pub fn matches(&self, event: &CcEvent) -> bool {
        if !self.enabled {
            return false;
        }
        let channel_matches = self.channel.is_none() || self.channel == Some(event.channel);
        channel_matches && self.kind == event.kind && self.number == event.number
    }

    /// How `event` should change the bound key.
    pub fn value_for(&self, event: &CcEvent) -> CcValue {
        if event.increment {
            CcValue::Delta(event.value)
        } else if self.raw && event.kind != CcKind::RawCc {
            CcValue::Raw(event.value)
        } else {
            CcValue::Scaled {
                value: event.value,
                full_scale: event.full_scale(),
            }
        }
    }
}

/// A value routed to a model key, not yet resolved against the key's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcValue {
    /// `value` out of `0..=full_scale`, spread over the key's `[min, max]`.
    Scaled { value: i32, full_scale: i32 },
    /// Stored as-is.
    Raw(i32),
    /// Added to the current value.
    Delta(i32),
}

impl CcValue {
    /// Final value for a key currently at `current` with `bounds`.
    ///
    /// Unbounded keys take scaled values unscaled. The result is not clamped;
    /// the caller stores it with `set_bounded`.
    pub fn resolve(self, current: i32, bounds: Option<(i32, i32)>) -> i32 {
        match self {
            CcValue::Scaled { value, full_scale } => match bounds {
                Some((min, max)) if full_scale > 0 => {
                    let t = f64::from(value.clamp(0, full_scale)) / f64::from(full_scale);
                    let span = f64::from(max) - f64::from(min);
                    (f64::from(min) + (t * span).round()) as i32
                }
                _ => value,
            },
            CcValue::Raw(value) => value,
            CcValue::Delta(delta) => current.saturating_add(delta),
        }
    }
}
