use serde::{Deserialize, Serialize};

/// What a resolved controller event addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CcKind {
    /// Plain 7-bit controller.
    RawCc,
    /// Non-registered parameter number.
    Nrpn,
    /// Registered parameter number.
    Rpn,
}

/// A fully resolved controller event emitted by [`CcParser`](super::CcParser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcEvent {
    pub kind: CcKind,
    /// CC number for raw events, 14-bit address for NRPN/RPN.
    pub number: u16,
    /// Absolute value, or a signed delta when `increment` is set.
    pub value: i32,
    /// 0-15.
    pub channel: u8,
    pub increment: bool,
}

impl CcEvent {
    pub fn raw(channel: u8, number: u8, value: u8) -> Self {
        Self {
            kind: CcKind::RawCc,
            number: u16::from(number),
            value: i32::from(value),
            channel,
            increment: false,
        }
    }

    /// Largest absolute value this event kind can carry.
    #[inline]
    pub fn full_scale(&self) -> i32 {
        match self.kind {
            CcKind::RawCc => i32::from(super::MAX_7BIT),
            CcKind::Nrpn | CcKind::Rpn => i32::from(super::MAX_14BIT),
        }
    }
}
