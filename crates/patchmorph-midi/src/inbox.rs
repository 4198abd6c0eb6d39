//! Lock-free hand-off of controller messages from the MIDI callback thread.
//!
//! The model is single-threaded, so the MIDI input callback only pushes raw
//! triples here; the editor thread drains them and does the parsing.

use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CAPACITY: usize = 256;

/// One controller-change message as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcMessage {
    pub channel: u8,
    pub number: u8,
    pub value: u8,
}

impl CcMessage {
    pub fn new(channel: u8, number: u8, value: u8) -> Self {
        Self {
            channel,
            number,
            value,
        }
    }

    /// Decode a 3-byte channel-voice message; `None` unless it is a control change.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [status, number, value, ..] if status & 0xF0 == 0xB0 => Some(Self {
                channel: status & 0x0F,
                number: number & 0x7F,
                value: value & 0x7F,
            }),
            _ => None,
        }
    }
}

/// Producer side -- push messages from the MIDI callback thread.
pub struct CcInboxProducer {
    producer: HeapProd<CcMessage>,
    dropped: u64,
}

impl CcInboxProducer {
    /// Returns `false` if the ring buffer is full.
    #[inline]
    pub fn push(&mut self, message: CcMessage) -> bool {
        if self.producer.try_push(message).is_ok() {
            return true;
        }
        self.dropped += 1;
        warn!(
            "CC inbox full, dropped message ({} dropped so far)",
            self.dropped
        );
        false
    }

    /// Push a raw MIDI message. Anything but a control change is ignored and
    /// reported as not pushed.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> bool {
        CcMessage::from_bytes(bytes).is_some_and(|message| self.push(message))
    }

    /// Messages lost to a full buffer.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Consumer side -- drain messages on the editor thread.
pub struct CcInboxConsumer {
    consumer: HeapCons<CcMessage>,
}

impl CcInboxConsumer {
    #[inline]
    pub fn pop(&mut self) -> Option<CcMessage> {
        self.consumer.try_pop()
    }

    pub fn drain_all(&mut self) -> Vec<CcMessage> {
        let count = self.consumer.occupied_len();
        let mut messages = Vec::with_capacity(count);
        while let Some(message) = self.consumer.try_pop() {
            messages.push(message);
        }
        messages
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.consumer.is_empty()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.consumer.occupied_len()
    }
}

pub fn cc_inbox() -> (CcInboxProducer, CcInboxConsumer) {
    cc_inbox_with_capacity(DEFAULT_CAPACITY)
}

pub fn cc_inbox_with_capacity(capacity: usize) -> (CcInboxProducer, CcInboxConsumer) {
    let rb = HeapRb::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    (
        CcInboxProducer {
            producer,
            dropped: 0,
        },
        CcInboxConsumer { consumer },
    )
}
