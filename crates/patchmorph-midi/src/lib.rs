//! MIDI controller input for patchmorph.
//!
//! Raw controller-change triples arrive on the MIDI callback thread and are
//! pushed into a lock-free [inbox](inbox). The editor thread drains them
//! through a [`CcParser`], which resolves NRPN/RPN address and data
//! fragments into [`CcEvent`]s, and a [`CcBindingManager`], which routes
//! events to model keys and supports MIDI learn.

pub mod error;
pub use error::{Error, Result};

pub mod cc;
pub use cc::{
    BindingId, CcBinding, CcBindingManager, CcEvent, CcKind, CcParser, CcProcessResult, CcValue,
    MidiChannel, ParserState,
};

pub mod inbox;
pub use inbox::{cc_inbox, cc_inbox_with_capacity, CcInboxConsumer, CcInboxProducer, CcMessage};
