//! Transaction construction, serialization, signing, and validation for
//! Bitcoin-Cash-family chains.
//!
//! The center of the crate is [`transaction::Transaction`], a mutable
//! builder that accepts unspent outputs and payment intents, solves for
//! change and fees, signs its inputs, and serializes to the canonical wire
//! encoding. Supporting modules supply the wire codec, monetary amounts,
//! scripts and script templates, CashToken data, and keys.

#![allow(clippy::unit_arg)]
#[macro_use]
extern crate serde;

pub mod amount;
pub mod cached;
pub mod compactint;
pub mod parameters;
pub mod serialization;
pub mod transaction;
pub mod transparent;

pub use serialization::{CashDeserialize, CashDeserializeInto, CashSerialize, SerializationError};
