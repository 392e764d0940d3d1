//! Construction and serialization of compact automata.
//!
//! This crate builds prefix-sharing automata from sorted or unsorted input
//! sequences and serializes them into the binary versions read by the
//! `fsadict` crate. The mutable [`automaton::Automaton`] is generic over its
//! symbol and payload types; byte-labelled automata are bridged into the
//! read-only [`fsadict::Fsa`] contract by [`view::FsaView`], which is what
//! the serializers consume.
//!
//! # Architecture
//!
//! - [`automaton`] -- Mutable prefix-sharing automaton builder
//! - [`view`] -- Read-only [`fsadict::Fsa`] adapter over a builder
//! - [`serialize`] -- Serializer contract and shared node ordering
//! - [`fsa5_writer`] -- Version 5 serializer (byte-addressed layout)
//! - [`cfsa2_writer`] -- Version 0xC6 serializer (compressed layout)

pub mod automaton;
pub mod cfsa2_writer;
pub mod fsa5_writer;
pub mod serialize;
pub mod view;

/// Error type for automaton serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("automaton too large: a node address does not fit the goto field")]
    AddressOverflow,
    #[error("i/o error writing automaton")]
    Io(#[from] std::io::Error),
}
