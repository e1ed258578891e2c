//! # Scenesync Serde
//! Bit-level reading and writing used by the scenesync wire protocol.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod error;
mod serde;
mod var_u32;

pub use bit_reader::BitReader;
pub use bit_writer::{BitWrite, BitWriter};
pub use error::SerdeErr;
pub use serde::{ConstBitLength, Serde};
pub use var_u32::VarU32;
