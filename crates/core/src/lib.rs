//! LiFi Core - bit stream primitives
//!
//! This crate provides the `Bitstream` type shared by the framing, FEC and
//! modulation stages of the LiFi link sender, plus the fixed-width binary
//! conversion used for every payload byte.

pub mod bits;
pub mod error;

pub use bits::{even_parity, to_binary, Bitstream};
pub use error::{CoreError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        bits::{even_parity, to_binary, Bitstream},
        error::{CoreError, Result},
    };
}
