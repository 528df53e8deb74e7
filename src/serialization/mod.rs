//! Serialization Boundary
//!
//! Converts typed keys and values into `Datum`, the opaque byte form that the
//! partition layer stores, hashes and compares.
//!
//! ## Value Access Strategies
//! - **`BincodeCodec`**: decode-on-read. Typed values are encoded with bincode on the way in
//!   and decoded back on the way out.
//! - **`RawCodec`**: pass-through. The caller works with `Datum` directly and nothing is decoded.
//!
//! A `MultiMapProxy` is parameterized by a codec per side rather than by a separate proxy type.

pub mod codec;
pub mod datum;

pub use codec::{BincodeCodec, Codec, RawCodec};
pub use datum::Datum;
