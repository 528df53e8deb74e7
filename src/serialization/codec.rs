use super::datum::Datum;
use crate::error::Result;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Converts between a typed value and its `Datum` form.
///
/// Implementations must round-trip: `decode(&encode(x)?)? == x`.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Datum>;
    fn decode(&self, datum: &Datum) -> Result<T>;
}

/// Decode-on-read codec for any serde type.
pub struct BincodeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for BincodeCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Datum> {
        Ok(Datum(bincode::serialize(value)?))
    }

    fn decode(&self, datum: &Datum) -> Result<T> {
        Ok(bincode::deserialize(datum.as_bytes())?)
    }
}

/// Pass-through codec: the caller already holds `Datum`s.
#[derive(Default)]
pub struct RawCodec;

impl Codec<Datum> for RawCodec {
    fn encode(&self, value: &Datum) -> Result<Datum> {
        Ok(value.clone())
    }

    fn decode(&self, datum: &Datum) -> Result<Datum> {
        Ok(datum.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MultiMapError;

    #[test]
    fn test_bincode_codec_equal_values_equal_datums() {
        let codec = BincodeCodec::<String>::new();

        let a = codec.encode(&"alpha".to_string()).unwrap();
        let b = codec.encode(&"alpha".to_string()).unwrap();
        let c = codec.encode(&"beta".to_string()).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(codec.decode(&a).unwrap(), "alpha");
    }

    #[test]
    fn test_bincode_codec_rejects_garbage() {
        let codec = BincodeCodec::<String>::new();

        // Length prefix claims far more bytes than present
        let result = codec.decode(&Datum(vec![0xff; 4]));

        assert!(matches!(result, Err(MultiMapError::Serialization(_))));
    }

    #[test]
    fn test_raw_codec_passes_bytes_through() {
        let datum = Datum(vec![1, 2, 3]);

        assert_eq!(RawCodec.encode(&datum).unwrap(), datum);
        assert_eq!(RawCodec.decode(&datum).unwrap(), datum);
    }
}
