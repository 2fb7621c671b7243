/*
 * Responsibility
 * - public task id <-> internal id (encode/decode)
 * - the sqids details stay inside this module
 * - extractors and handlers go through this service, so a change of scheme stays local
 */
use sqids::{Error as SqidsError, Sqids};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdCodecError>;

#[derive(Debug, Error)]
pub enum IdCodecError {
    #[error("SQIDS_MIN_LENGTH must be between 0 and 255, got {value}")]
    InvalidMinLength { value: usize },
    #[error("sqids error: {0}")]
    Sqids(#[from] SqidsError),
    #[error("id must be non-negative, got {value}")]
    NegativeId { value: i64 },
    #[error("invalid public id format")]
    DecodeInvalidFormat,
    #[error("decoded id is out of range")]
    DecodeOutOfRange,
}

#[derive(Clone, Debug)]
pub struct IdCodec {
    sqids: Sqids,
}

impl IdCodec {
    pub fn new(min_length: usize, alphabet: &str) -> Result<Self> {
        let min_length: u8 = min_length
            .try_into()
            .map_err(|_| IdCodecError::InvalidMinLength { value: min_length })?;

        let sqids = Sqids::builder()
            .min_length(min_length)
            .alphabet(alphabet.chars().collect())
            .build()?;

        Ok(Self { sqids })
    }

    pub fn encode(&self, id: i64) -> Result<String> {
        if id < 0 {
            return Err(IdCodecError::NegativeId { value: id });
        }
        Ok(self.sqids.encode(&[id as u64])?)
    }

    pub fn decode(&self, public_id: &str) -> Result<i64> {
        let nums = self.sqids.decode(public_id);
        if nums.len() != 1 {
            return Err(IdCodecError::DecodeInvalidFormat);
        }
        // reject non-canonical spellings of the same number
        if self.sqids.encode(&nums).ok().as_deref() != Some(public_id) {
            return Err(IdCodecError::DecodeInvalidFormat);
        }
        i64::try_from(nums[0]).map_err(|_| IdCodecError::DecodeOutOfRange)
    }
}

#[cfg(test)]
pub(crate) fn test_codec() -> IdCodec {
    IdCodec::new(
        10,
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_respects_min_length_and_decodes_back() {
        let codec = test_codec();
        let public = codec.encode(42).unwrap();

        assert!(public.len() >= 10);
        assert_eq!(codec.decode(&public).unwrap(), 42);
    }

    #[test]
    fn negative_ids_are_not_encodable() {
        assert!(matches!(
            test_codec().encode(-1),
            Err(IdCodecError::NegativeId { value: -1 })
        ));
    }

    #[test]
    fn junk_public_ids_are_rejected() {
        let codec = test_codec();
        assert!(matches!(
            codec.decode(""),
            Err(IdCodecError::DecodeInvalidFormat)
        ));
        assert!(codec.decode("!!!").is_err());
    }

    #[test]
    fn min_length_above_u8_is_a_config_error() {
        assert!(matches!(
            IdCodec::new(300, "abcdefghijklmnopqrstuvwxyz"),
            Err(IdCodecError::InvalidMinLength { value: 300 })
        ));
    }
}
