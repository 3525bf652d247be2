// NTFS MFT attribute decoding
pub mod ntfs;

#[cfg(test)]
pub mod test_helpers;

pub use ntfs::{
    decode_attribute, decode_attribute_with, decode_attribute_stream, Attribute, AttributeBody,
    AttributeHeader, AttributeStream, AttributeType, DataRun, StreamItem,
};
pub use mftparse_core::{DecoderConfig, MftError, MftResult};
