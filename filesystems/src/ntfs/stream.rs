// NTFS attribute stream walker
// Walks the attribute area of an MFT entry record by record

use crate::ntfs::attributes::{decode_attribute_with, Attribute};
use crate::ntfs::byte_reader::ByteReader;
use crate::ntfs::structures::ATTR_TYPE_END;
use log::{debug, trace};
use mftparse_core::{DecoderConfig, MftError, MftResult};
use static_assertions::assert_impl_all;

/// Type code plus record length
const RECORD_PREFIX_SIZE: usize = 8;

/// One step of the walk: where the record started and how it decoded
#[derive(Debug)]
pub struct StreamItem {
    pub offset: usize,
    pub result: MftResult<Attribute>,
}

assert_impl_all!(StreamItem: Send, Sync);

/// Iterator over the attribute records of an attribute area.
///
/// A record that fails to decode is yielded as an error and the walk moves on to the
/// next one. Only a record length that cannot be trusted (zero, or running past the
/// area) ends the walk early.
pub struct AttributeStream<'a> {
    area: &'a [u8],
    offset: usize,
    config: &'a DecoderConfig,
    finished: bool,
}

impl<'a> AttributeStream<'a> {
    pub fn new(area: &'a [u8], config: &'a DecoderConfig) -> Self {
        Self {
            area,
            offset: 0,
            config,
            finished: false,
        }
    }

    /// Offset of the next record to be read
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Only the attributes that decoded cleanly
    pub fn attributes(self) -> impl Iterator<Item = Attribute> + 'a {
        self.filter_map(|item| item.result.ok())
    }

    fn finish_with(&mut self, error: MftError) -> Option<StreamItem> {
        debug!("Attribute walk stopped at {:#x}: {}", self.offset, error);
        self.finished = true;
        Some(StreamItem {
            offset: self.offset,
            result: Err(error),
        })
    }
}

impl<'a> Iterator for AttributeStream<'a> {
    type Item = StreamItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let offset = self.offset;
        let remaining = self.area.len().saturating_sub(offset);
        let reader = ByteReader::new(self.area);

        let type_code = match reader.read_u32(offset) {
            Ok(code) if code != ATTR_TYPE_END && remaining >= RECORD_PREFIX_SIZE => code,
            _ => {
                trace!("End of attribute area at {:#x}", offset);
                self.finished = true;
                return None;
            }
        };

        let total_length = match reader.read_u32(offset + 4) {
            Ok(length) => length,
            Err(err) => return self.finish_with(err),
        };

        if total_length == 0 {
            return self.finish_with(MftError::InvalidRecordLength {
                offset,
                length: total_length,
            });
        }

        let length = total_length as usize;
        if length > remaining {
            return self.finish_with(MftError::OutOfBounds {
                offset,
                width: length,
                len: self.area.len(),
            });
        }

        self.offset += length;

        if total_length > self.config.max_attribute_length {
            debug!(
                "Skipping attribute 0x{:X} at {:#x}: length {} exceeds {}",
                type_code, offset, total_length, self.config.max_attribute_length
            );
            return Some(StreamItem {
                offset,
                result: Err(MftError::InvalidRecordLength {
                    offset,
                    length: total_length,
                }),
            });
        }

        let record = &self.area[offset..offset + length];
        let result = decode_attribute_with(type_code, record, self.config);

        if let Err(err) = &result {
            debug!("Failed to decode attribute 0x{:X} at {:#x}: {}", type_code, offset, err);
        }

        Some(StreamItem { offset, result })
    }
}

/// Decode every attribute in the area
pub fn decode_attribute_stream(area: &[u8], config: &DecoderConfig) -> Vec<StreamItem> {
    AttributeStream::new(area, config).collect()
}

/// First cleanly decoded attribute of the given type
pub fn find_attribute(area: &[u8], type_code: u32, config: &DecoderConfig) -> Option<Attribute> {
    AttributeStream::new(area, config)
        .attributes()
        .find(|attr| attr.type_code() == type_code)
}
