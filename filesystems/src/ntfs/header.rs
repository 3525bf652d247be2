// NTFS attribute record header
// Resident flag and name length decide the header size before anything else is read

use crate::ntfs::byte_reader::ByteReader;
use crate::ntfs::structures::*;
use log::trace;
use mftparse_core::{MftError, MftResult};
use serde::Serialize;
use std::ops::Range;

/// Fields only present in resident attribute headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResidentFields {
    pub value_length: u32,
    pub value_offset: u16,
}

/// Fields only present in non-resident attribute headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NonResidentFields {
    pub starting_vcn: u64,
    pub last_vcn: u64,
    pub data_run_offset: u16,
    pub compression_unit: u16,
    pub allocated_size: u64,
    pub real_size: u64,
    pub initialized_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum AttributeForm {
    Resident(ResidentFields),
    NonResident(NonResidentFields),
}

/// Decoded attribute header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeHeader {
    pub type_code: u32,
    pub total_length: u32,
    pub name_length: u8,
    pub name_offset: u16,
    pub flags: u16,
    pub attribute_id: u16,
    pub name: Option<String>,
    #[serde(flatten)]
    pub form: AttributeForm,
}

impl AttributeHeader {
    /// Parse a header, including its UTF-16 name
    pub fn parse(data: &[u8]) -> MftResult<Self> {
        let mut header = Self::parse_unnamed(data)?;

        if header.name_length > 0 {
            let reader = ByteReader::new(data);
            let name = reader.read_utf16(
                header.name_offset as usize,
                2 * header.name_length as usize,
            )?;
            header.name = Some(name);
        }

        Ok(header)
    }

    /// Parse every header field except the name, leaving `name` as None
    pub fn parse_unnamed(data: &[u8]) -> MftResult<Self> {
        if data.len() <= ARH_NAME_LENGTH_OFFSET {
            return Err(MftError::TruncatedHeader {
                needed: RESIDENT_HEADER_SIZE,
                available: data.len(),
            });
        }

        let reader = ByteReader::new(data);
        let non_resident = reader.read_u8(ARH_NON_RESIDENT_OFFSET)? != 0;
        let name_length = reader.read_u8(ARH_NAME_LENGTH_OFFSET)?;

        let size = attribute_header_size(non_resident, name_length);
        if data.len() < size {
            return Err(MftError::TruncatedHeader {
                needed: size,
                available: data.len(),
            });
        }

        let form = if non_resident {
            AttributeForm::NonResident(NonResidentFields {
                starting_vcn: reader.read_u64(ARH_NONRES_STARTING_VCN_OFFSET)?,
                last_vcn: reader.read_u64(ARH_NONRES_LAST_VCN_OFFSET)?,
                data_run_offset: reader.read_u16(ARH_NONRES_DATA_RUN_OFFSET_OFFSET)?,
                compression_unit: reader.read_u16(ARH_NONRES_COMPRESSION_UNIT_OFFSET)?,
                allocated_size: reader.read_u64(ARH_NONRES_ALLOCATED_SIZE_OFFSET)?,
                real_size: reader.read_u64(ARH_NONRES_REAL_SIZE_OFFSET)?,
                initialized_size: reader.read_u64(ARH_NONRES_INITIALIZED_SIZE_OFFSET)?,
            })
        } else {
            AttributeForm::Resident(ResidentFields {
                value_length: reader.read_u32(ARH_RES_VALUE_LENGTH_OFFSET)?,
                value_offset: reader.read_u16(ARH_RES_VALUE_OFFSET_OFFSET)?,
            })
        };

        let header = Self {
            type_code: reader.read_u32(ARH_TYPE_CODE_OFFSET)?,
            total_length: reader.read_u32(ARH_RECORD_LENGTH_OFFSET)?,
            name_length,
            name_offset: reader.read_u16(ARH_NAME_OFFSET_OFFSET)?,
            flags: reader.read_u16(ARH_FLAGS_OFFSET)?,
            attribute_id: reader.read_u16(ARH_ATTRIBUTE_ID_OFFSET)?,
            name: None,
            form,
        };

        trace!(
            "Attribute header: type=0x{:X}, length={}, non_resident={}, header_size={:#x}",
            header.type_code,
            header.total_length,
            non_resident,
            size
        );

        Ok(header)
    }

    /// Header size in bytes, derived from form and name length
    pub fn size(&self) -> usize {
        attribute_header_size(self.is_non_resident(), self.name_length)
    }

    pub fn is_non_resident(&self) -> bool {
        matches!(self.form, AttributeForm::NonResident(_))
    }

    pub fn resident(&self) -> Option<&ResidentFields> {
        match &self.form {
            AttributeForm::Resident(fields) => Some(fields),
            AttributeForm::NonResident(_) => None,
        }
    }

    pub fn non_resident(&self) -> Option<&NonResidentFields> {
        match &self.form {
            AttributeForm::NonResident(fields) => Some(fields),
            AttributeForm::Resident(_) => None,
        }
    }

    /// Byte range of a resident value within the record
    pub fn value_range(&self) -> Option<Range<usize>> {
        self.resident().map(|fields| {
            let start = fields.value_offset as usize;
            start..start + fields.value_length as usize
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & ATTR_FLAG_COMPRESSION_MASK != 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & ATTR_FLAG_ENCRYPTED != 0
    }

    pub fn is_sparse(&self) -> bool {
        self.flags & ATTR_FLAG_SPARSE != 0
    }
}
