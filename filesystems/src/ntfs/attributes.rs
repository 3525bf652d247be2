// NTFS Attribute parsers
// Type-code dispatch into typed attribute views, unknown codes stay opaque

use crate::ntfs::byte_reader::{utf16_units, ByteReader};
use crate::ntfs::data_runs::{decode_data_runs, lcn_for_vcn, DataRun, VcnMapping};
use crate::ntfs::header::{AttributeHeader, NonResidentFields};
use crate::ntfs::structures::*;
use crate::ntfs::timestamps::{FileTime, NtfsTimestamps};
use log::{debug, trace, warn};
use mftparse_core::{DecoderConfig, MftError, MftResult};
use serde::{Serialize, Serializer};
use static_assertions::assert_impl_all;
use uuid::Uuid;

/// Attribute type, one variant per known type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeType {
    StandardInformation,
    AttributeList,
    FileName,
    ObjectId,
    SecurityDescriptor,
    VolumeName,
    VolumeInformation,
    Data,
    IndexRoot,
    IndexAllocation,
    Bitmap,
    ReparsePoint,
    LoggedUtilityStream,
    Unknown(u32),
}

impl AttributeType {
    pub fn from_code(type_code: u32) -> Self {
        match type_code {
            ATTR_TYPE_STANDARD_INFORMATION => Self::StandardInformation,
            ATTR_TYPE_ATTRIBUTE_LIST => Self::AttributeList,
            ATTR_TYPE_FILE_NAME => Self::FileName,
            ATTR_TYPE_OBJECT_ID => Self::ObjectId,
            ATTR_TYPE_SECURITY_DESCRIPTOR => Self::SecurityDescriptor,
            ATTR_TYPE_VOLUME_NAME => Self::VolumeName,
            ATTR_TYPE_VOLUME_INFORMATION => Self::VolumeInformation,
            ATTR_TYPE_DATA => Self::Data,
            ATTR_TYPE_INDEX_ROOT => Self::IndexRoot,
            ATTR_TYPE_INDEX_ALLOCATION => Self::IndexAllocation,
            ATTR_TYPE_BITMAP => Self::Bitmap,
            ATTR_TYPE_REPARSE_POINT => Self::ReparsePoint,
            ATTR_TYPE_LOGGED_UTILITY_STREAM => Self::LoggedUtilityStream,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::StandardInformation => ATTR_TYPE_STANDARD_INFORMATION,
            Self::AttributeList => ATTR_TYPE_ATTRIBUTE_LIST,
            Self::FileName => ATTR_TYPE_FILE_NAME,
            Self::ObjectId => ATTR_TYPE_OBJECT_ID,
            Self::SecurityDescriptor => ATTR_TYPE_SECURITY_DESCRIPTOR,
            Self::VolumeName => ATTR_TYPE_VOLUME_NAME,
            Self::VolumeInformation => ATTR_TYPE_VOLUME_INFORMATION,
            Self::Data => ATTR_TYPE_DATA,
            Self::IndexRoot => ATTR_TYPE_INDEX_ROOT,
            Self::IndexAllocation => ATTR_TYPE_INDEX_ALLOCATION,
            Self::Bitmap => ATTR_TYPE_BITMAP,
            Self::ReparsePoint => ATTR_TYPE_REPARSE_POINT,
            Self::LoggedUtilityStream => ATTR_TYPE_LOGGED_UTILITY_STREAM,
            Self::Unknown(code) => *code,
        }
    }

    /// Diagnostic label, e.g. `$FILE_NAME`
    pub fn label(&self) -> &'static str {
        match self {
            Self::StandardInformation => "$STANDARD_INFORMATION",
            Self::AttributeList => "$ATTRIBUTE_LIST",
            Self::FileName => "$FILE_NAME",
            Self::ObjectId => "$OBJECT_ID",
            Self::SecurityDescriptor => "$SECURITY_DESCRIPTOR",
            Self::VolumeName => "$VOLUME_NAME",
            Self::VolumeInformation => "$VOLUME_INFORMATION",
            Self::Data => "$DATA",
            Self::IndexRoot => "$INDEX_ROOT",
            Self::IndexAllocation => "$INDEX_ALLOCATION",
            Self::Bitmap => "$BITMAP",
            Self::ReparsePoint => "$REPARSE_POINT",
            Self::LoggedUtilityStream => "$LOGGED_UTILITY_STREAM",
            Self::Unknown(_) => "$UNKNOWN",
        }
    }
}

/// Standard Information attribute (0x10)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardInformation {
    pub timestamps: NtfsTimestamps,
    /// DOS file permissions
    pub permissions: u32,
    pub max_versions: u32,
    pub version: u32,
    pub class_id: u32,
    /// Only present on records written by NTFS 3.0+
    pub extended: Option<StandardInformationExtended>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StandardInformationExtended {
    pub owner_id: u32,
    pub security_id: u32,
    pub quota_charged: u64,
    pub usn: u64,
}

impl StandardInformation {
    /// Records longer than this carry the NTFS 3.0 fields
    const EXTENDED_THRESHOLD: u32 = 0x48;

    fn parse(reader: &ByteReader<'_>, base: usize, header: &AttributeHeader) -> MftResult<Self> {
        let extended = if header.total_length > Self::EXTENDED_THRESHOLD {
            Some(StandardInformationExtended {
                owner_id: reader.read_u32(base + 0x30)?,
                security_id: reader.read_u32(base + 0x34)?,
                quota_charged: reader.read_u64(base + 0x38)?,
                usn: reader.read_u64(base + 0x40)?,
            })
        } else {
            None
        };

        Ok(Self {
            timestamps: read_timestamps(reader, base)?,
            permissions: reader.read_u32(base + 0x20)?,
            max_versions: reader.read_u32(base + 0x24)?,
            version: reader.read_u32(base + 0x28)?,
            class_id: reader.read_u32(base + 0x2C)?,
            extended,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileNameNamespace {
    Posix,
    Win32,
    Dos,
    Win32AndDos,
    Other(u8),
}

impl From<u8> for FileNameNamespace {
    fn from(value: u8) -> Self {
        match value {
            FILE_NAME_POSIX => Self::Posix,
            FILE_NAME_WIN32 => Self::Win32,
            FILE_NAME_DOS => Self::Dos,
            FILE_NAME_WIN32_AND_DOS => Self::Win32AndDos,
            other => Self::Other(other),
        }
    }
}

/// File Name attribute (0x30)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileName {
    pub parent_reference: u64,
    pub timestamps: NtfsTimestamps,
    pub allocated_size: u64,
    pub real_size: u64,
    pub flags: u32,
    pub reparse_tag: u32,
    /// Name length in UTF-16 code units
    pub name_length: u8,
    pub namespace: FileNameNamespace,
    pub name: String,
}

impl FileName {
    const NAME_OFFSET: usize = 0x42;

    fn parse(reader: &ByteReader<'_>, base: usize, config: &DecoderConfig) -> MftResult<Self> {
        let name_length = reader.read_u8(base + 0x40)?;
        let name_start = base + Self::NAME_OFFSET;

        let name = match reader.read_utf16(name_start, 2 * name_length as usize) {
            Err(MftError::MalformedName { offset }) if config.substitute_malformed_names => {
                warn!("Malformed $FILE_NAME name at offset {:#x}, using empty name", offset);
                String::new()
            }
            result => result?,
        };

        Ok(Self {
            parent_reference: reader.read_u64(base)?,
            timestamps: read_timestamps(reader, base + 0x08)?,
            allocated_size: reader.read_u64(base + 0x28)?,
            real_size: reader.read_u64(base + 0x30)?,
            flags: reader.read_u32(base + 0x38)?,
            reparse_tag: reader.read_u32(base + 0x3C)?,
            name_length,
            namespace: FileNameNamespace::from(reader.read_u8(base + 0x41)?),
            name,
        })
    }

    /// MFT record number of the parent directory (low 48 bits)
    pub fn parent_record_number(&self) -> u64 {
        self.parent_reference & 0x0000_FFFF_FFFF_FFFF
    }

    pub fn parent_sequence_number(&self) -> u16 {
        (self.parent_reference >> 48) as u16
    }
}

/// Object ID attribute (0x40)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectId {
    pub object_id: Uuid,
    pub birth_volume_id: Option<Uuid>,
    pub birth_object_id: Option<Uuid>,
    pub domain_id: Option<Uuid>,
}

impl ObjectId {
    const FULL_LENGTH: u32 = 0x40;

    fn parse(reader: &ByteReader<'_>, base: usize, header: &AttributeHeader) -> MftResult<Self> {
        let value_length = header.resident().map_or(0, |fields| fields.value_length);
        let object_id = reader.read_uuid(base)?;

        if value_length < Self::FULL_LENGTH {
            return Ok(Self {
                object_id,
                birth_volume_id: None,
                birth_object_id: None,
                domain_id: None,
            });
        }

        Ok(Self {
            object_id,
            birth_volume_id: Some(reader.read_uuid(base + 0x10)?),
            birth_object_id: Some(reader.read_uuid(base + 0x20)?),
            domain_id: Some(reader.read_uuid(base + 0x30)?),
        })
    }
}

/// Volume Name attribute (0x60)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeName {
    pub label: String,
}

impl VolumeName {
    fn parse(
        reader: &ByteReader<'_>,
        base: usize,
        header: &AttributeHeader,
        config: &DecoderConfig,
    ) -> MftResult<Self> {
        let length = (header.total_length as usize).saturating_sub(base);
        let bytes = reader.slice(base, length)?;

        let decoded = utf16_units(bytes, base).and_then(|mut units| {
            while units.last() == Some(&0) {
                units.pop();
            }
            String::from_utf16(&units).map_err(|_| MftError::MalformedName { offset: base })
        });

        let label = match decoded {
            Err(MftError::MalformedName { offset }) if config.substitute_malformed_names => {
                warn!("Malformed volume label at offset {:#x}, using empty label", offset);
                String::new()
            }
            result => result?,
        };

        Ok(Self { label })
    }
}

/// Volume Information attribute (0x70)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeInformation {
    pub major_version: u8,
    pub minor_version: u8,
    pub flags: u16,
}

impl VolumeInformation {
    fn parse(reader: &ByteReader<'_>, base: usize) -> MftResult<Self> {
        Ok(Self {
            major_version: reader.read_u8(base + 0x08)?,
            minor_version: reader.read_u8(base + 0x09)?,
            flags: reader.read_u16(base + 0x0A)?,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.flags & VOLUME_IS_DIRTY != 0
    }

    pub fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag == flag
    }
}

/// Parsed attribute body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeBody {
    StandardInformation(StandardInformation),
    FileName(FileName),
    ObjectId(ObjectId),
    VolumeName(VolumeName),
    VolumeInformation(VolumeInformation),
    /// No type-specific decoding; resident records keep a copy of their value
    Opaque {
        #[serde(serialize_with = "serialize_hex")]
        value: Option<Vec<u8>>,
    },
}

fn serialize_hex<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// A decoded attribute record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub attr_type: AttributeType,
    pub header: AttributeHeader,
    pub data_runs: Vec<DataRun>,
    pub body: AttributeBody,
}

assert_impl_all!(Attribute: Send, Sync);

impl Attribute {
    pub fn type_code(&self) -> u32 {
        self.attr_type.code()
    }

    pub fn type_label(&self) -> &'static str {
        self.attr_type.label()
    }

    pub fn header(&self) -> &AttributeHeader {
        &self.header
    }

    pub fn name(&self) -> Option<&str> {
        self.header.name.as_deref()
    }

    /// Runs in storage order with absolute LCNs; empty for resident attributes
    pub fn data_runs(&self) -> &[DataRun] {
        &self.data_runs
    }

    pub fn body(&self) -> &AttributeBody {
        &self.body
    }

    /// Map a VCN of this attribute's stream to a cluster on the volume
    pub fn lcn_for_vcn(&self, vcn: u64) -> Option<VcnMapping> {
        let starting_vcn = self.header.non_resident()?.starting_vcn;
        lcn_for_vcn(&self.data_runs, vcn.checked_sub(starting_vcn)?)
    }

    pub fn standard_information(&self) -> Option<&StandardInformation> {
        match &self.body {
            AttributeBody::StandardInformation(si) => Some(si),
            _ => None,
        }
    }

    pub fn file_name(&self) -> Option<&FileName> {
        match &self.body {
            AttributeBody::FileName(name) => Some(name),
            _ => None,
        }
    }

    pub fn object_id(&self) -> Option<&ObjectId> {
        match &self.body {
            AttributeBody::ObjectId(id) => Some(id),
            _ => None,
        }
    }

    pub fn volume_name(&self) -> Option<&VolumeName> {
        match &self.body {
            AttributeBody::VolumeName(name) => Some(name),
            _ => None,
        }
    }

    pub fn volume_information(&self) -> Option<&VolumeInformation> {
        match &self.body {
            AttributeBody::VolumeInformation(info) => Some(info),
            _ => None,
        }
    }

    /// Raw resident value of an opaque attribute
    pub fn resident_value(&self) -> Option<&[u8]> {
        match &self.body {
            AttributeBody::Opaque { value } => value.as_deref(),
            _ => None,
        }
    }
}

/// Decode one attribute record with the default (permissive) configuration
pub fn decode_attribute(type_code: u32, data: &[u8]) -> MftResult<Attribute> {
    decode_attribute_with(type_code, data, &DecoderConfig::default())
}

/// Decode one attribute record; `data` starts at the record and may run past it
pub fn decode_attribute_with(
    type_code: u32,
    data: &[u8],
    config: &DecoderConfig,
) -> MftResult<Attribute> {
    let header = decode_header(data, config)?;

    if header.type_code != type_code {
        debug!(
            "Dispatching as 0x{:X} although the header says 0x{:X}",
            type_code, header.type_code
        );
    }

    let attr_type = AttributeType::from_code(type_code);

    let data_runs = match header.non_resident() {
        Some(fields) => decode_attribute_runs(data, &header, fields, config)?,
        None => Vec::new(),
    };

    let body = decode_body(attr_type, data, &header, config)?;

    trace!(
        "Decoded {} (0x{:X}), {} data runs",
        attr_type.label(),
        type_code,
        data_runs.len()
    );

    Ok(Attribute {
        attr_type,
        header,
        data_runs,
        body,
    })
}

fn decode_header(data: &[u8], config: &DecoderConfig) -> MftResult<AttributeHeader> {
    match AttributeHeader::parse(data) {
        Err(MftError::MalformedName { offset }) if config.substitute_malformed_names => {
            warn!("Malformed attribute name at offset {:#x}, using empty name", offset);
            let mut header = AttributeHeader::parse_unnamed(data)?;
            header.name = Some(String::new());
            Ok(header)
        }
        result => result,
    }
}

fn decode_attribute_runs(
    data: &[u8],
    header: &AttributeHeader,
    fields: &NonResidentFields,
    config: &DecoderConfig,
) -> MftResult<Vec<DataRun>> {
    let start = fields.data_run_offset as usize;

    // Only the record's own bytes hold runs, unless its length is unusable
    let record_end = header.total_length as usize;
    let end = if record_end >= start && record_end <= data.len() {
        record_end
    } else {
        data.len()
    };

    if start > end {
        return Err(MftError::TruncatedDataRun {
            offset: start,
            needed: 1,
            available: 0,
        });
    }

    decode_data_runs(&data[start..end], config).map_err(|err| match err {
        MftError::TruncatedDataRun {
            offset,
            needed,
            available,
        } => MftError::TruncatedDataRun {
            offset: start + offset,
            needed,
            available,
        },
        other => other,
    })
}

fn decode_body(
    attr_type: AttributeType,
    data: &[u8],
    header: &AttributeHeader,
    config: &DecoderConfig,
) -> MftResult<AttributeBody> {
    if header.is_non_resident() {
        if !matches!(attr_type, AttributeType::Unknown(_)) {
            debug!("{} is non-resident, body left undecoded", attr_type.label());
        }
        return Ok(AttributeBody::Opaque { value: None });
    }

    let reader = ByteReader::new(data);
    let base = header.size();

    let body = match attr_type {
        AttributeType::StandardInformation => {
            AttributeBody::StandardInformation(StandardInformation::parse(&reader, base, header)?)
        }
        AttributeType::FileName => AttributeBody::FileName(FileName::parse(&reader, base, config)?),
        AttributeType::ObjectId => AttributeBody::ObjectId(ObjectId::parse(&reader, base, header)?),
        AttributeType::VolumeName => {
            AttributeBody::VolumeName(VolumeName::parse(&reader, base, header, config)?)
        }
        AttributeType::VolumeInformation => {
            AttributeBody::VolumeInformation(VolumeInformation::parse(&reader, base)?)
        }
        _ => {
            let value = match header.value_range() {
                Some(range) => Some(reader.slice(range.start, range.len())?.to_vec()),
                None => None,
            };
            AttributeBody::Opaque { value }
        }
    };

    Ok(body)
}

fn read_timestamps(reader: &ByteReader<'_>, offset: usize) -> MftResult<NtfsTimestamps> {
    Ok(NtfsTimestamps {
        ctime: FileTime(reader.read_u64(offset)?),
        atime: FileTime(reader.read_u64(offset + 0x08)?),
        mtime: FileTime(reader.read_u64(offset + 0x10)?),
        rtime: FileTime(reader.read_u64(offset + 0x18)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{non_resident_attribute, resident_attribute, utf16le};

    fn standard_information_value(len: usize) -> Vec<u8> {
        let mut value = vec![0u8; len];
        for (i, ts) in [0x1000u64, 0x2000, 0x3000, 0x4000].iter().enumerate() {
            value[i * 8..i * 8 + 8].copy_from_slice(&ts.to_le_bytes());
        }
        value[0x20..0x24].copy_from_slice(&0x20u32.to_le_bytes()); // Archive
        value[0x24..0x28].copy_from_slice(&7u32.to_le_bytes());
        value[0x28..0x2C].copy_from_slice(&2u32.to_le_bytes());
        value[0x2C..0x30].copy_from_slice(&9u32.to_le_bytes());
        if len >= 0x48 {
            value[0x30..0x34].copy_from_slice(&11u32.to_le_bytes());
            value[0x34..0x38].copy_from_slice(&0x100u32.to_le_bytes());
            value[0x38..0x40].copy_from_slice(&4096u64.to_le_bytes());
            value[0x40..0x48].copy_from_slice(&0xABCDu64.to_le_bytes());
        }
        value
    }

    fn file_name_value(name: &str, namespace: u8) -> Vec<u8> {
        let name_bytes = utf16le(name);
        let mut value = vec![0u8; 0x42 + name_bytes.len()];
        value[0..8].copy_from_slice(&(5u64 | (5u64 << 48)).to_le_bytes()); // Root, seq 5
        value[0x08..0x10].copy_from_slice(&116_444_736_000_000_000u64.to_le_bytes());
        value[0x28..0x30].copy_from_slice(&4096u64.to_le_bytes());
        value[0x30..0x38].copy_from_slice(&1234u64.to_le_bytes());
        value[0x38..0x3C].copy_from_slice(&0x20u32.to_le_bytes());
        value[0x3C..0x40].copy_from_slice(&0u32.to_le_bytes());
        value[0x40] = (name_bytes.len() / 2) as u8;
        value[0x41] = namespace;
        value[0x42..].copy_from_slice(&name_bytes);
        value
    }

    #[test]
    fn test_type_table() {
        let codes = [
            (0x10, "$STANDARD_INFORMATION"),
            (0x20, "$ATTRIBUTE_LIST"),
            (0x30, "$FILE_NAME"),
            (0x40, "$OBJECT_ID"),
            (0x50, "$SECURITY_DESCRIPTOR"),
            (0x60, "$VOLUME_NAME"),
            (0x70, "$VOLUME_INFORMATION"),
            (0x80, "$DATA"),
            (0x90, "$INDEX_ROOT"),
            (0xA0, "$INDEX_ALLOCATION"),
            (0xB0, "$BITMAP"),
            (0xC0, "$REPARSE_POINT"),
            (0x100, "$LOGGED_UTILITY_STREAM"),
            (0x999, "$UNKNOWN"),
        ];

        for (code, label) in codes {
            let attr_type = AttributeType::from_code(code);
            assert_eq!(attr_type.code(), code);
            assert_eq!(attr_type.label(), label);
        }
    }

    #[test]
    fn test_standard_information_basic() {
        let data = resident_attribute(ATTR_TYPE_STANDARD_INFORMATION, None, &standard_information_value(0x30));
        let attr = decode_attribute(ATTR_TYPE_STANDARD_INFORMATION, &data).unwrap();

        assert_eq!(attr.type_label(), "$STANDARD_INFORMATION");
        assert!(attr.data_runs().is_empty());

        let si = attr.standard_information().unwrap();
        assert_eq!(si.timestamps.ctime, FileTime(0x1000));
        assert_eq!(si.timestamps.atime, FileTime(0x2000));
        assert_eq!(si.timestamps.mtime, FileTime(0x3000));
        assert_eq!(si.timestamps.rtime, FileTime(0x4000));
        assert_eq!(si.permissions, 0x20);
        assert_eq!(si.max_versions, 7);
        assert_eq!(si.version, 2);
        assert_eq!(si.class_id, 9);
        assert_eq!(si.extended, None);
    }

    #[test]
    fn test_standard_information_extended() {
        let data = resident_attribute(ATTR_TYPE_STANDARD_INFORMATION, None, &standard_information_value(0x48));
        let attr = decode_attribute(ATTR_TYPE_STANDARD_INFORMATION, &data).unwrap();

        let extended = attr.standard_information().unwrap().extended.unwrap();
        assert_eq!(extended.owner_id, 11);
        assert_eq!(extended.security_id, 0x100);
        assert_eq!(extended.quota_charged, 4096);
        assert_eq!(extended.usn, 0xABCD);
    }

    #[test]
    fn test_standard_information_short_buffer() {
        let data = resident_attribute(ATTR_TYPE_STANDARD_INFORMATION, None, &standard_information_value(0x30));
        let result = decode_attribute(ATTR_TYPE_STANDARD_INFORMATION, &data[..0x30]);
        assert!(matches!(result, Err(MftError::OutOfBounds { .. })));
    }

    #[test]
    fn test_file_name() {
        let data = resident_attribute(ATTR_TYPE_FILE_NAME, None, &file_name_value("test.txt", FILE_NAME_WIN32));
        let attr = decode_attribute(ATTR_TYPE_FILE_NAME, &data).unwrap();

        let fname = attr.file_name().unwrap();
        assert_eq!(fname.name, "test.txt");
        assert_eq!(fname.name_length, 8);
        assert_eq!(fname.namespace, FileNameNamespace::Win32);
        assert_eq!(fname.parent_record_number(), 5);
        assert_eq!(fname.parent_sequence_number(), 5);
        assert_eq!(fname.allocated_size, 4096);
        assert_eq!(fname.real_size, 1234);
        assert_eq!(fname.flags, 0x20);
        assert_eq!(fname.timestamps.ctime.to_datetime().unwrap().timestamp(), 0);
    }

    #[test]
    fn test_file_name_ignores_total_length() {
        let mut value = file_name_value("abcdefgh", FILE_NAME_POSIX);
        value.extend_from_slice(&utf16le("trailing"));
        let mut data = resident_attribute(ATTR_TYPE_FILE_NAME, None, &value);

        // Claimed record length has no bearing on the name slice
        data[4..8].copy_from_slice(&0x20u32.to_le_bytes());

        let attr = decode_attribute(ATTR_TYPE_FILE_NAME, &data).unwrap();
        let fname = attr.file_name().unwrap();
        assert_eq!(fname.name, "abcdefgh");
        assert_eq!(fname.name.encode_utf16().count() * 2, 16);
    }

    #[test]
    fn test_file_name_malformed() {
        let mut value = file_name_value("ab", FILE_NAME_DOS);
        value[0x42..0x44].copy_from_slice(&[0x00, 0xD8]);
        let data = resident_attribute(ATTR_TYPE_FILE_NAME, None, &value);

        let attr = decode_attribute(ATTR_TYPE_FILE_NAME, &data).unwrap();
        assert_eq!(attr.file_name().unwrap().name, "");

        let strict = decode_attribute_with(ATTR_TYPE_FILE_NAME, &data, &DecoderConfig::strict());
        assert!(matches!(strict, Err(MftError::MalformedName { .. })));
    }

    #[test]
    fn test_malformed_attribute_name_policy() {
        let mut data = resident_attribute(ATTR_TYPE_DATA, Some("ab"), b"hello");
        data[0x18..0x1A].copy_from_slice(&[0x00, 0xDC]);

        let attr = decode_attribute(ATTR_TYPE_DATA, &data).unwrap();
        assert_eq!(attr.name(), Some(""));
        assert_eq!(attr.resident_value(), Some(&b"hello"[..]));

        let strict = decode_attribute_with(ATTR_TYPE_DATA, &data, &DecoderConfig::strict());
        assert!(matches!(strict, Err(MftError::MalformedName { offset: 0x18 })));
    }

    #[test]
    fn test_object_id() {
        let mut value = vec![0u8; 0x40];
        for (i, byte) in value.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let data = resident_attribute(ATTR_TYPE_OBJECT_ID, None, &value);
        let attr = decode_attribute(ATTR_TYPE_OBJECT_ID, &data).unwrap();

        let oid = attr.object_id().unwrap();
        assert_eq!(oid.object_id.to_string(), "03020100-0504-0706-0809-0a0b0c0d0e0f");
        assert!(oid.birth_volume_id.is_some());
        assert!(oid.domain_id.is_some());

        let data = resident_attribute(ATTR_TYPE_OBJECT_ID, None, &value[..0x10]);
        let oid = *decode_attribute(ATTR_TYPE_OBJECT_ID, &data).unwrap().object_id().unwrap();
        assert_eq!(oid.birth_object_id, None);
    }

    #[test]
    fn test_volume_name() {
        let data = resident_attribute(ATTR_TYPE_VOLUME_NAME, None, &utf16le("DATA"));
        // 0x18 + 8 bytes is already aligned, pad with NULs to check trimming
        let mut padded = data.clone();
        padded.extend_from_slice(&[0u8; 8]);
        padded[4..8].copy_from_slice(&0x28u32.to_le_bytes());

        let attr = decode_attribute(ATTR_TYPE_VOLUME_NAME, &padded).unwrap();
        assert_eq!(attr.volume_name().unwrap().label, "DATA");

        let attr = decode_attribute(ATTR_TYPE_VOLUME_NAME, &data).unwrap();
        assert_eq!(attr.volume_name().unwrap().label, "DATA");
    }

    #[test]
    fn test_volume_name_odd_length() {
        // "DATA" plus a stray byte: nine bytes of label value
        let mut data = resident_attribute(ATTR_TYPE_VOLUME_NAME, None, &utf16le("DATA"));
        data.extend_from_slice(&[0u8; 8]);
        data[4..8].copy_from_slice(&0x21u32.to_le_bytes());

        let attr = decode_attribute(ATTR_TYPE_VOLUME_NAME, &data).unwrap();
        assert_eq!(attr.volume_name().unwrap().label, "");

        let strict = decode_attribute_with(ATTR_TYPE_VOLUME_NAME, &data, &DecoderConfig::strict());
        assert!(matches!(strict, Err(MftError::MalformedName { offset: 0x18 })));
    }

    #[test]
    fn test_volume_name_empty() {
        let data = resident_attribute(ATTR_TYPE_VOLUME_NAME, None, &[]);
        let attr = decode_attribute(ATTR_TYPE_VOLUME_NAME, &data).unwrap();
        assert_eq!(attr.volume_name().unwrap().label, "");
    }

    #[test]
    fn test_volume_information() {
        let mut value = vec![0u8; 12];
        value[8] = 3;
        value[9] = 1;
        value[10..12].copy_from_slice(&(VOLUME_IS_DIRTY | VOLUME_MODIFIED_BY_CHKDSK).to_le_bytes());
        let data = resident_attribute(ATTR_TYPE_VOLUME_INFORMATION, None, &value);

        let attr = decode_attribute(ATTR_TYPE_VOLUME_INFORMATION, &data).unwrap();
        let info = attr.volume_information().unwrap();
        assert_eq!((info.major_version, info.minor_version), (3, 1));
        assert!(info.is_dirty());
        assert!(info.has_flag(VOLUME_MODIFIED_BY_CHKDSK));
        assert!(!info.has_flag(VOLUME_MOUNTED_ON_NT4));
    }

    #[test]
    fn test_unknown_type_is_opaque() {
        let data = resident_attribute(0x999, None, &[0xDE, 0xAD, 0xBE, 0xEF]);
        let attr = decode_attribute(0x999, &data).unwrap();

        assert_eq!(attr.attr_type, AttributeType::Unknown(0x999));
        assert_eq!(attr.type_label(), "$UNKNOWN");
        assert_eq!(attr.type_code(), 0x999);
        assert_eq!(attr.resident_value(), Some(&[0xDE, 0xAD, 0xBE, 0xEF][..]));
    }

    #[test]
    fn test_non_resident_data() {
        let runs = [0x11, 0x04, 0x64, 0x01, 0x08, 0x11, 0x04, 0x32, 0x00];
        let data = non_resident_attribute(ATTR_TYPE_DATA, None, &runs);
        let attr = decode_attribute(ATTR_TYPE_DATA, &data).unwrap();

        assert_eq!(attr.type_label(), "$DATA");
        assert_eq!(
            attr.data_runs(),
            &[
                DataRun::allocated(4, 100),
                DataRun::sparse(8),
                DataRun::allocated(4, 150),
            ]
        );
        assert_eq!(attr.resident_value(), None);
        assert_eq!(attr.lcn_for_vcn(1), Some(VcnMapping::Allocated(101)));
        assert_eq!(attr.lcn_for_vcn(5), Some(VcnMapping::Sparse));
    }

    #[test]
    fn test_lcn_for_vcn_honours_starting_vcn() {
        let mut data = non_resident_attribute(ATTR_TYPE_DATA, None, &[0x11, 0x04, 0x64, 0x00]);
        data[0x10..0x18].copy_from_slice(&10u64.to_le_bytes());
        let attr = decode_attribute(ATTR_TYPE_DATA, &data).unwrap();

        assert_eq!(attr.lcn_for_vcn(9), None);
        assert_eq!(attr.lcn_for_vcn(10), Some(VcnMapping::Allocated(100)));
        assert_eq!(attr.lcn_for_vcn(13), Some(VcnMapping::Allocated(103)));
    }

    #[test]
    fn test_runs_bounded_by_record_length() {
        // Runs fill the record exactly, the next record's bytes must not be read as runs
        let runs = [0x11, 0x04, 0x64, 0x11, 0x02, 0x01, 0x01, 0x03];
        let mut data = non_resident_attribute(ATTR_TYPE_DATA, None, &runs);
        assert_eq!(data.len(), 0x48);
        data.extend_from_slice(&[0x11, 0x01, 0x01, 0x00]);

        let attr = decode_attribute(ATTR_TYPE_DATA, &data).unwrap();
        assert_eq!(
            attr.data_runs(),
            &[
                DataRun::allocated(4, 100),
                DataRun::allocated(2, 101),
                DataRun::sparse(3),
            ]
        );
    }

    #[test]
    fn test_truncated_runs_report_record_offset() {
        let data = non_resident_attribute(ATTR_TYPE_DATA, None, &[0x31, 0x04, 0x64]);
        match decode_attribute(ATTR_TYPE_DATA, &data[..0x43]) {
            Err(MftError::TruncatedDataRun { offset, .. }) => assert_eq!(offset, 0x40),
            other => panic!("expected TruncatedDataRun, got {:?}", other),
        }
    }

    #[test]
    fn test_data_run_offset_past_buffer() {
        let mut data = non_resident_attribute(ATTR_TYPE_DATA, None, &[0x00]);
        data[0x20..0x22].copy_from_slice(&0x200u16.to_le_bytes());
        assert!(matches!(
            decode_attribute(ATTR_TYPE_DATA, &data),
            Err(MftError::TruncatedDataRun { offset: 0x200, .. })
        ));
    }

    #[test]
    fn test_non_resident_typed_attribute_stays_opaque() {
        let data = non_resident_attribute(ATTR_TYPE_VOLUME_NAME, None, &[0x11, 0x01, 0x05, 0x00]);
        let attr = decode_attribute(ATTR_TYPE_VOLUME_NAME, &data).unwrap();

        assert_eq!(attr.volume_name(), None);
        assert_eq!(attr.body(), &AttributeBody::Opaque { value: None });
        assert_eq!(attr.data_runs().len(), 1);
    }

    #[test]
    fn test_dispatch_uses_requested_type() {
        let data = resident_attribute(ATTR_TYPE_VOLUME_INFORMATION, None, &[0u8; 12]);
        let attr = decode_attribute(ATTR_TYPE_DATA, &data).unwrap();

        assert_eq!(attr.attr_type, AttributeType::Data);
        assert_eq!(attr.header().type_code, ATTR_TYPE_VOLUME_INFORMATION);
        assert_eq!(attr.resident_value().map(|v| v.len()), Some(12));
    }

    #[test]
    fn test_bad_resident_value_range() {
        let mut data = resident_attribute(ATTR_TYPE_SECURITY_DESCRIPTOR, None, &[1, 2, 3, 4]);
        data[16..20].copy_from_slice(&0x1000u32.to_le_bytes());
        assert!(matches!(
            decode_attribute(ATTR_TYPE_SECURITY_DESCRIPTOR, &data),
            Err(MftError::OutOfBounds { .. })
        ));
    }
}
