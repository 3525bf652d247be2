// NTFS attribute record layout
// Offsets and codes shared by the header, run list and body decoders

// Attribute type codes
pub const ATTR_TYPE_STANDARD_INFORMATION: u32 = 0x10;
pub const ATTR_TYPE_ATTRIBUTE_LIST: u32 = 0x20;
pub const ATTR_TYPE_FILE_NAME: u32 = 0x30;
pub const ATTR_TYPE_OBJECT_ID: u32 = 0x40;
pub const ATTR_TYPE_SECURITY_DESCRIPTOR: u32 = 0x50;
pub const ATTR_TYPE_VOLUME_NAME: u32 = 0x60;
pub const ATTR_TYPE_VOLUME_INFORMATION: u32 = 0x70;
pub const ATTR_TYPE_DATA: u32 = 0x80;
pub const ATTR_TYPE_INDEX_ROOT: u32 = 0x90;
pub const ATTR_TYPE_INDEX_ALLOCATION: u32 = 0xA0;
pub const ATTR_TYPE_BITMAP: u32 = 0xB0;
pub const ATTR_TYPE_REPARSE_POINT: u32 = 0xC0;
pub const ATTR_TYPE_LOGGED_UTILITY_STREAM: u32 = 0x100;
pub const ATTR_TYPE_END: u32 = 0xFFFFFFFF;

// Common header (0x00 - 0x0F)
pub const ARH_TYPE_CODE_OFFSET: usize = 0x00;
pub const ARH_RECORD_LENGTH_OFFSET: usize = 0x04;
pub const ARH_NON_RESIDENT_OFFSET: usize = 0x08;
pub const ARH_NAME_LENGTH_OFFSET: usize = 0x09;
pub const ARH_NAME_OFFSET_OFFSET: usize = 0x0A;
pub const ARH_FLAGS_OFFSET: usize = 0x0C;
pub const ARH_ATTRIBUTE_ID_OFFSET: usize = 0x0E;

// Resident part
pub const ARH_RES_VALUE_LENGTH_OFFSET: usize = 0x10;
pub const ARH_RES_VALUE_OFFSET_OFFSET: usize = 0x14;

// Non-resident part
pub const ARH_NONRES_STARTING_VCN_OFFSET: usize = 0x10;
pub const ARH_NONRES_LAST_VCN_OFFSET: usize = 0x18;
pub const ARH_NONRES_DATA_RUN_OFFSET_OFFSET: usize = 0x20;
pub const ARH_NONRES_COMPRESSION_UNIT_OFFSET: usize = 0x22;
pub const ARH_NONRES_ALLOCATED_SIZE_OFFSET: usize = 0x28;
pub const ARH_NONRES_REAL_SIZE_OFFSET: usize = 0x30;
pub const ARH_NONRES_INITIALIZED_SIZE_OFFSET: usize = 0x38;

/// Header size of an unnamed resident attribute
pub const RESIDENT_HEADER_SIZE: usize = 0x18;
/// Header size of an unnamed non-resident attribute
pub const NON_RESIDENT_HEADER_SIZE: usize = 0x40;

// Attribute flags
pub const ATTR_FLAG_COMPRESSED: u16 = 0x0001;
pub const ATTR_FLAG_COMPRESSION_MASK: u16 = 0x00FF;
pub const ATTR_FLAG_ENCRYPTED: u16 = 0x4000;
pub const ATTR_FLAG_SPARSE: u16 = 0x8000;

// File name namespaces
pub const FILE_NAME_POSIX: u8 = 0x00;
pub const FILE_NAME_WIN32: u8 = 0x01;
pub const FILE_NAME_DOS: u8 = 0x02;
pub const FILE_NAME_WIN32_AND_DOS: u8 = 0x03;

// Volume flags ($VOLUME_INFORMATION)
pub const VOLUME_IS_DIRTY: u16 = 0x0001;
pub const VOLUME_RESIZE_LOG_FILE: u16 = 0x0002;
pub const VOLUME_UPGRADE_ON_MOUNT: u16 = 0x0004;
pub const VOLUME_MOUNTED_ON_NT4: u16 = 0x0008;
pub const VOLUME_DELETE_USN_UNDERWAY: u16 = 0x0010;
pub const VOLUME_REPAIR_OBJECT_ID: u16 = 0x0020;
pub const VOLUME_MODIFIED_BY_CHKDSK: u16 = 0x8000;

/// Header size for a record with the given form and name length (in UTF-16 units)
pub const fn attribute_header_size(non_resident: bool, name_length: u8) -> usize {
    let base = if non_resident {
        NON_RESIDENT_HEADER_SIZE
    } else {
        RESIDENT_HEADER_SIZE
    };
    base + 2 * name_length as usize
}
