// Test helpers for building synthetic attribute records

/// Encode text as UTF-16LE bytes
pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

fn align8(len: usize) -> usize {
    (len + 7) & !7
}

/// Build a resident attribute record, value placed directly after the (named) header
pub fn resident_attribute(type_code: u32, name: Option<&str>, value: &[u8]) -> Vec<u8> {
    let name_bytes = name.map(utf16le).unwrap_or_default();
    let header_size = 0x18 + name_bytes.len();
    let total_length = align8(header_size + value.len());

    let mut data = vec![0u8; total_length];
    data[0..4].copy_from_slice(&type_code.to_le_bytes());
    data[4..8].copy_from_slice(&(total_length as u32).to_le_bytes());
    data[8] = 0; // Resident
    data[9] = (name_bytes.len() / 2) as u8;
    data[10..12].copy_from_slice(&0x18u16.to_le_bytes()); // Name offset
    data[14..16].copy_from_slice(&3u16.to_le_bytes()); // Attribute ID
    data[16..20].copy_from_slice(&(value.len() as u32).to_le_bytes());
    data[20..22].copy_from_slice(&(header_size as u16).to_le_bytes());
    data[0x18..header_size].copy_from_slice(&name_bytes);
    data[header_size..header_size + value.len()].copy_from_slice(value);
    data
}

/// Build a non-resident attribute record whose run list follows the (named) header
pub fn non_resident_attribute(type_code: u32, name: Option<&str>, runs: &[u8]) -> Vec<u8> {
    let name_bytes = name.map(utf16le).unwrap_or_default();
    let header_size = 0x40 + name_bytes.len();
    let total_length = align8(header_size + runs.len());

    let mut data = vec![0u8; total_length];
    data[0..4].copy_from_slice(&type_code.to_le_bytes());
    data[4..8].copy_from_slice(&(total_length as u32).to_le_bytes());
    data[8] = 1; // Non-resident
    data[9] = (name_bytes.len() / 2) as u8;
    data[10..12].copy_from_slice(&0x40u16.to_le_bytes()); // Name offset
    data[14..16].copy_from_slice(&4u16.to_le_bytes()); // Attribute ID
    data[0x10..0x18].copy_from_slice(&0u64.to_le_bytes()); // Starting VCN
    data[0x18..0x20].copy_from_slice(&15u64.to_le_bytes()); // Last VCN
    data[0x20..0x22].copy_from_slice(&(header_size as u16).to_le_bytes());
    data[0x28..0x30].copy_from_slice(&0x10000u64.to_le_bytes()); // Allocated size
    data[0x30..0x38].copy_from_slice(&0xFC00u64.to_le_bytes()); // Real size
    data[0x38..0x40].copy_from_slice(&0xFC00u64.to_le_bytes()); // Initialized size
    data[0x40..header_size].copy_from_slice(&name_bytes);
    data[header_size..header_size + runs.len()].copy_from_slice(runs);
    data
}
