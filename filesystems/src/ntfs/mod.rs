// NTFS attribute decoding
// Read-only, operates on in-memory buffers only

pub mod structures;
pub mod byte_reader;
pub mod header;
pub mod data_runs;
pub mod attributes;
pub mod stream;
pub mod sparse;
pub mod timestamps;

// Re-export main types
pub use attributes::{decode_attribute, decode_attribute_with, Attribute, AttributeBody, AttributeType};
pub use data_runs::{decode_data_runs, encode_data_runs, DataRun, VcnMapping};
pub use header::{AttributeForm, AttributeHeader};
pub use sparse::{analyze_sparse_runs, SparseInfo, SparseRange};
pub use stream::{decode_attribute_stream, AttributeStream, StreamItem};
pub use structures::*;
pub use timestamps::{FileTime, NtfsTimestamps};
