// NTFS Data Run decoder
// Decode, normalize and re-encode runlists of non-resident attributes

use crate::ntfs::byte_reader::ByteReader;
use log::{trace, warn};
use mftparse_core::{DecoderConfig, MftError, MftResult};
use serde::Serialize;

/// Largest field width (in bytes) an i64 can hold
const MAX_FIELD_WIDTH: usize = 8;

/// Data run entry after normalization
///
/// `offset` is the absolute LCN of the first cluster, or 0 for a sparse run.
/// Whether a run is a hole comes from the stored form, so a run allocated at
/// LCN 0 stays allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataRun {
    pub length: i64,
    pub offset: i64,
    sparse: bool,
}

impl DataRun {
    /// Run backed by clusters starting at `lcn`
    pub fn allocated(length: i64, lcn: i64) -> Self {
        Self {
            length,
            offset: lcn,
            sparse: false,
        }
    }

    /// Run with no clusters behind it (reads as zeros)
    pub fn sparse(length: i64) -> Self {
        Self {
            length,
            offset: 0,
            sparse: true,
        }
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse
    }
}

/// Data run as stored on disk: `delta` is relative to the previous allocated run,
/// `None` for a sparse run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDataRun {
    pub length: i64,
    pub delta: Option<i64>,
}

/// Where a virtual cluster lives on the volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VcnMapping {
    Allocated(u64),
    Sparse,
}

/// Decode NTFS data runs from raw bytes and resolve absolute LCNs
pub fn decode_data_runs(data: &[u8], config: &DecoderConfig) -> MftResult<Vec<DataRun>> {
    let raw = decode_raw_runs(data, config)?;
    normalize_runs(&raw)
}

/// Decode the runlist exactly as stored, without resolving deltas
pub fn decode_raw_runs(data: &[u8], config: &DecoderConfig) -> MftResult<Vec<RawDataRun>> {
    let reader = ByteReader::new(data);
    let mut runs = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let header = data[pos];
        if header == 0 {
            break; // End marker
        }

        let length_size = (header & 0x0F) as usize;
        let offset_size = (header >> 4) as usize;
        let needed = 1 + length_size + offset_size;
        let available = data.len() - pos;

        if needed > available || length_size > MAX_FIELD_WIDTH || offset_size > MAX_FIELD_WIDTH {
            return Err(MftError::TruncatedDataRun {
                offset: pos,
                needed,
                available,
            });
        }

        let length = reader.read_signed_le(pos + 1, length_size)?;

        if config.stop_on_empty_run && (length_size == 0 || length == 0) {
            warn!(
                "Empty data run at offset {:#x} (header 0x{:02X}), ending runlist",
                pos, header
            );
            break;
        }

        let delta = if offset_size > 0 {
            Some(reader.read_signed_le(pos + 1 + length_size, offset_size)?)
        } else {
            None
        };

        trace!("Data run at {:#x}: length={}, delta={:?}", pos, length, delta);
        runs.push(RawDataRun { length, delta });
        pos += needed;
    }

    Ok(runs)
}

/// Resolve stored deltas into absolute LCNs.
/// The first allocated run seeds the running LCN, sparse runs leave it untouched.
/// A delta chain leaving the i64 range fails with `DataRunOverflow`.
pub fn normalize_runs(raw: &[RawDataRun]) -> MftResult<Vec<DataRun>> {
    let mut lcn = 0i64;

    raw.iter()
        .enumerate()
        .map(|(index, run)| match run.delta {
            Some(delta) => {
                lcn = lcn
                    .checked_add(delta)
                    .ok_or(MftError::DataRunOverflow { index })?;
                Ok(DataRun::allocated(run.length, lcn))
            }
            None => Ok(DataRun::sparse(run.length)),
        })
        .collect()
}

/// Encode normalized runs back into the on-disk runlist, including the end marker
pub fn encode_data_runs(runs: &[DataRun]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut prev_lcn = 0i64;

    for run in runs {
        let length_bytes = signed_width(run.length);

        if run.is_sparse() {
            data.push(length_bytes as u8);
            data.extend_from_slice(&run.length.to_le_bytes()[..length_bytes]);
            continue;
        }

        let delta = run.offset.wrapping_sub(prev_lcn);
        prev_lcn = run.offset;
        let offset_bytes = signed_width(delta);

        // Header byte: length size | offset size << 4
        data.push((length_bytes | (offset_bytes << 4)) as u8);
        data.extend_from_slice(&run.length.to_le_bytes()[..length_bytes]);
        data.extend_from_slice(&delta.to_le_bytes()[..offset_bytes]);
    }

    // End marker
    data.push(0);
    data
}

/// Smallest number of bytes holding `value` as a two's complement integer
fn signed_width(value: i64) -> usize {
    (1..MAX_FIELD_WIDTH)
        .find(|&width| {
            let bits = width * 8;
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            (min..=max).contains(&value)
        })
        .unwrap_or(MAX_FIELD_WIDTH)
}

/// Map a VCN (relative to the first run) to its location on the volume.
/// Returns None past the end of the runlist or when a run length is negative.
pub fn lcn_for_vcn(runs: &[DataRun], vcn: u64) -> Option<VcnMapping> {
    let mut run_start = 0u64;

    for run in runs {
        let length = u64::try_from(run.length).ok()?;
        let run_end = run_start.checked_add(length)?;

        if vcn < run_end {
            if run.is_sparse() {
                return Some(VcnMapping::Sparse);
            }
            let lcn = u64::try_from(run.offset).ok()?.checked_add(vcn - run_start)?;
            return Some(VcnMapping::Allocated(lcn));
        }

        run_start = run_end;
    }

    None
}

/// Total clusters covered by the runlist, sparse runs included.
/// None if the lengths overflow an i64.
pub fn total_clusters(runs: &[DataRun]) -> Option<i64> {
    runs.iter()
        .try_fold(0i64, |total, run| total.checked_add(run.length))
}
