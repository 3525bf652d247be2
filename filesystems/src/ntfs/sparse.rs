// NTFS Sparse File Support
// Hole detection over normalized data runs

use crate::ntfs::data_runs::DataRun;
use log::{trace, warn};
use serde::Serialize;

/// FILE_ATTRIBUTE_SPARSE_FILE in $STANDARD_INFORMATION permissions
pub const FILE_ATTRIBUTE_SPARSE_FILE: u32 = 0x200;

/// Sparse layout of one non-resident stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SparseInfo {
    pub is_sparse: bool,
    /// Bytes backed by clusters on the volume
    pub allocated_size: u64,
    /// Bytes covered by the runlist, holes included
    pub logical_size: u64,
    pub sparse_ranges: Vec<SparseRange>,
}

/// A range of sparse (zero) data, in bytes from the start of the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SparseRange {
    pub offset: u64,
    pub length: u64,
}

/// Check the DOS permission bits of $STANDARD_INFORMATION
pub fn is_sparse_file(file_attributes: u32) -> bool {
    file_attributes & FILE_ATTRIBUTE_SPARSE_FILE != 0
}

/// Analyze data runs to identify sparse regions
pub fn analyze_sparse_runs(runs: &[DataRun], cluster_size: u32) -> SparseInfo {
    let mut sparse_ranges: Vec<SparseRange> = Vec::new();
    let mut current_offset = 0u64;
    let mut allocated_size = 0u64;

    for run in runs {
        let clusters = u64::try_from(run.length).unwrap_or_else(|_| {
            warn!("Ignoring negative run length {}", run.length);
            0
        });
        let run_size = clusters.saturating_mul(cluster_size as u64);

        if run.is_sparse() {
            // Adjacent holes collapse into one range
            match sparse_ranges.last_mut() {
                Some(last) if last.offset.saturating_add(last.length) == current_offset => {
                    last.length = last.length.saturating_add(run_size);
                }
                _ => sparse_ranges.push(SparseRange {
                    offset: current_offset,
                    length: run_size,
                }),
            }
            trace!("Sparse range at offset {}: {} bytes", current_offset, run_size);
        } else {
            allocated_size = allocated_size.saturating_add(run_size);
        }

        current_offset = current_offset.saturating_add(run_size);
    }

    SparseInfo {
        is_sparse: !sparse_ranges.is_empty(),
        allocated_size,
        logical_size: current_offset,
        sparse_ranges,
    }
}

/// Percentage of the logical size not backed by clusters
pub fn calculate_space_savings(sparse_info: &SparseInfo) -> f64 {
    if sparse_info.logical_size == 0 {
        return 0.0;
    }

    let saved = sparse_info.logical_size.saturating_sub(sparse_info.allocated_size);
    (saved as f64 / sparse_info.logical_size as f64) * 100.0
}
