use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use mftparse_core::DecoderConfig;
use mftparse_filesystems::ntfs::data_runs::{decode_raw_runs, normalize_runs};
use mftparse_filesystems::ntfs::{
    analyze_sparse_runs, decode_attribute_with, Attribute, AttributeBody, AttributeStream,
};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mftparse")]
#[command(about = "Decode NTFS MFT attribute records", long_about = None)]
struct Cli {
    /// Decoder configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a single attribute record
    Decode {
        /// File holding the record
        file: PathBuf,
        /// Attribute type code (decimal or 0x-prefixed hex)
        #[arg(short, long, value_parser = parse_u32)]
        type_code: u32,
        /// Byte offset of the record within the file
        #[arg(short, long, default_value = "0", value_parser = parse_usize)]
        offset: usize,
    },
    /// Walk every attribute record of an attribute area
    Walk {
        /// File holding the attribute area
        file: PathBuf,
        /// Byte offset of the first attribute
        #[arg(short, long, default_value = "0", value_parser = parse_usize)]
        offset: usize,
        /// Limit the area to this many bytes
        #[arg(short, long, value_parser = parse_usize)]
        length: Option<usize>,
    },
    /// Decode a hex-encoded run list
    Runs {
        /// Run list bytes, e.g. 2108001001081108f000
        hex: String,
        /// Cluster size used for the sparse summary
        #[arg(long, default_value = "4096", value_parser = parse_u32)]
        cluster_size: u32,
    },
}

fn parse_u64(value: &str) -> Result<u64, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", value, e))
}

fn parse_u32(value: &str) -> Result<u32, String> {
    let parsed = parse_u64(value)?;
    u32::try_from(parsed).map_err(|_| format!("'{}' does not fit in 32 bits", value))
}

fn parse_usize(value: &str) -> Result<usize, String> {
    let parsed = parse_u64(value)?;
    usize::try_from(parsed).map_err(|_| format!("'{}' is too large", value))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DecoderConfig> {
    match path {
        Some(path) => DecoderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(DecoderConfig::default()),
    }
}

fn read_region(file: &Path, offset: usize, length: Option<usize>) -> anyhow::Result<Vec<u8>> {
    let data = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    if offset > data.len() {
        anyhow::bail!("Offset {:#x} is past the end of {} ({} bytes)", offset, file.display(), data.len());
    }

    let end = match length {
        Some(length) => offset.saturating_add(length).min(data.len()),
        None => data.len(),
    };

    Ok(data[offset..end].to_vec())
}

fn print_attribute(attr: &Attribute) {
    let header = attr.header();
    println!("{} (0x{:X})", attr.type_label(), attr.type_code());
    if let Some(name) = attr.name() {
        println!("  Name: {}", name);
    }
    println!("  Length: {} bytes, id {}", header.total_length, header.attribute_id);

    match header.non_resident() {
        Some(fields) => {
            println!("  Non-resident: VCN {}..={}", fields.starting_vcn, fields.last_vcn);
            println!(
                "  Sizes: allocated {}, real {}, initialized {}",
                fields.allocated_size, fields.real_size, fields.initialized_size
            );
            for run in attr.data_runs() {
                if run.is_sparse() {
                    println!("    {} clusters sparse", run.length);
                } else {
                    println!("    {} clusters at LCN {}", run.length, run.offset);
                }
            }
        }
        None => {
            if let Some(fields) = header.resident() {
                println!("  Resident: {} bytes at {:#x}", fields.value_length, fields.value_offset);
            }
        }
    }

    match attr.body() {
        AttributeBody::StandardInformation(si) => {
            println!("  Created:  {}", si.timestamps.ctime);
            println!("  Modified: {}", si.timestamps.atime);
            println!("  MFT changed: {}", si.timestamps.mtime);
            println!("  Accessed: {}", si.timestamps.rtime);
            println!("  Permissions: 0x{:08X}", si.permissions);
            if let Some(extended) = &si.extended {
                println!("  Security ID: {}, USN: {}", extended.security_id, extended.usn);
            }
        }
        AttributeBody::FileName(fname) => {
            println!("  File name: {} ({:?})", fname.name, fname.namespace);
            println!(
                "  Parent: record {}, sequence {}",
                fname.parent_record_number(),
                fname.parent_sequence_number()
            );
            println!("  Size: {} (allocated {})", fname.real_size, fname.allocated_size);
        }
        AttributeBody::ObjectId(oid) => {
            println!("  Object ID: {}", oid.object_id);
            if let Some(birth) = oid.birth_volume_id {
                println!("  Birth volume ID: {}", birth);
            }
        }
        AttributeBody::VolumeName(name) => println!("  Label: {}", name.label),
        AttributeBody::VolumeInformation(info) => {
            println!("  NTFS version: {}.{}", info.major_version, info.minor_version);
            println!(
                "  Flags: 0x{:04X}{}",
                info.flags,
                if info.is_dirty() { " (dirty)" } else { "" }
            );
        }
        AttributeBody::Opaque { value: Some(value) } => {
            println!("  Value: {}", hex::encode(value));
        }
        AttributeBody::Opaque { value: None } => {}
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    debug!("Decoder config: {:?}", config);

    match cli.command {
        Commands::Decode { file, type_code, offset } => {
            let data = read_region(&file, offset, None)?;
            let attr = decode_attribute_with(type_code, &data, &config)
                .with_context(|| format!("Failed to decode attribute at {:#x}", offset))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&attr)?);
            } else {
                print_attribute(&attr);
            }
        }
        Commands::Walk { file, offset, length } => {
            let area = read_region(&file, offset, length)?;
            let mut results = Vec::new();

            for item in AttributeStream::new(&area, &config) {
                let position = offset + item.offset;
                match item.result {
                    Ok(attr) if cli.json => results.push(json!({ "offset": position, "attribute": attr })),
                    Err(e) if cli.json => results.push(json!({ "offset": position, "error": e.to_string() })),
                    Ok(attr) => {
                        println!("[{:#06x}]", position);
                        print_attribute(&attr);
                    }
                    Err(e) => eprintln!("[{:#06x}] Error: {}", position, e),
                }
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }
        Commands::Runs { hex, cluster_size } => {
            let bytes = hex::decode(hex.trim()).context("Run list is not valid hex")?;
            let raw = decode_raw_runs(&bytes, &config)?;
            let runs = normalize_runs(&raw)?;
            let sparse = analyze_sparse_runs(&runs, cluster_size);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "runs": runs, "sparse": sparse }))?);
            } else {
                for (raw_run, run) in raw.iter().zip(&runs) {
                    match raw_run.delta {
                        Some(delta) => println!("{:>10} clusters at LCN {:<12} (delta {:+})", run.length, run.offset, delta),
                        None => println!("{:>10} clusters sparse", run.length),
                    }
                }
                println!(
                    "Logical size: {} bytes, allocated: {} bytes, {} hole(s)",
                    sparse.logical_size,
                    sparse.allocated_size,
                    sparse.sparse_ranges.len()
                );
            }
        }
    }

    Ok(())
}
