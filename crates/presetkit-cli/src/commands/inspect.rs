//! Container inspection: header fields and chunk directory.

use std::path::PathBuf;

use clap::Args;
use presetkit_io::{ChunkId, PresetContainer, open_preset};

use super::common::{BatchReport, EndianArg, Stage, collect_inputs};

#[derive(Args)]
pub struct InspectArgs {
    /// Preset files or directories to search for .vstpreset files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Byte order of the container
    #[arg(long, value_enum, default_value_t = EndianArg::Little)]
    endian: EndianArg,

    /// Print the Info chunk (XML metadata) when present
    #[arg(long)]
    info: bool,

    /// Print one JSON object per preset instead of text
    #[arg(long)]
    json: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let presets = collect_inputs(&args.inputs, "vstpreset", |_| true);
    if presets.is_empty() {
        anyhow::bail!("no .vstpreset files found in the given inputs");
    }

    let mut report = BatchReport::default();
    for path in &presets {
        let mut preset = match open_preset(path, args.endian.into()) {
            Ok(preset) => preset,
            Err(e) => {
                report.fail(path, Stage::Container, &e);
                continue;
            }
        };

        let info = if args.info && preset.container().has_chunk(ChunkId::METADATA) {
            match preset.info_text() {
                Ok(text) => Some(text),
                Err(e) => {
                    report.fail(path, Stage::Container, &e);
                    continue;
                }
            }
        } else {
            None
        };

        if args.json {
            println!("{}", container_json(path, preset.container(), info.as_deref()));
        } else {
            print_container(path, preset.container(), info.as_deref());
        }
        report.ok();
    }

    if args.json {
        // Keep stdout machine-readable.
        if report.failed() > 0 {
            anyhow::bail!("{} preset(s) could not be read", report.failed());
        }
        return Ok(());
    }
    report.finish("presets")
}

fn print_container(path: &std::path::Path, container: &PresetContainer, info: Option<&str>) {
    println!("\n{}", path.display());
    println!("  Format version: {}", container.format_version);
    match container.class_id_str() {
        Some(id) => println!("  Class ID:       {id}"),
        None => println!("  Class ID:       {:02x?}", container.class_id),
    }
    println!("  File size:      {} bytes", container.file_len);
    println!(
        "  Chunk list:     '{}' at offset {}",
        container.list_tag, container.chunk_list_offset
    );
    println!("\n  {:<6} {:>10} {:>10}", "Chunk", "Offset", "Size");
    println!("  {:-<6} {:->10} {:->10}", "", "", "");
    for entry in &container.chunks {
        println!("  {:<6} {:>10} {:>10}", entry.id.to_string(), entry.offset, entry.size);
    }
    if let Some(info) = info {
        println!("\n  Info:");
        for line in info.lines() {
            println!("    {line}");
        }
    }
}

fn container_json(
    path: &std::path::Path,
    container: &PresetContainer,
    info: Option<&str>,
) -> serde_json::Value {
    let chunks: Vec<_> = container
        .chunks
        .iter()
        .map(|entry| {
            serde_json::json!({
                "id": entry.id.to_string(),
                "offset": entry.offset,
                "size": entry.size,
            })
        })
        .collect();
    serde_json::json!({
        "path": path.display().to_string(),
        "format_version": container.format_version,
        "class_id": container.class_id_str(),
        "file_len": container.file_len,
        "chunk_list_offset": container.chunk_list_offset,
        "chunks": chunks,
        "info": info,
    })
}
