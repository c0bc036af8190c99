//! Processor GUID collection from `fuid.hpp` headers.

use std::path::{Path, PathBuf};

use clap::Args;
use presetkit_config::{DEFAULT_OUT_DIR, GuidEntry, load_guid_map, save_guid_map};
use presetkit_extract::{extract_processor_uid, plugin_name};

use super::common::{BatchReport, Stage, collect_inputs};

const HEADER_NAME: &str = "fuid.hpp";

#[derive(Args)]
pub struct GuidArgs {
    /// Header files or directories to search for fuid.hpp
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory holding GUID.json (entries are merged into it)
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,
}

/// Failure to find a usable declaration in a header.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct MissingDeclaration(&'static str);

pub fn run(args: GuidArgs) -> anyhow::Result<()> {
    let headers = collect_inputs(&args.inputs, "hpp", |p| {
        p.file_name().is_some_and(|n| n == HEADER_NAME)
    });
    if headers.is_empty() {
        anyhow::bail!("no {HEADER_NAME} found in the given inputs");
    }

    let mut map = load_guid_map(&args.out_dir)?;
    let mut report = BatchReport::default();

    for path in &headers {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                report.fail(path, Stage::Read, &e);
                continue;
            }
        };
        let Some(guid) = extract_processor_uid(&source) else {
            report.fail(
                path,
                Stage::Extract,
                &MissingDeclaration("no 'static const FUID ProcessorUID(...)' declaration"),
            );
            continue;
        };
        let Some(plugin) = plugin_name(&source)
            .map(str::to_string)
            .or_else(|| plugin_dir_name(path))
        else {
            report.fail(
                path,
                Stage::Extract,
                &MissingDeclaration("cannot determine the plugin name"),
            );
            continue;
        };

        println!("{plugin}: {guid}");
        map.insert(plugin, GuidEntry { processor_guid: guid });
        report.ok();
    }

    let path = save_guid_map(&map, &args.out_dir)?;
    println!("wrote {} ({} plugins)", path.display(), map.len());
    report.finish("headers")
}

/// `<Plugin>/source/fuid.hpp` → `Plugin`.
fn plugin_dir_name(path: &Path) -> Option<String> {
    let source_dir = path.parent()?;
    let plugin_dir = if source_dir.file_name().is_some_and(|n| n == "source") {
        source_dir.parent()?
    } else {
        source_dir
    };
    plugin_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}
