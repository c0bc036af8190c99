//! Batch decoding of `.vstpreset` files against a plugin schema.

use std::path::{Path, PathBuf};

use clap::Args;
use presetkit_config::{
    DEFAULT_OUT_DIR, PresetRecord, ToleranceList, load_guid_map, load_schema, load_schema_for,
    save_presets,
};
use presetkit_core::{ParameterSchema, PresetDecoder};
use presetkit_io::open_preset;

use super::common::{BatchReport, EndianArg, Stage, collect_inputs, progress_bar};

#[derive(Args)]
pub struct DecodeArgs {
    /// Plugin name; its schema is read from <SCHEMA_DIR>/<PLUGIN>.type.json
    #[arg(value_name = "PLUGIN")]
    plugin: String,

    /// Preset files or directories to search for .vstpreset files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Schema artifact to use instead of looking it up by plugin name
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Directory holding schema artifacts and GUID.json
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    schema_dir: PathBuf,

    /// Directory for the <Plugin>.preset.json artifact
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Byte order of the container and parameter values
    #[arg(long, value_enum, default_value_t = EndianArg::Little)]
    endian: EndianArg,

    /// Default-tolerance allow-list (TOML)
    #[arg(long)]
    tolerance: Option<PathBuf>,
}

pub fn run(args: DecodeArgs) -> anyhow::Result<()> {
    let mut schema = match &args.schema {
        Some(path) => load_schema(path)?,
        None => load_schema_for(&args.plugin, &args.schema_dir)?,
    };
    if schema.plugin() != args.plugin {
        tracing::warn!(
            expected = %args.plugin,
            found = schema.plugin(),
            "schema artifact belongs to a different plugin"
        );
    }

    let tolerance = ToleranceList::discover(args.tolerance.as_deref())?;
    tolerance.apply(&mut schema);

    let expected_class = load_guid_map(&args.schema_dir)?
        .remove(&args.plugin)
        .map(|entry| entry.processor_guid);

    let presets = collect_inputs(&args.inputs, "vstpreset", |_| true);
    if presets.is_empty() {
        anyhow::bail!("no .vstpreset files found in the given inputs");
    }

    let decoder = PresetDecoder::new(args.endian.into());
    let mut report = BatchReport::default();
    let mut records = Vec::with_capacity(presets.len());
    let pb = progress_bar(presets.len());

    for path in &presets {
        pb.set_message(path.display().to_string());
        match decode_one(&decoder, &schema, path, expected_class.as_deref()) {
            Ok(record) => {
                report.ok();
                records.push(record);
            }
            Err((stage, err)) => pb.suspend(|| report.fail(path, stage, err.as_ref())),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if records.is_empty() {
        tracing::warn!(plugin = %args.plugin, "no presets decoded, nothing written");
    } else {
        let plugin = schema.plugin();
        match save_presets(plugin, &records, &args.out_dir) {
            Ok(path) => println!("wrote {} ({} presets)", path.display(), records.len()),
            Err(e) => report.fail(&args.out_dir, Stage::Write, &e),
        }
    }

    report.finish("presets")
}

type StageError = (Stage, Box<dyn std::error::Error + Send + Sync>);

fn decode_one(
    decoder: &PresetDecoder,
    schema: &ParameterSchema,
    path: &Path,
    expected_class: Option<&str>,
) -> Result<PresetRecord, StageError> {
    let mut preset =
        open_preset(path, decoder.endianness()).map_err(|e| (Stage::Container, e.into()))?;

    if let (Some(expected), Some(found)) = (expected_class, preset.container().class_id_str())
        && !expected.eq_ignore_ascii_case(found)
    {
        tracing::warn!(
            path = %path.display(),
            expected,
            found,
            "preset class id does not match the plugin's processor GUID"
        );
    }

    let chunk = preset
        .component_state()
        .map_err(|e| (Stage::Container, e.into()))?;
    let state = decoder
        .decode(schema, &chunk)
        .map_err(|e| (Stage::Decode, e.into()))?;

    if state.trailing() > 0 {
        tracing::debug!(
            path = %path.display(),
            trailing = state.trailing(),
            "component state has bytes after the last parameter"
        );
    }
    if state.defaulted_count() > 0 {
        tracing::info!(
            path = %path.display(),
            defaulted = state.defaulted_count(),
            "truncated preset, allow-listed parameters set to default"
        );
    }

    Ok(PresetRecord::from_path(path, state.parameters))
}
