//! Schema extraction from `parameter.hpp` headers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Args;
use presetkit_config::{DEFAULT_OUT_DIR, save_schema};
use presetkit_extract::{ExtractorConfig, SchemaExtractor};

use super::common::{BatchReport, Stage, collect_inputs, parse_define, progress_bar};

const HEADER_NAME: &str = "parameter.hpp";

#[derive(Args)]
pub struct ExtractArgs {
    /// Header files or directories to search for parameter.hpp
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for <Plugin>.type.json artifacts
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Integer constant for enum expressions (e.g. "nVoice=32")
    #[arg(short = 'D', long = "define", value_parser = parse_define, number_of_values = 1)]
    defines: Vec<(String, i64)>,

    /// Directory names to skip while searching (e.g. "_dump")
    #[arg(long, number_of_values = 1)]
    exclude: Vec<String>,

    /// Enum entry that terminates the parameter list
    #[arg(long, default_value = "ID_ENUM_LENGTH")]
    sentinel: String,

    /// Namespace enclosing the parameter enum
    #[arg(long, default_value = "ParameterID")]
    namespace: String,

    /// Name of the parameter enum
    #[arg(long, default_value = "ID")]
    enum_name: String,
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let excluded = |path: &Path| {
        path.components().any(|c| {
            args.exclude
                .iter()
                .any(|name| c.as_os_str() == name.as_str())
        })
    };
    let headers = collect_inputs(&args.inputs, "hpp", |p| {
        p.file_name().is_some_and(|n| n == HEADER_NAME) && !excluded(p)
    });
    if headers.is_empty() {
        anyhow::bail!("no {HEADER_NAME} found in the given inputs");
    }

    let config = ExtractorConfig {
        namespace: Some(args.namespace.clone()),
        enum_name: args.enum_name.clone(),
        sentinel: args.sentinel.clone(),
        constants: args.defines.iter().cloned().collect(),
        ..ExtractorConfig::default()
    };
    let extractor = SchemaExtractor::with_config(config);

    let mut report = BatchReport::default();
    let mut written: HashMap<String, PathBuf> = HashMap::new();
    let pb = progress_bar(headers.len());

    for path in &headers {
        pb.set_message(path.display().to_string());
        match extract_one(&extractor, path, &args.out_dir, &mut written) {
            Ok((artifact, count)) => {
                report.ok();
                pb.suspend(|| {
                    println!("{} -> {} ({count} parameters)", path.display(), artifact.display());
                });
            }
            Err((stage, err)) => {
                pb.suspend(|| report.fail(path, stage, err.as_ref()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    report.finish("headers")
}

type StageError = (Stage, Box<dyn std::error::Error + Send + Sync>);

/// Two headers in one run name the same plugin.
#[derive(Debug, thiserror::Error)]
#[error("plugin '{plugin}' was already extracted from '{first}' in this run")]
struct DuplicatePlugin {
    plugin: String,
    first: PathBuf,
}

/// Extract one header. `written` maps plugin names to the header that
/// produced their artifact earlier in the run.
fn extract_one(
    extractor: &SchemaExtractor,
    path: &Path,
    out_dir: &Path,
    written: &mut HashMap<String, PathBuf>,
) -> Result<(PathBuf, usize), StageError> {
    let source = std::fs::read_to_string(path).map_err(|e| (Stage::Read, e.into()))?;
    let schema = extractor
        .extract(&source)
        .map_err(|e| (Stage::Extract, e.into()))?;

    if let Some(first) = written.get(schema.plugin()) {
        let err = DuplicatePlugin {
            plugin: schema.plugin().to_string(),
            first: first.clone(),
        };
        return Err((Stage::Write, err.into()));
    }

    let artifact = save_schema(&schema, out_dir).map_err(|e| (Stage::Write, e.into()))?;
    written.insert(schema.plugin().to_string(), path.to_path_buf());
    Ok((artifact, schema.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "// This file is part of Same.\n\
        namespace ParameterID { enum ID { gain, ID_ENUM_LENGTH }; }\n\
        value[ID::gain] = std::make_unique<LinearValue>(0.5, s, \"gain\", f);\n";

    #[test]
    fn second_header_for_same_plugin_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let first = temp.path().join("a.hpp");
        let second = temp.path().join("b.hpp");
        std::fs::write(&first, HEADER).unwrap();
        std::fs::write(&second, HEADER).unwrap();

        let extractor = SchemaExtractor::new();
        let mut written = HashMap::new();
        extract_one(&extractor, &first, temp.path(), &mut written).unwrap();
        let (stage, err) =
            extract_one(&extractor, &second, temp.path(), &mut written).unwrap_err();
        assert_eq!(stage, Stage::Write);
        assert!(err.to_string().contains(&first.display().to_string()));
    }
}
