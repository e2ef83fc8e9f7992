use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

use cjdict_core::{
    artifact::{write_artifact, ArtifactFile},
    encoder::{encode, EncodeOptions},
    import::{parse_frequency, parse_text},
    lookup::{BinaryLookup, DictionaryLookup, EntryIndex},
    meta::{sha256_hex, BuildRec, DictMeta, SourceRec, Variant},
    utils::crc32,
    Normalized,
};

mod config;

#[derive(Parser)]
#[command(name = "cjdict", about = "Cangjie dictionary artifacts: build, inspect, verify, query")]
struct Cli {
    /// debug, info, warn or error
    #[arg(long, global = true, env = "CJDICT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Default artifact for info/verify/lookup
    #[arg(long, global = true, env = "CJDICT_DICTIONARY")]
    dictionary: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(ValueEnum, Clone, Copy)]
enum SecondaryTable {
    Auto,
    Always,
    Never,
}

#[derive(ValueEnum, Clone, Copy)]
enum CliVariant {
    Core,
    Full,
}

#[derive(Subcommand)]
enum Cmd {
    /// Source file → binary artifact (+ optional sidecar)
    Build {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        meta: Option<PathBuf>,
        /// `char,rank` lines
        #[arg(long)]
        frequency: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = SecondaryTable::Auto)]
        secondary_table: SecondaryTable,
        /// Epoch seconds; defaults to now
        #[arg(long)]
        timestamp: Option<u32>,
        #[arg(long, default_value = "dev")]
        dict_version: String,
        #[arg(long, value_enum, default_value_t = CliVariant::Core)]
        variant: CliVariant,
        #[arg(long, default_value = "unknown")]
        license: String,
    },

    Info {
        #[arg(long)]
        artifact: Option<PathBuf>,
    },

    Verify {
        #[arg(long)]
        artifact: Option<PathBuf>,
        #[arg(long)]
        meta: Option<PathBuf>,
    },

    Lookup {
        #[arg(long)]
        artifact: Option<PathBuf>,
        /// Editable source used when the artifact is rejected
        #[arg(long)]
        fallback: Option<PathBuf>,
        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// Print the normalization report as JSON
    Check {
        #[arg(long)]
        input: PathBuf,
    },
}

fn now_ts() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn file_name(p: &Path) -> String {
    p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn read_source(path: &Path) -> Result<(Vec<u8>, Normalized)> {
    let raw = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let text = std::str::from_utf8(&raw).with_context(|| format!("{} is not UTF-8", path.display()))?;
    let out = parse_text(&file_name(path), text).with_context(|| format!("import {}", path.display()))?;
    Ok((raw, out))
}

fn print_lookups(dict: &impl DictionaryLookup, queries: &[String]) -> Result<()> {
    for q in queries {
        match dict.lookup(q).with_context(|| format!("lookup {q:?}"))? {
            Some(codes) => println!("{q} {} {}", codes.primary, codes.secondary),
            None => println!("{q} -"),
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_build(
    input: &Path,
    out: &Path,
    meta: Option<&Path>,
    frequency: Option<&Path>,
    secondary_table: SecondaryTable,
    timestamp: Option<u32>,
    dict_version: &str,
    variant: CliVariant,
    license: &str,
) -> Result<()> {
    let (raw, normalized) = read_source(input)?;
    let report = &normalized.report;
    info!(
        accepted = report.accepted_rows,
        rejected = report.rejected_rows,
        duplicates = report.duplicate_overrides,
        "source normalized"
    );

    let build_ts = match timestamp {
        Some(ts) => ts,
        None => u32::try_from(now_ts()).map_err(|_| anyhow!("clock outside u32 epoch range"))?,
    };
    let mut opts = EncodeOptions::new(build_ts).source_hash(crc32(&raw));
    match secondary_table {
        SecondaryTable::Auto => {}
        SecondaryTable::Always => opts = opts.secondary_table(true),
        SecondaryTable::Never => opts = opts.secondary_table(false),
    }
    if let Some(fp) = frequency {
        let text = std::fs::read_to_string(fp).with_context(|| format!("read {}", fp.display()))?;
        opts = opts.frequency(parse_frequency(&text));
    }

    let bytes = encode(&normalized.entries, &opts).context("encode")?;
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    write_artifact(out, &bytes)?;
    println!("built: {} ({} entries, {} bytes)", out.display(), normalized.entries.len(), bytes.len());

    if let Some(meta_path) = meta {
        let view = cjdict_core::decode(&bytes)?;
        let generated_at = OffsetDateTime::from_unix_timestamp(build_ts as i64)?.format(&Rfc3339)?;
        let variant = match variant {
            CliVariant::Core => Variant::Core,
            CliVariant::Full => Variant::Full,
        };
        let source = SourceRec {
            id: "source".to_string(),
            name: file_name(input),
            license: license.to_string(),
            version: dict_version.to_string(),
            sha256: sha256_hex(&raw),
        };
        let build = BuildRec {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at,
            git_commit: option_env!("CJDICT_GIT_COMMIT").unwrap_or("unknown").to_string(),
        };
        let m = DictMeta::describe(&file_name(out), &bytes, &view, report, dict_version, variant, vec![source], build);
        m.save_atomic(meta_path)?;
        println!("meta: {}", meta_path.display());
    }
    Ok(())
}

fn cmd_info(artifact: &Path) -> Result<()> {
    let file = ArtifactFile::open(artifact).with_context(|| format!("open {}", artifact.display()))?;
    let view = file.view().with_context(|| format!("decode {}", artifact.display()))?;
    let h = view.header();
    println!("path: {}", artifact.display());
    println!("version: {}.{}", h.version_major, h.version_minor);
    println!("entries: {}", h.entry_count);
    println!("flags: {:#x}", h.flags.bits());
    println!("secondary_table: {}", h.flags.has_secondary());
    println!("frequency_table: {}", h.flags.has_frequency());
    println!("secondary_derived: {}", h.flags.secondary_derived());
    println!("payload_bytes: {}", h.payload_bytes);
    println!("payload_crc32: {:#010x}", h.payload_crc32);
    println!("source_hash: {:#010x}", h.source_hash);
    println!("build_timestamp: {}", h.build_timestamp);
    Ok(())
}

fn cmd_verify(artifact: &Path, meta: Option<&Path>) -> Result<()> {
    let file = ArtifactFile::open(artifact).with_context(|| format!("open {}", artifact.display()))?;
    let view = file.view().with_context(|| format!("decode {}", artifact.display()))?;
    // walk every slot once so corrupt codes surface here, not at query time
    let dict = BinaryLookup::new(view);
    let mut checked = 0usize;
    for item in dict.iter() {
        item?;
        checked += 1;
    }

    if let Some(meta_path) = meta {
        let m = DictMeta::load(meta_path).with_context(|| format!("load {}", meta_path.display()))?;
        if !m.is_supported() {
            bail!("unsupported sidecar: {} v{}.{}", m.schema, m.format.version_major, m.format.version_minor);
        }
        m.verify_artifact(file.bytes())?;
        if m.stats.entry_count as usize != view.entry_count() {
            bail!("entry count mismatch: sidecar {}, artifact {}", m.stats.entry_count, view.entry_count());
        }
    }
    println!("ok: {} entries", checked);
    Ok(())
}

fn cmd_lookup(artifact: &Path, fallback: Option<&Path>, queries: &[String]) -> Result<()> {
    let file = ArtifactFile::open(artifact).with_context(|| format!("open {}", artifact.display()))?;
    match (file.view(), fallback) {
        (Ok(view), _) => print_lookups(&BinaryLookup::new(view), queries),
        (Err(e), Some(src)) if e.is_fallback_worthy() => {
            warn!(error = %e, source = %src.display(), "artifact rejected, using fallback source");
            let (_, normalized) = read_source(src)?;
            print_lookups(&EntryIndex::new(normalized.entries), queries)
        }
        (Err(e), _) => Err(e).with_context(|| format!("decode {}", artifact.display())),
    }
}

fn cmd_check(input: &Path) -> Result<()> {
    let (_, normalized) = read_source(input)?;
    println!("{}", serde_json::to_string_pretty(&normalized.report)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_tracing(config::log_level(&cli.log_level));
    let dictionary = config::dictionary_path(cli.dictionary.as_deref());

    match cli.cmd {
        Cmd::Build {
            input,
            out,
            meta,
            frequency,
            secondary_table,
            timestamp,
            dict_version,
            variant,
            license,
        } => cmd_build(
            &input,
            &out,
            meta.as_deref(),
            frequency.as_deref(),
            secondary_table,
            timestamp,
            &dict_version,
            variant,
            &license,
        )?,
        Cmd::Info { artifact } => cmd_info(artifact.as_deref().unwrap_or(dictionary.as_path()))?,
        Cmd::Verify { artifact, meta } => cmd_verify(artifact.as_deref().unwrap_or(dictionary.as_path()), meta.as_deref())?,
        Cmd::Lookup { artifact, fallback, queries } => {
            cmd_lookup(artifact.as_deref().unwrap_or(dictionary.as_path()), fallback.as_deref(), &queries)?
        }
        Cmd::Check { input } => cmd_check(&input)?,
    }
    Ok(())
}
