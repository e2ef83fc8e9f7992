//! `cj-dict-meta@2` sidecar written next to each artifact.
//!
//! The codec never reads this file; it only guarantees that hashing the same
//! artifact bytes always yields the recorded digest.

use crate::consts::VERSION_MAJOR;
use crate::decoder::DecodedView;
use crate::errors::{DictError, Result};
use crate::normalize::NormalizeReport;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;

pub const META_SCHEMA: &str = "cj-dict-meta@2";
pub const FALLBACK_FORMAT: &str = "v1-json-csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Core,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRec {
    pub file: String,
    pub sha256: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsRec {
    pub has_quick_table: bool,
    pub has_frequency: bool,
    pub quick_derived_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatRec {
    pub version_major: u16,
    pub version_minor: u16,
    pub flags: FlagsRec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRec {
    pub entry_count: u32,
    pub duplicate_overrides: usize,
    pub rejected_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnicodeRec {
    pub min_codepoint: String,
    pub max_codepoint: String,
    pub includes_non_bmp_han: bool,
}

/// Provenance of one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRec {
    pub id: String,
    pub name: String,
    pub license: String,
    pub version: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRec {
    pub tool_version: String,
    pub generated_at: String,
    pub git_commit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatRec {
    pub min_runtime_schema: u16,
    pub fallback_format: String,
}

impl Default for CompatRec {
    fn default() -> Self {
        Self { min_runtime_schema: VERSION_MAJOR, fallback_format: FALLBACK_FORMAT.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictMeta {
    pub schema: String,
    pub dict_version: String,
    pub variant: Variant,
    pub artifact: ArtifactRec,
    pub format: FormatRec,
    pub stats: StatsRec,
    pub unicode: UnicodeRec,
    #[serde(default)]
    pub sources: Vec<SourceRec>,
    pub build: BuildRec,
    #[serde(default)]
    pub compat: CompatRec,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// `U+4F60` style label.
pub fn unicode_label(codepoint: u32) -> String {
    format!("U+{codepoint:04X}")
}

impl DictMeta {
    /// Describe `bytes` (already decoded into `view`) for the sidecar.
    #[allow(clippy::too_many_arguments)]
    pub fn describe(
        file: &str,
        bytes: &[u8],
        view: &DecodedView<'_>,
        report: &NormalizeReport,
        dict_version: &str,
        variant: Variant,
        sources: Vec<SourceRec>,
        build: BuildRec,
    ) -> Self {
        let header = view.header();
        let cps = view.codepoints();
        let min = cps.get(0).unwrap_or(0);
        let max = cps.get(cps.len().saturating_sub(1)).unwrap_or(0);
        Self {
            schema: META_SCHEMA.to_string(),
            dict_version: dict_version.to_string(),
            variant,
            artifact: ArtifactRec { file: file.to_string(), sha256: sha256_hex(bytes), bytes: bytes.len() as u64 },
            format: FormatRec {
                version_major: header.version_major,
                version_minor: header.version_minor,
                flags: FlagsRec {
                    has_quick_table: header.flags.has_secondary(),
                    has_frequency: header.flags.has_frequency(),
                    quick_derived_default: header.flags.secondary_derived(),
                },
            },
            stats: StatsRec {
                entry_count: header.entry_count,
                duplicate_overrides: report.duplicate_overrides,
                rejected_rows: report.rejected_rows,
            },
            unicode: UnicodeRec {
                min_codepoint: unicode_label(min),
                max_codepoint: unicode_label(max),
                includes_non_bmp_han: max > 0xFFFF,
            },
            sources,
            build,
            compat: CompatRec::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let m: DictMeta = serde_json::from_str(&s)?;
        Ok(m)
    }

    /// Write to `<path>.tmp`, fsync, rename over `path`.
    pub fn save_atomic(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)?;
        f.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        f.sync_all()?;
        drop(f);
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Compare the recorded digest with the digest of `bytes`.
    pub fn verify_artifact(&self, bytes: &[u8]) -> Result<()> {
        let actual = sha256_hex(bytes);
        if !actual.eq_ignore_ascii_case(&self.artifact.sha256) {
            return Err(DictError::DigestMismatch { expected: self.artifact.sha256.clone(), actual });
        }
        Ok(())
    }

    /// Same rule as the decoder: schema and major version must match, any
    /// minor version is readable.
    pub fn is_supported(&self) -> bool {
        self.schema == META_SCHEMA && self.format.version_major == VERSION_MAJOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::encoder::{encode, EncodeOptions};
    use crate::normalize::{normalize, RawRow};
    use tempfile::tempdir;

    fn build() -> (Vec<u8>, NormalizeReport) {
        let out = normalize(vec![
            RawRow::new(1, "日", "A", None),
            RawRow::new(2, "𠮷", "ONF", None),
            RawRow::new(3, "日", "B", None),
            RawRow::new(4, "xy", "A", None),
        ]);
        (encode(&out.entries, &EncodeOptions::new(0)).unwrap(), out.report)
    }

    fn build_rec() -> BuildRec {
        BuildRec {
            tool_version: "0.2.0".into(),
            generated_at: "2026-01-01T00:00:00Z".into(),
            git_commit: "unknown".into(),
        }
    }

    #[test]
    fn sha256_is_stable() {
        assert_eq!(sha256_hex(b"abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn describe_and_roundtrip() {
        let (bytes, report) = build();
        let view = decode(&bytes).unwrap();
        let meta = DictMeta::describe("cj.bin", &bytes, &view, &report, "2026.1", Variant::Core, vec![], build_rec());
        assert_eq!(meta.stats.entry_count, 2);
        assert_eq!(meta.stats.duplicate_overrides, 1);
        assert_eq!(meta.stats.rejected_rows, 1);
        assert_eq!(meta.unicode.min_codepoint, "U+65E5");
        assert_eq!(meta.unicode.max_codepoint, "U+20BB7");
        assert!(meta.unicode.includes_non_bmp_han);
        assert!(meta.format.flags.quick_derived_default);
        assert!(meta.is_supported());
        meta.verify_artifact(&bytes).unwrap();

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["schema"], "cj-dict-meta@2");
        assert_eq!(json["format"]["flags"]["hasQuickTable"], false);
        assert_eq!(json["compat"]["fallbackFormat"], "v1-json-csv");

        let tmp = tempdir().unwrap();
        let path = tmp.path().join("cj.meta.json");
        meta.save_atomic(&path).unwrap();
        assert_eq!(DictMeta::load(&path).unwrap(), meta);
    }

    #[test]
    fn minor_bump_still_supported() {
        let (bytes, report) = build();
        let view = decode(&bytes).unwrap();
        let mut meta = DictMeta::describe("cj.bin", &bytes, &view, &report, "1", Variant::Core, vec![], build_rec());
        meta.format.version_minor = 3;
        assert!(meta.is_supported());
        meta.format.version_major = 3;
        assert!(!meta.is_supported());
        meta.format.version_major = 2;
        meta.schema = "cj-dict-meta@1".into();
        assert!(!meta.is_supported());
    }

    #[test]
    fn digest_mismatch_detected() {
        let (mut bytes, report) = build();
        let meta = {
            let view = decode(&bytes).unwrap();
            DictMeta::describe("cj.bin", &bytes, &view, &report, "1", Variant::Full, vec![], build_rec())
        };
        bytes[60] ^= 1; // reserved byte, decode would still pass
        assert!(matches!(meta.verify_artifact(&bytes), Err(DictError::DigestMismatch { .. })));
    }
}
