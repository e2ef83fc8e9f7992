pub mod consts;
pub mod errors;
pub mod utils;
pub mod code;
pub mod slot;
pub mod normalize;
pub mod header;
pub mod encoder;
pub mod decoder;
pub mod lookup;
pub mod import;
pub mod meta;
pub mod artifact;

pub use consts::Flags;
pub use errors::{DictError, ErrorCategory, Result};
pub use normalize::{normalize, Entry, EntrySet, Normalized, NormalizeReport, RawRow};
pub use encoder::{encode, EncodeOptions};
pub use decoder::{decode, DecodedView};
pub use lookup::{lookup, BinaryLookup, Codes, DictionaryLookup, EntryIndex};
pub use import::{parse_csv, parse_json, parse_text, parse_frequency};
pub use meta::DictMeta;
pub use artifact::{write_artifact, ArtifactFile};
