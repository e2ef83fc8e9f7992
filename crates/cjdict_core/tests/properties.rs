use cjdict_core::code::{canonical_char, canonical_code, derive_secondary, is_valid_code};
use cjdict_core::{decode, encode, lookup, normalize, Codes, DictError, EncodeOptions, Entry, EntrySet, RawRow};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Small BMP and non-BMP pools so duplicate characters are common.
fn arb_char() -> impl Strategy<Value = char> {
    prop_oneof![
        3 => (0x4E00u32..0x4E20).prop_filter_map("scalar", char::from_u32),
        1 => (0x20000u32..0x20008).prop_filter_map("scalar", char::from_u32),
    ]
}

fn arb_row() -> impl Strategy<Value = (String, String, Option<String>)> {
    let character = prop_oneof![
        8 => arb_char().prop_map(String::from),
        1 => Just("ab".to_string()),
        1 => Just(String::new()),
    ];
    let primary = prop_oneof![
        6 => "[A-Z]{1,5}",
        2 => " ?[a-z]{1,4} ?",
        1 => "[0-9]{1,2}",
        1 => "[A-Z]{6}",
    ];
    let secondary = proptest::option::of(prop_oneof![3 => "[A-Z]{1,5}", 1 => "[0-9]"]);
    (character, primary, secondary)
}

fn arb_rows() -> impl Strategy<Value = Vec<RawRow>> {
    prop::collection::vec(arb_row(), 1..64).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (c, p, s))| RawRow::new(i + 1, c, p, s.as_deref()))
            .collect()
    })
}

fn arb_derived_entries() -> impl Strategy<Value = EntrySet> {
    prop::collection::vec((arb_char(), "[A-Z]{1,5}"), 1..48)
        .prop_map(|pairs| EntrySet::from_entries(pairs.into_iter().map(|(c, p)| Entry::derived(c, p)).collect()))
}

/// Last valid row per character, computed row by row.
fn expected(rows: &[RawRow]) -> BTreeMap<char, Codes> {
    let mut out = BTreeMap::new();
    for row in rows {
        let Some(ch) = canonical_char(&row.character) else { continue };
        let primary = canonical_code(&row.primary);
        if !is_valid_code(&primary) {
            continue;
        }
        let secondary = row.secondary.as_deref().map(canonical_code).filter(|s| is_valid_code(s));
        let secondary = secondary.unwrap_or_else(|| derive_secondary(&primary));
        out.insert(ch, Codes { primary, secondary });
    }
    out
}

proptest! {
    /// normalize → encode → decode → lookup returns the last valid row per character.
    #[test]
    fn prop_roundtrip(rows in arb_rows()) {
        let model = expected(&rows);
        let out = normalize(rows);
        prop_assert_eq!(out.entries.len(), model.len());

        match encode(&out.entries, &EncodeOptions::new(0)) {
            Err(DictError::EmptyDictionary) => prop_assert!(model.is_empty()),
            Err(e) => prop_assert!(false, "encode failed: {}", e),
            Ok(bytes) => {
                let view = decode(&bytes).unwrap();
                prop_assert_eq!(view.entry_count(), model.len());
                for (ch, codes) in &model {
                    prop_assert_eq!(lookup(&view, &ch.to_string()).unwrap(), Some(codes.clone()));
                }
            }
        }
    }

    /// The codepoints table is strictly increasing.
    #[test]
    fn prop_codepoints_strictly_increasing(rows in arb_rows()) {
        let out = normalize(rows);
        prop_assume!(!out.entries.is_empty());
        let bytes = encode(&out.entries, &EncodeOptions::new(0)).unwrap();
        let cps: Vec<u32> = decode(&bytes).unwrap().codepoints().iter().collect();
        prop_assert!(cps.windows(2).all(|w| w[0] < w[1]), "not ascending: {:?}", cps);
    }

    /// Derivable secondary codes read back the same with or without the table.
    #[test]
    fn prop_secondary_table_equivalence(set in arb_derived_entries()) {
        let with = encode(&set, &EncodeOptions::new(0).secondary_table(true)).unwrap();
        let without = encode(&set, &EncodeOptions::new(0).secondary_table(false)).unwrap();
        let with = decode(&with).unwrap();
        let without = decode(&without).unwrap();
        prop_assert!(with.secondary_table().is_some());
        prop_assert!(without.secondary_table().is_none());

        for e in &set {
            let q = e.character().unwrap().to_string();
            let a = lookup(&with, &q).unwrap().unwrap();
            let b = lookup(&without, &q).unwrap().unwrap();
            prop_assert_eq!(&a.secondary, &derive_secondary(&e.primary));
            prop_assert_eq!(a, b);
        }
    }
}
