use cjdict_core::{decode, encode, lookup, BinaryLookup, EncodeOptions, Entry, EntrySet};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

// CJK Unified Ideographs block
const CJK_START: u32 = 0x4E00;
const CJK_LEN: u32 = 0x5200;

fn random_code(rng: &mut StdRng) -> String {
    let len = rng.random_range(1..=5);
    (0..len).map(|_| char::from(b'A' + rng.random_range(0..26u8))).collect()
}

fn entries(n: usize, rng: &mut StdRng) -> EntrySet {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let Some(ch) = char::from_u32(CJK_START + rng.random_range(0..CJK_LEN)) else { continue };
        let primary = random_code(rng);
        // every tenth entry carries a non-derived secondary code
        if rng.random_range(0..10) == 0 {
            out.push(Entry::new(ch, primary, random_code(rng)));
        } else {
            out.push(Entry::derived(ch, primary));
        }
    }
    EntrySet::from_entries(out)
}

fn bench_codec(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x636a);
    let set = entries(20_000, &mut rng);
    let ranks: HashMap<char, u32> = set
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.character().map(|ch| (ch, i as u32)))
        .collect();
    let opts = EncodeOptions::new(0).frequency(ranks);
    let bytes = encode(&set, &opts).expect("encode");
    let queries: Vec<String> = (0..1024)
        .filter_map(|_| char::from_u32(CJK_START + rng.random_range(0..CJK_LEN)))
        .map(String::from)
        .collect();

    c.bench_function("encode", |b| b.iter(|| black_box(encode(&set, &opts).expect("encode"))));
    c.bench_function("decode", |b| b.iter(|| black_box(decode(&bytes).expect("decode").entry_count())));

    let view = decode(&bytes).expect("decode");
    c.bench_function("lookup", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(lookup(&view, q).expect("lookup"));
            }
        })
    });
    let dict = BinaryLookup::new(view);
    c.bench_function("lookup_hit_all", |b| {
        b.iter(|| {
            for item in dict.iter() {
                black_box(item.expect("slot"));
            }
        })
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
