use criterion::{black_box, criterion_group, criterion_main, Criterion};

use stam::*;

const SENTENCE: &str = "All human beings are born free and equal in dignity and rights. ";

/// Builds a store with one longer text and an annotation for every word
fn setup_store() -> AnnotationStore {
    let text = SENTENCE.repeat(200);
    let mut store = AnnotationStore::default()
        .with_id("bench")
        .with_resource(TextResourceBuilder::new().with_id("text").with_text(text.as_str()))
        .unwrap();
    let offsets: Vec<(usize, usize)> = {
        let resource = store.resource("text").unwrap();
        resource
            .split_text(" ")
            .map(|ts| (ts.begin(), ts.end()))
            .collect()
    };
    for (begin, end) in offsets {
        store
            .annotate(
                AnnotationBuilder::new()
                    .with_target(SelectorBuilder::textselector("text", Offset::simple(begin, end)))
                    .with_data("bench", "type", "word"),
            )
            .unwrap();
    }
    let len = text.chars().count();
    store
        .annotate(
            AnnotationBuilder::new()
                .with_id("everything")
                .with_target(SelectorBuilder::textselector("text", Offset::simple(0, len)))
                .with_data("bench", "type", "document"),
        )
        .unwrap();
    store
}

pub fn bench_text(c: &mut Criterion) {
    let store = setup_store();
    let resource = store.resource("text").unwrap();

    let expressions: Vec<_> = vec![
        Regex::new(r"\w+(?:[-_]\w+)*").unwrap(),
        Regex::new(r"[\.\?,/]+").unwrap(),
        Regex::new(r"[0-9]+(?:[,\.][0-9]+)").unwrap(),
    ];

    c.bench_function("find_text", |b| {
        b.iter(|| {
            let count = resource.find_text(black_box("equal")).count();
            assert_eq!(count, 200);
        })
    });

    c.bench_function("find_text_nocase", |b| {
        b.iter(|| {
            let count = resource.find_text_nocase(black_box("EQUAL")).count();
            assert_eq!(count, 200);
        })
    });

    c.bench_function("find_text_regex_multi", |b| {
        b.iter(|| {
            let mut sumlen = 0;
            for item in resource
                .find_text_regex(black_box(&expressions), None, false)
                .unwrap()
            {
                sumlen += item.text().len(); //just so we have something silly to do with the item
            }
            assert!(sumlen > 0);
        })
    });
}

pub fn bench_related_text(c: &mut Criterion) {
    let store = setup_store();
    let everything = store.annotation("everything").unwrap();

    c.bench_function("related_text_embeds", |b| {
        b.iter(|| {
            let results = everything.related_text(black_box(&TextSelectionOperator::embeds()));
            assert!(!results.is_empty());
        })
    });

    let word = store.annotations().nth(100).unwrap();
    c.bench_function("related_text_overlaps", |b| {
        b.iter(|| {
            let results = word.related_text(black_box(&TextSelectionOperator::overlaps()));
            assert!(!results.is_empty());
        })
    });
}

pub fn bench_align(c: &mut Criterion) {
    let store = AnnotationStore::default()
        .with_resource(TextResourceBuilder::new().with_id("source").with_text(SENTENCE.repeat(4)))
        .unwrap()
        .with_resource(
            TextResourceBuilder::new()
                .with_id("target")
                .with_text(SENTENCE.replace("born ", "").repeat(4)),
        )
        .unwrap();
    let source = store
        .resource("source")
        .unwrap()
        .textselection(&Offset::whole())
        .unwrap();
    let target = store
        .resource("target")
        .unwrap()
        .textselection(&Offset::whole())
        .unwrap();
    let config = AlignmentConfig::default();

    c.bench_function("align_texts_local", |b| {
        b.iter(|| {
            let transpositions = align_texts(&source, &target, black_box(&config)).unwrap();
            assert_eq!(transpositions.len(), 1);
        })
    });
}

criterion_group!(benches, bench_text, bench_related_text, bench_align);
criterion_main!(benches);
