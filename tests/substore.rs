mod common;
use crate::common::*;

use std::path::Path;

use stam::*;

fn part(id: &str, config: &Config, text: &str, annotation_id: &str) -> Result<AnnotationStore, StamError> {
    AnnotationStore::new(config.clone())
        .with_id(id)
        .with_filename(format!("{}.json", id))
        .with_resource(
            TextResourceBuilder::new()
                .with_id("testres")
                .with_text(text),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id(annotation_id)
                .with_target(SelectorBuilder::textselector("testres", Offset::simple(6, 11)))
                .with_data("testdataset", "pos", "noun"),
        )
}

/// Serves a handful of stores by filename, without touching the filesystem
struct TestLoader;

impl StoreLoader for TestLoader {
    fn load(&self, path: &Path, config: &Config) -> Result<AnnotationStore, StamError> {
        match path.to_str() {
            Some("part1.json") => part("part1", config, "Hello world", "A1"),
            Some("part3.json") => part("part3", config, "Hello world", "A3"),
            Some("conflict.json") => part("conflict", config, "Goodbye world", "A4"),
            Some("part2.json") => {
                let mut store = AnnotationStore::new(config.clone())
                    .with_id("part2")
                    .with_filename("part2.json")
                    .with_resource(
                        TextResourceBuilder::new()
                            .with_id("otherres")
                            .with_text("Another text"),
                    )?;
                store.add_substore("part1.json", self)?;
                Ok(store)
            }
            Some("copy.json") => part("part1", config, "Hello world", "A5"),
            Some("nesting.json") => {
                let mut store = AnnotationStore::new(config.clone())
                    .with_id("nesting")
                    .with_filename("nesting.json");
                store.add_substore("copy.json", self)?;
                Ok(store)
            }
            Some("cycle.json") => {
                let mut store = AnnotationStore::new(config.clone())
                    .with_id("cycle")
                    .with_filename("cycle.json");
                store.add_substore("root.json", self)?;
                Ok(store)
            }
            _ => Err(StamError::OtherError("no such test store")),
        }
    }
}

fn root() -> Result<AnnotationStore, StamError> {
    AnnotationStore::default()
        .with_id("root")
        .with_filename("root.json")
        .with_resource(
            TextResourceBuilder::new()
                .with_id("rootres")
                .with_text("Root text"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("R1")
                .with_target(SelectorBuilder::textselector("rootres", Offset::simple(0, 4)))
                .with_data("testdataset", "pos", "noun"),
        )
}

#[test]
fn substore_with_closure() -> Result<(), StamError> {
    let mut store = AnnotationStore::default().with_id("root");
    let loader = |path: &Path, config: &Config| -> Result<AnnotationStore, StamError> {
        assert_eq!(path, Path::new("hello.json"));
        part("hello", config, "Hello world", "A1")
    };
    let handle = store.add_substore("hello.json", &loader)?;
    let substore = store.substore(handle)?;
    assert_eq!(substore.id(), Some("hello"));
    assert_eq!(substore.filename(), Some(Path::new("hello.json")));
    assert_eq!(substore.annotations_len(), 1);
    assert_eq!(store.annotation("A1")?.text_simple(), Some("world"));
    Ok(())
}

#[test]
fn substore_provenance() -> Result<(), StamError> {
    let mut store = root()?;
    let handle = store.add_substore("part1.json", &TestLoader)?;

    let annotation = store.annotation("A1")?;
    assert_eq!(
        annotation.substore().map(|substore| substore.handle()),
        Some(handle)
    );
    assert!(store.annotation("R1")?.substore().is_none());

    let resource = store.resource("testres")?;
    let substores: Vec<_> = resource.substores().map(|s| s.handle()).collect();
    assert_eq!(substores, vec![handle]);
    assert_eq!(store.resource("rootres")?.substores().count(), 0);

    //the dataset was already declared in the root store
    let dataset = store.dataset("testdataset")?;
    assert_eq!(dataset.substores().count(), 0);
    //and the data is shared
    assert_eq!(dataset.data_len(), 1);
    let data = store.find_data("testdataset", "pos", &DataOperator::Equals("noun"));
    assert_eq!(data[0].annotations_len(), 2);

    assert_eq!(store.annotations_len(true), 2);
    assert_eq!(store.annotations_len(false), 1);
    assert_eq!(store.resources_len(true), 2);
    assert_eq!(store.resources_len(false), 1);
    assert_eq!(store.datasets_len(false), 1);
    let ids: Vec<_> = store
        .annotations_no_substores()
        .map(|a| a.id().expect("id"))
        .collect();
    assert_eq!(ids, vec!["R1"]);
    Ok(())
}

#[test]
fn substore_included_once() -> Result<(), StamError> {
    let mut store = root()?;
    let first = store.add_substore("part1.json", &TestLoader)?;
    let second = store.add_substore("part1.json", &TestLoader)?;
    assert_eq!(first, second);
    assert_eq!(store.substores_len(true), 1);
    assert_eq!(store.annotations_len(true), 2);
    Ok(())
}

#[test]
fn substore_nested() -> Result<(), StamError> {
    let mut store = root()?;
    let part2 = store.add_substore("part2.json", &TestLoader)?;
    assert_eq!(store.substores_len(true), 2);
    assert_eq!(store.substores_len(false), 1);

    let annotation = store.annotation("A1")?;
    let part1 = annotation.substore().expect("annotation comes from a substore");
    assert_eq!(part1.id(), Some("part1"));
    assert_eq!(part1.parent().map(|p| p.handle()), Some(part2));
    assert_eq!(store.substore(part2)?.resources().count(), 1);
    assert_eq!(part1.resources().count(), 1);
    let part1 = part1.handle();

    //including a nested store again directly yields the existing substore
    let again = store.add_substore("part1.json", &TestLoader)?;
    assert_eq!(again, part1);
    assert_eq!(store.annotations_len(true), 2);
    Ok(())
}

#[test]
fn substore_cycle() -> Result<(), StamError> {
    let mut store = root()?;
    let result = store.add_substore("cycle.json", &TestLoader);
    assert!(matches!(result, Err(StamError::CyclicSubStoreError(..))));
    let result = store.add_substore("root.json", &TestLoader);
    assert!(matches!(result, Err(StamError::CyclicSubStoreError(..))));
    assert_eq!(store.substores_len(true), 0);
    assert_eq!(store.annotations_len(true), 1);
    Ok(())
}

#[test]
fn substore_shared_resource() -> Result<(), StamError> {
    let mut store = root()?;
    let part1 = store.add_substore("part1.json", &TestLoader)?;
    let part3 = store.add_substore("part3.json", &TestLoader)?;
    assert_eq!(store.resources_len(true), 2);
    let resource = store.resource("testres")?;
    let substores: Vec<_> = resource.substores().map(|s| s.handle()).collect();
    assert_eq!(substores, vec![part1, part3]);
    //both annotations point at the same text selection
    let a1 = store.annotation("A1")?;
    let a3 = store.annotation("A3")?;
    assert_eq!(
        a1.as_ref().textselection_handles(),
        a3.as_ref().textselection_handles()
    );
    assert_eq!(resource.textselections_len(), 1);
    Ok(())
}

#[test]
fn substore_conflict() -> Result<(), StamError> {
    let mut store = root()?;
    store.add_substore("part1.json", &TestLoader)?;
    let result = store.add_substore("conflict.json", &TestLoader);
    assert!(matches!(result, Err(StamError::DuplicateIdError(..))));
    assert_eq!(store.substores_len(true), 1);
    assert!(store.annotation("A4").is_err());
    Ok(())
}

#[test]
fn substore_nested_conflict() -> Result<(), StamError> {
    let mut store = root()?;
    store.add_substore("part1.json", &TestLoader)?;
    let before = (store.substores_len(true), store.annotations_len(true));
    //nesting.json includes a different file whose store has the ID part1 as well
    let result = store.add_substore("nesting.json", &TestLoader);
    assert!(matches!(result, Err(StamError::DuplicateIdError(..))));
    assert_eq!(
        (store.substores_len(true), store.annotations_len(true)),
        before
    );
    assert!(store.annotation("A5").is_err());
    assert_eq!(
        store.substores().map(|s| s.id()).collect::<Vec<_>>(),
        vec![Some("part1")]
    );
    Ok(())
}

#[test]
fn substore_from_store() -> Result<(), StamError> {
    let mut store = root()?;
    let handle = store.add_substore_from_store("inline.json", setup_example_3()?)?;
    assert_eq!(store.substore(handle)?.annotations_len(), 2);
    let word = store.annotation("sentence2word2")?;
    assert_eq!(word.text_simple(), Some("am"));
    assert_eq!(
        word.annotations_in_targets()[0].id(),
        Some("sentence2")
    );
    assert_eq!(store.substore(handle)?.datasets().count(), 0);
    assert_eq!(store.annotations_len(false), 1);
    Ok(())
}
