/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

#![cfg(test)]
use crate::*;

fn hello_world(config: Config) -> Result<AnnotationStore, StamError> {
    AnnotationStore::new(config)
        .with_id("test")
        .with_resource(
            TextResourceBuilder::new()
                .with_id("testres")
                .with_text("Hello world"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("A1")
                .with_target(SelectorBuilder::textselector("testres", Offset::simple(6, 11)))
                .with_data("testdataset", "pos", "noun"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_id("A2")
                .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 5)))
                .with_data("testdataset", "pos", "interjection"),
        )
}

#[test]
fn config_from_json() {
    let config = Config::from_json_str(r#"{ "textrelationmap": false, "debug": true }"#).unwrap();
    assert!(!config.textrelationmap());
    assert!(config.debug());
    //unspecified fields keep their defaults
    assert!(config.annotation_annotation_map());
    assert_eq!(config.milestone_interval(), 100);
}

#[test]
fn config_from_json_invalid() {
    let err = Config::from_json_str(r#"{ "textrelationmap": "yes" }"#).unwrap_err();
    assert!(matches!(err, StamError::JsonError(..)));
}

#[test]
fn cyclic_selector() -> Result<(), StamError> {
    let mut store = hello_world(Config::default())?.with_annotation(
        AnnotationBuilder::new()
            .with_id("A3")
            .with_target(SelectorBuilder::annotationselector("A1", None)),
    )?;
    let a1 = store.annotation("A1")?.handle();
    let a3 = store.annotation("A3")?.handle();

    //the builders can not express a cycle, so we introduce one behind the store's back
    let annotation: &mut Annotation = store.get_mut(&BuildItem::Handle(a1))?;
    *annotation.target_mut() = Selector::AnnotationSelector(a3, None);

    let annotation: &Annotation = store.get(&BuildItem::Handle(a1))?;
    let target = annotation.target().clone();
    let result = store.textselections_by_selector(&target, &mut vec![a1]);
    assert!(matches!(result, Err(StamError::CyclicSelectorError(..))));
    Ok(())
}

#[test]
fn relative_offset_across_composite() -> Result<(), StamError> {
    let store = hello_world(Config::default())?;
    let a1 = store.annotation("A1")?.handle();
    let a2 = store.annotation("A2")?.handle();
    //the concatenated text of the composite is "Helloworld", in textual order
    let selector = Selector::AnnotationSelector(a1, None);
    let composite = Selector::CompositeSelector(vec![selector, Selector::AnnotationSelector(a2, None)]);
    let textselections = store.textselections_by_selector(&composite, &mut Vec::new())?;
    assert_eq!(textselections.len(), 2);
    assert_eq!(textselections[0].1.begin(), 0);
    assert_eq!(textselections[1].1.begin(), 6);

    let parts = store.apply_relative_offset(&textselections, &Offset::simple(3, 8))?;
    assert_eq!(parts.len(), 2);
    assert_eq!((parts[0].1.begin(), parts[0].1.end()), (3, 5));
    assert_eq!((parts[1].1.begin(), parts[1].1.end()), (6, 9));
    Ok(())
}

#[test]
fn relative_offset_out_of_bounds() -> Result<(), StamError> {
    let store = hello_world(Config::default())?;
    let a1 = store.annotation("A1")?.handle();
    let textselections =
        store.textselections_by_selector(&Selector::AnnotationSelector(a1, None), &mut Vec::new())?;
    assert!(store
        .apply_relative_offset(&textselections, &Offset::simple(2, 6))
        .is_err());
    Ok(())
}

#[test]
fn compress_annotation_ranges() {
    let selectors = Selector::compress(vec![
        Selector::AnnotationSelector(AnnotationHandle::new(0), None),
        Selector::AnnotationSelector(AnnotationHandle::new(1), None),
        Selector::AnnotationSelector(AnnotationHandle::new(2), None),
        Selector::AnnotationSelector(AnnotationHandle::new(4), None),
    ]);
    assert_eq!(selectors.len(), 2);
    assert_eq!(
        selectors[0],
        Selector::RangedAnnotationSelector {
            begin: AnnotationHandle::new(0),
            end: AnnotationHandle::new(2)
        }
    );
    let composite = Selector::CompositeSelector(selectors);
    assert_eq!(composite.len(), 4);
    let handles: Vec<_> = composite
        .leaves()
        .iter()
        .filter_map(|selector| selector.annotation_handle())
        .collect();
    assert_eq!(
        handles,
        vec![
            AnnotationHandle::new(0),
            AnnotationHandle::new(1),
            AnnotationHandle::new(2),
            AnnotationHandle::new(4)
        ]
    );
}

#[test]
fn lookups_without_indices() -> Result<(), StamError> {
    let indexed = hello_world(Config::default())?;
    let unindexed = hello_world(
        Config::default()
            .with_textrelationmap(false)
            .with_resource_annotation_map(false)
            .with_dataset_annotation_map(false)
            .with_annotation_annotation_map(false),
    )?;
    for store in [&indexed, &unindexed] {
        let resource = store.resource("testres")?;
        let handle = resource.handle();
        let mut annotations = store.annotations_by_resource_handle(handle);
        annotations.sort_unstable();
        assert_eq!(annotations.len(), 2);
        for textselection in resource.textselections() {
            let found = store.annotations_by_textselection_handle(
                handle,
                textselection.handle().expect("bound"),
            );
            assert_eq!(found.len(), 1);
        }
        assert!(store.annotations_by_resource_metadata(handle).is_empty());
    }
    Ok(())
}

#[test]
fn textselection_deduplicated() -> Result<(), StamError> {
    let store = hello_world(Config::default())?.with_annotation(
        AnnotationBuilder::new()
            .with_id("A3")
            .with_target(SelectorBuilder::textselector("testres", Offset::simple(6, 11)))
            .with_data("testdataset", "type", "word"),
    )?;
    let resource = store.resource("testres")?;
    //A1 and A3 share a single text selection
    assert_eq!(resource.textselections_len(), 2);
    let a1 = store.annotation("A1")?;
    let a3 = store.annotation("A3")?;
    assert_eq!(
        a1.as_ref().textselection_handles(),
        a3.as_ref().textselection_handles()
    );
    Ok(())
}

#[test]
fn shared_resource_text() {
    let resource = TextResource::from_string("testres", "Hello world", Config::default());
    let shared = resource.share(Config::default().with_debug(true));
    assert_eq!(shared.id(), Some("testres"));
    assert!(std::ptr::eq(resource.text(), shared.text()));
    assert_eq!(shared.textlen(), 11);
}
