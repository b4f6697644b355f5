mod common;
use crate::common::*;

use stam::*;

#[test]
fn store_instantiation_naive() -> Result<(), StamError> {
    let mut store = AnnotationStore::default().with_id("test");

    let _res_intid = store.insert(TextResource::from_string(
        "testres",
        "Hello world",
        Config::default(),
    ));

    let mut dataset = AnnotationDataSet::new(Config::default()).with_id("testdataset");
    dataset.insert(DataKey::new("pos"))?;
    store.insert(dataset)?;

    Ok(())
}

#[test]
fn store_sanity_check() -> Result<(), StamError> {
    // Instantiate the store
    let mut store = AnnotationStore::default().with_id("test");

    // Insert a text resource into the store
    let res_handle = store.insert(TextResource::from_string(
        "testres",
        "Hello world",
        Config::default(),
    ))?;

    // Create a dataset with one key and insert it into the store
    let mut dataset = AnnotationDataSet::new(Config::default()).with_id("testdataset");
    dataset.insert(DataKey::new("pos"))?;
    let set_handle = store.insert(dataset)?;

    //get by handle (internal id)
    let dataset: &AnnotationDataSet = store.get(&set_handle.into())?;
    assert_eq!(dataset.id(), Some("testdataset"));
    assert_eq!(dataset.handle(), Some(set_handle));

    //get by directly by id
    let resource: &TextResource = store.get(&"testres".into())?;
    assert_eq!(resource.id(), Some("testres"));
    assert_eq!(resource.handle(), Some(res_handle));
    assert_eq!(resource.text(), "Hello world");
    Ok(())
}

#[test]
fn resolve_id() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let handle = <AnnotationStore as StoreFor<TextResource>>::resolve_id(&store, "testres")?;
    let resource: &TextResource = store.get(&handle.into())?;
    assert_eq!(resource.id(), Some("testres"));
    let handle = <AnnotationStore as StoreFor<Annotation>>::resolve_id(&store, "Word")?;
    assert_eq!(handle.as_usize(), 2);
    let result = <AnnotationStore as StoreFor<Annotation>>::resolve_id(&store, "nonexistent");
    assert!(matches!(result, Err(StamError::IdNotFoundError(..))));
    Ok(())
}

#[test]
fn handle_out_of_range() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let result: Result<&Annotation, StamError> =
        store.get(&BuildItem::Handle(AnnotationHandle::new(99)));
    assert!(matches!(result, Err(StamError::HandleError(..))));
    assert!(store.annotation(AnnotationHandle::new(99)).is_err());
    Ok(())
}

#[test]
fn insert_duplicate_id() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    //an identical item is accepted and yields the existing handle
    let handle = store.insert(TextResource::from_string(
        "testres",
        "Hello world",
        Config::default(),
    ))?;
    assert_eq!(handle, store.resource("testres")?.handle());
    let result = store.insert(TextResource::from_string(
        "testres",
        "Something else",
        Config::default(),
    ));
    assert!(matches!(result, Err(StamError::DuplicateIdError(..))));
    assert_eq!(store.resources_len(true), 1);
    Ok(())
}

#[test]
fn dataset_insert_data() -> Result<(), StamError> {
    let mut dataset = AnnotationDataSet::new(Config::default()).with_id("testdataset");
    let first = dataset.insert_data(BuildItem::None, "pos".into(), "noun".into())?;
    //same key and value, so the same data
    let second = dataset.insert_data(BuildItem::None, "pos".into(), "noun".into())?;
    assert_eq!(first, second);
    //an id can be registered on existing data
    let third = dataset.insert_data("D1".into(), "pos".into(), "noun".into())?;
    assert_eq!(first, third);
    assert_eq!(dataset.resolve_data_id("D1")?, first);
    //a different value under an existing id is refused
    let result = dataset.insert_data("D1".into(), "pos".into(), "verb".into());
    assert!(matches!(result, Err(StamError::DuplicateIdError(..))));
    let fourth = dataset.insert_data(BuildItem::None, "pos".into(), DataValue::Int(1))?;
    assert_ne!(first, fourth);
    assert_eq!(dataset.data_len(), 2);
    assert_eq!(dataset.keys_len(), 1);
    let key = dataset.resolve_key_id("pos")?;
    assert_eq!(dataset.data_by_key(key).map(|v| v.len()), Some(2));
    assert!(dataset.data_by_value(key, &DataValue::Int(1)).is_some());
    Ok(())
}

#[test]
fn annotation_lowlevel() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let annotation: &Annotation = store.get(&"A1".into())?;
    assert_eq!(annotation.len(), 1);
    assert_eq!(annotation.textselection_handles().len(), 1);
    assert!(matches!(annotation.target(), Selector::TextSelector(..)));
    let (set, data) = *annotation.data().next().expect("annotation has data");
    assert!(annotation.has_data(set, data));
    let dataset: &AnnotationDataSet = store.get(&set.into())?;
    let annotationdata: &AnnotationData = dataset.get(&data.into())?;
    assert_eq!(annotationdata.value(), &DataValue::from("noun"));
    Ok(())
}

#[test]
fn remove_annotation_cascades() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    //Word references A1, so it goes along with it
    store.remove_annotation("A1")?;
    assert!(store.annotation("A1").is_err());
    assert!(store.annotation("Word").is_err());
    assert!(store.annotation("A2").is_ok());
    assert_eq!(store.annotations_len(true), 1);
    //the orphaned text selection is gone, the one still used by A2 stays
    let resource = store.resource("testres")?;
    assert_eq!(resource.textselections_len(), 1);
    assert!(resource.find_text("world").all(|ts| !ts.is_bound()));
    //the data remains, but is no longer used by A1
    let data = store.annotationdata("testdataset", "D1")?;
    assert_eq!(data.annotations_len(), 0);
    Ok(())
}

#[test]
fn remove_annotation_unreferenced() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    store.remove_annotation("Word")?;
    assert_eq!(store.annotations_len(true), 2);
    assert_eq!(store.annotation("A1")?.annotations().count(), 0);
    let resource = store.resource("testres")?;
    assert_eq!(resource.textselections_len(), 2);
    Ok(())
}

#[test]
fn remove_lowlevel_in_use() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    let handle = store.resource("testres")?.handle();
    let result = <AnnotationStore as StoreFor<TextResource>>::remove(&mut store, handle);
    assert!(matches!(result, Err(StamError::InUse(..))));
    let handle = store.annotation("A1")?.handle();
    let result = <AnnotationStore as StoreFor<Annotation>>::remove(&mut store, handle);
    assert!(matches!(result, Err(StamError::InUse(..))));
    assert_eq!(store.annotations_len(true), 3);
    Ok(())
}

#[test]
fn remove_resource_cascades() -> Result<(), StamError> {
    let mut store = setup_example_2()?.with_annotation(
        AnnotationBuilder::new()
            .with_id("Meta")
            .with_target(SelectorBuilder::resourceselector("testres"))
            .with_data("metadata", "author", "proycon"),
    )?;
    store.remove_resource("testres")?;
    assert!(store.resource("testres").unwrap_err().is_not_found());
    assert_eq!(store.annotations_len(true), 0);
    assert_eq!(store.resources_len(true), 0);
    //datasets are left alone
    assert_eq!(store.datasets_len(true), 2);
    Ok(())
}

#[test]
fn remove_dataset_cascades() -> Result<(), StamError> {
    let mut store = setup_example_2()?.with_annotation(
        AnnotationBuilder::new()
            .with_id("Other")
            .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 11)))
            .with_data("otherdataset", "type", "sentence"),
    )?;
    store.remove_dataset("testdataset")?;
    assert!(store.dataset("testdataset").unwrap_err().is_not_found());
    assert!(store.annotation("A1").unwrap_err().is_not_found());
    assert!(store.annotation("Word").is_err());
    assert!(store.annotation("Other").is_ok());
    assert_eq!(store.annotations_len(true), 1);
    Ok(())
}

#[test]
fn remove_data_in_use() -> Result<(), StamError> {
    let mut store = setup_example_2()?;
    for strict in [false, true] {
        let result = store.remove_data("testdataset", "D1", strict);
        assert!(matches!(result, Err(StamError::InUse(..))));
        let result = store.remove_key("testdataset", "pos", strict);
        assert!(matches!(result, Err(StamError::InUse(..))));
    }
    assert!(store.annotationdata("testdataset", "D1").is_ok());

    store.remove_annotation("A1")?;
    store.remove_data("testdataset", "D1", true)?;
    assert!(store.annotationdata("testdataset", "D1").is_err());
    assert!(store.annotation("A2").is_ok());
    Ok(())
}

#[test]
fn remove_key_unused() -> Result<(), StamError> {
    let mut store = setup_example_1()?.with_dataset(
        AnnotationDataSetBuilder::new()
            .with_id("otherdataset")
            .with_data("lemma", "hello")
            .with_data("lemma", "world"),
    )?;
    assert_eq!(store.dataset("otherdataset")?.data_len(), 2);
    store.remove_key("otherdataset", "lemma", false)?;
    let dataset = store.dataset("otherdataset")?;
    assert_eq!(dataset.data_len(), 0);
    assert_eq!(dataset.keys_len(), 0);
    assert!(dataset.key("lemma").is_err());
    Ok(())
}

#[test]
fn remove_data_with_alias_id() -> Result<(), StamError> {
    let mut store = setup_example_1()?.with_dataset(
        AnnotationDataSetBuilder::new()
            .with_id("otherdataset")
            .with_key_value_id("lemma", "hello", "L1")
            .with_key_value_id("lemma", "hello", "L2"),
    )?;
    {
        let dataset = store.dataset("otherdataset")?;
        assert_eq!(dataset.data_len(), 1);
        assert_eq!(
            dataset.annotationdata("L2")?.handle(),
            dataset.annotationdata("L1")?.handle()
        );
    }
    store.remove_data("otherdataset", "L1", true)?;
    let dataset = store.dataset("otherdataset")?;
    assert_eq!(dataset.data_len(), 0);
    //both the primary id and the alias are gone
    assert!(matches!(
        dataset.annotationdata("L1"),
        Err(StamError::IdNotFoundError(..))
    ));
    assert!(matches!(
        dataset.annotationdata("L2"),
        Err(StamError::IdNotFoundError(..))
    ));
    Ok(())
}

#[test]
fn annotate_incomplete() -> Result<(), StamError> {
    let mut store = setup_example_1()?;
    let result = store.annotate(AnnotationBuilder::new().with_id("A2"));
    assert!(matches!(result, Err(StamError::IncompleteError(..))));
    //an existing data id with a different value
    let result = store.annotate(
        AnnotationBuilder::new()
            .with_id("A2")
            .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 5)))
            .with_data_with_id("testdataset", "pos", "verb", "D1"),
    );
    assert!(matches!(result, Err(StamError::DuplicateIdError(..))));
    assert_eq!(store.annotations_len(true), 1);
    assert_eq!(store.dataset("testdataset")?.data_len(), 1);
    Ok(())
}

#[test]
fn generated_ids() -> Result<(), StamError> {
    let store = AnnotationStore::new(Config::default().with_generate_ids(true))
        .with_resource(
            TextResourceBuilder::new()
                .with_id("testres")
                .with_text("Hello world"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 5)))
                .with_data("testdataset", "pos", "interjection"),
        )?;
    let annotation = store.annotations().next().expect("one annotation");
    let id = annotation.id().expect("id was generated");
    assert!(!id.is_empty());
    assert_eq!(store.annotation(id)?.handle(), annotation.handle());
    Ok(())
}

#[test]
fn no_generated_ids() -> Result<(), StamError> {
    let store = AnnotationStore::new(Config::default().with_generate_ids(false))
        .with_resource(
            TextResourceBuilder::new()
                .with_id("testres")
                .with_text("Hello world"),
        )?
        .with_annotation(
            AnnotationBuilder::new()
                .with_target(SelectorBuilder::textselector("testres", Offset::simple(0, 5))),
        )?;
    let annotation = store.annotations().next().expect("one annotation");
    assert_eq!(annotation.id(), None);
    Ok(())
}

#[test]
fn utf8_offsets() -> Result<(), StamError> {
    let resource = TextResourceBuilder::new()
        .with_id("testres")
        .with_text("Héllo wörld")
        .build(Config::default())?;
    assert_eq!(resource.textlen(), 11);
    assert_eq!(resource.utf8byte(0)?, 0);
    assert_eq!(resource.utf8byte(2)?, 3);
    assert_eq!(resource.utf8byte(11)?, 13);
    assert!(resource.utf8byte(12).is_err());
    assert_eq!(resource.utf8byte_to_charpos(3)?, 2);
    //not on a character boundary
    assert!(resource.utf8byte_to_charpos(2).is_err());
    let textselection = resource.textselection_by_offset(&Offset::simple(6, 11))?;
    assert_eq!((textselection.begin(), textselection.end()), (6, 11));
    assert_eq!(
        resource.beginaligned_cursor(&Cursor::EndAligned(-5))?,
        6
    );
    assert!(resource.beginaligned_cursor(&Cursor::EndAligned(-12)).is_err());
    Ok(())
}

#[test]
fn position_index() -> Result<(), StamError> {
    let store = setup_example_humanrights()?;
    let resource: &TextResource = store.get(&"humanrights".into())?;
    let index = resource.positionindex();
    assert_eq!(index.len(), 2);
    let at_zero: Vec<_> = index.at(0).collect();
    assert_eq!(at_zero.len(), 1);
    assert_eq!((at_zero[0].0, at_zero[0].1), (0, 63));
    let beginning: Vec<_> = index.beginning_in(1..).map(|(b, e, _)| (b, e)).collect();
    assert_eq!(beginning, vec![(17, 40)]);
    Ok(())
}

#[test]
fn textselectionset_operators() {
    let res = TextResourceHandle::new(0);
    let other = TextResourceHandle::new(1);
    let sentence = TextSelectionSet::single(res, TextSelection::new(0, 63));
    let phrase = TextSelectionSet::single(res, TextSelection::new(17, 40));
    let words: TextSelectionSet = [
        (res, TextSelection::new(17, 20)),
        (res, TextSelection::new(21, 25)),
    ]
    .into_iter()
    .collect();

    assert!(sentence.test_set(&TextSelectionOperator::embeds(), &phrase));
    assert!(sentence.test_set(&TextSelectionOperator::EmbedsAll, &words));
    assert!(words.test_set(&TextSelectionOperator::EmbeddedAll, &phrase));
    assert!(words.test_set(&TextSelectionOperator::SameBeginAll, &phrase));
    assert!(!words.test_set(&TextSelectionOperator::SameEndAll, &phrase));
    assert!(words.test_set(&TextSelectionOperator::InSet, &words));
    assert!(!words.test_set(&TextSelectionOperator::Equals, &phrase));
    assert!(words.test_set(&TextSelectionOperator::Equals, &words));
    assert!(!words.test_set(&TextSelectionOperator::PrecedesAll, &phrase));

    //empty sets never relate, but the negation holds
    let empty = TextSelectionSet::new();
    assert!(!empty.test_set(&TextSelectionOperator::overlaps(), &sentence));
    assert!(empty.test_set(&TextSelectionOperator::overlaps().not(), &sentence));

    //different resources never relate
    let elsewhere = TextSelectionSet::single(other, TextSelection::new(17, 40));
    assert!(!elsewhere.test_set(&TextSelectionOperator::equals(), &phrase));
    assert!(!elsewhere.test_set(&TextSelectionOperator::overlaps(), &sentence));
}

#[test]
fn textselection_adjacency() {
    let a = TextSelection::new(0, 5);
    let b = TextSelection::new(5, 9);
    let c = TextSelection::new(6, 9);
    assert!(a.test(&TextSelectionOperator::leftadjacent(), &b));
    assert!(b.test(&TextSelectionOperator::rightadjacent(), &a));
    assert!(!a.test(&TextSelectionOperator::leftadjacent(), &c));
    assert!(a.test(&TextSelectionOperator::before(), &c));
    assert!(c.test(&TextSelectionOperator::after(), &a));
    assert!(b.test(&TextSelectionOperator::sameend(), &c));
    assert!(!b.test(&TextSelectionOperator::samebegin(), &c));
    assert!(b.test(&TextSelectionOperator::samebegin().not(), &c));
}

#[test]
fn selector_kinds() -> Result<(), StamError> {
    let store = setup_example_2()?;
    let word = store.annotation("Word")?;
    let target = word.target();
    assert_eq!(target.kind(), SelectorKind::CompositeSelector);
    assert!(target.is_complex());
    assert_eq!(target.len(), 2);
    let kinds: Vec<SelectorKind> = target.iter().map(|selector| selector.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SelectorKind::AnnotationSelector,
            SelectorKind::AnnotationSelector
        ]
    );
    let selector = store.selector(SelectorBuilder::textselector("testres", Offset::simple(0, 5)))?;
    assert_eq!(selector.kind(), SelectorKind::TextSelector);
    assert!(selector.resource_handle().is_some());
    assert_eq!(selector.offset(), Some(&Offset::simple(0, 5)));
    assert!(store
        .selector(SelectorBuilder::annotationselector("nonexistent", None))
        .is_err());
    Ok(())
}
