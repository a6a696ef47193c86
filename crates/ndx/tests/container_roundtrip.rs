//! End-to-end container lifecycle: build a full object graph, close,
//! reopen, and check everything resolves again.

use ndx::{
    Context, DataType, Dimension, Entity, FileMode, Named, NdArray, NdxError, NdxFile, TagKind,
    Value, WithMetadata,
};

fn build(path: &std::path::Path) -> (String, String, String) {
    let ctx = Context::deterministic(42, 1_700_000_000);
    let file = NdxFile::open_with_context(path, FileMode::ReadWrite, ctx).unwrap();

    let session = file.create_section("session", "recording").unwrap();
    session.set_repository("https://terms.example.org/v1").unwrap();
    let gain = session.add_property("gain").unwrap();
    gain.set_values(&[Value::Float64(2.5)]).unwrap();
    gain.set_unit("mV").unwrap();
    let subject = session.add_section("subject", "animal").unwrap();
    subject
        .add_property("species")
        .unwrap()
        .set_values(&[Value::Str("mus musculus".to_owned())])
        .unwrap();

    let block = file.create_block("trial-1", "ephys").unwrap();
    block.set_metadata(&session).unwrap();

    let array = block.create_data_array("voltage", "analog").unwrap();
    let mut payload = NdArray::allocate(DataType::Float64, vec![100, 2]).unwrap();
    payload.set(&[99, 1], &Value::Float64(-70.0)).unwrap();
    array.set_payload(payload).unwrap();
    array
        .append_sampled_dimension(0.0, 0.001, Some("s".to_owned()))
        .unwrap();
    array
        .append_set_dimension(vec!["ch1".to_owned(), "ch2".to_owned()])
        .unwrap();

    let tag = block
        .create_data_tag("stim", "epoch", vec![10.0, 0.0], vec![20.0, 2.0])
        .unwrap();
    tag.add_reference(&array.id().unwrap()).unwrap();

    let ids = (
        block.id().unwrap(),
        session.id().unwrap(),
        array.id().unwrap(),
    );
    file.close().unwrap();
    file.close().unwrap();
    assert!(file.is_closed());
    ids
}

#[test]
fn full_graph_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("container.ndx");
    let (block_id, session_id, array_id) = build(&path);

    let file = NdxFile::open(&path, FileMode::ReadOnly).unwrap();

    // Metadata side.
    let session = file.find_section(&session_id).unwrap();
    assert_eq!(session.name().unwrap(), "session");
    assert_eq!(
        session.repository().unwrap().as_deref(),
        Some("https://terms.example.org/v1")
    );
    let gain = session.get_property_by_name("gain").unwrap();
    assert_eq!(gain.values().unwrap(), vec![Value::Float64(2.5)]);
    assert_eq!(gain.unit().unwrap().as_deref(), Some("mV"));

    let subject = &session.sections().unwrap()[0];
    assert_eq!(subject.parent_id().unwrap(), Some(session_id.clone()));
    assert_eq!(
        subject
            .get_property_by_name("species")
            .unwrap()
            .values()
            .unwrap(),
        vec![Value::Str("mus musculus".to_owned())]
    );

    // Primary-data side.
    let block = file.block(&block_id).unwrap();
    assert_eq!(block.type_name().unwrap(), "ephys");
    let metadata = block.metadata().unwrap().unwrap();
    assert_eq!(metadata.id().unwrap(), session_id);

    let array = block.data_array(&array_id).unwrap();
    let payload = array.payload().unwrap().unwrap();
    assert_eq!(payload.extents(), &[100, 2]);
    assert_eq!(payload.get(&[99, 1]).unwrap(), Value::Float64(-70.0));
    assert_eq!(payload.get(&[0, 0]).unwrap(), Value::Float64(0.0));

    let dims = array.dimensions().unwrap();
    assert_eq!(dims.len(), 2);
    assert_eq!(
        dims[0],
        Dimension::Sampled {
            offset: 0.0,
            interval: 0.001,
            unit: Some("s".to_owned()),
        }
    );
    assert_eq!(dims[1].labels().unwrap(), &["ch1", "ch2"]);

    let tags = block.tags().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].kind().unwrap(), TagKind::Data);
    assert_eq!(tags[0].position().unwrap(), vec![10.0, 0.0]);
    assert_eq!(tags[0].extent().unwrap(), vec![20.0, 2.0]);
    let referenced = tags[0].referenced_arrays().unwrap();
    assert_eq!(referenced[0].id().unwrap(), array_id);

    file.close().unwrap();
}

#[test]
fn reopened_container_is_writable_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("container.ndx");
    let (_, session_id, _) = build(&path);

    let file = NdxFile::open(&path, FileMode::ReadWrite).unwrap();
    let session = file.find_section(&session_id).unwrap();
    let offset = session.add_property("offset").unwrap();
    offset.set_values(&[Value::Int64(-3)]).unwrap();
    file.close().unwrap();

    let file = NdxFile::open(&path, FileMode::ReadOnly).unwrap();
    let session = file.find_section(&session_id).unwrap();
    assert_eq!(session.property_count().unwrap(), 2);
    assert_eq!(
        session
            .get_property_by_name("offset")
            .unwrap()
            .values()
            .unwrap(),
        vec![Value::Int64(-3)]
    );
}

#[test]
fn read_only_container_rejects_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("container.ndx");
    let (block_id, session_id, _) = build(&path);

    let file = NdxFile::open(&path, FileMode::ReadOnly).unwrap();
    let err = file.create_block("b", "t").unwrap_err();
    assert!(matches!(err, NdxError::ReadOnly));

    let session = file.find_section(&session_id).unwrap();
    let err = session.add_property("p").unwrap_err();
    assert!(matches!(err, NdxError::ReadOnly));

    let block = file.block(&block_id).unwrap();
    let err = block.create_data_array("a", "t").unwrap_err();
    assert!(matches!(err, NdxError::ReadOnly));
}

#[test]
fn operations_after_close_fail_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("container.ndx");
    let file = NdxFile::open(&path, FileMode::ReadWrite).unwrap();
    let block = file.create_block("trial-1", "ephys").unwrap();
    file.close().unwrap();

    assert!(matches!(file.blocks().unwrap_err(), NdxError::Closed));
    assert!(matches!(block.name().unwrap_err(), NdxError::Closed));
    assert!(matches!(
        file.create_block("b", "t").unwrap_err(),
        NdxError::Closed
    ));
    // Close stays idempotent even after failures.
    file.close().unwrap();
}

#[test]
fn links_and_relationship_search_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("container.ndx");
    let (base_id, leaf_id);
    {
        let file = NdxFile::open(&path, FileMode::ReadWrite).unwrap();
        let base = file.create_section("base", "recording").unwrap();
        base.add_property("gain")
            .unwrap()
            .set_values(&[Value::Float64(1.0)])
            .unwrap();
        let root = file.create_section("root", "experiment").unwrap();
        let leaf = root.add_section("leaf", "recording").unwrap();
        leaf.set_link(&base.id().unwrap()).unwrap();
        base_id = base.id().unwrap();
        leaf_id = leaf.id().unwrap();
        file.close().unwrap();
    }

    let file = NdxFile::open(&path, FileMode::ReadOnly).unwrap();
    let leaf = file.find_section(&leaf_id).unwrap();
    assert_eq!(leaf.link_id().unwrap(), Some(base_id));
    let inherited = leaf.inherited_properties().unwrap();
    assert_eq!(inherited.len(), 1);
    assert_eq!(inherited[0].name().unwrap(), "gain");

    // Upstream search still resolves through the reopened file.
    let related = leaf.get_related_sections("experiment").unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].name().unwrap(), "root");
}
