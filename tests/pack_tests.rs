use lore::artifacts::objects::object_id::ObjectId;
use lore::artifacts::objects::object_type::ObjectType;
use lore::artifacts::pack::index::PackIndex;
use pretty_assertions::assert_eq;
use sha1::{Digest, Sha1};

mod common;
use common::fixture::{
    delta_copy, delta_insert, delta_payload, object_id_of, write_index, PackBuilder, RepoFixture,
};

#[test]
fn reads_non_delta_object_from_pack() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = RepoFixture::new();
    let mut builder = PackBuilder::new();
    builder.add("blob", b"foo");
    builder.write(&fixture.pack_dir(), "pack-1");
    let store = fixture.store();

    let id = object_id_of("blob", b"foo");
    let object = store.read(&id, false)?;
    assert_eq!(object.object_type, ObjectType::Blob);
    assert_eq!(object.length, 3);
    assert_eq!(&object.into_bytes()?[..], b"foo");

    let object = store.read(&id, true)?;
    assert_eq!(object.length, 3);
    assert!(object.content.is_none());

    Ok(())
}

#[test]
fn offset_delta_applies_on_top_of_its_base() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = RepoFixture::new();
    let result_id = object_id_of("blob", b"ABCDXY");

    let mut builder = PackBuilder::new();
    let base = builder.add("blob", b"ABCDEFGH");
    let delta = delta_payload(8, 6, &[delta_copy(0, 4), delta_insert(b"XY")]);
    builder.add_offset_delta(base, delta, result_id);
    builder.write(&fixture.pack_dir(), "pack-1");
    let store = fixture.store();

    let object = store.read(&result_id, false)?;
    assert_eq!(object.object_type, ObjectType::Blob);
    assert_eq!(object.length, 6);
    assert_eq!(&object.into_bytes()?[..], b"ABCDXY");

    // size-only resolves the result length without applying the delta
    let object = store.read(&result_id, true)?;
    assert_eq!(object.length, 6);
    assert!(object.content.is_none());

    Ok(())
}

#[test]
fn ref_delta_selects_its_base_by_id() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = RepoFixture::new();
    let base_id = object_id_of("blob", b"ABCDEFGH");
    let result_id = object_id_of("blob", b"ABCDXY");

    let mut builder = PackBuilder::new();
    builder.add("blob", b"ABCDEFGH");
    let delta = delta_payload(8, 6, &[delta_copy(0, 4), delta_insert(b"XY")]);
    builder.add_ref_delta(base_id, delta, result_id);
    builder.write(&fixture.pack_dir(), "pack-1");
    let store = fixture.store();

    let object = store.read(&result_id, false)?;
    assert_eq!(object.object_type, ObjectType::Blob);
    assert_eq!(&object.into_bytes()?[..], b"ABCDXY");

    Ok(())
}

#[test]
fn ref_delta_with_absent_base_fails() {
    let fixture = RepoFixture::new();
    let ghost = ObjectId::try_parse("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef").unwrap();
    let result_id = object_id_of("blob", b"whatever");

    let mut builder = PackBuilder::new();
    builder.add("blob", b"unrelated");
    let delta = delta_payload(8, 8, &[delta_insert(b"whatever")]);
    builder.add_ref_delta(ghost, delta, result_id);
    builder.write(&fixture.pack_dir(), "pack-1");
    let store = fixture.store();

    let err = store.read(&result_id, false).unwrap_err();

    assert!(err.to_string().contains("not present in the pack index"));
}

#[test]
fn delta_chains_resolve_to_the_base_type() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = RepoFixture::new();
    let middle_id = object_id_of("blob", b"ABCDXY");
    let tip_id = object_id_of("blob", b"XYZ");

    let mut builder = PackBuilder::new();
    let base = builder.add("blob", b"ABCDEFGH");
    let first = delta_payload(8, 6, &[delta_copy(0, 4), delta_insert(b"XY")]);
    let middle = builder.add_offset_delta(base, first, middle_id);
    // the second delta's base is itself a delta entry
    let second = delta_payload(6, 3, &[delta_copy(4, 2), delta_insert(b"Z")]);
    builder.add_offset_delta(middle, second, tip_id);
    builder.write(&fixture.pack_dir(), "pack-1");
    let store = fixture.store();

    let object = store.read(&tip_id, false)?;
    assert_eq!(object.object_type, ObjectType::Blob);
    assert_eq!(&object.into_bytes()?[..], b"XYZ");

    Ok(())
}

#[test]
fn index_resolves_offsets_through_the_64_bit_table() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = RepoFixture::new();
    let mut builder = PackBuilder::new();
    builder.add("blob", b"foo");
    builder.add("blob", b"a longer second object");
    let entries = builder.write_with_large_offsets(&fixture.pack_dir(), "pack-1");

    let index = PackIndex::open(&fixture.pack_dir().join("pack-1.idx"))?;
    for (id, offset) in &entries {
        assert_eq!(index.offset_of(id), Some(*offset));
    }

    // reads go through the redirected offsets end to end
    let store = fixture.store();
    let object = store.read(&object_id_of("blob", b"foo"), false)?;
    assert_eq!(&object.into_bytes()?[..], b"foo");

    Ok(())
}

#[test]
fn every_indexed_id_reads_back_from_its_pack() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = RepoFixture::new();
    let blob = fixture.write_blob("workspace file");
    let tree_payload = common::fixture::tree_payload(&[("100644", "file.txt", blob)]);

    let mut builder = PackBuilder::new();
    builder.add("blob", b"packed content");
    builder.add("tree", &tree_payload);
    builder.add(
        "commit",
        &common::fixture::commit_payload(object_id_of("tree", &tree_payload), &[], 1_700_000_000, "packed"),
    );
    builder.write(&fixture.pack_dir(), "pack-1");
    let store = fixture.store();

    let index = PackIndex::open(&fixture.pack_dir().join("pack-1.idx"))?;
    assert_eq!(index.object_count(), 3);

    for (id, _) in index.entries() {
        let id = *id;
        let object = store.read(&id, false)?;
        let (kind, payload) = match object.object_type {
            ObjectType::Blob => ("blob", object.into_bytes()?),
            ObjectType::Tree => ("tree", object.into_bytes()?),
            ObjectType::Commit => ("commit", object.into_bytes()?),
            other => panic!("Unexpected object type {other}"),
        };

        assert_eq!(object_id_of(kind, &payload), id);
    }

    Ok(())
}

#[test]
fn index_checksum_mismatch_is_fatal() {
    let fixture = RepoFixture::new();
    let mut builder = PackBuilder::new();
    builder.add("blob", b"foo");
    builder.write(&fixture.pack_dir(), "pack-1");

    // flip one byte in the id table; the trailer no longer matches
    let idx_path = fixture.pack_dir().join("pack-1.idx");
    let mut content = std::fs::read(&idx_path).unwrap();
    content[8 + 1024 + 3] ^= 0xFF;
    std::fs::write(&idx_path, content).unwrap();

    let err = PackIndex::open(&idx_path).unwrap_err();

    assert!(err.to_string().contains("checksum"));
}

#[test]
fn index_with_bad_magic_or_version_is_rejected() {
    let fixture = RepoFixture::new();
    let mut builder = PackBuilder::new();
    builder.add("blob", b"foo");
    builder.write(&fixture.pack_dir(), "pack-1");
    let idx_path = fixture.pack_dir().join("pack-1.idx");
    let pristine = std::fs::read(&idx_path).unwrap();

    let mut bad_magic = pristine.clone();
    bad_magic[0] = 0x00;
    std::fs::write(&idx_path, &bad_magic).unwrap();
    assert!(PackIndex::open(&idx_path)
        .unwrap_err()
        .to_string()
        .contains("magic"));

    let mut bad_version = pristine;
    bad_version[7] = 3;
    std::fs::write(&idx_path, &bad_version).unwrap();
    assert!(PackIndex::open(&idx_path)
        .unwrap_err()
        .to_string()
        .contains("version 2"));
}

#[test]
fn index_without_its_pack_sibling_is_rejected() {
    let fixture = RepoFixture::new();
    let mut builder = PackBuilder::new();
    builder.add("blob", b"foo");
    let entries = builder.write(&fixture.pack_dir(), "pack-1");

    // keep the index, lose the pack
    let pack_path = fixture.pack_dir().join("pack-1.pack");
    std::fs::remove_file(&pack_path).unwrap();

    let err = PackIndex::open(&fixture.pack_dir().join("pack-1.idx")).unwrap_err();
    assert!(err.to_string().contains("Missing pack file"));
    assert_eq!(entries.len(), 1);
}

#[test]
fn pack_with_wrong_version_is_rejected() {
    let fixture = RepoFixture::new();
    let mut builder = PackBuilder::new();
    builder.add("blob", b"foo");
    builder.write(&fixture.pack_dir(), "pack-1");

    let pack_path = fixture.pack_dir().join("pack-1.pack");
    let mut content = std::fs::read(&pack_path).unwrap();
    content[7] = 3;
    std::fs::write(&pack_path, content).unwrap();

    let err = PackIndex::open(&fixture.pack_dir().join("pack-1.idx")).unwrap_err();

    assert!(err.to_string().contains("version 2 pack file"));
}

#[test]
fn truncated_index_is_rejected() {
    let fixture = RepoFixture::new();
    let mut builder = PackBuilder::new();
    builder.add("blob", b"foo");
    builder.write(&fixture.pack_dir(), "pack-1");

    let idx_path = fixture.pack_dir().join("pack-1.idx");
    let content = std::fs::read(&idx_path).unwrap();
    std::fs::write(&idx_path, &content[..content.len() - 25]).unwrap();

    assert!(PackIndex::open(&idx_path).is_err());
}

#[test]
fn out_of_range_large_offset_slot_is_fatal() {
    let fixture = RepoFixture::new();
    let mut builder = PackBuilder::new();
    builder.add("blob", b"foo");
    let entries = builder.write(&fixture.pack_dir(), "pack-1");

    // rewrite the index with a 31-bit slot pointing past the 64-bit table
    let pack_content = std::fs::read(fixture.pack_dir().join("pack-1.pack")).unwrap();
    let pack_digest = &pack_content[pack_content.len() - 20..];
    let forged: Vec<(ObjectId, u64)> = entries
        .iter()
        .map(|(id, _)| (*id, u64::MAX)) // large, but the table stays empty
        .collect();
    let idx_path = fixture.pack_dir().join("pack-1.idx");
    write_index(&fixture.pack_dir(), "pack-1", &forged, pack_digest, false);

    // drop the 64-bit table, leaving the redirecting slot dangling
    let content = std::fs::read(&idx_path).unwrap();
    let mut truncated = content[..content.len() - 48].to_vec();
    truncated.extend_from_slice(pack_digest);
    let digest = Sha1::digest(&truncated);
    truncated.extend_from_slice(&digest);
    std::fs::write(&idx_path, truncated).unwrap();

    let err = PackIndex::open(&idx_path).unwrap_err();

    assert!(err.to_string().contains("out of range"));
}
