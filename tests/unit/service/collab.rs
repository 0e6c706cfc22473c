use super::*;
use crate::model::user::UsageType;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

#[test]
fn json_dir_store_reads_templates_and_users() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "templates/t1.json",
        r#"{"frameSize": {"width": 100, "height": 200}, "mainImage": "https://x/y.png"}"#,
    );
    write(
        dir.path(),
        "users/u1.json",
        r#"{"name": "Ravi", "usageType": "Business", "phoneNumber": "555"}"#,
    );
    let store = JsonDirStore::new(dir.path());

    let t = store.get_template("t1").unwrap();
    assert_eq!((t.frame_size.width, t.frame_size.height), (100, 200));
    let u = store.get_user("u1").unwrap();
    assert_eq!(u.usage_type, UsageType::Business);
    assert_eq!(u.phone_number.as_deref(), Some("555"));
}

#[test]
fn missing_and_hostile_ids_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonDirStore::new(dir.path());
    for id in ["nope", "", "..", "../users/u1", "a/b"] {
        match store.get_template(id).unwrap_err() {
            ForgeError::NotFound { kind, .. } => assert_eq!(kind, RecordKind::Template),
            other => panic!("{id}: unexpected {other}"),
        }
    }
    assert_eq!(store.get_user("ghost").unwrap_err().kind(), "not_found");
}

#[test]
fn broken_template_document_is_invalid_template() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "templates/bad.json", r#"{"mainImage": "https://x/y.png"}"#);
    let err = JsonDirStore::new(dir.path()).get_template("bad").unwrap_err();
    match err {
        ForgeError::InvalidTemplate { field, .. } => assert_eq!(field, "frameSize"),
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn memory_store_normalizes_users() {
    let store = MemoryStore::new().with_user(
        "u",
        UserRecord {
            name: Some("  ".to_string()),
            address: Some(" 1 Road ".to_string()),
            ..UserRecord::default()
        },
    );
    let u = store.get_user("u").unwrap();
    assert_eq!(u.name, None);
    assert_eq!(u.address.as_deref(), Some("1 Road"));
    assert_eq!(store.get_template("t").unwrap_err().kind(), "not_found");
}

#[test]
fn dir_sink_writes_nested_names_and_returns_file_urls() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirUploadSink::new(dir.path());
    let url = sink
        .store(b"abc".to_vec(), "image/png", "overlay_posts/a.png")
        .unwrap();
    assert!(url.starts_with("file://"), "{url}");
    assert!(url.ends_with("overlay_posts/a.png"), "{url}");
    assert_eq!(
        std::fs::read(dir.path().join("overlay_posts/a.png")).unwrap(),
        b"abc"
    );

    let public = DirUploadSink::new(dir.path()).with_public_base_url("https://cdn.example.com/");
    assert_eq!(
        public.store(vec![1], "image/png", "b.png").unwrap(),
        "https://cdn.example.com/b.png"
    );
}

#[test]
fn dir_sink_rejects_escaping_names() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirUploadSink::new(dir.path());
    for name in ["", "/etc/passwd", "../x.png", "a//b.png", "a/./b.png"] {
        assert_eq!(
            sink.store(vec![0], "image/png", name).unwrap_err().kind(),
            "upload",
            "{name}"
        );
    }
}

#[test]
fn memory_sink_keeps_objects_in_order() {
    let sink = MemoryUploadSink::new();
    assert_eq!(sink.store(vec![1], "image/png", "a").unwrap(), "mem://a");
    sink.store(vec![2], "video/mp4", "b").unwrap();
    let names: Vec<_> = sink.objects().into_iter().map(|o| o.name).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(sink.get("b").unwrap().content_type, "video/mp4");
    assert!(sink.get("c").is_none());
    assert_eq!(sink.store(vec![], "x", "").unwrap_err().kind(), "upload");
}
