use super::*;

#[test]
fn location_parsing_covers_schemes() {
    assert_eq!(
        AssetLocation::parse("https://cdn.example.com/a.png").unwrap(),
        AssetLocation::Http("https://cdn.example.com/a.png".to_string())
    );
    assert_eq!(
        AssetLocation::parse("file:///srv/a.png").unwrap(),
        AssetLocation::File(PathBuf::from("/srv/a.png"))
    );
    assert_eq!(
        AssetLocation::parse("file://localhost/srv/a.png").unwrap(),
        AssetLocation::File(PathBuf::from("/srv/a.png"))
    );
    assert_eq!(
        AssetLocation::parse("relative/a.png").unwrap(),
        AssetLocation::File(PathBuf::from("relative/a.png"))
    );
    assert_eq!(
        AssetLocation::parse("data:image/png;base64,AAAA").unwrap(),
        AssetLocation::Data
    );
    assert!(AssetLocation::parse("ftp://example.com/a.png").is_err());
    assert!(AssetLocation::parse("   ").is_err());
}

#[test]
fn reads_local_files_and_enforces_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blob.bin");
    std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

    let cfg = FetchConfig::default();
    let src = HttpBlobSource::new(&cfg).unwrap();
    let url = format!("file://{}", path.display());
    assert_eq!(src.fetch(&url).unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(src.fetch(path.to_str().unwrap()).unwrap().len(), 4);

    let small = HttpBlobSource::new(&FetchConfig {
        max_bytes: 2,
        ..FetchConfig::default()
    })
    .unwrap();
    let err = small.fetch(&url).unwrap_err();
    assert_eq!(err.kind(), "asset_fetch");
}

#[test]
fn missing_file_and_data_url_are_fetch_errors() {
    let src = HttpBlobSource::new(&FetchConfig::default()).unwrap();
    let err = src.fetch("/definitely/not/here.png").unwrap_err();
    assert_eq!(err.kind(), "asset_fetch");

    let long = format!("data:image/png;base64,{}", "A".repeat(4096));
    let err = src.fetch(&long).unwrap_err();
    assert_eq!(err.kind(), "asset_fetch");
    assert!(err.to_string().len() < 200, "{err}");
}

#[test]
fn memory_source_serves_inserted_blobs() {
    let src = MemoryBlobSource::new().with("mem://a", vec![7, 7]);
    assert_eq!(src.fetch("mem://a").unwrap(), vec![7, 7]);
    assert!(matches!(
        src.fetch("mem://b"),
        Err(ForgeError::AssetFetch { .. })
    ));
}
