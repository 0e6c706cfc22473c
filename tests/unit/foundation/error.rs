use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ForgeError::not_found(RecordKind::User, "u1")
            .to_string()
            .contains("not found: user 'u1'")
    );
    assert!(
        ForgeError::asset_fetch("http://x/a.png", "status 404")
            .to_string()
            .contains("asset fetch error:")
    );
    assert!(
        ForgeError::invalid_template("frameSize", "missing")
            .to_string()
            .contains("field 'frameSize'")
    );
    assert!(
        ForgeError::encoding("x")
            .to_string()
            .contains("encoding error:")
    );
    assert!(ForgeError::upload("x").to_string().contains("upload error:"));
}

#[test]
fn kind_tags_are_stable() {
    assert_eq!(
        ForgeError::not_found(RecordKind::Template, "t").kind(),
        "not_found"
    );
    assert_eq!(ForgeError::asset_fetch("u", "r").kind(), "asset_fetch");
    assert_eq!(
        ForgeError::invalid_template("f", "r").kind(),
        "invalid_template"
    );
    assert_eq!(ForgeError::encoding("e").kind(), "encoding");
    assert_eq!(ForgeError::upload("e").kind(), "upload");
    assert_eq!(
        ForgeError::Other(anyhow::anyhow!("boom")).kind(),
        "internal"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ForgeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
