use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use anyhow::Context as _;
use image::RgbaImage;

use crate::foundation::error::{ForgeError, ForgeResult, RecordKind};
use crate::model::template::Template;
use crate::model::user::UserRecord;

/// Resolves template ids.
pub trait TemplateStore: Send + Sync {
    fn get_template(&self, id: &str) -> ForgeResult<Template>;
}

/// Resolves user ids.
pub trait UserStore: Send + Sync {
    fn get_user(&self, id: &str) -> ForgeResult<UserRecord>;
}

/// Stores a finished artifact and returns a dereferenceable URL.
pub trait UploadSink: Send + Sync {
    fn store(&self, bytes: Vec<u8>, content_type: &str, suggested_name: &str)
    -> ForgeResult<String>;
}

/// Background-removal capability used by `remove_background`.
pub trait BackgroundRemover: Send + Sync {
    /// Return `img` with its background made transparent.
    fn remove_background(&self, img: &RgbaImage) -> ForgeResult<RgbaImage>;
}

/// Reject ids that could escape the store root.
fn checked_id(kind: RecordKind, id: &str) -> ForgeResult<()> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.contains('\0');
    if bad {
        return Err(ForgeError::not_found(kind, id));
    }
    Ok(())
}

/// Documents at `{root}/templates/{id}.json` and `{root}/users/{id}.json`.
#[derive(Clone, Debug)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_doc(&self, kind: RecordKind, dir: &str, id: &str) -> ForgeResult<Vec<u8>> {
        checked_id(kind, id)?;
        let path = self.root.join(dir).join(format!("{id}.json"));
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ForgeError::not_found(kind, id))
            }
            Err(e) => Err(ForgeError::Other(
                anyhow::Error::new(e).context(format!("read '{}'", path.display())),
            )),
        }
    }
}

impl TemplateStore for JsonDirStore {
    fn get_template(&self, id: &str) -> ForgeResult<Template> {
        let bytes = self.read_doc(RecordKind::Template, "templates", id)?;
        Template::from_json_slice(&bytes)
    }
}

impl UserStore for JsonDirStore {
    fn get_user(&self, id: &str) -> ForgeResult<UserRecord> {
        let bytes = self.read_doc(RecordKind::User, "users", id)?;
        UserRecord::from_json_slice(&bytes)
    }
}

/// In-memory template and user documents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    templates: RwLock<HashMap<String, Template>>,
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_template(&self, id: impl Into<String>, template: Template) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), template);
    }

    pub fn insert_user(&self, id: impl Into<String>, user: UserRecord) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), user.normalized());
    }

    pub fn with_template(self, id: impl Into<String>, template: Template) -> Self {
        self.insert_template(id, template);
        self
    }

    pub fn with_user(self, id: impl Into<String>, user: UserRecord) -> Self {
        self.insert_user(id, user);
        self
    }
}

impl TemplateStore for MemoryStore {
    fn get_template(&self, id: &str) -> ForgeResult<Template> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| ForgeError::not_found(RecordKind::Template, id))
    }
}

impl UserStore for MemoryStore {
    fn get_user(&self, id: &str) -> ForgeResult<UserRecord> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| ForgeError::not_found(RecordKind::User, id))
    }
}

/// Writes artifacts under a root directory.
///
/// Returns `file://` URLs, or `{public_base_url}/{name}` when a public base URL is set.
#[derive(Clone, Debug)]
pub struct DirUploadSink {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl DirUploadSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
        }
    }

    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = Some(base.into());
        self
    }

    pub(crate) fn target_path(&self, name: &str) -> ForgeResult<PathBuf> {
        let escapes = name.is_empty()
            || name.starts_with('/')
            || name.contains('\\')
            || name.split('/').any(|part| part.is_empty() || part == "." || part == "..");
        if escapes {
            return Err(ForgeError::upload(format!("unusable object name '{name}'")));
        }
        Ok(self.root.join(name))
    }
}

impl UploadSink for DirUploadSink {
    fn store(&self, bytes: Vec<u8>, content_type: &str, suggested_name: &str) -> ForgeResult<String> {
        let path = self.target_path(suggested_name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ForgeError::upload(format!("create '{}': {e}", parent.display()))
            })?;
        }
        std::fs::write(&path, &bytes)
            .map_err(|e| ForgeError::upload(format!("write '{}': {e}", path.display())))?;
        tracing::debug!(path = %path.display(), content_type, "wrote artifact");

        if let Some(base) = &self.public_base_url {
            return Ok(format!("{}/{suggested_name}", base.trim_end_matches('/')));
        }
        let abs = path
            .canonicalize()
            .with_context(|| format!("canonicalize '{}'", path.display()))?;
        Ok(format!("file://{}", abs.display()))
    }
}

/// One object held by [`MemoryUploadSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Keeps stored artifacts in memory and returns `mem://{name}` URLs.
#[derive(Debug, Default)]
pub struct MemoryUploadSink {
    objects: Mutex<Vec<StoredObject>>,
}

impl MemoryUploadSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far, in store order.
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|o| o.name == name)
            .cloned()
    }
}

impl UploadSink for MemoryUploadSink {
    fn store(&self, bytes: Vec<u8>, content_type: &str, suggested_name: &str) -> ForgeResult<String> {
        if suggested_name.is_empty() {
            return Err(ForgeError::upload("empty object name"));
        }
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StoredObject {
                name: suggested_name.to_string(),
                content_type: content_type.to_string(),
                bytes,
            });
        Ok(format!("mem://{suggested_name}"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/collab.rs"]
mod tests;
