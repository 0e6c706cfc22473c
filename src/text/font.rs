use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::foundation::config::FontConfig;

/// Files and families tried, in order, when `Arial` is requested and not installed.
const ARIAL_SUBSTITUTE_FILES: [&str; 5] = [
    "arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "/Windows/Fonts/arial.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];
const ARIAL_SUBSTITUTE_FAMILIES: [&str; 3] = ["Liberation Sans", "Arimo", "DejaVu Sans"];

#[cfg(target_os = "macos")]
const PLATFORM_FONT_DIRS: &[&str] = &["/System/Library/Fonts", "/Library/Fonts"];
#[cfg(target_os = "windows")]
const PLATFORM_FONT_DIRS: &[&str] = &["C:\\Windows\\Fonts"];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/share/fonts/truetype",
    "/usr/local/share/fonts",
];

/// A scalable font loaded from bytes.
#[derive(Clone)]
pub struct OutlineFont {
    /// Content hash; identifies the face across layout caches.
    pub key: u64,
    pub data: Arc<Vec<u8>>,
    pub index: u32,
    pub(crate) paint_font: vello_cpu::peniko::FontData,
}

impl OutlineFont {
    /// Wrap shared font bytes; the paint blob references the same allocation.
    pub(crate) fn from_shared(data: Arc<Vec<u8>>, index: u32) -> Self {
        let key = xxhash_rust::xxh3::xxh3_64(&data);
        let paint_font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::new(data.clone()), index);
        Self {
            key,
            data,
            index,
            paint_font,
        }
    }
}

impl std::fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineFont")
            .field("key", &format_args!("{:016x}", self.key))
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Face selected for a text layer.
#[derive(Clone, Debug)]
pub enum FontFace {
    Outline(OutlineFont),
    /// Bundled 5x7 bitmap face; always available.
    Builtin,
}

/// Where a resolved face came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontOrigin {
    File(PathBuf),
    SystemFamily(String),
    Builtin,
}

#[derive(Clone, Debug)]
pub struct ResolvedFont {
    pub requested: String,
    pub face: FontFace,
    pub origin: FontOrigin,
}

impl ResolvedFont {
    pub fn builtin(requested: impl Into<String>) -> Self {
        Self {
            requested: requested.into(),
            face: FontFace::Builtin,
            origin: FontOrigin::Builtin,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.face, FontFace::Builtin)
    }
}

/// One entry of the fallback chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FontCandidate {
    File(PathBuf),
    SystemFamily(String),
}

/// Resolves template font names to faces through an ordered fallback chain.
///
/// Resolution never fails: the terminal entry is the built-in bitmap face. Results are cached per
/// lowercased name for the resolver's lifetime.
pub struct FontResolver {
    search_dirs: Vec<PathBuf>,
    platform_dirs: Vec<PathBuf>,
    load_system_fonts: bool,
    system_db: OnceLock<usvg::fontdb::Database>,
    cache: Mutex<HashMap<String, ResolvedFont>>,
}

impl FontResolver {
    pub fn new(cfg: &FontConfig) -> Self {
        Self::with_platform_dirs(
            cfg,
            PLATFORM_FONT_DIRS.iter().map(PathBuf::from).collect(),
        )
    }

    pub(crate) fn with_platform_dirs(cfg: &FontConfig, platform_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs: cfg.search_dirs.clone(),
            platform_dirs,
            load_system_fonts: cfg.load_system_fonts,
            system_db: OnceLock::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `name` to a usable face.
    pub fn resolve(&self, name: &str) -> ResolvedFont {
        let key = name.trim().to_ascii_lowercase();
        if let Ok(cache) = self.cache.lock()
            && let Some(hit) = cache.get(&key)
        {
            return hit.clone();
        }

        let resolved = self.resolve_uncached(name.trim());
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, resolved.clone());
        }
        resolved
    }

    fn resolve_uncached(&self, name: &str) -> ResolvedFont {
        for candidate in self.candidates(name) {
            let loaded = match &candidate {
                FontCandidate::File(path) => load_font_file(path),
                FontCandidate::SystemFamily(family) => self.query_system(family),
            };
            if let Some(font) = loaded {
                let origin = match candidate {
                    FontCandidate::File(p) => FontOrigin::File(p),
                    FontCandidate::SystemFamily(f) => FontOrigin::SystemFamily(f),
                };
                tracing::debug!(requested = name, ?origin, "resolved font");
                return ResolvedFont {
                    requested: name.to_string(),
                    face: FontFace::Outline(font),
                    origin,
                };
            }
        }
        tracing::warn!(requested = name, "no font face found; using built-in bitmap face");
        ResolvedFont::builtin(name)
    }

    /// Ordered fallback chain for `name`, excluding the terminal built-in face.
    pub(crate) fn candidates(&self, name: &str) -> Vec<FontCandidate> {
        let mut out = Vec::new();
        if name.is_empty() {
            return out;
        }
        let has_ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"));
        let file_names: Vec<String> = if has_ext {
            vec![name.to_string()]
        } else {
            let mut v = vec![format!("{name}.ttf"), format!("{name}.otf")];
            let lower = name.to_ascii_lowercase();
            if lower != name {
                v.push(format!("{lower}.ttf"));
            }
            v
        };

        let mut push = |c: FontCandidate| {
            if !out.contains(&c) {
                out.push(c);
            }
        };

        let local_dirs = self
            .search_dirs
            .iter()
            .cloned()
            .chain(std::iter::once(PathBuf::from(".")));
        for dir in local_dirs.chain(self.platform_dirs.iter().cloned()) {
            for f in &file_names {
                push(FontCandidate::File(dir.join(f)));
            }
        }
        push(FontCandidate::SystemFamily(name.to_string()));

        if name.eq_ignore_ascii_case("arial") {
            for f in ARIAL_SUBSTITUTE_FILES {
                push(FontCandidate::File(PathBuf::from(f)));
            }
            for fam in ARIAL_SUBSTITUTE_FAMILIES {
                push(FontCandidate::SystemFamily(fam.to_string()));
            }
        }
        out
    }

    fn system_db(&self) -> &usvg::fontdb::Database {
        self.system_db.get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            if self.load_system_fonts {
                db.load_system_fonts();
            }
            for dir in &self.search_dirs {
                load_fonts_from_dir(&mut db, dir);
            }
            tracing::debug!(faces = db.len(), "font database loaded");
            db
        })
    }

    fn query_system(&self, family: &str) -> Option<OutlineFont> {
        let db = self.system_db();
        let families = [usvg::fontdb::Family::Name(family)];
        let query = usvg::fontdb::Query {
            families: &families,
            weight: usvg::fontdb::Weight::NORMAL,
            stretch: usvg::fontdb::Stretch::Normal,
            style: usvg::fontdb::Style::Normal,
        };
        let id = db.query(&query)?;
        let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
        looks_like_font(&bytes).then(|| OutlineFont::from_shared(Arc::new(bytes), index))
    }
}

impl std::fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontResolver")
            .field("search_dirs", &self.search_dirs)
            .field("platform_dirs", &self.platform_dirs)
            .field("load_system_fonts", &self.load_system_fonts)
            .finish_non_exhaustive()
    }
}

fn load_font_file(path: &Path) -> Option<OutlineFont> {
    if !path.is_file() {
        return None;
    }
    match std::fs::read(path).map(Arc::new) {
        Ok(bytes) if parses_as_font(&bytes) => Some(OutlineFont::from_shared(bytes, 0)),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "skipping font candidate with unknown format");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read font candidate");
            None
        }
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::debug!(
                path = %path.display(),
                error = %e,
                "failed to load font into database"
            );
        }
    }
}

/// Signature check plus a full face parse through the font database.
pub(crate) fn parses_as_font(bytes: &Arc<Vec<u8>>) -> bool {
    if !looks_like_font(bytes) {
        return false;
    }
    let mut db = usvg::fontdb::Database::new();
    let faces = db.load_font_source(usvg::fontdb::Source::Binary(bytes.clone()));
    !faces.is_empty()
}

/// sfnt / OpenType / TrueType collection signatures.
pub(crate) fn looks_like_font(bytes: &[u8]) -> bool {
    matches!(
        bytes.get(..4),
        Some([0x00, 0x01, 0x00, 0x00]) | Some(b"OTTO") | Some(b"true") | Some(b"ttcf")
    )
}

/// Columns in a built-in glyph cell.
pub(crate) const BUILTIN_GLYPH_COLS: u32 = 5;
/// Rows in a built-in glyph cell.
pub(crate) const BUILTIN_GLYPH_ROWS: u32 = 7;
/// Horizontal advance in cells (glyph plus one blank column).
pub(crate) const BUILTIN_ADVANCE_CELLS: u32 = 6;

/// Cell edge in pixels for the built-in face at `size_px`.
pub(crate) fn builtin_cell_px(size_px: f32) -> f64 {
    (f64::from(size_px) / 8.0).max(1.0 / 8.0)
}

/// Row bitmaps for `c`; bit 4 is the leftmost column. Unknown glyphs draw a box.
pub(crate) fn builtin_glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x01, 0x02, 0x02, 0x04, 0x08, 0x08, 0x10],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '"' => [0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '@' => [0x0E, 0x11, 0x17, 0x15, 0x17, 0x10, 0x0E],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/font.rs"]
mod tests;
