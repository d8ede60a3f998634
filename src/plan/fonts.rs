use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;

use crate::foundation::error::{ClipreelError, ClipreelResult};

struct Inner {
    db: usvg::fontdb::Database,
    families: HashMap<PathBuf, String>,
    snapshot: Option<Arc<usvg::fontdb::Database>>,
}

/// Font database for one render: system fonts plus every `fontPath` registered by the planner.
///
/// Registering the same file twice returns the cached family name without reloading it.
pub struct FontRegistry {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry").finish_non_exhaustive()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    /// Registry preloaded with system fonts.
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self::from_database(db)
    }

    /// Registry without system fonts.
    pub fn empty() -> Self {
        Self::from_database(usvg::fontdb::Database::new())
    }

    fn from_database(db: usvg::fontdb::Database) -> Self {
        Self {
            inner: Mutex::new(Inner {
                db,
                families: HashMap::new(),
                snapshot: None,
            }),
        }
    }

    fn lock(&self) -> ClipreelResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ClipreelError::evaluation("font registry poisoned"))
    }

    /// Load the font file at `path` and return the family name text layers should use.
    pub fn register(&self, path: &str) -> ClipreelResult<String> {
        let key = PathBuf::from(path);
        if let Some(family) = self.lock()?.families.get(&key) {
            return Ok(family.clone());
        }

        let bytes = std::fs::read(Path::new(path))
            .with_context(|| format!("read font file '{path}'"))?;
        let mut inner = self.lock()?;
        let ids = inner
            .db
            .load_font_source(usvg::fontdb::Source::Binary(Arc::new(bytes)));
        let family = ids
            .iter()
            .find_map(|id| inner.db.face(*id))
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone())
            .ok_or_else(|| {
                ClipreelError::validation(format!("no usable font face in '{path}'"))
            })?;

        tracing::debug!(path, family = %family, "registered font");
        inner.families.insert(key, family.clone());
        inner.snapshot = None;
        Ok(family)
    }

    /// Family previously registered for `path`.
    pub fn family_of(&self, path: &str) -> Option<String> {
        self.lock()
            .ok()
            .and_then(|inner| inner.families.get(Path::new(path)).cloned())
    }

    /// Shared snapshot of the database, rebuilt after new registrations.
    pub fn fontdb(&self) -> ClipreelResult<Arc<usvg::fontdb::Database>> {
        let mut inner = self.lock()?;
        if let Some(db) = &inner.snapshot {
            return Ok(Arc::clone(db));
        }
        let db = Arc::new(inner.db.clone());
        inner.snapshot = Some(Arc::clone(&db));
        Ok(db)
    }

    /// Number of font faces available.
    pub fn face_count(&self) -> usize {
        self.lock().map(|inner| inner.db.len()).unwrap_or(0)
    }

    /// SVG parse options resolving text against this registry.
    pub fn svg_options(&self) -> ClipreelResult<usvg::Options<'static>> {
        Ok(usvg::Options {
            fontdb: self.fontdb()?,
            font_resolver: make_svg_font_resolver(),
            ..Default::default()
        })
    }
}

fn make_svg_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };
            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            // Any face beats dropping the text.
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}
