//! # Fonts
//!
//! Font faces and the registry that hands them to the renderers.
//!
//! - [`ttf`]: TrueType/OpenType faces parsed by ab_glyph
//! - [`bitmap`]: the built-in Spleen bitmap face, used as the last fallback
//!
//! Lookup goes requested family → configured default family → built-in face.
//! Layout measures with the exact face and size the draw will use.

pub mod bitmap;
pub mod ttf;

use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::document::{CertificateElement, FontRef};
use crate::error::LaurelError;

pub use bitmap::{BUILTIN_FAMILY, BitmapFace};
pub use ttf::TtfFace;

/// Measurement and rasterization for one font family.
///
/// All sizes are pixel sizes. `measure` is linear in `size` for every face
/// laurel ships, which lets layout work in logical units and the draw in
/// device units.
pub trait FontFace: Send + Sync + fmt::Debug {
    fn family(&self) -> &str;

    /// Horizontal advance of `text` set on one line.
    fn measure(&self, text: &str, size: f32) -> f32;

    /// Distance from the top of a line to its baseline.
    fn ascent(&self, size: f32) -> f32;

    /// Distance between consecutive baselines.
    fn line_height(&self, size: f32) -> f32;

    /// Rasterize `text` with the pen starting at `(x, baseline)`.
    ///
    /// `plot` receives device pixel coordinates and a coverage in `0.0..=1.0`.
    fn rasterize(&self, text: &str, size: f32, x: f32, baseline: f32, plot: &mut dyn FnMut(i32, i32, f32));
}

/// Concrete family name for an element's font reference.
pub fn family_for(font_ref: &FontRef) -> &str {
    match font_ref {
        FontRef::Google { identifier } => identifier,
        FontRef::SelfHosted { family } => family,
    }
}

/// Font families used by visible text-bearing elements.
pub fn font_families(elements: &[CertificateElement]) -> BTreeSet<String> {
    elements
        .iter()
        .filter(|e| !e.is_hidden())
        .filter_map(|e| e.text_props())
        .map(|props| family_for(&props.font_ref).to_string())
        .collect()
}

/// Family name → face.
pub struct FontRegistry {
    faces: HashMap<String, Arc<dyn FontFace>>,
    default_family: String,
    builtin: Arc<dyn FontFace>,
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut families: Vec<_> = self.faces.keys().collect();
        families.sort();
        f.debug_struct("FontRegistry")
            .field("families", &families)
            .field("default_family", &self.default_family)
            .finish()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new(BUILTIN_FAMILY)
    }
}

fn family_key(family: &str) -> String {
    family.trim().to_lowercase()
}

impl FontRegistry {
    /// Registry with only the built-in face.
    pub fn new(default_family: impl Into<String>) -> Self {
        let builtin: Arc<dyn FontFace> = Arc::new(BitmapFace::new());
        let mut faces = HashMap::new();
        faces.insert(family_key(BUILTIN_FAMILY), builtin.clone());
        Self {
            faces,
            default_family: default_family.into(),
            builtin,
        }
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Register a face under its own family name (case-insensitive).
    pub fn register(&mut self, face: Arc<dyn FontFace>) {
        debug!("registered font family '{}'", face.family());
        self.faces.insert(family_key(face.family()), face);
    }

    /// Parse and register a font file's bytes.
    pub fn register_bytes(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), LaurelError> {
        let face = TtfFace::from_bytes(family, bytes)?;
        self.register(Arc::new(face));
        Ok(())
    }

    /// Register every `.ttf`/`.otf` file in `dir`, using the file stem as the
    /// family name. Unparseable files are skipped with a warning.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, LaurelError> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_font = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"));
            let Some(family) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_font {
                continue;
            }
            let bytes = std::fs::read(&path)?;
            match self.register_bytes(family, bytes) {
                Ok(()) => loaded += 1,
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        info!("loaded {} font(s) from {}", loaded, dir.display());
        Ok(loaded)
    }

    /// Exact lookup; `None` when the family was never registered.
    pub fn get(&self, family: &str) -> Option<Arc<dyn FontFace>> {
        self.faces.get(&family_key(family)).cloned()
    }

    pub fn contains(&self, family: &str) -> bool {
        self.faces.contains_key(&family_key(family))
    }

    /// Face to draw `family` with, falling back to the default family and
    /// then to the built-in face.
    pub fn resolve(&self, family: &str) -> Arc<dyn FontFace> {
        if let Some(face) = self.get(family) {
            return face;
        }
        if let Some(face) = self.get(&self.default_family) {
            warn!(
                "font family '{}' is not loaded, falling back to '{}'",
                family, self.default_family
            );
            return face;
        }
        warn!(
            "font family '{}' and default '{}' are not loaded, using built-in face",
            family, self.default_family
        );
        self.builtin.clone()
    }

    /// Families from `wanted` that have no registered face.
    pub fn missing<'a>(&self, wanted: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        wanted
            .into_iter()
            .filter(|family| !self.contains(family))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementBase, TextDataSource, TextElement, TextProps};

    fn text_with_font(id: i64, family: &str, hidden: bool) -> CertificateElement {
        let mut base = ElementBase::new(id, 0.0, 0.0, 100.0, 20.0);
        base.hidden = hidden;
        CertificateElement::Text(TextElement {
            base,
            data_source: TextDataSource::Static { value: "x".into() },
            text_props: TextProps {
                font_ref: FontRef::SelfHosted { family: family.into() },
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_font_families_skip_hidden() {
        let elements = vec![
            text_with_font(1, "Amiri", false),
            text_with_font(2, "Cairo", true),
            text_with_font(3, "Amiri", false),
        ];
        let families = font_families(&elements);
        assert_eq!(families.into_iter().collect::<Vec<_>>(), vec!["Amiri".to_string()]);
    }

    #[test]
    fn test_family_for() {
        let google = FontRef::Google { identifier: "Roboto".into() };
        assert_eq!(family_for(&google), "Roboto");
    }

    #[test]
    fn test_resolve_falls_back_to_builtin() {
        let registry = FontRegistry::new("Roboto");
        let face = registry.resolve("Missing Family");
        assert_eq!(face.family(), BUILTIN_FAMILY);
        assert!(registry.get("Missing Family").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FontRegistry::default();
        assert!(registry.contains("Builtin-Mono"));
    }

    #[test]
    fn test_missing_families() {
        let registry = FontRegistry::default();
        let wanted: BTreeSet<String> = ["builtin-mono".to_string(), "Amiri".to_string()].into();
        assert_eq!(registry.missing(&wanted), vec!["Amiri".to_string()]);
    }

    #[test]
    fn test_load_dir_skips_broken_files() {
        let dir = std::env::temp_dir().join(format!("laurel-fonts-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Broken.ttf"), b"not a font").unwrap();
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let mut registry = FontRegistry::default();
        let loaded = registry.load_dir(&dir).unwrap();
        assert_eq!(loaded, 0);
        assert!(!registry.contains("Broken"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
