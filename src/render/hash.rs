//! Content hash of a render's inputs.
//!
//! Two draws with equal inputs produce equal keys, so the key can address a
//! cached frame. Inputs are serialized to canonical JSON (struct fields in
//! declaration order, maps as `BTreeMap`) and hashed with SHA-256.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use crate::document::{CertificateElement, RenderData, TemplateConfig};
use crate::error::LaurelError;

/// Everything that affects the pixels of a frame.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HashInputs<'a> {
    pub elements: &'a [CertificateElement],
    pub config: &'a TemplateConfig,
    pub show_debug_borders: bool,
    pub render_scale: f32,
    /// Left out of the serialized form entirely when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a RenderData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHash {
    /// Lowercase hex SHA-256.
    pub key: String,
    pub elapsed: Duration,
}

pub fn content_hash(inputs: &HashInputs<'_>) -> Result<ContentHash, LaurelError> {
    let start = Instant::now();
    let canonical = serde_json::to_vec(inputs)?;
    let digest = Sha256::digest(&canonical);
    Ok(ContentHash {
        key: hex::encode(digest),
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementBase, TextDataSource, TextElement, TextProps};

    fn elements(value: &str) -> Vec<CertificateElement> {
        vec![CertificateElement::Text(TextElement {
            base: ElementBase::new(1, 10.0, 10.0, 100.0, 20.0),
            data_source: TextDataSource::Static { value: value.into() },
            text_props: TextProps::default(),
        })]
    }

    fn key(elements: &[CertificateElement], config: &TemplateConfig, borders: bool, scale: f32) -> String {
        content_hash(&HashInputs {
            elements,
            config,
            show_debug_borders: borders,
            render_scale: scale,
            data: None,
        })
        .unwrap()
        .key
    }

    #[test]
    fn test_equal_inputs_equal_keys() {
        let config = TemplateConfig::new(800, 600);
        let a = key(&elements("Hello"), &config, false, 1.0);
        let b = key(&elements("Hello"), &config.clone(), false, 1.0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_any_input_changes_key() {
        let config = TemplateConfig::new(800, 600);
        let base = key(&elements("Hello"), &config, false, 1.0);
        assert_ne!(base, key(&elements("Hello!"), &config, false, 1.0));
        assert_ne!(base, key(&elements("Hello"), &TemplateConfig::new(801, 600), false, 1.0));
        assert_ne!(base, key(&elements("Hello"), &config, true, 1.0));
        assert_ne!(base, key(&elements("Hello"), &config, false, 2.0));
    }

    #[test]
    fn test_data_participates_only_when_present() {
        let config = TemplateConfig::new(800, 600);
        let els = elements("Hello");
        let without = key(&els, &config, false, 1.0);
        let data = RenderData::default();
        let with = content_hash(&HashInputs {
            elements: &els,
            config: &config,
            show_debug_borders: false,
            render_scale: 1.0,
            data: Some(&data),
        })
        .unwrap()
        .key;
        assert_ne!(without, with);
    }
}
