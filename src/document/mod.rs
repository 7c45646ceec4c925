//! # Certificate Design Model
//!
//! A single type hierarchy that is both the Rust API and the JSON API.
//! `Design` is constructible in Rust and deserializable from JSON.
//!
//! ```
//! use laurel::document::Design;
//!
//! let design = Design::from_json(r##"{
//!     "config": {"width": 800, "height": 600},
//!     "elements": [{
//!         "type": "text",
//!         "base": {"id": 1, "position_x": 40, "position_y": 40, "width": 300, "height": 40},
//!         "data_source": {"kind": "static", "value": "Certificate of Completion"},
//!         "text_props": {"font_size": 24, "color": "#1a1a1a", "overflow": "resize_down"}
//!     }]
//! }"##).unwrap();
//! assert_eq!(design.elements.len(), 1);
//! ```

pub mod locale;
pub mod resolve;
pub mod types;

pub use types::*;

use serde::{Deserialize, Serialize};

use crate::error::LaurelError;

/// A template's canvas plus its elements, as supplied by the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub config: TemplateConfig,
    #[serde(default)]
    pub elements: Vec<CertificateElement>,
}

impl Design {
    /// Parse and validate a design document.
    ///
    /// Elements are put in `render_order` (stable, so equal orders keep their
    /// position in the document).
    pub fn from_json(json: &str) -> Result<Self, LaurelError> {
        let mut design: Design = serde_json::from_str(json)?;
        design.normalize()?;
        Ok(design)
    }

    /// Validate, then sort elements by `render_order`.
    pub fn normalize(&mut self) -> Result<(), LaurelError> {
        self.validate()?;
        self.elements.sort_by_key(|element| element.base().render_order);
        Ok(())
    }

    /// Check the invariants the renderer relies on.
    pub fn validate(&self) -> Result<(), LaurelError> {
        validate_config(&self.config)?;
        for element in &self.elements {
            let base = element.base();
            if !(base.width.is_finite() && base.height.is_finite()) {
                return Err(LaurelError::Design(format!(
                    "{} element {}: width and height must be finite",
                    element.kind(),
                    base.id
                )));
            }
            if let Some(props) = element.text_props()
                && !(props.font_size.is_finite() && props.font_size > 0.0)
            {
                return Err(LaurelError::Design(format!(
                    "{} element {}: font size must be positive, got {}",
                    element.kind(),
                    base.id,
                    props.font_size
                )));
            }
        }
        Ok(())
    }
}

/// Canvas size must be strictly positive in both dimensions.
pub fn validate_config(config: &TemplateConfig) -> Result<(), LaurelError> {
    if config.width == 0 || config.height == 0 {
        return Err(LaurelError::Design(format!(
            "canvas must be at least 1x1, got {}x{}",
            config.width, config.height
        )));
    }
    Ok(())
}
