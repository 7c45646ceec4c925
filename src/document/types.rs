//! Element and template types for the certificate design model.
//!
//! All types derive `Serialize + Deserialize` so the same types work for
//! both Rust API construction and JSON deserialization. Maps are `BTreeMap`
//! so that serialization order is stable (the content hash depends on it).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of an element inside a template.
pub type ElementId = i64;

/// Identifier of a template variable.
pub type VariableId = i64;

// ============================================================================
// COLOR
// ============================================================================

/// RGBA color, written as `#rrggbb` or `#rrggbbaa` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const DEBUG_RED: Color = Color([255, 0, 0, 255]);

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub fn alpha(self) -> u8 {
        self.0[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("invalid color '{}'", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("invalid color '{}': {}", s, e))
        };
        match hex.len() {
            6 => Ok(Color([channel(0)?, channel(2)?, channel(4)?, 255])),
            8 => Ok(Color([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
            _ => Err(format!("invalid color '{}': expected #rrggbb or #rrggbbaa", s)),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SHARED BASE
// ============================================================================

/// Where an element's content sits inside its box.
///
/// `Start`/`End` are logical: they map to left/right for left-to-right
/// languages and are mirrored for right-to-left ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementAlignment {
    TopStart,
    TopCenter,
    TopEnd,
    CenterStart,
    #[default]
    Center,
    CenterEnd,
    BottomStart,
    BottomCenter,
    BottomEnd,
}

/// Horizontal component of an [`ElementAlignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    Start,
    Center,
    End,
}

/// Vertical component of an [`ElementAlignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

impl ElementAlignment {
    pub fn horizontal(self) -> HorizontalAlign {
        match self {
            Self::TopStart | Self::CenterStart | Self::BottomStart => HorizontalAlign::Start,
            Self::TopCenter | Self::Center | Self::BottomCenter => HorizontalAlign::Center,
            Self::TopEnd | Self::CenterEnd | Self::BottomEnd => HorizontalAlign::End,
        }
    }

    pub fn vertical(self) -> VerticalAlign {
        match self {
            Self::TopStart | Self::TopCenter | Self::TopEnd => VerticalAlign::Top,
            Self::CenterStart | Self::Center | Self::CenterEnd => VerticalAlign::Middle,
            Self::BottomStart | Self::BottomCenter | Self::BottomEnd => VerticalAlign::Bottom,
        }
    }
}

/// Properties every element kind shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBase {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
    /// Top-left corner in logical canvas units.
    pub position_x: f32,
    pub position_y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub alignment: ElementAlignment,
    /// Hidden elements are never decoded, measured or drawn.
    #[serde(default)]
    pub hidden: bool,
    /// Order the editor lists elements in; equal z-indices draw in this order.
    #[serde(default)]
    pub render_order: i32,
}

impl ElementBase {
    pub fn new(id: ElementId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            name: String::new(),
            position_x: x,
            position_y: y,
            width,
            height,
            z_index: 0,
            alignment: ElementAlignment::default(),
            hidden: false,
            render_order: 0,
        }
    }
}

// ============================================================================
// TEXT PROPERTIES
// ============================================================================

/// Reference to the font an element wants to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontRef {
    /// A font from the Google Fonts catalogue, by family name.
    Google { identifier: String },
    /// A font uploaded to the template's own storage.
    SelfHosted { family: String },
}

impl Default for FontRef {
    fn default() -> Self {
        FontRef::Google {
            identifier: "Roboto".into(),
        }
    }
}

/// How text that does not fit its box is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementOverflow {
    #[default]
    Wrap,
    Truncate,
    Ellipsis,
    ResizeDown,
}

fn default_font_size() -> f32 {
    16.0
}

/// Typography shared by every text-bearing element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    #[serde(default)]
    pub font_ref: FontRef,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub overflow: ElementOverflow,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            font_ref: FontRef::default(),
            font_size: default_font_size(),
            color: Color::BLACK,
            overflow: ElementOverflow::Wrap,
        }
    }
}

// ============================================================================
// DATA SOURCES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentTextField {
    Name,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateTextField {
    VerificationCode,
}

/// Where a text element takes its content from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextDataSource {
    Static { value: String },
    StudentField { field: StudentTextField },
    CertificateField { field: CertificateTextField },
    TemplateTextVariable { variable_id: VariableId },
    TemplateSelectVariable { variable_id: VariableId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentDateField {
    DateOfBirth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateDateField {
    ReleaseDate,
}

/// Where a date element takes its date from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateDataSource {
    /// ISO `YYYY-MM-DD` literal.
    Static { value: String },
    StudentField { field: StudentDateField },
    CertificateField { field: CertificateDateField },
    TemplateDateVariable { variable_id: VariableId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumberDataSource {
    TemplateNumberVariable { variable_id: VariableId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CountryDataSource {
    StudentNationality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenderDataSource {
    StudentGender,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDataSource {
    /// Absolute URL (or local path) of the image file.
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QrCodeDataSource {
    /// Public verification URL for the certificate.
    VerificationUrl,
    /// The bare verification code.
    VerificationCode,
}

// ============================================================================
// KIND-SPECIFIC PROPERTIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarType {
    #[default]
    Gregorian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTransformation {
    /// Render the number of whole years between the date and the reference day.
    AgeCalculation,
}

fn default_date_format() -> String {
    "%Y-%m-%d".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateProps {
    #[serde(default)]
    pub calendar: CalendarType,
    #[serde(default)]
    pub offset_in_days: i64,
    /// `chrono` strftime pattern.
    #[serde(default = "default_date_format")]
    pub format: String,
    #[serde(default)]
    pub transformation: Option<DateTransformation>,
}

impl Default for DateProps {
    fn default() -> Self {
        Self {
            calendar: CalendarType::Gregorian,
            offset_in_days: 0,
            format: default_date_format(),
            transformation: None,
        }
    }
}

/// Decimal places per locale; `"default"` applies when the language has no entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberProps {
    #[serde(default)]
    pub mapping: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryRepresentation {
    #[default]
    CountryName,
    Nationality,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CountryProps {
    #[serde(default)]
    pub representation: CountryRepresentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementImageFit {
    #[default]
    Contain,
    Cover,
    Fill,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageProps {
    #[serde(default)]
    pub fit: ElementImageFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QrErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

fn default_qr_background() -> Color {
    Color::WHITE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrCodeProps {
    #[serde(default)]
    pub error_correction: QrErrorCorrection,
    #[serde(default)]
    pub foreground_color: Color,
    #[serde(default = "default_qr_background")]
    pub background_color: Color,
}

impl Default for QrCodeProps {
    fn default() -> Self {
        Self {
            error_correction: QrErrorCorrection::M,
            foreground_color: Color::BLACK,
            background_color: Color::WHITE,
        }
    }
}

// ============================================================================
// ELEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub base: ElementBase,
    pub data_source: TextDataSource,
    #[serde(default)]
    pub text_props: TextProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateElement {
    pub base: ElementBase,
    pub data_source: DateDataSource,
    #[serde(default)]
    pub text_props: TextProps,
    #[serde(default)]
    pub date_props: DateProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberElement {
    pub base: ElementBase,
    pub data_source: NumberDataSource,
    #[serde(default)]
    pub text_props: TextProps,
    #[serde(default)]
    pub number_props: NumberProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryElement {
    pub base: ElementBase,
    pub data_source: CountryDataSource,
    #[serde(default)]
    pub text_props: TextProps,
    #[serde(default)]
    pub country_props: CountryProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderElement {
    pub base: ElementBase,
    pub data_source: GenderDataSource,
    #[serde(default)]
    pub text_props: TextProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub base: ElementBase,
    pub data_source: ImageDataSource,
    #[serde(default)]
    pub image_props: ImageProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrCodeElement {
    pub base: ElementBase,
    pub data_source: QrCodeDataSource,
    #[serde(default)]
    pub qr_code_props: QrCodeProps,
}

/// One positioned visual unit on the certificate.
///
/// Adding a variant here is a compile-time decision point: every renderer
/// dispatch matches exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CertificateElement {
    Text(TextElement),
    Date(DateElement),
    Number(NumberElement),
    Country(CountryElement),
    Gender(GenderElement),
    Image(ImageElement),
    QrCode(QrCodeElement),
}

impl CertificateElement {
    pub fn base(&self) -> &ElementBase {
        match self {
            Self::Text(e) => &e.base,
            Self::Date(e) => &e.base,
            Self::Number(e) => &e.base,
            Self::Country(e) => &e.base,
            Self::Gender(e) => &e.base,
            Self::Image(e) => &e.base,
            Self::QrCode(e) => &e.base,
        }
    }

    /// Lowercase kind name, as it appears in the JSON `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Number(_) => "number",
            Self::Country(_) => "country",
            Self::Gender(_) => "gender",
            Self::Image(_) => "image",
            Self::QrCode(_) => "qr_code",
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.base().hidden
    }

    /// Typography of text-bearing elements.
    pub fn text_props(&self) -> Option<&TextProps> {
        match self {
            Self::Text(e) => Some(&e.text_props),
            Self::Date(e) => Some(&e.text_props),
            Self::Number(e) => Some(&e.text_props),
            Self::Country(e) => Some(&e.text_props),
            Self::Gender(e) => Some(&e.text_props),
            Self::Image(_) | Self::QrCode(_) => None,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::Image(e) => Some(e.data_source.image_url.as_str()),
            _ => None,
        }
    }
}

// ============================================================================
// TEMPLATE CONFIG & PREVIEW DATA
// ============================================================================

fn default_language() -> String {
    "en".into()
}

/// Logical canvas of a certificate template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_language")]
    pub language: String,
}

impl TemplateConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            language: default_language(),
        }
    }

    /// Whether the template language is written right-to-left.
    pub fn is_rtl(&self) -> bool {
        matches!(self.primary_language(), "ar" | "fa" | "he" | "ur")
    }

    /// Language subtag (`"ar"` for `"ar-EG"`).
    pub fn primary_language(&self) -> &str {
        self.language.split(['-', '_']).next().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudentData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// ISO 3166-1 alpha-2 code.
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CertificateData {
    #[serde(default)]
    pub verification_code: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
}

/// Value bound to a template variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Number(f64),
    Text(String),
}

/// Values the data sources resolve against. Everything is optional; missing
/// values render as placeholders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderData {
    #[serde(default)]
    pub student: Option<StudentData>,
    #[serde(default)]
    pub certificate: Option<CertificateData>,
    #[serde(default)]
    pub variables: BTreeMap<VariableId, VariableValue>,
}
