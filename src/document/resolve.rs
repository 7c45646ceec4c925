//! Content resolution: turns an element's data source into the string it draws.
//!
//! Resolution never fails. A source that yields nothing falls back to a
//! fixed placeholder so a preview always has something to lay out, and the
//! fallback is logged with the element it happened on.

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, Days, NaiveDate};
use log::warn;
use std::fmt::Write;

use super::locale;
use super::types::{
    CertificateDateField, CertificateElement, CertificateTextField, CountryElement,
    CountryRepresentation, DateDataSource, DateElement, DateTransformation, GenderElement,
    NumberDataSource, NumberElement, QrCodeDataSource, QrCodeElement, RenderData,
    StudentDateField, StudentTextField, TemplateConfig, TextDataSource, TextElement,
    VariableValue,
};

/// Drawn when a text source resolves to nothing.
pub const FALLBACK_TEXT: &str = "Sample Text";
pub const FALLBACK_COUNTRY: &str = "Country";
pub const FALLBACK_GENDER: &str = "Gender";
pub const FALLBACK_VERIFICATION_CODE: &str = "PREVIEW-0000";

/// Stand-in for dates the preview data does not carry.
///
/// Fixed rather than "today" so a preview renders, and hashes, the same way
/// on every run.
pub fn placeholder_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Display string of any text-bearing element; `None` for image and QR code.
pub fn display_string(
    element: &CertificateElement,
    data: &RenderData,
    config: &TemplateConfig,
) -> Option<String> {
    let language = config.primary_language();
    match element {
        CertificateElement::Text(e) => Some(text_content(e, data)),
        CertificateElement::Date(e) => Some(date_content(e, data, language)),
        CertificateElement::Number(e) => Some(number_content(e, data, language)),
        CertificateElement::Country(e) => Some(country_content(e, data, language)),
        CertificateElement::Gender(e) => Some(gender_content(e, data, language)),
        CertificateElement::Image(_) | CertificateElement::QrCode(_) => None,
    }
}

fn variable_text(data: &RenderData, variable_id: i64) -> Option<String> {
    match data.variables.get(&variable_id)? {
        VariableValue::Text(s) => Some(s.clone()),
        VariableValue::Number(n) => Some(n.to_string()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Resolve a text data source against preview data.
pub fn resolve_text(source: &TextDataSource, data: &RenderData) -> Option<String> {
    let value = match source {
        TextDataSource::Static { value } => Some(value.clone()),
        TextDataSource::StudentField { field } => {
            let student = data.student.as_ref()?;
            match field {
                StudentTextField::Name => student.name.clone(),
                StudentTextField::Email => student.email.clone(),
            }
        }
        TextDataSource::CertificateField { field } => match field {
            CertificateTextField::VerificationCode => data
                .certificate
                .as_ref()
                .and_then(|c| c.verification_code.clone()),
        },
        TextDataSource::TemplateTextVariable { variable_id }
        | TextDataSource::TemplateSelectVariable { variable_id } => {
            variable_text(data, *variable_id)
        }
    };
    non_empty(value)
}

pub fn text_content(element: &TextElement, data: &RenderData) -> String {
    resolve_text(&element.data_source, data).unwrap_or_else(|| {
        warn!(
            "text element {}: data source {:?} resolved to nothing, using placeholder",
            element.base.id, element.data_source
        );
        FALLBACK_TEXT.to_string()
    })
}

fn release_date(data: &RenderData) -> Option<NaiveDate> {
    data.certificate.as_ref().and_then(|c| c.release_date)
}

/// Resolve a date data source against preview data.
pub fn resolve_date(source: &DateDataSource, data: &RenderData) -> Option<NaiveDate> {
    match source {
        DateDataSource::Static { value } => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok(),
        DateDataSource::StudentField { field } => match field {
            StudentDateField::DateOfBirth => data.student.as_ref().and_then(|s| s.date_of_birth),
        },
        DateDataSource::CertificateField { field } => match field {
            CertificateDateField::ReleaseDate => release_date(data),
        },
        DateDataSource::TemplateDateVariable { variable_id } => {
            let text = variable_text(data, *variable_id)?;
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
        }
    }
}

/// Shift a date by a signed number of days.
pub fn apply_offset(date: NaiveDate, offset_in_days: i64) -> NaiveDate {
    let days = Days::new(offset_in_days.unsigned_abs());
    let shifted = if offset_in_days >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    };
    shifted.unwrap_or(date)
}

/// Whole years elapsed from `birth` to `on`; zero when `on` precedes `birth`.
pub fn age_in_years(birth: NaiveDate, on: NaiveDate) -> u32 {
    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Format a date with a strftime pattern, falling back to ISO on a bad pattern.
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        warn!("invalid date format '{}', using ISO format", pattern);
        return date.format("%Y-%m-%d").to_string();
    }
    let mut out = String::new();
    if write!(out, "{}", date.format_with_items(items.iter())).is_err() {
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

pub fn date_content(element: &DateElement, data: &RenderData, language: &str) -> String {
    let date = resolve_date(&element.data_source, data).unwrap_or_else(|| {
        warn!(
            "date element {}: data source {:?} resolved to nothing, using placeholder",
            element.base.id, element.data_source
        );
        placeholder_date()
    });
    let props = &element.date_props;
    let date = apply_offset(date, props.offset_in_days);

    let formatted = match props.transformation {
        Some(DateTransformation::AgeCalculation) => {
            let reference = release_date(data).unwrap_or_else(placeholder_date);
            age_in_years(date, reference).to_string()
        }
        None => format_date(date, &props.format),
    };
    locale::localize_digits(&formatted, language)
}

/// More digits than an `f64` carries.
pub const MAX_DECIMAL_PLACES: u32 = 20;

/// Decimal places for a language: exact entry, then `"default"`, then zero.
/// Capped at [`MAX_DECIMAL_PLACES`].
pub fn decimal_places(mapping: &std::collections::BTreeMap<String, u32>, language: &str) -> u32 {
    mapping
        .get(language)
        .or_else(|| mapping.get("default"))
        .copied()
        .unwrap_or(0)
        .min(MAX_DECIMAL_PLACES)
}

pub fn number_content(element: &NumberElement, data: &RenderData, language: &str) -> String {
    let NumberDataSource::TemplateNumberVariable { variable_id } = &element.data_source;
    let value = match data.variables.get(variable_id) {
        Some(VariableValue::Number(n)) => Some(*n),
        Some(VariableValue::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    };
    let value = value.unwrap_or_else(|| {
        warn!(
            "number element {}: variable {} has no numeric value, using 0",
            element.base.id, variable_id
        );
        0.0
    });
    let places = decimal_places(&element.number_props.mapping, language) as usize;
    locale::localize_digits(&format!("{:.*}", places, value), language)
}

pub fn country_content(element: &CountryElement, data: &RenderData, language: &str) -> String {
    let Some(code) = data.student.as_ref().and_then(|s| s.nationality.clone()) else {
        warn!(
            "country element {}: student has no nationality, using placeholder",
            element.base.id
        );
        return FALLBACK_COUNTRY.to_string();
    };
    let localized = match element.country_props.representation {
        CountryRepresentation::CountryName => locale::country_name(&code, language),
        CountryRepresentation::Nationality => locale::nationality(&code, language),
    };
    localized.map(str::to_string).unwrap_or(code)
}

pub fn gender_content(element: &GenderElement, data: &RenderData, language: &str) -> String {
    match data.student.as_ref().and_then(|s| s.gender) {
        Some(gender) => locale::gender_label(gender, language).to_string(),
        None => {
            warn!(
                "gender element {}: student has no gender, using placeholder",
                element.base.id
            );
            FALLBACK_GENDER.to_string()
        }
    }
}

/// Payload encoded into a QR code element.
pub fn qr_payload(element: &QrCodeElement, data: &RenderData, verification_base_url: &str) -> String {
    let code = data
        .certificate
        .as_ref()
        .and_then(|c| c.verification_code.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| FALLBACK_VERIFICATION_CODE.to_string());
    match element.data_source {
        QrCodeDataSource::VerificationCode => code,
        QrCodeDataSource::VerificationUrl => {
            format!("{}/{}", verification_base_url.trim_end_matches('/'), code)
        }
    }
}
