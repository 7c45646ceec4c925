//! Locale tables: country names, nationalities, gender labels and digits.
//!
//! Only English and Arabic are carried; other languages read the English
//! column.

use super::types::Gender;

struct Country {
    code: &'static str,
    name_en: &'static str,
    name_ar: &'static str,
    nationality_en: &'static str,
    nationality_ar: &'static str,
}

const COUNTRIES: &[Country] = &[
    Country { code: "AE", name_en: "United Arab Emirates", name_ar: "الإمارات العربية المتحدة", nationality_en: "Emirati", nationality_ar: "إماراتي" },
    Country { code: "DE", name_en: "Germany", name_ar: "ألمانيا", nationality_en: "German", nationality_ar: "ألماني" },
    Country { code: "EG", name_en: "Egypt", name_ar: "مصر", nationality_en: "Egyptian", nationality_ar: "مصري" },
    Country { code: "ES", name_en: "Spain", name_ar: "إسبانيا", nationality_en: "Spanish", nationality_ar: "إسباني" },
    Country { code: "FR", name_en: "France", name_ar: "فرنسا", nationality_en: "French", nationality_ar: "فرنسي" },
    Country { code: "GB", name_en: "United Kingdom", name_ar: "المملكة المتحدة", nationality_en: "British", nationality_ar: "بريطاني" },
    Country { code: "IN", name_en: "India", name_ar: "الهند", nationality_en: "Indian", nationality_ar: "هندي" },
    Country { code: "IQ", name_en: "Iraq", name_ar: "العراق", nationality_en: "Iraqi", nationality_ar: "عراقي" },
    Country { code: "JO", name_en: "Jordan", name_ar: "الأردن", nationality_en: "Jordanian", nationality_ar: "أردني" },
    Country { code: "JP", name_en: "Japan", name_ar: "اليابان", nationality_en: "Japanese", nationality_ar: "ياباني" },
    Country { code: "LB", name_en: "Lebanon", name_ar: "لبنان", nationality_en: "Lebanese", nationality_ar: "لبناني" },
    Country { code: "MA", name_en: "Morocco", name_ar: "المغرب", nationality_en: "Moroccan", nationality_ar: "مغربي" },
    Country { code: "PS", name_en: "Palestine", name_ar: "فلسطين", nationality_en: "Palestinian", nationality_ar: "فلسطيني" },
    Country { code: "SA", name_en: "Saudi Arabia", name_ar: "المملكة العربية السعودية", nationality_en: "Saudi", nationality_ar: "سعودي" },
    Country { code: "SY", name_en: "Syria", name_ar: "سوريا", nationality_en: "Syrian", nationality_ar: "سوري" },
    Country { code: "TN", name_en: "Tunisia", name_ar: "تونس", nationality_en: "Tunisian", nationality_ar: "تونسي" },
    Country { code: "TR", name_en: "Turkey", name_ar: "تركيا", nationality_en: "Turkish", nationality_ar: "تركي" },
    Country { code: "US", name_en: "United States", name_ar: "الولايات المتحدة", nationality_en: "American", nationality_ar: "أمريكي" },
];

fn find_country(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Localized country name for an ISO 3166-1 alpha-2 code.
pub fn country_name(code: &str, language: &str) -> Option<&'static str> {
    find_country(code).map(|c| if language == "ar" { c.name_ar } else { c.name_en })
}

/// Localized nationality adjective for an ISO 3166-1 alpha-2 code.
pub fn nationality(code: &str, language: &str) -> Option<&'static str> {
    find_country(code).map(|c| {
        if language == "ar" {
            c.nationality_ar
        } else {
            c.nationality_en
        }
    })
}

pub fn gender_label(gender: Gender, language: &str) -> &'static str {
    match (gender, language == "ar") {
        (Gender::Male, false) => "Male",
        (Gender::Female, false) => "Female",
        (Gender::Other, false) => "Other",
        (Gender::Male, true) => "ذكر",
        (Gender::Female, true) => "أنثى",
        (Gender::Other, true) => "آخر",
    }
}

/// Replace ASCII digits and the decimal point with the locale's own glyphs.
pub fn localize_digits(formatted: &str, language: &str) -> String {
    if language != "ar" {
        return formatted.to_string();
    }
    formatted
        .chars()
        .map(|ch| match ch {
            '0'..='9' => char::from_u32(0x0660 + (ch as u32 - '0' as u32)).unwrap_or(ch),
            '.' => '\u{066B}',
            _ => ch,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_lookup_is_case_insensitive() {
        assert_eq!(country_name("eg", "en"), Some("Egypt"));
        assert_eq!(nationality("EG", "en"), Some("Egyptian"));
        assert_eq!(country_name("EG", "ar"), Some("مصر"));
    }

    #[test]
    fn test_unknown_country() {
        assert_eq!(country_name("ZZ", "en"), None);
    }

    #[test]
    fn test_arabic_digits() {
        assert_eq!(localize_digits("12.50", "ar"), "١٢٫٥٠");
        assert_eq!(localize_digits("12.50", "en"), "12.50");
    }

    #[test]
    fn test_gender_labels() {
        assert_eq!(gender_label(Gender::Female, "en"), "Female");
        assert_eq!(gender_label(Gender::Male, "ar"), "ذكر");
    }
}
