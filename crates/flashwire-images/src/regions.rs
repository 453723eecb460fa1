//! Search-locale expansion.
//!
//! Locales are `region-lang` pairs in the image backend's format. The set
//! always contains `us-en`, adds the article country with both its own
//! language and English, and widens to the territories where the article
//! language is spoken.

/// Territories per language, largest speaker bases first (CLDR-derived).
const LANGUAGE_TERRITORIES: &[(&str, &[&str])] = &[
    ("pt", &["br", "pt", "ao", "mz"]),
    ("es", &["es", "mx", "ar", "co", "cl", "pe"]),
    ("fr", &["fr", "ca", "be", "ch", "sn"]),
    ("de", &["de", "at", "ch"]),
    ("it", &["it", "ch"]),
    ("nl", &["nl", "be"]),
    ("ru", &["ru", "by", "kz"]),
    ("uk", &["ua"]),
    ("pl", &["pl"]),
    ("tr", &["tr", "cy"]),
    ("ar", &["sa", "eg", "ae", "ma", "iq"]),
    ("fa", &["ir", "af"]),
    ("hi", &["in"]),
    ("ja", &["jp"]),
    ("ko", &["kr"]),
    ("zh", &["cn", "tw", "hk", "sg"]),
    ("id", &["id"]),
    ("th", &["th"]),
    ("vi", &["vn"]),
    ("sv", &["se"]),
    ("en", &["us", "gb", "au", "ca", "in", "ie", "nz", "za"]),
];

/// Compute the sorted locale set for an article.
///
/// `language` is the article's ISO-639-1 code (may be empty), `country` an
/// optional alpha2 code.
pub fn search_regions(language: &str, country: Option<&str>) -> Vec<String> {
    let language = language.to_lowercase();
    let country = country.map(str::to_lowercase);
    let mut regions = vec!["us-en".to_string()];

    if let Some(country) = &country {
        if !language.is_empty() {
            regions.push(format!("{country}-{language}"));
        }
        regions.push(format!("{country}-en"));
    }

    if !language.is_empty() && language != "en" {
        if let Some((_, territories)) = LANGUAGE_TERRITORIES
            .iter()
            .find(|(lang, _)| *lang == language)
        {
            for territory in *territories {
                regions.push(format!("{territory}-{language}"));
            }
        }
    }

    regions.sort();
    regions.dedup();
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_contains_us_en() {
        assert_eq!(search_regions("", None), vec!["us-en"]);
        assert!(search_regions("en", None).contains(&"us-en".to_string()));
    }

    #[test]
    fn expands_article_language_across_territories() {
        let regions = search_regions("pt", Some("BR"));
        assert!(regions.contains(&"br-pt".to_string()));
        assert!(regions.contains(&"pt-pt".to_string()));
        assert!(regions.contains(&"br-en".to_string()));
        assert!(regions.contains(&"us-en".to_string()));
    }

    #[test]
    fn english_articles_do_not_fan_out() {
        let regions = search_regions("en", Some("GB"));
        assert_eq!(regions, vec!["gb-en", "us-en"]);
    }

    #[test]
    fn output_is_sorted_and_unique() {
        let regions = search_regions("fr", Some("FR"));
        let mut sorted = regions.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(regions, sorted);
    }
}
