//! Multilingual country alias index.
//!
//! Aliases cover English plus the native and major-language names for the
//! countries that dominate the news corpus. Sovereign-state aliases carry
//! the `PCLI` feature code; a handful of supranational regions are kept so
//! lookups can reject them.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

/// GeoNames-style feature code for sovereign states.
pub const FEATURE_SOVEREIGN: &str = "PCLI";
/// Feature code for non-sovereign regions kept in the index.
pub const FEATURE_REGION: &str = "RGN";

/// One alias resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceTag {
    pub feature_code: &'static str,
    pub score: f64,
    pub alpha2: &'static str,
    pub name: &'static str,
}

/// (alias, alpha2, canonical name, score, feature code)
/// Official names score 1.0, native or translated forms 0.9, informal
/// abbreviations 0.8.
type AliasRow = (&'static str, &'static str, &'static str, f64, &'static str);

#[rustfmt::skip]
static ALIASES: &[AliasRow] = &[
    // Americas
    ("united states", "US", "United States", 1.0, FEATURE_SOVEREIGN),
    ("united states of america", "US", "United States", 1.0, FEATURE_SOVEREIGN),
    ("usa", "US", "United States", 0.8, FEATURE_SOVEREIGN),
    ("america", "US", "United States", 0.8, FEATURE_SOVEREIGN),
    ("estados unidos", "US", "United States", 0.9, FEATURE_SOVEREIGN),
    ("états-unis", "US", "United States", 0.9, FEATURE_SOVEREIGN),
    ("canada", "CA", "Canada", 1.0, FEATURE_SOVEREIGN),
    ("canadá", "CA", "Canada", 0.9, FEATURE_SOVEREIGN),
    ("mexico", "MX", "Mexico", 1.0, FEATURE_SOVEREIGN),
    ("méxico", "MX", "Mexico", 0.9, FEATURE_SOVEREIGN),
    ("brazil", "BR", "Brazil", 1.0, FEATURE_SOVEREIGN),
    ("brasil", "BR", "Brazil", 0.9, FEATURE_SOVEREIGN),
    ("brésil", "BR", "Brazil", 0.9, FEATURE_SOVEREIGN),
    ("brasilien", "BR", "Brazil", 0.9, FEATURE_SOVEREIGN),
    ("argentina", "AR", "Argentina", 1.0, FEATURE_SOVEREIGN),
    ("argentine", "AR", "Argentina", 0.9, FEATURE_SOVEREIGN),
    ("chile", "CL", "Chile", 1.0, FEATURE_SOVEREIGN),
    ("colombia", "CO", "Colombia", 1.0, FEATURE_SOVEREIGN),
    ("colômbia", "CO", "Colombia", 0.9, FEATURE_SOVEREIGN),
    ("peru", "PE", "Peru", 1.0, FEATURE_SOVEREIGN),
    ("venezuela", "VE", "Venezuela", 1.0, FEATURE_SOVEREIGN),
    ("bolivia", "BO", "Bolivia", 1.0, FEATURE_SOVEREIGN),
    ("bolívia", "BO", "Bolivia", 0.9, FEATURE_SOVEREIGN),
    ("ecuador", "EC", "Ecuador", 1.0, FEATURE_SOVEREIGN),
    ("equador", "EC", "Ecuador", 0.9, FEATURE_SOVEREIGN),
    ("uruguay", "UY", "Uruguay", 1.0, FEATURE_SOVEREIGN),
    ("uruguai", "UY", "Uruguay", 0.9, FEATURE_SOVEREIGN),
    ("paraguay", "PY", "Paraguay", 1.0, FEATURE_SOVEREIGN),
    ("paraguai", "PY", "Paraguay", 0.9, FEATURE_SOVEREIGN),
    ("cuba", "CU", "Cuba", 1.0, FEATURE_SOVEREIGN),
    ("haiti", "HT", "Haiti", 1.0, FEATURE_SOVEREIGN),

    // Europe
    ("united kingdom", "GB", "United Kingdom", 1.0, FEATURE_SOVEREIGN),
    ("uk", "GB", "United Kingdom", 0.8, FEATURE_SOVEREIGN),
    ("britain", "GB", "United Kingdom", 0.8, FEATURE_SOVEREIGN),
    ("great britain", "GB", "United Kingdom", 0.9, FEATURE_SOVEREIGN),
    ("reino unido", "GB", "United Kingdom", 0.9, FEATURE_SOVEREIGN),
    ("royaume-uni", "GB", "United Kingdom", 0.9, FEATURE_SOVEREIGN),
    ("france", "FR", "France", 1.0, FEATURE_SOVEREIGN),
    ("frança", "FR", "France", 0.9, FEATURE_SOVEREIGN),
    ("francia", "FR", "France", 0.9, FEATURE_SOVEREIGN),
    ("frankreich", "FR", "France", 0.9, FEATURE_SOVEREIGN),
    ("germany", "DE", "Germany", 1.0, FEATURE_SOVEREIGN),
    ("deutschland", "DE", "Germany", 0.9, FEATURE_SOVEREIGN),
    ("alemanha", "DE", "Germany", 0.9, FEATURE_SOVEREIGN),
    ("allemagne", "DE", "Germany", 0.9, FEATURE_SOVEREIGN),
    ("alemania", "DE", "Germany", 0.9, FEATURE_SOVEREIGN),
    ("spain", "ES", "Spain", 1.0, FEATURE_SOVEREIGN),
    ("españa", "ES", "Spain", 0.9, FEATURE_SOVEREIGN),
    ("espanha", "ES", "Spain", 0.9, FEATURE_SOVEREIGN),
    ("espagne", "ES", "Spain", 0.9, FEATURE_SOVEREIGN),
    ("portugal", "PT", "Portugal", 1.0, FEATURE_SOVEREIGN),
    ("italy", "IT", "Italy", 1.0, FEATURE_SOVEREIGN),
    ("italia", "IT", "Italy", 0.9, FEATURE_SOVEREIGN),
    ("itália", "IT", "Italy", 0.9, FEATURE_SOVEREIGN),
    ("italie", "IT", "Italy", 0.9, FEATURE_SOVEREIGN),
    ("netherlands", "NL", "Netherlands", 1.0, FEATURE_SOVEREIGN),
    ("nederland", "NL", "Netherlands", 0.9, FEATURE_SOVEREIGN),
    ("holanda", "NL", "Netherlands", 0.8, FEATURE_SOVEREIGN),
    ("belgium", "BE", "Belgium", 1.0, FEATURE_SOVEREIGN),
    ("belgique", "BE", "Belgium", 0.9, FEATURE_SOVEREIGN),
    ("bélgica", "BE", "Belgium", 0.9, FEATURE_SOVEREIGN),
    ("switzerland", "CH", "Switzerland", 1.0, FEATURE_SOVEREIGN),
    ("suisse", "CH", "Switzerland", 0.9, FEATURE_SOVEREIGN),
    ("suíça", "CH", "Switzerland", 0.9, FEATURE_SOVEREIGN),
    ("austria", "AT", "Austria", 1.0, FEATURE_SOVEREIGN),
    ("áustria", "AT", "Austria", 0.9, FEATURE_SOVEREIGN),
    ("österreich", "AT", "Austria", 0.9, FEATURE_SOVEREIGN),
    ("poland", "PL", "Poland", 1.0, FEATURE_SOVEREIGN),
    ("polska", "PL", "Poland", 0.9, FEATURE_SOVEREIGN),
    ("polônia", "PL", "Poland", 0.9, FEATURE_SOVEREIGN),
    ("pologne", "PL", "Poland", 0.9, FEATURE_SOVEREIGN),
    ("ukraine", "UA", "Ukraine", 1.0, FEATURE_SOVEREIGN),
    ("ucrânia", "UA", "Ukraine", 0.9, FEATURE_SOVEREIGN),
    ("ucrania", "UA", "Ukraine", 0.9, FEATURE_SOVEREIGN),
    ("russia", "RU", "Russia", 1.0, FEATURE_SOVEREIGN),
    ("russian federation", "RU", "Russia", 1.0, FEATURE_SOVEREIGN),
    ("rússia", "RU", "Russia", 0.9, FEATURE_SOVEREIGN),
    ("russie", "RU", "Russia", 0.9, FEATURE_SOVEREIGN),
    ("russland", "RU", "Russia", 0.9, FEATURE_SOVEREIGN),
    ("greece", "GR", "Greece", 1.0, FEATURE_SOVEREIGN),
    ("grécia", "GR", "Greece", 0.9, FEATURE_SOVEREIGN),
    ("sweden", "SE", "Sweden", 1.0, FEATURE_SOVEREIGN),
    ("suécia", "SE", "Sweden", 0.9, FEATURE_SOVEREIGN),
    ("norway", "NO", "Norway", 1.0, FEATURE_SOVEREIGN),
    ("noruega", "NO", "Norway", 0.9, FEATURE_SOVEREIGN),
    ("denmark", "DK", "Denmark", 1.0, FEATURE_SOVEREIGN),
    ("dinamarca", "DK", "Denmark", 0.9, FEATURE_SOVEREIGN),
    ("finland", "FI", "Finland", 1.0, FEATURE_SOVEREIGN),
    ("finlândia", "FI", "Finland", 0.9, FEATURE_SOVEREIGN),
    ("ireland", "IE", "Ireland", 1.0, FEATURE_SOVEREIGN),
    ("irlanda", "IE", "Ireland", 0.9, FEATURE_SOVEREIGN),
    ("czech republic", "CZ", "Czechia", 1.0, FEATURE_SOVEREIGN),
    ("czechia", "CZ", "Czechia", 1.0, FEATURE_SOVEREIGN),
    ("hungary", "HU", "Hungary", 1.0, FEATURE_SOVEREIGN),
    ("hungria", "HU", "Hungary", 0.9, FEATURE_SOVEREIGN),
    ("romania", "RO", "Romania", 1.0, FEATURE_SOVEREIGN),
    ("romênia", "RO", "Romania", 0.9, FEATURE_SOVEREIGN),
    ("bulgaria", "BG", "Bulgaria", 1.0, FEATURE_SOVEREIGN),
    ("serbia", "RS", "Serbia", 1.0, FEATURE_SOVEREIGN),
    ("sérvia", "RS", "Serbia", 0.9, FEATURE_SOVEREIGN),
    ("croatia", "HR", "Croatia", 1.0, FEATURE_SOVEREIGN),
    ("croácia", "HR", "Croatia", 0.9, FEATURE_SOVEREIGN),
    ("belarus", "BY", "Belarus", 1.0, FEATURE_SOVEREIGN),
    ("bielorrússia", "BY", "Belarus", 0.9, FEATURE_SOVEREIGN),
    ("moldova", "MD", "Moldova", 1.0, FEATURE_SOVEREIGN),
    ("georgia", "GE", "Georgia", 0.8, FEATURE_SOVEREIGN),
    ("geórgia", "GE", "Georgia", 0.8, FEATURE_SOVEREIGN),

    // Middle East & Africa
    ("turkey", "TR", "Turkey", 1.0, FEATURE_SOVEREIGN),
    ("türkiye", "TR", "Turkey", 1.0, FEATURE_SOVEREIGN),
    ("turquia", "TR", "Turkey", 0.9, FEATURE_SOVEREIGN),
    ("iran", "IR", "Iran", 1.0, FEATURE_SOVEREIGN),
    ("irã", "IR", "Iran", 0.9, FEATURE_SOVEREIGN),
    ("iraq", "IQ", "Iraq", 1.0, FEATURE_SOVEREIGN),
    ("iraque", "IQ", "Iraq", 0.9, FEATURE_SOVEREIGN),
    ("israel", "IL", "Israel", 1.0, FEATURE_SOVEREIGN),
    ("palestine", "PS", "Palestine", 1.0, FEATURE_SOVEREIGN),
    ("palestina", "PS", "Palestine", 0.9, FEATURE_SOVEREIGN),
    ("syria", "SY", "Syria", 1.0, FEATURE_SOVEREIGN),
    ("síria", "SY", "Syria", 0.9, FEATURE_SOVEREIGN),
    ("syrie", "SY", "Syria", 0.9, FEATURE_SOVEREIGN),
    ("lebanon", "LB", "Lebanon", 1.0, FEATURE_SOVEREIGN),
    ("líbano", "LB", "Lebanon", 0.9, FEATURE_SOVEREIGN),
    ("jordan", "JO", "Jordan", 0.9, FEATURE_SOVEREIGN),
    ("jordânia", "JO", "Jordan", 0.9, FEATURE_SOVEREIGN),
    ("saudi arabia", "SA", "Saudi Arabia", 1.0, FEATURE_SOVEREIGN),
    ("arábia saudita", "SA", "Saudi Arabia", 0.9, FEATURE_SOVEREIGN),
    ("united arab emirates", "AE", "United Arab Emirates", 1.0, FEATURE_SOVEREIGN),
    ("uae", "AE", "United Arab Emirates", 0.8, FEATURE_SOVEREIGN),
    ("emirados árabes unidos", "AE", "United Arab Emirates", 0.9, FEATURE_SOVEREIGN),
    ("qatar", "QA", "Qatar", 1.0, FEATURE_SOVEREIGN),
    ("catar", "QA", "Qatar", 0.9, FEATURE_SOVEREIGN),
    ("kuwait", "KW", "Kuwait", 1.0, FEATURE_SOVEREIGN),
    ("yemen", "YE", "Yemen", 1.0, FEATURE_SOVEREIGN),
    ("iêmen", "YE", "Yemen", 0.9, FEATURE_SOVEREIGN),
    ("egypt", "EG", "Egypt", 1.0, FEATURE_SOVEREIGN),
    ("egito", "EG", "Egypt", 0.9, FEATURE_SOVEREIGN),
    ("égypte", "EG", "Egypt", 0.9, FEATURE_SOVEREIGN),
    ("libya", "LY", "Libya", 1.0, FEATURE_SOVEREIGN),
    ("líbia", "LY", "Libya", 0.9, FEATURE_SOVEREIGN),
    ("tunisia", "TN", "Tunisia", 1.0, FEATURE_SOVEREIGN),
    ("tunísia", "TN", "Tunisia", 0.9, FEATURE_SOVEREIGN),
    ("algeria", "DZ", "Algeria", 1.0, FEATURE_SOVEREIGN),
    ("argélia", "DZ", "Algeria", 0.9, FEATURE_SOVEREIGN),
    ("morocco", "MA", "Morocco", 1.0, FEATURE_SOVEREIGN),
    ("marrocos", "MA", "Morocco", 0.9, FEATURE_SOVEREIGN),
    ("nigeria", "NG", "Nigeria", 1.0, FEATURE_SOVEREIGN),
    ("nigéria", "NG", "Nigeria", 0.9, FEATURE_SOVEREIGN),
    ("south africa", "ZA", "South Africa", 1.0, FEATURE_SOVEREIGN),
    ("áfrica do sul", "ZA", "South Africa", 0.9, FEATURE_SOVEREIGN),
    ("ethiopia", "ET", "Ethiopia", 1.0, FEATURE_SOVEREIGN),
    ("etiópia", "ET", "Ethiopia", 0.9, FEATURE_SOVEREIGN),
    ("kenya", "KE", "Kenya", 1.0, FEATURE_SOVEREIGN),
    ("quênia", "KE", "Kenya", 0.9, FEATURE_SOVEREIGN),
    ("sudan", "SD", "Sudan", 1.0, FEATURE_SOVEREIGN),
    ("sudão", "SD", "Sudan", 0.9, FEATURE_SOVEREIGN),
    ("ghana", "GH", "Ghana", 1.0, FEATURE_SOVEREIGN),
    ("congo", "CD", "DR Congo", 0.8, FEATURE_SOVEREIGN),

    // Asia & Oceania
    ("china", "CN", "China", 1.0, FEATURE_SOVEREIGN),
    ("people's republic of china", "CN", "China", 1.0, FEATURE_SOVEREIGN),
    ("中国", "CN", "China", 0.9, FEATURE_SOVEREIGN),
    ("japan", "JP", "Japan", 1.0, FEATURE_SOVEREIGN),
    ("japão", "JP", "Japan", 0.9, FEATURE_SOVEREIGN),
    ("japon", "JP", "Japan", 0.9, FEATURE_SOVEREIGN),
    ("日本", "JP", "Japan", 0.9, FEATURE_SOVEREIGN),
    ("india", "IN", "India", 1.0, FEATURE_SOVEREIGN),
    ("índia", "IN", "India", 0.9, FEATURE_SOVEREIGN),
    ("inde", "IN", "India", 0.9, FEATURE_SOVEREIGN),
    ("pakistan", "PK", "Pakistan", 1.0, FEATURE_SOVEREIGN),
    ("paquistão", "PK", "Pakistan", 0.9, FEATURE_SOVEREIGN),
    ("bangladesh", "BD", "Bangladesh", 1.0, FEATURE_SOVEREIGN),
    ("afghanistan", "AF", "Afghanistan", 1.0, FEATURE_SOVEREIGN),
    ("afeganistão", "AF", "Afghanistan", 0.9, FEATURE_SOVEREIGN),
    ("south korea", "KR", "South Korea", 1.0, FEATURE_SOVEREIGN),
    ("coreia do sul", "KR", "South Korea", 0.9, FEATURE_SOVEREIGN),
    ("north korea", "KP", "North Korea", 1.0, FEATURE_SOVEREIGN),
    ("coreia do norte", "KP", "North Korea", 0.9, FEATURE_SOVEREIGN),
    ("indonesia", "ID", "Indonesia", 1.0, FEATURE_SOVEREIGN),
    ("indonésia", "ID", "Indonesia", 0.9, FEATURE_SOVEREIGN),
    ("malaysia", "MY", "Malaysia", 1.0, FEATURE_SOVEREIGN),
    ("malásia", "MY", "Malaysia", 0.9, FEATURE_SOVEREIGN),
    ("philippines", "PH", "Philippines", 1.0, FEATURE_SOVEREIGN),
    ("filipinas", "PH", "Philippines", 0.9, FEATURE_SOVEREIGN),
    ("thailand", "TH", "Thailand", 1.0, FEATURE_SOVEREIGN),
    ("tailândia", "TH", "Thailand", 0.9, FEATURE_SOVEREIGN),
    ("vietnam", "VN", "Vietnam", 1.0, FEATURE_SOVEREIGN),
    ("vietnã", "VN", "Vietnam", 0.9, FEATURE_SOVEREIGN),
    ("singapore", "SG", "Singapore", 1.0, FEATURE_SOVEREIGN),
    ("singapura", "SG", "Singapore", 0.9, FEATURE_SOVEREIGN),
    ("australia", "AU", "Australia", 1.0, FEATURE_SOVEREIGN),
    ("austrália", "AU", "Australia", 0.9, FEATURE_SOVEREIGN),
    ("new zealand", "NZ", "New Zealand", 1.0, FEATURE_SOVEREIGN),
    ("nova zelândia", "NZ", "New Zealand", 0.9, FEATURE_SOVEREIGN),
    ("kazakhstan", "KZ", "Kazakhstan", 1.0, FEATURE_SOVEREIGN),
    ("cazaquistão", "KZ", "Kazakhstan", 0.9, FEATURE_SOVEREIGN),
    ("mongolia", "MN", "Mongolia", 1.0, FEATURE_SOVEREIGN),
    ("taiwan", "TW", "Taiwan", 0.9, FEATURE_SOVEREIGN),
    ("sri lanka", "LK", "Sri Lanka", 1.0, FEATURE_SOVEREIGN),
    ("myanmar", "MM", "Myanmar", 1.0, FEATURE_SOVEREIGN),
    ("nepal", "NP", "Nepal", 1.0, FEATURE_SOVEREIGN),

    // Non-sovereign regions kept so lookups can reject them.
    ("europe", "", "Europe", 0.5, FEATURE_REGION),
    ("europa", "", "Europe", 0.5, FEATURE_REGION),
    ("latin america", "", "Latin America", 0.5, FEATURE_REGION),
    ("américa latina", "", "Latin America", 0.5, FEATURE_REGION),
    ("middle east", "", "Middle East", 0.5, FEATURE_REGION),
    ("oriente médio", "", "Middle East", 0.5, FEATURE_REGION),
    ("amazon", "", "Amazon", 0.5, FEATURE_REGION),
    ("amazônia", "", "Amazon", 0.5, FEATURE_REGION),
];

static INDEX: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(ALIASES.iter().map(|(alias, ..)| *alias))
        .expect("alias automaton")
});

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Scan free text for country aliases. Matches must sit on word boundaries
/// so `iran` never fires inside `Mediterranean`. Returns one entry per hit.
pub fn tag_text_countries(text: &str) -> Vec<PlaceTag> {
    let lowered = text.to_lowercase();
    let mut tags = Vec::new();

    for found in INDEX.find_iter(&lowered) {
        let (start, end) = (found.start(), found.end());
        let before_ok = lowered[..start]
            .chars()
            .next_back()
            .map(|c| !is_word_char(c))
            .unwrap_or(true);
        let after_ok = lowered[end..]
            .chars()
            .next()
            .map(|c| !is_word_char(c))
            .unwrap_or(true);
        if !before_ok || !after_ok {
            continue;
        }

        let (_, alpha2, name, score, feature_code) = ALIASES[found.pattern().as_usize()];
        if feature_code == FEATURE_SOVEREIGN {
            tags.push(PlaceTag {
                feature_code,
                score,
                alpha2,
                name,
            });
        }
    }

    tags
}

/// Exact alias lookup for one place name.
pub fn tag_place(name: &str) -> Option<PlaceTag> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    ALIASES
        .iter()
        .find(|(alias, ..)| *alias == needle)
        .map(|&(_, alpha2, name, score, feature_code)| PlaceTag {
            feature_code,
            score,
            alpha2,
            name,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_aliases_across_languages() {
        let tags = tag_text_countries("O Brasil e a França assinaram; Deutschland absteht.");
        let codes: Vec<_> = tags.iter().map(|t| t.alpha2).collect();
        assert!(codes.contains(&"BR"));
        assert!(codes.contains(&"FR"));
        assert!(codes.contains(&"DE"));
    }

    #[test]
    fn respects_word_boundaries() {
        // "iran" inside "Mediterranean" must not fire.
        let tags = tag_text_countries("Ships crossed the Mediterranean sea");
        assert!(tags.iter().all(|t| t.alpha2 != "IR"));

        let tags = tag_text_countries("Iran signed the accord");
        assert!(tags.iter().any(|t| t.alpha2 == "IR"));
    }

    #[test]
    fn counts_every_mention() {
        let tags = tag_text_countries("Brazil, Brazil and once more Brasil");
        let brazil = tags.iter().filter(|t| t.alpha2 == "BR").count();
        assert_eq!(brazil, 3);
    }

    #[test]
    fn tag_place_resolves_sovereign_states() {
        let tag = tag_place("Brasil").unwrap();
        assert_eq!(tag.feature_code, FEATURE_SOVEREIGN);
        assert_eq!(tag.alpha2, "BR");

        let tag = tag_place("  France  ").unwrap();
        assert_eq!(tag.alpha2, "FR");
    }

    #[test]
    fn tag_place_rejects_regions_and_unknowns() {
        let region = tag_place("Europe").unwrap();
        assert_eq!(region.feature_code, FEATURE_REGION);
        assert!(region.alpha2.is_empty());

        assert!(tag_place("Atlantis").is_none());
        assert!(tag_place("").is_none());
    }
}
