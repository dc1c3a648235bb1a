//! Value normalisation shared by every extraction technique.
//!
//! Listing pages write numbers the French way ("1 400 000 €", "65,5 m²") and
//! mix real data with plausible-looking noise, so every extracted value goes
//! through one of the validators below before it reaches a record.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;

use crate::record::{EnergyRating, PropertyType};

pub const PRICE_RANGE: RangeInclusive<f64> = 10_000.0..=50_000_000.0;
pub const SURFACE_RANGE: RangeInclusive<f64> = 9.0..=1_000.0;
pub const ROOMS_RANGE: RangeInclusive<u32> = 1..=20;
pub const BEDROOMS_RANGE: RangeInclusive<u32> = 0..=15;
pub const FLOOR_RANGE: RangeInclusive<u32> = 0..=50;
pub const YEAR_RANGE: RangeInclusive<u32> = 1800..=2030;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1_000;

/// Large French cities, matched case-insensitively against titles and prose.
pub const LARGE_CITIES: &[&str] = &[
    "Paris", "Marseille", "Lyon", "Toulouse", "Nice", "Nantes", "Montpellier", "Strasbourg", "Bordeaux", "Lille",
    "Rennes", "Reims", "Saint-Étienne", "Le Havre", "Toulon", "Grenoble", "Dijon", "Angers", "Nîmes",
    "Villeurbanne", "Clermont-Ferrand", "Le Mans", "Aix-en-Provence", "Brest", "Tours", "Amiens", "Limoges",
    "Annecy", "Perpignan", "Boulogne-Billancourt", "Metz", "Besançon", "Orléans", "Rouen", "Mulhouse", "Caen",
    "Nancy", "Saint-Denis", "Argenteuil", "Montreuil", "Roubaix", "Tourcoing", "Dunkerque", "Avignon", "Créteil",
    "Poitiers", "Nanterre", "Versailles", "Courbevoie", "Vitry-sur-Seine", "Colombes", "Asnières-sur-Seine",
    "Aulnay-sous-Bois", "Rueil-Malmaison", "Champigny-sur-Marne", "Aubervilliers", "Saint-Maur-des-Fossés",
    "Drancy", "Issy-les-Moulineaux", "Levallois-Perret", "Noisy-le-Grand", "Antony", "Neuilly-sur-Seine", "Cergy",
    "Vénissieux", "Clichy", "Ivry-sur-Seine", "La Rochelle", "Calais", "Saint-Quentin", "Béziers", "Ajaccio",
    "Bastia", "Cannes", "Antibes", "Mérignac", "Pessac", "Hyères", "Fréjus", "Lorient", "Quimper", "Troyes",
    "Sarcelles", "Villejuif", "Pantin", "Bobigny", "Bondy", "Fontenay-sous-Bois", "Clamart", "Chelles",
    "Le Blanc-Mesnil", "Évry", "Saint-Ouen", "Meaux", "Sevran", "Montrouge", "Suresnes", "Massy", "Vincennes",
    "Saint-Germain-en-Laye",
];

static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+|\b(?:rue|avenue|boulevard|allée|impasse|place|chemin|passage|square|quai|cours)\b").unwrap()
});

static CITY_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)appartement|maison|vente|achat|pièces?|chambres?|\b[TF]\d|\d+\s*(?:pièces?|chambres?|m\b)").unwrap()
});

static POSTAL_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{5}").unwrap());

static MAISON_WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:maison|villa|pavillon|longère|mas)\b").unwrap());

static APPARTEMENT_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:appartement|studio|loft|duplex|triplex)\b").unwrap());

/// Compiles a list of literal patterns.
pub(crate) fn regexes(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid pattern {}: {}", p, e)))
        .collect()
}

/// First capture group of each pattern that matches, in pattern order.
pub(crate) fn captures<'h>(patterns: &'h [Regex], haystack: &'h str) -> impl Iterator<Item = &'h str> + 'h {
    patterns
        .iter()
        .filter_map(move |re| re.captures(haystack))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parses a French-formatted number ("1 400 000", "65,5", "250.000").
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    // Dots are thousands separators in "1.400.000", "250.000" and "1.250,50".
    let dots = cleaned.matches('.').count();
    let grouped = dots > 1
        || (dots == 1 && cleaned.contains(','))
        || (dots == 1
            && cleaned
                .split_once('.')
                .is_some_and(|(int, frac)| !int.is_empty() && frac.len() == 3));
    let cleaned = if grouped { cleaned.replace('.', "") } else { cleaned };

    let normalized = cleaned.replacen(',', ".", 1).replace(',', "");
    let normalized = normalized.trim_matches('.');
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_int(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

pub fn valid_price(value: f64) -> Option<f64> {
    PRICE_RANGE.contains(&value).then_some(value)
}

pub fn valid_surface(value: f64) -> Option<f64> {
    SURFACE_RANGE.contains(&value).then_some(value)
}

pub fn valid_rooms(value: u32) -> Option<u32> {
    ROOMS_RANGE.contains(&value).then_some(value)
}

pub fn valid_bedrooms(value: u32) -> Option<u32> {
    BEDROOMS_RANGE.contains(&value).then_some(value)
}

pub fn valid_floor(value: u32) -> Option<u32> {
    FLOOR_RANGE.contains(&value).then_some(value)
}

pub fn valid_year(value: u32) -> Option<u32> {
    YEAR_RANGE.contains(&value).then_some(value)
}

/// Converts a charges amount to a monthly figure; amounts above 500 are yearly.
pub fn monthly_charges(value: f64) -> Option<f64> {
    if value <= 0.0 || value >= 50_000.0 {
        return None;
    }
    Some(if value > 500.0 { (value / 12.0).round() } else { value })
}

pub fn valid_property_tax(value: f64) -> Option<f64> {
    (value > 0.0 && value < 20_000.0).then_some(value)
}

/// Accepts five-digit French postal codes whose department part is 01 to 98.
pub fn valid_postal_code(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() != 5 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let dept: u32 = raw[..2].parse().ok()?;
    (1..=98).contains(&dept).then(|| raw.to_string())
}

pub fn rating(raw: &str) -> Option<EnergyRating> {
    raw.trim().parse::<EnergyRating>().ok().filter(|r| *r != EnergyRating::NotCommunicated)
}

pub fn property_type_from(text: &str) -> Option<PropertyType> {
    if MAISON_WORDS.is_match(text) {
        Some(PropertyType::Maison)
    } else if APPARTEMENT_WORDS.is_match(text) {
        Some(PropertyType::Appartement)
    } else {
        None
    }
}

pub fn is_street_address(text: &str) -> bool {
    STREET_ADDRESS.is_match(text.trim())
}

/// Finds one of [`LARGE_CITIES`] inside `text`.
pub fn find_known_city(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    LARGE_CITIES.iter().copied().find(|city| lower.contains(&city.to_lowercase()))
}

/// City implied by a postal code for the three cities split into arrondissements.
pub fn city_from_postal(postal_code: &str) -> Option<&'static str> {
    match postal_code.get(..2)? {
        "75" => Some("Paris"),
        "69" => Some("Lyon"),
        "13" => Some("Marseille"),
        _ => None,
    }
}

/// Cleans a city candidate, rejecting strings that look like listing titles.
pub fn clean_city(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty()
        || raw.chars().count() > 40
        || raw.contains('€')
        || raw.contains("m²")
        || raw.contains("m2")
        || CITY_NOISE.is_match(raw)
    {
        return None;
    }

    let stripped = POSTAL_IN_TEXT.replace_all(raw, "");
    let stripped = stripped
        .replace(['(', ')'], "")
        .trim_matches(|c: char| c.is_whitespace() || c == '-' || c == ',')
        .to_string();
    if stripped.is_empty() {
        return None;
    }

    let dashed: Vec<String> = stripped.split('-').map(capitalize_lower).collect();
    let spaced: Vec<String> = dashed.join("-").split(' ').map(capitalize_first).collect();
    Some(spaced.join(" "))
}

fn capitalize_lower(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn capitalize_first(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Decodes common entities, unescapes JSON escapes, collapses whitespace and truncates.
pub fn clean_text(raw: &str, max_chars: usize) -> String {
    let decoded = raw
        .replace("\\n", " ")
        .replace("\\r", "")
        .replace("\\t", " ")
        .replace("\\\"", "\"")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect::<String>().trim_end().to_string()
}
