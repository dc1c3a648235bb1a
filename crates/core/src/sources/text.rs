//! Free-text heuristic extraction.
//!
//! Works on unstructured prose: the visible text of a page, a reader
//! service's plain-text output, crawl markdown or text pasted by a user.
//! Lowest trust of the four techniques.

use std::sync::LazyLock;

use regex::Regex;

use super::values::{
    TITLE_MAX_CHARS, captures, clean_city, find_known_city, monthly_charges, parse_int,
    parse_number, property_type_from, rating, regexes, valid_bedrooms, valid_floor, valid_postal_code, valid_price,
    valid_property_tax, valid_rooms, valid_surface,
};
use crate::record::ListingFields;

static PRICE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r"(?i)prix\s*(?:de\s*vente)?\s*:?\s*(\d{1,3}(?:[\s\x{a0}\x{202f}]\d{3})*)\s*€",
        r"(\d{1,3}(?:[\s\x{a0}\x{202f}]\d{3})+)\s*€",
        r"(\d{6,8})\s*€",
        r"(?i)(\d{1,3}(?:[\s\x{a0}\x{202f}]\d{3})+)\s*euros?",
    ])
});

static SURFACE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r"(?i)(\d+(?:[.,]\d+)?)\s*m[²2]",
        r"(?i)surface\s*:?\s*(\d+(?:[.,]\d+)?)\s*m",
        r"(?i)surface\s*habitable\s*:?\s*(\d+(?:[.,]\d+)?)",
    ])
});

static ROOMS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| regexes(&[r"(?i)(\d+)\s*pi[èe]ces?", r"(?i)\b[TF](\d)\b", r"(?i)(\d+)\s*p\b"]));

static BEDROOMS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| regexes(&[r"(?i)(\d+)\s*chambres?", r"(?i)chambres?\s*:?\s*(\d+)"]));

static ENERGY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r"(?i)\bDPE\s*:?\s*([A-G])\b",
        r"(?i)classe\s*(?:énergie|énergétique)\s*:?\s*([A-G])\b",
        r"(?i)diagnostic\s*(?:de\s*)?performance\s*énergétique\s*:?\s*([A-G])\b",
        r"(?i)étiquette\s*énergie\s*:?\s*([A-G])\b",
    ])
});

static GHG: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r"(?i)\bGES\s*:?\s*([A-G])\b",
        r"(?i)gaz\s*(?:à\s*)?effet\s*(?:de\s*)?serre\s*:?\s*([A-G])\b",
    ])
});

static FLOOR: LazyLock<Vec<Regex>> =
    LazyLock::new(|| regexes(&[r"(?i)\b(\d+)(?:er|ère|e|ème)?\s*étage", r"(?i)étage\s*:?\s*(\d+)"]));

static GROUND_FLOOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)rez[- ]de[- ]chauss[ée]e|\brdc\b").unwrap());

static CHARGES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r"(?i)charges?\s*(?:de\s+)?copropriété\s*:?\s*(\d[\d\s]*)\s*€?",
        r"(?i)charges?\s*mensuelles?\s*:?\s*(\d[\d\s]*)\s*€",
        r"(?i)provisions?\s*sur\s*charges?\s*:?\s*(\d[\d\s]*)\s*€",
        r"(?i)charges?\s*:\s*(\d[\d\s]*)\s*€\s*/\s*mois",
        r"(?i)(\d[\d\s]*)\s*€\s*(?:de\s+)?charges?\s*(?:par\s+mois|/\s*mois|mensuelles?)",
    ])
});

static PROPERTY_TAX: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r"(?i)taxe\s*foncière\s*:?\s*(\d[\d\s]*)\s*€",
        r"(?i)foncière?\s*:?\s*(\d[\d\s]*)\s*€",
        r"(?i)(\d[\d\s]*)\s*€\s*(?:de\s+)?taxe\s*foncière",
    ])
});

static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{5})\b").unwrap());

static CITY_WITH_POSTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Lu}\p{Ll}+(?:[- ]\p{Lu}\p{Ll}+|-\p{Ll}+)*)\s*\(?\s*(\d{5})\s*\)?").unwrap());

static POSTAL_WITH_CITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{5})\s+(\p{Lu}\p{Ll}+(?:-\p{L}+)*)").unwrap());

static ELEVATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bascenseur\b").unwrap());
static NO_ELEVATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)sans\s+ascenseur").unwrap());
static OUTDOOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:balcon|terrasse|loggia)s?\b").unwrap());
static PARKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:parking|garage|box)\b|place\s+de\s+stationnement").unwrap());
static CELLAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bcave\b").unwrap());

static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)appartement|maison|studio|loft|duplex|villa|pièces?|chambres?|\b[TF]\d\b").unwrap()
});

/// Lines scanned when looking for a title.
const TITLE_SCAN_LINES: usize = 10;

/// Extracts listing fields from unstructured text.
pub fn extract_free_text(text: &str) -> ListingFields {
    let text = normalize(text);
    if text.is_empty() {
        return ListingFields::default();
    }

    let mut fields = ListingFields {
        price: price_in(&text),
        surface: surface_in(&text),
        rooms: rooms_in(&text),
        bedrooms: captures(&BEDROOMS, &text)
            .filter_map(parse_int)
            .find_map(valid_bedrooms),
        property_type: property_type_from(&text),
        energy_rating: captures(&ENERGY, &text).find_map(rating),
        ghg_rating: captures(&GHG, &text).find_map(rating),
        floor: captures(&FLOOR, &text).filter_map(parse_int).find_map(valid_floor),
        monthly_charges: captures(&CHARGES, &text)
            .filter_map(parse_number)
            .find_map(monthly_charges),
        property_tax: captures(&PROPERTY_TAX, &text)
            .filter_map(parse_number)
            .find_map(valid_property_tax),
        title: title_in(&text),
        ..Default::default()
    };

    if fields.floor.is_none() && GROUND_FLOOR.is_match(&text) {
        fields.floor = Some(0);
    }

    let (city, postal_code) = location_in(&text);
    fields.city = city;
    fields.postal_code = postal_code;

    if ELEVATOR.is_match(&text) && !NO_ELEVATOR.is_match(&text) {
        fields.elevator = Some(true);
    }
    fields.outdoor_space = OUTDOOR.is_match(&text).then_some(true);
    fields.parking = PARKING.is_match(&text).then_some(true);
    fields.cellar = CELLAR.is_match(&text).then_some(true);

    fields
}

pub(crate) fn price_in(text: &str) -> Option<f64> {
    captures(&PRICE, text).filter_map(parse_number).find_map(valid_price)
}

pub(crate) fn surface_in(text: &str) -> Option<f64> {
    captures(&SURFACE, text)
        .filter_map(parse_number)
        .find_map(valid_surface)
}

pub(crate) fn rooms_in(text: &str) -> Option<u32> {
    captures(&ROOMS, text).filter_map(parse_int).find_map(valid_rooms)
}

/// City and postal code from `Ville (75001)` / `75001 Ville` notations, a
/// standalone postal code, or a known large city.
pub(crate) fn location_in(text: &str) -> (Option<String>, Option<String>) {
    let mut postal_code = POSTAL_CODE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find_map(|m| valid_postal_code(m.as_str()));
    let mut city = None;

    let pair = CITY_WITH_POSTAL
        .captures(text)
        .and_then(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .or_else(|| {
            POSTAL_WITH_CITY
                .captures(text)
                .and_then(|c| Some((c.get(2)?.as_str(), c.get(1)?.as_str())))
        });
    if let Some((name, cp)) = pair
        && let Some(cp) = valid_postal_code(cp)
    {
        city = clean_city(name);
        postal_code = Some(cp);
    }

    if city.is_none() {
        city = find_known_city(text).map(str::to_string);
    }

    (city, postal_code)
}

/// First short line among the first few that reads like a listing title.
fn title_in(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(TITLE_SCAN_LINES)
        .find(|l| TITLE_LINE.is_match(l) && l.chars().count() < TITLE_MAX_CHARS)
        .map(|l| l.trim_start_matches('#').trim().to_string())
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EnergyRating, PropertyType};
    use rstest::rstest;

    const PASTED: &str = "
        Accueil > Vente > Lyon

        Appartement T4 lumineux avec balcon
        Lyon 3e (69003)

        Prix : 385 000 €
        92 m² · 4 pièces · 3 chambres
        3ème étage avec ascenseur, cave et place de stationnement.
        Charges de copropriété : 2 400 € / an
        Taxe foncière : 1 250 €
        DPE : D   GES : b
    ";

    #[test]
    fn test_pasted_listing() {
        let fields = extract_free_text(PASTED);

        assert_eq!(fields.price, Some(385_000.0));
        assert_eq!(fields.surface, Some(92.0));
        assert_eq!(fields.rooms, Some(4));
        assert_eq!(fields.bedrooms, Some(3));
        assert_eq!(fields.postal_code.as_deref(), Some("69003"));
        assert_eq!(fields.city.as_deref(), Some("Lyon"));
        assert_eq!(fields.property_type, Some(PropertyType::Appartement));
        assert_eq!(fields.energy_rating, Some(EnergyRating::D));
        assert_eq!(fields.ghg_rating, Some(EnergyRating::B));
        assert_eq!(fields.floor, Some(3));
        assert_eq!(fields.monthly_charges, Some(200.0));
        assert_eq!(fields.property_tax, Some(1_250.0));
        assert_eq!(fields.title.as_deref(), Some("Appartement T4 lumineux avec balcon"));
        assert_eq!(fields.elevator, Some(true));
        assert_eq!(fields.outdoor_space, Some(true));
        assert_eq!(fields.parking, Some(true));
        assert_eq!(fields.cellar, Some(true));
    }

    #[rstest]
    #[case("Prix de vente : 1 200 000 €", Some(1_200_000.0))]
    #[case("Vendu 450000€ net vendeur", Some(450_000.0))]
    #[case("450 000 euros", Some(450_000.0))]
    #[case("Loyer 950 €", None)]
    fn test_price(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(price_in(text), expected);
    }

    #[rstest]
    #[case("Surface habitable : 65,5", Some(65.5))]
    #[case("superficie 120 m2", Some(120.0))]
    #[case("terrain de 2500 m²", None)]
    fn test_surface(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(surface_in(text), expected);
    }

    #[rstest]
    #[case("Bel F3 rénové", Some(3))]
    #[case("5 pieces", Some(5))]
    #[case("aucune indication", None)]
    fn test_rooms(#[case] text: &str, #[case] expected: Option<u32>) {
        assert_eq!(rooms_in(text), expected);
    }

    #[test]
    fn test_no_elevator() {
        let fields = extract_free_text("Maison sans ascenseur, rez-de-chaussée");
        assert_eq!(fields.elevator, None);
        assert_eq!(fields.floor, Some(0));
        assert_eq!(fields.property_type, Some(PropertyType::Maison));
    }

    #[test]
    fn test_postal_then_city() {
        let (city, cp) = location_in("Situé au 33000 Bordeaux centre");
        assert_eq!(city.as_deref(), Some("Bordeaux"));
        assert_eq!(cp.as_deref(), Some("33000"));
    }

    #[test]
    fn test_postal_code_alone_gives_no_city() {
        let (city, cp) = location_in("Appartement lumineux, code postal 13008, proche plage");
        assert_eq!(cp.as_deref(), Some("13008"));
        assert_eq!(city, None);
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_free_text("   \n ").is_empty());
    }
}
