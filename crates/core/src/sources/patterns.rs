//! HTML-pattern extraction.
//!
//! Regex heuristics over the raw markup, keyed to the DOM markers and inline
//! JSON keys the major portals use (`itemprop="price"`, `data-price`,
//! `"surface":`, `"zipcode":`, ...). Each field walks its pattern list in
//! order and keeps the first plausible match.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::values::{
    DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS, captures, clean_city, clean_text, find_known_city,
    is_street_address, monthly_charges, parse_int, parse_number, property_type_from, rating, regexes,
    valid_bedrooms, valid_floor, valid_postal_code, valid_price, valid_property_tax, valid_rooms, valid_surface,
    valid_year,
};
use crate::parse::Document;
use crate::record::ListingFields;

static PRICE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)itemprop=["']price["'][^>]*content=["']([\d\s.,]+)["']"#,
        r#"(?i)data-price=["']([\d\s.,]+)["']"#,
        r#"(?i)"price"\s*:\s*"?(\d[\d\s]*)"?"#,
        r#"(?i)class=["'][^"']*price[^"']*["'][^>]*>\s*(\d{1,3}(?:[\s\x{a0}\x{202f}]\d{3})+|\d{4,8})"#,
        r#"(?i)prix["\s:]*(\d[\d\s€]+)"#,
        r"(\d{1,3}(?:[\s\x{a0}\x{202f}]\d{3})+)\s*€",
        r"(\d{4,8})\s*€",
        r#"(?i)"amount"\s*:\s*(\d+)"#,
    ])
});

static SURFACE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"(?:surface|livingArea|habitableSurface)"\s*:\s*"?(\d+(?:[.,]\d+)?)"?"#,
        r#"(?i)data-surface=["'](\d+(?:[.,]\d+)?)["']"#,
        r"(?i)(\d+(?:[.,]\d+)?)\s*m[²2]",
        r#"(?i)"area"\s*:\s*(\d+)"#,
    ])
});

static ROOMS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"(?:rooms?|nbRooms|roomsQuantity)"\s*:\s*"?(\d+)"?"#,
        r"(?i)(\d+)\s*(?:pièces?|pieces?)\b",
        r"(?i)\b[TF](\d)\b",
    ])
});

static BEDROOMS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"(?:bedrooms?|nbBedrooms|bedroomsQuantity)"\s*:\s*"?(\d+)"?"#,
        r"(?i)(\d+)\s*(?:chambres?|ch\.)",
    ])
});

static CITY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"addressLocality"\s*:\s*"([^"]+)""#,
        r#"(?i)"city(?:Name|_label)?"\s*:\s*"([^"]+)""#,
        r#"(?i)"city"\s*:\s*\{[^}]*"name"\s*:\s*"([^"]+)""#,
        r#"(?i)"locality"\s*:\s*"([^"]+)""#,
        r#"(?i)data-(?:city|ville)=["']([^"']+)["']"#,
    ])
});

static POSTAL_CODE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"postalCode"\s*:\s*"?(\d{5})"?"#,
        r#"(?i)"zip(?:Code|code)?"\s*:\s*"?(\d{5})"?"#,
        r#"(?i)data-(?:zipcode|cp)=["'](\d{5})["']"#,
    ])
});

static ADDRESS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"streetAddress"\s*:\s*"([^"]+)""#,
        r#"(?i)"street"\s*:\s*"([^"]+)""#,
        r#"(?i)"location"\s*:\s*\{[^}]*"address"\s*:\s*"([^"]+)""#,
        r#"(?i)"address"\s*:\s*"([^"]{5,50})""#,
    ])
});

static ENERGY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)(?:"dpe|"energyClass|"energy_?rating|"energyRating)"?\s*:\s*"([A-G])""#,
        r#"(?i)data-dpe=["']([A-G])["']"#,
        r"(?i)classe\s*(?:énergie|énergétique)\s*:?\s*([A-G])\b",
        r"(?i)\bDPE\s*:?\s*([A-G])\b",
    ])
});

static GHG: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)(?:"ges|"greenHouseGas|"ghg|"emissionClass)"?\s*:\s*"([A-G])""#,
        r"(?i)gaz\s*(?:à\s*)?effet\s*(?:de\s*)?serre\s*:?\s*([A-G])\b",
        r"(?i)classe\s*(?:GES|climat)\s*:?\s*([A-G])\b",
    ])
});

static DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"description"\s*:\s*"([^"]{50,2000})""#).unwrap());

static YEAR_BUILT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"(?:yearBuilt|constructionYear|yearOfConstruction|dateBuilt|buildYear|buildPeriod|anneeConstruction)"\s*:\s*"?((?:18|19|20)\d{2})"?"#,
        r#"(?i)"construction_year"[^}]*"value"\s*:\s*"?((?:18|19|20)\d{2})"?"#,
        r#"(?i)data-(?:year|annee|construction)[^=]*=["']((?:18|19|20)\d{2})["']"#,
        r"(?i)(?:construit|construction|année)\s*(?:en\s*)?:?\s*((?:18|19|20)\d{2})",
    ])
});

static CHARGES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r"(?i)charges?\s*annuelles?\s*:?\s*(\d[\d\s]*(?:[.,]\d+)?)\s*(?:€|euros?)",
        r#"(?i)"(?:monthlyCharges?|charges?|provisionCharges|condominiumFees)"\s*:\s*"?(\d+(?:\.\d+)?)"?"#,
        r"(?i)charges?\s*(?:de\s+)?copropriété\s*:?\s*(\d[\d\s]*(?:[.,]\d+)?)\s*€",
        r"(?i)charges?\s*mensuelles?\s*:?\s*(\d[\d\s]*)\s*€",
    ])
});

static PROPERTY_TAX: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"(?:taxeFonciere|propertyTax|landTax)"\s*:\s*"?(\d+)"?"#,
        r"(?i)taxe\s*foncière\s*:?\s*(\d[\d\s]*)\s*€",
        r"(?i)(\d[\d\s]*)\s*€\s*(?:de\s+)?taxe\s*foncière",
    ])
});

static FLOOR: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"(?:floor|etage|floorNumber)"\s*:\s*"?(\d+)"?"#,
        r"(?i)\b(\d+)(?:er|ère|e|ème)?\s*étage",
        r"(?i)étage\s*:?\s*(\d+)",
    ])
});

static GROUND_FLOOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)rez[- ]de[- ]chauss[ée]e|\brdc\b").unwrap());

static ELEVATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"(?:ascenseur|elevator|hasElevator|lift)"\s*:\s*true"#).unwrap());

static OUTDOOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(?:balcon|terrasse|balcony|terrace|hasBalcony|hasTerrace)"\s*:\s*true"#).unwrap()
});

static PARKING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(?:parking|garage|hasParking|hasGarage)"\s*:\s*true|"parkingSpaces?"\s*:\s*[1-9]"#).unwrap()
});

static CELLAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"(?:cave|cellar|hasCellar)"\s*:\s*true"#).unwrap());

static TITLE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[r"(?i)<title[^>]*>([^<]+)<", r#"(?i)"title"\s*:\s*"([^"]+)""#, r"(?i)<h1[^>]*>([^<]+)<"])
});

static IMAGE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r#"(?i)"image(?:Url)?"\s*:\s*"(https?://[^"]+\.(?:jpg|jpeg|png|webp)[^"]*)""#,
        r#"(?i)<meta[^>]+property=["']og:image["'][^>]+content=["']([^"']+)["']"#,
    ])
});

static STANDALONE_POSTAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{5})(?:\D|$)").unwrap());

static TITLE_CITY_POSTAL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    regexes(&[
        r"(\p{Lu}\p{Ll}+(?:-\p{L}\p{Ll}*)*)\s*\(?(\d{5})\)?",
        r"(\d{5})\s+(\p{Lu}\p{Ll}+(?:-\p{L}\p{Ll}*)*)",
    ])
});

static SELOGER_URL_CITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)seloger\.com/annonces/[^/]+/[^/]+/([a-z-]+)-(\d{2,3})/").unwrap());

/// Extracts listing fields from raw HTML with regex heuristics.
pub fn extract_patterns(html: &str, doc: &Document, url: Option<&Url>) -> ListingFields {
    let mut fields = ListingFields {
        price: captures(&PRICE, html)
            .filter_map(parse_number)
            .find_map(valid_price),
        surface: captures(&SURFACE, html)
            .filter_map(parse_number)
            .find_map(valid_surface),
        rooms: captures(&ROOMS, html).filter_map(parse_int).find_map(valid_rooms),
        bedrooms: captures(&BEDROOMS, html)
            .filter_map(parse_int)
            .find_map(valid_bedrooms),
        energy_rating: captures(&ENERGY, html).find_map(rating),
        ghg_rating: captures(&GHG, html).find_map(rating),
        postal_code: captures(&POSTAL_CODE, html).find_map(valid_postal_code),
        city: captures(&CITY, html).find_map(clean_city),
        address: captures(&ADDRESS, html)
            .map(str::trim)
            .find(|a| is_street_address(a))
            .map(str::to_string),
        year_built: captures(&YEAR_BUILT, html)
            .filter_map(parse_int)
            .find_map(valid_year),
        monthly_charges: captures(&CHARGES, html)
            .filter_map(parse_number)
            .find_map(monthly_charges),
        property_tax: captures(&PROPERTY_TAX, html)
            .filter_map(parse_number)
            .find_map(valid_property_tax),
        floor: captures(&FLOOR, html).filter_map(parse_int).find_map(valid_floor),
        title: captures(&TITLE, html)
            .map(|t| clean_text(t, TITLE_MAX_CHARS))
            .find(|t| !t.is_empty()),
        description: DESCRIPTION
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str(), DESCRIPTION_MAX_CHARS)),
        image_url: captures(&IMAGE, html).next().map(str::to_string),
        elevator: ELEVATOR.is_match(html).then_some(true),
        outdoor_space: OUTDOOR.is_match(html).then_some(true),
        parking: PARKING.is_match(html).then_some(true),
        cellar: CELLAR.is_match(html).then_some(true),
        ..Default::default()
    };

    if fields.floor.is_none() && GROUND_FLOOR.is_match(html) {
        fields.floor = Some(0);
    }

    let heading = heading_text(doc, fields.title.as_deref());
    fields.property_type = property_type_from(&heading);

    fill_location_from_heading(&mut fields, &heading);

    if fields.city.is_none()
        && let Some(url) = url
        && let Some(caps) = SELOGER_URL_CITY.captures(url.as_str())
    {
        fields.city = caps.get(1).and_then(|m| clean_city(m.as_str()));
    }

    fields
}

/// Title, first heading and OpenGraph title: the text that names the property.
fn heading_text(doc: &Document, title: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(title) = title {
        parts.push(title.to_string());
    }
    if let Ok(h1) = doc.select("h1")
        && let Some(first) = h1.first()
    {
        parts.push(first.text().trim().to_string());
    }
    if let Some(og) = doc.meta_content("og:title") {
        parts.push(og);
    }
    parts.join(" \n ")
}

fn fill_location_from_heading(fields: &mut ListingFields, heading: &str) {
    if fields.city.is_some() && fields.postal_code.is_some() {
        return;
    }

    for re in TITLE_CITY_POSTAL.iter() {
        let Some(caps) = re.captures(heading) else {
            continue;
        };
        let (Some(a), Some(b)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let (city, cp) = if a.as_str().chars().all(|c| c.is_ascii_digit()) {
            (b.as_str(), a.as_str())
        } else {
            (a.as_str(), b.as_str())
        };
        if fields.postal_code.is_none() {
            fields.postal_code = valid_postal_code(cp);
        }
        if fields.city.is_none() {
            fields.city = clean_city(city);
        }
        break;
    }

    if fields.city.is_none() {
        fields.city = find_known_city(heading).map(str::to_string);
    }

    if fields.postal_code.is_none() {
        fields.postal_code = STANDALONE_POSTAL
            .captures_iter(heading)
            .filter_map(|c| c.get(1))
            .find_map(|m| valid_postal_code(m.as_str()));
    }
}
