//! Structured-data extraction from embedded JSON-LD.
//!
//! Listing portals describe the advertised property with schema.org types
//! (`Apartment`, `House`, `RealEstateListing`, `Offer`, ...). Every object of
//! every JSON-LD block is visited in document order; the first object that
//! carries a given field wins. Subtrees describing the publisher or the
//! agency are skipped so their addresses never leak into the listing.

use serde_json::{Map, Value};

use super::values::{
    DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS, clean_city, clean_text, is_street_address, parse_number, rating,
    valid_bedrooms, valid_floor, valid_postal_code, valid_price, valid_rooms, valid_surface, valid_year,
};
use crate::parse::Document;
use crate::record::{ListingFields, PropertyType};

/// Types whose subtree never describes the advertised property.
const IGNORED_TYPES: &[&str] = &[
    "Organization",
    "RealEstateAgent",
    "LocalBusiness",
    "Person",
    "WebSite",
    "WebPage",
    "BreadcrumbList",
    "ListItem",
    "SearchAction",
    "ImageObject",
];

const HOUSE_TYPES: &[&str] = &["House", "SingleFamilyResidence"];
const APARTMENT_TYPES: &[&str] = &["Apartment", "ApartmentComplex"];

/// Maximum nesting depth explored inside one block.
const MAX_DEPTH: usize = 8;

/// Extracts listing fields from every JSON-LD block of the document.
pub fn extract_structured(doc: &Document) -> ListingFields {
    let mut fields = ListingFields::default();
    for block in doc.json_ld_blocks() {
        visit(&block, &mut fields, 0);
    }
    fields
}

fn visit(value: &Value, fields: &mut ListingFields, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                visit(item, fields, depth + 1);
            }
        }
        Value::Object(obj) => {
            let types = types_of(obj);
            if types.iter().any(|t| IGNORED_TYPES.contains(t)) {
                return;
            }
            read_object(obj, &types, fields);
            for (key, child) in obj {
                // Handled inline by read_object.
                if matches!(key.as_str(), "address" | "floorSize" | "image" | "offers") {
                    continue;
                }
                if child.is_object() || child.is_array() {
                    visit(child, fields, depth + 1);
                }
            }
            if let Some(offers) = obj.get("offers") {
                visit(offers, fields, depth + 1);
            }
        }
        _ => {}
    }
}

fn types_of(obj: &Map<String, Value>) -> Vec<&str> {
    match obj.get("@type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn read_object(obj: &Map<String, Value>, types: &[&str], fields: &mut ListingFields) {
    if fields.property_type.is_none() {
        if types.iter().any(|t| HOUSE_TYPES.contains(t)) {
            fields.property_type = Some(PropertyType::Maison);
        } else if types.iter().any(|t| APARTMENT_TYPES.contains(t)) {
            fields.property_type = Some(PropertyType::Appartement);
        }
    }

    if fields.price.is_none() {
        fields.price = obj
            .get("price")
            .or_else(|| obj.get("priceSpecification").and_then(|spec| spec.get("price")))
            .and_then(number)
            .and_then(valid_price);
    }

    if fields.surface.is_none() {
        fields.surface = obj.get("floorSize").and_then(number).and_then(valid_surface);
    }

    if fields.rooms.is_none() {
        fields.rooms = obj
            .get("numberOfRooms")
            .and_then(integer)
            .and_then(valid_rooms);
    }

    if fields.bedrooms.is_none() {
        fields.bedrooms = obj
            .get("numberOfBedrooms")
            .or_else(|| obj.get("numberOfBedroomsTotal"))
            .and_then(integer)
            .and_then(valid_bedrooms);
    }

    if fields.floor.is_none() {
        fields.floor = obj.get("floorLevel").and_then(integer).and_then(valid_floor);
    }

    if fields.year_built.is_none() {
        fields.year_built = obj.get("yearBuilt").and_then(integer).and_then(valid_year);
    }

    if let Some(address) = obj.get("address") {
        read_address(address, fields);
    }

    if fields.title.is_none() {
        fields.title = obj
            .get("name")
            .or_else(|| obj.get("headline"))
            .and_then(Value::as_str)
            .map(|t| clean_text(t, TITLE_MAX_CHARS))
            .filter(|t| !t.is_empty());
    }

    if fields.description.is_none() {
        fields.description = obj
            .get("description")
            .and_then(Value::as_str)
            .map(|d| clean_text(d, DESCRIPTION_MAX_CHARS))
            .filter(|d| !d.is_empty());
    }

    if fields.image_url.is_none() {
        fields.image_url = obj.get("image").and_then(image_url);
    }

    if let Some(Value::Array(props)) = obj.get("additionalProperty") {
        read_additional_properties(props, fields);
    }
}

fn read_address(address: &Value, fields: &mut ListingFields) {
    match address {
        Value::Object(addr) => {
            if fields.postal_code.is_none() {
                fields.postal_code = addr.get("postalCode").and_then(string).and_then(|cp| valid_postal_code(&cp));
            }
            if fields.city.is_none() {
                fields.city = addr
                    .get("addressLocality")
                    .and_then(Value::as_str)
                    .and_then(clean_city);
            }
            if fields.address.is_none() {
                fields.address = addr
                    .get("streetAddress")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|a| is_street_address(a))
                    .map(str::to_string);
            }
        }
        Value::String(line) if fields.address.is_none() && is_street_address(line) => {
            fields.address = Some(line.trim().to_string());
        }
        _ => {}
    }
}

/// Reads `{"name": "DPE", "value": "C"}` style property lists.
fn read_additional_properties(props: &[Value], fields: &mut ListingFields) {
    for prop in props {
        let name = prop.get("name").and_then(Value::as_str).unwrap_or_default().to_lowercase();
        let Some(value) = prop.get("value") else {
            continue;
        };
        if fields.energy_rating.is_none() && (name.contains("dpe") || name.contains("energ")) {
            fields.energy_rating = string(value).and_then(|v| rating(&v));
        } else if fields.ghg_rating.is_none() && (name.contains("ges") || name.contains("gaz")) {
            fields.ghg_rating = string(value).and_then(|v| rating(&v));
        }
    }
}

/// Numbers may be JSON numbers, formatted strings or `QuantitativeValue` objects.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        Value::Object(obj) => obj.get("value").and_then(number),
        Value::Array(items) => items.first().and_then(number),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<u32> {
    number(value).filter(|n| n.fract() == 0.0 && *n >= 0.0).map(|n| n as u32)
}

fn string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("http") => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(obj) => obj.get("url").or_else(|| obj.get("contentUrl")).and_then(image_url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(json: &str) -> ListingFields {
        let html = format!(
            r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
            json
        );
        extract_structured(&Document::parse(&html))
    }

    #[test]
    fn test_real_estate_listing() {
        let fields = extract(
            r#"{
                "@context": "https://schema.org",
                "@type": "RealEstateListing",
                "name": "Appartement 4 pièces 88 m²",
                "description": "Bel appartement traversant &amp; lumineux.",
                "image": ["https://img.example.com/a.jpg", "https://img.example.com/b.jpg"],
                "offers": {"@type": "Offer", "price": "250000", "priceCurrency": "EUR"},
                "mainEntity": {
                    "@type": "Apartment",
                    "floorSize": {"@type": "QuantitativeValue", "value": 88, "unitCode": "MTK"},
                    "numberOfRooms": 4,
                    "numberOfBedrooms": "3",
                    "address": {
                        "@type": "PostalAddress",
                        "postalCode": "75015",
                        "addressLocality": "Paris",
                        "streetAddress": "12 rue Lecourbe"
                    }
                }
            }"#,
        );

        assert_eq!(fields.price, Some(250_000.0));
        assert_eq!(fields.surface, Some(88.0));
        assert_eq!(fields.rooms, Some(4));
        assert_eq!(fields.bedrooms, Some(3));
        assert_eq!(fields.postal_code.as_deref(), Some("75015"));
        assert_eq!(fields.city.as_deref(), Some("Paris"));
        assert_eq!(fields.address.as_deref(), Some("12 rue Lecourbe"));
        assert_eq!(fields.property_type, Some(PropertyType::Appartement));
        assert_eq!(fields.title.as_deref(), Some("Appartement 4 pièces 88 m²"));
        assert_eq!(fields.description.as_deref(), Some("Bel appartement traversant & lumineux."));
        assert_eq!(fields.image_url.as_deref(), Some("https://img.example.com/a.jpg"));
    }

    #[test]
    fn test_graph_and_agency_ignored() {
        let fields = extract(
            r#"{
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "RealEstateAgent", "name": "Agence du Centre",
                     "address": {"postalCode": "69001", "addressLocality": "Lyon"}},
                    {"@type": "House", "floorSize": "120,5 m²", "numberOfRooms": "6",
                     "address": {"postalCode": 33000, "addressLocality": "Bordeaux"},
                     "offers": [{"price": 485000}]}
                ]
            }"#,
        );

        assert_eq!(fields.postal_code.as_deref(), Some("33000"));
        assert_eq!(fields.city.as_deref(), Some("Bordeaux"));
        assert_eq!(fields.surface, Some(120.5));
        assert_eq!(fields.rooms, Some(6));
        assert_eq!(fields.price, Some(485_000.0));
        assert_eq!(fields.property_type, Some(PropertyType::Maison));
        assert_eq!(fields.title, None);
    }

    #[test]
    fn test_implausible_values_rejected() {
        let fields = extract(r#"{"@type": "Apartment", "price": 12, "floorSize": 5000, "numberOfRooms": 0}"#);
        assert_eq!(fields.price, None);
        assert_eq!(fields.surface, None);
        assert_eq!(fields.rooms, None);
    }

    #[test]
    fn test_additional_property_ratings() {
        let fields = extract(
            r#"{"@type": "Apartment", "additionalProperty": [
                {"name": "Classe énergie (DPE)", "value": "c"},
                {"name": "GES", "value": "B"}
            ]}"#,
        );
        assert_eq!(fields.energy_rating.map(|r| r.as_str()), Some("C"));
        assert_eq!(fields.ghg_rating.map(|r| r.as_str()), Some("B"));
    }

    #[test]
    fn test_no_json_ld() {
        let fields = extract_structured(&Document::parse("<html><body><p>Rien</p></body></html>"));
        assert!(fields.is_empty());
    }
}
