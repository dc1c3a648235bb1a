//! OpenGraph and Twitter-card meta extraction.
//!
//! Mostly title, description and image. Portals also pack the headline
//! numbers into `og:title`/`og:description` ("Appartement 3 pièces 65 m²,
//! 250 000 €"), so those two strings are scanned for price, surface, rooms
//! and location as well.

use super::text::{location_in, price_in, rooms_in, surface_in};
use super::values::{
    DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS, clean_city, clean_text, is_street_address, property_type_from,
    valid_postal_code,
};
use crate::parse::Document;
use crate::record::ListingFields;

const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const DESCRIPTION_KEYS: &[&str] = &["og:description", "twitter:description", "description"];
const IMAGE_KEYS: &[&str] = &["og:image", "og:image:secure_url", "twitter:image", "twitter:image:src"];
const CITY_KEYS: &[&str] = &["og:locality", "geo.placename"];
const POSTAL_CODE_KEYS: &[&str] = &["og:postal-code"];
const ADDRESS_KEYS: &[&str] = &["og:street-address"];

/// Extracts listing fields from meta tags.
pub fn extract_meta(doc: &Document) -> ListingFields {
    let title = first_meta(doc, TITLE_KEYS).map(|t| clean_text(&t, TITLE_MAX_CHARS));
    let description = first_meta(doc, DESCRIPTION_KEYS).map(|d| clean_text(&d, DESCRIPTION_MAX_CHARS));

    let mut fields = ListingFields {
        image_url: first_meta(doc, IMAGE_KEYS).filter(|i| i.starts_with("http")),
        city: first_meta(doc, CITY_KEYS).and_then(|c| clean_city(&c)),
        postal_code: first_meta(doc, POSTAL_CODE_KEYS).and_then(|cp| valid_postal_code(&cp)),
        address: first_meta(doc, ADDRESS_KEYS).filter(|a| is_street_address(a)),
        ..Default::default()
    };

    // Headline numbers packed into the title and description.
    let summary = [title.as_deref(), description.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");
    if !summary.is_empty() {
        fields.price = price_in(&summary);
        fields.surface = surface_in(&summary);
        fields.rooms = rooms_in(&summary);
        fields.property_type = title.as_deref().and_then(property_type_from);

        let (city, postal_code) = location_in(&summary);
        if fields.city.is_none() {
            fields.city = city;
        }
        if fields.postal_code.is_none() {
            fields.postal_code = postal_code;
        }
    }

    fields.title = title.filter(|t| !t.is_empty());
    fields.description = description.filter(|d| !d.is_empty());
    fields
}

fn first_meta(doc: &Document, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| doc.meta_content(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PropertyType;

    #[test]
    fn test_open_graph_listing() {
        let html = r#"<html><head>
            <meta property="og:title" content="Vente Maison 5 pièces 110 m² Rennes (35000)">
            <meta property="og:description" content="Maison familiale au calme, 349 000 €. Jardin de 400 m²">
            <meta property="og:image" content="https://cdn.example.com/photo-1.jpg">
        </head><body></body></html>"#;
        let fields = extract_meta(&Document::parse(html));

        assert_eq!(fields.title.as_deref(), Some("Vente Maison 5 pièces 110 m² Rennes (35000)"));
        assert_eq!(fields.price, Some(349_000.0));
        assert_eq!(fields.surface, Some(110.0));
        assert_eq!(fields.rooms, Some(5));
        assert_eq!(fields.property_type, Some(PropertyType::Maison));
        assert_eq!(fields.postal_code.as_deref(), Some("35000"));
        assert_eq!(fields.city.as_deref(), Some("Rennes"));
        assert_eq!(fields.image_url.as_deref(), Some("https://cdn.example.com/photo-1.jpg"));
    }

    #[test]
    fn test_twitter_fallbacks() {
        let html = r#"<html><head>
            <meta name="twitter:title" content="Studio meublé">
            <meta name="twitter:image" content="https://cdn.example.com/studio.jpg">
            <meta name="geo.placename" content="Grenoble">
        </head></html>"#;
        let fields = extract_meta(&Document::parse(html));

        assert_eq!(fields.title.as_deref(), Some("Studio meublé"));
        assert_eq!(fields.image_url.as_deref(), Some("https://cdn.example.com/studio.jpg"));
        assert_eq!(fields.city.as_deref(), Some("Grenoble"));
        assert_eq!(fields.property_type, Some(PropertyType::Appartement));
        assert_eq!(fields.price, None);
    }

    #[test]
    fn test_relative_image_ignored() {
        let html = r#"<html><head><meta property="og:image" content="/img/logo.png"></head></html>"#;
        let fields = extract_meta(&Document::parse(html));
        assert_eq!(fields.image_url, None);
        assert!(fields.is_empty());
    }
}
