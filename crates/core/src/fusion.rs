//! Field fusion and completion.
//!
//! [`merge`] combines candidate field sets in trust order: for every field
//! the first present value wins and is never overwritten by a later, lower
//! trust source. [`complete`] then fills gaps that can be inferred from the
//! fused values. Completion never touches a field that was extracted.

use crate::record::{EnergyRating, ExtractedRecord, Field, ListingFields, PropertyType, Provenance};
use crate::sources::values::city_from_postal;

/// Average surface of one room, used to estimate a missing room count.
const SQUARE_METERS_PER_ROOM: f64 = 22.0;

/// Merges candidates given in trust order into one record.
pub fn merge(url: Option<String>, candidates: &[(Provenance, &ListingFields)]) -> ExtractedRecord {
    let mut record = ExtractedRecord::new(url);
    let mut ordered: Vec<&(Provenance, &ListingFields)> = candidates.iter().collect();
    // Stable: equal tiers keep their given order.
    ordered.sort_by_key(|(tier, _)| *tier);
    for (tier, fields) in ordered {
        record.fill_from(fields, *tier);
    }
    record
}

/// Fills absent fields that can be inferred from the fused ones.
pub fn complete(record: &mut ExtractedRecord) {
    let fields = &mut record.fields;
    let mut derived = Vec::new();

    if fields.rooms.is_none()
        && let Some(surface) = fields.surface
    {
        fields.rooms = Some(((surface / SQUARE_METERS_PER_ROOM).round() as u32).max(1));
        derived.push(Field::Rooms);
    }

    if fields.bedrooms.is_none()
        && let Some(rooms) = fields.rooms
    {
        fields.bedrooms = Some(rooms.saturating_sub(1));
        derived.push(Field::Bedrooms);
    }

    if fields.energy_rating.is_none() {
        fields.energy_rating = Some(EnergyRating::NotCommunicated);
        derived.push(Field::EnergyRating);
    }

    if fields.property_type.is_none() {
        fields.property_type = Some(PropertyType::Appartement);
        derived.push(Field::PropertyType);
    }

    if fields.department_code.is_none()
        && let Some(code) = fields.postal_code.as_deref().and_then(department_code)
    {
        fields.department_code = Some(code);
        derived.push(Field::DepartmentCode);
    }

    if fields.city.is_none()
        && let Some(city) = fields.postal_code.as_deref().and_then(city_from_postal)
    {
        fields.city = Some(city.to_string());
        derived.push(Field::City);
    }

    if fields.price_per_area.is_none()
        && let (Some(price), Some(surface)) = (fields.price, fields.surface)
        && surface > 0.0
    {
        fields.price_per_area = Some((price / surface).round());
        derived.push(Field::PricePerArea);
    }

    for field in derived {
        record.mark_derived(field);
    }
}

/// Department code implied by a postal code.
///
/// Overseas codes (`97xxx`) keep three digits; Corsica (`20xxx`) splits into
/// `2A` below 20200 and `2B` from there on; every other code keeps two.
pub fn department_code(postal_code: &str) -> Option<String> {
    let postal_code = postal_code.trim();
    if postal_code.len() != 5 || !postal_code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let code = match &postal_code[..2] {
        "97" => postal_code[..3].to_string(),
        "20" => {
            let value: u32 = postal_code.parse().ok()?;
            if value < 20_200 { "2A".to_string() } else { "2B".to_string() }
        }
        prefix => prefix.to_string(),
    };
    Some(code)
}

/// Merges and completes in one step.
pub fn fuse(url: Option<String>, candidates: &[(Provenance, &ListingFields)]) -> ExtractedRecord {
    let mut record = merge(url, candidates);
    complete(&mut record);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn with_price(price: f64) -> ListingFields {
        ListingFields { price: Some(price), ..Default::default() }
    }

    #[test]
    fn test_higher_trust_wins() {
        let structured = with_price(250_000.0);
        let patterns = ListingFields { price: Some(260_000.0), surface: Some(70.0), ..Default::default() };
        let record = merge(
            None,
            &[(Provenance::StructuredData, &structured), (Provenance::HtmlPattern, &patterns)],
        );

        assert_eq!(record.fields.price, Some(250_000.0));
        assert_eq!(record.fields.surface, Some(70.0));
        assert_eq!(record.provenance_of(Field::Price), Some(Provenance::StructuredData));
        assert_eq!(record.provenance_of(Field::Surface), Some(Provenance::HtmlPattern));
    }

    #[test]
    fn test_trust_order_independent_of_argument_order() {
        let free_text = with_price(260_000.0);
        let meta = with_price(250_000.0);
        let record = merge(None, &[(Provenance::FreeText, &free_text), (Provenance::MetaTag, &meta)]);
        assert_eq!(record.fields.price, Some(250_000.0));
    }

    #[test]
    fn test_blank_values_do_not_block_lower_tiers() {
        let structured = ListingFields { title: Some("   ".to_string()), ..Default::default() };
        let meta = ListingFields { title: Some("Duplex".to_string()), ..Default::default() };
        let record = merge(None, &[(Provenance::StructuredData, &structured), (Provenance::MetaTag, &meta)]);
        assert_eq!(record.fields.title.as_deref(), Some("Duplex"));
    }

    #[test]
    fn test_rooms_and_bedrooms_derived() {
        let patterns = ListingFields { surface: Some(88.0), ..Default::default() };
        let record = fuse(None, &[(Provenance::HtmlPattern, &patterns)]);

        assert_eq!(record.fields.rooms, Some(4));
        assert_eq!(record.fields.bedrooms, Some(3));
        assert_eq!(record.provenance_of(Field::Rooms), Some(Provenance::Derived));
        assert!(!record.is_extracted(Field::Bedrooms));
    }

    #[test]
    fn test_small_surface_has_one_room() {
        let patterns = ListingFields { surface: Some(10.0), ..Default::default() };
        let record = fuse(None, &[(Provenance::HtmlPattern, &patterns)]);
        assert_eq!(record.fields.rooms, Some(1));
        assert_eq!(record.fields.bedrooms, Some(0));
    }

    #[test]
    fn test_completion_keeps_extracted_values() {
        let structured = ListingFields {
            price: Some(300_000.0),
            surface: Some(60.0),
            rooms: Some(2),
            bedrooms: Some(1),
            energy_rating: Some(EnergyRating::B),
            property_type: Some(PropertyType::Maison),
            price_per_area: Some(4_900.0),
            ..Default::default()
        };
        let record = fuse(None, &[(Provenance::StructuredData, &structured)]);

        assert_eq!(record.fields.rooms, Some(2));
        assert_eq!(record.fields.bedrooms, Some(1));
        assert_eq!(record.fields.energy_rating, Some(EnergyRating::B));
        assert_eq!(record.fields.property_type, Some(PropertyType::Maison));
        assert_eq!(record.fields.price_per_area, Some(4_900.0));
    }

    #[test]
    fn test_defaults_are_not_counted() {
        let patterns = ListingFields { price: Some(200_000.0), surface: Some(50.0), ..Default::default() };
        let record = fuse(None, &[(Provenance::HtmlPattern, &patterns)]);

        assert_eq!(record.fields.energy_rating, Some(EnergyRating::NotCommunicated));
        assert_eq!(record.fields.property_type, Some(PropertyType::Appartement));
        assert_eq!(record.fields.price_per_area, Some(4_000.0));
        assert_eq!(record.fields_extracted(), 2);
        assert!(record.is_sufficient(2));
    }

    #[test]
    fn test_fusion_is_idempotent() {
        let structured = ListingFields { price: Some(250_000.0), postal_code: Some("75015".into()), ..Default::default() };
        let free_text = ListingFields { surface: Some(42.0), ..Default::default() };
        let candidates = [(Provenance::StructuredData, &structured), (Provenance::FreeText, &free_text)];

        assert_eq!(fuse(None, &candidates), fuse(None, &candidates));
    }

    #[rstest]
    #[case("20190", Some("2A"))]
    #[case("20250", Some("2B"))]
    #[case("20200", Some("2B"))]
    #[case("97400", Some("974"))]
    #[case("75015", Some("75"))]
    #[case("01000", Some("01"))]
    #[case("750", None)]
    fn test_department_code(#[case] postal_code: &str, #[case] expected: Option<&str>) {
        assert_eq!(department_code(postal_code).as_deref(), expected);
    }

    #[test]
    fn test_department_and_city_from_postal_code() {
        let patterns = ListingFields { postal_code: Some("13008".into()), ..Default::default() };
        let record = fuse(None, &[(Provenance::HtmlPattern, &patterns)]);

        assert_eq!(record.fields.department_code.as_deref(), Some("13"));
        assert_eq!(record.fields.city.as_deref(), Some("Marseille"));
        assert_eq!(record.provenance_of(Field::City), Some(Provenance::Derived));
    }
}
