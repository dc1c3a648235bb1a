//! Listing record types.
//!
//! [`ListingFields`] is the flat set of optional listing fields produced by
//! every extraction technique. [`ExtractedRecord`] wraps the fused fields
//! together with a provenance map recording which trust tier supplied each
//! field, so that sufficiency and field counts never consider derived or
//! sentinel values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Energy (DPE) or greenhouse-gas (GES) rating letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyRating {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    /// "Non communiqué", the sentinel used when no rating was found.
    #[serde(rename = "NC")]
    NotCommunicated,
}

impl EnergyRating {
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            'G' => Some(Self::G),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
            Self::NotCommunicated => "NC",
        }
    }
}

impl fmt::Display for EnergyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("NC") {
            return Ok(Self::NotCommunicated);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c).ok_or_else(|| format!("Invalid rating: {}", s)),
            _ => Err(format!("Invalid rating: {}", s)),
        }
    }
}

/// Kind of property advertised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Appartement,
    Maison,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Appartement => f.write_str("appartement"),
            Self::Maison => f.write_str("maison"),
        }
    }
}

/// Trust tier of the technique that supplied a field, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Embedded JSON-LD listing metadata.
    StructuredData,
    /// Regex patterns keyed to known markup.
    HtmlPattern,
    /// OpenGraph / Twitter card meta tags.
    MetaTag,
    /// Metadata returned alongside the content by a provider.
    SideChannel,
    /// Heuristics over unstructured prose.
    FreeText,
    /// Filled in by completion rather than extracted.
    Derived,
}

impl Provenance {
    /// Whether a field with this provenance counts as confidently extracted.
    pub fn is_extracted(&self) -> bool {
        !matches!(self, Provenance::Derived)
    }
}

/// Identifies one field of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Price,
    Surface,
    PricePerArea,
    Rooms,
    Bedrooms,
    EnergyRating,
    GhgRating,
    PostalCode,
    DepartmentCode,
    City,
    Address,
    PropertyType,
    Floor,
    MonthlyCharges,
    PropertyTax,
    YearBuilt,
    Title,
    Description,
    ImageUrl,
    Elevator,
    OutdoorSpace,
    Parking,
    Cellar,
}

impl Field {
    /// Core fields considered by the sufficiency threshold.
    pub const CORE: [Field; 2] = [Field::Price, Field::Surface];

    /// Amenity flags are recorded but never counted as extracted data.
    pub fn is_amenity(&self) -> bool {
        matches!(self, Field::Elevator | Field::OutdoorSpace | Field::Parking | Field::Cellar)
    }
}

/// A value that may be present but meaningless (empty string, zero, sentinel).
pub trait Present {
    fn is_present(&self) -> bool;
}

impl Present for f64 {
    fn is_present(&self) -> bool {
        self.is_finite() && *self > 0.0
    }
}

impl Present for u32 {
    fn is_present(&self) -> bool {
        true
    }
}

impl Present for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Present for bool {
    fn is_present(&self) -> bool {
        *self
    }
}

impl Present for EnergyRating {
    fn is_present(&self) -> bool {
        *self != EnergyRating::NotCommunicated
    }
}

impl Present for PropertyType {
    fn is_present(&self) -> bool {
        true
    }
}

/// Flat set of optional listing fields.
///
/// Every extraction technique produces one of these; fusion combines them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_rating: Option<EnergyRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghg_rating: Option<EnergyRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_charges: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevator: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdoor_space: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cellar: Option<bool>,
}

/// Applies `$body` to every `(field_name, Field)` pair of [`ListingFields`].
macro_rules! for_each_field {
    ($mac:ident!($($args:tt)*)) => {
        $mac!($($args)*;
            price => Field::Price,
            surface => Field::Surface,
            price_per_area => Field::PricePerArea,
            rooms => Field::Rooms,
            bedrooms => Field::Bedrooms,
            energy_rating => Field::EnergyRating,
            ghg_rating => Field::GhgRating,
            postal_code => Field::PostalCode,
            department_code => Field::DepartmentCode,
            city => Field::City,
            address => Field::Address,
            property_type => Field::PropertyType,
            floor => Field::Floor,
            monthly_charges => Field::MonthlyCharges,
            property_tax => Field::PropertyTax,
            year_built => Field::YearBuilt,
            title => Field::Title,
            description => Field::Description,
            image_url => Field::ImageUrl,
            elevator => Field::Elevator,
            outdoor_space => Field::OutdoorSpace,
            parking => Field::Parking,
            cellar => Field::Cellar
        )
    };
}

macro_rules! fill_from {
    ($target:expr, $source:expr, $provenance:expr, $tier:expr; $($name:ident => $field:expr),*) => {
        $(
            if $target.$name.is_none()
                && let Some(value) = &$source.$name
                && value.is_present()
            {
                $target.$name = Some(value.clone());
                $provenance.insert($field, $tier);
            }
        )*
    };
}

macro_rules! present_fields {
    ($fields:expr, $out:expr; $($name:ident => $field:expr),*) => {
        $(
            if $fields.$name.as_ref().is_some_and(|v| v.is_present()) {
                $out.push($field);
            }
        )*
    };
}

impl ListingFields {
    /// Fields holding a meaningful value.
    pub fn present(&self) -> Vec<Field> {
        let mut out = Vec::new();
        for_each_field!(present_fields!(self, out));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.present().is_empty()
    }

    pub fn has_price_or_surface(&self) -> bool {
        self.price.is_some_and(|p| p.is_present()) || self.surface.is_some_and(|s| s.is_present())
    }
}

/// Fused listing record with per-field provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub fields: ListingFields,
    #[serde(skip)]
    pub provenance: BTreeMap<Field, Provenance>,
}

impl ExtractedRecord {
    pub fn new(url: Option<String>) -> Self {
        Self { url, ..Default::default() }
    }

    /// Fills every absent field from `source`, tagging it with `tier`.
    ///
    /// A field already set is never overwritten, so calling this in trust
    /// order yields a priority merge.
    pub fn fill_from(&mut self, source: &ListingFields, tier: Provenance) {
        let target = &mut self.fields;
        let provenance = &mut self.provenance;
        for_each_field!(fill_from!(target, source, provenance, tier));
    }

    /// Records that `field` was filled in by completion.
    pub fn mark_derived(&mut self, field: Field) {
        self.provenance.entry(field).or_insert(Provenance::Derived);
    }

    pub fn provenance_of(&self, field: Field) -> Option<Provenance> {
        self.provenance.get(&field).copied()
    }

    /// Whether `field` was extracted from the page rather than derived.
    pub fn is_extracted(&self, field: Field) -> bool {
        self.provenance_of(field).is_some_and(|p| p.is_extracted())
    }

    /// Number of confidently-extracted fields, amenity flags excluded.
    pub fn fields_extracted(&self) -> usize {
        self.fields
            .present()
            .into_iter()
            .filter(|f| !f.is_amenity() && self.is_extracted(*f))
            .count()
    }

    /// Number of confidently-extracted core fields.
    pub fn core_fields_extracted(&self) -> usize {
        Field::CORE.iter().filter(|f| self.is_extracted(**f)).count()
    }

    /// Whether the record meets the sufficiency threshold.
    pub fn is_sufficient(&self, min_core_fields: usize) -> bool {
        self.core_fields_extracted() >= min_core_fields
    }
}
