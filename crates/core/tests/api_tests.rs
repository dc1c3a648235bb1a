//! Library API integration tests
use std::sync::Arc;

use annonce_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

#[test]
fn test_parse_structured_listing() {
    let html = read_fixture("listing_jsonld.html");
    let record = parse_listing(&html, Some("https://www.example-immo.fr/annonces/lyon-3/88")).expect("should parse");

    assert_eq!(record.fields.price, Some(250_000.0));
    assert_eq!(record.provenance_of(Field::Price), Some(Provenance::StructuredData));
    assert_eq!(record.fields.surface, Some(88.0));
    assert_eq!(record.fields.rooms, Some(4));
    assert_eq!(record.fields.bedrooms, Some(3));
    assert_eq!(record.fields.postal_code.as_deref(), Some("69003"));
    assert_eq!(record.fields.department_code.as_deref(), Some("69"));
    assert_eq!(record.fields.city.as_deref(), Some("Lyon"));
    assert_eq!(record.fields.address.as_deref(), Some("14 rue Paul Bert"));
    assert_eq!(record.fields.energy_rating, Some(EnergyRating::D));
    assert_eq!(record.fields.ghg_rating, Some(EnergyRating::E));
    assert_eq!(record.fields.property_type, Some(PropertyType::Appartement));
    assert_eq!(record.fields.floor, Some(2));
    assert_eq!(
        record.fields.image_url.as_deref(),
        Some("https://photos.example-immo.fr/lyon/88/1.jpg")
    );
    assert_eq!(record.fields.price_per_area, Some(2841.0));
    assert!(record.is_sufficient(2));
}

#[test]
fn test_parse_pattern_listing() {
    let html = read_fixture("listing_patterns.html");
    let record = parse_listing(&html, None).expect("should parse");

    assert_eq!(record.fields.price, Some(420_000.0));
    assert_eq!(record.provenance_of(Field::Price), Some(Provenance::HtmlPattern));
    assert_eq!(record.fields.surface, Some(120.0));
    assert_eq!(record.fields.rooms, Some(5));
    assert_eq!(record.fields.bedrooms, Some(4));
    assert_eq!(record.fields.property_type, Some(PropertyType::Maison));
    assert_eq!(record.fields.postal_code.as_deref(), Some("44000"));
    assert_eq!(record.fields.city.as_deref(), Some("Nantes"));
    assert_eq!(record.fields.energy_rating, Some(EnergyRating::C));
    assert_eq!(record.fields.year_built, Some(1995));
    assert!(record.url.is_none());
}

#[test]
fn test_parse_meta_only_listing() {
    let html = read_fixture("listing_meta.html");
    let record = parse_listing(&html, None).expect("should parse");

    assert_eq!(record.fields.price, Some(189_000.0));
    assert_eq!(record.fields.surface, Some(45.0));
    assert_eq!(record.fields.rooms, Some(2));
    assert_eq!(record.fields.postal_code.as_deref(), Some("33000"));
    assert_eq!(record.fields.city.as_deref(), Some("Bordeaux"));
    assert_eq!(
        record.fields.image_url.as_deref(),
        Some("https://cdn.example-immo.fr/bordeaux/45.jpg")
    );
    assert!(record.is_sufficient(2));
}

#[test]
fn test_parse_page_without_listing() {
    let html = read_fixture("listing_empty.html");
    let record = parse_listing(&html, None).expect("should parse");

    assert_eq!(record.fields.price, None);
    assert_eq!(record.fields.surface, None);
    assert!(!record.is_sufficient(1));
    assert_eq!(record.fields.energy_rating, Some(EnergyRating::NotCommunicated));
    assert!(!record.is_extracted(Field::EnergyRating));
}

#[test]
fn test_parse_pasted_text() {
    let text = read_fixture("listing_paste.txt");
    let record = parse_listing_text(&text);

    assert_eq!(record.fields.price, Some(265_000.0));
    assert_eq!(record.fields.surface, Some(68.0));
    assert_eq!(record.fields.rooms, Some(3));
    assert_eq!(record.fields.bedrooms, Some(2));
    assert_eq!(record.fields.city.as_deref(), Some("Toulouse"));
    assert_eq!(record.fields.department_code.as_deref(), Some("31"));
    assert_eq!(record.fields.floor, Some(2));
    assert_eq!(record.fields.monthly_charges, Some(150.0));
    assert_eq!(record.fields.elevator, Some(true));
    assert_eq!(record.fields.cellar, Some(true));
    assert_eq!(record.provenance_of(Field::Surface), Some(Provenance::FreeText));
}

#[test]
fn test_parse_is_idempotent() {
    for name in ["listing_jsonld.html", "listing_patterns.html", "listing_meta.html"] {
        let html = read_fixture(name);
        assert_eq!(parse_listing(&html, None).unwrap(), parse_listing(&html, None).unwrap(), "{name}");
    }
}

#[test]
fn test_record_json_shape() {
    let html = read_fixture("listing_patterns.html");
    let record = parse_listing(&html, Some("https://www.pap.fr/annonces/maison-nantes-r4")).unwrap();
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["url"], "https://www.pap.fr/annonces/maison-nantes-r4");
    assert_eq!(json["price"], 420_000.0);
    assert_eq!(json["propertyType"], "maison");
    assert_eq!(json["departmentCode"], "44");
    assert!(json.get("provenance").is_none());
    assert!(json.get("fields").is_none());
}

#[test]
fn test_site_classification() {
    let sites = SiteTable::builtin();

    let seloger = sites.classify(&url::Url::parse("https://www.seloger.com/annonces/achat/1.htm").unwrap());
    assert_eq!(seloger.tier, ProtectionTier::Protected);
    assert!(seloger.options.premium_proxy);

    let unknown = sites.classify(&url::Url::parse("https://agence-dupont.fr/bien/12").unwrap());
    assert_eq!(unknown.tier, ProtectionTier::Standard);
    assert_eq!(unknown.source_label(), "web");
}

#[test]
fn test_gate_blocks_internal_targets() {
    let gate = RequestGate::default();
    for url in ["http://localhost/x", "https://10.1.2.3/a", "https://foo.internal"] {
        assert!(matches!(gate.admit(url, "k"), Err(AnnonceError::BlockedHost(_))), "{url}");
    }
    assert!(matches!(gate.admit("ftp://example.fr/", "k"), Err(AnnonceError::InvalidInput(_))));
    assert!(gate.admit("https://www.pap.fr/annonces/1", "k").is_ok());
}

#[test]
fn test_department_codes() {
    assert_eq!(department_code("20190").as_deref(), Some("2A"));
    assert_eq!(department_code("20250").as_deref(), Some("2B"));
    assert_eq!(department_code("97400").as_deref(), Some("974"));
    assert_eq!(department_code("75015").as_deref(), Some("75"));
}

struct FixtureHttp;

#[async_trait::async_trait]
impl PlainHttp for FixtureHttp {
    async fn get(&self, _url: &url::Url, _request: &HttpRequest) -> Result<String> {
        Ok(std::fs::read_to_string(get_fixture_path("listing_jsonld.html")).unwrap())
    }
}

#[tokio::test]
async fn test_extractor_with_injected_transport() {
    let providers = Providers::default().with_http(Arc::new(FixtureHttp));
    let extractor = Extractor::new(ExtractorConfig::default(), SiteTable::builtin(), providers);

    assert_eq!(
        extractor.availability(),
        ProviderAvailability { rendering: false, readable: false, crawl: false, direct: true }
    );

    let request = ExtractionRequest::new("https://www.pap.fr/annonces/appartement-lyon-3eme-r88", "127.0.0.1");
    let response = extractor.extract(&request).await.expect("should extract");

    assert!(response.success);
    assert_eq!(response.source, "pap");
    assert_eq!(response.method, StrategyKind::DirectFetch);
    assert_eq!(response.data.fields.price, Some(250_000.0));
    assert!(response.fields_extracted >= 10);

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["method"], "direct-fetch");
    assert_eq!(body["data"]["postalCode"], "69003");
}
