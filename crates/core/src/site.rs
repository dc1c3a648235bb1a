//! Site classification.
//!
//! Maps a listing hostname to a protection tier and the transport options the
//! rendering transport should use for it. The lookup table is immutable and
//! injected into the [`crate::Extractor`]; [`SiteTable::builtin`] carries the
//! known French real-estate portals.

use std::time::Duration;

use serde::Serialize;
use url::Url;

/// How strongly a site defends itself against automated clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionTier {
    /// JS rendering plus fingerprinting; cheap transports rarely succeed.
    Protected,
    Standard,
}

/// Per-site options passed to the rendering transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Execute client-side scripts before capturing the page.
    pub render_js: bool,
    /// Route through the residential/premium proxy pool.
    pub premium_proxy: bool,
    /// Proxy country hint (ISO 3166-1 alpha-2, lowercase).
    pub country: Option<String>,
    /// Extra wait after page load.
    pub wait: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self { render_js: true, premium_proxy: false, country: None, wait: Duration::from_secs(2) }
    }
}

/// Result of classifying a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteClassification {
    /// Short identifier of a known portal (`"seloger"`, `"leboncoin"`, ...).
    pub site_id: Option<&'static str>,
    pub tier: ProtectionTier,
    pub options: TransportOptions,
}

impl SiteClassification {
    /// Label used in responses: the site id, or `"web"` for unknown hosts.
    pub fn source_label(&self) -> &'static str {
        self.site_id.unwrap_or("web")
    }
}

/// One known portal.
#[derive(Debug, Clone)]
pub struct SiteEntry {
    /// Registrable domain; subdomains match too.
    pub domain: &'static str,
    pub site_id: &'static str,
    pub tier: ProtectionTier,
    pub options: TransportOptions,
}

impl SiteEntry {
    pub fn standard(domain: &'static str, site_id: &'static str) -> Self {
        Self { domain, site_id, tier: ProtectionTier::Standard, options: TransportOptions::default() }
    }

    pub fn protected(domain: &'static str, site_id: &'static str, wait: Duration) -> Self {
        Self {
            domain,
            site_id,
            tier: ProtectionTier::Protected,
            options: TransportOptions {
                render_js: true,
                premium_proxy: true,
                country: Some("fr".to_string()),
                wait,
            },
        }
    }
}

/// Static hostname lookup table.
#[derive(Debug, Clone)]
pub struct SiteTable {
    entries: Vec<SiteEntry>,
    fallback: TransportOptions,
}

impl SiteTable {
    pub fn new(entries: Vec<SiteEntry>) -> Self {
        Self { entries, fallback: TransportOptions::default() }
    }

    /// Overrides the options given to unknown hosts.
    pub fn with_fallback(mut self, fallback: TransportOptions) -> Self {
        self.fallback = fallback;
        self
    }

    /// Known French listing portals.
    pub fn builtin() -> Self {
        Self::new(vec![
            SiteEntry::protected("seloger.com", "seloger", Duration::from_secs(3)),
            SiteEntry::protected("leboncoin.fr", "leboncoin", Duration::from_secs(5)),
            SiteEntry::protected("logic-immo.com", "logic-immo", Duration::from_secs(3)),
            SiteEntry::standard("bienici.com", "bienici"),
            SiteEntry::standard("bien-ici.com", "bienici"),
            SiteEntry::standard("pap.fr", "pap"),
            SiteEntry::standard("ouestfrance-immo.com", "ouestfrance"),
            SiteEntry::standard("immo.lefigaro.fr", "figaro"),
        ])
    }

    /// Classifies a URL by its hostname.
    pub fn classify(&self, url: &Url) -> SiteClassification {
        url.host_str()
            .and_then(|host| self.lookup(host))
            .map(|entry| SiteClassification {
                site_id: Some(entry.site_id),
                tier: entry.tier,
                options: entry.options.clone(),
            })
            .unwrap_or_else(|| SiteClassification {
                site_id: None,
                tier: ProtectionTier::Standard,
                options: self.fallback.clone(),
            })
    }

    /// Finds the entry whose domain equals the host or is one of its parents.
    fn lookup(&self, host: &str) -> Option<&SiteEntry> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.entries.iter().find(|entry| {
            host == entry.domain
                || host
                    .strip_suffix(entry.domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl Default for SiteTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(url: &str) -> SiteClassification {
        SiteTable::builtin().classify(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_protected_portal() {
        let c = classify("https://www.seloger.com/annonces/achat/appartement/paris-15eme-75/123.htm");
        assert_eq!(c.site_id, Some("seloger"));
        assert_eq!(c.tier, ProtectionTier::Protected);
        assert!(c.options.render_js);
        assert!(c.options.premium_proxy);
        assert_eq!(c.options.country.as_deref(), Some("fr"));
    }

    #[test]
    fn test_standard_portal() {
        let c = classify("https://www.pap.fr/annonces/appartement-paris-15e-r123");
        assert_eq!(c.site_id, Some("pap"));
        assert_eq!(c.tier, ProtectionTier::Standard);
        assert!(!c.options.premium_proxy);
    }

    #[test]
    fn test_unknown_host_defaults() {
        let c = classify("https://agence-dupont.fr/biens/42");
        assert_eq!(c.site_id, None);
        assert_eq!(c.source_label(), "web");
        assert_eq!(c.tier, ProtectionTier::Standard);
        assert_eq!(c.options, TransportOptions::default());
    }

    #[test]
    fn test_custom_table_and_fallback() {
        let fallback = TransportOptions { render_js: false, ..Default::default() };
        let table = SiteTable::new(vec![SiteEntry::protected("agence-dupont.fr", "dupont", Duration::from_secs(1))])
            .with_fallback(fallback.clone());

        let known = table.classify(&Url::parse("https://www.agence-dupont.fr/biens/42").unwrap());
        assert_eq!(known.tier, ProtectionTier::Protected);
        assert_eq!(known.options.wait, Duration::from_secs(1));

        let unknown = table.classify(&Url::parse("https://www.pap.fr/annonces/1").unwrap());
        assert_eq!(unknown.site_id, None);
        assert_eq!(unknown.options, fallback);
    }

    #[test]
    fn test_lookalike_domain_not_matched() {
        let c = classify("https://notseloger.com/annonce");
        assert_eq!(c.site_id, None);

        let c = classify("https://seloger.com.evil.example/annonce");
        assert_eq!(c.site_id, None);
    }

    #[test]
    fn test_figaro_subdomain_only() {
        assert_eq!(classify("https://immo.lefigaro.fr/annonces/1").site_id, Some("figaro"));
        assert_eq!(classify("https://www.lefigaro.fr/actualite").site_id, None);
    }

    #[test]
    fn test_injected_table() {
        let table = SiteTable::new(vec![SiteEntry::protected("example.org", "example", Duration::from_secs(1))]);
        let c = table.classify(&Url::parse("https://listings.example.org/1").unwrap());
        assert_eq!(c.site_id, Some("example"));
        assert_eq!(c.tier, ProtectionTier::Protected);

        let c = table.classify(&Url::parse("https://www.seloger.com/1").unwrap());
        assert_eq!(c.site_id, None);
    }
}
