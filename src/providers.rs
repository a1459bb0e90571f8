//! ICP API providers.
//!
//! Each provider is a variant of [`ProviderId`] that knows how to build its
//! query URL and how to map its JSON payload onto a [`LookupRecord`]. The
//! per-deployment settings (base URL, retry count, cache TTL) live in
//! [`ProviderConfig`], collected once at start-up into a [`ProviderTable`].

use crate::{config::Config, errors::IcpError, LookupRecord, UNKNOWN};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt, str::FromStr, time::Duration};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// api.leafone.cn registry lookup
    Leafone,
    /// api.vvhan.com lookup, used as fallback
    Vvhan,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Leafone, ProviderId::Vvhan];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Leafone => "leafone",
            ProviderId::Vvhan => "vvhan",
        }
    }

    fn query_param(&self) -> &'static str {
        match self {
            ProviderId::Leafone => "name",
            ProviderId::Vvhan => "url",
        }
    }

    /// Query URL for `domain` against this provider's endpoint.
    pub fn build_url(&self, base_url: &Url, domain: &str) -> Url {
        let mut url = base_url.clone();
        url.query_pairs_mut().append_pair(self.query_param(), domain);
        url
    }

    /// Map a provider payload onto the canonical record.
    ///
    /// Returns `None` when the payload does not carry a record; the pipeline
    /// treats that as "try the next provider", not as an error.
    pub fn parse_response(&self, raw: &Value) -> Option<LookupRecord> {
        let parsed = match self {
            ProviderId::Leafone => parse_leafone(raw),
            ProviderId::Vvhan => parse_vvhan(raw),
        };

        if parsed.is_none() {
            debug!("{} payload carried no record", self);
        }
        parsed
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = IcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| IcpError::UnknownProvider(s.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct LeafoneResponse {
    code: Option<i64>,
    data: Option<LeafoneData>,
}

#[derive(Debug, Deserialize)]
struct LeafoneData {
    list: Option<Vec<LeafoneEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeafoneEntry {
    domain: Option<String>,
    unit_name: Option<String>,
    nature_name: Option<String>,
    service_licence: Option<String>,
    update_record_time: Option<String>,
}

fn parse_leafone(raw: &Value) -> Option<LookupRecord> {
    let response = LeafoneResponse::deserialize(raw).ok()?;
    if response.code != Some(200) {
        return None;
    }

    let entry = response.data?.list?.into_iter().next()?;
    Some(LookupRecord {
        site_name: or_unknown(entry.domain.clone()),
        domain: or_unknown(entry.domain),
        company_name: or_unknown(entry.unit_name),
        nature: or_unknown(entry.nature_name),
        icp: or_unknown(entry.service_licence),
        time: or_unknown(entry.update_record_time),
    })
}

#[derive(Debug, Deserialize)]
struct VvhanResponse {
    success: Option<bool>,
    domain: Option<String>,
    info: Option<VvhanInfo>,
}

#[derive(Debug, Deserialize)]
struct VvhanInfo {
    name: Option<String>,
    title: Option<String>,
    nature: Option<String>,
    icp: Option<String>,
    time: Option<String>,
}

fn parse_vvhan(raw: &Value) -> Option<LookupRecord> {
    let response = VvhanResponse::deserialize(raw).ok()?;
    if response.success != Some(true) {
        return None;
    }

    let info = response.info?;
    Some(LookupRecord {
        domain: or_unknown(response.domain),
        company_name: or_unknown(info.name),
        site_name: or_unknown(info.title),
        nature: or_unknown(info.nature),
        icp: or_unknown(info.icp),
        time: or_unknown(info.time),
    })
}

fn or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Deployment settings for one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub base_url: Url,
    pub retry_count: usize,
    pub cache_ttl: Duration,
}

impl ProviderConfig {
    pub fn new(id: ProviderId, base_url: &str, retry_count: usize, cache_ttl: Duration) -> Result<Self, IcpError> {
        Ok(Self {
            id,
            base_url: Url::parse(base_url)?,
            retry_count,
            cache_ttl,
        })
    }

    pub fn url_for(&self, domain: &str) -> Url {
        self.id.build_url(&self.base_url, domain)
    }

    pub fn parse(&self, raw: &Value) -> Option<LookupRecord> {
        self.id.parse_response(raw)
    }
}

/// Immutable map of every configured provider
#[derive(Debug, Clone)]
pub struct ProviderTable {
    providers: HashMap<ProviderId, ProviderConfig>,
}

impl ProviderTable {
    pub fn new(providers: impl IntoIterator<Item = ProviderConfig>) -> Self {
        Self {
            providers: providers.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, IcpError> {
        Ok(Self::new([
            ProviderConfig::new(
                ProviderId::Leafone,
                &config.leafone_base_url,
                config.leafone_retry_count,
                Duration::from_secs(config.leafone_cache_ttl_seconds),
            )?,
            ProviderConfig::new(
                ProviderId::Vvhan,
                &config.vvhan_base_url,
                config.vvhan_retry_count,
                Duration::from_secs(config.vvhan_cache_ttl_seconds),
            )?,
        ]))
    }

    /// Resolve a configured identifier such as `"leafone"`.
    pub fn get(&self, identifier: &str) -> Result<&ProviderConfig, IcpError> {
        let id: ProviderId = identifier.parse()?;
        self.providers
            .get(&id)
            .ok_or_else(|| IcpError::UnknownProvider(identifier.to_string()))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_leafone_example_payload() {
        let raw = json!({
            "code": 200,
            "data": {
                "list": [{
                    "domain": "example.com",
                    "unitName": "Example Co",
                    "natureName": "Enterprise",
                    "serviceLicence": "京ICP备12345678号",
                    "updateRecordTime": "2021-01-01"
                }]
            }
        });

        let record = ProviderId::Leafone.parse_response(&raw).unwrap();
        assert_eq!(
            record,
            LookupRecord {
                domain: "example.com".to_string(),
                company_name: "Example Co".to_string(),
                site_name: "example.com".to_string(),
                nature: "Enterprise".to_string(),
                icp: "京ICP备12345678号".to_string(),
                time: "2021-01-01".to_string(),
            }
        );
    }

    #[test]
    fn test_leafone_missing_fields_are_unknown() {
        let raw = json!({
            "code": 200,
            "data": { "list": [{ "domain": "example.com", "unitName": "", "natureName": null }] }
        });

        let record = ProviderId::Leafone.parse_response(&raw).unwrap();
        assert_eq!(record.domain, "example.com");
        assert_eq!(record.company_name, UNKNOWN);
        assert_eq!(record.nature, UNKNOWN);
        assert_eq!(record.icp, UNKNOWN);
        assert_eq!(record.time, UNKNOWN);
    }

    #[test]
    fn test_leafone_rejects_empty_payloads() {
        let cases = [
            json!({ "code": 500, "data": { "list": [{ "domain": "example.com" }] } }),
            json!({ "code": 200, "data": { "list": [] } }),
            json!({ "code": 200, "data": {} }),
            json!({ "code": 200 }),
            json!({ "msg": "rate limited" }),
            json!([1, 2, 3]),
            json!("nope"),
        ];

        for raw in cases {
            assert!(ProviderId::Leafone.parse_response(&raw).is_none(), "accepted {}", raw);
        }
    }

    #[test]
    fn test_vvhan_payload() {
        let raw = json!({
            "success": true,
            "domain": "example.com",
            "info": {
                "name": "Example Co",
                "nature": "企业",
                "icp": "京ICP备12345678号-1",
                "title": "Example",
                "time": "2022-11-02"
            }
        });

        let record = ProviderId::Vvhan.parse_response(&raw).unwrap();
        assert_eq!(record.domain, "example.com");
        assert_eq!(record.company_name, "Example Co");
        assert_eq!(record.site_name, "Example");
        assert_eq!(record.nature, "企业");
        assert_eq!(record.icp, "京ICP备12345678号-1");
        assert_eq!(record.time, "2022-11-02");
    }

    #[test]
    fn test_vvhan_rejects_unsuccessful_payloads() {
        assert!(ProviderId::Vvhan.parse_response(&json!({ "success": false, "message": "no record" })).is_none());
        assert!(ProviderId::Vvhan.parse_response(&json!({ "success": true, "domain": "example.com" })).is_none());
    }

    #[test]
    fn test_build_url_encodes_domain() {
        let url = ProviderId::Leafone.build_url(&base("https://api.leafone.cn/api/icp"), "example.com");
        assert_eq!(url.as_str(), "https://api.leafone.cn/api/icp?name=example.com");

        let url = ProviderId::Vvhan.build_url(&base("https://api.vvhan.com/api/icp"), "例子.中国");
        assert!(url.as_str().starts_with("https://api.vvhan.com/api/icp?url="));
        assert_eq!(url.query_pairs().next().unwrap().1, "例子.中国");
    }

    #[test]
    fn test_provider_id_parsing() {
        assert_eq!("leafone".parse::<ProviderId>().unwrap(), ProviderId::Leafone);
        assert_eq!(" VVHAN ".parse::<ProviderId>().unwrap(), ProviderId::Vvhan);
        assert!(matches!("icp".parse::<ProviderId>(), Err(IcpError::UnknownProvider(_))));
    }

    #[test]
    fn test_table_lookup() {
        let table = ProviderTable::new([ProviderConfig::new(
            ProviderId::Leafone,
            "https://api.leafone.cn/api/icp",
            3,
            Duration::from_secs(60),
        )
        .unwrap()]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("leafone").unwrap().retry_count, 3);
        // known variant, but not configured in this table
        assert!(matches!(table.get("vvhan"), Err(IcpError::UnknownProvider(_))));
        assert!(matches!(table.get("whois"), Err(IcpError::UnknownProvider(_))));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ProviderConfig::new(ProviderId::Vvhan, "not a url", 1, Duration::from_secs(1));
        assert!(matches!(result, Err(IcpError::InvalidUrl(_))));
    }
}
