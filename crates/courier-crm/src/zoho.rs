//! Zoho CRM contact store.
//!
//! Speaks the CRM v2 REST API: criteria search on the phone fields and a
//! single-record update to flip the outreach flag.
//! Docs: <https://www.zoho.com/crm/developer/docs/api/v2/>

use async_trait::async_trait;
use courier_core::{
    error::CourierError,
    traits::{ContactField, ContactStore, RemoteContact},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Zoho CRM client carrying an opaque OAuth token.
pub struct ZohoClient {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
}

// --- Zoho API types ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<ZohoContact>,
}

#[derive(Debug, Deserialize)]
struct ZohoContact {
    id: String,
    #[serde(rename = "Mobile")]
    mobile: Option<String>,
    #[serde(rename = "Phone")]
    phone: Option<String>,
    #[serde(rename = "PC")]
    pc: Option<String>,
}

impl ZohoContact {
    /// Map onto the store-agnostic contact, preferring the field the
    /// search matched on.
    fn into_contact(self, field: ContactField) -> RemoteContact {
        let phone = match field {
            ContactField::Mobile => self.mobile.or(self.phone),
            ContactField::Phone => self.phone.or(self.mobile),
        };
        RemoteContact {
            id: self.id,
            phone: phone.unwrap_or_default(),
            flag: self.pc.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct UpdateRequest {
    data: Vec<UpdateRecord>,
}

#[derive(Serialize)]
struct UpdateRecord {
    id: String,
    #[serde(rename = "PC")]
    pc: String,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    #[serde(default)]
    data: Vec<UpdateRow>,
}

#[derive(Debug, Deserialize)]
struct UpdateRow {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    info: Option<ListInfo>,
}

#[derive(Debug, Deserialize)]
struct ListInfo {
    #[serde(default)]
    count: u64,
}

impl ZohoClient {
    pub fn new(access_token: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn auth_header(&self) -> String {
        format!("Zoho-oauthtoken {}", self.access_token)
    }

    /// Light connection check: one-contact page fetch. Returns the total
    /// contact count the store reports.
    pub async fn probe(&self) -> Result<u64, CourierError> {
        let url = format!("{}/Contacts", self.api_base);
        let resp = self
            .client
            .get(&url)
            .query(&[("per_page", "1")])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| CourierError::Crm(format!("zoho probe failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CourierError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CourierError::Crm(format!("zoho probe returned {status}: {body}")));
        }

        let parsed: ListResponse = resp
            .json()
            .await
            .map_err(|e| CourierError::Crm(format!("zoho probe parse failed: {e}")))?;

        Ok(parsed.info.map(|i| i.count).unwrap_or(0))
    }
}

#[async_trait]
impl ContactStore for ZohoClient {
    async fn search(
        &self,
        field: ContactField,
        value: &str,
    ) -> Result<Vec<RemoteContact>, CourierError> {
        let url = format!("{}/Contacts/search", self.api_base);
        let criteria = format!("({}:equals:{value})", field.as_str());
        debug!("zoho: search {}={value}", field.as_str());

        let resp = self
            .client
            .get(&url)
            .query(&[("criteria", criteria.as_str())])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| CourierError::Crm(format!("zoho search failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CourierError::Unauthorized);
        }
        // Zoho answers 204 with no body when nothing matches.
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CourierError::Crm(format!(
                "zoho search returned {status}: {body}"
            )));
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| CourierError::Crm(format!("zoho search parse failed: {e}")))?;

        Ok(parsed
            .data
            .into_iter()
            .map(|c| c.into_contact(field))
            .collect())
    }

    async fn update_flag(&self, id: &str, value: &str) -> Result<bool, CourierError> {
        let url = format!("{}/Contacts/{id}", self.api_base);
        let body = UpdateRequest {
            data: vec![UpdateRecord {
                id: id.to_string(),
                pc: value.to_string(),
            }],
        };
        debug!("zoho: update contact {id}");

        let resp = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| CourierError::Crm(format!("zoho update failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CourierError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CourierError::Crm(format!(
                "zoho update returned {status}: {body}"
            )));
        }

        let parsed: UpdateResponse = resp
            .json()
            .await
            .map_err(|e| CourierError::Crm(format!("zoho update parse failed: {e}")))?;

        Ok(parsed
            .data
            .first()
            .map(|row| row.status == "success")
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{"data":[{"id":"3652397000000649013","Mobile":"9876543210","Phone":null,"PC":"No"}],"info":{"count":1}}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 1);

        let contact = resp.data.into_iter().next().unwrap().into_contact(ContactField::Mobile);
        assert_eq!(contact.id, "3652397000000649013");
        assert_eq!(contact.phone, "9876543210");
        assert_eq!(contact.flag, "No");
    }

    #[test]
    fn test_search_response_missing_data_defaults_empty() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.data.is_empty());
    }

    #[test]
    fn test_contact_mapping_prefers_searched_field() {
        let json = r#"{"id":"1","Mobile":"111","Phone":"222","PC":"Yes"}"#;
        let by_mobile: ZohoContact = serde_json::from_str(json).unwrap();
        assert_eq!(by_mobile.into_contact(ContactField::Mobile).phone, "111");

        let by_phone: ZohoContact = serde_json::from_str(json).unwrap();
        assert_eq!(by_phone.into_contact(ContactField::Phone).phone, "222");
    }

    #[test]
    fn test_contact_mapping_falls_back_across_fields() {
        let json = r#"{"id":"1","Mobile":null,"Phone":"222","PC":null}"#;
        let contact: ZohoContact = serde_json::from_str(json).unwrap();
        let mapped = contact.into_contact(ContactField::Mobile);
        assert_eq!(mapped.phone, "222");
        assert_eq!(mapped.flag, "");
    }

    #[test]
    fn test_update_request_serialization() {
        let body = UpdateRequest {
            data: vec![UpdateRecord {
                id: "42".into(),
                pc: "Yes".into(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["data"][0]["id"], "42");
        assert_eq!(json["data"][0]["PC"], "Yes");
    }

    #[test]
    fn test_update_response_row_status() {
        let json = r#"{"data":[{"code":"SUCCESS","status":"success","message":"record updated"}]}"#;
        let resp: UpdateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.first().map(|r| r.status == "success"), Some(true));

        let json = r#"{"data":[{"status":"error"}]}"#;
        let resp: UpdateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.first().map(|r| r.status == "success"), Some(false));
    }

    #[test]
    fn test_list_response_count() {
        let json = r#"{"data":[{"id":"1"}],"info":{"count":1287,"more_records":true}}"#;
        let resp: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.info.map(|i| i.count), Some(1287));
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let client = ZohoClient::new("t".into(), "https://www.zohoapis.com/crm/v2/".into());
        assert_eq!(client.api_base, "https://www.zohoapis.com/crm/v2");
    }
}
