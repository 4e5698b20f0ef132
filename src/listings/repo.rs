//! Listing repository — translates drafts and filter sets into calls
//! against the remote Supabase (PostgREST) `properties` collection.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::StoreError;
use crate::listings::model::{DraftListing, FilterSet, Listing};

/// Backend-agnostic persistence seam for listings.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Persist a completed draft for `owner`. Returns the stored record.
    async fn insert(&self, owner: i64, draft: DraftListing) -> Result<Listing, StoreError>;

    /// Fetch listings matching `filters`, newest first.
    async fn query(&self, filters: &FilterSet) -> Result<Vec<Listing>, StoreError>;

    /// Fetch the stored contact text for one listing, if it exists.
    async fn contact_info(&self, listing_id: i64) -> Result<Option<String>, StoreError>;
}

/// Supabase-backed repository over the PostgREST HTTP API.
pub struct SupabaseRepository {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl SupabaseRepository {
    pub fn new(base_url: String, api_key: SecretString) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/properties", self.base_url)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret())
    }

    /// PostgREST query params for a filter set. Repeated `price` keys are
    /// how PostgREST expresses an inclusive range.
    fn filter_params(filters: &FilterSet) -> Vec<(String, String)> {
        let mut params = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "created_at.desc".to_string()),
        ];
        if let Some(kind) = filters.kind {
            params.push(("type".to_string(), format!("eq.{}", kind.label())));
        }
        if let Some(ref location) = filters.location {
            params.push(("location".to_string(), format!("ilike.*{location}*")));
        }
        if let Some(min) = filters.min_price {
            params.push(("price".to_string(), format!("gte.{min}")));
        }
        if let Some(max) = filters.max_price {
            params.push(("price".to_string(), format!("lte.{max}")));
        }
        params
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ListingRepository for SupabaseRepository {
    async fn insert(&self, owner: i64, draft: DraftListing) -> Result<Listing, StoreError> {
        let row = serde_json::json!({
            "description": draft.description,
            "price": draft.price,
            "type": draft.kind.label(),
            "location": draft.location,
            "contact_info": draft.contact,
            "photos": draft.photos,
            "created_at": chrono::Utc::now().to_rfc3339(),
            "user_id": owner,
            "verified_by_admin": "-",
        });

        let resp = self
            .authed(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let resp = Self::check(resp).await?;

        let mut rows: Vec<Listing> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".into()))
    }

    async fn query(&self, filters: &FilterSet) -> Result<Vec<Listing>, StoreError> {
        let resp = self
            .authed(self.client.get(self.table_url()))
            .query(&Self::filter_params(filters))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let resp = Self::check(resp).await?;

        resp.json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn contact_info(&self, listing_id: i64) -> Result<Option<String>, StoreError> {
        #[derive(serde::Deserialize)]
        struct ContactRow {
            contact_info: String,
        }

        let resp = self
            .authed(self.client.get(self.table_url()))
            .query(&[
                ("select", "contact_info".to_string()),
                ("id", format!("eq.{listing_id}")),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let resp = Self::check(resp).await?;

        let mut rows: Vec<ContactRow> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(rows.pop().map(|r| r.contact_info))
    }
}
