//! PostgREST-style client for the hosted database plus its storage API.
//!
//! Tables are addressed as `{base}/rest/v1/{table}` with `column=eq.value`
//! filters; objects live under `{base}/storage/v1/object/{bucket}/{path}`.

use std::fmt::Display;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{
    BackendError, DestinationRepository, ObjectStorage, PropertyFilter, PropertyRepository,
    SettingsRepository, UserFilter, UserRepository,
};
use crate::config::{BackendConfig, BackendMode};
use crate::listings::domain::{
    DestinationId, FeaturedDestination, Property, PropertyId, UserId, UserProfile, UserRole,
};
use crate::listings::limits::{HostLimitOverride, PropertyLimits};
use crate::platform::PlatformSettings;

const PROFILES: &str = "profiles";
const PROPERTIES: &str = "properties";
const PLATFORM_SETTINGS: &str = "platform_settings";
const PROPERTY_LIMITS: &str = "property_limits";
const HOST_LIMIT_OVERRIDES: &str = "host_limit_overrides";
const FEATURED_DESTINATIONS: &str = "featured_destinations";

/// Row id of the singleton settings tables.
const SINGLETON_ID: u8 = 1;

type Query = Vec<(String, String)>;

#[derive(Debug, Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SingletonRow<T> {
    id: u8,
    #[serde(flatten)]
    value: T,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, service_key)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            service_key: service_key.into(),
        }
    }

    /// Build a client when the configuration selects the REST backend.
    pub fn from_config(config: &BackendConfig) -> Option<Self> {
        match &config.mode {
            BackendMode::Rest { url, service_key } => Some(Self::new(url, service_key)),
            BackendMode::Memory => None,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify(status, body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json::<T>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, BackendError> {
        debug!(table, ?query, "select");
        let response = self
            .send(self.client.get(self.table_url(table)).query(query))
            .await?;
        Self::decode(response).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: impl Display,
    ) -> Result<Option<T>, BackendError> {
        let query = vec![
            ("select".to_string(), "*".to_string()),
            (column.to_string(), eq(value)),
        ];
        let rows: Vec<T> = self.select(table, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_row<T>(&self, table: &str, row: &T, upsert: bool) -> Result<T, BackendError>
    where
        T: Serialize + DeserializeOwned,
    {
        let prefer = if upsert {
            "resolution=merge-duplicates,return=representation"
        } else {
            "return=representation"
        };
        let response = self
            .send(
                self.client
                    .post(self.table_url(table))
                    .header("Prefer", prefer)
                    .json(row),
            )
            .await?;
        first_row(Self::decode(response).await?)
    }

    async fn patch_row<T>(
        &self,
        table: &str,
        column: &str,
        value: impl Display,
        body: &impl Serialize,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(
                self.client
                    .patch(self.table_url(table))
                    .query(&[(column, eq(value))])
                    .header("Prefer", "return=representation")
                    .json(body),
            )
            .await?;
        first_row(Self::decode(response).await?)
    }

    async fn delete_row(
        &self,
        table: &str,
        column: &str,
        value: impl Display,
    ) -> Result<(), BackendError> {
        let response = self
            .send(
                self.client
                    .delete(self.table_url(table))
                    .query(&[(column, eq(value))])
                    .header("Prefer", "return=representation"),
            )
            .await?;
        let removed: Vec<serde_json::Value> = Self::decode(response).await?;
        if removed.is_empty() {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    async fn singleton<T: DeserializeOwned + Default>(
        &self,
        table: &str,
    ) -> Result<T, BackendError> {
        let row: Option<SingletonRow<T>> = self.select_one(table, "id", SINGLETON_ID).await?;
        Ok(row.map(|row| row.value).unwrap_or_default())
    }

    async fn save_singleton<T>(&self, table: &str, value: T) -> Result<T, BackendError>
    where
        T: Serialize + DeserializeOwned,
    {
        let row = SingletonRow {
            id: SINGLETON_ID,
            value,
        };
        let saved = self.insert_row(table, &row, true).await?;
        Ok(saved.value)
    }
}

fn eq(value: impl Display) -> String {
    format!("eq.{value}")
}

fn first_row<T>(rows: Vec<T>) -> Result<T, BackendError> {
    rows.into_iter().next().ok_or(BackendError::NotFound)
}

fn classify(status: StatusCode, body: String) -> BackendError {
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::CONFLICT => BackendError::Conflict,
        other => BackendError::Rejected {
            status: other.as_u16(),
            body,
        },
    }
}

/// Strip characters that carry meaning inside a PostgREST `or=(...)` expression.
fn ilike_pattern(term: &str) -> String {
    let cleaned: String = term
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"' | '\\'))
        .collect();
    format!("*{cleaned}*")
}

fn property_query(filter: &PropertyFilter) -> Query {
    let mut query = vec![("select".to_string(), "*".to_string())];
    if let Some(status) = filter.status {
        query.push(("status".to_string(), eq(status.label())));
    }
    if let Some(featured) = filter.featured {
        query.push(("featured".to_string(), eq(featured)));
    }
    if let Some(host) = filter.host_id {
        query.push(("host_id".to_string(), eq(host)));
    }
    if let Some(term) = filter.search_term() {
        let pattern = ilike_pattern(&term);
        query.push((
            "or".to_string(),
            format!("(basic_info->>name.ilike.{pattern},basic_info->>city.ilike.{pattern})"),
        ));
    }
    query.push(("order".to_string(), "created_at.desc".to_string()));
    query
}

fn user_query(filter: &UserFilter) -> Query {
    let mut query = vec![("select".to_string(), "*".to_string())];
    if let Some(role) = filter.role {
        query.push(("role".to_string(), eq(role.label())));
    }
    if let Some(term) = filter.search_term() {
        let pattern = ilike_pattern(&term);
        query.push((
            "or".to_string(),
            format!("(email.ilike.{pattern},full_name.ilike.{pattern})"),
        ));
    }
    query.push(("order".to_string(), "email.asc".to_string()));
    query
}

#[async_trait]
impl PropertyRepository for RestBackend {
    async fn insert(&self, property: Property) -> Result<Property, BackendError> {
        self.insert_row(PROPERTIES, &property, false).await
    }

    async fn update(&self, property: Property) -> Result<Property, BackendError> {
        self.patch_row(PROPERTIES, "id", property.id, &property).await
    }

    async fn fetch(&self, id: PropertyId) -> Result<Option<Property>, BackendError> {
        self.select_one(PROPERTIES, "id", id).await
    }

    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, BackendError> {
        self.select(PROPERTIES, &property_query(filter)).await
    }

    async fn delete(&self, id: PropertyId) -> Result<(), BackendError> {
        self.delete_row(PROPERTIES, "id", id).await
    }
}

#[async_trait]
impl UserRepository for RestBackend {
    async fn insert(&self, profile: UserProfile) -> Result<UserProfile, BackendError> {
        self.insert_row(PROFILES, &profile, false).await
    }

    async fn fetch(&self, id: UserId) -> Result<Option<UserProfile>, BackendError> {
        self.select_one(PROFILES, "id", id).await
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserProfile>, BackendError> {
        self.select(PROFILES, &user_query(filter)).await
    }

    async fn update_role(&self, id: UserId, role: UserRole) -> Result<UserProfile, BackendError> {
        self.patch_row(PROFILES, "id", id, &json!({ "role": role }))
            .await
    }
}

#[async_trait]
impl SettingsRepository for RestBackend {
    async fn platform_settings(&self) -> Result<PlatformSettings, BackendError> {
        self.singleton(PLATFORM_SETTINGS).await
    }

    async fn save_platform_settings(
        &self,
        settings: PlatformSettings,
    ) -> Result<PlatformSettings, BackendError> {
        self.save_singleton(PLATFORM_SETTINGS, settings).await
    }

    async fn property_limits(&self) -> Result<PropertyLimits, BackendError> {
        self.singleton(PROPERTY_LIMITS).await
    }

    async fn save_property_limits(
        &self,
        limits: PropertyLimits,
    ) -> Result<PropertyLimits, BackendError> {
        self.save_singleton(PROPERTY_LIMITS, limits).await
    }

    async fn host_override(
        &self,
        host: UserId,
    ) -> Result<Option<HostLimitOverride>, BackendError> {
        self.select_one(HOST_LIMIT_OVERRIDES, "host_id", host).await
    }

    async fn save_host_override(
        &self,
        entry: HostLimitOverride,
    ) -> Result<HostLimitOverride, BackendError> {
        self.insert_row(HOST_LIMIT_OVERRIDES, &entry, true).await
    }

    async fn delete_host_override(&self, host: UserId) -> Result<(), BackendError> {
        self.delete_row(HOST_LIMIT_OVERRIDES, "host_id", host).await
    }

    async fn list_host_overrides(&self) -> Result<Vec<HostLimitOverride>, BackendError> {
        let query = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "updated_at.desc".to_string()),
        ];
        self.select(HOST_LIMIT_OVERRIDES, &query).await
    }
}

#[async_trait]
impl DestinationRepository for RestBackend {
    async fn list(&self) -> Result<Vec<FeaturedDestination>, BackendError> {
        let query = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "display_order.asc,name.asc".to_string()),
        ];
        self.select(FEATURED_DESTINATIONS, &query).await
    }

    async fn fetch(
        &self,
        id: DestinationId,
    ) -> Result<Option<FeaturedDestination>, BackendError> {
        self.select_one(FEATURED_DESTINATIONS, "id", id).await
    }

    async fn insert(
        &self,
        destination: FeaturedDestination,
    ) -> Result<FeaturedDestination, BackendError> {
        self.insert_row(FEATURED_DESTINATIONS, &destination, false)
            .await
    }

    async fn update(
        &self,
        destination: FeaturedDestination,
    ) -> Result<FeaturedDestination, BackendError> {
        self.patch_row(FEATURED_DESTINATIONS, "id", destination.id, &destination)
            .await
    }

    async fn delete(&self, id: DestinationId) -> Result<(), BackendError> {
        self.delete_row(FEATURED_DESTINATIONS, "id", id).await
    }
}

#[async_trait]
impl ObjectStorage for RestBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        self.send(
            self.client
                .post(self.object_url(bucket, path))
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes),
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!("{}/storage/v1/object/{bucket}", self.base_url);
        self.send(self.client.delete(url).json(&json!({ "prefixes": paths })))
            .await?;
        Ok(())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, BackendError> {
        let url = format!("{}/storage/v1/object/sign/{bucket}/{path}", self.base_url);
        let response = self
            .send(
                self.client
                    .post(url)
                    .json(&json!({ "expiresIn": expires_in_secs })),
            )
            .await?;
        let signed: SignedUrlResponse = Self::decode(response).await?;
        if signed.signed_url.starts_with("http") {
            Ok(signed.signed_url)
        } else {
            Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::domain::PropertyStatus;
    use uuid::Uuid;

    fn value<'a>(query: &'a Query, key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn property_filters_become_eq_clauses() {
        let host = UserId(Uuid::nil());
        let filter = PropertyFilter {
            status: Some(PropertyStatus::UnderReview),
            featured: Some(true),
            host_id: Some(host),
            search: None,
        };
        let query = property_query(&filter);
        assert_eq!(value(&query, "status"), Some("eq.under_review"));
        assert_eq!(value(&query, "featured"), Some("eq.true"));
        assert_eq!(
            value(&query, "host_id"),
            Some("eq.00000000-0000-0000-0000-000000000000")
        );
        assert_eq!(value(&query, "order"), Some("created_at.desc"));
        assert_eq!(value(&query, "or"), None);
    }

    #[test]
    fn search_terms_are_sanitized() {
        let filter = UserFilter {
            role: Some(UserRole::Host),
            search: Some(" Ana,(x) ".to_string()),
        };
        let query = user_query(&filter);
        assert_eq!(value(&query, "role"), Some("eq.host"));
        assert_eq!(
            value(&query, "or"),
            Some("(email.ilike.*anax*,full_name.ilike.*anax*)")
        );
    }

    #[test]
    fn status_codes_map_to_backend_errors() {
        assert_eq!(classify(StatusCode::NOT_FOUND, String::new()), BackendError::NotFound);
        assert_eq!(classify(StatusCode::CONFLICT, String::new()), BackendError::Conflict);
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, "bad column".to_string()),
            BackendError::Rejected {
                status: 400,
                body: "bad column".to_string()
            }
        );
    }

    #[test]
    fn singleton_rows_flatten_settings() {
        let row = SingletonRow {
            id: SINGLETON_ID,
            value: PropertyLimits::default(),
        };
        let encoded = serde_json::to_value(&row).unwrap();
        assert_eq!(
            encoded,
            json!({"id": 1, "max_properties_per_host": 10, "max_pending_per_host": 3})
        );
        let decoded: SingletonRow<PropertyLimits> =
            serde_json::from_value(json!({"id": 1, "max_pending_per_host": 2})).unwrap();
        assert_eq!(decoded.value.max_pending_per_host, 2);
        assert_eq!(decoded.value.max_properties_per_host, 10);
    }

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let backend = RestBackend::new("https://db.example.test/", "key");
        assert_eq!(
            backend.public_url("property-photos", "a/b.jpg"),
            "https://db.example.test/storage/v1/object/public/property-photos/a/b.jpg"
        );
        assert_eq!(
            backend.table_url(PROFILES),
            "https://db.example.test/rest/v1/profiles"
        );
    }
}
