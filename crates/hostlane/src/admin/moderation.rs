use std::io::Write;

use serde::Serialize;
use tracing::info;

use super::{AdminError, AdminService};
use crate::backend::{PropertyFilter, PropertyRepository};
use crate::listings::domain::{Property, PropertyId, PropertyStatus, PropertySummaryView, UserId};

#[derive(Debug, Serialize)]
struct PropertyRow<'a> {
    #[serde(rename = "ID")]
    id: PropertyId,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Host")]
    host_id: UserId,
    #[serde(rename = "Category")]
    category: &'static str,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Featured")]
    featured: bool,
    #[serde(rename = "City")]
    city: &'a str,
    #[serde(rename = "Country")]
    country: &'a str,
    #[serde(rename = "Units")]
    units: u16,
    #[serde(rename = "Nightly Rate")]
    nightly_rate: u32,
    #[serde(rename = "Currency")]
    currency: &'a str,
    #[serde(rename = "Created At")]
    created_at: String,
    #[serde(rename = "Reviewed At")]
    reviewed_at: String,
    #[serde(rename = "Rejection Reason")]
    rejection_reason: &'a str,
}

impl<'a> From<&'a Property> for PropertyRow<'a> {
    fn from(property: &'a Property) -> Self {
        Self {
            id: property.id,
            name: &property.basic_info.name,
            host_id: property.host_id,
            category: property.category.label(),
            status: property.status.label(),
            featured: property.featured,
            city: &property.basic_info.city,
            country: &property.basic_info.country,
            units: property.unit_count,
            nightly_rate: property.pricing.nightly_rate,
            currency: &property.pricing.currency,
            created_at: property.created_at.to_rfc3339(),
            reviewed_at: property
                .reviewed_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            rejection_reason: property.rejection_reason.as_deref().unwrap_or(""),
        }
    }
}

/// Write one CSV row per property, with a header row.
pub fn write_properties_csv<W: Write>(
    properties: &[Property],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for property in properties {
        csv_writer.serialize(PropertyRow::from(property))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export every property matching `filter` as CSV text.
pub async fn export_properties_csv(
    properties: &dyn PropertyRepository,
    filter: &PropertyFilter,
) -> Result<String, AdminError> {
    let rows = properties.list(filter).await?;
    let mut buffer = Vec::new();
    write_properties_csv(&rows, &mut buffer).map_err(|err| AdminError::Export(err.to_string()))?;
    String::from_utf8(buffer).map_err(|err| AdminError::Export(err.to_string()))
}

impl AdminService {
    pub async fn list_properties(
        &self,
        caller: UserId,
        filter: &PropertyFilter,
    ) -> Result<Vec<PropertySummaryView>, AdminError> {
        self.authorize(caller).await?;
        let properties = self.properties.list(filter).await?;
        Ok(properties.iter().map(Property::summary_view).collect())
    }

    pub async fn property_detail(
        &self,
        caller: UserId,
        id: PropertyId,
    ) -> Result<Property, AdminError> {
        self.authorize(caller).await?;
        Ok(self.listings.fetch(id).await?)
    }

    pub async fn start_review(
        &self,
        caller: UserId,
        id: PropertyId,
    ) -> Result<Property, AdminError> {
        self.authorize(caller).await?;
        Ok(self
            .listings
            .transition(id, PropertyStatus::UnderReview, None, caller)
            .await?)
    }

    pub async fn approve(&self, caller: UserId, id: PropertyId) -> Result<Property, AdminError> {
        self.authorize(caller).await?;
        Ok(self
            .listings
            .transition(id, PropertyStatus::Approved, None, caller)
            .await?)
    }

    pub async fn reject(
        &self,
        caller: UserId,
        id: PropertyId,
        reason: String,
    ) -> Result<Property, AdminError> {
        self.authorize(caller).await?;
        Ok(self
            .listings
            .transition(id, PropertyStatus::Rejected, Some(reason), caller)
            .await?)
    }

    pub async fn set_featured(
        &self,
        caller: UserId,
        id: PropertyId,
        featured: bool,
    ) -> Result<Property, AdminError> {
        self.authorize(caller).await?;
        Ok(self.listings.set_featured(id, featured).await?)
    }

    /// Delete a listing in any status together with its stored files.
    pub async fn delete_property(&self, caller: UserId, id: PropertyId) -> Result<(), AdminError> {
        self.authorize(caller).await?;
        let removed = self.listings.remove(id).await?;
        info!(admin = %caller, property = %id, host = %removed.host_id, "listing removed by admin");
        Ok(())
    }

    pub async fn export_csv(
        &self,
        caller: UserId,
        filter: &PropertyFilter,
    ) -> Result<String, AdminError> {
        self.authorize(caller).await?;
        export_properties_csv(self.properties.as_ref(), filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::testing::harness;
    use crate::listings::fixtures::{host_id, property};
    use crate::listings::ListingServiceError;

    #[tokio::test]
    async fn review_then_approve_then_feature() {
        let h = harness();
        let listing = property(host_id(), PropertyStatus::Pending);
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        let reviewing = h.admin.start_review(h.admin_id, id).await.unwrap();
        assert_eq!(reviewing.status, PropertyStatus::UnderReview);
        assert_eq!(reviewing.reviewed_by, Some(h.admin_id));

        let approved = h.admin.approve(h.admin_id, id).await.unwrap();
        assert_eq!(approved.status, PropertyStatus::Approved);

        let featured = h.admin.set_featured(h.admin_id, id, true).await.unwrap();
        assert!(featured.featured);

        let views = h
            .admin
            .list_properties(
                h.admin_id,
                &PropertyFilter {
                    featured: Some(true),
                    ..PropertyFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status_label, "approved");
    }

    #[tokio::test]
    async fn reject_needs_a_reason() {
        let h = harness();
        let listing = property(host_id(), PropertyStatus::Pending);
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        let err = h
            .admin
            .reject(h.admin_id, id, "   ".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::Listing(ListingServiceError::ReasonRequired)
        ));

        let rejected = h
            .admin
            .reject(h.admin_id, id, "Photos are blurry".to_string())
            .await
            .unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Photos are blurry"));
    }

    #[tokio::test]
    async fn approved_listing_cannot_be_rejected() {
        let h = harness();
        let listing = property(host_id(), PropertyStatus::Approved);
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        let err = h
            .admin
            .reject(h.admin_id, id, "late".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn delete_removes_listing() {
        let h = harness();
        let listing = property(host_id(), PropertyStatus::Approved);
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        h.admin.delete_property(h.admin_id, id).await.unwrap();
        let err = h.admin.property_detail(h.admin_id, id).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn export_writes_header_and_filtered_rows() {
        let h = harness();
        let mut rejected = property(host_id(), PropertyStatus::Rejected);
        rejected.rejection_reason = Some("Missing documents, again".to_string());
        h.backend.seed_property(rejected).unwrap();
        h.backend
            .seed_property(property(host_id(), PropertyStatus::Approved))
            .unwrap();

        let csv = h
            .admin
            .export_csv(h.admin_id, &PropertyFilter::with_status(PropertyStatus::Rejected))
            .await
            .unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("ID,Name,Host,Category,Status"));
        let row = lines.next().unwrap();
        assert!(row.contains(",rejected,"));
        assert!(row.contains("\"Missing documents, again\""));
        assert!(lines.next().is_none());
    }
}
