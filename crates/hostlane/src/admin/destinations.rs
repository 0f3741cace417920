use std::collections::HashSet;

use reqwest::Url;
use serde::Deserialize;
use tracing::info;

use super::{AdminError, AdminService};
use crate::backend::BackendError;
use crate::listings::domain::{DestinationId, FeaturedDestination, UserId};

const MAX_NAME_CHARS: usize = 80;

/// Editable fields of a featured destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DestinationInput {
    pub name: String,
    pub country: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Left unchanged on update when absent; new destinations default to active.
    pub active: Option<bool>,
}

struct CleanInput {
    name: String,
    country: String,
    description: Option<String>,
    image_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl DestinationInput {
    fn clean(&self) -> Result<CleanInput, AdminError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AdminError::InvalidDestination("name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(AdminError::InvalidDestination(format!(
                "name must be at most {MAX_NAME_CHARS} characters"
            )));
        }
        let country = self.country.trim();
        if country.is_empty() {
            return Err(AdminError::InvalidDestination(
                "country is required".to_string(),
            ));
        }

        let image_url = non_blank(self.image_url.clone());
        if let Some(raw) = &image_url {
            let valid = Url::parse(raw)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid {
                return Err(AdminError::InvalidDestination(format!(
                    "image url '{raw}' must be an http(s) address"
                )));
            }
        }

        Ok(CleanInput {
            name: name.to_string(),
            country: country.to_string(),
            description: non_blank(self.description.clone()),
            image_url,
        })
    }
}

fn not_found(id: DestinationId) -> impl FnOnce(BackendError) -> AdminError {
    move |err| match err {
        BackendError::NotFound => AdminError::DestinationNotFound(id),
        other => AdminError::Backend(other),
    }
}

impl AdminService {
    pub async fn list_destinations(
        &self,
        caller: UserId,
    ) -> Result<Vec<FeaturedDestination>, AdminError> {
        self.authorize(caller).await?;
        Ok(self.destinations.list().await?)
    }

    /// Active destinations for the public landing page. No caller check.
    pub async fn active_destinations(&self) -> Result<Vec<FeaturedDestination>, AdminError> {
        let all = self.destinations.list().await?;
        Ok(all.into_iter().filter(|d| d.active).collect())
    }

    pub async fn create_destination(
        &self,
        caller: UserId,
        input: DestinationInput,
    ) -> Result<FeaturedDestination, AdminError> {
        self.authorize(caller).await?;
        let clean = input.clean()?;
        let next_order = self
            .destinations
            .list()
            .await?
            .iter()
            .map(|d| d.display_order)
            .max()
            .unwrap_or(0)
            + 1;

        let destination = FeaturedDestination {
            id: DestinationId::generate(),
            name: clean.name,
            country: clean.country,
            description: clean.description,
            image_url: clean.image_url,
            display_order: next_order,
            active: input.active.unwrap_or(true),
        };
        let stored = self.destinations.insert(destination).await?;
        info!(
            admin = %caller,
            destination = %stored.id,
            name = %stored.name,
            "destination created"
        );
        Ok(stored)
    }

    pub async fn update_destination(
        &self,
        caller: UserId,
        id: DestinationId,
        input: DestinationInput,
    ) -> Result<FeaturedDestination, AdminError> {
        self.authorize(caller).await?;
        let clean = input.clean()?;
        let mut destination = self
            .destinations
            .fetch(id)
            .await?
            .ok_or(AdminError::DestinationNotFound(id))?;

        destination.name = clean.name;
        destination.country = clean.country;
        destination.description = clean.description;
        destination.image_url = clean.image_url;
        if let Some(active) = input.active {
            destination.active = active;
        }
        let stored = self
            .destinations
            .update(destination)
            .await
            .map_err(not_found(id))?;
        info!(admin = %caller, destination = %id, "destination updated");
        Ok(stored)
    }

    pub async fn delete_destination(
        &self,
        caller: UserId,
        id: DestinationId,
    ) -> Result<(), AdminError> {
        self.authorize(caller).await?;
        self.destinations.delete(id).await.map_err(not_found(id))?;
        info!(admin = %caller, destination = %id, "destination deleted");
        Ok(())
    }

    /// Assign `display_order` 1..=n following `ids`, which must name every
    /// existing destination exactly once.
    pub async fn reorder_destinations(
        &self,
        caller: UserId,
        ids: &[DestinationId],
    ) -> Result<Vec<FeaturedDestination>, AdminError> {
        self.authorize(caller).await?;
        let existing = self.destinations.list().await?;

        let unique: HashSet<DestinationId> = ids.iter().copied().collect();
        if unique.len() != ids.len() {
            return Err(AdminError::InvalidOrder("duplicate destination id".to_string()));
        }
        if ids.len() != existing.len() {
            return Err(AdminError::InvalidOrder(format!(
                "expected {} destinations, got {}",
                existing.len(),
                ids.len()
            )));
        }
        if let Some(unknown) = ids
            .iter()
            .find(|id| !existing.iter().any(|d| d.id == **id))
        {
            return Err(AdminError::InvalidOrder(format!(
                "unknown destination {unknown}"
            )));
        }

        let mut reordered = Vec::with_capacity(existing.len());
        for (index, id) in ids.iter().enumerate() {
            let Some(mut destination) = existing.iter().find(|d| d.id == *id).cloned() else {
                continue;
            };
            let order = index as u32 + 1;
            if destination.display_order != order {
                destination.display_order = order;
                destination = self
                    .destinations
                    .update(destination)
                    .await
                    .map_err(not_found(*id))?;
            }
            reordered.push(destination);
        }
        info!(admin = %caller, count = reordered.len(), "destinations reordered");
        Ok(reordered)
    }

    pub async fn toggle_destination(
        &self,
        caller: UserId,
        id: DestinationId,
    ) -> Result<FeaturedDestination, AdminError> {
        self.authorize(caller).await?;
        let mut destination = self
            .destinations
            .fetch(id)
            .await?
            .ok_or(AdminError::DestinationNotFound(id))?;
        destination.active = !destination.active;
        let stored = self
            .destinations
            .update(destination)
            .await
            .map_err(not_found(id))?;
        info!(admin = %caller, destination = %id, active = stored.active, "destination toggled");
        Ok(stored)
    }
}
