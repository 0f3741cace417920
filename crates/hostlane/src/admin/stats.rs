use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{AdminError, AdminService};
use crate::backend::{PropertyFilter, UserFilter};
use crate::listings::domain::{Property, PropertyStatus, UserId, UserProfile, UserRole};

const RECENT_WINDOW_DAYS: i64 = 7;
const TOP_CITIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub role: UserRole,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: PropertyStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub country: String,
    pub count: usize,
}

/// Figures shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub users_by_role: Vec<RoleCount>,
    pub total_properties: usize,
    pub properties_by_status: Vec<StatusCount>,
    pub featured_properties: usize,
    pub review_queue: usize,
    pub new_properties_last_7_days: usize,
    /// Share of decided listings that were approved, between 0 and 1.
    pub approval_rate: f64,
    pub top_cities: Vec<CityCount>,
    pub generated_at: DateTime<Utc>,
}

pub fn compute_stats(
    users: &[UserProfile],
    properties: &[Property],
    now: DateTime<Utc>,
) -> DashboardStats {
    let users_by_role = UserRole::ordered()
        .into_iter()
        .map(|role| RoleCount {
            role,
            label: role.label(),
            count: users.iter().filter(|user| user.role == role).count(),
        })
        .collect();

    let properties_by_status: Vec<StatusCount> = PropertyStatus::ordered()
        .into_iter()
        .map(|status| StatusCount {
            status,
            label: status.label(),
            count: properties
                .iter()
                .filter(|property| property.status == status)
                .count(),
        })
        .collect();
    let count_of = |status: PropertyStatus| {
        properties_by_status
            .iter()
            .find(|entry| entry.status == status)
            .map_or(0, |entry| entry.count)
    };

    let approved = count_of(PropertyStatus::Approved);
    let decided = approved + count_of(PropertyStatus::Rejected);
    let approval_rate = if decided == 0 {
        0.0
    } else {
        approved as f64 / decided as f64
    };

    let since = now - Duration::days(RECENT_WINDOW_DAYS);

    DashboardStats {
        total_users: users.len(),
        users_by_role,
        total_properties: properties.len(),
        featured_properties: properties.iter().filter(|p| p.featured).count(),
        review_queue: properties
            .iter()
            .filter(|p| p.status.awaiting_review())
            .count(),
        new_properties_last_7_days: properties.iter().filter(|p| p.created_at >= since).count(),
        approval_rate,
        top_cities: top_cities(properties),
        properties_by_status,
        generated_at: now,
    }
}

fn top_cities(properties: &[Property]) -> Vec<CityCount> {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for property in properties
        .iter()
        .filter(|p| p.status == PropertyStatus::Approved)
    {
        let city = property.basic_info.city.trim();
        if city.is_empty() {
            continue;
        }
        let key = (
            city.to_string(),
            property.basic_info.country.trim().to_string(),
        );
        *counts.entry(key).or_default() += 1;
    }

    let mut cities: Vec<CityCount> = counts
        .into_iter()
        .map(|((city, country), count)| CityCount {
            city,
            country,
            count,
        })
        .collect();
    // Ties break alphabetically so the ranking is stable between requests.
    cities.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.city.cmp(&b.city))
            .then_with(|| a.country.cmp(&b.country))
    });
    cities.truncate(TOP_CITIES);
    cities
}

impl AdminService {
    pub async fn dashboard_stats(
        &self,
        caller: UserId,
        now: DateTime<Utc>,
    ) -> Result<DashboardStats, AdminError> {
        self.authorize(caller).await?;
        let users = self.users.list(&UserFilter::default()).await?;
        let properties = self.properties.list(&PropertyFilter::default()).await?;
        Ok(compute_stats(&users, &properties, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::testing::harness;
    use crate::listings::fixtures::{host_id, property, user};

    fn in_city(status: PropertyStatus, city: &str) -> Property {
        let mut listing = property(host_id(), status);
        listing.basic_info.city = city.to_string();
        listing
    }

    #[test]
    fn empty_platform_has_zero_approval_rate() {
        let stats = compute_stats(&[], &[], Utc::now());
        assert_eq!(stats.total_properties, 0);
        assert_eq!(stats.approval_rate, 0.0);
        assert!(stats.top_cities.is_empty());
        assert_eq!(stats.properties_by_status.len(), 4);
    }

    #[test]
    fn counts_queue_rate_and_recent_listings() {
        let now = Utc::now();
        let mut old = in_city(PropertyStatus::Approved, "Lisbon");
        old.created_at = now - Duration::days(30);
        let mut featured = in_city(PropertyStatus::Approved, "Porto");
        featured.featured = true;
        let properties = vec![
            old,
            featured,
            in_city(PropertyStatus::Approved, "Lisbon"),
            in_city(PropertyStatus::Rejected, "Faro"),
            in_city(PropertyStatus::Pending, "Faro"),
            in_city(PropertyStatus::UnderReview, "Faro"),
        ];
        let users = vec![
            user(UserRole::Admin, "a@example.test"),
            user(UserRole::Host, "h@example.test"),
            user(UserRole::Host, "h2@example.test"),
        ];

        let stats = compute_stats(&users, &properties, now);
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.users_by_role[1].count, 2);
        assert_eq!(stats.review_queue, 2);
        assert_eq!(stats.featured_properties, 1);
        assert_eq!(stats.new_properties_last_7_days, 5);
        assert!((stats.approval_rate - 0.75).abs() < f64::EPSILON);
        assert_eq!(stats.top_cities[0].city, "Lisbon");
        assert_eq!(stats.top_cities[0].count, 2);
        assert_eq!(stats.top_cities.len(), 2);
    }

    #[test]
    fn top_cities_keeps_five() {
        let properties: Vec<Property> = ["A", "B", "C", "D", "E", "F", "A"]
            .into_iter()
            .map(|city| in_city(PropertyStatus::Approved, city))
            .collect();
        let cities = top_cities(&properties);
        assert_eq!(cities.len(), 5);
        assert_eq!(cities[0].city, "A");
        assert_eq!(cities[1].city, "B");
    }

    #[test]
    fn same_city_name_orders_by_country() {
        let mut portland_us = in_city(PropertyStatus::Approved, "Portland");
        portland_us.basic_info.country = "United States".to_string();
        let mut portland_au = in_city(PropertyStatus::Approved, "Portland");
        portland_au.basic_info.country = "Australia".to_string();

        for properties in [
            vec![portland_us.clone(), portland_au.clone()],
            vec![portland_au, portland_us],
        ] {
            let cities = top_cities(&properties);
            assert_eq!(cities[0].country, "Australia");
            assert_eq!(cities[1].country, "United States");
        }
    }

    #[tokio::test]
    async fn dashboard_requires_admin() {
        let h = harness();
        let host = user(UserRole::Host, "host@example.test");
        let host_id = host.id;
        h.backend.seed_user(host).unwrap();
        h.backend
            .seed_property(property(host_id, PropertyStatus::Pending))
            .unwrap();

        let stats = h.admin.dashboard_stats(h.admin_id, Utc::now()).await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.review_queue, 1);

        assert!(matches!(
            h.admin.dashboard_stats(host_id, Utc::now()).await,
            Err(AdminError::Forbidden)
        ));
    }
}
