use chrono::{NaiveTime, Utc};
use clap::Args;
use hostlane::admin::DestinationInput;
use hostlane::api::AppServices;
use hostlane::backend::{InMemoryBackend, InMemoryStorage, PropertyFilter};
use hostlane::error::AppError;
use hostlane::listings::catalog::{BedType, ListingMode, PropertyCategory};
use hostlane::listings::domain::{
    BasicInfo, BedCount, Bedroom, CancellationPolicy, DocumentAsset, HouseRules, PhotoAsset,
    Policies, Pricing, RoomConfiguration, UserId, UserProfile, UserRole,
};
use hostlane::listings::wizard::{ListingWizard, WizardStep};
use hostlane::listings::{StorageBuckets, UploadKind, UploadRequest};
use std::sync::Arc;
use uuid::Uuid;

const DEMO_DRAFT: &str = "demo-draft";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// List several identical units instead of a single apartment
    #[arg(long)]
    pub(crate) units: Option<u16>,
    /// Reject the listing once and resubmit it before approval
    #[arg(long)]
    pub(crate) reject_first: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let backend = Arc::new(InMemoryBackend::default());
    let storage = Arc::new(InMemoryStorage::default());
    let services =
        AppServices::from_backend(backend.clone(), storage.clone(), StorageBuckets::default());

    let admin = seed_profile(&backend, UserRole::Admin, "admin@hostlane.example")?;
    let host = seed_profile(&backend, UserRole::Guest, "maria@hostlane.example")?;

    println!("Hostlane demo");
    println!("=============");

    let rules = services.properties.rules().await?;
    let mut wizard = ListingWizard::new(rules);

    while wizard.current() != WizardStep::Review {
        let step = wizard.current();
        fill_step(&mut wizard, step, &services, host, args.units).await?;
        let progress = wizard.progress();
        println!(
            "[{:>3}%] {} ({}/{})",
            progress.percent,
            step.label(),
            progress.position,
            progress.total
        );
        wizard.next()?;
    }

    let review = wizard.review();
    println!();
    println!(
        "Review: {} unit(s), {} photo(s), {} amenities, documents complete: {}",
        review.unit_count, review.photo_count, review.amenity_count, review.checklist.complete
    );
    if let Some(week) = &review.sample_week {
        println!(
            "Sample week: subtotal {} discount {} cleaning {} total {}",
            week.subtotal, week.discount, week.cleaning_fee, week.total
        );
    }

    let submission = wizard.submit()?;
    let property = services.properties.submit_listing(host, submission).await?;
    println!();
    println!(
        "Submitted '{}' as {} ({})",
        property.basic_info.name,
        property.id,
        property.status.label()
    );

    services.admin.start_review(admin, property.id).await?;
    if args.reject_first {
        let rejected = services
            .admin
            .reject(admin, property.id, "Please add a photo of the bathroom".to_string())
            .await?;
        println!(
            "Rejected: {}",
            rejected.rejection_reason.as_deref().unwrap_or_default()
        );
        let resubmitted = services
            .properties
            .resubmit(host, property.id, wizard.draft())
            .await?;
        println!("Resubmitted, status {}", resubmitted.status.label());
        services.admin.start_review(admin, property.id).await?;
    }
    let approved = services.admin.approve(admin, property.id).await?;
    services.admin.set_featured(admin, approved.id, true).await?;
    println!("Approved and featured {}", approved.id);

    services
        .admin
        .create_destination(
            admin,
            DestinationInput {
                name: approved.basic_info.city.clone(),
                country: approved.basic_info.country.clone(),
                description: Some("Canals, museums and cycling everywhere".to_string()),
                image_url: None,
                active: Some(true),
            },
        )
        .await?;

    let stats = services.admin.dashboard_stats(admin, Utc::now()).await?;
    println!();
    println!("Dashboard");
    println!("---------");
    println!("Users: {}", stats.total_users);
    for entry in &stats.users_by_role {
        println!("  {:<8} {}", entry.label, entry.count);
    }
    println!("Properties: {}", stats.total_properties);
    for entry in &stats.properties_by_status {
        println!("  {:<12} {}", entry.label, entry.count);
    }
    println!("Featured: {}", stats.featured_properties);
    println!("Review queue: {}", stats.review_queue);
    println!("Approval rate: {:.0}%", stats.approval_rate * 100.0);
    for city in &stats.top_cities {
        println!("  {} ({}) {}", city.city, city.country, city.count);
    }
    println!("Stored files: {}", storage.object_count());

    let csv = services
        .admin
        .export_csv(admin, &PropertyFilter::default())
        .await?;
    println!();
    print!("{csv}");
    Ok(())
}

fn seed_profile(
    backend: &InMemoryBackend,
    role: UserRole,
    email: &str,
) -> Result<UserId, AppError> {
    let id = UserId(Uuid::new_v4());
    backend.seed_user(UserProfile {
        id,
        email: email.to_string(),
        full_name: None,
        role,
        created_at: Utc::now(),
    })?;
    Ok(id)
}

async fn fill_step(
    wizard: &mut ListingWizard,
    step: WizardStep,
    services: &AppServices,
    host: UserId,
    units: Option<u16>,
) -> Result<(), AppError> {
    match step {
        WizardStep::Category => wizard.select_category(PropertyCategory::Apartment),
        WizardStep::ListingMode => {
            wizard.draft_mut().mode = Some(match units {
                Some(count) if count > 1 => ListingMode::Multiple,
                _ => ListingMode::Single,
            });
        }
        WizardStep::Quantity => wizard.draft_mut().quantity = units,
        WizardStep::BasicInfo => wizard.draft_mut().basic_info = Some(basic_info()),
        WizardStep::Rooms => wizard.draft_mut().rooms = Some(rooms()),
        WizardStep::Amenities => {
            wizard.draft_mut().amenities = ["wifi", "kitchen", "heating", "washer"]
                .into_iter()
                .map(str::to_string)
                .collect();
        }
        WizardStep::Photos => {
            let wanted = wizard.rules().min_photos;
            for index in 1..=wanted {
                let stored = services
                    .uploads
                    .upload(
                        host,
                        UploadRequest {
                            kind: UploadKind::Photo,
                            draft_id: DEMO_DRAFT.to_string(),
                            file_name: format!("room-{index}.jpg"),
                            content_type: Some("image/jpeg".to_string()),
                            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
                        },
                    )
                    .await?;
                wizard.draft_mut().photos.push(PhotoAsset {
                    storage_path: stored.path,
                    url: stored.url,
                    caption: None,
                    is_cover: index == 1,
                });
            }
        }
        WizardStep::Pricing => wizard.draft_mut().pricing = Some(pricing()),
        WizardStep::Policies => wizard.draft_mut().policies = Some(policies()),
        WizardStep::Documents => {
            for kind in wizard.checklist().missing {
                let file_name = format!("{kind:?}.pdf").to_lowercase();
                let stored = services
                    .uploads
                    .upload(
                        host,
                        UploadRequest {
                            kind: UploadKind::Document,
                            draft_id: DEMO_DRAFT.to_string(),
                            file_name: file_name.clone(),
                            content_type: None,
                            bytes: b"%PDF-1.4".to_vec(),
                        },
                    )
                    .await?;
                wizard.draft_mut().documents.push(DocumentAsset {
                    kind,
                    storage_path: stored.path,
                    file_name,
                    uploaded_at: Utc::now(),
                });
            }
        }
        WizardStep::Subtype | WizardStep::Review | WizardStep::Submitted => {}
    }
    Ok(())
}

fn basic_info() -> BasicInfo {
    BasicInfo {
        name: "Canal View Loft".to_string(),
        description: "Bright loft on a quiet canal, five minutes from Central Station."
            .to_string(),
        street_address: "Prinsengracht 263".to_string(),
        city: "Amsterdam".to_string(),
        region: Some("North Holland".to_string()),
        postal_code: "1016 GV".to_string(),
        country: "Netherlands".to_string(),
        latitude: Some(52.3752),
        longitude: Some(4.8840),
    }
}

fn rooms() -> RoomConfiguration {
    RoomConfiguration {
        bedrooms: vec![Bedroom {
            name: Some("Main bedroom".to_string()),
            beds: vec![BedCount {
                bed_type: BedType::Queen,
                count: 1,
            }],
        }],
        living_room_beds: vec![BedCount {
            bed_type: BedType::SofaBed,
            count: 1,
        }],
        bathrooms: 1,
        max_guests: 4,
    }
}

fn pricing() -> Pricing {
    Pricing {
        currency: "EUR".to_string(),
        nightly_rate: 140,
        weekend_rate: Some(165),
        cleaning_fee: 45,
        security_deposit: 200,
        weekly_discount_pct: 10,
        monthly_discount_pct: 20,
        min_nights: 2,
        max_nights: Some(60),
    }
}

fn policies() -> Policies {
    Policies {
        check_in_from: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default(),
        check_in_until: NaiveTime::from_hms_opt(22, 0, 0),
        check_out_until: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or_default(),
        cancellation: CancellationPolicy::Moderate,
        house_rules: HouseRules {
            smoking_allowed: false,
            pets_allowed: false,
            parties_allowed: false,
            children_allowed: true,
            quiet_hours_start: NaiveTime::from_hms_opt(22, 0, 0),
            quiet_hours_end: NaiveTime::from_hms_opt(7, 0, 0),
        },
    }
}
