use serde::{Deserialize, Serialize};

use super::steps::WizardStep;
use super::validation::{validate_all, ValidationIssue, WizardRules};
use crate::listings::catalog::{
    required_documents, DocumentKind, ListingMode, PropertyCategory, PropertySubtype,
};
use crate::listings::domain::{
    BasicInfo, DocumentAsset, PhotoAsset, Policies, Pricing, RoomConfiguration,
};

/// Values collected so far by the listing wizard. Every field is optional until the
/// matching step has been completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingDraft {
    pub category: Option<PropertyCategory>,
    pub subtype: Option<PropertySubtype>,
    pub mode: Option<ListingMode>,
    pub quantity: Option<u16>,
    pub basic_info: Option<BasicInfo>,
    pub rooms: Option<RoomConfiguration>,
    pub amenities: Vec<String>,
    pub photos: Vec<PhotoAsset>,
    pub pricing: Option<Pricing>,
    pub policies: Option<Policies>,
    pub documents: Vec<DocumentAsset>,
}

impl ListingDraft {
    /// Listing mode after applying the category rules; hotels are always multi-unit.
    pub fn effective_mode(&self) -> Option<ListingMode> {
        match self.category {
            Some(category) if category.always_multi_unit() => Some(ListingMode::Multiple),
            _ => self.mode,
        }
    }

    pub fn unit_count(&self) -> u16 {
        match self.effective_mode() {
            Some(ListingMode::Multiple) => self.quantity.unwrap_or(1),
            _ => 1,
        }
    }

    pub fn checklist(&self) -> DocumentChecklist {
        let required = match self.category {
            Some(category) => {
                required_documents(category, self.effective_mode().unwrap_or(ListingMode::Single))
            }
            None => Vec::new(),
        };

        let mut items: Vec<ChecklistItem> = required
            .iter()
            .map(|kind| ChecklistItem {
                kind: *kind,
                label: kind.label(),
                required: true,
                provided: self.documents.iter().any(|document| document.kind == *kind),
            })
            .collect();

        let mut optional: Vec<DocumentKind> = self
            .documents
            .iter()
            .map(|document| document.kind)
            .filter(|kind| !required.contains(kind))
            .collect();
        optional.sort();
        optional.dedup();
        items.extend(optional.into_iter().map(|kind| ChecklistItem {
            kind,
            label: kind.label(),
            required: false,
            provided: true,
        }));

        let missing: Vec<DocumentKind> = items
            .iter()
            .filter(|item| item.required && !item.provided)
            .map(|item| item.kind)
            .collect();

        DocumentChecklist {
            complete: missing.is_empty(),
            items,
            missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub kind: DocumentKind,
    pub label: &'static str,
    pub required: bool,
    pub provided: bool,
}

/// Required-document checklist for the category and listing mode in a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentChecklist {
    pub items: Vec<ChecklistItem>,
    pub missing: Vec<DocumentKind>,
    pub complete: bool,
}

/// A fully validated listing ready to hand to the property service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSubmission {
    pub category: PropertyCategory,
    pub subtype: Option<PropertySubtype>,
    pub mode: ListingMode,
    pub unit_count: u16,
    pub basic_info: BasicInfo,
    pub rooms: RoomConfiguration,
    pub amenities: Vec<String>,
    pub photos: Vec<PhotoAsset>,
    pub pricing: Pricing,
    pub policies: Policies,
    pub documents: Vec<DocumentAsset>,
}

impl ListingSubmission {
    /// Validate every step of `draft` and normalize it into a submission.
    pub fn from_draft(
        draft: &ListingDraft,
        rules: &WizardRules,
    ) -> Result<Self, Vec<ValidationIssue>> {
        let issues = validate_all(draft, rules);
        if !issues.is_empty() {
            return Err(issues);
        }

        let incomplete = |step: WizardStep, field: &'static str| {
            vec![ValidationIssue::new(step, field, "value is required")]
        };

        let category = draft
            .category
            .ok_or_else(|| incomplete(WizardStep::Category, "category"))?;
        let mode = draft
            .effective_mode()
            .ok_or_else(|| incomplete(WizardStep::ListingMode, "mode"))?;
        let basic_info = draft
            .basic_info
            .clone()
            .ok_or_else(|| incomplete(WizardStep::BasicInfo, "basic_info"))?;
        let rooms = draft
            .rooms
            .clone()
            .ok_or_else(|| incomplete(WizardStep::Rooms, "rooms"))?;
        let pricing = draft
            .pricing
            .clone()
            .ok_or_else(|| incomplete(WizardStep::Pricing, "pricing"))?;
        let policies = draft
            .policies
            .clone()
            .ok_or_else(|| incomplete(WizardStep::Policies, "policies"))?;

        let mut amenities = draft.amenities.clone();
        amenities.sort();
        amenities.dedup();

        let mut photos = draft.photos.clone();
        if !photos.iter().any(|photo| photo.is_cover) {
            if let Some(first) = photos.first_mut() {
                first.is_cover = true;
            }
        }

        Ok(Self {
            category,
            subtype: draft.subtype,
            mode,
            unit_count: draft.unit_count(),
            basic_info: trim_basic_info(basic_info),
            rooms,
            amenities,
            photos,
            pricing: Pricing {
                currency: match pricing.currency.trim() {
                    "" => rules.default_currency.clone(),
                    declared => declared.to_ascii_uppercase(),
                },
                ..pricing
            },
            policies,
            documents: draft.documents.clone(),
        })
    }
}

fn trim_basic_info(info: BasicInfo) -> BasicInfo {
    BasicInfo {
        name: info.name.trim().to_string(),
        description: info.description.trim().to_string(),
        street_address: info.street_address.trim().to_string(),
        city: info.city.trim().to_string(),
        region: info
            .region
            .map(|region| region.trim().to_string())
            .filter(|region| !region.is_empty()),
        postal_code: info.postal_code.trim().to_string(),
        country: info.country.trim().to_string(),
        latitude: info.latitude,
        longitude: info.longitude,
    }
}
