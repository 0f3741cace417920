use serde::{Deserialize, Serialize};

use super::draft::ListingDraft;
use crate::listings::catalog::{ListingMode, PropertyCategory};

/// One screen of the listing wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Category,
    Subtype,
    ListingMode,
    Quantity,
    BasicInfo,
    Rooms,
    Amenities,
    Photos,
    Pricing,
    Policies,
    Documents,
    Review,
    Submitted,
}

impl WizardStep {
    pub const fn label(self) -> &'static str {
        match self {
            WizardStep::Category => "Property category",
            WizardStep::Subtype => "Property type",
            WizardStep::ListingMode => "One or multiple units",
            WizardStep::Quantity => "Number of units",
            WizardStep::BasicInfo => "Basic information",
            WizardStep::Rooms => "Rooms and beds",
            WizardStep::Amenities => "Amenities",
            WizardStep::Photos => "Photos",
            WizardStep::Pricing => "Pricing",
            WizardStep::Policies => "Policies",
            WizardStep::Documents => "Documents",
            WizardStep::Review => "Review",
            WizardStep::Submitted => "Submitted",
        }
    }

    /// Steps that only capture listing content, as opposed to routing choices.
    /// These are the steps a host may jump back to from the review screen.
    pub const fn is_content(self) -> bool {
        matches!(
            self,
            WizardStep::BasicInfo
                | WizardStep::Rooms
                | WizardStep::Amenities
                | WizardStep::Photos
                | WizardStep::Pricing
                | WizardStep::Policies
                | WizardStep::Documents
        )
    }
}

/// Step that follows `step` for the choices recorded in `draft`.
///
/// Routing choices that have not been made yet fall through to the most common branch;
/// callers validate the current step before routing so this only matters for previews.
pub fn following(step: WizardStep, draft: &ListingDraft) -> Option<WizardStep> {
    let next = match step {
        WizardStep::Category => match draft.category {
            Some(category) if category.has_subtypes() => WizardStep::Subtype,
            _ => WizardStep::ListingMode,
        },
        WizardStep::Subtype => match draft.category {
            Some(PropertyCategory::HotelAndBnb) => WizardStep::Quantity,
            _ => WizardStep::ListingMode,
        },
        WizardStep::ListingMode => match draft.mode {
            Some(ListingMode::Multiple) => WizardStep::Quantity,
            _ => WizardStep::BasicInfo,
        },
        WizardStep::Quantity => WizardStep::BasicInfo,
        WizardStep::BasicInfo => WizardStep::Rooms,
        WizardStep::Rooms => WizardStep::Amenities,
        WizardStep::Amenities => WizardStep::Photos,
        WizardStep::Photos => WizardStep::Pricing,
        WizardStep::Pricing => WizardStep::Policies,
        WizardStep::Policies => WizardStep::Documents,
        WizardStep::Documents => WizardStep::Review,
        WizardStep::Review => WizardStep::Submitted,
        WizardStep::Submitted => return None,
    };
    Some(next)
}

/// Full path from the first screen to submission for the current choices.
pub fn planned_path(draft: &ListingDraft) -> Vec<WizardStep> {
    let mut path = vec![WizardStep::Category];
    let mut current = WizardStep::Category;
    while let Some(next) = following(current, draft) {
        path.push(next);
        current = next;
    }
    path
}

/// Position of the current step within the planned path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WizardProgress {
    pub step: WizardStep,
    pub position: usize,
    pub total: usize,
    pub percent: u8,
}

pub fn progress_for(step: WizardStep, draft: &ListingDraft) -> WizardProgress {
    let path = planned_path(draft);
    let total = path.len();
    let position = path
        .iter()
        .position(|candidate| *candidate == step)
        .map(|index| index + 1)
        .unwrap_or(1);
    let percent = if total <= 1 {
        100
    } else {
        (((position - 1) * 100) / (total - 1)) as u8
    };

    WizardProgress {
        step,
        position,
        total,
        percent,
    }
}
