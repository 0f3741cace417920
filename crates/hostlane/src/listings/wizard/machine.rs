use serde::Serialize;

use super::draft::{DocumentChecklist, ListingDraft, ListingSubmission};
use super::steps::{following, progress_for, WizardProgress, WizardStep};
use super::validation::{validate_all, validate_step, ValidationIssue, WizardRules};
use crate::listings::catalog::PropertyCategory;
use crate::listings::domain::{BedSummary, StayQuote};

/// Navigation failures raised by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("{} is incomplete ({} issue(s))", .step.label(), .issues.len())]
    Invalid {
        step: WizardStep,
        issues: Vec<ValidationIssue>,
    },
    #[error("already on the first step")]
    AtFirstStep,
    #[error("listing has already been submitted")]
    AlreadySubmitted,
    #[error("{} can only be edited from the review screen after it was completed", .0.label())]
    NotEditable(WizardStep),
    #[error("listing can only be submitted from the review screen")]
    NotOnReview,
    #[error("review is the last step; submit the listing to finish")]
    SubmitRequired,
}

/// Summary rendered on the review screen.
#[derive(Debug, Clone, Serialize)]
pub struct ListingReview {
    pub ready: bool,
    pub issues: Vec<ValidationIssue>,
    pub unit_count: u16,
    pub beds: Option<BedSummary>,
    pub checklist: DocumentChecklist,
    pub sample_week: Option<StayQuote>,
    pub photo_count: usize,
    pub amenity_count: usize,
}

/// Client-side state machine driving a host through the listing flow.
///
/// The wizard keeps a history stack so `back` returns to the step the host actually came
/// from, which differs per branch (category, subtype, single/multiple, quantity).
#[derive(Debug, Clone)]
pub struct ListingWizard {
    draft: ListingDraft,
    rules: WizardRules,
    current: WizardStep,
    history: Vec<WizardStep>,
    editing: bool,
}

impl ListingWizard {
    pub fn new(rules: WizardRules) -> Self {
        Self::resume(ListingDraft::default(), rules)
    }

    pub fn resume(draft: ListingDraft, rules: WizardRules) -> Self {
        Self {
            draft,
            rules,
            current: WizardStep::Category,
            history: Vec::new(),
            editing: false,
        }
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ListingDraft {
        &mut self.draft
    }

    pub fn rules(&self) -> &WizardRules {
        &self.rules
    }

    pub fn history(&self) -> &[WizardStep] {
        &self.history
    }

    /// Record the category choice; a different category invalidates the routing
    /// answers given for the previous one.
    pub fn select_category(&mut self, category: PropertyCategory) {
        if self.draft.category != Some(category) {
            self.draft.subtype = None;
            self.draft.mode = None;
            self.draft.quantity = None;
        }
        self.draft.category = Some(category);
    }

    pub fn current_issues(&self) -> Vec<ValidationIssue> {
        validate_step(self.current, &self.draft, &self.rules)
    }

    /// Validate the current step and advance along the branch the draft selects.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        if self.current == WizardStep::Submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.current == WizardStep::Review {
            return Err(WizardError::SubmitRequired);
        }

        let issues = self.current_issues();
        if !issues.is_empty() {
            return Err(WizardError::Invalid {
                step: self.current,
                issues,
            });
        }

        if self.editing {
            self.editing = false;
            if self.history.last() == Some(&WizardStep::Review) {
                self.history.pop();
            }
            self.current = WizardStep::Review;
            return Ok(self.current);
        }

        let next = following(self.current, &self.draft).ok_or(WizardError::AlreadySubmitted)?;
        self.history.push(self.current);
        self.current = next;
        Ok(next)
    }

    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        if self.current == WizardStep::Submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        let previous = self.history.pop().ok_or(WizardError::AtFirstStep)?;
        if previous == WizardStep::Review {
            self.editing = false;
        }
        self.current = previous;
        Ok(previous)
    }

    /// Jump from the review screen to a completed content step. The next successful
    /// `next` returns straight to review.
    pub fn edit(&mut self, step: WizardStep) -> Result<WizardStep, WizardError> {
        if self.current == WizardStep::Submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.current != WizardStep::Review
            || !step.is_content()
            || !self.history.contains(&step)
        {
            return Err(WizardError::NotEditable(step));
        }
        self.history.push(WizardStep::Review);
        self.current = step;
        self.editing = true;
        Ok(step)
    }

    pub fn progress(&self) -> WizardProgress {
        progress_for(self.current, &self.draft)
    }

    pub fn checklist(&self) -> DocumentChecklist {
        self.draft.checklist()
    }

    pub fn review(&self) -> ListingReview {
        let issues = validate_all(&self.draft, &self.rules);
        ListingReview {
            ready: issues.is_empty(),
            issues,
            unit_count: self.draft.unit_count(),
            beds: self.draft.rooms.as_ref().map(|rooms| rooms.bed_summary()),
            checklist: self.draft.checklist(),
            sample_week: self
                .draft
                .pricing
                .as_ref()
                .map(|pricing| pricing.quote(7)),
            photo_count: self.draft.photos.len(),
            amenity_count: self.draft.amenities.len(),
        }
    }

    /// Finish the flow from the review screen, producing the submission payload.
    pub fn submit(&mut self) -> Result<ListingSubmission, WizardError> {
        match self.current {
            WizardStep::Submitted => return Err(WizardError::AlreadySubmitted),
            WizardStep::Review => {}
            _ => return Err(WizardError::NotOnReview),
        }

        let submission =
            ListingSubmission::from_draft(&self.draft, &self.rules).map_err(|issues| {
                WizardError::Invalid {
                    step: WizardStep::Review,
                    issues,
                }
            })?;
        self.history.push(WizardStep::Review);
        self.current = WizardStep::Submitted;
        Ok(submission)
    }
}

/// Outcome of validating one step of a draft without holding wizard state.
#[derive(Debug, Clone, Serialize)]
pub struct StepEvaluation {
    pub step: WizardStep,
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub next_step: Option<WizardStep>,
    pub progress: WizardProgress,
}

/// Stateless counterpart of `ListingWizard::next` for clients that keep the draft.
pub fn evaluate_step(
    draft: &ListingDraft,
    step: WizardStep,
    rules: &WizardRules,
) -> StepEvaluation {
    let issues = validate_step(step, draft, rules);
    let valid = issues.is_empty();
    StepEvaluation {
        step,
        valid,
        next_step: if valid { following(step, draft) } else { None },
        issues,
        progress: progress_for(step, draft),
    }
}
