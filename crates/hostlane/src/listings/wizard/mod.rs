//! Multi-step listing wizard: step routing, per-step validation, the document
//! checklist and the navigation state machine.

mod draft;
mod machine;
mod steps;
mod validation;


pub use draft::{ChecklistItem, DocumentChecklist, ListingDraft, ListingSubmission};
pub use machine::{evaluate_step, ListingReview, ListingWizard, StepEvaluation, WizardError};
pub use steps::{following, planned_path, progress_for, WizardProgress, WizardStep};
pub use validation::{validate_all, validate_step, ValidationIssue, WizardRules};
