// Core domain logic, free of I/O
pub mod categories;
pub mod household;
pub mod onboarding;
pub mod progress;
pub mod scoring;
pub mod validation;

pub use categories::{DEFAULT_CATEGORIES, DefaultCategory, rating_label, weight_label};
pub use household::{MembershipError, RoleChange, MAX_MEMBERS, MAX_OWNERS, MIN_MEMBERS};
pub use onboarding::{Checklist, OnboardingAction, OnboardingState, OnboardingStep};
pub use progress::{group_progress, rating_progress, GroupProgress, RatingProgress};
pub use scoring::{category_percent, overall_score, score_label, HouseScore, CategoryScore, Scorer};
