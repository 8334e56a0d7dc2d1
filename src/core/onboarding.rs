use serde::{Deserialize, Serialize};

pub const ONBOARDING_STATE_VERSION: u32 = 1;

/// Milestones tracked by the getting-started checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnboardingStep {
    HouseholdMembers,
    CategoriesReview,
    PrioritiesIntro,
    AddFirstHouse,
    RateHouse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TourName {
    Welcome,
    Dashboard,
    Categories,
    Priorities,
    Houses,
    Rating,
}

/// Per-member onboarding progress, persisted as JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingState {
    pub has_completed_onboarding: bool,
    pub is_first_login: bool,
    pub completed_steps: Vec<OnboardingStep>,
    pub completed_tours: Vec<TourName>,
    pub skipped_tours: Vec<TourName>,
    pub version: u32,
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self {
            has_completed_onboarding: false,
            is_first_login: true,
            completed_steps: Vec::new(),
            completed_tours: Vec::new(),
            skipped_tours: Vec::new(),
            version: ONBOARDING_STATE_VERSION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OnboardingAction {
    CompleteStep { step: OnboardingStep },
    CompleteTour { tour: TourName },
    SkipTour { tour: TourName },
    DismissWelcome,
    CompleteOnboarding,
    ResetOnboarding,
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if items.contains(&item) {
        false
    } else {
        items.push(item);
        true
    }
}

impl OnboardingState {
    /// Apply an action, returning whether anything changed
    pub fn apply(&mut self, action: OnboardingAction) -> bool {
        match action {
            OnboardingAction::CompleteStep { step } => push_unique(&mut self.completed_steps, step),
            OnboardingAction::CompleteTour { tour } => push_unique(&mut self.completed_tours, tour),
            OnboardingAction::SkipTour { tour } => push_unique(&mut self.skipped_tours, tour),
            OnboardingAction::DismissWelcome => {
                std::mem::replace(&mut self.is_first_login, false)
            }
            OnboardingAction::CompleteOnboarding => {
                let changed = !self.has_completed_onboarding || self.is_first_login;
                self.has_completed_onboarding = true;
                self.is_first_login = false;
                changed
            }
            OnboardingAction::ResetOnboarding => {
                let fresh = OnboardingState::default();
                let changed = *self != fresh;
                *self = fresh;
                changed
            }
        }
    }

    pub fn is_step_completed(&self, step: OnboardingStep) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Bring states written by older versions up to date
    pub fn migrate(mut self) -> Self {
        if self.version < ONBOARDING_STATE_VERSION {
            self.version = ONBOARDING_STATE_VERSION;
        }
        self
    }

    pub fn checklist(&self) -> Checklist {
        let items: Vec<ChecklistItem> = CHECKLIST
            .iter()
            .map(|&(id, label, href, step)| ChecklistItem {
                id,
                label,
                href,
                step,
                is_completed: self.is_step_completed(step),
            })
            .collect();

        let completed_count = items.iter().filter(|i| i.is_completed).count();
        Checklist {
            all_complete: completed_count == items.len(),
            visible: !self.has_completed_onboarding,
            completed_count,
            items,
        }
    }
}

const CHECKLIST: [(&str, &str, &str, OnboardingStep); 5] = [
    ("household", "Set up your household", "/dashboard/members", OnboardingStep::HouseholdMembers),
    ("categories", "Customize categories", "/dashboard/categories", OnboardingStep::CategoriesReview),
    ("priorities", "Set your priorities", "/dashboard/weights", OnboardingStep::PrioritiesIntro),
    ("house", "Add first house", "/dashboard/houses", OnboardingStep::AddFirstHouse),
    ("rate", "Rate a house", "/dashboard/houses", OnboardingStep::RateHouse),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: &'static str,
    pub label: &'static str,
    pub href: &'static str,
    pub step: OnboardingStep,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub items: Vec<ChecklistItem>,
    pub completed_count: usize,
    pub all_complete: bool,
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_step_is_idempotent() {
        let mut state = OnboardingState::default();
        let action = OnboardingAction::CompleteStep {
            step: OnboardingStep::AddFirstHouse,
        };
        assert!(state.apply(action));
        assert!(!state.apply(action));
        assert_eq!(state.completed_steps, vec![OnboardingStep::AddFirstHouse]);
    }

    #[test]
    fn test_complete_and_reset() {
        let mut state = OnboardingState::default();
        state.apply(OnboardingAction::SkipTour { tour: TourName::Houses });
        state.apply(OnboardingAction::CompleteOnboarding);
        assert!(state.has_completed_onboarding);
        assert!(!state.is_first_login);
        assert!(!state.checklist().visible);

        assert!(state.apply(OnboardingAction::ResetOnboarding));
        assert_eq!(state, OnboardingState::default());
        assert!(!state.apply(OnboardingAction::ResetOnboarding));
    }

    #[test]
    fn test_dismiss_welcome() {
        let mut state = OnboardingState::default();
        assert!(state.apply(OnboardingAction::DismissWelcome));
        assert!(!state.apply(OnboardingAction::DismissWelcome));
    }

    #[test]
    fn test_checklist_counts() {
        let mut state = OnboardingState::default();
        state.apply(OnboardingAction::CompleteStep {
            step: OnboardingStep::HouseholdMembers,
        });
        state.apply(OnboardingAction::CompleteStep {
            step: OnboardingStep::RateHouse,
        });

        let checklist = state.checklist();
        assert_eq!(checklist.items.len(), 5);
        assert_eq!(checklist.completed_count, 2);
        assert!(!checklist.all_complete);
        assert!(checklist.items[0].is_completed);
        assert!(checklist.items[4].is_completed);
    }

    #[test]
    fn test_action_wire_format() {
        let action: OnboardingAction =
            serde_json::from_str(r#"{"type":"complete_step","step":"priorities-intro"}"#).unwrap();
        assert_eq!(
            action,
            OnboardingAction::CompleteStep {
                step: OnboardingStep::PrioritiesIntro
            }
        );
    }
}
