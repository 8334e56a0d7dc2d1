use crate::core::scoring::round_half_up;
use crate::models::{Category, CategoryGroup, Rating};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// How far a member has got rating a house
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingProgress {
    pub rated: usize,
    pub total: usize,
    pub percentage: u32,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProgress {
    pub group: CategoryGroup,
    pub label: &'static str,
    #[serde(flatten)]
    pub progress: RatingProgress,
}

/// Progress over the active categories in `categories`
pub fn rating_progress<'a, I>(categories: I, ratings: &HashMap<Uuid, Rating>) -> RatingProgress
where
    I: IntoIterator<Item = &'a Category>,
{
    let mut total = 0usize;
    let mut rated = 0usize;
    let mut rating_sum = 0u32;

    for category in categories.into_iter().filter(|c| c.is_active) {
        total += 1;
        if let Some(rating) = ratings.get(&category.id) {
            rated += 1;
            rating_sum += u32::from(rating.value());
        }
    }

    let percentage = if total == 0 {
        0
    } else {
        round_half_up(rated as u64 * 100, total as u64) as u32
    };

    RatingProgress {
        rated,
        total,
        percentage,
        average_rating: (rated > 0).then(|| f64::from(rating_sum) / rated as f64),
    }
}

/// Per-group progress in canonical group order, skipping groups with no active categories
pub fn group_progress(categories: &[Category], ratings: &HashMap<Uuid, Rating>) -> Vec<GroupProgress> {
    CategoryGroup::ALL
        .iter()
        .filter_map(|group| {
            let progress = rating_progress(
                categories.iter().filter(|c| c.group == *group),
                ratings,
            );
            (progress.total > 0).then(|| GroupProgress {
                group: *group,
                label: group.label(),
                progress,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(group: CategoryGroup, is_active: bool) -> Category {
        Category {
            id: Uuid::new_v4(),
            household_id: Uuid::nil(),
            name: "c".to_string(),
            description: None,
            group,
            is_default: false,
            display_order: None,
            is_active,
        }
    }

    #[test]
    fn test_progress_counts_active_only() {
        let categories = vec![
            category(CategoryGroup::Yard, true),
            category(CategoryGroup::Yard, true),
            category(CategoryGroup::Size, true),
            category(CategoryGroup::Size, false),
        ];
        let ratings = HashMap::from([
            (categories[0].id, Rating::new(4).unwrap()),
            (categories[3].id, Rating::new(1).unwrap()),
        ]);

        let progress = rating_progress(&categories, &ratings);
        assert_eq!(progress.rated, 1);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.percentage, 33);
        assert_eq!(progress.average_rating, Some(4.0));
    }

    #[test]
    fn test_progress_empty() {
        let progress = rating_progress(&Vec::<Category>::new(), &HashMap::new());
        assert_eq!(progress.percentage, 0);
        assert_eq!(progress.average_rating, None);
    }

    #[test]
    fn test_group_progress_order() {
        let categories = vec![
            category(CategoryGroup::Yard, true),
            category(CategoryGroup::Features, true),
        ];
        let ratings = HashMap::from([(categories[1].id, Rating::new(2).unwrap())]);

        let groups = group_progress(&categories, &ratings);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group, CategoryGroup::Features);
        assert_eq!(groups[0].progress.percentage, 100);
        assert_eq!(groups[1].group, CategoryGroup::Yard);
        assert_eq!(groups[1].progress.rated, 0);
    }
}
