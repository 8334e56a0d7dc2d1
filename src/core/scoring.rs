use crate::models::{Category, CategoryGroup, Rating, Weight, MAX_LEVEL};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

/// Breakdown entry for one active category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category_id: Uuid,
    pub category_name: String,
    pub category_group: CategoryGroup,
    pub weight: Option<Weight>,
    pub rating: Option<Rating>,
    /// `rating / 5 * 100`, absent when the category is unrated
    pub percent: Option<f64>,
}

/// One member's score for one house
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseScore {
    pub house_id: Uuid,
    /// Integer percent, absent when nothing is both weighted and rated
    pub overall_score: Option<u32>,
    pub label: &'static str,
    pub category_scores: Vec<CategoryScore>,
    /// Categories with weight > 0 and a rating
    pub contributing_count: usize,
    pub rated_count: usize,
    pub total_count: usize,
}

impl HouseScore {
    pub fn is_scorable(&self) -> bool {
        self.overall_score.is_some()
    }
}

/// Percentage of the maximum rating, exact for every integer rating
#[inline]
pub fn category_percent(rating: Rating) -> f64 {
    f64::from(rating.value()) * 100.0 / f64::from(MAX_LEVEL)
}

/// Integer division rounding halves upwards
#[inline]
pub(crate) fn round_half_up(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Weighted average of `(weight, rating)` pairs as an integer percent
///
/// Formula: round(Σ(weight × rating) / Σ(weight × 5) × 100), accumulating only pairs
/// where the weight is above zero and the rating is present.
pub fn overall_score<I>(pairs: I) -> Option<u32>
where
    I: IntoIterator<Item = (Option<Weight>, Option<Rating>)>,
{
    let mut weighted_sum: u64 = 0;
    let mut weighted_max: u64 = 0;

    for (weight, rating) in pairs {
        let (Some(weight), Some(rating)) = (weight, rating) else {
            continue;
        };
        if weight.value() == 0 {
            continue;
        }
        let weight = u64::from(weight.value());
        weighted_sum += weight * u64::from(rating.value());
        weighted_max += weight * u64::from(MAX_LEVEL);
    }

    if weighted_max == 0 {
        return None;
    }

    Some(round_half_up(weighted_sum * 100, weighted_max) as u32)
}

/// Display label for an overall score
pub fn score_label(score: Option<u32>) -> &'static str {
    match score {
        None => "Not rated",
        Some(s) if s >= 90 => "Excellent Match",
        Some(s) if s >= 75 => "Great Match",
        Some(s) if s >= 60 => "Good Match",
        Some(s) if s >= 45 => "Fair Match",
        Some(_) => "Needs Work",
    }
}

/// Order scores best first, unscorable last
pub fn compare_scores(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Mean of the members' scores that exist, rounded half up
pub fn household_average<I>(scores: I) -> Option<u32>
where
    I: IntoIterator<Item = Option<u32>>,
{
    let (sum, count) = scores
        .into_iter()
        .flatten()
        .fold((0u64, 0u64), |(sum, count), s| (sum + u64::from(s), count + 1));

    (count > 0).then(|| round_half_up(sum, count) as u32)
}

/// Scores houses for one household member
///
/// Holds the household's active categories and the member's weights, both of which
/// are shared by every house the member looks at.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    categories: &'a [Category],
    weights: &'a HashMap<Uuid, Weight>,
}

impl<'a> Scorer<'a> {
    pub fn new(categories: &'a [Category], weights: &'a HashMap<Uuid, Weight>) -> Self {
        Self { categories, weights }
    }

    /// Score one house from the member's ratings for it.
    ///
    /// Inactive categories and ratings for categories that no longer exist are ignored.
    pub fn score_house(&self, house_id: Uuid, ratings: &HashMap<Uuid, Rating>) -> HouseScore {
        let category_scores: Vec<CategoryScore> = self
            .categories
            .iter()
            .filter(|category| category.is_active)
            .map(|category| {
                let rating = ratings.get(&category.id).copied();
                CategoryScore {
                    category_id: category.id,
                    category_name: category.name.clone(),
                    category_group: category.group,
                    weight: self.weights.get(&category.id).copied(),
                    rating,
                    percent: rating.map(category_percent),
                }
            })
            .collect();

        let overall = overall_score(category_scores.iter().map(|c| (c.weight, c.rating)));

        let contributing_count = category_scores
            .iter()
            .filter(|c| c.rating.is_some() && c.weight.is_some_and(|w| w.value() > 0))
            .count();
        let rated_count = category_scores.iter().filter(|c| c.rating.is_some()).count();
        let total_count = category_scores.len();

        HouseScore {
            house_id,
            overall_score: overall,
            label: score_label(overall),
            category_scores,
            contributing_count,
            rated_count,
            total_count,
        }
    }

    /// Score many houses; houses without ratings still get an (unscorable) entry
    pub fn score_houses(
        &self,
        house_ids: &[Uuid],
        ratings_by_house: &HashMap<Uuid, HashMap<Uuid, Rating>>,
    ) -> HashMap<Uuid, HouseScore> {
        let empty = HashMap::new();
        house_ids
            .iter()
            .map(|house_id| {
                let ratings = ratings_by_house.get(house_id).unwrap_or(&empty);
                (*house_id, self.score_house(*house_id, ratings))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: u8) -> Option<Weight> {
        Weight::new(v)
    }

    fn r(v: u8) -> Option<Rating> {
        Rating::new(v)
    }

    fn category(name: &str, is_active: bool) -> Category {
        Category {
            id: Uuid::new_v4(),
            household_id: Uuid::nil(),
            name: name.to_string(),
            description: None,
            group: CategoryGroup::Features,
            is_default: true,
            display_order: None,
            is_active,
        }
    }

    #[test]
    fn test_category_percent_exact() {
        let expected = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];
        for (value, want) in expected.iter().enumerate() {
            let rating = Rating::new(value as u8).unwrap();
            assert_eq!(category_percent(rating), *want);
        }
    }

    #[test]
    fn test_overall_excludes_zero_weight() {
        let score = overall_score([(w(5), r(5)), (w(0), r(0))]);
        assert_eq!(score, Some(100));
    }

    #[test]
    fn test_overall_zero_is_valid_score() {
        assert_eq!(overall_score([(w(5), r(0))]), Some(0));
    }

    #[test]
    fn test_overall_unscorable() {
        assert_eq!(overall_score(Vec::new()), None);
        assert_eq!(overall_score([(w(0), r(4)), (None, r(5)), (w(3), None)]), None);
    }

    #[test]
    fn test_overall_rounds_half_up() {
        // (1*1 + 1*2) / (1*5 + 1*5) = 3/10 = 30%
        assert_eq!(overall_score([(w(1), r(1)), (w(1), r(2))]), Some(30));
        assert_eq!(overall_score([(w(4), r(2)), (w(4), r(3))]), Some(50));
        // 25 / 40 = 62.5% -> 63
        assert_eq!(overall_score([(w(3), r(0)), (w(5), r(5))]), Some(63));
        assert_eq!(round_half_up(625, 10), 63);
        assert_eq!(round_half_up(624, 10), 62);
    }

    #[test]
    fn test_score_labels() {
        assert_eq!(score_label(None), "Not rated");
        assert_eq!(score_label(Some(90)), "Excellent Match");
        assert_eq!(score_label(Some(75)), "Great Match");
        assert_eq!(score_label(Some(60)), "Good Match");
        assert_eq!(score_label(Some(45)), "Fair Match");
        assert_eq!(score_label(Some(0)), "Needs Work");
    }

    #[test]
    fn test_scorer_breakdown_and_counts() {
        let categories = vec![
            category("Garage", true),
            category("Pool", true),
            category("Basement", true),
            category("Old", false),
        ];
        let weights = HashMap::from([(categories[0].id, Weight::new(4).unwrap()), (categories[1].id, Weight::new(0).unwrap())]);
        let ratings = HashMap::from([
            (categories[0].id, Rating::new(3).unwrap()),
            (categories[1].id, Rating::new(5).unwrap()),
            (categories[3].id, Rating::new(1).unwrap()),
            (Uuid::new_v4(), Rating::new(0).unwrap()),
        ]);

        let scorer = Scorer::new(&categories, &weights);
        let score = scorer.score_house(Uuid::new_v4(), &ratings);

        assert_eq!(score.overall_score, Some(60));
        assert_eq!(score.label, "Good Match");
        assert_eq!(score.total_count, 3);
        assert_eq!(score.rated_count, 2);
        assert_eq!(score.contributing_count, 1);
        // Rated but unweighted categories still show a percentage
        assert_eq!(score.category_scores[1].percent, Some(100.0));
        assert_eq!(score.category_scores[2].percent, None);
    }

    #[test]
    fn test_compare_scores_puts_unscored_last() {
        let mut scores = vec![None, Some(40), Some(90), None, Some(55)];
        scores.sort_by(|a, b| compare_scores(*a, *b));
        assert_eq!(scores, vec![Some(90), Some(55), Some(40), None, None]);
    }

    #[test]
    fn test_household_average() {
        assert_eq!(household_average([Some(80), None, Some(75)]), Some(78));
        assert_eq!(household_average([None, None]), None);
    }
}
