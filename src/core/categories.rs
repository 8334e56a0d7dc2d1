use crate::models::{CategoryGroup, Rating, Weight};

/// A category seeded into every new household
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub group: CategoryGroup,
}

const fn seed(name: &'static str, group: CategoryGroup) -> DefaultCategory {
    DefaultCategory { name, group }
}

use CategoryGroup::{Features, Neighborhood, Size, Transportation, Yard};

/// Default categories, in display order
pub const DEFAULT_CATEGORIES: [DefaultCategory; 34] = [
    seed("Updated kitchen", Features),
    seed("Updated bathrooms", Features),
    seed("Open floor plan", Features),
    seed("Natural light", Features),
    seed("Central air conditioning", Features),
    seed("Fireplace", Features),
    seed("Hardwood floors", Features),
    seed("In-unit laundry", Features),
    seed("Attached garage", Features),
    seed("Finished basement", Features),
    seed("Home office space", Features),
    seed("Storage space", Size),
    seed("Number of bedrooms", Size),
    seed("Number of bathrooms", Size),
    seed("Total square footage", Size),
    seed("Primary suite", Size),
    seed("Guest room", Size),
    seed("Kitchen size", Size),
    seed("School district", Neighborhood),
    seed("Safety", Neighborhood),
    seed("Noise level", Neighborhood),
    seed("Walkability", Neighborhood),
    seed("Nearby parks", Neighborhood),
    seed("Nearby shopping", Neighborhood),
    seed("Nearby restaurants", Neighborhood),
    seed("Commute to work", Transportation),
    seed("Public transit access", Transportation),
    seed("Highway access", Transportation),
    seed("Parking", Transportation),
    seed("Bike friendliness", Transportation),
    seed("Yard size", Yard),
    seed("Privacy", Yard),
    seed("Patio or deck", Yard),
    seed("Garden space", Yard),
];

const WEIGHT_LABELS: [&str; 6] = [
    "Not important",
    "Slightly important",
    "Somewhat important",
    "Important",
    "Very important",
    "Absolutely necessary!",
];

const RATING_LABELS: [&str; 6] = [
    "Poor",
    "Below Average",
    "Average",
    "Good",
    "Very Good",
    "Excellent",
];

pub fn weight_label(weight: Option<Weight>) -> &'static str {
    weight.map_or("Not set", |w| WEIGHT_LABELS[usize::from(w.value())])
}

pub fn rating_label(rating: Option<Rating>) -> &'static str {
    rating.map_or("Not rated yet", |r| RATING_LABELS[usize::from(r.value())])
}
