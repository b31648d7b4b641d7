use log::trace;

use crate::core::model::{MarkerRegion, QuestionPosition};
use crate::core::policy::MatchPolicy;

/// Hands each extracted region to at most one question.
#[derive(Debug)]
pub struct RegionQuestionMatcher<'a> {
    regions: &'a [MarkerRegion],
    claimed: Vec<bool>,
    policy: MatchPolicy,
}

impl<'a> RegionQuestionMatcher<'a> {
    pub fn new(regions: &'a [MarkerRegion], policy: MatchPolicy) -> Self {
        Self {
            regions,
            claimed: vec![false; regions.len()],
            policy,
        }
    }

    /// Claims the first unclaimed region on the question's page and column
    /// whose vertical center falls inside the question's window.
    pub fn claim(&mut self, position: Option<&QuestionPosition>) -> Option<&'a MarkerRegion> {
        let position = position?;
        let (low, high) = self.policy.window(position.top);
        let regions = self.regions;
        let idx = regions.iter().enumerate().position(|(idx, region)| {
            !self.claimed[idx]
                && region.page == position.page
                && region.column == position.column
                && region.y_center >= low
                && region.y_center <= high
        })?;
        self.claimed[idx] = true;
        trace!(
            "region {idx} (page {}, y={:.1}) claimed within [{low:.1}, {high:.1}]",
            regions[idx].page,
            regions[idx].y_center
        );
        Some(&regions[idx])
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.iter().filter(|c| **c).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Rect;
    use crate::core::model::Column;

    fn region(page: usize, y_center: f64, column: Column, image: &str) -> MarkerRegion {
        MarkerRegion {
            page,
            rect: Rect::new(50.0, y_center - 10.0, 150.0, y_center + 10.0),
            image: image.to_string(),
            y_center,
            column,
        }
    }

    fn at(page: usize, top: f64, column: Column) -> QuestionPosition {
        QuestionPosition { page, top, column }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let regions = vec![
            region(1, 400.0, Column::Left, "far"),
            region(1, 250.0, Column::Left, "edge"),
            region(1, 140.0, Column::Left, "near"),
        ];
        let mut matcher = RegionQuestionMatcher::new(&regions, MatchPolicy::default());

        let first = matcher.claim(Some(&at(1, 100.0, Column::Left)));
        assert_eq!(first.map(|r| r.image.as_str()), Some("edge"));
        let second = matcher.claim(Some(&at(1, 100.0, Column::Left)));
        assert_eq!(second.map(|r| r.image.as_str()), Some("near"));
        assert!(matcher.claim(Some(&at(1, 100.0, Column::Left))).is_none());
        assert_eq!(matcher.claimed_count(), 2);
    }

    #[test]
    fn requires_same_page_and_column() {
        let regions = vec![
            region(2, 140.0, Column::Left, "other page"),
            region(1, 140.0, Column::Right, "other column"),
        ];
        let mut matcher = RegionQuestionMatcher::new(&regions, MatchPolicy::default());
        assert!(matcher.claim(Some(&at(1, 100.0, Column::Left))).is_none());
    }

    #[test]
    fn no_position_means_no_image() {
        let regions = vec![region(1, 140.0, Column::Left, "img")];
        let mut matcher = RegionQuestionMatcher::new(&regions, MatchPolicy::default());
        assert!(matcher.claim(None).is_none());
        assert_eq!(matcher.claimed_count(), 0);
    }

    #[test]
    fn lower_bound_below_window_is_rejected() {
        let regions = vec![region(1, 49.0, Column::Left, "above")];
        let mut matcher = RegionQuestionMatcher::new(&regions, MatchPolicy::default());
        assert!(matcher.claim(Some(&at(1, 100.0, Column::Left))).is_none());
    }
}
