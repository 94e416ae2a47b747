use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detection::BoundingBox;

/// Descriptive statistics over the detected boxes of one image.
///
/// Each box contributes its own area, so overlapping boxes are counted twice and
/// `coverage_percent` can exceed 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub flower_count: usize,
    pub areas: Vec<f64>,
    pub total_area: f64,
    pub average_area: f64,
    pub min_area: f64,
    pub max_area: f64,
    pub coverage_percent: f64,
}

impl AnalysisReport {
    /// Aggregates `boxes` against an image of `image_width` x `image_height` pixels.
    ///
    /// Returns `None` when there are no boxes.
    pub fn from_boxes<'a, I>(boxes: I, image_width: u32, image_height: u32) -> Option<Self>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        let areas: Vec<f64> = boxes.into_iter().map(BoundingBox::area).collect();
        let (&first, rest) = areas.split_first()?;

        let (min_area, max_area) = rest
            .iter()
            .fold((first, first), |(lo, hi), &a| (lo.min(a), hi.max(a)));
        let total_area: f64 = areas.iter().sum();
        let flower_count = areas.len();
        let image_area = f64::from(image_width) * f64::from(image_height);

        Some(Self {
            flower_count,
            total_area,
            average_area: total_area / flower_count as f64,
            min_area,
            max_area,
            coverage_percent: total_area / image_area * 100.0,
            areas,
        })
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} flowers, avg {:.1} px², min {:.1} px², max {:.1} px², total {:.1} px², coverage {:.1}%",
            self.flower_count,
            self.average_area,
            self.min_area,
            self.max_area,
            self.total_area,
            self.coverage_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox { x1, y1, x2, y2 }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_box_on_megapixel_image() {
        let report = AnalysisReport::from_boxes(&[bbox(0.0, 0.0, 100.0, 100.0)], 1000, 1000)
            .unwrap();
        assert_eq!(report.flower_count, 1);
        assert_eq!(report.areas, vec![10_000.0]);
        assert_eq!(report.min_area, 10_000.0);
        assert_eq!(report.max_area, 10_000.0);
        assert_eq!(report.average_area, 10_000.0);
        assert!(close(report.coverage_percent, 1.0));
    }

    #[test]
    fn two_boxes_on_small_image() {
        let boxes = [bbox(0.0, 0.0, 10.0, 10.0), bbox(0.0, 0.0, 20.0, 20.0)];
        let report = AnalysisReport::from_boxes(&boxes, 100, 100).unwrap();
        assert_eq!(report.areas, vec![100.0, 400.0]);
        assert_eq!(report.total_area, 500.0);
        assert_eq!(report.average_area, 250.0);
        assert_eq!(report.min_area, 100.0);
        assert_eq!(report.max_area, 400.0);
        assert!(close(report.coverage_percent, 5.0));
    }

    #[test]
    fn empty_input_has_no_report() {
        assert!(AnalysisReport::from_boxes(Vec::<BoundingBox>::new().iter(), 100, 100).is_none());
    }

    #[test]
    fn statistics_agree_with_areas() {
        let boxes = [
            bbox(3.0, 4.0, 13.0, 9.0),
            bbox(0.0, 0.0, 1.5, 2.0),
            bbox(10.0, 10.0, 40.0, 12.5),
            bbox(7.0, 7.0, 8.0, 8.0),
        ];
        let report = AnalysisReport::from_boxes(&boxes, 64, 48).unwrap();
        let sum: f64 = report.areas.iter().sum();
        assert_eq!(report.flower_count, report.areas.len());
        assert!(close(report.total_area, sum));
        assert!(close(report.average_area, sum / 4.0));
        assert_eq!(report.min_area, 1.0);
        assert_eq!(report.max_area, 75.0);
    }

    #[test]
    fn overlap_is_not_corrected() {
        let boxes = [bbox(0.0, 0.0, 10.0, 10.0), bbox(0.0, 0.0, 10.0, 10.0)];
        let report = AnalysisReport::from_boxes(&boxes, 10, 10).unwrap();
        assert!(close(report.coverage_percent, 200.0));
    }

    #[test]
    fn reversed_boxes_pass_through() {
        let boxes = [bbox(0.0, 0.0, 10.0, 10.0), bbox(10.0, 0.0, 0.0, 5.0)];
        let report = AnalysisReport::from_boxes(&boxes, 100, 100).unwrap();
        assert_eq!(report.areas, vec![100.0, -50.0]);
        assert_eq!(report.total_area, 50.0);
        assert_eq!(report.min_area, -50.0);
    }

    #[test]
    fn survives_json() {
        let boxes = [bbox(0.0, 0.0, 3.0, 7.0), bbox(1.0, 1.0, 2.5, 4.25)];
        let report = AnalysisReport::from_boxes(&boxes, 33, 17).unwrap();
        let text = serde_json::to_string_pretty(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.flower_count, report.flower_count);
        assert!(close(back.coverage_percent, report.coverage_percent));
        assert!(close(back.average_area, report.average_area));
        assert_eq!(back.areas.len(), report.areas.len());
    }
}
