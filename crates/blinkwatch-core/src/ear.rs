//! Eye aspect ratio (EAR) from six-point eye contours.
//!
//! Contour ordering follows the 68-point scheme: outer corner, two upper-lid
//! points, inner corner, two lower-lid points.

use crate::types::{LandmarkSet, Point};

/// First landmark index of the left eye contour.
pub const LEFT_EYE_START: usize = 36;
/// First landmark index of the right eye contour.
pub const RIGHT_EYE_START: usize = 42;
/// Points per eye contour.
pub const EYE_CONTOUR_LEN: usize = 6;

/// EAR reported for contours that cannot be measured (treated as open).
pub const EAR_OPEN_FALLBACK: f64 = 1.0;

/// Compute the EAR of one eye contour.
///
/// `EAR = (|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`
///
/// Returns [`EAR_OPEN_FALLBACK`] when fewer than six points are given or the
/// horizontal span is zero.
pub fn eye_aspect_ratio(eye: &[Point]) -> f64 {
    if eye.len() < EYE_CONTOUR_LEN {
        return EAR_OPEN_FALLBACK;
    }

    let vertical1 = eye[1].distance(&eye[5]);
    let vertical2 = eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);

    if horizontal <= 0.0 || !horizontal.is_finite() {
        return EAR_OPEN_FALLBACK;
    }

    (vertical1 + vertical2) / (2.0 * horizontal)
}

/// Per-eye and averaged EAR for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeMeasurement {
    pub left: f64,
    pub right: f64,
    pub average: f64,
}

impl EyeMeasurement {
    /// Measure both eyes of a landmark set.
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Self {
        let left = eye_aspect_ratio(landmarks.clamped_slice(LEFT_EYE_START, EYE_CONTOUR_LEN));
        let right = eye_aspect_ratio(landmarks.clamped_slice(RIGHT_EYE_START, EYE_CONTOUR_LEN));
        Self {
            left,
            right,
            average: (left + right) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Six points on a circle, in contour order.
    fn circular_contour(cx: f64, cy: f64, r: f64) -> Vec<Point> {
        [180.0f64, 120.0, 60.0, 0.0, 300.0, 240.0]
            .iter()
            .map(|deg| {
                let rad = deg.to_radians();
                Point::new(cx + r * rad.cos(), cy + r * rad.sin())
            })
            .collect()
    }

    /// An eye of the given width whose lids are `gap` apart.
    fn eye_contour(width: f64, gap: f64) -> Vec<Point> {
        let half = gap / 2.0;
        vec![
            Point::new(0.0, 0.0),
            Point::new(width / 3.0, -half),
            Point::new(2.0 * width / 3.0, -half),
            Point::new(width, 0.0),
            Point::new(2.0 * width / 3.0, half),
            Point::new(width / 3.0, half),
        ]
    }

    #[test]
    fn test_circular_contour_ratio() {
        // vertical spans are r*sqrt(3), horizontal is 2r
        let ear = eye_aspect_ratio(&circular_contour(0.0, 0.0, 10.0));
        let expected = 3.0f64.sqrt() / 2.0;
        assert!((ear - expected).abs() < 1e-9, "got {ear}, expected {expected}");
    }

    #[test]
    fn test_closed_form_formula() {
        let eye = eye_contour(30.0, 6.0);
        let expected = (6.0 + 6.0) / (2.0 * 30.0);
        assert!((eye_aspect_ratio(&eye) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_short_contour_is_open() {
        let eye = circular_contour(0.0, 0.0, 5.0);
        for n in 0..EYE_CONTOUR_LEN {
            assert_eq!(eye_aspect_ratio(&eye[..n]), EAR_OPEN_FALLBACK, "len {n}");
        }
    }

    #[test]
    fn test_zero_horizontal_is_open() {
        let eye = vec![Point::new(1.0, 1.0); 6];
        assert_eq!(eye_aspect_ratio(&eye), EAR_OPEN_FALLBACK);
    }

    #[test]
    fn test_extra_points_ignored() {
        let mut eye = eye_contour(30.0, 6.0);
        let base = eye_aspect_ratio(&eye);
        eye.push(Point::new(1000.0, 1000.0));
        assert_eq!(eye_aspect_ratio(&eye), base);
    }

    #[test]
    fn test_measurement_slices_both_eyes() {
        let mut points = vec![Point::new(0.0, 0.0); 68];
        for (i, p) in eye_contour(30.0, 3.0).into_iter().enumerate() {
            points[LEFT_EYE_START + i] = p;
        }
        for (i, p) in eye_contour(30.0, 9.0).into_iter().enumerate() {
            points[RIGHT_EYE_START + i] = Point::new(p.x + 100.0, p.y);
        }
        let m = EyeMeasurement::from_landmarks(&LandmarkSet::new(points));
        assert!((m.left - 0.1).abs() < 1e-9, "left = {}", m.left);
        assert!((m.right - 0.3).abs() < 1e-9, "right = {}", m.right);
        assert!((m.average - 0.2).abs() < 1e-9, "average = {}", m.average);
    }

    #[test]
    fn test_measurement_short_set_reads_open() {
        let set = LandmarkSet::new(vec![Point::new(0.0, 0.0); 40]);
        let m = EyeMeasurement::from_landmarks(&set);
        assert_eq!(m.left, EAR_OPEN_FALLBACK);
        assert_eq!(m.right, EAR_OPEN_FALLBACK);
        assert_eq!(m.average, EAR_OPEN_FALLBACK);
    }

    proptest! {
        #[test]
        fn ear_invariant_under_scale_and_translation(
            width in 1.0f64..500.0,
            gap in 0.0f64..100.0,
            scale in 0.01f64..100.0,
            dx in -1000.0f64..1000.0,
            dy in -1000.0f64..1000.0,
        ) {
            let eye = eye_contour(width, gap);
            let moved: Vec<Point> = eye
                .iter()
                .map(|p| Point::new(p.x * scale + dx, p.y * scale + dy))
                .collect();
            let a = eye_aspect_ratio(&eye);
            let b = eye_aspect_ratio(&moved);
            prop_assert!((a - b).abs() < 1e-6 * a.max(1.0), "a = {a}, b = {b}");
        }

        #[test]
        fn ear_never_negative_or_nan(
            coords in proptest::collection::vec((-1e4f64..1e4, -1e4f64..1e4), 0..10)
        ) {
            let eye: Vec<Point> = coords.into_iter().map(|(x, y)| Point::new(x, y)).collect();
            let ear = eye_aspect_ratio(&eye);
            prop_assert!(ear.is_finite());
            prop_assert!(ear >= 0.0);
        }
    }
}
