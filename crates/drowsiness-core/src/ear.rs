//! EAR (Eye Aspect Ratio) 计算模块
//!
//! 使用左眼轮廓的 6 个关键点：
//! EAR = (|p1-p5| + |p2-p4|) / (2 * |p0-p3| + ε)
//! - p0, p3: 眼角点（水平方向）
//! - p1, p2: 上眼睑点
//! - p4, p5: 下眼睑点

use crate::landmarks::{
    LandmarkFrame, EPSILON, LEFT_EYE_INNER, LEFT_EYE_LOWER_1, LEFT_EYE_LOWER_2, LEFT_EYE_OUTER,
    LEFT_EYE_UPPER_1, LEFT_EYE_UPPER_2, MIN_SPAN_PX,
};
use crate::signal::Measurement;

const EYE_INDICES: [usize; 6] = [
    LEFT_EYE_OUTER,
    LEFT_EYE_UPPER_1,
    LEFT_EYE_UPPER_2,
    LEFT_EYE_INNER,
    LEFT_EYE_LOWER_2,
    LEFT_EYE_LOWER_1,
];

/// 计算单帧 EAR
pub fn eye_aspect_ratio(frame: &LandmarkFrame) -> Measurement {
    let Some([p0, p1, p2, p3, p4, p5]) = frame.pixels(EYE_INDICES) else {
        return Measurement::Unavailable;
    };

    let horizontal = p0.distance(&p3);
    if horizontal < MIN_SPAN_PX {
        return Measurement::Unavailable;
    }

    let vertical1 = p1.distance(&p5);
    let vertical2 = p2.distance(&p4);
    Measurement::ratio((vertical1 + vertical2) / (2.0 * horizontal + EPSILON))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point;

    fn eye_frame(open: f64) -> LandmarkFrame {
        let mut points = vec![Point::new(0.0, 0.0); 200];
        points[LEFT_EYE_OUTER] = Point::new(0.40, 0.40);
        points[LEFT_EYE_INNER] = Point::new(0.50, 0.40);
        points[LEFT_EYE_UPPER_1] = Point::new(0.43, 0.40 - open);
        points[LEFT_EYE_UPPER_2] = Point::new(0.47, 0.40 - open);
        points[LEFT_EYE_LOWER_1] = Point::new(0.43, 0.40 + open);
        points[LEFT_EYE_LOWER_2] = Point::new(0.47, 0.40 + open);
        LandmarkFrame::new(points, 100, 100)
    }

    #[test]
    fn open_eye_ratio() {
        // 宽 10px，上下各 1.5px -> 每组垂直距离 3px
        let ear = eye_aspect_ratio(&eye_frame(0.015)).value().unwrap();
        assert!((ear - 0.3).abs() < 1e-6, "ear={ear}");
    }

    #[test]
    fn closed_eye_is_a_real_zero() {
        let ear = eye_aspect_ratio(&eye_frame(0.0));
        assert_eq!(ear, Measurement::Value(0.0));
    }

    #[test]
    fn collapsed_corners_are_unavailable() {
        let frame = LandmarkFrame::new(vec![Point::new(0.3, 0.3); 200], 640, 480);
        assert_eq!(eye_aspect_ratio(&frame), Measurement::Unavailable);
    }
}
