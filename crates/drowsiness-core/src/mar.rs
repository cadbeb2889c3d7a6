//! MAR (Mouth Aspect Ratio) 计算模块
//!
//! 取两组垂直距离的平均值与嘴宽之比：
//! MAR = (|top1-bot1| + |top2-bot2|) / (2 * (|left-right| + ε))
//!
//! 第二组关键点缺失时退化为单组：
//! MAR = |top1-bot1| / (|left-right| + ε)

use crate::landmarks::{
    LandmarkFrame, EPSILON, MIN_SPAN_PX, MOUTH_INNER_BOTTOM, MOUTH_INNER_TOP, MOUTH_LEFT,
    MOUTH_RIGHT, MOUTH_SECONDARY_BOTTOM, MOUTH_SECONDARY_TOP,
};
use crate::signal::Measurement;

/// 计算单帧 MAR
pub fn mouth_aspect_ratio(frame: &LandmarkFrame) -> Measurement {
    let Some([top1, bot1, left, right]) =
        frame.pixels([MOUTH_INNER_TOP, MOUTH_INNER_BOTTOM, MOUTH_LEFT, MOUTH_RIGHT])
    else {
        return Measurement::Unavailable;
    };

    let width = left.distance(&right);
    if width < MIN_SPAN_PX {
        return Measurement::Unavailable;
    }
    let vertical1 = top1.distance(&bot1);

    let mar = match frame.pixels([MOUTH_SECONDARY_TOP, MOUTH_SECONDARY_BOTTOM]) {
        Some([top2, bot2]) => (vertical1 + top2.distance(&bot2)) / (2.0 * (width + EPSILON)),
        None => vertical1 / (width + EPSILON),
    };
    Measurement::ratio(mar)
}
