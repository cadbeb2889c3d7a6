//! 头部俯仰代理指标
//!
//! tilt = (noseY - eyeCenterY) / (|chinY - eyeCenterY| + ε)
//!
//! 鼻尖相对眼线的垂直偏移，按脸部高度归一化。
//! 低头时鼻尖下移，比值增大。

use crate::landmarks::{
    LandmarkFrame, CHIN, EPSILON, LEFT_EYE_OUTER, MIN_SPAN_PX, NOSE_TIP, RIGHT_EYE_OUTER,
};
use crate::signal::Measurement;

/// 计算单帧鼻-眼垂直比值
pub fn nose_eye_ratio(frame: &LandmarkFrame) -> Measurement {
    let Some([nose, left_eye, right_eye, chin]) =
        frame.pixels([NOSE_TIP, LEFT_EYE_OUTER, RIGHT_EYE_OUTER, CHIN])
    else {
        return Measurement::Unavailable;
    };

    let eye_center_y = (left_eye.y + right_eye.y) / 2.0;
    let face_height = (chin.y - eye_center_y).abs();
    if face_height < MIN_SPAN_PX {
        return Measurement::Unavailable;
    }

    Measurement::ratio((nose.y - eye_center_y) / (face_height + EPSILON))
}
