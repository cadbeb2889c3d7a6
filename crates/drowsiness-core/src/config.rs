use serde::{Deserialize, Serialize};

/// 检测流水线参数
///
/// 所有字段都可覆盖，默认值对应常见笔记本摄像头 (~30fps)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionConfig {
    pub calibration_frames: u32,
    pub ear_window: usize,
    /// EAR 阈值 = 睁眼 EAR 均值 × 此系数
    pub ear_threshold_factor: f64,
    pub ear_consec_frames: u32,
    pub mar_window: usize,
    pub mar_threshold: f64,
    pub mar_consec_frames: u32,
    pub tilt_window: usize,
    /// 相对基线的比值增量
    pub tilt_delta_ratio: f64,
    /// 比值/秒
    pub tilt_velocity_threshold: f64,
    pub tilt_consec_frames: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            calibration_frames: 40,
            ear_window: 6,
            ear_threshold_factor: 0.72,
            ear_consec_frames: 8,
            mar_window: 6,
            mar_threshold: 0.70,
            mar_consec_frames: 10,
            tilt_window: 6,
            tilt_delta_ratio: 0.08,
            tilt_velocity_threshold: 0.012,
            tilt_consec_frames: 10,
        }
    }
}
