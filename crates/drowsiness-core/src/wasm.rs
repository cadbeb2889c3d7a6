//! 浏览器端绑定
//!
//! 在浏览器中配合 MediaPipe FaceLandmarker 使用：
//! 每帧传入扁平化的关键点坐标，返回本帧的处理结果（JS 对象）。
//! 告警动作由 JS 侧执行（播放声音、上报事件）。

use wasm_bindgen::prelude::*;

use crate::config::DetectionConfig;
use crate::landmarks::LandmarkFrame;
use crate::monitor::{DrowsinessMonitor, FrameReport, MonitorPhase};

#[wasm_bindgen]
pub struct WasmMonitor {
    inner: DrowsinessMonitor,
}

#[wasm_bindgen]
impl WasmMonitor {
    /// 使用默认参数创建
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: DrowsinessMonitor::new(DetectionConfig::default()),
        }
    }

    /// 使用 JS 配置对象创建，缺省字段取默认值
    #[wasm_bindgen(js_name = "withConfig")]
    pub fn with_config(config: JsValue) -> Result<WasmMonitor, JsValue> {
        let config: DetectionConfig = serde_wasm_bindgen::from_value(config)?;
        Ok(Self {
            inner: DrowsinessMonitor::new(config),
        })
    }

    /// 处理一帧
    ///
    /// # 参数
    /// - `points`: x0, y0, x1, y1, ... 归一化坐标
    /// - `width` / `height`: 帧尺寸（像素）
    /// - `timestamp`: 秒
    #[wasm_bindgen(js_name = "processFrame")]
    pub fn process_frame(
        &mut self,
        points: &[f64],
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Result<JsValue, JsValue> {
        let frame = LandmarkFrame::from_flat(points, width, height);
        let report = self.inner.process(timestamp, Some(&frame));
        to_js(&report)
    }

    /// 本帧未检测到人脸
    #[wasm_bindgen(js_name = "processNoFace")]
    pub fn process_no_face(&mut self, timestamp: f64) -> Result<JsValue, JsValue> {
        let report = self.inner.process(timestamp, None);
        to_js(&report)
    }

    pub fn recalibrate(&mut self) {
        self.inner.recalibrate();
    }

    #[wasm_bindgen(js_name = "isCalibrating")]
    pub fn is_calibrating(&self) -> bool {
        self.inner.phase() == MonitorPhase::Calibrating
    }

    /// 当前 EAR 阈值，首次校准前返回 NaN
    #[wasm_bindgen(js_name = "earThreshold")]
    pub fn ear_threshold(&self) -> f64 {
        self.inner.profile().map_or(f64::NAN, |p| p.ear_threshold)
    }

    /// 当前俯仰基线，首次校准前返回 NaN
    #[wasm_bindgen(js_name = "tiltBaseline")]
    pub fn tilt_baseline(&self) -> f64 {
        self.inner.profile().map_or(f64::NAN, |p| p.tilt_baseline)
    }
}

impl Default for WasmMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn to_js(report: &FrameReport) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(report).map_err(JsValue::from)
}
