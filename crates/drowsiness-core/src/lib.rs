//! 驾驶员疲劳检测核心库
//!
//! 本库把逐帧的面部关键点转换为持续性告警（闭眼、哈欠、低头），
//! 不依赖摄像头、显示或音频，可直接喂入合成信号进行测试，
//! 同时编译为 WebAssembly 供浏览器端使用。
//!
//! ## 模块
//! - `landmarks`: 关键点帧与索引
//! - `ear` / `mar` / `head_pose`: 几何信号计算
//! - `signal`: 三态测量值与逐帧信号提取
//! - `smoothing`: 有界滑动窗口平均
//! - `calibration`: 自适应阈值校准
//! - `hysteresis` / `detectors`: 连续帧状态机检测器
//! - `monitor`: 逐帧处理流水线
//! - `alert`: 告警分发（本地警报 + 远程事件上报）
//! - `event`: 事件类型

pub mod alert;
pub mod calibration;
pub mod config;
pub mod detectors;
pub mod ear;
pub mod event;
pub mod head_pose;
pub mod hysteresis;
pub mod landmarks;
pub mod mar;
pub mod monitor;
pub mod signal;
pub mod smoothing;
pub mod wasm;

// 重新导出核心类型，方便外部使用
pub use alert::{AlarmDevice, AlertAction, AlertAggregator, EventSink};
pub use calibration::{CalibrationOutcome, CalibrationProfile, Calibrator};
pub use config::DetectionConfig;
pub use detectors::{EyeClosureDetector, HeadTiltDetector, YawnDetector};
pub use event::EventKind;
pub use hysteresis::{DetectorState, HysteresisCounter};
pub use landmarks::{LandmarkFrame, Point};
pub use monitor::{DrowsinessMonitor, FrameReport, MonitorPhase};
pub use signal::{Measurement, SignalSample};
pub use smoothing::SmoothingWindow;
