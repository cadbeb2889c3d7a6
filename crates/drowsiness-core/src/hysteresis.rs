//! 连续帧计数状态机
//!
//! Idle (count=0) → Accumulating (0<count<threshold) → Triggered (count≥threshold)
//!
//! 条件为假的任意一帧都会立即回到 Idle，计数清零。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorState {
    Idle,
    Accumulating,
    Triggered,
}

#[derive(Debug, Clone)]
pub struct HysteresisCounter {
    count: u32,
    threshold: u32,
}

impl HysteresisCounter {
    /// `threshold` 为 0 时按 1 处理，避免空条件也触发
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// 喂入本帧条件，返回更新后的状态
    pub fn update(&mut self, condition: bool) -> DetectorState {
        if condition {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 0;
        }
        self.state()
    }

    pub fn state(&self) -> DetectorState {
        if self.count == 0 {
            DetectorState::Idle
        } else if self.count < self.threshold {
            DetectorState::Accumulating
        } else {
            DetectorState::Triggered
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_triggered(&self) -> bool {
        self.count >= self.threshold
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
