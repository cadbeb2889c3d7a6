//! 有界滑动窗口平均
//!
//! 每个信号一个窗口，超出容量时丢弃最旧的值。
//! 窗口未满时返回已有值的部分平均。

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SmoothingWindow {
    /// `capacity` 为 0 时按 1 处理
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// 当前内容的算术平均；窗口为空时返回 None
    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().sum();
        Some(sum / self.values.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
