//! 面部关键点帧
//!
//! 上游关键点提供者（摄像头 + 推理）每帧输出一组归一化 [0,1] 坐标点，
//! 附带帧宽高。所有距离都在像素空间中计算（x·width, y·height）。

use serde::{Deserialize, Serialize};

/// 除零保护常量
pub const EPSILON: f64 = 1e-8;

/// 分母距离低于此值（像素）视为几何退化
pub const MIN_SPAN_PX: f64 = 1e-6;

// MediaPipe FaceMesh 关键点索引
pub const LEFT_EYE_OUTER: usize = 33;
pub const LEFT_EYE_UPPER_1: usize = 160;
pub const LEFT_EYE_UPPER_2: usize = 158;
pub const LEFT_EYE_INNER: usize = 133;
pub const LEFT_EYE_LOWER_2: usize = 153;
pub const LEFT_EYE_LOWER_1: usize = 144;
pub const RIGHT_EYE_OUTER: usize = 263;

pub const MOUTH_INNER_TOP: usize = 13;
pub const MOUTH_INNER_BOTTOM: usize = 14;
pub const MOUTH_SECONDARY_TOP: usize = 78;
pub const MOUTH_SECONDARY_BOTTOM: usize = 308;
pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;

pub const NOSE_TIP: usize = 1;
pub const CHIN: usize = 152;

/// 二维点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// 单帧关键点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// 归一化坐标点，按模型输出顺序排列
    pub points: Vec<Point>,
    pub width: u32,
    pub height: u32,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point>, width: u32, height: u32) -> Self {
        Self {
            points,
            width,
            height,
        }
    }

    /// 从扁平数组构造: x0, y0, x1, y1, ...
    ///
    /// 奇数长度时最后一个坐标被丢弃
    pub fn from_flat(coords: &[f64], width: u32, height: u32) -> Self {
        let points = coords
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect();
        Self::new(points, width, height)
    }

    /// 取像素空间中的点，索引越界或坐标非有限值时返回 None
    pub fn pixel(&self, index: usize) -> Option<Point> {
        self.points
            .get(index)
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| Point::new(p.x * f64::from(self.width), p.y * f64::from(self.height)))
    }

    /// 一次性取多个点，任一缺失则返回 None
    pub fn pixels<const N: usize>(&self, indices: [usize; N]) -> Option<[Point; N]> {
        let mut out = [Point::new(0.0, 0.0); N];
        for (slot, index) in out.iter_mut().zip(indices) {
            *slot = self.pixel(index)?;
        }
        Some(out)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
