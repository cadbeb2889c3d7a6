//! 告警分发模块
//!
//! 每帧由 `DrowsinessMonitor` 产出有序的告警动作，
//! `AlertAggregator` 负责把动作应用到本地警报器和远程事件上报。
//!
//! 已知限制：闭眼条件解除时无条件关闭警报，
//! 即使同一帧其他检测器仍处于触发状态。

use serde::{Deserialize, Serialize};

use crate::event::EventKind;

/// 本地警报设备，`activate` / `deactivate` 必须幂等
pub trait AlarmDevice {
    fn activate(&mut self);
    fn deactivate(&mut self);
}

/// 远程事件上报，调用方不等待结果
pub trait EventSink {
    fn report(&mut self, kind: EventKind);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "kind", rename_all = "snake_case")]
pub enum AlertAction {
    /// 检测器处于触发状态：拉响警报并上报一次事件
    Raise(EventKind),
    /// 闭眼条件解除：关闭警报
    Silence,
}

pub struct AlertAggregator<A, S> {
    alarm: A,
    sink: S,
}

impl<A: AlarmDevice, S: EventSink> AlertAggregator<A, S> {
    pub fn new(alarm: A, sink: S) -> Self {
        Self { alarm, sink }
    }

    /// 按顺序执行一帧的动作，返回本帧上报的事件数
    pub fn dispatch(&mut self, actions: &[AlertAction]) -> usize {
        let mut reported = 0;
        for action in actions {
            match action {
                AlertAction::Raise(kind) => {
                    self.alarm.activate();
                    self.sink.report(*kind);
                    reported += 1;
                }
                AlertAction::Silence => self.alarm.deactivate(),
            }
        }
        reported
    }

    pub fn alarm(&self) -> &A {
        &self.alarm
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (A, S) {
        (self.alarm, self.sink)
    }
}
