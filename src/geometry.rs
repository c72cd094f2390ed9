// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/geometry.rs - 几何工具
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use serde::{Deserialize, Serialize};

/// 左上角原点的轴对齐矩形。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl Rect {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Rect {
      x,
      y,
      width,
      height,
    }
  }

  pub fn left(&self) -> f32 {
    self.x
  }

  pub fn top(&self) -> f32 {
    self.y
  }

  pub fn right(&self) -> f32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> f32 {
    self.y + self.height
  }

  pub fn area(&self) -> f32 {
    self.width * self.height
  }

  /// 两矩形的交集区域，不相交时宽高可能为负，不做裁剪。
  pub fn intersection(&self, other: &Rect) -> Rect {
    let left = self.left().max(other.left());
    let top = self.top().max(other.top());
    let right = self.right().min(other.right());
    let bottom = self.bottom().min(other.bottom());
    Rect::new(left, top, right - left, bottom - top)
  }

  /// 交并比。任一矩形面积不为正时返回 0。
  pub fn iou(&self, other: &Rect) -> f32 {
    let area_a = self.area();
    let area_b = other.area();
    if area_a <= 0.0 || area_b <= 0.0 {
      return 0.0;
    }

    let inter_width = (self.right().min(other.right()) - self.left().max(other.left())).max(0.0);
    let inter_height = (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0);
    let inter = inter_width * inter_height;

    inter / (area_a + area_b - inter)
  }
}
