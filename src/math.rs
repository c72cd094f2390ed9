// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/math.rs - 数学工具
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

pub fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

/// 数值稳定的 softmax，先减去最大值再取指数。
pub fn softmax(xs: &[f32]) -> Vec<f32> {
  let max = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let exp: Vec<f32> = xs.iter().map(|x| (x - max).exp()).collect();
  let sum: f32 = exp.iter().sum();
  exp.into_iter().map(|e| e / sum).collect()
}
