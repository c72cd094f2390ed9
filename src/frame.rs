// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/frame.rs - 帧定义
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

use image::{ImageBuffer, Rgb, RgbImage};

use crate::{geometry::Rect, input::AsPlanarFrame};

const RGB_CHANNELS: usize = 3;

/// 平面 CHW 浮点帧，RGB 顺序，取值范围 [0, 1]。
#[derive(Debug, Clone)]
pub struct RgbPlanarFrame {
  width: u32,
  height: u32,
  data: Box<[f32]>,
}

impl RgbPlanarFrame {
  pub fn with_shape(width: u32, height: u32) -> Self {
    let size = RGB_CHANNELS * width as usize * height as usize;
    Self {
      width,
      height,
      data: vec![0.0f32; size].into_boxed_slice(),
    }
  }

  pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Self {
    let expected = RGB_CHANNELS * width as usize * height as usize;
    if data.len() != expected {
      panic!(
        "数据长度不匹配: 期望长度 {}, 实际长度 {}",
        expected,
        data.len()
      );
    }

    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn data(&self) -> &[f32] {
    &self.data
  }
}

impl AsMut<[f32]> for RgbPlanarFrame {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

impl AsPlanarFrame for RgbPlanarFrame {
  fn as_planar(&self) -> &RgbPlanarFrame {
    self
  }
}

impl From<&RgbImage> for RgbPlanarFrame {
  fn from(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    if plane == 0 {
      return Self {
        width,
        height,
        data: Vec::new().into_boxed_slice(),
      };
    }

    let mut data = vec![0.0f32; plane * RGB_CHANNELS];

    // 三个通道平面互不重叠，各自在一个线程内填充
    std::thread::scope(|scope| {
      for (channel, plane_data) in data.chunks_mut(plane).enumerate() {
        scope.spawn(move || {
          for y in 0..height {
            for x in 0..width {
              let pixel = image.get_pixel(x, y);
              plane_data[(y * width + x) as usize] = pixel[channel] as f32 / 255.0;
            }
          }
        });
      }
    });

    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }
}

/// 原始图像适配到网络输入时的缩放与留白记录。
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
  pub scale: f32,
  pub offset_x: f32,
  pub offset_y: f32,
  pub orig_width: u32,
  pub orig_height: u32,
}

impl Letterbox {
  /// 等比缩放并居中，余量留黑边。
  pub fn fit(orig_width: u32, orig_height: u32, input_width: u32, input_height: u32) -> Self {
    let scale = (input_width as f32 / orig_width as f32)
      .min(input_height as f32 / orig_height as f32);
    let scaled_width = (orig_width as f32 * scale).round();
    let scaled_height = (orig_height as f32 * scale).round();
    let offset_x = ((input_width as f32 - scaled_width) / 2.0).round();
    let offset_y = ((input_height as f32 - scaled_height) / 2.0).round();

    Letterbox {
      scale,
      offset_x,
      offset_y,
      orig_width,
      orig_height,
    }
  }

  pub fn scaled_width(&self) -> u32 {
    ((self.orig_width as f32 * self.scale).round() as u32).max(1)
  }

  pub fn scaled_height(&self) -> u32 {
    ((self.orig_height as f32 * self.scale).round() as u32).max(1)
  }

  /// 把网络输入空间的矩形映射回原图空间，并裁剪到原图范围内。
  pub fn unmap_rect(&self, rect: &Rect) -> Rect {
    let max_x = self.orig_width as f32;
    let max_y = self.orig_height as f32;
    let left = ((rect.left() - self.offset_x) / self.scale).clamp(0.0, max_x);
    let top = ((rect.top() - self.offset_y) / self.scale).clamp(0.0, max_y);
    let right = ((rect.right() - self.offset_x) / self.scale).clamp(0.0, max_x);
    let bottom = ((rect.bottom() - self.offset_y) / self.scale).clamp(0.0, max_y);

    Rect::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
  }
}

/// 原始图像帧：保留原图、归一化张量以及信箱缩放参数。
pub struct ImageFrame {
  pub image: RgbImage,
  pub tensor: RgbPlanarFrame,
  pub letterbox: Letterbox,
}

impl ImageFrame {
  pub fn from_image(image: RgbImage, input_width: u32, input_height: u32) -> Self {
    let (orig_width, orig_height) = image.dimensions();
    let letterbox = Letterbox::fit(orig_width, orig_height, input_width, input_height);

    let resized = image::imageops::resize(
      &image,
      letterbox.scaled_width(),
      letterbox.scaled_height(),
      image::imageops::FilterType::Triangle,
    );
    let mut canvas: RgbImage =
      ImageBuffer::from_pixel(input_width, input_height, Rgb([0u8, 0u8, 0u8]));
    image::imageops::replace(
      &mut canvas,
      &resized,
      letterbox.offset_x as i64,
      letterbox.offset_y as i64,
    );

    let tensor = RgbPlanarFrame::from(&canvas);

    ImageFrame {
      image,
      tensor,
      letterbox,
    }
  }
}

impl AsPlanarFrame for ImageFrame {
  fn as_planar(&self) -> &RgbPlanarFrame {
    &self.tensor
  }
}
