// 该文件是 Weibei （渭北春树） 项目的一部分。
// tests/pipeline.rs - 流水线集成测试
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

#![cfg(all(
  feature = "replay_engine",
  feature = "record_output",
  feature = "read_image_file",
  feature = "save_image_file"
))]

use image::{ImageBuffer, Rgb, RgbImage};
use url::Url;

use weibei::{
  FromUrl,
  config::DetectConfig,
  engine::{EngineWrapper, ReplayEngine},
  frame::RgbPlanarFrame,
  input::InputWrapper,
  model::{DecodeError, DetectError, Detector, decode},
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

fn tensor_index(config: &DetectConfig, anchor: usize, channel: usize, column: usize, row: usize) -> usize {
  let spatial = config.grid_width * config.grid_height;
  (anchor * config.channels_per_anchor() + channel) * spatial + column * config.grid_height + row
}

/// 除 (6, 6, 0) 外全部静默的 VOC 张量，热点单元是一只居中的猫。
fn hot_cell_tensor(config: &DetectConfig) -> Vec<f32> {
  let mut raw = vec![0.0f32; config.tensor_len()];
  for anchor in 0..config.anchor_count() {
    for column in 0..config.grid_width {
      for row in 0..config.grid_height {
        raw[tensor_index(config, anchor, 4, column, row)] = -10.0;
      }
    }
  }
  raw[tensor_index(config, 0, 4, 6, 6)] = 10.0;
  // 类别 7 = cat
  raw[tensor_index(config, 0, 5 + 7, 6, 6)] = 10.0;
  raw
}

#[test]
fn decode_yields_full_grid() {
  let config = DetectConfig::tiny_yolo_voc();
  let raw = vec![0.0f32; config.tensor_len()];
  let detections = decode(&raw, &config).unwrap();
  assert_eq!(detections.len(), 13 * 13 * 5);
}

#[test]
fn detector_finds_hot_cell() {
  let config = DetectConfig::tiny_yolo_voc();
  let tensor = hot_cell_tensor(&config);
  let engine = ReplayEngine::from_vec(tensor);
  let detector: Detector<_, RgbPlanarFrame> = Detector::new(engine, config).unwrap();

  let frame = RgbPlanarFrame::with_shape(416, 416);
  let results = detector.detect(&frame).unwrap();

  assert_eq!(results.len(), 1);
  let hit = &results[0];
  assert_eq!(hit.grid_column, 6);
  assert_eq!(hit.grid_row, 6);
  assert_eq!(hit.anchor_index, 0);
  assert_eq!(hit.top_class.label, "cat");
  assert!(hit.top_class.confidence > 0.99);
  assert!(hit.objectness > 0.9999);

  // sigmoid(0) = 0.5，框中心在 (6.5, 6.5) 个单元处，即输入中心
  let center_x = hit.bbox.x + hit.bbox.width / 2.0;
  let center_y = hit.bbox.y + hit.bbox.height / 2.0;
  assert!((center_x - 208.0).abs() < 1e-2);
  assert!((center_y - 208.0).abs() < 1e-2);
  // exp(0) * 32 * (1.08, 1.19)
  assert!((hit.bbox.width - 34.56).abs() < 1e-2);
  assert!((hit.bbox.height - 38.08).abs() < 1e-2);
}

#[test]
fn wrong_tensor_length_surfaces_as_decode_error() {
  let config = DetectConfig::tiny_yolo_voc();
  let expected = config.tensor_len();
  let engine = ReplayEngine::from_vec(vec![0.0f32; 10]);
  let detector: Detector<_, RgbPlanarFrame> = Detector::new(engine, config).unwrap();

  let frame = RgbPlanarFrame::with_shape(416, 416);
  let err = detector.detect(&frame).unwrap_err();
  match err {
    DetectError::Decode(DecodeError::ShapeMismatch {
      expected: reported,
      actual,
    }) => {
      assert_eq!(reported, expected);
      assert_eq!(actual, 10);
    }
    other => panic!("意外的错误: {:?}", other),
  }
}

#[test]
fn one_shot_from_image_file_to_json_record() {
  let pid = std::process::id();
  let image_path = std::env::temp_dir().join(format!("weibei-e2e-{}.png", pid));
  let tensor_path = std::env::temp_dir().join(format!("weibei-e2e-{}.json", pid));
  let record_path = std::env::temp_dir().join(format!("weibei-e2e-out-{}.json", pid));

  let image: RgbImage = ImageBuffer::from_pixel(64, 48, Rgb([200, 200, 200]));
  image.save(&image_path).unwrap();

  let config = DetectConfig::tiny_yolo_voc();
  let tensor = hot_cell_tensor(&config);
  serde_json::to_writer(std::fs::File::create(&tensor_path).unwrap(), &tensor).unwrap();

  let engine =
    EngineWrapper::from_url(&Url::parse(&format!("replay:{}", tensor_path.display())).unwrap())
      .unwrap();
  let detector = Detector::new(engine, config).unwrap();

  let input =
    InputWrapper::from_url(&Url::parse(&format!("image:{}", image_path.display())).unwrap())
      .unwrap();
  let frames = input.into_frames(
    detector.config().input_width,
    detector.config().input_height,
  );
  let output =
    OutputWrapper::from_url(&Url::parse(&format!("record:{}", record_path.display())).unwrap())
      .unwrap();

  OneShotTask.run_task(frames, detector, output).unwrap();

  let data = std::fs::read_to_string(&record_path).unwrap();
  let value: serde_json::Value = serde_json::from_str(&data).unwrap();
  let records = value.as_array().unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0]["topClass"]["label"], "cat");
  assert_eq!(records[0]["gridColumn"], 6);
  assert!(records[0]["box"]["width"].as_f64().unwrap() > 30.0);

  std::fs::remove_file(&image_path).ok();
  std::fs::remove_file(&tensor_path).ok();
  std::fs::remove_file(&record_path).ok();
}

#[test]
fn one_shot_from_image_file_to_drawn_image() {
  let pid = std::process::id();
  let image_path = std::env::temp_dir().join(format!("weibei-draw-in-{}.png", pid));
  let out_path = std::env::temp_dir().join(format!("weibei-draw-out-{}.png", pid));

  let image: RgbImage = ImageBuffer::from_pixel(64, 48, Rgb([200, 200, 200]));
  image.save(&image_path).unwrap();

  let config = DetectConfig::tiny_yolo_voc();
  let engine = ReplayEngine::from_vec(hot_cell_tensor(&config));
  let detector = Detector::new(engine, config).unwrap();

  let input =
    InputWrapper::from_url(&Url::parse(&format!("image:{}", image_path.display())).unwrap())
      .unwrap();
  let frames = input.into_frames(
    detector.config().input_width,
    detector.config().input_height,
  );
  let output =
    OutputWrapper::from_url(&Url::parse(&format!("image:{}", out_path.display())).unwrap())
      .unwrap();

  OneShotTask.run_task(frames, detector, output).unwrap();

  let drawn = image::ImageReader::open(&out_path)
    .unwrap()
    .decode()
    .unwrap()
    .into_rgb8();
  assert_eq!(drawn.dimensions(), (64, 48));
  assert!(drawn.pixels().any(|p| *p == Rgb([0u8, 0u8, 255u8])));

  std::fs::remove_file(&image_path).ok();
  std::fs::remove_file(&out_path).ok();
}

#[test]
fn config_file_loads_and_validates() {
  let pid = std::process::id();
  let config_path = std::env::temp_dir().join(format!("weibei-config-{}.json", pid));
  let json = r#"{
    "input_width": 416,
    "input_height": 416,
    "grid_width": 13,
    "grid_height": 13,
    "anchors": [
      {"width": 1.08, "height": 1.19},
      {"width": 3.42, "height": 4.41}
    ],
    "labels": ["cat", "dog"],
    "confidence_threshold": 0.25,
    "iou_suppression": true,
    "iou_threshold": 0.5,
    "max_results": 3
  }"#;
  std::fs::write(&config_path, json).unwrap();

  let config =
    DetectConfig::from_url(&Url::parse(&format!("config:{}", config_path.display())).unwrap())
      .unwrap();
  assert_eq!(config.anchor_count(), 2);
  assert_eq!(config.class_count(), 2);
  assert_eq!(config.max_results, 3);
  assert_eq!(config.tensor_len(), 13 * 13 * 2 * 7);

  std::fs::remove_file(&config_path).ok();
}

#[test]
fn invalid_config_file_is_rejected() {
  let pid = std::process::id();
  let config_path = std::env::temp_dir().join(format!("weibei-bad-config-{}.json", pid));
  let json = r#"{
    "input_width": 416,
    "input_height": 416,
    "grid_width": 0,
    "grid_height": 13,
    "anchors": [{"width": 1.0, "height": 1.0}],
    "labels": ["cat"],
    "confidence_threshold": 0.25,
    "iou_suppression": false,
    "iou_threshold": 0.5,
    "max_results": 3
  }"#;
  std::fs::write(&config_path, json).unwrap();

  let result =
    DetectConfig::from_url(&Url::parse(&format!("config:{}", config_path.display())).unwrap());
  assert!(result.is_err());

  std::fs::remove_file(&config_path).ok();
}
