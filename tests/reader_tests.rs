//! Integration tests for reader dispatch, file ordering and feature handling.

use std::path::PathBuf;

use layerbridge::core::{FeatureTable, Frame, LayerKind};
use layerbridge::formats::{read_frame, write_frame, write_polydata};
use layerbridge::geom::{DataArray, PolyData};
use layerbridge::plugin::{detect, load, load_with, write, ReadInput, ReaderKind};
use layerbridge::util::DVec3;
use layerbridge::{Config, Error};

use tempfile::TempDir;

fn marker_cloud(index: usize) -> Frame {
    Frame::points(vec![
        DVec3::new(index as f64, 0.0, 0.0),
        DVec3::new(index as f64, 1.0, 0.0),
    ])
}

fn triangle() -> Frame {
    Frame::surface(vec![DVec3::ZERO, DVec3::X, DVec3::Y], vec![[0, 1, 2]]).expect("surface")
}

#[test]
fn test_integer_stem_order_with_twelve_frames() {
    let dir = TempDir::new().expect("temp dir");
    // Unpadded names: lexical order would put 10 and 11 before 2.
    for i in (0..12).rev() {
        write_frame(dir.path().join(format!("{}.vtp", i)), &marker_cloud(i)).expect("write");
    }

    let layer = load(dir.path()).expect("load");
    assert!(layer.is_4d());
    let coords = layer.data().coordinates();
    for (row, values) in coords.rows().enumerate() {
        let frame = (row / 2) as f64;
        assert_eq!(values[0], frame, "time index of row {}", row);
        assert_eq!(values[1], frame, "x marker of row {}", row);
    }
}

#[test]
fn test_explicit_list_is_sorted() {
    let dir = TempDir::new().expect("temp dir");
    let mut paths = Vec::new();
    for i in [3usize, 10, 0, 2, 1] {
        let p = dir.path().join(format!("{:02}.ply", i));
        write_frame(&p, &marker_cloud(i)).expect("write");
        paths.push(p);
    }
    let layer = load(paths).expect("load");
    let xs: Vec<f64> = layer.data().coordinates().rows().map(|r| r[1]).step_by(2).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 10.0]);
    // Time indices are frame ordinals, not file numbers.
    let times = layer.data().coordinates().time_column().expect("4D");
    assert_eq!(times.last(), Some(&4.0));
}

#[test]
fn test_dimensionality_dispatch() {
    let dir = TempDir::new().expect("temp dir");

    let flat = load_from_frames(&dir, &[triangle()]);
    let written = write(dir.path().join("flat.obj"), &flat).expect("write 3D");
    assert_eq!(written, vec![dir.path().join("flat.obj")]);
    assert!(!dir.path().join("flat").exists());

    let timed = load_from_frames(&dir, &[triangle(), triangle(), triangle()]);
    let written = write(dir.path().join("timed.obj"), &timed).expect("write 4D");
    assert_eq!(written.len(), 3);
    for (i, p) in written.iter().enumerate() {
        assert_eq!(p, &dir.path().join("timed").join(format!("{:03}.obj", i)));
        assert!(p.is_file());
    }
    assert!(!dir.path().join("timed.obj").exists());
}

/// Write frames to a scratch directory and load them back as one layer.
fn load_from_frames(dir: &TempDir, frames: &[Frame]) -> layerbridge::core::Layer {
    let scratch = tempfile::tempdir_in(dir.path()).expect("scratch");
    for (i, f) in frames.iter().enumerate() {
        write_frame(scratch.path().join(format!("{}.vtp", i)), f).expect("write");
    }
    let paths: Vec<PathBuf> = (0..frames.len())
        .map(|i| scratch.path().join(format!("{}.vtp", i)))
        .collect();
    load(paths).expect("load")
}

#[test]
fn test_detect_negative_cases() {
    let dir = TempDir::new().expect("temp dir");

    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not a mesh").expect("write");
    assert_eq!(detect(&ReadInput::from(notes.clone())), None);

    let empty = dir.path().join("empty");
    std::fs::create_dir(&empty).expect("mkdir");
    assert_eq!(detect(&ReadInput::from(empty.clone())), None);
    assert!(matches!(load(empty), Err(Error::EmptyInput)));

    let only_text = dir.path().join("text_only");
    std::fs::create_dir(&only_text).expect("mkdir");
    std::fs::write(only_text.join("0.txt"), "x").expect("write");
    assert_eq!(detect(&ReadInput::from(only_text)), None);

    let good = dir.path().join("0.vtp");
    write_frame(&good, &marker_cloud(0)).expect("write");
    assert_eq!(detect(&ReadInput::Paths(vec![good.clone(), notes])), None);
    assert_eq!(detect(&ReadInput::Paths(Vec::new())), None);

    let broken = dir.path().join("broken.vtp");
    std::fs::write(&broken, "<VTKFile type=\"PolyData\">").expect("write");
    assert_eq!(detect(&ReadInput::from(broken.clone())), None);
    assert!(matches!(load(broken), Err(Error::FileFormat { .. })));

    assert_eq!(detect(&ReadInput::from(dir.path().join("missing.ply"))), None);
}

#[test]
fn test_detect_kinds() {
    let dir = TempDir::new().expect("temp dir");
    let points = dir.path().join("p.vtk");
    let surface = dir.path().join("s.ply");
    write_frame(&points, &marker_cloud(0)).expect("write");
    write_frame(&surface, &triangle()).expect("write");

    assert_eq!(detect(&ReadInput::from(points.clone())), Some(ReaderKind::Points));
    assert_eq!(detect(&ReadInput::from(surface.clone())), Some(ReaderKind::Surfaces));

    let config = Config::default();
    let layer = ReaderKind::Surfaces
        .read(&ReadInput::from(surface), &config)
        .expect("read surface");
    assert_eq!(layer.kind(), LayerKind::Surface);
    assert_eq!(layer.metadata().name.as_deref(), Some("s"));
    let err = ReaderKind::Surfaces
        .read(&ReadInput::from(points), &config)
        .unwrap_err();
    assert!(matches!(err, Error::KindMismatch { .. }));
}

#[test]
fn test_mixed_kinds_fail_to_stack() {
    let dir = TempDir::new().expect("temp dir");
    write_frame(dir.path().join("0.vtp"), &marker_cloud(0)).expect("write");
    write_frame(dir.path().join("1.vtp"), &triangle()).expect("write");
    assert!(matches!(load(dir.path()), Err(Error::KindMismatch { .. })));
}

#[test]
fn test_feature_filtering() {
    let dir = TempDir::new().expect("temp dir");
    let mut pd = PolyData::new(vec![DVec3::ZERO, DVec3::X, DVec3::Y]);
    pd.set_point_cells();
    pd.add_point_array(DataArray::new("RGB", 3, vec![0.5; 9]).expect("rgb"))
        .expect("add rgb");
    pd.add_point_array(DataArray::scalar("intensity", vec![1.0, 2.0, 3.0]))
        .expect("add scalar");

    for ext in ["vtp", "vtk", "ply"] {
        let path = dir.path().join(format!("colored.{}", ext));
        write_polydata(&path, &pd, &Config::default()).expect("write");
        let frame = read_frame(&path).expect("read");
        let names: Vec<&str> = frame.features().names().collect();
        assert_eq!(names, vec!["intensity"], "{}", ext);
        assert_eq!(frame.features().get("intensity"), Some(&[1.0, 2.0, 3.0][..]));
    }
}

#[test]
fn test_color_by_and_point_size_from_config() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("scored.vtp");
    let features = FeatureTable::from_columns([
        ("score", vec![0.1, 0.2]),
        ("label", vec![1.0, 2.0]),
    ])
    .expect("table");
    write_frame(&path, &marker_cloud(0).with_features(features).expect("fit")).expect("write");

    let layer = load(path.as_path()).expect("load");
    assert_eq!(layer.metadata().color_by.as_deref(), Some("score"));
    assert_eq!(layer.metadata().point_size, Some(0.5));

    let config = Config {
        color_by_first_feature: false,
        point_size: 2.0,
        ..Default::default()
    };
    let layer = load_with(&ReadInput::from(path), &config).expect("load");
    assert_eq!(layer.metadata().color_by, None);
    assert_eq!(layer.metadata().point_size, Some(2.0));
}

#[test]
fn test_frames_with_different_features() {
    let dir = TempDir::new().expect("temp dir");
    let a = marker_cloud(0)
        .with_features(FeatureTable::from_columns([("a", vec![1.0, 2.0])]).expect("table"))
        .expect("fit");
    write_frame(dir.path().join("0.vtp"), &a).expect("write");
    write_frame(dir.path().join("1.vtp"), &marker_cloud(1)).expect("write");

    let layer = load(dir.path()).expect("load");
    let column = layer.features().get("a").expect("column");
    assert_eq!(&column[..2], &[1.0, 2.0]);
    assert!(column[2].is_nan() && column[3].is_nan());
}
