mod common;

use std::fs;
use std::path::Path;

use common::{SyntheticImage, comment_with_gain};
use ndarray::{Array2, array};
use streakimage::{
    BackgroundRegistry, Correction, CorrectionLibrary, LoadOptions, OffsetWindow, StreakError,
    StreakImage,
};

fn sample() -> StreakImage {
    StreakImage::from_bytes(&SyntheticImage::sample().to_bytes()).unwrap()
}

fn sample_with_gain(gain: &str) -> StreakImage {
    let synthetic = SyntheticImage::sample().with_comment(comment_with_gain(gain));
    StreakImage::from_bytes(&synthetic.to_bytes()).unwrap()
}

const CONFIG: &str = r#"{
    "gainCorrection": {"42": 2.0},
    "cameraCorrectionFolders": {"C4742-95": "flat"},
    "cameraCorrectionPrefixes": {"C4742-95": {"default": "a"}}
}"#;

/// Writes a correction directory for the sample camera and returns it opened.
fn library(dir: &Path, flat_field: Option<&str>, mono: Option<&str>) -> CorrectionLibrary {
    fs::write(dir.join("streakimage.json"), CONFIG).unwrap();
    if let Some(table) = flat_field {
        fs::create_dir_all(dir.join("flat")).unwrap();
        fs::write(dir.join("flat/C4742-95_a_ST2 ns_correction_3x4.dat"), table).unwrap();
    }
    if let Some(table) = mono {
        fs::create_dir_all(dir.join("C4742-95_corrections")).unwrap();
        fs::write(dir.join("C4742-95_corrections/C4742-95_mono.dat"), table).unwrap();
    }
    CorrectionLibrary::open(dir).unwrap()
}

const FLAT_TWOS: &str = "2\t2\t2\n2\t2\t2\n2\t2\t2\n2\t2\t2\n";

#[test]
fn time_scale_shift_moves_every_label() {
    let mut image = sample();
    assert_eq!(image.times(), &array![-20.0, -10.0, 0.0, 10.0]);

    image.shift_time_scale(5.0);
    assert_eq!(image.times(), &array![-15.0, -5.0, 5.0, 15.0]);
}

#[test]
fn subtracting_an_identical_background_zeroes_the_image() {
    let mut image = sample();
    let background = sample();
    image.subtract_background(&background).unwrap();
    assert_eq!(image.intensities(), &Array2::<f64>::zeros((4, 3)));
    assert!(image.state().background_subtracted);

    let err = image.subtract_background(&background).unwrap_err();
    assert!(matches!(
        err,
        StreakError::AlreadyCorrected(Correction::Background)
    ));
}

#[test]
fn gain_mismatch_is_reported_by_name() {
    let mut image = sample();
    let before = image.intensities().clone();
    let err = image
        .subtract_background(&sample_with_gain("10"))
        .unwrap_err();
    match err {
        StreakError::IncompatibleBackground { parameters, source } => {
            assert_eq!(parameters, ["gain"]);
            assert!(source.is_none());
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(image.intensities(), &before);
    assert!(!image.state().background_subtracted);
}

#[test]
fn dimension_mismatch_is_the_cause() {
    let small = SyntheticImage {
        width: 2,
        height: 2,
        pixels: vec![1, 2, 3, 4],
        wavelengths: vec![2.0, 1.0],
        times: vec![0.0, 1.0],
        ..SyntheticImage::sample()
    };
    let background = StreakImage::from_bytes(&small.to_bytes()).unwrap();
    let err = sample().subtract_background(&background).unwrap_err();
    match err {
        StreakError::IncompatibleBackground { parameters, source } => {
            assert!(parameters.is_empty());
            assert!(matches!(
                source.as_deref(),
                Some(StreakError::DimensionMismatch {
                    dimension: "height",
                    expected: 4,
                    found: 2
                })
            ));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn registry_supplies_background_during_load() {
    let mut registry = BackgroundRegistry::new();
    assert!(registry.insert(sample()).unwrap().is_none());
    assert!(registry.insert(sample_with_gain("10")).unwrap().is_none());
    assert_eq!(registry.len(), 2);

    let options = LoadOptions::builder().backgrounds(&registry).build();
    let image =
        StreakImage::from_bytes_with(&SyntheticImage::sample().to_bytes(), &options).unwrap();
    assert!(image.state().background_subtracted);
    assert!(image.intensities().iter().all(|&v| v == 0.0));
}

#[test]
fn explicit_background_wins_over_registry() {
    let registry = BackgroundRegistry::new();
    let background = sample();
    let options = LoadOptions::builder()
        .background(&background)
        .backgrounds(&registry)
        .build();
    let image =
        StreakImage::from_bytes_with(&SyntheticImage::sample().to_bytes(), &options).unwrap();
    assert!(image.state().background_subtracted);
}

#[test]
fn unknown_background_fails_the_load() {
    let mut registry = BackgroundRegistry::new();
    registry.insert(sample_with_gain("10")).unwrap();

    let options = LoadOptions::builder().backgrounds(&registry).build();
    let err = StreakImage::from_bytes_with(&SyntheticImage::sample().to_bytes(), &options)
        .unwrap_err();
    match err {
        StreakError::MissingCorrectionData(message) => {
            assert!(message.contains("bg_ST2 ns_g42_10x10ms"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn manual_offsets_accumulate() {
    let mut image = sample();
    let offset = image
        .apply_manual_offset(&[OffsetWindow::new((-10.0, -20.0), (500.0, 550.0))])
        .unwrap();
    assert_eq!(offset, 4.0);
    assert_eq!(image.intensities()[[0, 0]], -1.0);

    let offset = image
        .apply_manual_offset(&[
            OffsetWindow::new((0.0, 0.0), (600.0, 600.0)),
            OffsetWindow::new((0.0, 0.0), (600.0, 600.0)),
        ])
        .unwrap();
    assert_eq!(offset, 6.0);
    assert_eq!(image.intensities()[[2, 2]], 0.0);
}

#[test]
fn empty_offset_window_is_rejected() {
    let mut image = sample();
    let before = image.intensities().clone();
    let err = image
        .apply_manual_offset(&[OffsetWindow::new((100.0, 200.0), (500.0, 600.0))])
        .unwrap_err();
    assert!(matches!(err, StreakError::EmptySelection));
    assert_eq!(image.intensities(), &before);
}

#[test]
fn corner_background_averages_both_corners() {
    let mut image = sample();
    let offset = image.apply_corner_background(1, 1).unwrap();
    assert_eq!(offset, 2.0);
    assert_eq!(image.intensities().row(0), array![1.0, 0.0, -1.0]);
}

#[test]
fn gain_correction_divides_once() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), None, None);

    let mut image = sample();
    image.apply_gain_correction(&library).unwrap();
    assert_eq!(image.intensities()[[2, 0]], 15.0);
    assert!(image.state().gain_corrected);

    let err = image.apply_gain_correction(&library).unwrap_err();
    assert!(matches!(err, StreakError::AlreadyCorrected(Correction::Gain)));
    assert_eq!(image.intensities()[[2, 0]], 15.0);
}

#[test]
fn unknown_gain_has_no_coefficient() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), None, None);

    let mut image = sample_with_gain("63");
    let err = image.apply_gain_correction(&library).unwrap_err();
    assert!(matches!(err, StreakError::MissingCorrectionData(_)));
    assert!(!image.state().gain_corrected);
}

#[test]
fn camera_correction_divides_by_flat_field() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), Some(FLAT_TWOS), None);

    let mut image = sample();
    image.apply_camera_correction(&library).unwrap();
    assert_eq!(image.intensities().row(2), array![15.0, 10.0, 5.0]);
    assert!(image.state().camera_corrected);
}

#[test]
fn missing_flat_field_leaves_image_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), None, None);

    let mut image = sample();
    let before = image.intensities().clone();
    let err = image.apply_camera_correction(&library).unwrap_err();
    assert!(matches!(err, StreakError::MissingCorrectionData(_)));
    assert_eq!(image.intensities(), &before);
    assert!(!image.state().camera_corrected);
}

#[test]
fn camera_correction_during_load() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), Some(FLAT_TWOS), None);
    let path = SyntheticImage::sample().write_to(dir.path(), "image.img");

    let options = LoadOptions::builder().corrections(&library).build();
    let image = StreakImage::open_with(&path, &options).unwrap();
    assert!(image.state().camera_corrected);
    assert_eq!(image.intensities()[[0, 0]], 1.5);
    assert_eq!(image.times(), &array![-20.0, -10.0, 0.0, 10.0]);
}

#[test]
fn flat_field_of_wrong_shape_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), Some("2\t2\t2\n2\t2\t2\n"), None);

    let mut image = sample();
    let err = image.apply_camera_correction(&library).unwrap_err();
    match err {
        StreakError::InvalidCorrectionData { path, reason } => {
            assert!(path.ends_with("C4742-95_a_ST2 ns_correction_3x4.dat"));
            assert!(reason.contains("4 rows of 3 values"), "{reason}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!image.state().camera_corrected);
}

#[test]
fn load_subtracts_background_before_flat_field_then_aligns() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), Some(FLAT_TWOS), None);
    let background = StreakImage::from_bytes(
        &SyntheticImage {
            pixels: vec![1, 1, 1, 1, 1, 1, 25, 25, 25, 1, 1, 1],
            ..SyntheticImage::sample()
        }
        .to_bytes(),
    )
    .unwrap();

    let options = LoadOptions::builder()
        .background(&background)
        .corrections(&library)
        .build();
    let image =
        StreakImage::from_bytes_with(&SyntheticImage::sample().to_bytes(), &options).unwrap();

    let state = image.state();
    assert!(state.background_subtracted && state.camera_corrected);
    // (image - background) / flat field
    assert_eq!(image.intensities().row(0), array![1.0, 0.5, 0.0]);
    assert_eq!(image.intensities().row(2), array![2.5, -2.5, -7.5]);
    // the corrected matrix peaks in the last row
    assert_eq!(image.times(), &array![-30.0, -20.0, -10.0, 0.0]);
}

#[test]
fn mono_correction_interpolates_response() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), None, Some("500\t1\n600\t2\n"));

    let mut image = sample();
    image.apply_mono_correction(&library, false).unwrap();
    assert_eq!(image.intensities().row(0), array![3.0, 2.0 / 1.5, 0.5]);
    assert!(image.state().mono_corrected);
}

#[test]
fn mono_correction_outside_calibration() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path(), None, Some("520\t1\n600\t2\n"));

    let mut image = sample();
    let before = image.intensities().clone();
    let err = image.apply_mono_correction(&library, false).unwrap_err();
    assert!(matches!(
        err,
        StreakError::OutOfCalibrationRange {
            requested: (500.0, 600.0),
            calibrated: (520.0, 600.0)
        }
    ));
    assert_eq!(image.intensities(), &before);

    image.apply_mono_correction(&library, true).unwrap();
    assert_eq!(image.intensities()[[0, 0]], 4.0);
}

#[test]
fn exposure_correction_normalizes_to_milliseconds() {
    let mut image = sample();
    image.apply_exposure_correction().unwrap();
    assert_eq!(image.intensities()[[2, 0]], 0.3);
    assert!(matches!(
        image.apply_exposure_correction(),
        Err(StreakError::AlreadyCorrected(Correction::Exposure))
    ));
    assert!(image.summary().contains("Corrections: exposure correction"));
}
