use std::io::Cursor;
use std::sync::Arc;

use fragsim::{
    compare_surfaces, decode_surface, CompareOptions, ExecutionMode, PipelineError,
    FRAGMENT_COUNT, GRID_DIM,
};

fn encode_png(img: image::RgbImage) -> Vec<u8> {
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode png");
    png
}

#[test]
fn png_bytes_through_full_pipeline() -> Result<(), PipelineError> {
    let reference = encode_png(image::RgbImage::from_fn(120, 90, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    }));
    let uploaded = encode_png(image::RgbImage::from_pixel(
        120,
        90,
        image::Rgb([60, 60, 60]),
    ));

    let reference = Arc::new(decode_surface(&reference)?);
    let uploaded = Arc::new(decode_surface(&uploaded)?);

    let result = compare_surfaces(
        &reference,
        &uploaded,
        ExecutionMode::MultiThread,
        &CompareOptions::default(),
    )?;

    assert!(result.total_score >= 0.0 && result.total_score <= 100.0);
    for row in 0..GRID_DIM {
        for col in 0..GRID_DIM {
            let cell = result.matrix.cell(row, col);
            assert!((0.0..=1.0).contains(&cell), "cell out of range: {cell}");
        }
    }
    Ok(())
}

#[test]
fn jpeg_and_png_encodings_of_one_image_score_high() -> Result<(), PipelineError> {
    // Lossy re-encoding shifts individual pixels but barely moves the
    // per-fragment histograms, so the score should stay near perfect.
    let img = image::RgbImage::from_fn(128, 128, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let png = encode_png(img.clone());
    let mut jpeg = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .expect("encode jpeg");

    let a = Arc::new(decode_surface(&png)?);
    let b = Arc::new(decode_surface(&jpeg)?);
    let result = compare_surfaces(
        &a,
        &b,
        ExecutionMode::SingleThread,
        &CompareOptions::default(),
    )?;

    assert!(result.total_score > 60.0, "score: {}", result.total_score);
    Ok(())
}

#[test]
fn tiny_images_run_without_error() -> Result<(), PipelineError> {
    // 3x3 is below the 4x4 grid, so every fragment is degenerate and
    // every cell reports zero similarity.
    let tiny = encode_png(image::RgbImage::from_pixel(3, 3, image::Rgb([1, 2, 3])));
    let surface = Arc::new(decode_surface(&tiny)?);

    for mode in [ExecutionMode::SingleThread, ExecutionMode::MultiThread] {
        let result = compare_surfaces(&surface, &surface, mode, &CompareOptions::default())?;
        assert_eq!(result.total_score, 0.0);
    }
    Ok(())
}

#[test]
fn mismatched_dimensions_are_compared_per_fragment() -> Result<(), PipelineError> {
    // The grid normalizes dimensions away: a solid image matches its
    // differently sized solid counterpart perfectly.
    let small = encode_png(image::RgbImage::from_pixel(40, 40, image::Rgb([9, 9, 9])));
    let large = encode_png(image::RgbImage::from_pixel(
        400,
        100,
        image::Rgb([9, 9, 9]),
    ));

    let small = Arc::new(decode_surface(&small)?);
    let large = Arc::new(decode_surface(&large)?);
    let result = compare_surfaces(
        &small,
        &large,
        ExecutionMode::MultiThread,
        &CompareOptions::default(),
    )?;

    assert_eq!(result.total_score, 100.0);
    Ok(())
}

#[test]
fn fragment_count_is_the_full_grid() {
    assert_eq!(FRAGMENT_COUNT, GRID_DIM * GRID_DIM);
}
