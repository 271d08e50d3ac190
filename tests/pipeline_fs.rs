//! End-to-end runs of the pipeline against a local directory store with the
//! real `image` codec.
//!
//! Each test lays out a bucket directory in a temp root, feeds the dispatcher
//! an S3-shaped event, and inspects the files written to the destination
//! bucket directory.

use bucket_thumbs::config::PipelineConfig;
use bucket_thumbs::dispatch::{Dispatcher, PipelineError};
use bucket_thumbs::event::S3Event;
use bucket_thumbs::imaging::RustCodec;
use bucket_thumbs::outcome::{InvocationOutcome, SkipReason, Stage, VariantStatus};
use bucket_thumbs::store::FsStore;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 40, (y % 256) as u8, 180])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

fn put_source(root: &Path, bucket: &str, key: &str, bytes: &[u8]) {
    let path = root.join(bucket).join(key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn dispatcher(root: &Path, sizes: Vec<u32>) -> Dispatcher<RustCodec> {
    let mut config = PipelineConfig::default();
    config.variants.sizes = sizes;
    Dispatcher::new(
        Arc::new(RustCodec::new()),
        Arc::new(FsStore::new(root)),
        config,
    )
}

fn dimensions_of(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

#[tokio::test]
async fn jpeg_fans_out_into_every_size() {
    let tmp = TempDir::new().unwrap();
    put_source(tmp.path(), "photos", "sunset.jpg", &gradient_jpeg(400, 300));

    let outcome = dispatcher(tmp.path(), vec![30, 60, 120])
        .handle(&S3Event::for_object("photos", "sunset.jpg"))
        .await
        .unwrap();

    assert!(matches!(outcome, InvocationOutcome::Success { .. }), "{outcome:?}");

    let dest = tmp.path().join("photos-resized");
    assert_eq!(dimensions_of(&dest.join("30_sunset.jpg")), (40, 30));
    assert_eq!(dimensions_of(&dest.join("60_sunset.jpg")), (80, 60));
    assert_eq!(dimensions_of(&dest.join("120_sunset.jpg")), (160, 120));

    // Output keeps the source format
    let bytes = fs::read(dest.join("60_sunset.jpg")).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

    // Source untouched
    assert!(tmp.path().join("photos/sunset.jpg").exists());
}

#[tokio::test]
async fn png_portrait_keeps_format_and_alpha() {
    let tmp = TempDir::new().unwrap();
    put_source(tmp.path(), "uploads", "art/portrait.png", &gradient_png(90, 160));

    let outcome = dispatcher(tmp.path(), vec![45])
        .handle(&S3Event::for_object("uploads", "art/portrait.png"))
        .await
        .unwrap();

    assert!(!outcome.is_failure());
    let path = tmp.path().join("uploads-resized/45_art/portrait.png");
    assert_eq!(dimensions_of(&path), (45, 80));

    let img = image::open(&path).unwrap();
    assert!(img.color().has_alpha());
}

#[tokio::test]
async fn extreme_aspect_ratio_fails_only_the_oversized_variant() {
    let tmp = TempDir::new().unwrap();
    put_source(tmp.path(), "photos", "strip.png", &gradient_png(1, 20_000));

    let outcome = dispatcher(tmp.path(), vec![4, 1024])
        .handle(&S3Event::for_object("photos", "strip.png"))
        .await
        .unwrap();

    assert!(
        matches!(outcome, InvocationOutcome::PartialFailure { .. }),
        "{outcome:?}"
    );
    let failed: Vec<_> = outcome.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].key, "1024_strip.png");
    assert!(matches!(
        failed[0].status,
        VariantStatus::Failed {
            stage: Stage::Resize,
            ..
        }
    ));

    let dest = tmp.path().join("photos-resized");
    assert_eq!(dimensions_of(&dest.join("4_strip.png")), (4, 80_000));
    assert!(!dest.join("1024_strip.png").exists());
}

#[tokio::test]
async fn rerun_overwrites_outputs() {
    let tmp = TempDir::new().unwrap();
    put_source(tmp.path(), "photos", "a.jpg", &gradient_jpeg(200, 100));
    let dispatcher = dispatcher(tmp.path(), vec![50]);
    let event = S3Event::for_object("photos", "a.jpg");

    dispatcher.handle(&event).await.unwrap();
    dispatcher.handle(&event).await.unwrap();

    let entries: Vec<_> = fs::read_dir(tmp.path().join("photos-resized"))
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn unsupported_upload_is_skipped_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    put_source(tmp.path(), "photos", "clip.mov", b"not an image");

    let outcome = dispatcher(tmp.path(), vec![50])
        .handle(&S3Event::for_object("photos", "clip.mov"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        InvocationOutcome::Skipped {
            reason: SkipReason::UnsupportedType { .. },
            ..
        }
    ));
    assert!(!tmp.path().join("photos-resized").exists());
}

#[tokio::test]
async fn corrupt_source_is_decode_failure() {
    let tmp = TempDir::new().unwrap();
    put_source(tmp.path(), "photos", "broken.jpg", b"\xFF\xD8 truncated");

    let err = dispatcher(tmp.path(), vec![50])
        .handle(&S3Event::for_object("photos", "broken.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::DecodeFailed { .. }));
    assert!(!tmp.path().join("photos-resized").exists());
}

#[tokio::test]
async fn missing_source_is_fetch_failure() {
    let tmp = TempDir::new().unwrap();

    let err = dispatcher(tmp.path(), vec![50])
        .handle(&S3Event::for_object("photos", "gone.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::FetchFailed { .. }));
}
