//! Both backends against the same operation chains.
//!
//! Geometry comes from the shared calculator, so every chain must end at the
//! same size whichever backend does the pixel work. Pixels are compared where
//! the backends share an algorithm (right-angle rotation, crops) and loosely
//! where they resample differently.
//!
//! Run with: cargo test --test compare_backends

use image::{DynamicImage, GenericImageView, ImageFormat as EncodedFormat, Rgb, RgbImage};
use simple_thumb::imaging::{
    Dimensions, FastBackend, ImageBackend, ImageFormat, Options, RustBackend, ThumbError,
    Thumbnail,
};
use simple_thumb::recipe::{apply_recipe, parse_recipe};
use std::io::Cursor;

/// Smooth gradient, kept under 256px so channels never wrap.
fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 96])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), EncodedFormat::Png)
        .unwrap();
    bytes
}

fn run_chain<B: ImageBackend>(backend: B, source: &[u8], recipe: &[&str]) -> Thumbnail<B> {
    let mut thumb = Thumbnail::from_bytes(source, Options::default(), backend).unwrap();
    apply_recipe(&mut thumb, &parse_recipe(recipe).unwrap()).unwrap();
    thumb
}

fn decode(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap()
}

fn mean_abs_diff(a: &DynamicImage, b: &DynamicImage) -> f64 {
    let (a, b) = (a.to_rgb8(), b.to_rgb8());
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.as_raw().len() as f64
}

const CHAINS: &[&[&str]] = &[
    &["resize=100x0"],
    &["resize=0x60", "percent=50"],
    &["adaptive=64x64"],
    &["adaptive=90x30", "rotate=90"],
    &["crop=-10,20,80x300"],
    &["center=50", "rotate=270"],
    &["resize=120x80", "adaptive=40x40", "background=#fff@50"],
];

#[test]
fn backends_agree_on_geometry() {
    for (w, h) in [(240, 120), (120, 240), (200, 200), (7, 199)] {
        let source = gradient_png(w, h);
        for recipe in CHAINS {
            let rust = run_chain(RustBackend::new(), &source, recipe);
            let fast = run_chain(FastBackend::new(), &source, recipe);
            assert_eq!(
                rust.dimensions(),
                fast.dimensions(),
                "{w}x{h} {recipe:?}"
            );
        }
    }
}

#[test]
fn encoded_output_matches_geometry() {
    let source = gradient_png(240, 120);
    for recipe in CHAINS {
        let rust = run_chain(RustBackend::new(), &source, recipe);
        let fast = run_chain(FastBackend::new(), &source, recipe);
        for (name, bytes, expected) in [
            ("rust", rust.to_bytes().unwrap(), rust.dimensions()),
            ("fast", fast.to_bytes().unwrap(), fast.dimensions()),
        ] {
            let out = decode(&bytes);
            assert_eq!(
                Dimensions::new(out.width(), out.height()),
                expected,
                "{name} {recipe:?}"
            );
        }
    }
}

#[test]
fn adaptive_hits_exact_target_on_both() {
    let source = gradient_png(300, 100);
    for recipe in [["adaptive=100x10"], ["adaptive=10x100"], ["adaptive=99x33"]] {
        let rust = run_chain(RustBackend::new(), &source, &recipe);
        let fast = run_chain(FastBackend::new(), &source, &recipe);
        let expected = match recipe[0] {
            "adaptive=100x10" => Dimensions::new(100, 10),
            "adaptive=10x100" => Dimensions::new(10, 100),
            _ => Dimensions::new(99, 33),
        };
        assert_eq!(rust.dimensions(), expected);
        assert_eq!(fast.dimensions(), expected);
    }
}

#[test]
fn right_angle_rotation_is_pixel_identical() {
    let source = gradient_png(60, 30);
    let rust = run_chain(RustBackend::new(), &source, &["rotate=90", "crop=5,5,20x40"]);
    let fast = run_chain(FastBackend::new(), &source, &["rotate=90", "crop=5,5,20x40"]);
    let (a, b) = (rust.image().to_rgb8(), fast.image().to_rgb8());
    assert_eq!(a.dimensions(), (20, 40));
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn resampled_output_is_close() {
    let source = gradient_png(240, 160);
    let rust = run_chain(RustBackend::new(), &source, &["resize=120x0"]);
    let fast = run_chain(FastBackend::new(), &source, &["resize=120x0"]);
    let diff = mean_abs_diff(rust.image(), fast.image());
    assert!(diff < 8.0, "mean channel difference {diff:.2}");
}

#[test]
fn only_fast_backend_rotates_arbitrary_angles() {
    let source = gradient_png(80, 40);

    let mut rust = Thumbnail::from_bytes(&source, Options::default(), RustBackend::new()).unwrap();
    assert!(matches!(rust.rotate(30.0), Err(ThumbError::Resource(_))));
    assert_eq!(rust.dimensions(), Dimensions::new(80, 40));

    let mut fast = Thumbnail::from_bytes(&source, Options::default(), FastBackend::new()).unwrap();
    fast.rotate(30.0).unwrap();
    assert_eq!(fast.dimensions(), Dimensions::new(40, 80));
    assert_eq!(fast.image().dimensions(), (40, 80));
}

#[test]
fn both_backends_save_every_format() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = gradient_png(90, 60);
    for format in ImageFormat::ALL {
        let rust = run_chain(RustBackend::new(), &source, &["adaptive=30x30"]);
        let fast = run_chain(FastBackend::new(), &source, &["adaptive=30x30"]);
        let rust_path = tmp.path().join(format!("rust.{}", format.extension()));
        let fast_path = tmp.path().join(format!("fast.{}", format.extension()));
        rust.save(&rust_path).unwrap();
        fast.save(&fast_path).unwrap();
        for path in [rust_path, fast_path] {
            let out = image::open(&path).unwrap();
            assert_eq!((out.width(), out.height()), (30, 30), "{}", path.display());
        }
    }
}
