use super::*;

fn write_png(name: &str, w: u32, h: u32, px: [u8; 4]) -> String {
    let path = std::env::temp_dir().join(format!("clipreel_{name}_{}.png", std::process::id()));
    image::RgbaImage::from_pixel(w, h, image::Rgba(px))
        .save(&path)
        .unwrap();
    path.to_string_lossy().into_owned()
}

fn canvas() -> Canvas {
    Canvas {
        width: 4,
        height: 4,
    }
}

#[test]
fn fitted_size_follows_resize_mode() {
    // 2:1 image into a square.
    assert_eq!(
        fitted_size(ResizeMode::Contain, 200.0, 100.0, 100.0, 100.0, 1.0),
        (100.0, 50.0)
    );
    assert_eq!(
        fitted_size(ResizeMode::Cover, 200.0, 100.0, 100.0, 100.0, 1.0),
        (200.0, 100.0)
    );
    assert_eq!(
        fitted_size(ResizeMode::Stretch, 200.0, 100.0, 100.0, 100.0, 2.0),
        (200.0, 200.0)
    );
}

#[test]
fn loaded_images_are_premultiplied() {
    let path = write_png("premul", 1, 1, [200, 100, 0, 128]);
    let img = load_premul_image(&path).unwrap();
    assert_eq!(img.data, vec![100, 50, 0, 128]);
    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_image_is_an_error() {
    assert!(load_premul_image("/definitely/not/here.png").is_err());
}

#[test]
fn stretched_image_fills_canvas_at_start() {
    let path = write_png("stretch", 2, 1, [0, 255, 0, 255]);
    let layer = ImageLayer {
        path: path.clone(),
        resize_mode: Some(ResizeMode::Stretch),
        ..ImageLayer::default()
    };
    let mut src = ImageLayerSource::new(&layer, canvas()).unwrap();
    let mut frame = vec![0u8; 4 * 4 * 4];
    src.draw(&mut frame, 0.0, 0.0).unwrap();
    assert!(frame.chunks_exact(4).all(|p| p == [0, 255, 0, 255]));
    let _ = std::fs::remove_file(path);
}

#[test]
fn contain_blur_leaves_no_transparent_pixels() {
    let path = write_png("blur", 4, 1, [0, 0, 255, 255]);
    let layer = ImageLayer {
        path: path.clone(),
        ..ImageLayer::default()
    };
    let mut src = ImageLayerSource::new(&layer, canvas()).unwrap();
    let mut frame = vec![0u8; 4 * 4 * 4];
    src.draw(&mut frame, 0.5, 0.0).unwrap();
    assert!(frame.chunks_exact(4).all(|p| p[3] == 255));
    let _ = std::fs::remove_file(path);
}

#[test]
fn overlay_is_placed_by_relative_width() {
    let path = write_png("overlay", 1, 1, [255, 0, 0, 255]);
    let layer = ImageOverlayLayer {
        path: path.clone(),
        width: Some(0.5),
        ..ImageOverlayLayer::default()
    };
    let mut src = ImageOverlaySource::new(&layer, canvas()).unwrap();
    let mut frame = vec![0u8; 4 * 4 * 4];
    src.draw(&mut frame, 0.0, 0.0).unwrap();
    let at = |x: usize, y: usize| &frame[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
    assert_eq!(at(1, 1), &[255, 0, 0, 255]);
    assert_eq!(at(2, 2), &[255, 0, 0, 255]);
    assert_eq!(at(0, 0), &[0, 0, 0, 0]);
    assert_eq!(at(3, 3), &[0, 0, 0, 0]);
    let _ = std::fs::remove_file(path);
}
