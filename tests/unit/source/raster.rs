use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> PremulImage {
    PremulImage::new(w, h, px.repeat((w * h) as usize)).unwrap()
}

#[test]
fn image_length_is_checked() {
    assert!(PremulImage::new(2, 2, vec![0; 15]).is_err());
    assert!(PremulImage::new(0, 2, vec![]).is_err());
}

#[test]
fn draw_fills_only_the_rect() {
    let mut canvas = vec![0u8; 4 * 4 * 4];
    let red = solid(1, 1, [255, 0, 0, 255]);
    draw_image(
        &mut canvas,
        4,
        4,
        &red,
        DrawRect {
            x: 1.0,
            y: 1.0,
            w: 2.0,
            h: 2.0,
        },
        1.0,
    )
    .unwrap();
    let at = |x: usize, y: usize| &canvas[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
    assert_eq!(at(0, 0), &[0, 0, 0, 0]);
    assert_eq!(at(1, 1), &[255, 0, 0, 255]);
    assert_eq!(at(2, 2), &[255, 0, 0, 255]);
    assert_eq!(at(3, 3), &[0, 0, 0, 0]);
}

#[test]
fn draw_clips_outside_canvas() {
    let mut canvas = vec![0u8; 2 * 2 * 4];
    let blue = solid(1, 1, [0, 0, 255, 255]);
    draw_image(
        &mut canvas,
        2,
        2,
        &blue,
        DrawRect {
            x: -10.0,
            y: -10.0,
            w: 100.0,
            h: 100.0,
        },
        1.0,
    )
    .unwrap();
    assert!(canvas.chunks_exact(4).all(|p| p == [0, 0, 255, 255]));
}

#[test]
fn opacity_scales_premultiplied_source() {
    let mut canvas = vec![0u8; 4];
    let white = solid(1, 1, [255, 255, 255, 255]);
    draw_image(
        &mut canvas,
        1,
        1,
        &white,
        DrawRect {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        },
        0.5,
    )
    .unwrap();
    assert_eq!(canvas, vec![128, 128, 128, 128]);
}

#[test]
fn resize_keeps_solid_color() {
    let img = solid(3, 2, [10, 20, 30, 255]);
    let out = resize(&img, 7, 5).unwrap();
    assert_eq!((out.width, out.height), (7, 5));
    assert!(out.data.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
}

#[test]
fn blurred_cover_fills_the_target() {
    let img = solid(4, 2, [50, 60, 70, 255]);
    let out = blurred_cover(&img, 32, 32).unwrap();
    assert_eq!(out.data.len(), 32 * 32 * 4);
    assert!(out.data.chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn blur_radius_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    assert_eq!(blur_rgba8_premul(&src, 1, 2, 0, 1.0).unwrap(), src);
}

#[test]
fn blur_constant_image_is_identity() {
    let src = [10u8, 20, 30, 40].repeat(12);
    assert_eq!(blur_rgba8_premul(&src, 4, 3, 3, 2.0).unwrap(), src);
}

#[test]
fn blur_spreads_energy_from_single_pixel() {
    let (w, h) = (5u32, 5u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((2 * w + 2) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = blur_rgba8_premul(&src, w, h, 2, 1.2).unwrap();
    assert!(out.chunks_exact(4).filter(|px| px[3] != 0).count() > 1);
    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 4);
}

#[test]
fn svg_rect_rasterizes() {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="#00ff00"/></svg>"##;
    let out = rasterize_svg(svg, 4, 4, &usvg::Options::default()).unwrap();
    assert!(out.chunks_exact(4).all(|p| p == [0, 255, 0, 255]));
}
