use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(0, 200), 0);
}

#[test]
fn over_opaque_src_replaces_dst() {
    assert_eq!(over_premul([1, 2, 3, 255], [9, 8, 7, 255]), [9, 8, 7, 255]);
    assert_eq!(over_premul([1, 2, 3, 255], [9, 8, 7, 0]), [1, 2, 3, 255]);
}

#[test]
fn over_half_alpha_mixes() {
    let out = over_premul([0, 0, 200, 255], [128, 0, 0, 128]);
    assert_eq!(out[0], 128);
    assert_eq!(out[2], 100);
    assert_eq!(out[3], 255);
}

#[test]
fn premultiply_scales_color_by_alpha() {
    let mut px = vec![255u8, 100, 0, 128];
    premultiply_in_place(&mut px);
    assert_eq!(px, vec![128, 50, 0, 128]);
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_premul_in_place(&mut dst, &[0u8; 4]).is_err());
}
