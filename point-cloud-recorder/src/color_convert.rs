//! YUY2 to BGRA conversion using integer BT.601 coefficients.

/// Convert packed `Y0 U Y1 V` macropixels into BGRA.
/// `bgra` must hold two BGRA pixels per YUY2 macropixel.
pub fn yuy2_to_bgra(yuy2: &[u8], bgra: &mut [u8]) {
    for (src, dst) in yuy2.chunks_exact(4).zip(bgra.chunks_exact_mut(8)) {
        let (y0, u, y1, v) = (src[0], src[1], src[2], src[3]);
        write_pixel(&mut dst[..4], y0, u, v);
        write_pixel(&mut dst[4..], y1, u, v);
    }
}

fn write_pixel(dst: &mut [u8], y: u8, u: u8, v: u8) {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    dst[0] = clamp_channel((298 * c + 516 * d + 128) >> 8);
    dst[1] = clamp_channel((298 * c - 100 * d - 208 * e + 128) >> 8);
    dst[2] = clamp_channel((298 * c + 409 * e + 128) >> 8);
    dst[3] = u8::MAX;
}

fn clamp_channel(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}
