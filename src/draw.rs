//! Software rendering helpers over an RGBA frame buffer.

pub type Color = (u8, u8, u8, u8);

pub fn clear(frame: &mut [u8], (r, g, b, a): Color) {
    for px in frame.chunks_exact_mut(4) {
        px[0] = r;
        px[1] = g;
        px[2] = b;
        px[3] = a;
    }
}

pub fn blend_pixel(frame: &mut [u8], fw: u32, fh: u32, x: i32, y: i32, (r, g, b, a): Color) {
    if x < 0 || y < 0 || x >= fw as i32 || y >= fh as i32 {
        return;
    }
    let idx = ((y as u32 * fw + x as u32) * 4) as usize;
    if idx + 3 >= frame.len() {
        return;
    }
    let ar = a as u16;
    let iar = (255 - a) as u16;
    frame[idx] = ((r as u16 * ar + frame[idx] as u16 * iar) / 255) as u8;
    frame[idx + 1] = ((g as u16 * ar + frame[idx + 1] as u16 * iar) / 255) as u8;
    frame[idx + 2] = ((b as u16 * ar + frame[idx + 2] as u16 * iar) / 255) as u8;
    frame[idx + 3] = 255;
}

// Clipping happens per pixel, so callers may pass partially off-field rects.
pub fn fill_rect(frame: &mut [u8], fw: u32, fh: u32, x: i32, y: i32, w: i32, h: i32, col: Color) {
    for py in y..y + h {
        for px in x..x + w {
            blend_pixel(frame, fw, fh, px, py, col);
        }
    }
}

pub fn stroke_rect(frame: &mut [u8], fw: u32, fh: u32, x: i32, y: i32, w: i32, h: i32, col: Color) {
    if w <= 0 || h <= 0 {
        return;
    }
    for px in x..x + w {
        blend_pixel(frame, fw, fh, px, y, col);
        blend_pixel(frame, fw, fh, px, y + h - 1, col);
    }
    for py in y..y + h {
        blend_pixel(frame, fw, fh, x, py, col);
        blend_pixel(frame, fw, fh, x + w - 1, py, col);
    }
}

fn glyph_5x7(ch: char) -> Option<[u8; 7]> {
    let c = ch.to_ascii_uppercase();
    Some(match c {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001, 0b10001],
        'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b10010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        ' ' => [0b00000; 7],
        _ => return None,
    })
}

fn draw_char(frame: &mut [u8], fw: u32, fh: u32, ch: char, x: i32, y: i32, scale: i32, col: Color) -> i32 {
    if let Some(rows) = glyph_5x7(ch) {
        for (ry, row) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (row >> (4 - rx)) & 1 == 1 {
                    fill_rect(
                        frame,
                        fw,
                        fh,
                        x + rx * scale,
                        y + ry as i32 * scale,
                        scale,
                        scale,
                        col,
                    );
                }
            }
        }
    }
    // glyph cell plus one column of spacing, even for unknown characters
    6 * scale
}

pub fn draw_text(frame: &mut [u8], fw: u32, fh: u32, text: &str, x: i32, y: i32, scale: i32, col: Color) {
    let mut cx = x;
    for ch in text.chars() {
        cx += draw_char(frame, fw, fh, ch, cx, y, scale, col);
    }
}

pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * 6 * scale
}

/// Bar chart of the most recent values that fit the given area.
pub fn draw_chart(frame: &mut [u8], fw: u32, fh: u32, x: i32, y: i32, w: i32, h: i32, data: &[u32]) {
    stroke_rect(frame, fw, fh, x, y, w, h, (200, 200, 200, 120));
    let max_val = data.iter().copied().max().unwrap_or(0);
    if max_val == 0 {
        return;
    }
    let bars = data.len().min(w as usize / 6).max(1) as i32;
    let bar_w = (w / bars).max(2);
    for i in 0..bars {
        let v = data[data.len() - bars as usize + i as usize];
        let bh = (v * (h as u32 - 2) / max_val) as i32;
        let bx = x + 1 + i * bar_w;
        let by = y + h - 1 - bh;
        fill_rect(frame, fw, fh, bx, by, bar_w - 1, bh, (120, 180, 255, 160));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_draws_are_clipped() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        fill_rect(&mut frame, 8, 8, -4, -4, 20, 20, (255, 255, 255, 255));
        draw_text(&mut frame, 8, 8, "SCORE", -10, 2, 2, (255, 0, 0, 255));
        draw_chart(&mut frame, 8, 8, 4, 4, 10, 10, &[1, 2, 3]);
        assert!(frame.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn opaque_fill_overwrites_and_text_advances() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        fill_rect(&mut frame, 4, 4, 0, 0, 4, 4, (10, 20, 30, 255));
        assert_eq!(&frame[0..4], &[10, 20, 30, 255]);
        assert_eq!(text_width("ALIVE: 3/4", 2), 10 * 12);
    }
}
