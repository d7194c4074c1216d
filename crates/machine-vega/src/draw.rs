//! Drawing primitives over the Vega-8 screen memory.
//!
//! Every primitive funnels through `plot`, which applies the camera offset,
//! the clip rectangle and the draw palette. Coordinates may land anywhere;
//! pixels outside the clip region are dropped silently.

use crate::font;
use crate::memory::VegaMemory;

/// Plot one pixel in world coordinates.
pub(crate) fn plot(mem: &mut VegaMemory, x: i32, y: i32, c: u8) {
    let (cam_x, cam_y) = mem.camera();
    let (x, y) = (x - cam_x, y - cam_y);
    let (x0, y0, x1, y1) = mem.clip();
    if x < x0 || y < y0 || x >= x1 || y >= y1 {
        return;
    }
    let c = mem.draw_pal(c);
    mem.set_screen_pixel(x, y, c);
}

/// Read one pixel in world coordinates. Off-screen reads return 0.
pub(crate) fn read(mem: &VegaMemory, x: i32, y: i32) -> u8 {
    let (cam_x, cam_y) = mem.camera();
    mem.screen_pixel(x - cam_x, y - cam_y)
}

/// Clear the screen to one colour and reset clip and cursor.
pub(crate) fn clear(mem: &mut VegaMemory, c: u8) {
    mem.set_clip(0, 0, crate::memory::SCREEN_W, crate::memory::SCREEN_H);
    mem.set_cursor(0, 0);
    let c = c & 0x0F;
    let byte = c | (c << 4);
    for y in 0..crate::memory::SCREEN_H {
        for x in 0..crate::memory::SCREEN_W / 2 {
            mem.poke(
                crate::memory::SCREEN_BASE + (y * crate::memory::SCREEN_W / 2 + x) as usize,
                byte,
            );
        }
    }
}

/// Rectangle outline, corners inclusive.
pub(crate) fn rect(mem: &mut VegaMemory, x0: i32, y0: i32, x1: i32, y1: i32, c: u8) {
    let (x0, x1) = (x0.min(x1), x0.max(x1));
    let (y0, y1) = (y0.min(y1), y0.max(y1));
    for x in x0..=x1 {
        plot(mem, x, y0, c);
        plot(mem, x, y1, c);
    }
    for y in y0..=y1 {
        plot(mem, x0, y, c);
        plot(mem, x1, y, c);
    }
}

/// Filled rectangle, corners inclusive.
pub(crate) fn rectfill(mem: &mut VegaMemory, x0: i32, y0: i32, x1: i32, y1: i32, c: u8) {
    let (x0, x1) = (x0.min(x1), x0.max(x1));
    let (y0, y1) = (y0.min(y1), y0.max(y1));
    for y in y0..=y1 {
        for x in x0..=x1 {
            plot(mem, x, y, c);
        }
    }
}

/// Line segment, endpoints inclusive (Bresenham).
pub(crate) fn line(mem: &mut VegaMemory, x0: i32, y0: i32, x1: i32, y1: i32, c: u8) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y) = (x0, y0);
    let mut err = dx + dy;
    loop {
        plot(mem, x, y, c);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Circle outline (midpoint algorithm).
pub(crate) fn circ(mem: &mut VegaMemory, cx: i32, cy: i32, r: i32, c: u8) {
    if r < 0 {
        return;
    }
    let mut x = r;
    let mut y = 0;
    let mut err = 1 - r;
    while x >= y {
        for (px, py) in [
            (cx + x, cy + y),
            (cx - x, cy + y),
            (cx + x, cy - y),
            (cx - x, cy - y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx + y, cy - x),
            (cx - y, cy - x),
        ] {
            plot(mem, px, py, c);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Filled circle.
pub(crate) fn circfill(mem: &mut VegaMemory, cx: i32, cy: i32, r: i32, c: u8) {
    if r < 0 {
        return;
    }
    for dy in -r..=r {
        // Widest run on this scanline still inside the circle
        let dx = ((r * r - dy * dy) as f64).sqrt() as i32;
        for x in (cx - dx)..=(cx + dx) {
            plot(mem, x, cy + dy, c);
        }
    }
}

/// Draw sprites `n..` as a `w` x `h` sprite block at (x, y).
///
/// Sprite colours pass through the draw palette; colours marked transparent
/// are skipped. `flip_x`/`flip_y` mirror the block.
pub(crate) fn spr(
    mem: &mut VegaMemory,
    n: i32,
    x: i32,
    y: i32,
    w: f64,
    h: f64,
    flip_x: bool,
    flip_y: bool,
) {
    let pw = (w * 8.0) as i32;
    let ph = (h * 8.0) as i32;
    let sheet_x = (n % 16) * 8;
    let sheet_y = (n / 16) * 8;
    for dy in 0..ph {
        for dx in 0..pw {
            let sx = if flip_x { pw - 1 - dx } else { dx };
            let sy = if flip_y { ph - 1 - dy } else { dy };
            let c = mem.sprite_pixel(sheet_x + sx, sheet_y + sy);
            if !mem.transparent(c) {
                plot(mem, x + dx, y + dy, c);
            }
        }
    }
}

/// Draw a block of map cells with their sprites.
///
/// `(cel_x, cel_y)` is the top-left map cell, `(sx, sy)` the screen position,
/// `(cel_w, cel_h)` the block size in cells. Cell 0 draws nothing.
pub(crate) fn map(
    mem: &mut VegaMemory,
    cel_x: i32,
    cel_y: i32,
    sx: i32,
    sy: i32,
    cel_w: i32,
    cel_h: i32,
) {
    for cy in 0..cel_h {
        for cx in 0..cel_w {
            let n = mem.map_cell(cel_x + cx, cel_y + cy);
            if n != 0 {
                spr(
                    mem,
                    i32::from(n),
                    sx + cx * 8,
                    sy + cy * 8,
                    1.0,
                    1.0,
                    false,
                    false,
                );
            }
        }
    }
}

/// Draw text with the builtin font, returning the cursor position after the
/// last glyph. Text goes through the native charset, so icon glyphs render
/// (as blocks) instead of splitting into stray bytes.
pub(crate) fn print(mem: &mut VegaMemory, text: &str, x: i32, y: i32, c: u8) -> (i32, i32) {
    let native = console_charset::encode(text);
    let (mut cx, mut cy) = (x, y);
    for b in native {
        if b == b'\n' {
            cx = x;
            cy += font::GLYPH_H;
            continue;
        }
        let shape = font::shape(b);
        for row in 0..5 {
            for col in 0..3 {
                if font::pixel(shape, col, row) {
                    plot(mem, cx + col, cy + row, c);
                }
            }
        }
        cx += font::GLYPH_W;
    }
    (cx, cy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::VegaMemory;

    fn mem() -> VegaMemory {
        let mut m = VegaMemory::new();
        m.reset_draw_state();
        m
    }

    #[test]
    fn test_plot_applies_camera_and_clip() {
        let mut m = mem();
        m.set_camera(10, 0);
        plot(&mut m, 15, 3, 7);
        assert_eq!(m.screen_pixel(5, 3), 7);
        // World coordinate that lands left of the clip window is dropped
        plot(&mut m, 5, 3, 7);
        assert_eq!(m.screen_pixel(-5, 3), 0);
        assert_eq!(read(&m, 15, 3), 7); // reads back through the camera
    }

    #[test]
    fn test_clip_drops_pixels() {
        let mut m = mem();
        m.set_clip(10, 10, 20, 20);
        plot(&mut m, 5, 5, 7);
        plot(&mut m, 15, 15, 7);
        assert_eq!(m.screen_pixel(5, 5), 0);
        assert_eq!(m.screen_pixel(15, 15), 7);
    }

    #[test]
    fn test_rectfill_normalizes_corners() {
        let mut m = mem();
        rectfill(&mut m, 4, 4, 2, 2, 9);
        for y in 2..=4 {
            for x in 2..=4 {
                assert_eq!(m.screen_pixel(x, y), 9);
            }
        }
    }

    #[test]
    fn test_spr_skips_transparent() {
        let mut m = mem();
        m.set_sprite_pixel(0, 0, 8); // sprite 0, opaque colour
        m.set_sprite_pixel(1, 0, 0); // colour 0 is transparent by default
        m.set_screen_pixel(1, 0, 5);
        spr(&mut m, 0, 0, 0, 1.0, 1.0, false, false);
        assert_eq!(m.screen_pixel(0, 0), 8);
        assert_eq!(m.screen_pixel(1, 0), 5); // untouched
    }

    #[test]
    fn test_spr_flip_x() {
        let mut m = mem();
        m.set_sprite_pixel(0, 0, 8);
        spr(&mut m, 0, 0, 0, 1.0, 1.0, true, false);
        assert_eq!(m.screen_pixel(7, 0), 8);
        assert_eq!(m.screen_pixel(0, 0), 0);
    }

    #[test]
    fn test_map_draws_cells_and_skips_zero(){
        let mut m = mem();
        m.set_sprite_pixel(8, 0, 3); // sprite 1, pixel (0,0)
        m.set_map_cell(0, 0, 1);
        m.set_map_cell(1, 0, 0);
        map(&mut m, 0, 0, 0, 0, 2, 1);
        assert_eq!(m.screen_pixel(0, 0), 3);
        // Cell 0 drew nothing over the second 8x8 block
        assert_eq!(m.screen_pixel(8, 0), 0);
    }

    #[test]
    fn test_print_advances_cursor() {
        let mut m = mem();
        let (cx, cy) = print(&mut m, "ab\nc", 0, 0, 7);
        assert_eq!((cx, cy), (4, 6));
        // Something was drawn on both lines
        assert!((0..8).any(|x| (0..5).any(|y| m.screen_pixel(x, y) == 7)));
        assert!((0..4).any(|x| (6..11).any(|y| m.screen_pixel(x, y) == 7)));
    }
}
