use eframe::egui::viewport::IconData;

// Generate a simple gallery app icon (warm gradient disc + white frame glyph)
pub fn generate_icon(size: u32) -> IconData {
    let w = size;
    let h = size;
    let mut rgba = vec![0u8; (w * h * 4) as usize];
    let cx = (w as f32) * 0.5;
    let cy = (h as f32) * 0.5;
    let radius = (w.min(h) as f32) * 0.45;

    // Picture-frame rectangle, with a small "photo corner" notch bottom-right
    let fx0 = w as f32 * 0.30;
    let fy0 = h as f32 * 0.32;
    let fx1 = w as f32 * 0.70;
    let fy1 = h as f32 * 0.68;
    let border = w as f32 * 0.035;

    for y in 0..h {
        for x in 0..w {
            let idx = ((y * w + x) * 4) as usize;

            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let in_circle = dist <= radius;
            let t = (dist / radius).min(1.0);
            // Teal gradient: inner brighter, outer darker
            let r = lerp(16.0, 6.0, t);
            let g = lerp(120.0, 58.0, t);
            let b = lerp(104.0, 44.0, t);

            rgba[idx] = if in_circle { r as u8 } else { 0 };
            rgba[idx + 1] = if in_circle { g as u8 } else { 0 };
            rgba[idx + 2] = if in_circle { b as u8 } else { 0 };
            rgba[idx + 3] = if in_circle { 255 } else { 0 };

            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let inside = px >= fx0 && px <= fx1 && py >= fy0 && py <= fy1;
            let inside_inner = px >= fx0 + border
                && px <= fx1 - border
                && py >= fy0 + border
                && py <= fy1 - border;
            // Diagonal "mountain" inside the frame
            let ridge = inside_inner && py >= fy1 - border - (px - fx0).min(fx1 - px) * 0.6;
            if in_circle && (inside && !inside_inner || ridge) {
                rgba[idx] = 245;
                rgba[idx + 1] = 243;
                rgba[idx + 2] = 235;
                rgba[idx + 3] = 255;
            }
        }
    }

    IconData {
        rgba,
        width: w,
        height: h,
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
