use image::DynamicImage;

/// Selection rectangles smaller than this on either side are treated as an
/// accidental tap and leave the image uncropped.
const MIN_CROP_PX: u32 = 10;

/// A rectangle dragged over a letterboxed, zoomable image view, together with
/// the view geometry needed to map it back onto bitmap pixels.
///
/// The image is assumed drawn fit-to-view (uniform scale, centered), then
/// scaled by `zoom` and translated by `pan` in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSelection {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub view_size: (f32, f32),
    pub zoom: f32,
    pub pan: (f32, f32),
}

/// Map the selection from view coordinates to bitmap coordinates and crop.
///
/// Out-of-bounds selections clamp to the image; degenerate selections return
/// the original unchanged.
pub fn crop_to_selection(img: &DynamicImage, sel: &CropSelection) -> DynamicImage {
    let (view_w, view_h) = sel.view_size;
    if view_w <= 0.0 || view_h <= 0.0 {
        return img.clone();
    }

    let img_w = img.width() as f32;
    let img_h = img.height() as f32;

    // Fit-to-view base transform: uniform scale, centered letterbox.
    let base_scale = (view_w / img_w).min(view_h / img_h);
    let drawn_w = img_w * base_scale;
    let drawn_h = img_h * base_scale;
    let base_x = (view_w - drawn_w) / 2.0;
    let base_y = (view_h - drawn_h) / 2.0;
    let total_scale = base_scale * sel.zoom;

    let left_view = sel.start.0.min(sel.end.0);
    let top_view = sel.start.1.min(sel.end.1);
    let right_view = sel.start.0.max(sel.end.0);
    let bottom_view = sel.start.1.max(sel.end.1);

    let left = ((left_view - base_x - sel.pan.0) / total_scale).clamp(0.0, img_w);
    let top = ((top_view - base_y - sel.pan.1) / total_scale).clamp(0.0, img_h);
    let right = ((right_view - base_x - sel.pan.0) / total_scale).clamp(0.0, img_w);
    let bottom = ((bottom_view - base_y - sel.pan.1) / total_scale).clamp(0.0, img_h);

    let crop_w = (right - left) as u32;
    let crop_h = (bottom - top) as u32;
    if crop_w < MIN_CROP_PX || crop_h < MIN_CROP_PX {
        return img.clone();
    }

    let safe_left = (left as u32).min(img.width().saturating_sub(1));
    let safe_top = (top as u32).min(img.height().saturating_sub(1));
    let safe_w = crop_w.min(img.width() - safe_left);
    let safe_h = crop_h.min(img.height() - safe_top);

    img.crop_imm(safe_left, safe_top, safe_w, safe_h)
}
