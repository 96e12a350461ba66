// -----------------------------------------------------------------------------
// Rasterization & blending
// -----------------------------------------------------------------------------
use super::geom::disc_bbox_px;
use super::{ImageStack, Plane, RgbPlane};

/// Coverage-weighted "over" blend of a single intensity.
#[inline]
pub(crate) fn blend_over(dst: &mut f32, src: f32, coverage: f32) {
    if coverage <= 0.0 { return; }
    if coverage >= 1.0 {
        *dst = src;
        return;
    }
    *dst += (src - *dst) * coverage;
}

/// Fraction of the pixel centred at distance `d` covered by a disc of radius `r`,
/// approximated by a one-pixel linear ramp across the rim.
#[inline]
fn rim_coverage(d: f64, r: f64) -> f32 {
    (r + 0.5 - d).clamp(0.0, 1.0) as f32
}

/// Fills a disc centred at (`cx`, `cy`) with `value`, anti-aliased at the rim.
/// Pixel (x, y) is sampled at its integer coordinates.
pub(crate) fn fill_disc_over(canvas: &mut Plane, cx: f64, cy: f64, radius: f64, value: f32) {
    let bbox = disc_bbox_px(cx, cy, radius, canvas.width(), canvas.height());
    if bbox.is_empty() { return; }

    let w = canvas.width();
    let data = canvas.data_mut();
    for y in bbox.y..bbox.y + bbox.h {
        let dy = y as f64 - cy;
        let row = &mut data[y * w..(y + 1) * w];
        for x in bbox.x..bbox.x + bbox.w {
            let dx = x as f64 - cx;
            let d = (dx * dx + dy * dy).sqrt();
            blend_over(&mut row[x], value, rim_coverage(d, radius));
        }
    }
}

/// One-pixel circle outline: every pixel whose centre lies within half a pixel
/// of the circle is painted `color`.
pub(crate) fn stroke_circle(canvas: &mut RgbPlane, cx: f64, cy: f64, radius: f64, color: [f32; 3]) {
    let bbox = disc_bbox_px(cx, cy, radius, canvas.width(), canvas.height());
    if bbox.is_empty() { return; }

    for y in bbox.y..bbox.y + bbox.h {
        let dy = y as f64 - cy;
        for x in bbox.x..bbox.x + bbox.w {
            let dx = x as f64 - cx;
            let d = (dx * dx + dy * dy).sqrt();
            if (d - radius).abs() <= 0.5 {
                canvas.set(x, y, color);
            }
        }
    }
}

/// Copy of `plane` with `pad` pixels of `fill` added on every side.
pub(crate) fn pad_plane(plane: &Plane, pad: usize, fill: f32) -> Plane {
    if pad == 0 {
        return plane.clone();
    }
    let (w, h) = (plane.width(), plane.height());
    let out_w = w + 2 * pad;
    let mut out = Plane::filled(out_w, h + 2 * pad, fill);
    let src = plane.data();
    let dst = out.data_mut();
    for y in 0..h {
        let d0 = (y + pad) * out_w + pad;
        dst[d0..d0 + w].copy_from_slice(&src[y * w..(y + 1) * w]);
    }
    out
}

/// Pads every slice of `stack` (spatial axes only; depth is unchanged).
pub(crate) fn pad_stack(stack: &ImageStack, pad: usize, fill: f32) -> ImageStack {
    let planes = stack.planes().iter().map(|p| pad_plane(p, pad, fill)).collect();
    ImageStack::from_planes_unchecked(stack.width() + 2 * pad, stack.height() + 2 * pad, planes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_over_respects_coverage() {
        let mut v = 0.2;
        blend_over(&mut v, 1.0, 0.0);
        assert_eq!(v, 0.2);
        blend_over(&mut v, 1.0, 0.5);
        assert!((v - 0.6).abs() < 1e-6);
        blend_over(&mut v, 0.0, 1.0);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn disc_is_solid_inside_and_untouched_far_away() {
        let mut p = Plane::filled(21, 21, 0.0);
        fill_disc_over(&mut p, 10.0, 10.0, 5.0, 1.0);
        assert_eq!(p.get(10, 10), 1.0);
        assert_eq!(p.get(13, 10), 1.0);
        assert_eq!(p.get(0, 0), 0.0);
        assert_eq!(p.get(17, 10), 0.0);
        // rim pixel exactly on the radius is half covered
        assert!((p.get(15, 10) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn disc_partially_off_canvas_does_not_panic() {
        let mut p = Plane::filled(8, 8, 0.0);
        fill_disc_over(&mut p, -1.0, 7.5, 3.0, 1.0);
        assert_eq!(p.get(0, 7), 1.0);
        fill_disc_over(&mut p, 100.0, 100.0, 3.0, 1.0);
    }

    #[test]
    fn outline_marks_only_the_rim() {
        let mut rgb = RgbPlane::from_gray(&Plane::filled(21, 21, 0.0));
        stroke_circle(&mut rgb, 10.0, 10.0, 5.0, [1.0, 0.0, 0.0]);
        assert_eq!(rgb.get(15, 10), [1.0, 0.0, 0.0]);
        assert_eq!(rgb.get(10, 5), [1.0, 0.0, 0.0]);
        assert_eq!(rgb.get(10, 10), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn padding_grows_each_spatial_axis_by_twice_the_pad() {
        let mut p = Plane::filled(3, 2, 0.7);
        p.set(2, 1, 0.9);
        let stack = ImageStack::from_planes(vec![p.clone(), p]).unwrap();
        let padded = pad_stack(&stack, 2, 0.1);

        assert_eq!(padded.depth(), 2);
        assert_eq!(padded.width(), 7);
        assert_eq!(padded.height(), 6);
        let s = padded.plane(1);
        for x in 0..7 {
            assert_eq!(s.get(x, 0), 0.1);
            assert_eq!(s.get(x, 5), 0.1);
        }
        for y in 0..6 {
            assert_eq!(s.get(0, y), 0.1);
            assert_eq!(s.get(6, y), 0.1);
        }
        assert_eq!(s.get(2, 2), 0.7);
        assert_eq!(s.get(4, 3), 0.9);
    }
}
