//! Annotated output frames. Side effects only; nothing in the detection
//! contract depends on these images.

use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use stitch_proto::NamedColor;

use crate::{Frame, Mask};

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

/// Copy the frame and trace the garment mask boundary, plus a bounding box
/// around the detected region.
pub fn annotate_detection(frame: &Frame, mask: &Mask, _color: Option<NamedColor>) -> Frame {
    let mut out = frame.clone();
    let (w, h) = mask.dimensions();

    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    for y in 0..h {
        for x in 0..w {
            if !mask.contains(x, y) {
                continue;
            }
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            if is_boundary(mask, x, y, w, h) {
                out.put_pixel(x, y, OUTLINE);
            }
        }
    }

    if min_x <= max_x && min_y <= max_y {
        let rect = Rect::at(min_x as i32, min_y as i32)
            .of_size(max_x - min_x + 1, max_y - min_y + 1);
        draw_hollow_rect_mut(&mut out, rect, OUTLINE);
    }
    out
}

fn is_boundary(mask: &Mask, x: u32, y: u32, w: u32, h: u32) -> bool {
    if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
        return true;
    }
    !(mask.contains(x - 1, y)
        && mask.contains(x + 1, y)
        && mask.contains(x, y - 1)
        && mask.contains(x, y + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_never_mutates_the_input() {
        let frame = Frame::from_pixel(30, 30, Rgb([10, 10, 10]));
        let mut mask = Mask::empty(30, 30);
        for y in 5..25 {
            for x in 5..25 {
                mask.set(x, y);
            }
        }
        let before = frame.clone();
        let out = annotate_detection(&frame, &mask, None);
        assert_eq!(frame, before);
        // Boundary pixel painted on the copy.
        assert_eq!(*out.get_pixel(5, 5), OUTLINE);
        // Interior untouched.
        assert_eq!(*out.get_pixel(15, 15), Rgb([10, 10, 10]));
    }
}
