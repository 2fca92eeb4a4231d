use crate::error::EmomaskError;

/// A point in a 2D pixel coordinate system, origin top-left.
///
/// Whether the point is in image space or display space depends on context;
/// the [`FitTransform`] converts between the two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: f64,
    /// Vertical coordinate in pixels.
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of an image or a display viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Create a size from its dimensions.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are strictly positive and finite.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// The smaller of the two dimensions.
    pub fn min_dimension(&self) -> f64 {
        self.width.min(self.height)
    }

    /// Width times height.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}

/// Aspect-fit mapping between image space and display space.
///
/// Models the same rule a rendering surface uses to letterbox/pillarbox an
/// image inside its viewport: a uniform scale of `min(Dw/W, Dh/H)` with the
/// scaled content centered. Construction rejects degenerate sizes, so the
/// transform can never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    scale: f64,
    x_offset: f64,
    y_offset: f64,
}

impl FitTransform {
    /// Compute the aspect-fit transform for an image shown inside a viewport.
    ///
    /// Returns `InvalidGeometry` if either size has a zero, negative, or
    /// non-finite dimension. A `(0, 0)` viewport occurs transiently before
    /// layout and must be guarded by the caller before reaching here.
    pub fn new(image: Size, display: Size) -> Result<Self, EmomaskError> {
        for size in [image, display] {
            if !size.is_valid() {
                return Err(EmomaskError::InvalidGeometry {
                    width: size.width,
                    height: size.height,
                });
            }
        }

        let scale = (display.width / image.width).min(display.height / image.height);
        Ok(Self {
            scale,
            x_offset: (display.width - image.width * scale) / 2.0,
            y_offset: (display.height - image.height * scale) / 2.0,
        })
    }

    /// The uniform image-to-display scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Map an image-space point to display space.
    pub fn image_to_display(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.x_offset, p.y * self.scale + self.y_offset)
    }

    /// Map a display-space point back to image space.
    pub fn display_to_image(&self, p: Point) -> Point {
        Point::new((p.x - self.x_offset) / self.scale, (p.y - self.y_offset) / self.scale)
    }

    /// Convert a display-space translation delta to image space.
    ///
    /// Deltas are relative, so only the scale applies — the letterbox
    /// offsets cancel out.
    pub fn display_delta_to_image(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx / self.scale, dy / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_points() {
        let transform =
            FitTransform::new(Size::new(4032.0, 3024.0), Size::new(390.0, 400.0)).unwrap();
        let points = [
            Point::new(0.0, 0.0),
            Point::new(2016.0, 1512.0),
            Point::new(4032.0, 3024.0),
            Point::new(123.456, 789.012),
        ];
        for p in points {
            let back = transform.display_to_image(transform.image_to_display(p));
            assert!((back.x - p.x).abs() < 1e-6, "x: {} vs {}", back.x, p.x);
            assert!((back.y - p.y).abs() < 1e-6, "y: {} vs {}", back.y, p.y);
        }
    }

    #[test]
    fn wide_image_is_letterboxed_vertically() {
        // 2000x1000 in a 400x400 viewport: scale 0.2, content 400x200,
        // centered with 100px bars above and below.
        let transform =
            FitTransform::new(Size::new(2000.0, 1000.0), Size::new(400.0, 400.0)).unwrap();
        assert!((transform.scale() - 0.2).abs() < 1e-12);
        let origin = transform.image_to_display(Point::new(0.0, 0.0));
        assert!((origin.x - 0.0).abs() < 1e-12);
        assert!((origin.y - 100.0).abs() < 1e-12);
    }

    #[test]
    fn tall_image_is_pillarboxed_horizontally() {
        let transform =
            FitTransform::new(Size::new(1000.0, 2000.0), Size::new(400.0, 400.0)).unwrap();
        let origin = transform.image_to_display(Point::new(0.0, 0.0));
        assert!((origin.x - 100.0).abs() < 1e-12);
        assert!((origin.y - 0.0).abs() < 1e-12);
    }

    #[test]
    fn image_center_maps_to_display_center() {
        let transform =
            FitTransform::new(Size::new(1000.0, 750.0), Size::new(390.0, 520.0)).unwrap();
        let center = transform.image_to_display(Point::new(500.0, 375.0));
        assert!((center.x - 195.0).abs() < 1e-9);
        assert!((center.y - 260.0).abs() < 1e-9);
    }

    #[test]
    fn zero_display_size_is_rejected() {
        let result = FitTransform::new(Size::new(1000.0, 1000.0), Size::new(0.0, 0.0));
        assert!(matches!(result, Err(EmomaskError::InvalidGeometry { .. })));
    }

    #[test]
    fn negative_image_dimension_is_rejected() {
        let result = FitTransform::new(Size::new(-10.0, 100.0), Size::new(400.0, 400.0));
        assert!(matches!(result, Err(EmomaskError::InvalidGeometry { .. })));
    }

    #[test]
    fn delta_conversion_scales_without_offset() {
        // Scale is 0.5; a 10px display drag is a 20px image-space move
        // regardless of letterbox offsets.
        let transform =
            FitTransform::new(Size::new(800.0, 600.0), Size::new(400.0, 400.0)).unwrap();
        let (dx, dy) = transform.display_delta_to_image(10.0, -5.0);
        assert!((dx - 20.0).abs() < 1e-12);
        assert!((dy + 10.0).abs() < 1e-12);
    }
}
