/// Rectangle in device pixels, virtual-desktop coordinates.
///
/// Width and height are always positive; construct with [`PixelRect::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
}

impl PixelRect {
    /// Returns `None` when `width` or `height` is not positive.
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            left,
            top,
            width,
            height,
        })
    }

    /// Callers guarantee positive dimensions.
    pub(crate) fn from_parts(left: i32, top: i32, width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0, "{width}x{height}");
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn contains(&self, other: &PixelRect) -> bool {
        other.left >= self.left
            && other.right() <= self.right()
            && other.top >= self.top
            && other.bottom() <= self.bottom()
    }

    /// Squared distance from a point to the nearest edge, zero when inside.
    pub fn distance_sq(&self, x: i32, y: i32) -> i64 {
        let dx = if x < self.left {
            (self.left - x) as i64
        } else if x >= self.right() {
            (x - self.right() + 1) as i64
        } else {
            0
        };
        let dy = if y < self.top {
            (self.top - y) as i64
        } else if y >= self.bottom() {
            (y - self.bottom() + 1) as i64
        } else {
            0
        };
        dx * dx + dy * dy
    }
}

impl std::fmt::Display for PixelRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}
