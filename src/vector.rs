#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub(crate) struct V {
    pub x: f64,
    pub y: f64,
}

impl V {
    pub(crate) const ZERO: V = V { x: 0.0, y: 0.0 };

    #[inline(always)]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    pub fn magnitude(&self) -> f64 {
        libm::hypot(self.x, self.y)
    }

    #[inline(always)]
    pub fn dot(&self, rhs: &Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// <https://stackoverflow.com/questions/243945/calculating-a-2d-vectors-cross-product>
    #[inline(always)]
    pub fn cross_2d(&self, rhs: &Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    /// Component by index, 0 = x and 1 = y. Used by the derivative code,
    /// which loops over axes when filling 2x2 curvature blocks.
    #[inline(always)]
    pub fn component(&self, axis: usize) -> f64 {
        if axis == 0 { self.x } else { self.y }
    }
}

impl std::ops::Sub<Self> for V {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
