/// A rank-3 grid of 32-bit accumulators, one per channel/row/column cell.
///
/// Layout is channel-major then row-major: index = c*H*W + h*W + w. All
/// intermediate activations in the pipeline live in this type; cells are
/// zeroed on creation and fully overwritten before they are read.
#[derive(Debug, Clone)]
pub struct Tensor32 {
    pub c: usize,
    pub h: usize,
    pub w: usize,
    pub data: Vec<i32>,
}

impl Tensor32 {
    pub fn zeros(c: usize, h: usize, w: usize) -> Self {
        Tensor32 { c, h, w, data: vec![0i32; c * h * w] }
    }

    /// Wrap an existing channel-major buffer.
    pub fn from_vec(c: usize, h: usize, w: usize, data: Vec<i32>) -> Self {
        debug_assert_eq!(data.len(), c * h * w);
        Tensor32 { c, h, w, data }
    }

    #[inline]
    pub fn get(&self, c: usize, h: usize, w: usize) -> i32 {
        self.data[(c * self.h + h) * self.w + w]
    }

    #[inline]
    pub fn set(&mut self, c: usize, h: usize, w: usize, val: i32) {
        self.data[(c * self.h + h) * self.w + w] = val;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
