//! Minimal row-major pixel buffers.
//!
//! The pack this crate is modeled on has no array-math dependency to reach for, so these
//! are plain flat-`Vec` wrappers with shape bookkeeping rather than a borrowed crate type.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array2<T> {
    data: Vec<T>,
    height: usize,
    width: usize,
}

impl<T: Clone> Array2<T> {
    pub fn from_vec(height: usize, width: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), height * width);
        Self { data, height, width }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.width + col]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array3<T> {
    data: Vec<T>,
    height: usize,
    width: usize,
    channels: usize,
}

impl<T: Clone> Array3<T> {
    pub fn from_vec(height: usize, width: usize, channels: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), height * width * channels);
        Self {
            data,
            height,
            width,
            channels,
        }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    pub fn get(&self, row: usize, col: usize, channel: usize) -> &T {
        &self.data[(row * self.width + col) * self.channels + channel]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}
