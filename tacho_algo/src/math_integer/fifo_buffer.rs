// Fixed-capacity circular buffer: always holds exactly N samples, the write index wraps modulo N
// and the oldest sample is overwritten.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

pub struct BufferFIFO<T, const N: usize> {
    buffer: [T; N],

    idx: usize,
}

impl<T, const N: usize> BufferFIFO<T, N>
where
    T: Copy,
{
    /// Creates a buffer with every slot set to `value`.
    pub const fn filled(value: T) -> Self {
        Self {
            buffer: [value; N],
            idx: 0,
        }
    }

    /// Overwrites the oldest sample.
    pub fn write(&mut self, value: T) {
        self.buffer[self.idx] = value;
        self.idx = (self.idx + 1) % N;
    }

    /// All N slots in storage order.
    pub fn samples(&self) -> &[T; N] {
        &self.buffer
    }
}
