//! Ping-pong double buffering.
//!
//! Iterative stencil and particle updates read the previous state from one
//! buffer and write the next state into the other, then swap roles. Reads
//! and writes never alias within a pass.

/// A pair of buffers with a designated read side.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    buffers: [T; 2],
    read: usize,
    generation: u64,
}

impl<T> PingPong<T> {
    /// Create from an initial read buffer and a scratch write buffer.
    pub fn new(read: T, write: T) -> Self {
        Self {
            buffers: [read, write],
            read: 0,
            generation: 0,
        }
    }

    /// Buffer holding the current state.
    #[inline]
    pub fn read(&self) -> &T {
        &self.buffers[self.read]
    }

    /// Mutable access to the current state (e.g. for host-side edits between passes).
    #[inline]
    pub fn read_mut(&mut self) -> &mut T {
        &mut self.buffers[self.read]
    }

    /// Buffer the next pass writes into.
    #[inline]
    pub fn write(&self) -> &T {
        &self.buffers[1 - self.read]
    }

    /// Borrow the read side immutably and the write side mutably at once.
    #[inline]
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.buffers;
        if self.read == 0 { (a, b) } else { (b, a) }
    }

    /// Make the freshly written buffer the read buffer.
    #[inline]
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
        self.generation += 1;
    }

    /// Number of swaps performed.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Index (0 or 1) of the current read buffer.
    #[inline]
    pub fn read_index(&self) -> usize {
        self.read
    }
}

impl<T: Clone> PingPong<T> {
    /// Create with both sides initialized to `value`.
    pub fn filled(value: T) -> Self {
        Self::new(value.clone(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_exposes_written_buffer() {
        let mut pp = PingPong::new(vec![1, 2, 3], vec![0, 0, 0]);
        {
            let (read, write) = pp.split_mut();
            for (w, r) in write.iter_mut().zip(read) {
                *w = r * 10;
            }
        }
        assert_eq!(pp.read(), &vec![1, 2, 3]);
        pp.swap();
        assert_eq!(pp.read(), &vec![10, 20, 30]);
        assert_eq!(pp.write(), &vec![1, 2, 3]);
        assert_eq!(pp.generation(), 1);
        assert_eq!(pp.read_index(), 1);
    }

    #[test]
    fn test_split_after_swap() {
        let mut pp = PingPong::filled(0u32);
        pp.swap();
        let (read, write) = pp.split_mut();
        *write = *read + 5;
        pp.swap();
        assert_eq!(*pp.read(), 5);
        assert_eq!(pp.read_index(), 0);
        assert_eq!(pp.generation(), 2);
    }

    #[test]
    fn test_read_mut_edits_current_state() {
        let mut pp = PingPong::filled(vec![0.0f32; 4]);
        pp.read_mut()[2] = 1.0;
        assert_eq!(pp.read()[2], 1.0);
        assert_eq!(pp.write()[2], 0.0);
    }
}
