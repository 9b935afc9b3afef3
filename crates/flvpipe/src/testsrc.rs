//! Deterministic synthetic raw frames for exercising the pipeline.
//!
//! Produces fixed-size packed BGR frames over a flat background with a
//! bright vertical bar that advances with the frame index. The pattern
//! is deterministic so two runs with the same geometry encode to the
//! same stream, and it changes every frame so the encoder cannot
//! collapse the sequence into pure skip blocks.

const BACKGROUND: u8 = 60;
const BAR_WIDTH: u32 = 16;
/// Bar color, BGR order.
const BAR_COLOR: [u8; 3] = [255, 30, 30];

/// Iterator over `count` synthetic BGR frames of `width` × `height`.
#[derive(Debug, Clone)]
pub struct TestFrames {
    width: u32,
    height: u32,
    count: usize,
    next_index: usize,
}

impl TestFrames {
    pub fn new(width: u32, height: u32, count: usize) -> Self {
        Self {
            width,
            height,
            count,
            next_index: 0,
        }
    }

    /// Bytes per frame: width × height × 3 (packed BGR).
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    fn render(&self, index: usize) -> Vec<u8> {
        let mut frame = vec![BACKGROUND; self.frame_size()];
        if self.width == 0 || self.height == 0 {
            return frame;
        }

        let bar_start = (index as u32 * BAR_WIDTH) % self.width;
        let row_stride = self.width as usize * 3;
        for y in 0..self.height as usize {
            for dx in 0..BAR_WIDTH {
                let x = ((bar_start + dx) % self.width) as usize;
                let offset = y * row_stride + x * 3;
                frame[offset..offset + 3].copy_from_slice(&BAR_COLOR);
            }
        }
        frame
    }
}

impl Iterator for TestFrames {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.count {
            return None;
        }
        let frame = self.render(self.next_index);
        self.next_index += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TestFrames {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_count_frames_of_fixed_size() {
        let frames: Vec<_> = TestFrames::new(64, 48, 5).collect();
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|f| f.len() == 64 * 48 * 3));
    }

    #[test]
    fn frames_are_deterministic() {
        let a: Vec<_> = TestFrames::new(64, 48, 3).collect();
        let b: Vec<_> = TestFrames::new(64, 48, 3).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn consecutive_frames_differ() {
        let frames: Vec<_> = TestFrames::new(64, 48, 2).collect();
        assert_ne!(frames[0], frames[1]);
    }

    #[test]
    fn bar_wraps_around_width() {
        // With a 32px frame the bar returns to column 0 every 2 frames.
        let frames: Vec<_> = TestFrames::new(32, 8, 3).collect();
        assert_eq!(frames[0], frames[2]);
    }

    #[test]
    fn size_hint_is_exact() {
        let mut frames = TestFrames::new(16, 16, 4);
        assert_eq!(frames.len(), 4);
        frames.next();
        assert_eq!(frames.len(), 3);
    }
}
