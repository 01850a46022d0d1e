//! Stereo output block.

/// One block of stereo samples as produced by the engine.
///
/// Both channels always have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioBlock {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl AudioBlock {
    /// Build a block from two channels.
    ///
    /// # Panics
    ///
    /// Panics if the channels differ in length.
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Self {
        assert_eq!(left.len(), right.len(), "channel length mismatch");
        Self { left, right }
    }

    /// Build a block from two channels, or `None` if their lengths differ.
    pub fn from_channels(left: Vec<f32>, right: Vec<f32>) -> Option<Self> {
        (left.len() == right.len()).then_some(Self { left, right })
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True when the block holds no frames.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Left channel samples.
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right channel samples.
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Consume the block, returning `(left, right)`.
    pub fn into_channels(self) -> (Vec<f32>, Vec<f32>) {
        (self.left, self.right)
    }

    /// Largest absolute sample value across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0_f32, |acc, &s| acc.max(s.abs()))
    }
}
