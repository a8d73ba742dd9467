#[derive(Debug, Clone, PartialEq)]
/// One node of the lookahead tree: the player after a hypothetical sequence
/// of quality choices.
pub struct MdpState {
    pub(crate) depth: usize,
    pub(crate) buffer: f64,
    pub(crate) bandwidth: f64,
    pub(crate) bitrate_vector: Vec<usize>,
    pub(crate) shot_persistence: u32,
    pub(crate) saliency: u32,
    pub(crate) saliency_delta: i64,
}

impl MdpState {
    /// Distance from the window root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Simulated buffer level in seconds after downloading this node's segment.
    pub fn buffer(&self) -> f64 {
        self.buffer
    }

    /// Bandwidth assumption of the training cycle, in kbps.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Qualities chosen since the last shot boundary, oldest first.
    pub fn bitrate_vector(&self) -> &[usize] {
        &self.bitrate_vector
    }

    /// Most recently chosen quality.
    pub fn last_quality(&self) -> usize {
        self.bitrate_vector.last().copied().unwrap_or(0)
    }

    /// Segments left in the current shot; 1 signals a shot boundary.
    pub fn shot_persistence(&self) -> u32 {
        self.shot_persistence
    }

    /// Whether the next segment starts a new shot.
    pub fn at_shot_boundary(&self) -> bool {
        self.shot_persistence == 1
    }

    /// Rescaled saliency class of this node's segment.
    pub fn saliency(&self) -> u32 {
        self.saliency
    }

    /// Saliency change relative to the previous segment.
    pub fn saliency_delta(&self) -> i64 {
        self.saliency_delta
    }
}
