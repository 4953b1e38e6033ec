use serde::{Deserialize, Serialize};

/// Length bounds applied to new posts, counted in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLimits {
    pub max_title_len: usize,
    pub max_content_len: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_title_len: 20,
            max_content_len: 500,
        }
    }
}

impl ContentLimits {
    pub fn new(max_title_len: usize, max_content_len: usize) -> Self {
        Self {
            max_title_len,
            max_content_len,
        }
    }
}
