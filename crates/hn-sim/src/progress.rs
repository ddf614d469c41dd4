//! Progress reporting at a bounded message rate.

/// Snapshot handed to the progress callback.
#[derive(Debug, Clone, PartialEq)]
pub struct SimProgress {
    /// Completed timesteps
    pub step: usize,
    pub total_steps: usize,
    pub fraction_complete: f64,
    pub message: String,
}

/// Emits at most `messages` reports over `total_steps` steps, the last one
/// at completion.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    total_steps: usize,
    messages: usize,
    emitted: usize,
}

impl ProgressReporter {
    pub fn new(total_steps: usize, messages: usize) -> Self {
        Self {
            total_steps,
            messages,
            emitted: 0,
        }
    }

    /// Report for `completed` steps, if one is due.
    pub fn advance(&mut self, completed: usize) -> Option<SimProgress> {
        if self.messages == 0 || self.total_steps == 0 {
            return None;
        }
        let due = completed * self.messages / self.total_steps;
        if due <= self.emitted {
            return None;
        }
        self.emitted = due;
        let fraction = completed as f64 / self.total_steps as f64;
        Some(SimProgress {
            step: completed,
            total_steps: self.total_steps,
            fraction_complete: fraction,
            message: format!(
                "{completed}/{} timesteps ({:.0}%)",
                self.total_steps,
                fraction * 100.0
            ),
        })
    }
}
