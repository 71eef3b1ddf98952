//! Scan ordering.
//!
//! Cheap, high-signal targets go first so that an early flag can stop the
//! request before expensive analysis runs.

use triage_core::{ScanTarget, TypeFamily};

#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityScheduler;

impl PriorityScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Tier for a target: image, then video, then document, then everything else.
    pub fn tier(target: &ScanTarget) -> u8 {
        if target.skip_reason.is_some() {
            return 3;
        }
        match target.family() {
            Some(TypeFamily::Image) => 0,
            Some(TypeFamily::Video) => 1,
            Some(TypeFamily::Document) => 2,
            Some(TypeFamily::Archive) | None => 3,
        }
    }

    /// Order by tier, then ascending size. Ties keep discovery order.
    pub fn order(&self, mut targets: Vec<ScanTarget>) -> Vec<ScanTarget> {
        // sort_by_key is stable
        targets.sort_by_key(|t| (Self::tier(t), t.size_bytes));
        targets
    }
}
