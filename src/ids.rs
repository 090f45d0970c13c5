//! Stable stage id allocation
//!
//! Stage ids are `stage-{n}` with a per-job monotonic counter. The counter
//! is seeded from the highest numeric suffix already present and raised to
//! the job's persisted allocation watermark, so ids are collision-free
//! under rapid successive inserts and are never reused, even when the
//! highest-numbered stage was deleted before a restart.

/// Per-job allocator for stable stage ids.
#[derive(Debug, Clone)]
pub struct StageIdAllocator {
    next: u64,
}

impl StageIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Seed the counter from existing stage ids so newly allocated ids
    /// never collide with persisted ones.
    pub fn seeded<'a>(existing: impl IntoIterator<Item = &'a str>) -> Self {
        let max = existing
            .into_iter()
            .filter_map(numeric_suffix)
            .max()
            .unwrap_or(0);
        Self { next: max + 1 }
    }

    /// Raise the counter so the next allocation's suffix is above
    /// `suffix`. Used to restore the persisted watermark, which outlives
    /// the stage records themselves.
    pub fn reserve_past(&mut self, suffix: u64) {
        self.next = self.next.max(suffix + 1);
    }

    /// Highest suffix handed out so far (the persisted watermark).
    pub fn high_water(&self) -> u64 {
        self.next - 1
    }

    pub fn allocate(&mut self) -> String {
        let id = format!("stage-{}", self.next);
        self.next += 1;
        id
    }
}

fn numeric_suffix(id: &str) -> Option<u64> {
    id.rsplit('-').next().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let mut alloc = StageIdAllocator::new();
        assert_eq!(alloc.allocate(), "stage-1");
        assert_eq!(alloc.allocate(), "stage-2");
        assert_eq!(alloc.allocate(), "stage-3");
    }

    #[test]
    fn test_seeded_from_existing_ids() {
        let existing = ["stage-1", "stage-7", "stage-3"];
        let mut alloc = StageIdAllocator::seeded(existing);
        assert_eq!(alloc.allocate(), "stage-8");
    }

    #[test]
    fn test_seeded_ignores_non_numeric_suffixes() {
        let existing = ["stage-abc", "stage-2"];
        let mut alloc = StageIdAllocator::seeded(existing);
        assert_eq!(alloc.allocate(), "stage-3");
    }

    #[test]
    fn test_ids_not_reused_after_gap() {
        // Deleting stage-2 must not cause its id to be handed out again.
        let existing = ["stage-1", "stage-3"];
        let mut alloc = StageIdAllocator::seeded(existing);
        assert_eq!(alloc.allocate(), "stage-4");
    }

    #[test]
    fn test_reserve_past_raises_seeded_counter() {
        // Surviving records only reach stage-2, but the watermark says
        // stage-4 once existed; the next id must clear it.
        let mut alloc = StageIdAllocator::seeded(["stage-1", "stage-2"]);
        alloc.reserve_past(4);
        assert_eq!(alloc.allocate(), "stage-5");

        // A stale watermark below the seeded max never lowers the counter.
        let mut alloc = StageIdAllocator::seeded(["stage-7"]);
        alloc.reserve_past(3);
        assert_eq!(alloc.allocate(), "stage-8");
    }
}
