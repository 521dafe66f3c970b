// Commit-time scheduling: time-of-day slots, per-day schedules, and
// multi-day backfill plans.
//
// Everything here is pure computation over an injected random source, so
// runs are reproducible under a seeded rng.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ── Time slots ──────────────────────────────────────────────────────

/// A half-open hour band `[start, end)` within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub label: &'static str,
    pub start: u32,
    pub end: u32,
}

/// The canonical slot catalog. Daily schedules draw each commit from a
/// distinct slot so activity spreads across the day instead of clustering.
pub const SLOTS: [TimeSlot; 4] = [
    TimeSlot { label: "morning", start: 9, end: 12 },
    TimeSlot { label: "midday", start: 12, end: 15 },
    TimeSlot { label: "afternoon", start: 15, end: 18 },
    TimeSlot { label: "evening", start: 18, end: 22 },
];

impl TimeSlot {
    /// Whether `hour` falls inside this slot. The end bound is exclusive.
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start && hour < self.end
    }
}

// ── Commit times ────────────────────────────────────────────────────

/// A minute-resolution time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitTime {
    pub hour: u32,
    pub minute: u32,
}

impl std::fmt::Display for CommitTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// An ordered set of commit times for a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub times: Vec<CommitTime>,
}

impl DaySchedule {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Generate a schedule of 3 or 4 commit times, each drawn from a distinct
/// slot, sorted ascending.
///
/// Spacing is best-effort: slots are disjoint, but nothing enforces a
/// minimum gap across a slot boundary.
pub fn day_schedule<R: Rng + ?Sized>(rng: &mut R) -> DaySchedule {
    let count = if rng.gen_bool(0.5) { 3 } else { 4 };

    let mut slots = SLOTS;
    slots.shuffle(rng);

    let mut times: Vec<CommitTime> = slots[..count]
        .iter()
        .map(|slot| CommitTime {
            hour: rng.gen_range(slot.start..slot.end),
            minute: rng.gen_range(0..60),
        })
        .collect();
    times.sort();

    DaySchedule { times }
}

// ── Backfill plans ──────────────────────────────────────────────────

/// Planned commits for one past day. `days_ago` counts back from today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillDay {
    pub days_ago: u32,
    pub times: Vec<CommitTime>,
}

/// Commits to fabricate across past days, ordered oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackfillPlan {
    pub days: Vec<BackfillDay>,
}

impl BackfillPlan {
    /// Total planned commits across all days.
    pub fn commit_count(&self) -> usize {
        self.days.iter().map(|day| day.times.len()).sum()
    }
}

/// Plan backfill activity for the past `days_back` days.
///
/// Each day is active with probability 0.7 and gets 3 or 4 commits drawn
/// from a flat `[9, 21)` hour range. Unlike the daily path there is no
/// slot structure here, and times within a day stay in draw order.
pub fn backfill_plan<R: Rng + ?Sized>(rng: &mut R, days_back: u32) -> BackfillPlan {
    let mut days = Vec::new();

    for days_ago in (1..=days_back).rev() {
        if rng.gen_bool(0.3) {
            continue;
        }

        let count = if rng.gen_bool(0.5) { 3 } else { 4 };
        let times = (0..count)
            .map(|_| CommitTime {
                hour: rng.gen_range(9..21),
                minute: rng.gen_range(0..60),
            })
            .collect();

        days.push(BackfillDay { days_ago, times });
    }

    BackfillPlan { days }
}
