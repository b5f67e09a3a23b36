use std::time::Duration;
use std::{cmp, fmt, iter, ops};

use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::force::Force;
use crate::move_record::MoveRecord;


#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TimingStyle {
    pub starting_time: MillisDuration,
    // Added to a player's allotment for every move they complete.
    pub increment: MillisDuration,
}

impl TimingStyle {
    // Both values come straight from the server, so arithmetic saturates.
    pub fn from_minutes_and_seconds(starting_minutes: u64, increment_seconds: u64) -> Self {
        TimingStyle {
            starting_time: MillisDuration::from_secs(starting_minutes.saturating_mul(60)),
            increment: MillisDuration::from_secs(increment_seconds),
        }
    }
}

impl fmt::Display for TimingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let starting_ms = self.starting_time.as_millis();
        if starting_ms % (60 * MILLIS_PER_SEC) == 0 {
            write!(f, "{}", starting_ms / (60 * MILLIS_PER_SEC))?;
        } else {
            format_duration_to_mss(self.starting_time, f)?;
        }
        write!(f, "+{}", self.increment.as_millis() / MILLIS_PER_SEC)
    }
}

const MILLIS_PER_SEC: u64 = 1000;
const MILLIS_PER_DECI: u64 = MILLIS_PER_SEC / 10;

pub fn duration_to_mss(d: MillisDuration) -> String {
    let mut ret = String::new();
    // Writing to a `String` never fails.
    let _ = format_duration_to_mss(d, &mut ret);
    ret
}

fn format_duration_to_mss(d: MillisDuration, f: &mut impl fmt::Write) -> fmt::Result {
    let s = d.as_millis() / MILLIS_PER_SEC;
    let minutes = s / 60;
    let seconds = s % 60;
    write!(f, "{minutes}:{seconds:02}")
}


// Class similar to `std::time::Duration`, but with milliseconds precision. This is the precision
// the server uses for move timing.
//
// All arithmetic saturates: durations are received from the network and must never overflow.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MillisDuration {
    ms: u64,
}

impl MillisDuration {
    pub const ZERO: Self = MillisDuration { ms: 0 };
    pub const MIN_POSITIVE: Self = MillisDuration { ms: 1 };

    pub const fn from_millis(ms: u64) -> Self { MillisDuration { ms } }
    pub const fn from_secs(s: u64) -> Self {
        MillisDuration::from_millis(s.saturating_mul(MILLIS_PER_SEC))
    }

    pub fn is_zero(self) -> bool { self.ms == 0 }
    pub fn as_millis(self) -> u64 { self.ms }
    pub fn subsec_millis(self) -> u64 { self.ms % MILLIS_PER_SEC }
    pub fn saturating_sub(self, other: Self) -> Self {
        MillisDuration { ms: self.ms.saturating_sub(other.ms) }
    }
}

impl ops::Add for MillisDuration {
    type Output = Self;
    fn add(self, other: Self) -> Self { MillisDuration { ms: self.ms.saturating_add(other.ms) } }
}
impl ops::AddAssign for MillisDuration {
    fn add_assign(&mut self, other: Self) { *self = *self + other; }
}
impl ops::Mul<u64> for MillisDuration {
    type Output = Self;
    fn mul(self, k: u64) -> Self { MillisDuration { ms: self.ms.saturating_mul(k) } }
}
impl iter::Sum for MillisDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MillisDuration::ZERO, ops::Add::add)
    }
}

impl From<Duration> for MillisDuration {
    fn from(d: Duration) -> Self {
        MillisDuration::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
impl From<MillisDuration> for Duration {
    fn from(d: MillisDuration) -> Self { Duration::from_millis(d.as_millis()) }
}


#[derive(Clone, Debug)]
pub struct ClockShowing {
    pub is_active: bool,
    pub show_separator: bool,
    pub out_of_time: bool,
    pub time_breakdown: TimeBreakdown,
}

// Improvement potential: Support longer time controls (with hours).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeBreakdown {
    NormalTime { minutes: u64, seconds: u64 },
    LowTime { seconds: u64, deciseconds: u64 },
}

impl ClockShowing {
    // Includes padding for console output.
    pub fn ui_string(&self) -> String {
        let separator = |s| if self.show_separator { s } else { " " };
        match self.time_breakdown {
            TimeBreakdown::NormalTime { minutes, seconds } => {
                format!("{:02}{}{:02}", minutes, separator(":"), seconds)
            }
            TimeBreakdown::LowTime { seconds, deciseconds } => {
                format!("{:02}{}{} ", seconds, separator("."), deciseconds)
            }
        }
    }
}

impl From<MillisDuration> for TimeBreakdown {
    fn from(time: MillisDuration) -> Self {
        // Always round the time up, so that we never show "0.00" for a player who has not lost by
        // flag.
        let millis = time.as_millis();
        let ds_ceil = millis.div_ceil(MILLIS_PER_DECI);
        if ds_ceil < 200 {
            TimeBreakdown::LowTime { seconds: ds_ceil / 10, deciseconds: ds_ceil % 10 }
        } else {
            let s_ceil = millis.div_ceil(MILLIS_PER_SEC);
            TimeBreakdown::NormalTime { minutes: s_ceil / 60, seconds: s_ceil % 60 }
        }
    }
}


// Remaining time is never stored: it is recomputed from the move history on every call. The only
// state is the moment the countdown started and, once the game is over, the moment it stopped.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GameClock {
    timing_style: TimingStyle,
    started_at: Instant,
    stopped_at: Option<Instant>,
}

impl GameClock {
    pub fn new(timing_style: TimingStyle, started_at: Instant) -> Self {
        GameClock { timing_style, started_at, stopped_at: None }
    }

    pub fn timing_style(&self) -> TimingStyle { self.timing_style }
    pub fn is_running(&self) -> bool { self.stopped_at.is_none() }

    pub fn stop(&mut self, now: Instant) {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(now);
        }
    }

    // Moves without server timing are charged with the locally observed thinking time: the
    // interval between the previous record and this one.
    pub fn time_left(
        &self, force: Force, history: &[MoveRecord], side_to_move: Force, now: Instant,
    ) -> MillisDuration {
        let mut spent = MillisDuration::ZERO;
        let mut num_moves = 0;
        let mut turn_start = self.started_at;
        for record in history {
            if record.force == force {
                num_moves += 1;
                spent += record.elapsed.unwrap_or_else(|| {
                    record.applied_at.saturating_duration_since(turn_start).into()
                });
            }
            turn_start = cmp::max(turn_start, record.applied_at);
        }
        if side_to_move == force {
            let live_until = self.stopped_at.map_or(now, |stopped_at| cmp::min(stopped_at, now));
            spent += MillisDuration::from(live_until.saturating_duration_since(turn_start));
        }
        let allotment = self.timing_style.starting_time + self.timing_style.increment * num_moves;
        allotment.saturating_sub(spent)
    }

    pub fn showing_for(
        &self, force: Force, history: &[MoveRecord], side_to_move: Force, now: Instant,
    ) -> ClockShowing {
        let is_active = self.is_running() && side_to_move == force;
        let mut time = self.time_left(force, history, side_to_move, now);

        // Note. Never consider an active player to be out of time. The server is the one to
        // decide that the game is over.
        let out_of_time = !is_active && time.is_zero();
        if !out_of_time && time.is_zero() {
            time = MillisDuration::MIN_POSITIVE;
        }

        let time_breakdown = time.into();
        let show_separator = match (is_active, time_breakdown) {
            (false, _) => true,
            (true, TimeBreakdown::NormalTime { .. }) => time.subsec_millis() >= 500,
            (true, TimeBreakdown::LowTime { .. }) => true,
        };

        ClockShowing {
            is_active,
            show_separator,
            out_of_time,
            time_breakdown,
        }
    }
}
