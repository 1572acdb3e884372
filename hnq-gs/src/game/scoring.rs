//! Guess scoring
//!
//! Points depend only on how far the guess lands from the actual score:
//!
//! | difference       | points |
//! |------------------|--------|
//! | 0                | 100    |
//! | 1 ..= 10         | 50     |
//! | 11 ..= 50        | 25     |
//! | 51 ..= 100       | 10     |
//! | > 100            | 0      |

/// `(max difference, points)`, ascending; first match wins
pub const TIERS: [(u64, u32); 4] = [(0, 100), (10, 50), (50, 25), (100, 10)];

/// Parse raw player input as an integer guess
///
/// Surrounding whitespace is ignored. Anything else that is not a plain
/// (optionally signed) integer is invalid and yields `None`.
pub fn parse_guess(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Absolute distance between a guess and the actual score
pub fn difference(guess: i64, actual: u64) -> u64 {
    let d = (i128::from(guess) - i128::from(actual)).unsigned_abs();
    u64::try_from(d).unwrap_or(u64::MAX)
}

/// Points for a given distance
pub fn points_for_difference(difference: u64) -> u32 {
    TIERS
        .iter()
        .find(|(max, _)| difference <= *max)
        .map_or(0, |&(_, points)| points)
}

/// Points for a guess against the actual score
pub fn score_for(guess: i64, actual: u64) -> u32 {
    points_for_difference(difference(guess, actual))
}
