//! Speaking order and belief checkpoint arithmetic.

/// Repeat `pattern` `repetitions` times, preserving element order.
pub fn generate_order(pattern: &[usize], repetitions: usize) -> Vec<usize> {
    pattern.repeat(repetitions)
}

/// 1-based round number of a 0-based turn.
pub fn round_of(turn: usize, pattern_len: usize) -> usize {
    turn / pattern_len + 1
}

/// Whether a belief sweep runs after `turn`.
///
/// Sweeps land every `eval_rate` rounds, and the final turn always gets one.
pub fn checkpoint_due(turn: usize, pattern_len: usize, eval_rate: usize, total_turns: usize) -> bool {
    (turn + 1) % (pattern_len * eval_rate) == 0 || turn + 1 == total_turns
}
