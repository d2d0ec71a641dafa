//! Stabilized softmax over integer scores.

/// Convert raw scores into a probability distribution.
///
/// The maximum score is subtracted before exponentiation, bounding every
/// exponent at zero: the sum is then at least exp(0) = 1 at the max index,
/// so the normalizing division is always well defined. Max-subtraction
/// shifts all scores equally, so relative ordering (and thus argmax) is
/// untouched. The difference is taken in i64 so an i32::MIN score next to a
/// normal one cannot wrap.
pub fn softmax(scores: &[i32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(i32::MIN, i32::max);
    let mut out: Vec<f32> = scores
        .iter()
        .map(|&s| ((s as i64 - max as i64) as f32).exp())
        .collect();
    let sum: f32 = out.iter().sum();
    for p in out.iter_mut() {
        *p /= sum;
    }
    out
}
