use qlenet::net::argmax;
use qlenet::net::softmax::softmax;

fn assert_distribution(probs: &[f32]) {
    assert!(probs.iter().all(|&p| p >= 0.0 && p.is_finite()));
    let sum: f32 = probs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5, "sum was {sum}");
}

#[test]
fn output_is_a_probability_distribution() {
    for scores in [vec![0, 0, 0], vec![-40, 3, 17, 2], vec![1000, -1000, 0]] {
        assert_distribution(&softmax(&scores));
    }
}

#[test]
fn argmax_is_preserved() {
    let scores = vec![3, -1, 7, 7, 2];
    let probs = softmax(&scores);
    assert_eq!(argmax(&probs), 2, "score argmax (first of the tied 7s) must survive softmax");
}

#[test]
fn all_equal_scores_give_uniform_distribution() {
    let probs = softmax(&[5; 10]);
    assert_distribution(&probs);
    for &p in &probs {
        assert!((p - 0.1).abs() < 1e-6);
    }
    assert_eq!(argmax(&probs), 0, "uniform ties break to the lowest index");
}

#[test]
fn extreme_scores_do_not_wrap() {
    // A minimum-representable score next to normal ones must neither panic
    // nor disturb the winner.
    let scores = vec![i32::MIN, 0, 100, i32::MIN];
    let probs = softmax(&scores);
    assert_distribution(&probs);
    assert_eq!(argmax(&probs), 2);
    assert_eq!(probs[0], 0.0);
}

#[test]
fn max_score_gets_max_probability() {
    let scores = vec![-3, 12, 4, 11];
    let probs = softmax(&scores);
    let best = argmax(&probs);
    assert_eq!(best, 1);
    for (i, &p) in probs.iter().enumerate() {
        assert!(p <= probs[best], "probs[{i}] exceeded the winner");
    }
}
