use quickcheck::quickcheck;
use seedgap::beta_variance;

quickcheck! {
    fn variance_is_symmetric_and_bounded(a: u16, b: u16) -> bool {
        let a = a as f64 / 100.0 + 0.01;
        let b = b as f64 / 100.0 + 0.01;
        let v = beta_variance(a, b);
        (v - beta_variance(b, a)).abs() < 1e-15 && v > 0.0 && v <= 0.25
    }
}

#[test]
fn variance_of_two_two() {
    assert!((beta_variance(2.0, 2.0) - 0.05).abs() < 1e-12);
}
