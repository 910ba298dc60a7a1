use honggfuzz::fuzz;
use seedgap::{rank_seeds, read_observations, Config};

fn main() {
    let rank = Config::default().rank;
    loop {
        fuzz!(|data: &[u8]| {
            if let Ok(rows) = read_observations(data) {
                let ranking = rank_seeds(&rows, &rank);
                assert!(ranking.top.len() <= rank.top_k);
                assert!(ranking.gaps.windows(2).all(|w| {
                    let (a, b) = (w[0].mean_gap, w[1].mean_gap);
                    b.is_nan() || (!a.is_nan() && a >= b)
                }));
            }
        });
    }
}
