/// Secret generation: which wire is live and what the disarm code is.
///
/// Randomness always comes in as an explicit `Rng` handle so a round can be
/// replayed exactly from a seed.

use std::ops::RangeInclusive;

use rand::Rng;

/// Pick the live wire uniformly from the profile's wires.
pub fn pick_wire(rng: &mut impl Rng, wires: &[String]) -> String {
    let idx = rng.random_range(0..wires.len());
    wires[idx].clone()
}

/// All `code_length`-digit values with a nonzero leading digit.
pub fn code_range(code_length: u32) -> RangeInclusive<u64> {
    let low = 10_u64.pow(code_length - 1);
    let high = 10_u64.pow(code_length) - 1;
    low..=high
}

/// Draw a disarm code uniformly from `code_range(code_length)`.
pub fn generate_code(rng: &mut impl Rng, code_length: u32) -> String {
    rng.random_range(code_range(code_length)).to_string()
}

/// Exactly `code_length` ASCII decimal digits?
pub fn is_well_formed_code(input: &str, code_length: u32) -> bool {
    input.len() == code_length as usize && input.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::difficulty::labels;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TRIALS: usize = 10_000;

    fn chi_square(counts: &[usize], expected: f64) -> f64 {
        counts
            .iter()
            .map(|&c| {
                let d = c as f64 - expected;
                d * d / expected
            })
            .sum()
    }

    #[test]
    fn range_bounds_per_length() {
        assert_eq!(code_range(1), 1..=9);
        assert_eq!(code_range(3), 100..=999);
        assert_eq!(code_range(4), 1000..=9999);
        assert_eq!(code_range(5), 10_000..=99_999);
        assert_eq!(code_range(18), 100_000_000_000_000_000..=999_999_999_999_999_999);
    }

    #[test]
    fn codes_have_exact_length_and_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [3_u32, 4, 5] {
            let range = code_range(len);
            for _ in 0..TRIALS {
                let code = generate_code(&mut rng, len);
                assert_eq!(code.len(), len as usize, "code {code}");
                assert!(!code.starts_with('0'), "leading zero in {code}");
                let value: u64 = code.parse().unwrap();
                assert!(range.contains(&value), "{value} outside {range:?}");
            }
        }
    }

    #[test]
    fn leading_digit_is_uniform() {
        // 8 degrees of freedom; 26.1 is the 0.1% critical value
        let mut rng = StdRng::seed_from_u64(2024);
        for len in [3_u32, 4, 5] {
            let mut counts = [0_usize; 9];
            for _ in 0..TRIALS {
                let code = generate_code(&mut rng, len);
                let lead = code.as_bytes()[0] - b'1';
                counts[lead as usize] += 1;
            }
            let stat = chi_square(&counts, TRIALS as f64 / 9.0);
            assert!(stat < 30.0, "len {len}: chi-square {stat} for {counts:?}");
        }
    }

    #[test]
    fn trailing_digit_is_uniform() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut counts = [0_usize; 10];
        for _ in 0..TRIALS {
            let code = generate_code(&mut rng, 4);
            let last = code.as_bytes()[3] - b'0';
            counts[last as usize] += 1;
        }
        let stat = chi_square(&counts, TRIALS as f64 / 10.0);
        assert!(stat < 33.0, "chi-square {stat} for {counts:?}");
    }

    #[test]
    fn picked_wire_is_always_an_option() {
        let wires = labels(&["red", "blue", "yellow", "green", "white", "black", "purple"]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut hits = vec![0_usize; wires.len()];
        for _ in 0..TRIALS {
            let w = pick_wire(&mut rng, &wires);
            let idx = wires.iter().position(|x| *x == w).expect("picked wire not in options");
            hits[idx] += 1;
        }
        assert!(hits.iter().all(|&h| h > 0), "some wire never chosen: {hits:?}");
    }

    #[test]
    fn same_seed_same_secrets() {
        let wires = labels(&["a", "b", "c"]);
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        assert_eq!(pick_wire(&mut a, &wires), pick_wire(&mut b, &wires));
        assert_eq!(generate_code(&mut a, 5), generate_code(&mut b, 5));
    }

    #[test]
    fn well_formed_code_check() {
        assert!(is_well_formed_code("1234", 4));
        assert!(is_well_formed_code("0420", 4));
        assert!(!is_well_formed_code("12", 4));
        assert!(!is_well_formed_code("12ab", 4));
        assert!(!is_well_formed_code("12345", 4));
        assert!(!is_well_formed_code("１２３４", 4)); // full-width digits
        assert!(!is_well_formed_code("", 4));
    }
}
