//! Weighted random status selection for `/status/{codes}`.
//!
//! The segment is either a single code (`404`) or a comma separated list of `code` or
//! `code:weight` entries (`200:3,500:1,503`). Bare entries weigh `1`.

use http::StatusCode;
use rand::Rng;

use crate::{ShapingError, ShapingResult};

const INVALID_STATUS: &str = "Invalid status code";

/// One selectable entry of a weighted list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedCode {
    pub code: StatusCode,
    pub weight: f64,
}

/// A parsed list with its running weight totals.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedCodes {
    entries: Vec<WeightedCode>,
    cumulative: Vec<f64>,
    total: f64,
}

impl WeightedCodes {
    /// Builds the list.
    ///
    /// # Errors
    ///
    /// [`ShapingError::InvalidArgument`] when the list is empty or the weights sum to
    /// zero, since nothing could ever be drawn.
    pub fn new(entries: Vec<WeightedCode>) -> ShapingResult<Self> {
        let mut total = 0.0;
        let cumulative: Vec<f64> = entries
            .iter()
            .map(|entry| {
                total += entry.weight;
                total
            })
            .collect();

        if entries.is_empty() || total <= 0.0 || !total.is_finite() {
            return Err(ShapingError::invalid(INVALID_STATUS));
        }

        Ok(Self {
            entries,
            cumulative,
            total,
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[WeightedCode] {
        &self.entries
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total
    }

    /// Inverse-CDF draw: picks `x` uniformly in `[0, total)` and returns the first
    /// entry whose cumulative weight is strictly greater than `x`. Zero-weight entries
    /// share the cumulative value of their predecessor and so can never be first.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> StatusCode {
        let x = rng.random_range(0.0..self.total);
        self.pick(x)
    }

    fn pick(&self, x: f64) -> StatusCode {
        self.cumulative
            .iter()
            .position(|cumulative| *cumulative > x)
            .map(|index| self.entries[index].code)
            // float rounding can leave x at the total; fall back to the last drawable entry
            .or_else(|| {
                self.entries
                    .iter()
                    .rev()
                    .find(|entry| entry.weight > 0.0)
                    .map(|entry| entry.code)
            })
            .unwrap_or(StatusCode::OK)
    }
}

/// A parsed `/status/{codes}` path segment.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusChoice {
    Single(StatusCode),
    Weighted(WeightedCodes),
}

impl StatusChoice {
    /// Parses a `/status/{codes}` segment. A segment without a comma skips weighting
    /// entirely.
    ///
    /// # Errors
    ///
    /// [`ShapingError::InvalidArgument`] for codes that are not integers in
    /// `[100, 599]`, weights that are not non-negative finite numbers, empty entries,
    /// and lists whose weights sum to zero.
    pub fn parse(codes: &str) -> ShapingResult<Self> {
        if !codes.contains(',') {
            return parse_code(codes).map(Self::Single);
        }

        let entries = codes
            .split(',')
            .map(parse_entry)
            .collect::<ShapingResult<Vec<_>>>()?;

        WeightedCodes::new(entries).map(Self::Weighted)
    }

    /// Draws a code using the calling thread's generator.
    #[must_use]
    pub fn choose(&self) -> StatusCode {
        self.choose_with(&mut rand::rng())
    }

    /// Draws a code using the supplied generator.
    pub fn choose_with<R: Rng + ?Sized>(&self, rng: &mut R) -> StatusCode {
        match self {
            Self::Single(code) => *code,
            Self::Weighted(codes) => codes.draw(rng),
        }
    }
}

/// Parses an integer status code in `[100, 599]`.
///
/// # Errors
///
/// [`ShapingError::InvalidArgument`] for anything else.
pub fn parse_code(value: &str) -> ShapingResult<StatusCode> {
    value
        .parse::<u16>()
        .ok()
        .filter(|code| (100..=599).contains(code))
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ShapingError::invalid(INVALID_STATUS))
}

fn parse_entry(entry: &str) -> ShapingResult<WeightedCode> {
    let (code, weight) = match entry.split_once(':') {
        Some((code, weight)) => (code, parse_weight(weight)?),
        None => (entry, 1.0),
    };

    Ok(WeightedCode {
        code: parse_code(code)?,
        weight,
    })
}

fn parse_weight(value: &str) -> ShapingResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|weight| weight.is_finite() && *weight >= 0.0)
        .ok_or_else(|| ShapingError::invalid(INVALID_STATUS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    #[test]
    fn single_code_is_always_returned() {
        let choice = StatusChoice::parse("404").expect("should parse");
        assert_eq!(choice, StatusChoice::Single(StatusCode::NOT_FOUND));
        for _ in 0..100 {
            assert_eq!(choice.choose(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn single_code_must_be_an_integer_status() {
        for codes in ["abc", "", "20x", "99", "600", "70000", "-200", "200:1"] {
            assert!(
                matches!(
                    StatusChoice::parse(codes),
                    Err(ShapingError::InvalidArgument(_))
                ),
                "codes {codes:?}"
            );
        }
    }

    #[test]
    fn zero_weight_entries_are_never_chosen() {
        let choice = StatusChoice::parse("200:1,500:0").expect("should parse");
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            assert_eq!(choice.choose_with(&mut rng), StatusCode::OK);
        }
        for _ in 0..1_000 {
            assert_eq!(choice.choose(), StatusCode::OK);
        }
    }

    #[test]
    fn leading_zero_weight_is_skipped() {
        let choice = StatusChoice::parse("500:0,201").expect("should parse");
        let StatusChoice::Weighted(codes) = &choice else {
            panic!("expected a weighted choice");
        };
        assert_eq!(codes.pick(0.0), StatusCode::CREATED);
    }

    #[test]
    fn bare_entries_weigh_one() {
        let choice = StatusChoice::parse("200,418").expect("should parse");
        let StatusChoice::Weighted(codes) = &choice else {
            panic!("expected a weighted choice");
        };
        assert_eq!(codes.total_weight(), 2.0);
        assert!(codes.entries().iter().all(|entry| entry.weight == 1.0));
    }

    #[test]
    fn frequencies_follow_weights() {
        let choice = StatusChoice::parse("200:3,500:1").expect("should parse");
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen: HashMap<StatusCode, u32> = HashMap::new();

        let draws = 40_000;
        for _ in 0..draws {
            *seen.entry(choice.choose_with(&mut rng)).or_default() += 1;
        }

        let ok_share = f64::from(seen[&StatusCode::OK]) / f64::from(draws);
        assert!((ok_share - 0.75).abs() < 0.02, "observed share {ok_share}");
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn fractional_weights_are_accepted() {
        let choice = StatusChoice::parse("200:0.5,204:1.5").expect("should parse");
        let StatusChoice::Weighted(codes) = &choice else {
            panic!("expected a weighted choice");
        };
        assert_eq!(codes.pick(0.49), StatusCode::OK);
        assert_eq!(codes.pick(0.5), StatusCode::NO_CONTENT);
        assert_eq!(codes.pick(1.99), StatusCode::NO_CONTENT);
    }

    #[test]
    fn draw_boundary_uses_strict_comparison() {
        let choice = StatusChoice::parse("200:1,300:1,400:1").expect("should parse");
        let StatusChoice::Weighted(codes) = &choice else {
            panic!("expected a weighted choice");
        };
        assert_eq!(codes.pick(0.0), StatusCode::OK);
        assert_eq!(codes.pick(1.0), StatusCode::MULTIPLE_CHOICES);
        assert_eq!(codes.pick(2.0), StatusCode::BAD_REQUEST);
        assert_eq!(codes.pick(3.0), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_lists_are_rejected() {
        for codes in [
            "200,abc",
            "200:x,500",
            "200:-1,500",
            "200:NaN,500",
            "200:inf,500",
            "200,",
            ",",
            "200:0,500:0",
            "200,700",
        ] {
            assert!(
                matches!(
                    StatusChoice::parse(codes),
                    Err(ShapingError::InvalidArgument(_))
                ),
                "codes {codes:?}"
            );
        }
    }

    #[test]
    fn seeded_generators_repeat_draws() {
        let choice = StatusChoice::parse("200,201,202,203,204").expect("should parse");
        let first: Vec<_> = {
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            (0..32).map(|_| choice.choose_with(&mut rng)).collect()
        };
        let second: Vec<_> = {
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            (0..32).map(|_| choice.choose_with(&mut rng)).collect()
        };
        assert_eq!(first, second);
    }
}
