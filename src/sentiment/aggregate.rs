use crate::models::CommentSentiment;
use anyhow::anyhow;
use itertools::Itertools;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarityScores {
    pub compound: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl PolarityScores {
    /// Text with nothing to score is entirely neutral.
    pub const NEUTRAL: PolarityScores = PolarityScores {
        compound: 0.0,
        positive: 0.0,
        negative: 0.0,
        neutral: 1.0,
    };
}

/// Scores a single piece of text.
pub trait PolarityScorer: Send + Sync {
    fn polarity_scores(&self, text: &str) -> PolarityScores;
}

/// How a video's comments are folded into one sentiment. The two give
/// different numbers for the same comments, so callers always name one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregation {
    /// Score every comment, then average each measure.
    #[default]
    Mean,
    /// Join all comments with spaces and score the result once.
    Concatenate,
}

impl FromStr for Aggregation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Aggregation::Mean),
            "concatenate" | "concat" => Ok(Aggregation::Concatenate),
            other => Err(anyhow!(
                "unknown aggregation {:?}, expected \"mean\" or \"concatenate\"",
                other
            )),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Mean => write!(f, "mean"),
            Aggregation::Concatenate => write!(f, "concatenate"),
        }
    }
}

pub fn score_comments(
    scorer: &impl PolarityScorer,
    comments: &[String],
    aggregation: Aggregation,
) -> CommentSentiment {
    if comments.is_empty() {
        return CommentSentiment::NEUTRAL;
    }

    match aggregation {
        Aggregation::Mean => {
            let n = comments.len() as f64;
            let (compound, positive, negative, neutral) = comments
                .iter()
                .map(|comment| scorer.polarity_scores(comment))
                .fold((0.0, 0.0, 0.0, 0.0), |acc, s| {
                    (
                        acc.0 + s.compound,
                        acc.1 + s.positive,
                        acc.2 + s.negative,
                        acc.3 + s.neutral,
                    )
                });
            CommentSentiment {
                compound: compound / n,
                positive: positive / n,
                negative: negative / n,
                neutral: neutral / n,
                total_comments: comments.len(),
            }
        }
        Aggregation::Concatenate => {
            let joined = comments.iter().join(" ");
            if joined.trim().is_empty() {
                return CommentSentiment::NEUTRAL;
            }
            let s = scorer.polarity_scores(&joined);
            CommentSentiment {
                compound: s.compound,
                positive: s.positive,
                negative: s.negative,
                neutral: s.neutral,
                total_comments: comments.len(),
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::sentiment::lexicon::LexiconScorer;
    use std::collections::HashMap;

    /// Returns fixed scores per exact text; anything else is neutral.
    pub struct FixedScorer(pub HashMap<String, f64>);

    impl FixedScorer {
        pub fn new(scores: &[(&str, f64)]) -> Self {
            Self(scores.iter().map(|(t, c)| (t.to_string(), *c)).collect())
        }
    }

    impl PolarityScorer for FixedScorer {
        fn polarity_scores(&self, text: &str) -> PolarityScores {
            let compound = self.0.get(text).copied().unwrap_or(0.0);
            PolarityScores {
                compound,
                positive: compound.max(0.0),
                negative: (-compound).max(0.0),
                neutral: 1.0 - compound.abs(),
            }
        }
    }

    fn strings(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_input_is_neutral_for_both_strategies() {
        let scorer = FixedScorer::new(&[]);
        for aggregation in [Aggregation::Mean, Aggregation::Concatenate] {
            let sentiment = score_comments(&scorer, &[], aggregation);
            assert_eq!(sentiment, CommentSentiment::NEUTRAL);
            assert_eq!(sentiment.total_comments, 0);
        }
    }

    #[test]
    fn mean_of_three_comments() {
        let scorer = FixedScorer::new(&[("a", 0.5), ("b", -0.2), ("c", 0.0)]);
        let sentiment = score_comments(&scorer, &strings(&["a", "b", "c"]), Aggregation::Mean);
        assert!((sentiment.compound - 0.1).abs() < 1e-9);
        assert_eq!(sentiment.total_comments, 3);
    }

    #[test]
    fn concatenate_scores_the_joined_text_once() {
        let scorer = FixedScorer::new(&[("a b", 0.9), ("a", 0.1), ("b", 0.1)]);
        let sentiment = score_comments(&scorer, &strings(&["a", "b"]), Aggregation::Concatenate);
        assert_eq!(sentiment.compound, 0.9);
        assert_eq!(sentiment.total_comments, 2);
    }

    #[test]
    fn blank_comments_concatenate_to_neutral() {
        let scorer = FixedScorer::new(&[]);
        let sentiment =
            score_comments(&scorer, &strings(&["  ", ""]), Aggregation::Concatenate);
        assert_eq!(sentiment, CommentSentiment::NEUTRAL);
    }

    #[test]
    fn emoji_only_comments_stay_neutral_under_both_strategies() {
        let scorer = LexiconScorer::new().unwrap();
        let comments = strings(&["\u{1F525}", "\u{1F602}\u{1F602}"]);
        for aggregation in [Aggregation::Mean, Aggregation::Concatenate] {
            let sentiment = score_comments(&scorer, &comments, aggregation);
            assert_eq!(sentiment.compound, 0.0);
            assert_eq!(sentiment.neutral, 1.0);
            assert_eq!(sentiment.total_comments, 2);
        }
    }

    #[test]
    fn mean_proportions_sum_to_one_with_wordless_comments() {
        let scorer = LexiconScorer::new().unwrap();
        let sentiment = score_comments(
            &scorer,
            &strings(&["great", "\u{1F44D}"]),
            Aggregation::Mean,
        );
        let total = sentiment.positive + sentiment.negative + sentiment.neutral;
        assert!((total - 1.0).abs() < 0.01, "{:?}", sentiment);
        assert_eq!(sentiment.neutral, 0.5);
    }

    #[test]
    fn aggregation_parses_case_insensitively() {
        assert_eq!("MEAN".parse::<Aggregation>().unwrap(), Aggregation::Mean);
        assert_eq!("concat".parse::<Aggregation>().unwrap(), Aggregation::Concatenate);
        assert!("median".parse::<Aggregation>().is_err());
        assert_eq!(Aggregation::Concatenate.to_string(), "concatenate");
    }
}
