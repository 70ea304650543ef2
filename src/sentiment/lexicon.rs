use super::aggregate::{PolarityScorer, PolarityScores};
use super::clean::CommentCleaner;
use crate::prelude::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

const BOOST_INCREMENT: f64 = 0.293;
const BOOST_DECREMENT: f64 = -0.293;
const CAPS_INCREMENT: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZE_ALPHA: f64 = 15.0;

/// Mean valence ratings (-4..=4) for words common in video comments.
const VALENCES: &[(&str, f64)] = &[
    ("abandon", -1.9),
    ("abuse", -3.2),
    ("accurate", 1.6),
    ("addicted", -1.3),
    ("admire", 2.1),
    ("adorable", 2.2),
    ("afraid", -2.2),
    ("agree", 1.5),
    ("amazed", 2.2),
    ("amazing", 2.8),
    ("amused", 1.6),
    ("angry", -2.3),
    ("annoyed", -1.6),
    ("annoying", -1.7),
    ("appreciate", 1.7),
    ("appreciated", 2.3),
    ("ashamed", -2.1),
    ("awesome", 3.1),
    ("awful", -2.0),
    ("awkward", -0.6),
    ("bad", -2.5),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("better", 1.9),
    ("bless", 1.8),
    ("blessed", 2.9),
    ("bored", -1.1),
    ("boring", -1.3),
    ("brave", 2.4),
    ("brilliant", 2.8),
    ("broken", -1.4),
    ("bug", -1.2),
    ("calm", 1.3),
    ("care", 2.2),
    ("careful", 0.6),
    ("cheat", -2.0),
    ("cheer", 2.3),
    ("clean", 1.7),
    ("clear", 1.6),
    ("clever", 2.0),
    ("comfortable", 1.9),
    ("confused", -1.3),
    ("confusing", -0.9),
    ("congrats", 2.4),
    ("congratulations", 2.9),
    ("cool", 1.3),
    ("crap", -1.6),
    ("crazy", -1.4),
    ("creative", 1.9),
    ("cringe", -1.6),
    ("cry", -2.1),
    ("cute", 2.0),
    ("damn", -1.7),
    ("dead", -3.3),
    ("delight", 2.9),
    ("depressed", -2.3),
    ("depressing", -1.6),
    ("deserve", 0.9),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("disgusting", -2.4),
    ("dislike", -1.6),
    ("dumb", -2.3),
    ("easy", 1.9),
    ("educational", 1.4),
    ("effective", 2.1),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("entertaining", 1.8),
    ("epic", 2.5),
    ("error", -1.7),
    ("evil", -3.4),
    ("excellent", 2.7),
    ("excited", 1.4),
    ("exciting", 2.2),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("fake", -2.1),
    ("fantastic", 2.6),
    ("fascinating", 2.5),
    ("fav", 2.0),
    ("favorite", 2.0),
    ("favourite", 2.0),
    ("fear", -2.2),
    ("fine", 0.8),
    ("fire", -1.4),
    ("fool", -1.9),
    ("free", 2.3),
    ("fun", 2.3),
    ("funny", 1.9),
    ("garbage", -2.1),
    ("genius", 1.9),
    ("glad", 2.0),
    ("good", 1.9),
    ("gorgeous", 3.0),
    ("grateful", 2.0),
    ("great", 3.1),
    ("gross", -2.1),
    ("haha", 2.0),
    ("hahaha", 2.6),
    ("happy", 2.7),
    ("hard", -0.4),
    ("harm", -2.5),
    ("hate", -2.7),
    ("hated", -3.2),
    ("heartbreaking", -2.7),
    ("hell", -3.6),
    ("help", 1.7),
    ("helped", 1.6),
    ("helpful", 1.8),
    ("hilarious", 1.7),
    ("honest", 2.3),
    ("hope", 1.9),
    ("horrible", -2.5),
    ("hurt", -2.4),
    ("idiot", -2.3),
    ("ignorant", -1.1),
    ("impressive", 2.3),
    ("incredible", 2.2),
    ("informative", 1.8),
    ("insane", -1.7),
    ("inspiring", 2.2),
    ("interesting", 1.7),
    ("joke", 1.2),
    ("joy", 2.8),
    ("kill", -3.7),
    ("kind", 2.4),
    ("lame", -1.8),
    ("laugh", 2.6),
    ("lazy", -1.5),
    ("legend", 1.6),
    ("legendary", 2.0),
    ("liar", -2.8),
    ("like", 1.5),
    ("liked", 1.8),
    ("lmao", 2.0),
    ("lol", 1.8),
    ("lose", -1.7),
    ("loser", -2.4),
    ("lost", -1.3),
    ("love", 3.2),
    ("loved", 2.9),
    ("lovely", 2.8),
    ("loving", 2.9),
    ("lucky", 1.8),
    ("mad", -2.2),
    ("masterpiece", 3.1),
    ("mess", -1.5),
    ("miss", -0.6),
    ("mistake", -1.4),
    ("nasty", -2.6),
    ("nice", 1.8),
    ("no", -1.2),
    ("ok", 1.2),
    ("okay", 0.9),
    ("pain", -2.3),
    ("pathetic", -2.6),
    ("peace", 2.5),
    ("perfect", 2.7),
    ("perfectly", 3.2),
    ("pleasant", 2.3),
    ("please", 1.3),
    ("pointless", -1.7),
    ("poor", -2.1),
    ("positive", 2.6),
    ("powerful", 1.8),
    ("pretty", 2.2),
    ("problem", -1.7),
    ("proud", 2.1),
    ("rage", -2.6),
    ("recommend", 1.5),
    ("relaxing", 2.2),
    ("respect", 2.1),
    ("ridiculous", -1.5),
    ("rip", -1.8),
    ("rude", -2.0),
    ("ruined", -2.2),
    ("sad", -2.1),
    ("safe", 1.9),
    ("scam", -2.7),
    ("scared", -1.9),
    ("shame", -2.1),
    ("shit", -2.6),
    ("sick", -2.3),
    ("silly", 0.1),
    ("slow", -1.0),
    ("smart", 1.7),
    ("smile", 1.5),
    ("solid", 0.6),
    ("sorry", -0.3),
    ("spam", -1.5),
    ("strong", 2.3),
    ("stupid", -2.4),
    ("stunning", 1.6),
    ("success", 2.7),
    ("suck", -1.9),
    ("sucks", -1.5),
    ("super", 2.9),
    ("support", 1.7),
    ("sure", 1.3),
    ("sweet", 2.0),
    ("talent", 1.6),
    ("talented", 2.3),
    ("terrible", -2.1),
    ("thank", 1.5),
    ("thankful", 2.7),
    ("thanks", 1.9),
    ("tired", -1.9),
    ("top", 0.8),
    ("trash", -1.5),
    ("true", 2.0),
    ("trust", 2.3),
    ("ugly", -2.3),
    ("underrated", -0.9),
    ("unfair", -2.1),
    ("unhappy", -1.8),
    ("upset", -1.6),
    ("useful", 1.9),
    ("useless", -1.8),
    ("valuable", 2.1),
    ("waste", -1.8),
    ("wasted", -2.2),
    ("weak", -1.9),
    ("weird", -0.7),
    ("welcome", 2.0),
    ("win", 2.8),
    ("wonderful", 2.7),
    ("worse", -2.1),
    ("worst", -3.1),
    ("worth", 0.9),
    ("wow", 2.8),
    ("wrong", -2.1),
    ("yay", 2.4),
    ("yes", 1.7),
    (":)", 2.0),
    (":(", -1.9),
    (":d", 2.9),
    ("<3", 1.9),
];

const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOST_INCREMENT),
    ("amazingly", BOOST_INCREMENT),
    ("completely", BOOST_INCREMENT),
    ("deeply", BOOST_INCREMENT),
    ("enormously", BOOST_INCREMENT),
    ("entirely", BOOST_INCREMENT),
    ("especially", BOOST_INCREMENT),
    ("exceptionally", BOOST_INCREMENT),
    ("extremely", BOOST_INCREMENT),
    ("fully", BOOST_INCREMENT),
    ("greatly", BOOST_INCREMENT),
    ("hella", BOOST_INCREMENT),
    ("highly", BOOST_INCREMENT),
    ("hugely", BOOST_INCREMENT),
    ("incredibly", BOOST_INCREMENT),
    ("intensely", BOOST_INCREMENT),
    ("majorly", BOOST_INCREMENT),
    ("more", BOOST_INCREMENT),
    ("most", BOOST_INCREMENT),
    ("particularly", BOOST_INCREMENT),
    ("purely", BOOST_INCREMENT),
    ("quite", BOOST_INCREMENT),
    ("really", BOOST_INCREMENT),
    ("remarkably", BOOST_INCREMENT),
    ("so", BOOST_INCREMENT),
    ("substantially", BOOST_INCREMENT),
    ("thoroughly", BOOST_INCREMENT),
    ("totally", BOOST_INCREMENT),
    ("tremendously", BOOST_INCREMENT),
    ("unbelievably", BOOST_INCREMENT),
    ("unusually", BOOST_INCREMENT),
    ("utterly", BOOST_INCREMENT),
    ("very", BOOST_INCREMENT),
    ("almost", BOOST_DECREMENT),
    ("barely", BOOST_DECREMENT),
    ("hardly", BOOST_DECREMENT),
    ("kinda", BOOST_DECREMENT),
    ("less", BOOST_DECREMENT),
    ("little", BOOST_DECREMENT),
    ("marginally", BOOST_DECREMENT),
    ("occasionally", BOOST_DECREMENT),
    ("partly", BOOST_DECREMENT),
    ("scarcely", BOOST_DECREMENT),
    ("slightly", BOOST_DECREMENT),
    ("somewhat", BOOST_DECREMENT),
    ("sorta", BOOST_DECREMENT),
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "mightnt", "mustnt", "neednt", "never", "neither", "none", "nope",
    "nor", "not", "nothing", "nowhere", "oughtnt", "shant", "shouldnt", "wasnt", "werent",
    "without", "wont", "wouldnt", "rarely", "seldom", "despite",
];

static LEXICON: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| VALENCES.iter().copied().collect());

static BOOSTER_MAP: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| BOOSTERS.iter().copied().collect());

/// Rule-based valence scorer in the style of VADER.
pub struct LexiconScorer {
    cleaner: CommentCleaner,
}

impl LexiconScorer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cleaner: CommentCleaner::new()?,
        })
    }

    fn token_valence(&self, tokens: &[&str], index: usize, caps_differ: bool) -> f64 {
        let token = tokens[index];
        let lower = token.to_lowercase();
        let Some(&base) = LEXICON.get(lower.as_str()) else {
            return 0.0;
        };

        let mut valence = base;
        if caps_differ && is_all_caps(token) {
            valence += CAPS_INCREMENT.copysign(valence);
        }

        // look back up to three tokens for boosters and negations
        for distance in 1..=3 {
            if index < distance {
                break;
            }
            let previous = tokens[index - distance].to_lowercase();
            if LEXICON.contains_key(previous.as_str()) {
                continue;
            }

            let mut boost = booster_scalar(tokens[index - distance], valence, caps_differ);
            if distance == 2 {
                boost *= 0.95;
            } else if distance == 3 {
                boost *= 0.9;
            }
            valence += boost;

            if is_negation(&previous) {
                valence *= NEGATION_SCALAR;
            }
        }

        valence
    }
}

impl PolarityScorer for LexiconScorer {
    fn polarity_scores(&self, text: &str) -> PolarityScores {
        let cleaned = self.cleaner.clean(text);
        let tokens = tokenize(&cleaned);
        if tokens.is_empty() {
            return PolarityScores::NEUTRAL;
        }

        let caps_differ = has_caps_differential(&tokens);
        let mut sentiments: Vec<f64> = (0..tokens.len())
            .map(|index| {
                let lower = tokens[index].to_lowercase();
                if BOOSTER_MAP.contains_key(lower.as_str()) {
                    0.0
                } else {
                    self.token_valence(&tokens, index, caps_differ)
                }
            })
            .collect();

        apply_but_rule(&tokens, &mut sentiments);
        score_valence(&sentiments, &cleaned)
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|token| {
            let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
            // short tokens keep their punctuation so emoticons survive
            if stripped.len() <= 2 {
                token
            } else {
                stripped
            }
        })
        .filter(|token| token.len() > 1)
        .collect()
}

fn is_all_caps(token: &str) -> bool {
    let mut letters = token.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn has_caps_differential(tokens: &[&str]) -> bool {
    let caps = tokens.iter().filter(|token| is_all_caps(token)).count();
    caps > 0 && caps < tokens.len()
}

fn is_negation(lower: &str) -> bool {
    let folded = lower.replace('\'', "");
    NEGATIONS.contains(&folded.as_str()) || lower.contains("n't")
}

fn booster_scalar(token: &str, valence: f64, caps_differ: bool) -> f64 {
    let Some(&scalar) = BOOSTER_MAP.get(token.to_lowercase().as_str()) else {
        return 0.0;
    };

    let mut scalar = if valence < 0.0 { -scalar } else { scalar };
    if caps_differ && is_all_caps(token) {
        scalar += CAPS_INCREMENT.copysign(valence);
    }
    scalar
}

/// Sentiment before "but" is damped and sentiment after it is stressed.
fn apply_but_rule(tokens: &[&str], sentiments: &mut [f64]) {
    let Some(but) = tokens.iter().position(|t| t.eq_ignore_ascii_case("but")) else {
        return;
    };

    for (index, sentiment) in sentiments.iter_mut().enumerate() {
        if index < but {
            *sentiment *= 0.5;
        } else if index > but {
            *sentiment *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * 0.292;
    let questions = match text.matches('?').count() {
        0 | 1 => 0.0,
        n @ 2..=3 => n as f64 * 0.18,
        _ => 0.96,
    };
    exclamations + questions
}

fn score_valence(sentiments: &[f64], text: &str) -> PolarityScores {
    let emphasis = punctuation_emphasis(text);
    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }
    let compound = (sum / (sum * sum + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0);

    let mut positive_sum = 0.0;
    let mut negative_sum = 0.0;
    let mut neutral_count = 0.0;
    for &sentiment in sentiments {
        if sentiment > 0.0 {
            positive_sum += sentiment + 1.0;
        } else if sentiment < 0.0 {
            negative_sum += sentiment - 1.0;
        } else {
            neutral_count += 1.0;
        }
    }

    if positive_sum > negative_sum.abs() {
        positive_sum += emphasis;
    } else if positive_sum < negative_sum.abs() {
        negative_sum -= emphasis;
    }

    let total = positive_sum + negative_sum.abs() + neutral_count;
    if total == 0.0 {
        return PolarityScores::NEUTRAL;
    }

    PolarityScores {
        compound: round_to(compound, 4),
        positive: round_to((positive_sum / total).abs(), 3),
        negative: round_to((negative_sum / total).abs(), 3),
        neutral: round_to((neutral_count / total).abs(), 3),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
