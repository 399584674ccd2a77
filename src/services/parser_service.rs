//! Turns a raw completion into exercises or flashcards.
//!
//! Quiz grammar, one exercise per `END_EXERCISE`:
//!
//! ```text
//! <question><END_QUESTION>
//! <CORRECT_PROPOSITION>text<END_PROPOSITION>
//! <INCORRECT_PROPOSITION>text<END_PROPOSITION>
//! <END_EXERCISE>
//! ```
//!
//! Flashcard grammar, one card per `END_ANSWER`:
//!
//! ```text
//! <question><END_QUESTION><answer><END_ANSWER>
//! ```
//!
//! Parsing is lenient: malformed chunks and propositions are dropped and
//! reported as warnings. Only an empty result is an error.

use crate::error::{Error, Result};
use crate::models::exercise::{Exercise, McqExercise, Proposition, MAX_PROPOSITIONS, MIN_PROPOSITIONS};
use crate::models::flashcard::Flashcard;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

pub const END_QUESTION: &str = "<END_QUESTION>";
pub const END_EXERCISE: &str = "<END_EXERCISE>";
pub const END_PROPOSITION: &str = "<END_PROPOSITION>";
pub const END_ANSWER: &str = "<END_ANSWER>";
pub const CORRECT_PROPOSITION: &str = "<CORRECT_PROPOSITION>";
pub const INCORRECT_PROPOSITION: &str = "<INCORRECT_PROPOSITION>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentShape {
    Quiz,
    Flashcards,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// The chunk did not split into exactly a question and a body.
    MalformedChunk { chunk: usize },
    EmptyQuestion { chunk: usize },
    EmptyAnswer { chunk: usize },
    UntaggedProposition { chunk: usize, proposition: usize },
    TooFewPropositions { chunk: usize, found: usize },
    TooManyPropositions { chunk: usize, found: usize },
    /// Warning only; the exercise is kept with an empty key.
    NoCorrectProposition { chunk: usize },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::MalformedChunk { chunk } => {
                write!(f, "chunk {} has no single question terminator", chunk)
            }
            ParseWarning::EmptyQuestion { chunk } => write!(f, "chunk {} has an empty question", chunk),
            ParseWarning::EmptyAnswer { chunk } => write!(f, "chunk {} has an empty answer", chunk),
            ParseWarning::UntaggedProposition { chunk, proposition } => write!(
                f,
                "proposition {} of chunk {} is not tagged correct or incorrect",
                proposition, chunk
            ),
            ParseWarning::TooFewPropositions { chunk, found } => {
                write!(f, "chunk {} kept only {} propositions", chunk, found)
            }
            ParseWarning::TooManyPropositions { chunk, found } => write!(
                f,
                "chunk {} has {} propositions, kept the first {}",
                chunk, found, MAX_PROPOSITIONS
            ),
            ParseWarning::NoCorrectProposition { chunk } => {
                write!(f, "chunk {} has no correct proposition", chunk)
            }
        }
    }
}

/// Result of a lenient parse: what survived plus what was dropped and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    pub warnings: Vec<ParseWarning>,
}

impl<T> Parsed<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, warning: ParseWarning) {
        tracing::warn!("Dropping generated content: {}", warning);
        self.warnings.push(warning);
    }

    pub fn truncate(&mut self, max: usize) {
        self.items.truncate(max);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedContent {
    Quiz(Parsed<Exercise>),
    Flashcards(Parsed<Flashcard>),
}

/// Strict entry point: an empty result is reported as the shape's labeled error.
pub fn parse(text: &str, shape: ContentShape) -> Result<ParsedContent> {
    match shape {
        ContentShape::Quiz => {
            let parsed = parse_exercises(text);
            if parsed.items.is_empty() {
                return Err(Error::NoExerciseGenerated);
            }
            Ok(ParsedContent::Quiz(parsed))
        }
        ContentShape::Flashcards => {
            let parsed = parse_flashcards(text);
            if parsed.items.is_empty() {
                return Err(Error::NoCardGenerated);
            }
            Ok(ParsedContent::Flashcards(parsed))
        }
    }
}

/// Splits off the question. `None` unless there is exactly one terminator.
fn split_question(chunk: &str) -> Option<(&str, &str)> {
    let mut parts = chunk.split(END_QUESTION);
    let question = parts.next()?.trim();
    let body = parts.next()?.trim();
    if parts.next().is_some() {
        return None;
    }
    Some((question, body))
}

fn chunks<'a>(text: &'a str, terminator: &'a str) -> impl Iterator<Item = (usize, &'a str)> {
    text.split(terminator)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .enumerate()
}

pub fn parse_exercises(text: &str) -> Parsed<Exercise> {
    let mut parsed = Parsed::new();

    for (chunk_idx, chunk) in chunks(text, END_EXERCISE) {
        let Some((question, body)) = split_question(chunk) else {
            parsed.warn(ParseWarning::MalformedChunk { chunk: chunk_idx });
            continue;
        };
        if question.is_empty() {
            parsed.warn(ParseWarning::EmptyQuestion { chunk: chunk_idx });
            continue;
        }

        let mut tagged: Vec<(bool, &str)> = Vec::new();
        for (prop_idx, raw) in body
            .split(END_PROPOSITION)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .enumerate()
        {
            let entry = if let Some(text) = raw.strip_prefix(CORRECT_PROPOSITION) {
                Some((true, text.trim()))
            } else {
                raw.strip_prefix(INCORRECT_PROPOSITION)
                    .map(|text| (false, text.trim()))
            };
            match entry {
                Some((correct, text)) if !text.is_empty() => tagged.push((correct, text)),
                _ => parsed.warn(ParseWarning::UntaggedProposition {
                    chunk: chunk_idx,
                    proposition: prop_idx,
                }),
            }
        }

        if tagged.len() > MAX_PROPOSITIONS {
            parsed.warn(ParseWarning::TooManyPropositions {
                chunk: chunk_idx,
                found: tagged.len(),
            });
            tagged.truncate(MAX_PROPOSITIONS);
        }
        if tagged.len() < MIN_PROPOSITIONS {
            parsed.warn(ParseWarning::TooFewPropositions {
                chunk: chunk_idx,
                found: tagged.len(),
            });
            continue;
        }

        let answers_indices: BTreeSet<i32> = tagged
            .iter()
            .enumerate()
            .filter(|(_, (correct, _))| *correct)
            .map(|(idx, _)| idx as i32)
            .collect();
        if answers_indices.is_empty() {
            // Kept: a key with no correct proposition is still a valid exercise.
            parsed.warn(ParseWarning::NoCorrectProposition { chunk: chunk_idx });
        }

        let propositions = tagged
            .iter()
            .enumerate()
            .map(|(idx, (_, text))| Proposition {
                id: idx as i32,
                description: text.to_string(),
                image_url: None,
            })
            .collect();

        parsed.items.push(Exercise::Mcq(McqExercise {
            question: question.to_string(),
            propositions,
            number_of_answers: answers_indices.len().max(1) as i32,
            answers_indices,
        }));
    }

    parsed
}

pub fn parse_flashcards(text: &str) -> Parsed<Flashcard> {
    let mut parsed = Parsed::new();

    for (chunk_idx, chunk) in chunks(text, END_ANSWER) {
        let Some((question, answer)) = split_question(chunk) else {
            parsed.warn(ParseWarning::MalformedChunk { chunk: chunk_idx });
            continue;
        };
        if question.is_empty() {
            parsed.warn(ParseWarning::EmptyQuestion { chunk: chunk_idx });
            continue;
        }
        if answer.is_empty() {
            parsed.warn(ParseWarning::EmptyAnswer { chunk: chunk_idx });
            continue;
        }
        parsed.items.push(Flashcard {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_block(question: &str, props: &[(bool, &str)]) -> String {
        let mut block = format!("{}\n{}\n", question, END_QUESTION);
        for (correct, text) in props {
            let tag = if *correct { CORRECT_PROPOSITION } else { INCORRECT_PROPOSITION };
            block.push_str(&format!("{} {} {}\n", tag, text, END_PROPOSITION));
        }
        block.push_str(END_EXERCISE);
        block.push('\n');
        block
    }

    #[test]
    fn parses_five_well_formed_exercises() {
        let text: String = (1..=5)
            .map(|i| {
                exercise_block(
                    &format!("  Question {}?  ", i),
                    &[(false, "alpha"), (true, "beta"), (false, "gamma")],
                )
            })
            .collect();

        let parsed = parse_exercises(&text);
        assert_eq!(parsed.items.len(), 5);
        assert!(parsed.warnings.is_empty());

        for (i, exercise) in parsed.items.iter().enumerate() {
            let Exercise::Mcq(mcq) = exercise else {
                panic!("expected an MCQ")
            };
            assert_eq!(mcq.question, format!("Question {}?", i + 1));
            let descriptions: Vec<&str> =
                mcq.propositions.iter().map(|p| p.description.as_str()).collect();
            assert_eq!(descriptions, vec!["alpha", "beta", "gamma"]);
            assert_eq!(mcq.answers_indices, [1].into_iter().collect());
            assert_eq!(mcq.number_of_answers, 1);
            assert!(exercise.validate().is_ok());
        }
    }

    #[test]
    fn drops_untagged_propositions_but_keeps_the_exercise() {
        let text = format!(
            "Pick one {q} {c} yes {p} maybe {p} {i} no {p} {e}",
            q = END_QUESTION,
            c = CORRECT_PROPOSITION,
            i = INCORRECT_PROPOSITION,
            p = END_PROPOSITION,
            e = END_EXERCISE
        );
        let parsed = parse_exercises(&text);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(
            parsed.warnings,
            vec![ParseWarning::UntaggedProposition { chunk: 0, proposition: 1 }]
        );
        let Exercise::Mcq(mcq) = &parsed.items[0] else {
            panic!("expected an MCQ")
        };
        assert_eq!(mcq.propositions.len(), 2);
        assert_eq!(mcq.propositions[1].description, "no");
    }

    #[test]
    fn discards_malformed_chunks_and_keeps_the_rest() {
        let good = exercise_block("Good?", &[(true, "a"), (false, "b")]);
        let text = format!(
            "no terminator here {e}{q} {c} a {p} {i} b {p} {e}{good}",
            e = END_EXERCISE,
            q = END_QUESTION,
            c = CORRECT_PROPOSITION,
            i = INCORRECT_PROPOSITION,
            p = END_PROPOSITION,
        );
        let parsed = parse_exercises(&text);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].question(), "Good?");
        assert_eq!(
            parsed.warnings,
            vec![
                ParseWarning::MalformedChunk { chunk: 0 },
                ParseWarning::EmptyQuestion { chunk: 1 },
            ]
        );
    }

    #[test]
    fn keeps_exercise_without_a_correct_proposition() {
        let text = format!(
            "{}{}",
            exercise_block("Q1", &[(false, "a"), (false, "b")]),
            exercise_block("Q2", &[(true, "c"), (false, "d")])
        );
        let parsed = parse_exercises(&text);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.warnings, vec![ParseWarning::NoCorrectProposition { chunk: 0 }]);

        let Exercise::Mcq(mcq) = &parsed.items[0] else {
            panic!("expected an MCQ")
        };
        assert!(mcq.answers_indices.is_empty());
        assert_eq!(mcq.number_of_answers, 1);
        assert_eq!(mcq.propositions.len(), 2);
        assert!(parsed.items[0].validate().is_ok());
    }

    #[test]
    fn empty_or_garbage_input_is_no_exercise_generated() {
        assert!(parse_exercises("").items.is_empty());
        assert!(parse_exercises("just some prose").items.is_empty());
        assert!(matches!(
            parse("just some prose", ContentShape::Quiz),
            Err(Error::NoExerciseGenerated)
        ));
    }

    #[test]
    fn parses_flashcards() {
        let text = format!(
            "What is Rust? {q} A language. {a}\n  {q} orphan answer {a}\nCapital of France?{q}Paris{a}",
            q = END_QUESTION,
            a = END_ANSWER
        );
        let parsed = parse_flashcards(&text);
        assert_eq!(
            parsed.items,
            vec![
                Flashcard { question: "What is Rust?".into(), answer: "A language.".into() },
                Flashcard { question: "Capital of France?".into(), answer: "Paris".into() },
            ]
        );
        assert_eq!(parsed.warnings, vec![ParseWarning::EmptyQuestion { chunk: 1 }]);
        assert!(matches!(parse("", ContentShape::Flashcards), Err(Error::NoCardGenerated)));
    }
}
