//! # Story Data Model
//!
//! The installment type the session plays back, plus the small value types
//! shared across the session modules.
//!
//! An installment arrives from the generator as raw chunks and choices.
//! [`Installment::new`] validates the choice contract, normalizes point
//! values, and appends the synthetic narration suffix (a choice prompt and
//! one readable line per option) when the generator did not already
//! include it.

use crate::error::{Result, SessionError};
use bridge_traits::story::{Choice, Expression, StoryChunk, StoryResponse};
use serde::{Deserialize, Serialize};

/// Number of choices every installment carries, by contract with the
/// generator.
pub const CHOICE_COUNT: usize = 3;

/// Text of the synthetic chunk typed out before the options.
pub const CHOICE_PROMPT_TEXT: &str = "What should we do next?";

/// Points awarded for the safe option.
pub const SAFE_POINTS: i32 = 10;

/// Points deducted for an unsafe option.
pub const UNSAFE_POINTS: i32 = -5;

/// One generated unit of story: ordered narration chunks (including the
/// synthetic choice suffix), exactly three choices, and an optional scene
/// illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    chunks: Vec<StoryChunk>,
    choices: Vec<Choice>,
    image_url: Option<String>,
}

impl Installment {
    /// Build an installment from generator output.
    ///
    /// Validates defensively instead of trusting the upstream contract:
    /// anything other than exactly three choices is an error, and points
    /// that disagree with the `safe` flag are normalized (safe is worth
    /// [`SAFE_POINTS`], unsafe with negative points [`UNSAFE_POINTS`],
    /// anything else is a neutral 0).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyStory`] for an empty chunk list and
    /// [`SessionError::ChoiceCount`] for a malformed choice array.
    pub fn new(
        chunks: Vec<StoryChunk>,
        choices: Vec<Choice>,
        image_url: Option<String>,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(SessionError::EmptyStory);
        }
        if choices.len() != CHOICE_COUNT {
            return Err(SessionError::ChoiceCount(choices.len()));
        }

        let choices: Vec<Choice> = choices.into_iter().map(normalize_choice).collect();

        let mut chunks = chunks;
        if !has_choice_suffix(&chunks, &choices) {
            chunks.push(StoryChunk::new(CHOICE_PROMPT_TEXT, Expression::Thinking));
            for (index, choice) in choices.iter().enumerate() {
                // Choices are read neutrally.
                chunks.push(StoryChunk::new(
                    option_line(index, &choice.text),
                    Expression::Neutral,
                ));
            }
        }

        Ok(Self {
            chunks,
            choices,
            image_url,
        })
    }

    /// Build an installment from a raw generator response.
    pub fn from_response(response: StoryResponse) -> Result<Self> {
        Self::new(response.story, response.choices, response.image_url)
    }

    /// All narration chunks, synthetic suffix included.
    pub fn chunks(&self) -> &[StoryChunk] {
        &self.chunks
    }

    /// The three decision options.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Scene illustration URL, when the generator produced one.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// The single narration line spoken when the choices become visible:
    /// the question plus every option text.
    pub fn choice_narration(&self) -> String {
        let options = self
            .choices
            .iter()
            .enumerate()
            .map(|(index, choice)| format!("Choice {}: {}", index + 1, choice.text))
            .collect::<Vec<_>>()
            .join(", ");
        format!("What will you do? {options}")
    }
}

/// The transient message shown and spoken after a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Whether the committed choice was the safe behavior.
    pub safe: bool,
    /// The feedback line displayed and narrated.
    pub text: String,
}

fn normalize_choice(choice: Choice) -> Choice {
    let points = if choice.safe {
        SAFE_POINTS
    } else if choice.points < 0 {
        UNSAFE_POINTS
    } else {
        0
    };
    Choice { points, ..choice }
}

fn option_line(index: usize, text: &str) -> String {
    format!("Option {}: {}", index + 1, text)
}

/// Whether the chunk list already ends with the synthetic suffix for these
/// choices. Generators that pre-structure their output send it; direct
/// chunk lists do not.
fn has_choice_suffix(chunks: &[StoryChunk], choices: &[Choice]) -> bool {
    if chunks.len() < choices.len() + 1 {
        return false;
    }
    let prompt_at = chunks.len() - choices.len() - 1;
    if chunks[prompt_at].text != CHOICE_PROMPT_TEXT {
        return false;
    }
    chunks[prompt_at + 1..]
        .iter()
        .zip(choices)
        .enumerate()
        .all(|(index, (chunk, choice))| chunk.text == option_line(index, &choice.text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_choices() -> Vec<Choice> {
        vec![
            Choice {
                text: "Ask an adult for help".into(),
                safe: true,
                points: 10,
            },
            Choice {
                text: "Wait and see what happens".into(),
                safe: false,
                points: 0,
            },
            Choice {
                text: "Go in alone".into(),
                safe: false,
                points: -5,
            },
        ]
    }

    #[test]
    fn appends_choice_suffix() {
        let installment = Installment::new(
            vec![
                StoryChunk::new("Luna walked to the park.", Expression::Neutral),
                StoryChunk::new("A stranger waved at her.", Expression::Concerned),
            ],
            three_choices(),
            None,
        )
        .unwrap();

        // 2 story chunks + prompt + 3 option lines.
        assert_eq!(installment.chunks().len(), 6);
        assert_eq!(installment.chunks()[2].text, CHOICE_PROMPT_TEXT);
        assert_eq!(installment.chunks()[2].expression, Expression::Thinking);
        assert_eq!(
            installment.chunks()[3].text,
            "Option 1: Ask an adult for help"
        );
        assert_eq!(installment.chunks()[5].expression, Expression::Neutral);
    }

    #[test]
    fn single_chunk_story_still_gets_suffix() {
        let installment = Installment::new(
            vec![StoryChunk::new("Watch out!", Expression::Concerned)],
            three_choices(),
            None,
        )
        .unwrap();
        assert_eq!(installment.chunks().len(), 5);
        assert_eq!(installment.chunks()[1].text, CHOICE_PROMPT_TEXT);
    }

    #[test]
    fn pre_structured_chunks_are_not_suffixed_twice() {
        let first = Installment::new(
            vec![StoryChunk::new("Once upon a time.", Expression::Neutral)],
            three_choices(),
            None,
        )
        .unwrap();
        let second = Installment::new(first.chunks().to_vec(), three_choices(), None).unwrap();
        assert_eq!(second.chunks().len(), first.chunks().len());
    }

    #[test]
    fn rejects_wrong_choice_count() {
        let chunks = vec![StoryChunk::new("Hello.", Expression::Neutral)];
        let mut choices = three_choices();
        choices.pop();
        assert!(matches!(
            Installment::new(chunks.clone(), choices, None),
            Err(SessionError::ChoiceCount(2))
        ));
        assert!(matches!(
            Installment::new(chunks, Vec::new(), None),
            Err(SessionError::ChoiceCount(0))
        ));
    }

    #[test]
    fn rejects_empty_story() {
        assert!(matches!(
            Installment::new(Vec::new(), three_choices(), None),
            Err(SessionError::EmptyStory)
        ));
    }

    #[test]
    fn normalizes_points_from_safe_flag() {
        let chunks = vec![StoryChunk::new("Hello.", Expression::Neutral)];
        let choices = vec![
            Choice {
                text: "Safe but mispriced".into(),
                safe: true,
                points: 3,
            },
            Choice {
                text: "Unsafe and negative".into(),
                safe: false,
                points: -50,
            },
            Choice {
                text: "Unsafe but harmless".into(),
                safe: false,
                points: 7,
            },
        ];
        let installment = Installment::new(chunks, choices, None).unwrap();
        assert_eq!(installment.choices()[0].points, SAFE_POINTS);
        assert_eq!(installment.choices()[1].points, UNSAFE_POINTS);
        assert_eq!(installment.choices()[2].points, 0);
    }

    #[test]
    fn choice_narration_concatenates_all_options() {
        let installment = Installment::new(
            vec![StoryChunk::new("Hello.", Expression::Neutral)],
            three_choices(),
            None,
        )
        .unwrap();
        assert_eq!(
            installment.choice_narration(),
            "What will you do? Choice 1: Ask an adult for help, \
             Choice 2: Wait and see what happens, Choice 3: Go in alone"
        );
    }
}
