use serde::{Deserialize, Serialize};

/// Opening situation of the "Financial Quest" chapter.
pub const INITIAL_CONTEXT: &str = "You are a small business owner in a Barangay in Manila. You run a Sari-Sari store. Business is okay, but your loan payment for your refrigerator is due in 3 days. You have just enough cash, but your supplier offers a bulk discount on soft drinks today only.";

/// A chapter ends after this many choices.
pub const CHAPTER_TURNS: u32 = 3;

const DEFAULT_OPTION_A: &str = "Continue carefully.";
const DEFAULT_OPTION_B: &str = "Take a risk.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryOption {
    pub label: String,
    pub next_context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryScenario {
    pub text: String,
    pub options: Vec<StoryOption>,
}

impl StoryScenario {
    /// Opening scene shown before the first model call.
    pub fn opening() -> Self {
        Self {
            text: "You are a small business owner. Your loan payment is due in 3 days, but your supplier offers a huge discount on stock today. What do you do?".to_string(),
            options: vec![
                option("A", "Buy the stock to make more profit later."),
                option("B", "Skip the stock and keep cash for the loan."),
            ],
        }
    }

    /// Reads `[story]` followed by `Option A: ...` / `Option B: ...` lines.
    ///
    /// Missing options get neutral defaults so the chapter can always continue.
    pub fn parse(raw: &str) -> Self {
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let text = lines
            .iter()
            .find(|line| !is_option_line(line))
            .copied()
            .unwrap_or_default()
            .to_string();

        let a = find_option(&lines, "A").unwrap_or(DEFAULT_OPTION_A);
        let b = find_option(&lines, "B").unwrap_or(DEFAULT_OPTION_B);

        Self {
            text,
            options: vec![option("A", a), option("B", b)],
        }
    }
}

fn option(label: &str, action: &str) -> StoryOption {
    StoryOption {
        label: label.to_string(),
        next_context: action.to_string(),
    }
}

fn is_option_line(line: &str) -> bool {
    line.contains("Option A") || line.contains("Option B")
}

fn find_option<'a>(lines: &[&'a str], label: &str) -> Option<&'a str> {
    let marker = format!("Option {label}");
    lines.iter().copied().find_map(|line| {
        line.split_once(marker.as_str())
            .map(|(_, rest)| rest.trim_start_matches(':').trim())
    })
}

/// Running state of one chapter. The client sends it back with every choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryProgress {
    pub context: String,
    pub turn: u32,
}

impl Default for StoryProgress {
    fn default() -> Self {
        Self {
            context: INITIAL_CONTEXT.to_string(),
            turn: 1,
        }
    }
}

impl StoryProgress {
    pub fn is_final_turn(&self) -> bool {
        self.turn >= CHAPTER_TURNS
    }

    /// Appends the player's choice and its outcome to the running context.
    pub fn advance(&self, choice: &str, outcome: &StoryScenario) -> Self {
        Self {
            context: format!(
                "{} User chose: {choice}. Result: {}",
                self.context, outcome.text
            ),
            turn: self.turn + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_story_and_both_options() {
        let raw = "You bought the stock and sales doubled.\n\nOption A: Pay the loan early.\nOption B: Expand the store.";
        let scenario = StoryScenario::parse(raw);
        assert_eq!(scenario.text, "You bought the stock and sales doubled.");
        assert_eq!(scenario.options[0].next_context, "Pay the loan early.");
        assert_eq!(scenario.options[1].next_context, "Expand the store.");
    }

    #[test]
    fn missing_options_fall_back_to_defaults() {
        let scenario = StoryScenario::parse("The story engine rambled on.");
        assert_eq!(scenario.options[0].next_context, "Continue carefully.");
        assert_eq!(scenario.options[1].next_context, "Take a risk.");
    }

    #[test]
    fn chapter_ends_on_third_turn() {
        let start = StoryProgress::default();
        assert!(!start.is_final_turn());
        let outcome = StoryScenario::parse("Sales went up.");
        let next = start.advance("Buy the stock", &outcome).advance("Save", &outcome);
        assert_eq!(next.turn, 3);
        assert!(next.is_final_turn());
        assert!(next.context.contains("User chose: Buy the stock. Result: Sales went up."));
    }
}
