//! Mentor, contract companion, story mode, and shopping insights.
//!
//! Every operation asks the language model first and degrades to a fixed reply when the model
//! is offline, fails, or answers with something unusable. None of them return errors.

pub mod insights;
pub mod router;
pub mod story;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use insights::{Affordability, UpgradePrediction, Urgency};
pub use router::{advisor_router, AdvisorState};
pub use story::{StoryOption, StoryProgress, StoryScenario};

use crate::llm::{decode_json, generate_text, GenerationRequest, LanguageModel, ModelError};
use crate::workflows::account::LoyaltyLevel;
use crate::workflows::tradein::domain::{DeviceCategory, Pesos};
use crate::workflows::tradein::scanner::{inspect_condition, VisualInspection};
use insights::RemoteAffordability;

const MENTOR_SYSTEM_INSTRUCTION: &str = "You are the Home Credit AI Financial Life Mentor.
Your persona is \"SafeRoute\" - empathetic, non-judgmental, supportive, and proactively helpful.
Your goal is to help users manage their finances, understand their loans, and prevent overdue payments.
You speak in simple, clear language suitable for someone with basic financial literacy.
You encourage positive behavior and celebrate small wins.
If a user is stressed about payment, offer reassurance and suggest looking at the \"Smart Adjustment Tools\" like extensions or split payments.
Keep responses concise (under 150 words) unless asked for a detailed explanation.";

const MENTOR_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Fixed replies for a text operation: one for an empty answer, one for a failed call.
struct Fallbacks {
    empty: &'static str,
    failed: &'static str,
}

const MENTOR: Fallbacks = Fallbacks {
    empty: "I'm having trouble connecting right now, but remember I'm here to support you.",
    failed: "I apologize, but I'm currently unable to process your request. Please try again later.",
};

const RISK_TIP: Fallbacks = Fallbacks {
    empty: "Stay on track with small savings daily!",
    failed: "Keep up the good work on tracking your payments.",
};

const CLAUSE: Fallbacks = Fallbacks {
    empty: "I couldn't simplify that right now, but it generally refers to your obligations.",
    failed: "Service unavailable.",
};

const SCENARIO: Fallbacks = Fallbacks {
    empty: "That usually incurs a late fee.",
    failed: "Unable to simulate right now.",
};

const STORY: Fallbacks = Fallbacks {
    empty: "The story continues... try making a choice.",
    failed: "You made a choice, but the story engine is resting. Try again later.",
};

pub struct Advisor {
    model: Arc<dyn LanguageModel>,
}

impl Advisor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Mentor chat reply to the last user message in `history`.
    pub async fn financial_advice(&self, history: &[ChatMessage], user_context: &str) -> String {
        let transcript = history
            .iter()
            .map(|message| {
                let speaker = match message.role {
                    ChatRole::User => "User",
                    ChatRole::Model => "Mentor",
                };
                format!("{speaker}: {}", message.text)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "User Context: {user_context}\n\nConversation History:\n{transcript}\n\nPlease respond to the last user message as the Mentor."
        );
        let request = GenerationRequest::text(prompt)
            .with_system_instruction(MENTOR_SYSTEM_INSTRUCTION)
            .with_temperature(MENTOR_TEMPERATURE);
        self.text_or_fallback("financial_advice", request, &MENTOR)
            .await
    }

    /// One-sentence tip for staying current on a loan.
    pub async fn risk_tip(&self, loan_details: &str) -> String {
        let request = GenerationRequest::text(format!(
            "Analyze this loan situation and provide a 1-sentence supportive tip to avoid being overdue: {loan_details}"
        ))
        .with_system_instruction("You are a helpful financial assistant. Be brief and encouraging.");
        self.text_or_fallback("risk_tip", request, &RISK_TIP).await
    }

    pub async fn explain_clause(&self, clause: &str) -> String {
        let request = GenerationRequest::text(format!(
            "Explain this legal contract clause in very simple, easy-to-understand language for a non-expert. Avoid jargon. Clause: \"{clause}\""
        ))
        .with_system_instruction("You are a friendly legal assistant who simplifies complex text.");
        self.text_or_fallback("explain_clause", request, &CLAUSE)
            .await
    }

    /// "What happens if..." against a standard contract of the given type.
    pub async fn simulate_scenario(&self, scenario: &str, contract_type: &str) -> String {
        let request = GenerationRequest::text(format!(
            "Based on a standard {contract_type}, what happens if: {scenario}? explain the consequences (fees, credit score impact) clearly and kindly."
        ));
        self.text_or_fallback("simulate_scenario", request, &SCENARIO)
            .await
    }

    /// Raw next segment of the "Financial Quest" text adventure; see [`StoryScenario::parse`].
    pub async fn next_story_segment(&self, context: &str, choice: &str) -> String {
        let request = GenerationRequest::text(format!(
            "You are running a text-adventure game called \"Financial Quest\".
Current Context: {context}
User Choice: {choice}

Generate the next part of the story (max 3 sentences) showing the result of the choice, and provide 2 distinct new options for the user labeled 'A' and 'B'.
Format:
[Story Text]
Option A: [Action]
Option B: [Action]"
        ));
        self.text_or_fallback("next_story_segment", request, &STORY)
            .await
    }

    /// Installment quote for a product spotted in a store.
    pub async fn analyze_price_tag(
        &self,
        item: &str,
        price: Pesos,
        level: LoyaltyLevel,
    ) -> Affordability {
        let tier = level.label();
        let prompt = format!(
            "Item: {item}
Price: {price}
User Trust Level: {tier} (Silver/Gold/VIP)

Task:
1. Calculate estimated monthly installment for 6 months and 12 months (add reasonable interest).
2. Generate a short analysis of the product value.
3. Generate a \"salesPitch\" strictly following this format:
   \"We found a price of ₱[Price]. Based on your {tier} Tier, you can take this home today for only ₱[Installment12mo]/month. Show this screen to a Home Credit agent nearby!\"

Return JSON ONLY:
{{
    \"installment6mo\": number,
    \"installment12mo\": number,
    \"analysis\": \"string\",
    \"salesPitch\": \"string\"
}}"
        );

        let reply = generate_text(self.model.as_ref(), GenerationRequest::json(prompt)).await;
        match reply.map_err(|err| err.to_string()).and_then(|raw| {
            decode_json::<RemoteAffordability>(&raw).map_err(|err| err.to_string())
        }) {
            Ok(remote) => remote.into(),
            Err(reason) => {
                warn!(operation = "analyze_price_tag", %reason, "using fallback quote");
                Affordability::fallback(price, level)
            }
        }
    }

    /// Whether the user should upgrade the given device now.
    pub async fn upgrade_prediction(&self, level: LoyaltyLevel, device: &str) -> UpgradePrediction {
        let prompt = format!(
            "Act as a predictive analytics engine for a tech lender.
User Level: {}
Device: {device}

Predict if the user should upgrade now based on market depreciation trends.
Return JSON ONLY:
{{
    \"shouldUpgrade\": boolean,
    \"urgency\": \"High\" | \"Medium\" | \"Low\",
    \"reason\": \"Short persuasive reason (max 10 words)\",
    \"projectedDrop\": \"Percentage value drop next month (e.g. 5%)\"
}}",
            level.label()
        );

        let reply = generate_text(self.model.as_ref(), GenerationRequest::json(prompt)).await;
        match reply
            .map_err(|err| err.to_string())
            .and_then(|raw| decode_json::<UpgradePrediction>(&raw).map_err(|err| err.to_string()))
        {
            Ok(prediction) => prediction,
            Err(reason) => {
                warn!(operation = "upgrade_prediction", %reason, "using fallback prediction");
                UpgradePrediction::fallback()
            }
        }
    }

    /// Simulated vision check; no model call is made.
    pub fn scan_device_condition(&self, category: DeviceCategory) -> VisualInspection {
        inspect_condition(category)
    }

    async fn text_or_fallback(
        &self,
        operation: &'static str,
        request: GenerationRequest,
        fallbacks: &Fallbacks,
    ) -> String {
        match generate_text(self.model.as_ref(), request).await {
            Ok(text) => text,
            Err(ModelError::EmptyResponse) => {
                warn!(operation, "model returned no text, using fallback");
                fallbacks.empty.to_string()
            }
            Err(err) => {
                warn!(operation, error = %err, "model call failed, using fallback");
                fallbacks.failed.to_string()
            }
        }
    }
}
