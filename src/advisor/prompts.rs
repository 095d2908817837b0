//! Persona instruction, extraction/recommendation/classifier prompts, and the
//! fixed notices the coordinator streams between stages.

use crate::llm::{Role, Turn};

/// Literal the persona is told to emit once it has gathered enough.
pub const COMPLETION_MARKER: &str = "PROFILE_COMPLETE_SIGNAL";

/// Persona instruction sent as the opening model turn of every session.
pub const PERSONA_PROMPT: &str = "\
You are a warm, professional financial conversation guide. Your job is to learn about the \
user's finances through a relaxed, friendly chat so that a structured financial profile can \
be filled in afterwards. The user must never see or hear about that profile format.

Work through three parts, a few questions at a time, and summarise now and then to check \
your understanding:

Part 1: Current situation
- What kind of work they do and where they are based, and their age.
- Roughly what they earn per month or year.
- What their usual monthly expenses look like (housing, food, transport, ...).
- Whether they are already saving or investing.

Part 2: Goals
- Plans for the next couple of years (emergency fund, paying off debt, a car, travel).
- Goals 3-10 years out (a home, a career move, education).
- Long-term aims (retirement, financial independence, a business, supporting family).
If they are unsure, offer common examples to help them think it through.

Part 3: Risk appetite and mindset
- Cautious with money, open to risk, or somewhere in between?
- How would a 10% drop in their investments feel? And 20%?
- Quick decisions or thorough research first?
- Past investing experience (stocks, property, crypto, ...) and how confident they feel.

Ask for numbers, timelines or ranges directly when needed. Clarify gently when something is \
ambiguous. Estimate only where it is logical, and stay conservative around risk.

Once you have monthly income and expenses, at least two financial goals, a discussion of \
risk tolerance, their investment experience, and their age and location, end your response \
with: \"PROFILE_COMPLETE_SIGNAL\"

Begin now by greeting the user and asking about their current financial situation.";

pub const TRANSITION_NOTICE: &str =
    "\n---\n\n[COORDINATOR] PROFILE_COMPLETE_SIGNAL detected. Moving to summary agent...";
pub const ANALYSIS_COMPLETE_NOTICE: &str =
    "\n\n---\n\n**Analysis Complete!** I have all the information I need. Let me now:";
pub const EXTRACTING_NOTICE: &str = "\nExtract and organize your financial profile...";
pub const EXTRACTION_CONFIRMATION: &str = "\nProfile extracted successfully!";
pub const RECOMMENDATION_BANNER: &str =
    "\n---\n\n[COORDINATOR] Moving to recommendation agent...";

/// Shown when the recommendation stage is reached without a profile.
pub const NO_PROFILE_APOLOGY: &str = "I apologize, but I couldn't generate specific recommendations at this time. Please try asking me specific questions about your financial situation.";

/// Shown (and stored as the result text) when generation fails.
pub const RECOMMENDATION_APOLOGY: &str = "I apologize, but I encountered an issue generating specific recommendations. Please try again later.";

/// Display text when the upstream reply has no usable candidate.
pub const UNPROCESSABLE_REPLY: &str = "Sorry, I couldn't process your request. Please try again.";

/// Display text when the first part of the reply carries no text.
pub const EMPTY_REPLY: &str = "Sorry, no response text available.";

/// Wrap recommendation text with its heading and a follow-up invitation.
pub fn format_recommendations(text: &str) -> String {
    format!(
        "\n**Your Personalized Financial Recommendations:**\n\n{text}\n\n---\n\n\
         💬 **What's Next?** Feel free to ask me any questions about these recommendations \
         or request clarification on any specific points!"
    )
}

/// Flatten a transcript into `User:` / `Assistant:` lines.
pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::User => "User",
                Role::Model => "Assistant",
            };
            format!("{speaker}: {}\n", turn.text)
        })
        .collect()
}

/// Prompt asking the model to fill the profile schema from a conversation.
pub fn extraction_prompt(schema_json: &str, conversation_text: &str) -> String {
    format!(
        "You are a financial profile extraction agent. Analyze the conversation history and \
         extract structured information into a specific JSON format.\n\n\
         Fill out the JSON schema below with the information gathered. Use null for any field \
         where information wasn't provided or can't be inferred. Be conservative with \
         estimates and only include information that was explicitly discussed or can be \
         reasonably inferred.\n\n\
         For fields that require arrays (like goals), create appropriate objects even if some \
         sub-fields are null.\n\n\
         JSON Schema to fill:\n{schema_json}\n\n\
         Conversation History:\n{conversation_text}\n\n\
         Return ONLY the filled JSON object, no additional text or explanation. Ensure the \
         JSON is valid and properly formatted."
    )
}

/// Prompt asking for recommendations for a pretty-printed profile.
pub fn recommendation_prompt(profile_json: &str) -> String {
    format!(
        "You are a financial recommendation agent. Based on the user's structured financial \
         profile (JSON below) and current market conditions, suggest suitable investment \
         instruments and strategies for the user's goals.\n\n\
         Be specific and practical. Use the user's risk profile, goals, and financial \
         situation. Use general best practices for the current market environment.\n\n\
         Return your recommendations as a plain text summary, not JSON. Be clear, concise, \
         and actionable.\n\n\
         User Profile JSON:\n{profile_json}\n"
    )
}

/// Prompt asking the model to classify the conversation as COMPLETE or INCOMPLETE.
pub fn completeness_prompt(conversation_text: &str) -> String {
    format!(
        "Analyze this financial conversation and determine if we have gathered enough \
         information to create a comprehensive financial profile.\n\n\
         We need information about:\n\
         1. Current financial situation (income, expenses, savings, job, location)\n\
         2. Financial goals (short-term, medium-term, long-term)\n\
         3. Risk tolerance and investment experience\n\
         4. Lifestyle preferences and future aspirations\n\n\
         Conversation:\n{conversation_text}\n\n\
         Respond with only one word: \"COMPLETE\" if we have sufficient information across \
         most categories, or \"INCOMPLETE\" if we need more information in major categories."
    )
}

/// Whether a classifier reply is exactly `COMPLETE` (case and whitespace aside).
pub fn is_complete_verdict(reply: &str) -> bool {
    reply.trim().eq_ignore_ascii_case("COMPLETE")
}

/// Strip an optional surrounding ```` ```json ```` / ```` ``` ```` fence.
pub fn strip_code_fence(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_mentions_marker_and_parts() {
        assert!(PERSONA_PROMPT.contains(COMPLETION_MARKER));
        assert!(PERSONA_PROMPT.contains("Part 2: Goals"));
        assert!(PERSONA_PROMPT.contains("Risk appetite"));
    }

    #[test]
    fn render_labels_speakers() {
        let turns = vec![Turn::model("Hi there"), Turn::user("I earn 4k")];
        assert_eq!(render_transcript(&turns), "Assistant: Hi there\nUser: I earn 4k\n");
        assert_eq!(render_transcript(&[]), "");
    }

    #[test]
    fn extraction_prompt_embeds_schema_and_conversation() {
        let prompt = extraction_prompt("{\"a\": null}", "User: I'm 30");
        assert!(prompt.contains("{\"a\": null}"));
        assert!(prompt.contains("User: I'm 30"));
        assert!(prompt.contains("Return ONLY the filled JSON object"));
    }

    #[test]
    fn recommendation_prompt_embeds_profile() {
        let prompt = recommendation_prompt("{\n  \"x\": 1\n}");
        assert!(prompt.contains("User Profile JSON:\n{\n  \"x\": 1\n}"));
        assert!(prompt.contains("plain text summary"));
    }

    #[test]
    fn completeness_prompt_asks_for_one_word() {
        let prompt = completeness_prompt("User: hello\n");
        assert!(prompt.contains("\"COMPLETE\""));
        assert!(prompt.contains("\"INCOMPLETE\""));
        assert!(prompt.contains("User: hello"));
    }

    #[test]
    fn verdict_parsing() {
        assert!(is_complete_verdict("COMPLETE"));
        assert!(is_complete_verdict("  complete\n"));
        assert!(!is_complete_verdict("INCOMPLETE"));
        assert!(!is_complete_verdict("COMPLETE."));
        assert!(!is_complete_verdict("I think it is COMPLETE"));
        assert!(!is_complete_verdict(""));
    }

    #[test]
    fn strip_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"b\":2}  "), "{\"b\":2}");
        assert_eq!(strip_code_fence("{\"c\":3}\n```"), "{\"c\":3}");
    }

    #[test]
    fn recommendations_format_has_heading_and_invitation() {
        let text = format_recommendations("Buy index funds.");
        assert!(text.starts_with("\n**Your Personalized Financial Recommendations:**"));
        assert!(text.contains("Buy index funds."));
        assert!(text.contains("What's Next?"));
    }
}
