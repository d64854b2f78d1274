// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification prompt template.

use triage_core::types::ProviderRequest;

/// System turn sent with every classification request.
pub const SYSTEM_INSTRUCTION: &str = "You are a healthcare message triage system.";

const TEMPLATE: &str = r#"You are a healthcare message triage system. Analyze the following message and classify it into one of these categories:
- CRITICAL (Red): Requires immediate attention (< 1 hour)
- HIGH (Orange): Requires attention within 24 hours
- MEDIUM (Yellow): Requires attention within 2-3 days
- LOW (Green): Can be handled when convenient
- REFERENCE (Blue): Informational, no action needed

Message Subject: {subject}
Message Content: {content}

Provide your classification in the following JSON format:
{
    "category": "CATEGORY",
    "confidence": 0.0-1.0,
    "explanation": "Brief explanation of the classification"
}"#;

/// Fills the template with the message. Subject and content are inserted verbatim.
pub fn build_prompt(subject: &str, content: &str) -> String {
    // Placeholder text inside the subject must survive unexpanded.
    let (head, rest) = TEMPLATE.split_once("{subject}").unwrap_or((TEMPLATE, ""));
    let (middle, tail) = rest.split_once("{content}").unwrap_or((rest, ""));
    let mut prompt = String::with_capacity(TEMPLATE.len() + subject.len() + content.len());
    prompt.push_str(head);
    prompt.push_str(subject);
    prompt.push_str(middle);
    prompt.push_str(content);
    prompt.push_str(tail);
    prompt
}

pub fn build_request(subject: &str, content: &str) -> ProviderRequest {
    ProviderRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_prompt: build_prompt(subject, content),
    }
}
