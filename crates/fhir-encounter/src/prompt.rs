//! Prompts
//!
//! The system prompt fixes the agent's role; the user prompt carries the
//! target profile, the clinical note and the output rules.

use etl_core::{Conversation, Message, Result};

use crate::profile::StructureDefinition;

/// System prompt for the transform agent
pub const SYSTEM_PROMPT: &str = "You are the transform layer of an ETL.
You take raw healthcare resources and format them into FHIR resources.
You have access to a FHIR server with a $validate operation to help you in this task; it validates resources against the target profile.
You also have access to a UUID generator tool.
Your goal is to produce a working, validated resource.";

const RULES: &str = "Please make sure that:

* Always return as JSON
* Use contained references for other relationships, like the Patient
* NEVER infer codeable concepts from free text. Only use explicitly provided systems.
* Do not create unnecessary identifiers";

/// Build the user request for one note
pub fn build_user_prompt(profile: &StructureDefinition, note: &str) -> String {
    format!(
        "The next request in your pipeline involves transforming a raw clinical encounter note \
into a US Core {kind} FHIR resource.

The {kind} resource MUST conform to the US Core profile, provided by the following structure definition:

{definition}

Here is the clinical encounter note:

{note}

{RULES}",
        kind = profile.resource_type(),
        definition = profile.to_compact_json(),
        note = note.trim(),
    )
}

/// Seed conversation: system prompt followed by the user request
pub fn initial_conversation(profile: &StructureDefinition, note: &str) -> Result<Conversation> {
    let mut conversation = Conversation::with_system_prompt(SYSTEM_PROMPT);
    conversation.push(Message::user(build_user_prompt(profile, note)))?;
    Ok(conversation)
}
