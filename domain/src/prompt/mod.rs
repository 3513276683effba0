//! Prompt construction for the conversational and selection models.

/// System prompt for the main conversational call.
///
/// `today` is an ISO date (YYYY-MM-DD) so the model can resolve relative
/// dates like "this week".
pub fn system_prompt(today: &str) -> String {
    format!(
        r#"You are a helpful AI assistant for a fitness-studio management system.

Today's date is {today}. When users ask about dates like "today", "tomorrow", "this week", etc., calculate the appropriate dates based on today's date.

You have access to studio data through various tools. Use them to:
- View class schedules and session times
- Search for and review client information
- Check sales, transactions, and purchases
- See services, products, packages, and memberships

When presenting data:
- Format dates and times in a user-friendly way
- Summarize large amounts of data and provide helpful context
- If results are limited, mention "Showing first X results"

For date parameters:
- Use ISO format: YYYY-MM-DDTHH:mm:ss for datetime
- Use YYYY-MM-DD for dates only

Tool usage guidelines:
- When you need a client Id, use get_clients first with a search term
- Never call tools with incomplete or missing required parameters
- If a tool result reports missing parameters, follow its instructions and retry

When you encounter errors:
- Authentication errors: explain that staff credentials may need to be configured
- Missing Id errors: look the client up first, or ask the user which client they mean

Be conversational, helpful, and proactive in suggesting relevant information."#
    )
}

/// Prompt for the auxiliary tool-selection call.
///
/// Embeds the literal catalog name list and the verbatim latest user
/// message; demands strict JSON so the lenient decoder has something to
/// find even when the model adds prose.
pub fn selection_prompt(catalog_names: &[&str], user_message: &str) -> String {
    format!(
        r#"You are a tool-selection assistant for a fitness-studio chat system.

Available tools:
{}

The user's latest message is:
"{}"

Select the smallest set of tools needed to answer this message. Rules:
- Any tool that requires a client Id must be preceded in your selection by get_clients (the client-lookup tool).
- If no tools are needed, return an empty list.

Respond with STRICT JSON only, no prose, in exactly this shape:
{{"tools": ["tool_name", ...], "reasoning": "one sentence"}}"#,
        catalog_names.join("\n"),
        user_message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_embeds_date() {
        let prompt = system_prompt("2026-08-24");
        assert!(prompt.contains("2026-08-24"));
        assert!(prompt.contains("get_clients"));
    }

    #[test]
    fn selection_prompt_embeds_catalog_and_message() {
        let prompt = selection_prompt(
            &["get_clients", "get_sales"],
            "show me Jane Doe's purchases",
        );
        assert!(prompt.contains("get_clients\nget_sales"));
        assert!(prompt.contains("show me Jane Doe's purchases"));
        assert!(prompt.contains(r#"{"tools""#));
    }
}
