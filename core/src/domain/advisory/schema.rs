use serde_json::json;

/// Returns the JSON schema for daily advisory LLM responses
pub fn get_advisory_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "analysis": { "type": "string" },
            "suggestions": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["analysis", "suggestions"]
    })
}
