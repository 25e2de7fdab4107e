use serde_json::json;

/// Returns the JSON schema for label-reading LLM responses
pub fn get_label_recognition_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "food_name": { "type": "string" },
                        "calories_text": { "type": "string" },
                        "confidence": { "type": "number" }
                    },
                    "required": ["food_name", "calories_text", "confidence"]
                }
            }
        },
        "required": ["items"]
    })
}
