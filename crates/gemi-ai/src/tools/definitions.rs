//! Function declarations for the tools the model may call.

use serde_json::json;

use crate::ToolDefinition;

use super::ToolName;

/// Declarations for every tool, in the form the Gemini API expects.
pub fn builtin_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: ToolName::Search.to_string(),
            description: "Search the internet for up to date information and return \
                          the most relevant results with a short answer"
                .to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "query": {
                        "type": "STRING",
                        "description": "A search query"
                    },
                    "max_results": {
                        "type": "INTEGER",
                        "description": "Number of results to return, between 1 and 10",
                        "minimum": 1,
                        "maximum": 10
                    },
                    "topic": {
                        "type": "STRING",
                        "description": "news for news searches, general for anything else",
                        "enum": ["general", "news"]
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: ToolName::Image.to_string(),
            description: "Generate an image from the given prompt".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "prompt": {
                        "type": "STRING",
                        "description": "A detailed prompt to generate the image"
                    },
                    "image_name": {
                        "type": "STRING",
                        "description": "A short file name for the image"
                    },
                    "quality": {
                        "type": "STRING",
                        "description": "Image quality",
                        "enum": ["LOW", "MEDIUM", "HIGH"]
                    }
                },
                "required": ["prompt", "image_name"]
            }),
        },
        ToolDefinition {
            name: ToolName::Voice.to_string(),
            description: "Convert the given text to a spoken voice message".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "text": {
                        "type": "STRING",
                        "description": "The entire text to speak"
                    },
                    "quality": {
                        "type": "STRING",
                        "description": "Audio quality",
                        "enum": ["LOW", "MEDIUM", "HIGH"]
                    }
                },
                "required": ["text"]
            }),
        },
    ]
}

/// Convert a ToolDefinition to a Gemini function declaration.
pub fn to_gemini_tool(tool: &ToolDefinition) -> serde_json::Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_three_tools() {
        let names: Vec<String> = builtin_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["search", "image", "voice"]);
    }

    #[test]
    fn schemas_match_argument_contract() {
        let tools = builtin_tools();
        let search = &tools[0].parameters;
        assert_eq!(search["properties"]["max_results"]["type"], "INTEGER");
        assert_eq!(search["properties"]["topic"]["enum"], json!(["general", "news"]));

        let image = &tools[1].parameters;
        assert_eq!(image["required"], json!(["prompt", "image_name"]));
        assert_eq!(image["properties"]["quality"]["enum"], json!(["LOW", "MEDIUM", "HIGH"]));

        let voice = &tools[2].parameters;
        assert_eq!(voice["required"], json!(["text"]));
    }

    #[test]
    fn gemini_declaration_shape() {
        let decl = to_gemini_tool(&builtin_tools()[2]);
        assert_eq!(decl["name"], "voice");
        assert_eq!(decl["parameters"]["type"], "OBJECT");
    }
}
