//! 工具目录描述符与参数 JSON Schema 生成（schemars 从参数结构体自动生成）

use schemars::{schema_for, JsonSchema};
use serde::Serialize;
use serde_json::Value;

/// 目录中的一个工具描述（对应 OpenAI tools[].function）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 无参数工具的 schema
pub fn no_parameters() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

/// 由参数结构体生成 schema；去掉 $schema / title 等模型用不到的元信息
pub fn parameters_for<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(&schema).unwrap_or_else(|_| no_parameters());
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.entry("required").or_insert_with(|| Value::Array(Vec::new()));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Args {
        /// The region to search for events.
        region: String,
        /// The keyword to search for in the event description.
        key_word: String,
    }

    #[test]
    fn test_parameters_for_struct() {
        let schema = parameters_for::<Args>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["region"]["type"], "string");
        assert_eq!(
            schema["properties"]["key_word"]["description"],
            "The keyword to search for in the event description."
        );
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"region"));
        assert!(required.contains(&"key_word"));
        assert!(schema.get("$schema").is_none());
    }
}
