//! 工具结果记录类型
//!
//! 每种记录通过 ToolOutput 显式给出自己的纯数据表示（字段 -> JSON），
//! 工具返回值在交给模型前一律经过 to_value 展平。字段表由 serde derive 生成。

use serde::Serialize;
use serde_json::Value;

/// 结果 -> 纯数据（对象 / 数组 / 原始值）的序列化约定
pub trait ToolOutput {
    fn to_value(&self) -> Value;
}

impl<T: ToolOutput> ToolOutput for [T] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToolOutput::to_value).collect())
    }
}

impl<T: ToolOutput> ToolOutput for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

/// 记录结构体 -> JSON 对象；字段均为字符串 / 整数 / 布尔，序列化不会失败
fn record_value<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or_default()
}

impl ToolOutput for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

/// 知识库（站内搜索）结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub id: usize,
    pub url: String,
    pub title: String,
    pub date: String,
    pub content: String,
    pub recommended: bool,
}

impl ToolOutput for SearchResult {
    fn to_value(&self) -> Value {
        record_value(self)
    }
}

/// 新闻卡片
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewsCard {
    pub image_url: String,
    pub title: String,
    pub excerpt: String,
    pub byline: String,
}

impl ToolOutput for NewsCard {
    fn to_value(&self) -> Value {
        record_value(self)
    }
}

/// 活动卡片
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventCard {
    pub url: String,
    pub date: String,
    pub site: String,
    pub title: String,
    pub time: String,
    pub description: String,
}

impl ToolOutput for EventCard {
    fn to_value(&self) -> Value {
        record_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_flattens_each_record() {
        let results = vec![
            SearchResult {
                id: 0,
                url: "https://www.nature.org/a".into(),
                title: "A".into(),
                recommended: true,
                ..Default::default()
            },
            SearchResult {
                id: 1,
                url: "https://www.nature.org/b".into(),
                title: "B".into(),
                date: "Jan 1, 2025".into(),
                content: "text".into(),
                recommended: false,
            },
        ];

        let value = results.to_value();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["recommended"], true);
        assert_eq!(value[0]["date"], "");
        assert_eq!(value[1]["id"], 1);
        assert_eq!(value[1]["content"], "text");
    }

    #[test]
    fn test_event_card_has_exactly_its_fields() {
        let value = EventCard {
            url: "https://www.nature.org/e".into(),
            title: "Walk".into(),
            ..Default::default()
        }
        .to_value();

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 6);
        for field in ["url", "date", "site", "title", "time", "description"] {
            assert!(keys.contains(&field), "missing {field}");
        }
        assert_eq!(value["title"], "Walk");
    }
}
