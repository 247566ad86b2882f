//! 活动检索
//!
//! 活动日历尚未接入抓取后端，当前对任意 region / key_word 返回固定的四条活动。

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::models::{EventCard, ToolOutput};
use crate::tools::registry::parse_args;
use crate::tools::schema::parameters_for;
use crate::tools::{Tool, ToolError, ToolId};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EventSearchArgs {
    /// The region to search for events.
    pub region: String,
    /// The keyword to search for in the event description.
    pub key_word: String,
}

const ANNUAL_MEETING_DESCRIPTION: &str = "Join us for our annual meeting where we will discuss our progress, challenges, and future plans for conservation in 2025.";

fn annual_meeting(url: &str) -> EventCard {
    EventCard {
        url: url.to_string(),
        date: "Apr 12, 2025".to_string(),
        site: "New York".to_string(),
        title: "2025 Annual Meeting".to_string(),
        time: "10:00 AM - 1:00 PM".to_string(),
        description: ANNUAL_MEETING_DESCRIPTION.to_string(),
    }
}

/// 按地区与关键词检索活动
pub fn event_search(region: &str, key_word: &str) -> Vec<EventCard> {
    tracing::debug!(region = %region, key_word = %key_word, "event search (fixed calendar)");
    vec![
        EventCard {
            url: "https://www.nature.org/en-us/get-involved/how-to-help/events/colorado-mountainfilm-on-tour/".to_string(),
            date: "Mar 05, 2025".to_string(),
            site: "Denver".to_string(),
            title: "Mountainfilm on Tour".to_string(),
            time: "6:00 PM - 9:00 PM".to_string(),
            description: "Please join us at the Denver Museum of Nature & Science for an evening of conservation and science-focused short films, panel discussions, and treats!".to_string(),
        },
        annual_meeting("https://www.nature.org/en-us/get-involved/how-to-help/events/utah-ski-for-nature/"),
        annual_meeting("https://www.nature.org/en-us/get-involved/how-to-help/events/tx-davis-mountains-open-days/"),
        annual_meeting("https://www.nature.org/en-us/get-involved/how-to-help/events/west-texas-springs-preserve-tours/"),
    ]
}

pub struct EventSearchTool;

#[async_trait]
impl Tool for EventSearchTool {
    fn id(&self) -> ToolId {
        ToolId::EventSearch
    }

    fn description(&self) -> &str {
        "Searches for events regarding TNC in a specific region containing a specific keyword."
    }

    fn parameters_schema(&self) -> Value {
        parameters_for::<EventSearchArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: EventSearchArgs = parse_args(args)?;
        Ok(event_search(&args.region, &args.key_word).to_value())
    }
}
