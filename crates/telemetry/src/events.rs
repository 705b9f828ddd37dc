//! Content event payloads
//!
//! These mirror the XDM structure the experience-platform SDK expects for
//! `sendEvent`: one `experienceContent` block per event, plus web interaction
//! details for link clicks.

use serde::{Deserialize, Serialize};

/// XDM event type recorded for asset clicks
pub const LINK_CLICK_EVENT_TYPE: &str = "web.webinteraction.linkClicks";

/// Whether an event reports views or a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEventType {
    View,
    Click,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(rename = "experienceID")]
    pub experience_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceContent {
    pub experience: Experience,
    #[serde(rename = "assetsIDs")]
    pub assets_ids: Vec<String>,
    pub content_event_type: ContentEventType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkClicks {
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebInteraction {
    #[serde(rename = "URL")]
    pub url: String,
    pub link_clicks: LinkClicks,
    /// Link type, `download` or `other`
    #[serde(rename = "type")]
    pub link_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web {
    pub web_interaction: WebInteraction,
}

/// XDM body of a content event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<Web>,
    pub experience_content: ExperienceContent,
}

impl ContentEvent {
    /// One batched view event for all the given assets
    pub fn view(experience_id: String, assets_ids: Vec<String>) -> Self {
        Self {
            event_type: None,
            web: None,
            experience_content: ExperienceContent {
                experience: Experience { experience_id },
                assets_ids,
                content_event_type: ContentEventType::View,
            },
        }
    }

    /// A click on one asset that links to `link_url`
    pub fn click(experience_id: String, asset_id: String, link_url: String) -> Self {
        Self {
            event_type: Some(LINK_CLICK_EVENT_TYPE.to_string()),
            web: Some(Web {
                web_interaction: WebInteraction {
                    url: link_url,
                    link_clicks: LinkClicks { value: 1 },
                    link_type: "other".to_string(),
                },
            }),
            experience_content: ExperienceContent {
                experience: Experience { experience_id },
                assets_ids: vec![asset_id],
                content_event_type: ContentEventType::Click,
            },
        }
    }

    pub fn content_event_type(&self) -> ContentEventType {
        self.experience_content.content_event_type
    }

    pub fn assets_ids(&self) -> &[String] {
        &self.experience_content.assets_ids
    }

    pub fn experience_id(&self) -> &str {
        &self.experience_content.experience.experience_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetOverride {
    pub dataset_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOverrides {
    pub event: DatasetOverride,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformOverrides {
    pub datasets: DatasetOverrides,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConfigOverrides {
    pub com_adobe_experience_platform: PlatformOverrides,
}

impl EdgeConfigOverrides {
    /// Route events into `dataset_id`
    pub fn for_dataset(dataset_id: impl Into<String>) -> Self {
        Self {
            com_adobe_experience_platform: PlatformOverrides {
                datasets: DatasetOverrides {
                    event: DatasetOverride {
                        dataset_id: dataset_id.into(),
                    },
                },
            },
        }
    }
}

/// Full argument of one `sendEvent` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEventOptions {
    pub document_unloading: bool,
    pub xdm: ContentEvent,
    pub edge_config_overrides: EdgeConfigOverrides,
}

impl SendEventOptions {
    pub fn new(xdm: ContentEvent, dataset_id: impl Into<String>) -> Self {
        Self {
            document_unloading: false,
            xdm,
            edge_config_overrides: EdgeConfigOverrides::for_dataset(dataset_id),
        }
    }
}
