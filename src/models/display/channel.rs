//! Channel display model

use serde::Serialize;
use tabled::Tabled;

use crate::playlist::Channel;

/// Channel row for table/JSON output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ChannelDisplay {
    #[tabled(rename = "NAME")]
    pub name: String,

    #[tabled(rename = "GROUP")]
    pub group: String,

    /// Stream URL
    #[tabled(rename = "URL")]
    pub url: String,

    /// Checkmark when the channel carries a logo
    #[tabled(rename = "LOGO")]
    #[serde(skip)]
    pub has_logo: String,

    #[tabled(skip)]
    pub logo: String,
}

impl From<&Channel> for ChannelDisplay {
    fn from(channel: &Channel) -> Self {
        Self {
            name: channel.name.clone(),
            group: channel.group.clone(),
            url: channel.url.clone(),
            has_logo: if channel.logo.is_empty() {
                String::new()
            } else {
                "\u{2713}".to_string()
            },
            logo: channel.logo.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(logo: &str) -> Channel {
        Channel {
            id: "http://tv.example/news".to_string(),
            name: "News".to_string(),
            url: "http://tv.example/news".to_string(),
            logo: logo.to_string(),
            group: "Info".to_string(),
        }
    }

    #[test]
    fn test_channel_display_marks_logo() {
        let with_logo = ChannelDisplay::from(&channel("http://tv.example/news.png"));
        let without = ChannelDisplay::from(&channel(""));

        assert_eq!(with_logo.has_logo, "\u{2713}");
        assert_eq!(without.has_logo, "");
        assert_eq!(with_logo.group, "Info");
    }

    #[test]
    fn test_channel_display_json_keeps_logo_url() {
        let json = serde_json::to_value(ChannelDisplay::from(&channel("http://x/logo.png"))).unwrap();

        assert_eq!(json["logo"], "http://x/logo.png");
        assert!(json.get("has_logo").is_none());
    }
}
