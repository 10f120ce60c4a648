//! User object mapping.
//!
//! The connector forwards the platform client's user object as-is, and its
//! layout changes between client versions. Each known layout is a
//! [`UserSchema`] variant; everything downstream only sees [`ChatUser`].
//!
//! Avatar resolution per schema:
//!
//! | schema   | fields, in order                                         |
//! |----------|----------------------------------------------------------|
//! | `v1`     | `avatar_thumb`, `avatar_medium`, `avatar_large`, `avatar` |
//! | `legacy` | `profile_picture.urls[0]`                                |
//!
//! When no field yields a URL, the first image URL found anywhere in the
//! serialized object is used.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use quizcast_core::ChatUser;

/// Avatar fields scanned by [`UserSchema::V1`], in priority order.
pub const V1_AVATAR_FIELDS: [&str; 4] = ["avatar_thumb", "avatar_medium", "avatar_large", "avatar"];

/// Array keys that hold URL lists inside an avatar object.
const URL_LIST_KEYS: [&str; 3] = ["m_urls", "url_list", "urls"];

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://[^'"\s\]]+\.(webp|jpeg|jpg|png)[^'"\s\]]*"#)
        .expect("Failed to compile image URL regex")
});

/// Known user object layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserSchema {
    /// Current layout: `nickname`, `unique_id`, `avatar_*` image objects.
    #[default]
    V1,
    /// Older layout: `nickname`/`display_name`, `unique_id`/`uniqueId`,
    /// `profile_picture.urls`.
    Legacy,
}

impl UserSchema {
    /// Maps a raw user object into a [`ChatUser`].
    pub fn resolve(self, user: &Value) -> ChatUser {
        let (nickname, handle) = match self {
            Self::V1 => (str_field(user, "nickname"), str_field(user, "unique_id")),
            Self::Legacy => (
                str_field(user, "nickname").or_else(|| str_field(user, "display_name")),
                str_field(user, "unique_id").or_else(|| str_field(user, "uniqueId")),
            ),
        };
        ChatUser::from_parts(nickname, handle, self.avatar_url(user))
    }

    /// Resolves the profile picture URL, falling back to a pattern scan.
    pub fn avatar_url(self, user: &Value) -> Option<String> {
        let direct = match self {
            Self::V1 => V1_AVATAR_FIELDS
                .iter()
                .find_map(|field| user.get(*field).and_then(url_from_image)),
            Self::Legacy => user
                .get("profile_picture")
                .and_then(|p| p.get("urls"))
                .and_then(first_url),
        };
        direct.or_else(|| scan_image_urls(user).into_iter().next())
    }
}

/// One place an avatar URL was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarCandidate {
    /// Field path (`avatar_thumb`, `profile_picture.urls`, or `pattern`).
    pub source: String,
    /// The URL.
    pub url: String,
}

/// Diagnostic view of a user object, used by capture mode.
#[derive(Debug, Clone, Serialize)]
pub struct UserInspection {
    /// The schema used to resolve the user.
    pub schema: UserSchema,
    /// The resolved user.
    pub resolved: ChatUser,
    /// Every avatar URL found, across all known layouts.
    pub avatar_candidates: Vec<AvatarCandidate>,
    /// Top-level field names present in the raw object.
    pub fields: Vec<String>,
    /// The raw object.
    pub raw: Value,
}

impl UserInspection {
    /// Inspects `user` with `schema`.
    pub fn new(schema: UserSchema, user: &Value) -> Self {
        let mut avatar_candidates = Vec::new();
        for field in V1_AVATAR_FIELDS {
            if let Some(url) = user.get(field).and_then(url_from_image) {
                avatar_candidates.push(AvatarCandidate {
                    source: field.to_string(),
                    url,
                });
            }
        }
        if let Some(url) = user
            .get("profile_picture")
            .and_then(|p| p.get("urls"))
            .and_then(first_url)
        {
            avatar_candidates.push(AvatarCandidate {
                source: "profile_picture.urls".to_string(),
                url,
            });
        }
        for url in scan_image_urls(user) {
            if !avatar_candidates.iter().any(|c| c.url == url) {
                avatar_candidates.push(AvatarCandidate {
                    source: "pattern".to_string(),
                    url,
                });
            }
        }

        let fields = user
            .as_object()
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            schema,
            resolved: schema.resolve(user),
            avatar_candidates,
            fields,
            raw: user.clone(),
        }
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Extracts a URL from one avatar field value.
fn url_from_image(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("http") => Some(s.clone()),
        Value::Object(obj) => URL_LIST_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(first_url))
            .or_else(|| {
                obj.get("url")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            }),
        _ => None,
    }
}

fn first_url(list: &Value) -> Option<String> {
    list.as_array()?
        .iter()
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn scan_image_urls(user: &Value) -> Vec<String> {
    let Ok(serialized) = serde_json::to_string(user) else {
        return Vec::new();
    };
    IMAGE_URL
        .find_iter(&serialized)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v1_prefers_thumb_m_urls() {
        let user = json!({
            "nickname": "Ana",
            "unique_id": "ana_22",
            "avatar_thumb": { "m_urls": ["https://p16.example/thumb.webp", "https://p16.example/thumb2.webp"] },
            "avatar_large": { "m_urls": ["https://p16.example/large.jpeg"] }
        });
        let resolved = UserSchema::V1.resolve(&user);
        assert_eq!(resolved.display_name, "Ana");
        assert_eq!(resolved.stable_id, "ana_22");
        assert_eq!(
            resolved.avatar_url.as_deref(),
            Some("https://p16.example/thumb.webp")
        );
    }

    #[test]
    fn test_v1_field_shapes() {
        let user = json!({ "avatar_medium": "https://p16.example/medium.png" });
        assert_eq!(
            UserSchema::V1.avatar_url(&user).as_deref(),
            Some("https://p16.example/medium.png")
        );

        let user = json!({ "avatar": { "url": "https://p16.example/a" } });
        assert_eq!(
            UserSchema::V1.avatar_url(&user).as_deref(),
            Some("https://p16.example/a")
        );

        let user = json!({ "avatar_thumb": { "m_urls": [] }, "avatar_large": { "url_list": ["https://x.example/l.jpg"] } });
        assert_eq!(
            UserSchema::V1.avatar_url(&user).as_deref(),
            Some("https://x.example/l.jpg")
        );

        let user = json!({ "avatar_thumb": "not-a-url" });
        assert_eq!(UserSchema::V1.avatar_url(&user), None);
    }

    #[test]
    fn test_legacy_profile_picture() {
        let user = json!({
            "display_name": "Old Timer",
            "uniqueId": "old_timer",
            "profile_picture": { "urls": ["https://legacy.example/pic.jpg"] }
        });
        let resolved = UserSchema::Legacy.resolve(&user);
        assert_eq!(resolved.display_name, "Old Timer");
        assert_eq!(resolved.stable_id, "old_timer");
        assert_eq!(
            resolved.avatar_url.as_deref(),
            Some("https://legacy.example/pic.jpg")
        );
    }

    #[test]
    fn test_pattern_fallback() {
        let user = json!({
            "unique_id": "x",
            "extra": { "nested": ["https://cdn.example/img/face.webp?x-expires=1"] }
        });
        assert_eq!(
            UserSchema::V1.avatar_url(&user).as_deref(),
            Some("https://cdn.example/img/face.webp?x-expires=1")
        );
        assert_eq!(UserSchema::V1.avatar_url(&json!({ "unique_id": "x" })), None);
    }

    #[test]
    fn test_missing_names_fall_back() {
        let resolved = UserSchema::V1.resolve(&json!({}));
        assert_eq!(resolved.display_name, "Anonymous user");
        assert_eq!(resolved.stable_id, "unknown");
        assert_eq!(resolved.avatar_url, None);
    }

    #[test]
    fn test_inspection_collects_all_candidates() {
        let user = json!({
            "unique_id": "ana_22",
            "avatar_thumb": { "m_urls": ["https://p16.example/thumb.webp"] },
            "profile_picture": { "urls": ["https://legacy.example/pic.jpg"] }
        });
        let report = UserInspection::new(UserSchema::V1, &user);
        let sources: Vec<&str> = report
            .avatar_candidates
            .iter()
            .map(|c| c.source.as_str())
            .collect();
        assert_eq!(sources, vec!["avatar_thumb", "profile_picture.urls"]);
        assert!(report.fields.contains(&"unique_id".to_string()));
        assert_eq!(report.resolved.stable_id, "ana_22");
    }
}
