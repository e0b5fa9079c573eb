// ABOUTME: Twitch specialization: ignores the fetched page and asks Twitch's GraphQL API instead.
// ABOUTME: Builds clip or channel previews from one persisted-query POST.

use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::PreviewError;
use crate::extractors::fields::host_key;
use crate::extractors::ExtractContext;
use crate::link::Link;

/// Public client id used by Twitch's own web player.
pub const CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Trident/7.0; rv:11.0) like Gecko";
const DEVICE_ID: &str = "lookoutpreview";

const LOGIN_PLACEHOLDER: &str = "\"CHANNEL_LOGIN\"";
const SLUG_PLACEHOLDER: &str = "\"CLIP_SLUG\"";

const CHANNEL_QUERY: &str = r#"[{"operationName":"ChannelRoot_Channel","variables":{"currentChannelLogin":"CHANNEL_LOGIN","includeChanlets":true},"extensions":{"persistedQuery":{"version":1,"sha256Hash":"ce18f2832d12cabcfee42f0c72001dfa1a5ed4a84931ead7b526245994810284"}}},{"operationName":"ChannelPage_ChannelHeader","variables":{"login":"CHANNEL_LOGIN"},"extensions":{"persistedQuery":{"version":1,"sha256Hash":"836472cb842531bb09f1c42ef5ce40533ac215385a3b80dffcf513c8de67133a"}}}]"#;

const CLIP_QUERY: &str = r#"[{"operationName":"ChannelRoot_Clip","variables":{"slugID":"CLIP_SLUG","includeChanlets":false},"extensions":{"persistedQuery":{"version":1,"sha256Hash":"11627b974d3926baf0aaf48b85d9f122d53760b0c3e7cab1fce17b0ccb3eef2d"}}}]"#;

const GAME_DIRECTORY: &str = "https://www.twitch.tv/directory/game/";
const LARGE_ART: &str = "-285x380";
const CLIP_ART: &str = "-138x190";
const CHANNEL_ART: &str = "-85x113";

/// What a Twitch URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwitchTarget {
    Clip(String),
    Channel(String),
}

impl TwitchTarget {
    /// Clips are `/<channel>/clip/<slug>` paths or anything on clips.twitch.tv;
    /// every other path is read as a channel login (its first segment).
    pub fn from_url(url: &Url) -> Self {
        let path = url.path();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if path.contains("/clip/") || url.host_str() == Some("clips.twitch.tv") {
            let slug = segments.last().copied().unwrap_or_default();
            TwitchTarget::Clip(slug.to_string())
        } else {
            let login = segments.first().copied().unwrap_or_default();
            TwitchTarget::Channel(login.to_string())
        }
    }

    /// The GraphQL request body for this target.
    fn request_body(&self) -> String {
        match self {
            TwitchTarget::Clip(slug) => CLIP_QUERY.replace(SLUG_PLACEHOLDER, &json_string(slug)),
            TwitchTarget::Channel(login) => {
                CHANNEL_QUERY.replace(LOGIN_PLACEHOLDER, &json_string(login))
            }
        }
    }
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Extract a Twitch clip or channel preview.
pub async fn extract(ctx: &ExtractContext<'_>, url: &Url, uri: &str) -> Result<Link, PreviewError> {
    let mut link = baseline(url, uri);
    let target = TwitchTarget::from_url(url);
    tracing::debug!(?target, "querying twitch");

    if let TwitchTarget::Clip(slug) = &target {
        link.set_extra("ClipSlug", slug.as_str());
        link.set_extra("IsClip", "true");
    }

    let body = query(ctx, &target, uri).await?;

    match target {
        TwitchTarget::Clip(_) => {
            let responses: Vec<ClipResponse> = serde_json::from_slice(&body)
                .map_err(|e| PreviewError::parse(uri, "Twitch", Some(e.into())))?;
            if let Some(response) = responses.into_iter().next() {
                apply_clip(&mut link, response.data.clip);
            }
            Ok(link)
        }
        TwitchTarget::Channel(_) => {
            let responses: Vec<ChannelResponse> = serde_json::from_slice(&body)
                .map_err(|e| PreviewError::parse(uri, "Twitch", Some(e.into())))?;
            let Some(response) = responses.into_iter().next() else {
                return Ok(link);
            };
            if response.data.user.display_name.is_empty() {
                // Not a channel: keep the plain "Twitch" preview.
                return Ok(baseline(url, uri));
            }
            apply_channel(&mut link, response.data);
            Ok(link)
        }
    }
}

fn baseline(url: &Url, uri: &str) -> Link {
    let mut link = Link::new(host_key(url), uri);
    link.title = "Twitch".to_string();
    link
}

/// POST the persisted query and return the raw response body.
async fn query(
    ctx: &ExtractContext<'_>,
    target: &TwitchTarget,
    uri: &str,
) -> Result<bytes::Bytes, PreviewError> {
    let response = ctx
        .http_client
        .post(ctx.twitch_endpoint)
        .header(ACCEPT_LANGUAGE, &ctx.settings.request_language)
        .header("Client-Id", CLIENT_ID)
        .header(CONTENT_TYPE, "application/json")
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .header("X-Device-Id", DEVICE_ID)
        .body(target.request_body())
        .send()
        .await
        .map_err(|e| {
            PreviewError::no_response(
                uri,
                "Twitch",
                Some(anyhow::anyhow!("request failed: {}", e)),
            )
        })?;

    let status = response.status();
    let body = response.bytes().await.map_err(|e| {
        PreviewError::no_response(
            uri,
            "Twitch",
            Some(anyhow::anyhow!("failed to read body: {}", e)),
        )
    })?;

    if !status.is_success() {
        return Err(PreviewError::not_accessible(
            uri,
            "Twitch",
            Some(anyhow::anyhow!(
                "HTTP status {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            )),
        ));
    }
    Ok(body)
}

fn apply_clip(link: &mut Link, clip: Clip) {
    let streamer = clip.broadcaster.display_name;
    link.title = format!("{} - {} - Twitch", streamer, clip.title);
    link.set_extra("Streamer", streamer);
    link.set_extra("ClipName", clip.title);
    link.set_extra("ClipSlug", clip.slug);
    apply_game(link, clip.game, CLIP_ART);
}

fn apply_channel(link: &mut Link, data: ChannelData) {
    let live = data.user.stream.kind == "live" || data.stream.kind == "live";
    let user = data.user;
    link.title = format!("{} - Twitch", user.display_name);
    link.set_extra("Streamer", user.display_name);
    link.set_extra("IsClip", "false");
    link.set_extra("StreamTitle", user.broadcast_settings.title);
    apply_game(link, user.broadcast_settings.game, CHANNEL_ART);
    link.set_extra("Live", live.to_string());
}

fn apply_game(link: &mut Link, game: Game, art_size: &str) {
    let small = game.box_art_url.replace(art_size, LARGE_ART);
    let full = small.replace(LARGE_ART, "");
    link.set_extra("GameLink", format!("{}{}", GAME_DIRECTORY, game.name));
    link.set_extra("Game", game.name);
    link.set_extra("GameArtSmall", small);
    link.set_extra("GameArtFull", full);
}

/// GraphQL uses explicit nulls for missing objects; treat them like absent fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct ChannelResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    data: ChannelData,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelData {
    #[serde(default, deserialize_with = "null_as_default")]
    user: User,
    #[serde(default, deserialize_with = "null_as_default")]
    stream: Stream,
}

#[derive(Debug, Default, Deserialize)]
struct ClipResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    data: ClipData,
}

#[derive(Debug, Default, Deserialize)]
struct ClipData {
    #[serde(default, deserialize_with = "null_as_default")]
    clip: Clip,
}

#[derive(Debug, Default, Deserialize)]
struct Clip {
    #[serde(default, deserialize_with = "null_as_default")]
    broadcaster: User,
    #[serde(default, deserialize_with = "null_as_default")]
    game: Game,
    #[serde(default, deserialize_with = "null_as_default")]
    slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct User {
    #[serde(default, deserialize_with = "null_as_default")]
    display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    broadcast_settings: BroadcastSettings,
    #[serde(default, deserialize_with = "null_as_default")]
    stream: Stream,
}

#[derive(Debug, Default, Deserialize)]
struct BroadcastSettings {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    game: Game,
}

#[derive(Debug, Default, Deserialize)]
struct Game {
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(rename = "boxArtURL", default, deserialize_with = "null_as_default")]
    box_art_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct Stream {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    kind: String,
}
