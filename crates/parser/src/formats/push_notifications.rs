//! Push notification (WebSocket channel) classifier.
//!
//! Besides the plain channel lifecycle lines, `Got notification` records
//! carry a JSON payload in their continuation. That payload is decoded into
//! a typed shape per notification type, and chat-message notifications are
//! additionally mined for quest progress: the composite `templateId` embeds
//! a 24-hex quest id and a status token, and the attached item list carries
//! the quest rewards.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{continuation_of, group_num, group_string, optional};
use crate::fields::{
    EventFields, MemberInfo, MemberProfile, NotificationPayload, PushFields, RaidSettings,
};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|(?P<level>[^|]*)\|push-notifications\|(?P<message>.*)$",
    )
    .unwrap()
});

static PARAMS_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)url:\s*(.*)").unwrap());
static BATCH_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"Count:(\d+)").unwrap());
static BATCH_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"MessageType:([^\s]+)").unwrap());
static RECEIVED_BYTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"received:(\d+)").unwrap());
static NOTIF_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Type:\s*([^,]+)").unwrap());
static NOTIF_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"Time:\s*([^,]+)").unwrap());
static NOTIF_DURATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"Duration:\s*([^,]+)").unwrap());
static NOTIF_SHOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"ShowNotification:\s*(\w+)").unwrap());
static GOT_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|\s*(.*)$").unwrap());
static DROP_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"code:\s*(\d+)").unwrap());
static QUEST_HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{24}$").unwrap());

/// Roubles are rewarded as a stack of this money item.
const ROUBLE_TPL: &str = "5449016a4bdc2d6f028b456f";

pub struct PushNotificationsLogs;

impl LogClassifier for PushNotificationsLogs {
    fn log_type(&self) -> LogType {
        LogType::PushNotifications
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, fields) = classify(&message, &rec.continuation);
                LogEvent {
                    log_type: LogType::PushNotifications,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: LogLevel::parse(rec.group("level")),
                    component: LogType::PushNotifications.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::Push(Box::new(fields)),
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::PushNotifications, events, file_path)
    }
}

fn classify(message: &str, continuation: &[String]) -> (&'static str, PushFields) {
    if message.starts_with("NotificationManager: new params received url") {
        let url = PARAMS_URL.captures(message).and_then(|c| group_string(&c, 1));
        let token = url
            .as_deref()
            .and_then(|u| u.rsplit('/').next())
            .map(str::to_string);
        return ("connection_params", PushFields { url, token, ..Default::default() });
    }

    if message.starts_with("LongPollingWebSocketRequest result") {
        let fields = PushFields {
            count: BATCH_COUNT.captures(message).and_then(|c| group_num(&c, 1)),
            message_type: BATCH_TYPE.captures(message).and_then(|c| group_string(&c, 1)),
            ..Default::default()
        };
        return ("batch_result", fields);
    }

    if message.starts_with("LongPollingWebSocketRequest received") {
        let fields = PushFields {
            bytes_received: RECEIVED_BYTES.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("received", fields);
    }

    if message.starts_with("NotificationManager.ProcessMessage | Received notification") {
        let fields = PushFields {
            notification_type: NOTIF_TYPE.captures(message).and_then(|c| group_string(&c, 1)),
            notification_time: NOTIF_TIME.captures(message).and_then(|c| group_num(&c, 1)),
            notification_duration: NOTIF_DURATION
                .captures(message)
                .and_then(|c| group_num(&c, 1)),
            show_notification: NOTIF_SHOW
                .captures(message)
                .map(|c| c[1].eq_ignore_ascii_case("true")),
            ..Default::default()
        };
        return ("notification", fields);
    }

    if message.starts_with("Got notification") {
        let notification_type = GOT_TYPE.captures(message).and_then(|c| group_string(&c, 1));
        let mut fields = PushFields {
            notification_type: notification_type.clone(),
            ..Default::default()
        };
        if !continuation.is_empty() {
            if let Some(data) = parse_json(continuation) {
                fields.payload = parse_payload(notification_type.as_deref(), &data);
                if let Some(quest) = extract_quest_info(notification_type.as_deref(), &data) {
                    fields.quest_id = quest.quest_id;
                    fields.quest_status = quest.quest_status;
                    fields.quest_reward_rubles = quest.reward_rubles;
                    fields.quest_reward_items = quest.reward_items;
                }
            }
        }
        return ("simple_notification", fields);
    }

    if message.contains("Service Notifications Ping") {
        return ("ping", PushFields::default());
    }

    if message.contains("Notification channel has been") {
        let fields = PushFields {
            error_code: DROP_CODE.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("dropped", fields);
    }

    ("other", PushFields::default())
}

/// Best-effort parse of the continuation block as one JSON document.
fn parse_json(lines: &[String]) -> Option<Value> {
    serde_json::from_str(&lines.join("\n")).ok()
}

struct QuestInfo {
    quest_id: Option<String>,
    quest_status: Option<String>,
    reward_rubles: Option<u64>,
    reward_items: Option<Vec<String>>,
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Mine a chat-message notification for quest progress.
///
/// Status precedence is fixed: tokens embedded in the template id first, the
/// message `type` field second, free text last. A template id with no quest
/// token at all (e.g. a marketplace sale sharing the `<hex> <n>` shape) is
/// rejected outright.
fn extract_quest_info(notification_type: Option<&str>, data: &Value) -> Option<QuestInfo> {
    let type_lower = notification_type.unwrap_or("").to_lowercase();
    let data_type_lower = str_field(data, "type").unwrap_or("").to_lowercase();
    let is_quest_message = type_lower == "chatmessagereceived"
        || data_type_lower == "new_message"
        || data_type_lower == "chatmessagereceived";
    if !is_quest_message {
        return None;
    }

    let message = data.get("message");
    let template_id = message.and_then(|m| str_field(m, "templateId"));

    let mut quest_id = None;
    let mut quest_status: Option<&str> = None;

    if let Some(template_id) = template_id {
        let parts: Vec<&str> = template_id.split_whitespace().collect();
        if let Some(first) = parts.first() {
            if QUEST_HEX.is_match(&first.to_lowercase()) {
                quest_id = Some(first.to_string());
            }
        }
        let lower_parts: Vec<String> = parts.iter().map(|p| p.to_lowercase()).collect();
        let has_quest_token = lower_parts.iter().any(|p| {
            p.contains("success") || p.contains("fail") || p.contains("description")
        });
        if !has_quest_token {
            // Ragfair sales share the "<hex> <n>" template shape; without a
            // quest token this is not quest traffic.
            return None;
        }
        if lower_parts.iter().any(|p| p.contains("success")) {
            quest_status = Some("completed");
        } else if lower_parts.iter().any(|p| p.contains("fail")) {
            quest_status = Some("failed");
        } else if lower_parts
            .iter()
            .any(|p| p.contains("description") || p.contains("start"))
        {
            quest_status = Some("started");
        }
    }

    if quest_status.is_none() {
        if let Some(message_type) = message.and_then(|m| str_field(m, "type")) {
            let message_type = message_type.to_lowercase();
            if message_type.contains("success") {
                quest_status = Some("completed");
            } else if message_type.contains("fail") {
                quest_status = Some("failed");
            } else if message_type.contains("description") || message_type.contains("start") {
                quest_status = Some("started");
            }
        }
    }
    if quest_status.is_none() {
        if let Some(text) = message.and_then(|m| str_field(m, "text")) {
            let text = text.to_lowercase();
            if text.contains("quest") || text.contains("start") {
                quest_status = Some("started");
            }
        }
    }

    let mut reward_rubles = None;
    let mut reward_items = Vec::new();
    if let Some(items) = message
        .and_then(|m| m.get("items"))
        .and_then(|i| i.get("data"))
        .and_then(Value::as_array)
    {
        for item in items {
            let Some(tpl) = str_field(item, "_tpl") else {
                continue;
            };
            if tpl == ROUBLE_TPL {
                if let Some(count) = item
                    .get("upd")
                    .and_then(|u| u.get("StackObjectsCount"))
                    .and_then(Value::as_u64)
                {
                    reward_rubles = Some(count);
                }
            } else {
                reward_items.push(tpl.to_string());
            }
        }
    }

    if quest_id.is_none()
        && quest_status.is_none()
        && reward_items.is_empty()
        && reward_rubles.is_none()
    {
        return None;
    }
    Some(QuestInfo {
        quest_id,
        quest_status: quest_status.map(str::to_string),
        reward_rubles,
        reward_items: if reward_items.is_empty() {
            None
        } else {
            Some(reward_items)
        },
    })
}

fn parse_payload(notification_type: Option<&str>, data: &Value) -> Option<NotificationPayload> {
    let notification_type = notification_type?;
    let kind = str_field(data, "type").map(str::to_string);
    let event_id = str_field(data, "eventId").map(str::to_string);

    let payload = match notification_type {
        "GroupMatchInviteSend" => NotificationPayload {
            kind: kind.unwrap_or_else(|| "groupMatchInviteSend".to_string()),
            event_id,
            request_id: str_field(data, "requestId").map(str::to_string),
            from: data.get("from").and_then(Value::as_i64),
            members: data
                .get("members")
                .and_then(Value::as_array)
                .map(|members| members.iter().map(parse_member).collect()),
            ..Default::default()
        },
        "GroupMatchRaidSettings" => NotificationPayload {
            kind: kind.unwrap_or_else(|| "groupMatchRaidSettings".to_string()),
            event_id,
            raid_settings: data.get("raidSettings").map(parse_raid_settings),
            ..Default::default()
        },
        "GroupMatchUserLeave" => NotificationPayload {
            kind: kind.unwrap_or_else(|| "groupMatchUserLeave".to_string()),
            event_id,
            odid_leaved: str_field(data, "odidLeaved").map(str::to_string),
            ..Default::default()
        },
        "GroupMatchLeaderChanged" => NotificationPayload {
            kind: kind.unwrap_or_else(|| "groupMatchLeaderChanged".to_string()),
            event_id,
            odid: str_field(data, "odid").map(str::to_string),
            ..Default::default()
        },
        "GroupMatchInviteCancel" | "GroupMatchInviteDecline" | "GroupMatchInviteAccept"
        | "GroupMatchWasRemoved" => NotificationPayload {
            kind: kind.unwrap_or_else(|| {
                let mut lowered = notification_type.to_string();
                lowered[..1].make_ascii_lowercase();
                lowered
            }),
            event_id,
            ..Default::default()
        },
        "ChatMessageReceived" => NotificationPayload {
            kind: kind.unwrap_or_else(|| "chatMessageReceived".to_string()),
            event_id,
            message: data.get("message").cloned(),
            profiles: data
                .get("profiles")
                .and_then(Value::as_array)
                .map(|p| p.to_vec()),
            ..Default::default()
        },
        "ping" => NotificationPayload {
            kind: "ping".to_string(),
            event_id,
            ..Default::default()
        },
        _ => NotificationPayload {
            kind: kind.unwrap_or_else(|| notification_type.to_string()),
            event_id,
            raw_data: Some(data.clone()),
            ..Default::default()
        },
    };
    Some(payload)
}

fn parse_member(member: &Value) -> MemberInfo {
    let info = member.get("Info").map(|info| MemberProfile {
        nickname: str_field(info, "Nickname").map(str::to_string),
        side: str_field(info, "Side").map(str::to_string),
        level: info.get("Level").and_then(Value::as_i64),
        member_category: info.get("MemberCategory").and_then(Value::as_i64),
        game_version: str_field(info, "GameVersion").map(str::to_string),
        prestige_level: info.get("PrestigeLevel").and_then(Value::as_i64),
        unlocked_locations: info
            .get("unlockedLocations")
            .and_then(Value::as_array)
            .map(|l| {
                l.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }),
    });

    MemberInfo {
        odid: str_field(member, "_id").map(str::to_string),
        odid_deprecated: str_field(member, "odid").map(str::to_string),
        odid_2_deprecated: str_field(member, "Odid").map(str::to_string),
        aid: member.get("aid").and_then(Value::as_i64),
        is_leader: member.get("isLeader").and_then(Value::as_bool),
        is_ready: member.get("isReady").and_then(Value::as_bool),
        info,
    }
}

fn parse_raid_settings(settings: &Value) -> RaidSettings {
    RaidSettings {
        location: str_field(settings, "location").map(str::to_string),
        time_variant: str_field(settings, "timeVariant").map(str::to_string),
        raid_mode: str_field(settings, "raidMode").map(str::to_string),
        side: str_field(settings, "side").map(str::to_string),
        metabolism_disabled: settings.get("metabolismDisabled").and_then(Value::as_bool),
        players_spawn_place: str_field(settings, "playersSpawnPlace").map(str::to_string),
    }
}
