//! Per-log-type field records.
//!
//! Every log type extracts into its own explicit shape instead of a generic
//! string map, so classification rules are checked against concrete types.
//! The enrichment pass stays generic through the identifier accessors and
//! `set_resolved_*` setters at the bottom of this module.

use serde::{Deserialize, Serialize};

use crate::provider::{ItemData, LocationData, QuestData, TraderData};

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventFields {
    Application(ApplicationFields),
    Backend(BackendFields),
    BackendCache(BackendCacheFields),
    BackendQueue(BackendQueueFields),
    FilesChecker(FilesCheckerFields),
    Insurance(InsuranceFields),
    Inventory(Box<InventoryFields>),
    NetworkConnection(NetworkConnectionFields),
    NetworkMessages(NetworkMessagesFields),
    ObjectPool(ObjectPoolFields),
    Output(OutputFields),
    Player(PlayerFields),
    Push(Box<PushFields>),
    SpatialAudio(SpatialAudioFields),
    AiData(AiDataFields),
    AiErrors(AiErrorsFields),
    /// Log types with nothing to extract (errors, seasons).
    None,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFields {
    pub profile_id: Option<String>,
    pub account_id: Option<String>,
    pub group_id: Option<String>,
    pub scene_preset: Option<String>,
    pub battl_eye_action: Option<String>,
    pub metric_code: Option<String>,
    pub matchmaking_event: Option<String>,
    pub game_time: Option<f64>,
    pub game_step_time: Option<f64>,
    pub real_time: Option<f64>,
    pub real_step_time: Option<f64>,
    pub time_diff: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendFields {
    pub id: Option<u64>,
    pub url: Option<String>,
    pub crc: Option<String>,
    pub response_code: Option<u32>,
    pub retry: Option<u32>,
    pub retries: Option<u32>,
    pub error_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendCacheFields {
    pub path: String,
    pub endpoint: String,
    pub cache_hit: bool,
}

/// One replayed command from a backend-queue failure dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueCommand {
    #[serde(rename = "Action")]
    pub action: Option<String>,
    pub trader: Option<String>,
    pub items: Option<Vec<QueueItem>>,
    pub difference: Option<serde_json::Value>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Option<String>,
    pub count: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendQueueFields {
    pub commands: Vec<QueueCommand>,
    pub resolved_trader: Option<TraderData>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesCheckerFields {
    pub executable_path: Option<String>,
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceFields {
    pub item_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridAddress {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub r: Option<String>,
    pub slot: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFields {
    pub profile_id: Option<String>,
    pub username: Option<String>,
    pub code: Option<u32>,
    pub operation_type: Option<String>,
    pub owner: Option<String>,
    pub item_id: Option<String>,
    pub tpl: Option<String>,
    pub address: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub grid: Option<GridAddress>,
    pub reason: Option<String>,
    pub world_position: Option<WorldPosition>,
    pub resolved_item: Option<ItemData>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConnectionFields {
    pub address: Option<String>,
    pub state: Option<String>,
    pub syn: Option<bool>,
    pub asc: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub disconnect_reason: Option<u32>,
    pub rtt: Option<u64>,
    pub packets_lost: Option<u64>,
    pub packets_sent: Option<u64>,
    pub packets_received: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMessagesFields {
    pub rpi: Option<f64>,
    pub rwi: Option<f64>,
    pub rsi: Option<f64>,
    pub rci: Option<f64>,
    pub ui: Option<f64>,
    pub lui: Option<f64>,
    pub lud: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPoolFields {
    pub asset_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFields {
    pub component_hint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFields {
    pub item_id: Option<String>,
    pub parent_id: Option<String>,
    pub container_id: Option<String>,
    pub resolved_item: Option<ItemData>,
}

/// Member info nested in `GroupMatchInviteSend` notifications.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub odid: Option<String>,
    pub odid_deprecated: Option<String>,
    pub odid_2_deprecated: Option<String>,
    pub aid: Option<i64>,
    pub is_leader: Option<bool>,
    pub is_ready: Option<bool>,
    pub info: Option<MemberProfile>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub nickname: Option<String>,
    pub side: Option<String>,
    pub level: Option<i64>,
    pub member_category: Option<i64>,
    pub game_version: Option<String>,
    pub prestige_level: Option<i64>,
    pub unlocked_locations: Option<Vec<String>>,
}

/// Raid settings nested in `GroupMatchRaidSettings` notifications.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidSettings {
    pub location: Option<String>,
    pub time_variant: Option<String>,
    pub raid_mode: Option<String>,
    pub side: Option<String>,
    pub metabolism_disabled: Option<bool>,
    pub players_spawn_place: Option<String>,
}

/// Notification payload decoded from JSON continuation lines.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub event_id: Option<String>,
    pub request_id: Option<String>,
    pub from: Option<i64>,
    pub members: Option<Vec<MemberInfo>>,
    pub raid_settings: Option<RaidSettings>,
    pub odid_leaved: Option<String>,
    pub odid: Option<String>,
    pub message: Option<serde_json::Value>,
    pub profiles: Option<Vec<serde_json::Value>>,
    /// Payload kept verbatim for notification types without a dedicated shape.
    pub raw_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushFields {
    pub url: Option<String>,
    pub token: Option<String>,
    pub count: Option<u64>,
    pub bytes_received: Option<u64>,
    pub message_type: Option<String>,
    pub notification_type: Option<String>,
    pub notification_time: Option<f64>,
    pub notification_duration: Option<f64>,
    pub show_notification: Option<bool>,
    pub error_code: Option<u32>,
    pub payload: Option<NotificationPayload>,
    pub quest_id: Option<String>,
    pub quest_status: Option<String>,
    pub quest_reward_rubles: Option<u64>,
    pub quest_reward_items: Option<Vec<String>>,
    pub resolved_quest: Option<QuestData>,
    pub resolved_location: Option<LocationData>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialAudioFields {
    pub quality: Option<String>,
    pub dsp_buffer_length: Option<u32>,
    pub dsp_buffers_num: Option<u32>,
    pub attempt: Option<u32>,
    pub reverb_enabled: Option<bool>,
    pub reverb_cooldown: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiDataFields {
    pub door_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiErrorsFields {
    pub source: String,
    pub door_name: Option<String>,
}

impl EventFields {
    /// Item template/instance id, where one is carried by the record.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            EventFields::Inventory(f) => f.item_id.as_deref().or(f.tpl.as_deref()),
            EventFields::Player(f) => f.item_id.as_deref(),
            _ => None,
        }
    }

    /// Trader id. Backend-queue dumps name the trader a command targets.
    pub fn trader_id(&self) -> Option<&str> {
        match self {
            EventFields::BackendQueue(f) => {
                f.commands.iter().find_map(|c| c.trader.as_deref())
            }
            _ => None,
        }
    }

    pub fn quest_id(&self) -> Option<&str> {
        match self {
            EventFields::Push(f) => f.quest_id.as_deref(),
            _ => None,
        }
    }

    /// Structured quest-status signal, where the record carries one.
    pub fn quest_status(&self) -> Option<&str> {
        match self {
            EventFields::Push(f) => f.quest_status.as_deref(),
            _ => None,
        }
    }

    /// Location id. Raid settings notifications carry the target location.
    pub fn location_id(&self) -> Option<&str> {
        match self {
            EventFields::Push(f) => f
                .payload
                .as_ref()
                .and_then(|p| p.raid_settings.as_ref())
                .and_then(|r| r.location.as_deref()),
            _ => None,
        }
    }

    pub fn resolved_item(&self) -> Option<&ItemData> {
        match self {
            EventFields::Inventory(f) => f.resolved_item.as_ref(),
            EventFields::Player(f) => f.resolved_item.as_ref(),
            _ => None,
        }
    }

    pub fn set_resolved_item(&mut self, item: ItemData) {
        match self {
            EventFields::Inventory(f) => f.resolved_item = Some(item),
            EventFields::Player(f) => f.resolved_item = Some(item),
            _ => {}
        }
    }

    pub fn resolved_trader(&self) -> Option<&TraderData> {
        match self {
            EventFields::BackendQueue(f) => f.resolved_trader.as_ref(),
            _ => None,
        }
    }

    pub fn set_resolved_trader(&mut self, trader: TraderData) {
        if let EventFields::BackendQueue(f) = self {
            f.resolved_trader = Some(trader);
        }
    }

    pub fn resolved_quest(&self) -> Option<&QuestData> {
        match self {
            EventFields::Push(f) => f.resolved_quest.as_ref(),
            _ => None,
        }
    }

    pub fn set_resolved_quest(&mut self, quest: QuestData) {
        if let EventFields::Push(f) = self {
            f.resolved_quest = Some(quest);
        }
    }

    pub fn resolved_location(&self) -> Option<&LocationData> {
        match self {
            EventFields::Push(f) => f.resolved_location.as_ref(),
            _ => None,
        }
    }

    pub fn set_resolved_location(&mut self, location: LocationData) {
        if let EventFields::Push(f) = self {
            f.resolved_location = Some(location);
        }
    }
}
