//! Micro-quests: small context-aware tasks rolled from gated templates.
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::QUEST_ANOMALY_THRESHOLD;
use crate::events::{Notification, NotificationKind};
use crate::faction::{Faction, FactionCatalog};
use crate::region::Region;
use crate::state::WorldState;
use crate::weather::WeatherKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestTemplate {
    TravelerHelp,
    CaravanDefense,
    AnomalyScan,
    WeatherRescue,
    TimelineEcho,
}

impl QuestTemplate {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TravelerHelp => "traveler_help",
            Self::CaravanDefense => "caravan_defense",
            Self::AnomalyScan => "anomaly_scan",
            Self::WeatherRescue => "weather_rescue",
            Self::TimelineEcho => "timeline_echo",
        }
    }
}

/// A materialized quest with region, faction, and weather substituted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Microquest {
    pub id: QuestTemplate,
    pub title: String,
    pub description: String,
    pub steps: Vec<String>,
    pub rewards: Vec<String>,
    pub region_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
}

struct QuestContext<'a> {
    region: &'a Region,
    faction: Option<&'a Faction>,
    weather: Option<WeatherKind>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

impl QuestTemplate {
    fn materialize(self, ctx: &QuestContext<'_>) -> Microquest {
        let region = ctx.region;
        let (title, description, steps, rewards) = match self {
            Self::TravelerHelp => (
                "Help a Stranded Traveler",
                format!(
                    "A lone traveler is stuck in {}. They need assistance.",
                    region.name
                ),
                strings(&[
                    "Approach the traveler",
                    "Provide aid or supplies",
                    "Escort them to safety",
                ]),
                strings(&["caps", "random_loot"]),
            ),
            Self::CaravanDefense => {
                let (name, id) = ctx
                    .faction
                    .map_or(("local", "unknown"), |f| (f.name.as_str(), f.id.as_str()));
                (
                    "Defend a Caravan",
                    format!(
                        "A caravan under {name} protection is being stalked near {}.",
                        region.name
                    ),
                    strings(&[
                        "Locate the caravan",
                        "Defend against attackers",
                        "Escort them to the next checkpoint",
                    ]),
                    vec![format!("faction_rep:{id}"), "ammo_pack".to_string()],
                )
            }
            Self::AnomalyScan => (
                "Scan Anomaly Field",
                format!(
                    "Strange readings detected in {}. Investigate the anomaly.",
                    region.name
                ),
                strings(&[
                    "Travel to the anomaly site",
                    "Deploy scanning device",
                    "Collect anomaly samples",
                ]),
                strings(&["anomaly_item", "xp"]),
            ),
            Self::WeatherRescue => (
                "Weather Rescue",
                format!(
                    "Severe {} conditions have stranded survivors in {}.",
                    ctx.weather.unwrap_or_default().as_str(),
                    region.name
                ),
                strings(&[
                    "Reach the stranded group",
                    "Provide shelter or supplies",
                    "Guide them to safety",
                ]),
                strings(&["survival_gear", "caps"]),
            ),
            Self::TimelineEcho => (
                "Investigate Timeline Echo",
                format!(
                    "A temporal distortion has appeared in {}. Echoes of past events are repeating.",
                    region.name
                ),
                strings(&[
                    "Locate the echo",
                    "Observe the distortion",
                    "Stabilize or disrupt the loop",
                ]),
                strings(&["echo_item", "xp"]),
            ),
        };
        Microquest {
            id: self,
            title: title.to_string(),
            description,
            steps,
            rewards,
            region_id: region.id.clone(),
            faction: ctx.faction.map(|f| f.id.clone()),
        }
    }
}

/// Templates whose preconditions hold in `region` right now.
#[must_use]
pub fn eligible_templates(
    state: &WorldState,
    region: &Region,
    factions: &FactionCatalog,
) -> Vec<QuestTemplate> {
    let mut pool = vec![QuestTemplate::TravelerHelp];
    if state
        .faction_control(&region.id)
        .and_then(|id| factions.get(id))
        .is_some()
    {
        pool.push(QuestTemplate::CaravanDefense);
    }
    if state.anomaly_level(&region.id) > QUEST_ANOMALY_THRESHOLD {
        pool.push(QuestTemplate::AnomalyScan);
    }
    if state
        .weather()
        .is_some_and(|weather| weather.kind != WeatherKind::Clear)
    {
        pool.push(QuestTemplate::WeatherRescue);
    }
    if state.is_region_unstable(&region.id) {
        pool.push(QuestTemplate::TimelineEcho);
    }
    pool
}

/// Draw one eligible template uniformly and materialize it.
pub fn generate<R>(
    state: &mut WorldState,
    region: &Region,
    factions: &FactionCatalog,
    rng: &mut R,
) -> Microquest
where
    R: Rng + ?Sized,
{
    let pool = eligible_templates(state, region, factions);
    let template = pool[rng.gen_range(0..pool.len())];
    let ctx = QuestContext {
        region,
        faction: state
            .faction_control(&region.id)
            .and_then(|id| factions.get(id)),
        weather: state.weather().map(|w| w.kind),
    };
    let quest = template.materialize(&ctx);
    log::debug!("microquest {} in {}", template.as_str(), region.id);
    state.publish(Notification::new(
        NotificationKind::QuestUpdate,
        json!({ "id": template.as_str(), "step": "generated" }),
    ));
    quest
}
