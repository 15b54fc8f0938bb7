//! Keyword gate applied to headline titles before any article fetch.
//!
//! This is the cheap first filter: a set-membership check over the title's
//! lowercase tokens. The model-based classifier gives a second opinion later;
//! the two gates are independent and both must pass.

use std::collections::HashSet;

use sitrep_core::EventType;

/// Geographic and actor context that anchors a headline to India.
/// Bypassed entirely for national-desk URLs.
const INDIA_CONTEXT: &[&str] = &[
    "india",
    "indian",
    "jammu",
    "kashmir",
    "ladakh",
    "manipur",
    "pulwama",
    "uri",
    "delhi",
    "shopian",
    "baramulla",
    "srinagar",
    "poonch",
    "northeast",
    "kulgam",
    "bsf",
    "crpf",
    "iaf",
    "drdo",
    "isro",
    "loc",
    "lac",
    "modi",
];

const STRATEGIC: &[&str] = &[
    "deployment",
    "missile",
    "satellite",
    "drdo",
    "drill",
    "exercise",
    "procurement",
    "evacuation",
    "embassy",
    "launched",
    "ceasefire",
    "coastal",
    "security",
];

const BATTLE: &[&str] = &[
    "firing",
    "gunfire",
    "skirmish",
    "encounter",
    "cross-border",
    "ambush",
    "shelling",
    "sniper",
    "airstrike",
    "clash",
    "army",
    "navy",
];

const EXPLOSION: &[&str] = &[
    "blast",
    "ied",
    "explosion",
    "bomb",
    "grenade",
    "detonation",
    "landmine",
    "sabotage",
];

const CIVILIAN: &[&str] = &[
    "civilian",
    "villager",
    "bystander",
    "lynching",
    "massacre",
    "hostage",
    "students",
    "villagers",
];

const MILITARY_OR_TERROR_LINK: &[&str] = &[
    "terrorist",
    "militant",
    "naxal",
    "maoist",
    "encounter",
    "crpf",
    "bsf",
    "army",
    "jawan",
];

fn title_tokens(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-').to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_any(tokens: &HashSet<String>, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| tokens.contains(*k))
}

/// Classify a headline title into a coarse category, or reject it.
///
/// Rule order matters and first match wins: strategic, then battle, then
/// explosion, then civilian harm. The first three require India context
/// unless the URL came from the national desk (`is_national`); civilian harm
/// instead requires a military/terror-linked actor in the title.
#[must_use]
pub fn classify_headline(title: &str, is_national: bool) -> Option<EventType> {
    let tokens = title_tokens(title);
    let in_context = is_national || contains_any(&tokens, INDIA_CONTEXT);

    if contains_any(&tokens, STRATEGIC) && in_context {
        return Some(EventType::StrategicDevelopments);
    }
    if contains_any(&tokens, BATTLE) && in_context {
        return Some(EventType::Battles);
    }
    if contains_any(&tokens, EXPLOSION) && in_context {
        return Some(EventType::ExplosionsRemoteViolence);
    }
    if contains_any(&tokens, CIVILIAN) && contains_any(&tokens, MILITARY_OR_TERROR_LINK) {
        return Some(EventType::ViolenceAgainstCivilians);
    }

    None
}
