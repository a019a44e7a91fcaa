///! Display names for spacecraft and ground stations
///!
///! Feed records use short codes. Unknown codes are shown as they are.

use regex::Regex;
use std::sync::LazyLock;

static DSS_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("static pattern is valid"));

pub fn orbiter_name(code: &str) -> &str {
    match code {
        "ODY" => "Odyssey",
        "MRO" => "MRO",
        "MVN" => "Maven",
        "TGO" => "ExoMars TGO",
        "MEX" => "Mars Express",
        other => other,
    }
}

pub fn lander_name(code: &str) -> &str {
    match code {
        "M20" => "Perseverance",
        "NSY" => "InSight",
        "MSL" => "Curiosity",
        other => other,
    }
}

/// Non-DSN receivers that show up in the orbiter event feed
fn receiver_name(code: &str) -> Option<&'static str> {
    match code {
        "MLG" => Some("Malargüe (ESA)"),
        "NNO" => Some("New Norcia (ESA)"),
        "CEB" => Some("Cebreros (ESA)"),
        "KLZ" => Some("Kalyazin (Roscosmos)"),
        _ => None,
    }
}

/// Ground station label: bare numbers are Deep Space Network antennas
pub fn format_receiver(receiver: &str) -> String {
    if receiver.starts_with("DSS-") {
        receiver.to_string()
    } else if DSS_NUMBER.is_match(receiver) {
        format!("DSS-{}", receiver)
    } else if let Some(name) = receiver_name(receiver) {
        name.to_string()
    } else {
        receiver.to_string()
    }
}
