///! Alert text rendering for relay sessions and downlinks

use mrn_common::{Downlink, LinkType, OrbiterEvent, OrbiterEventKind, UplinkWindow};

use super::names::{format_receiver, lander_name, orbiter_name};

/// Downlinks smaller than this are not worth announcing
pub const MIN_DOWNLINK_BITS: i64 = 100_000;

/// Rates at or above this many kbit/s are shown in Mbps
const MBPS_THRESHOLD_KBPS: f64 = 1024.0;

fn direction_glyph(link_type: &LinkType) -> &'static str {
    match link_type {
        LinkType::Forward => "←",
        LinkType::Return => "→",
        _ => "⟷",
    }
}

fn optional_rate(rate: Option<i64>) -> String {
    rate.map_or_else(|| "?".to_string(), |r| r.to_string())
}

/// Render the announcement for a newly-active uplink session
pub fn format_window(window: &UplinkWindow) -> String {
    let mut output = format!(
        "New session: {} {} {}\n",
        lander_name(&window.lander),
        direction_glyph(&window.link_type),
        orbiter_name(&window.orbiter)
    );

    let minutes = match (window.pass_start, window.pass_end) {
        (Some(start), Some(end)) => {
            format!("{:.0}", (end - start).num_milliseconds() as f64 / 60_000.0)
        }
        _ => "?".to_string(),
    };

    match window.request_volume_returned {
        Some(volume) => output.push_str(&format!(
            "Expected data: {:.0} MB in {} minutes\n",
            volume / 8.0,
            minutes
        )),
        None => output.push_str(&format!("Expected duration: {} minutes\n", minutes)),
    }

    output.push_str(&format!(
        "Configured data rate: {}/{} kbps",
        optional_rate(window.request_forward_rate),
        optional_rate(window.request_return_rate)
    ));
    if window.request_adr {
        output.push_str(" (adaptive)");
    }

    output
}

/// Data rate in bits per second as kbps or Mbps
pub fn format_data_rate(bits_per_second: f64) -> String {
    let kbps = bits_per_second / 1024.0;
    if kbps >= MBPS_THRESHOLD_KBPS {
        format!("{:.1} Mbps", kbps / 1024.0)
    } else {
        format!("{:.0} kbps", kbps)
    }
}

/// Render the announcement for a downlink, given its correlated events.
///
/// Returns `None` for transfers below [`MIN_DOWNLINK_BITS`]; a missing bit
/// count counts as zero.
pub fn format_downlink(downlink: &Downlink, events: &[OrbiterEvent]) -> Option<String> {
    let bits = downlink.bits.unwrap_or(0);
    if bits < MIN_DOWNLINK_BITS {
        return None;
    }

    let mut output = format!(
        "{} downlinking {:.2} MB from {} to Earth",
        orbiter_name(&downlink.orbiter),
        bits as f64 / 8.0 / 1024.0 / 1024.0,
        lander_name(&downlink.lander)
    );

    let stations: Vec<String> = events
        .iter()
        .filter(|e| e.kind == OrbiterEventKind::DsnTrack)
        .filter_map(|e| e.receiver.as_deref())
        .map(format_receiver)
        .collect();
    if !stations.is_empty() {
        let label = if stations.len() == 1 {
            "Ground station"
        } else {
            "Ground stations"
        };
        output.push_str(&format!("\n{}: {}", label, stations.join(", ")));
    }

    let rate = events
        .iter()
        .filter(|e| e.kind == OrbiterEventKind::DataRate)
        .filter_map(|e| e.data_rate)
        .last();
    if let Some(rate) = rate {
        output.push_str(&format!("\nData rate: {}", format_data_rate(rate)));
    }

    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::relay::test_support::{downlink, window};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 12, 4, 0, 0).unwrap()
    }

    fn event(kind: OrbiterEventKind, receiver: Option<&str>, rate: Option<f64>) -> OrbiterEvent {
        OrbiterEvent {
            orbiter: "ODY".to_string(),
            kind,
            start_time: t0(),
            end_time: None,
            receiver: receiver.map(str::to_string),
            data_rate: rate,
        }
    }

    #[test]
    fn test_format_window() {
        let w = window("M20_MRO_1", t0(), t0() + Duration::minutes(10));
        assert_eq!(
            format_window(&w),
            "New session: Perseverance → MRO\n\
             Expected data: 150 MB in 20 minutes\n\
             Configured data rate: 8/2048 kbps"
        );
    }

    #[test]
    fn test_format_window_glyphs_and_adaptive() {
        let mut w = window("M20_MRO_1", t0(), t0() + Duration::minutes(10));
        w.request_adr = true;
        w.link_type = LinkType::Forward;
        assert!(format_window(&w).starts_with("New session: Perseverance ← MRO\n"));
        assert!(format_window(&w).ends_with("kbps (adaptive)"));

        w.link_type = LinkType::Bidirectional("forward_return".to_string());
        assert!(format_window(&w).starts_with("New session: Perseverance ⟷ MRO\n"));
    }

    #[test]
    fn test_format_window_missing_values() {
        let mut w = window("NSY_TGO_1", t0(), t0() + Duration::minutes(10));
        w.lander = "NSY".to_string();
        w.orbiter = "TGO".to_string();
        w.request_volume_returned = None;
        w.request_forward_rate = None;
        assert_eq!(
            format_window(&w),
            "New session: InSight → ExoMars TGO\n\
             Expected duration: 20 minutes\n\
             Configured data rate: ?/2048 kbps"
        );
    }

    #[test]
    fn test_downlink_noise_filter() {
        assert_eq!(format_downlink(&downlink("A", t0(), 99_999), &[]), None);
        let text = format_downlink(&downlink("A", t0(), 100_000), &[]).unwrap();
        assert_eq!(text, "Odyssey downlinking 0.01 MB from Curiosity to Earth");

        let mut unknown = downlink("B", t0(), 0);
        unknown.bits = None;
        assert_eq!(format_downlink(&unknown, &[]), None);
    }

    #[test]
    fn test_format_downlink_with_events() {
        let events = vec![
            event(OrbiterEventKind::DsnTrack, Some("43"), None),
            event(OrbiterEventKind::DsnTrack, Some("NNO"), None),
            event(OrbiterEventKind::DataRate, None, Some(2_097_152.0)),
        ];
        let text = format_downlink(&downlink("A", t0(), 83_886_080), &events).unwrap();
        assert_eq!(
            text,
            "Odyssey downlinking 10.00 MB from Curiosity to Earth\n\
             Ground stations: DSS-43, New Norcia (ESA)\n\
             Data rate: 2.0 Mbps"
        );
    }

    #[test]
    fn test_single_ground_station() {
        let events = vec![event(OrbiterEventKind::DsnTrack, Some("DSS-14"), None)];
        let text = format_downlink(&downlink("A", t0(), 1_000_000), &events).unwrap();
        assert!(text.ends_with("\nGround station: DSS-14"));
    }

    #[test]
    fn test_rate_unit_threshold() {
        assert_eq!(format_data_rate(1024.0 * 1024.0), "1.0 Mbps");
        assert_eq!(format_data_rate(1024.0 * 1000.0), "1000 kbps");
        assert_eq!(format_data_rate(2048.0), "2 kbps");
        assert_eq!(format_data_rate(3.5 * 1024.0 * 1024.0), "3.5 Mbps");
    }
}
