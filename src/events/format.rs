//! Compact text format for simulation event serialization
//!
//! Format: `T:NNNNNNN|CODE|data...`
//! - T:NNNNNNN = timestamp in milliseconds (7 digits, wraps at 9999999)
//! - CODE = event type code
//! - data = pipe-separated values specific to event type
//!
//! Examples:
//! ```text
//! T:0000000|RS|12345678|600
//! T:0000150|IN|0|17|8.73
//! T:0000166|FI|4
//! T:0000500|T|30|12.412|0.0031
//! T:0010000|RE|600|10.0
//! ```

use super::types::{SimConfigSnapshot, SimEvent};

/// Serialize a SimEvent to compact text format
pub fn serialize_event(time_ms: u32, event: &SimEvent) -> String {
    let ts = format!("T:{:07}", time_ms % 10_000_000);
    let code = event.type_code();

    let data = match event {
        SimEvent::SessionStart {
            session_id,
            timestamp,
        } => format!("{}|{}", session_id, timestamp),
        SimEvent::Config(config) => {
            // Config as compact JSON
            serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string())
        }
        SimEvent::RunStart { seed, frames } => format!("{}|{}", seed, frames),
        SimEvent::RunEnd { frames, duration } => format!("{}|{:.1}", frames, duration),
        SimEvent::Injected {
            controller,
            body,
            speed,
        } => format!("{}|{}|{:.2}", controller, body, speed),
        SimEvent::FloorImpacts { count } => count.to_string(),
        SimEvent::Contacts { count } => count.to_string(),
        SimEvent::Tick {
            frame,
            kinetic_energy,
            max_penetration,
        } => format!("{}|{:.3}|{:.4}", frame, kinetic_energy, max_penetration),
    };

    format!("{}|{}|{}", ts, code, data)
}

/// Parse a line back into timestamp and event
pub fn parse_event(line: &str) -> Option<(u32, SimEvent)> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 3 {
        return None;
    }

    let ts_str = parts[0].strip_prefix("T:")?;
    let time_ms: u32 = ts_str.parse().ok()?;

    let code = parts[1];
    let data = &parts[2..];

    let event = match code {
        "SE" if data.len() >= 2 => SimEvent::SessionStart {
            session_id: data[0].to_string(),
            timestamp: data[1].to_string(),
        },
        "CF" if !data.is_empty() => {
            let json_str = data.join("|");
            let config: SimConfigSnapshot = serde_json::from_str(&json_str).ok()?;
            SimEvent::Config(config)
        }
        "RS" if data.len() >= 2 => SimEvent::RunStart {
            seed: data[0].parse().ok()?,
            frames: data[1].parse().ok()?,
        },
        "RE" if data.len() >= 2 => SimEvent::RunEnd {
            frames: data[0].parse().ok()?,
            duration: data[1].parse().ok()?,
        },
        "IN" if data.len() >= 3 => SimEvent::Injected {
            controller: data[0].parse().ok()?,
            body: data[1].parse().ok()?,
            speed: data[2].parse().ok()?,
        },
        "FI" if !data.is_empty() => SimEvent::FloorImpacts {
            count: data[0].parse().ok()?,
        },
        "CT" if !data.is_empty() => SimEvent::Contacts {
            count: data[0].parse().ok()?,
        },
        "T" if data.len() >= 3 => SimEvent::Tick {
            frame: data[0].parse().ok()?,
            kinetic_energy: data[1].parse().ok()?,
            max_penetration: data[2].parse().ok()?,
        },
        _ => return None,
    };

    Some((time_ms, event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_line() {
        let event = SimEvent::Injected {
            controller: 1,
            body: 17,
            speed: 8.731,
        };
        let line = serialize_event(150, &event);
        assert_eq!(line, "T:0000150|IN|1|17|8.73");

        let (ts, parsed) = parse_event(&line).unwrap();
        assert_eq!(ts, 150);
        if let SimEvent::Injected { controller, body, .. } = parsed {
            assert_eq!(controller, 1);
            assert_eq!(body, 17);
        } else {
            panic!("Wrong event type");
        }
    }

    #[test]
    fn test_config_survives_json() {
        let config = SimConfigSnapshot {
            body_count: 200,
            body_radius: 0.08,
            gravity: 9.8,
            floor_restitution: 0.8,
            floor_friction: 0.98,
            time_scale: 0.8,
        };
        let line = serialize_event(0, &SimEvent::Config(config.clone()));
        let (_, parsed) = parse_event(&line).unwrap();
        assert_eq!(parsed, SimEvent::Config(config));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_event("").is_none());
        assert!(parse_event("T:0000001|ZZ|1").is_none());
        assert!(parse_event("X:1|FI|3").is_none());
        assert!(parse_event("T:0000001|FI|lots").is_none());
    }
}
