use serde_json::{Map, Value};

use crate::types::Intent;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    AssetsLoaded,
    Input { intent: Intent },
    Next,
    Pause,
    Restart,
    Victory,
    Debug { enabled: bool },
    Stats,
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "assets_loaded" => Some(ParsedClientMessage::AssetsLoaded),
        "input" => {
            let intent = Intent {
                up: parse_flag(object, "up")?,
                right: parse_flag(object, "right")?,
                down: parse_flag(object, "down")?,
                left: parse_flag(object, "left")?,
            };
            Some(ParsedClientMessage::Input { intent })
        }
        "next" => Some(ParsedClientMessage::Next),
        "pause" => Some(ParsedClientMessage::Pause),
        "restart" => Some(ParsedClientMessage::Restart),
        "victory" => Some(ParsedClientMessage::Victory),
        "debug" => {
            let enabled = object.get("enabled")?.as_bool()?;
            Some(ParsedClientMessage::Debug { enabled })
        }
        "stats" => Some(ParsedClientMessage::Stats),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

/// Missing flags read as released; present ones must be booleans.
fn parse_flag(object: &Map<String, Value>, key: &str) -> Option<bool> {
    match object.get(key) {
        None => Some(false),
        Some(value) => value.as_bool(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_message() {
        let parsed = parse_client_message(r#"{"type":"input","up":true,"left":true}"#)
            .expect("input message should parse");
        assert_eq!(
            parsed,
            ParsedClientMessage::Input {
                intent: Intent {
                    up: true,
                    right: false,
                    down: false,
                    left: true,
                }
            }
        );
    }

    #[test]
    fn reject_non_boolean_input_flag() {
        assert!(parse_client_message(r#"{"type":"input","down":"yes"}"#).is_none());
    }

    #[test]
    fn parse_phase_signals() {
        let cases = [
            ("assets_loaded", ParsedClientMessage::AssetsLoaded),
            ("next", ParsedClientMessage::Next),
            ("pause", ParsedClientMessage::Pause),
            ("restart", ParsedClientMessage::Restart),
            ("victory", ParsedClientMessage::Victory),
            ("stats", ParsedClientMessage::Stats),
        ];
        for (kind, expected) in cases {
            let raw = format!(r#"{{"type":"{kind}"}}"#);
            assert_eq!(parse_client_message(&raw), Some(expected));
        }
    }

    #[test]
    fn debug_requires_enabled_flag() {
        assert_eq!(
            parse_client_message(r#"{"type":"debug","enabled":true}"#),
            Some(ParsedClientMessage::Debug { enabled: true })
        );
        assert!(parse_client_message(r#"{"type":"debug"}"#).is_none());
    }

    #[test]
    fn parse_ping_message() {
        let parsed = parse_client_message(r#"{"type":"ping","t":12.5}"#)
            .expect("ping message should parse");
        assert_eq!(parsed, ParsedClientMessage::Ping { t: 12.5 });
    }

    #[test]
    fn reject_unknown_or_malformed() {
        assert!(parse_client_message(r#"{"type":"hello"}"#).is_none());
        assert!(parse_client_message(r#"["next"]"#).is_none());
        assert!(parse_client_message("not json").is_none());
    }
}
