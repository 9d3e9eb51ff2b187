//! Directive extraction from AI reply text
//!
//! A reply may embed any number of fragments shaped like
//! ```text
//! {Command: {Device:KITCHEN_LIGHT, Action:on}}
//! ```
//! Each one becomes a command token `KITCHEN_LIGHT_ON` for the queue.

use once_cell::sync::Lazy;
use regex::Regex;

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{Command:\s*\{Device:([^,]+),\s*Action:([^}]+)\}\}").expect("valid regex")
});

/// One device/action pair found in free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub device: String,
    pub action: String,
}

impl Directive {
    /// Command token sent to the consumer: device verbatim, action upper-cased
    pub fn token(&self) -> String {
        format!("{}_{}", self.device, self.action.to_uppercase())
    }
}

/// Extract every directive in `text`, in order of appearance
pub fn parse_directives(text: &str) -> Vec<Directive> {
    DIRECTIVE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let device = caps.get(1)?.as_str().trim();
            let action = caps.get(2)?.as_str().trim();
            if device.is_empty() || action.is_empty() {
                return None;
            }
            Some(Directive {
                device: device.to_string(),
                action: action.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_directive() {
        let found = parse_directives("Sure! {Command: {Device:KITCHEN_LIGHT, Action:on}}");
        assert_eq!(
            found,
            vec![Directive {
                device: "KITCHEN_LIGHT".into(),
                action: "on".into()
            }]
        );
        assert_eq!(found[0].token(), "KITCHEN_LIGHT_ON");
    }

    #[test]
    fn test_multiple_directives_in_order() {
        let text = "Turning on the light {Command: {Device:KITCHEN_LIGHT, Action:ON}} \
                    and unlocking {Command:{Device: DOOR ,Action: unlock }} now.";
        let tokens: Vec<String> = parse_directives(text).iter().map(Directive::token).collect();
        assert_eq!(tokens, vec!["KITCHEN_LIGHT_ON", "DOOR_UNLOCK"]);
    }

    #[test]
    fn test_no_directives() {
        assert!(parse_directives("Hello, how can I help you today?").is_empty());
        assert!(parse_directives("").is_empty());
    }

    #[test]
    fn test_malformed_fragment_is_ignored() {
        // Missing the closing braces
        assert!(parse_directives("{Command: {Device:FAN, Action:on}").is_empty());
        // Whitespace-only action
        assert!(parse_directives("{Command: {Device:FAN, Action: }}").is_empty());
    }

    #[test]
    fn test_device_name_is_not_rewritten() {
        let found = parse_directives("{Command: {Device:Living Room Fan, Action:off}}");
        assert_eq!(found[0].token(), "Living Room Fan_OFF");
    }
}
