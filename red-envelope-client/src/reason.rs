//! Human-readable reason extraction from wallet/RPC error messages.

use std::sync::OnceLock;

use regex::Regex;

/// Wallet libraries embed the revert reason between these two markers.
const REASON_PATTERN: &str = r"reason:([\s\S]*)Contract Call";

fn reason_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(REASON_PATTERN).expect("reason pattern is a valid regex"))
}

/// Extract the revert reason from a raw error message.
///
/// Returns the captured text verbatim (surrounding whitespace included). Messages without
/// the `reason: ... Contract Call` markers are returned unchanged.
pub fn extract_reason(message: &str) -> String {
    reason_regex()
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::extract_reason;

    #[test]
    fn captures_reason_with_whitespace() {
        let msg = "execution reverted ... reason: insufficient funds Contract Call: address 0x00";
        assert_eq!(extract_reason(msg), " insufficient funds ");
    }

    #[test]
    fn spans_newlines() {
        let msg = "The contract function \"grab\" reverted with the following reason:\nalready grabbed\n\nContract Call:\n  function: grab(uint256)";
        assert_eq!(extract_reason(msg), "\nalready grabbed\n\n");
    }

    #[test]
    fn falls_back_to_raw_message() {
        let msg = "User rejected the request.";
        assert_eq!(extract_reason(msg), msg);
    }
}
