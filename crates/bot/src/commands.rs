pub const EVAL_COMMAND: &str = "!eval";

pub const USAGE_REPLY: &str = "Please provide a stock ticker. Usage: `!eval AAPL`";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `!eval TICKER`; the ticker is upper-cased.
    Eval { ticker: String },
    /// `!eval` with nothing after it.
    Usage,
    /// The configured broadcast command, matched exactly.
    Broadcast,
}

impl ChatCommand {
    /// `None` for messages the bot should ignore. `broadcast_command` must be lower-case.
    pub fn parse(content: &str, broadcast_command: &str) -> Option<Self> {
        let trimmed = content.trim();
        if trimmed.to_lowercase() == broadcast_command {
            return Some(ChatCommand::Broadcast);
        }

        let mut parts = trimmed.split_whitespace();
        let head = parts.next()?;
        if !head.eq_ignore_ascii_case(EVAL_COMMAND) {
            return None;
        }
        match parts.next() {
            Some(ticker) => Some(ChatCommand::Eval {
                ticker: ticker.to_uppercase(),
            }),
            None => Some(ChatCommand::Usage),
        }
    }
}

pub fn failure_reply(ticker: &str) -> String {
    format!(
        "I couldn't get an evaluation for **{ticker}**. It might be an invalid ticker or there was an API error."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIP: &str = "!quip";

    #[test]
    fn test_parse_eval() {
        assert_eq!(
            ChatCommand::parse("!eval aapl", QUIP),
            Some(ChatCommand::Eval {
                ticker: "AAPL".to_string()
            })
        );
        assert_eq!(
            ChatCommand::parse("  !EVAL   msft extra words", QUIP),
            Some(ChatCommand::Eval {
                ticker: "MSFT".to_string()
            })
        );
    }

    #[test]
    fn test_parse_eval_without_ticker() {
        assert_eq!(ChatCommand::parse("!eval", QUIP), Some(ChatCommand::Usage));
        assert_eq!(ChatCommand::parse("!eval   ", QUIP), Some(ChatCommand::Usage));
    }

    #[test]
    fn test_parse_broadcast_is_exact() {
        assert_eq!(ChatCommand::parse("!QUIP", QUIP), Some(ChatCommand::Broadcast));
        assert_eq!(ChatCommand::parse("!quip please", QUIP), None);
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert_eq!(ChatCommand::parse("hello there", QUIP), None);
        assert_eq!(ChatCommand::parse("!evaluate AAPL", QUIP), None);
        assert_eq!(ChatCommand::parse("", QUIP), None);
    }

    #[test]
    fn test_failure_reply_names_ticker() {
        assert_eq!(
            failure_reply("ZZZZ"),
            "I couldn't get an evaluation for **ZZZZ**. It might be an invalid ticker or there was an API error."
        );
    }
}
