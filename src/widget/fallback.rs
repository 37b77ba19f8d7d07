//! Canned replies used when the proxy cannot answer.

use lazy_static::lazy_static;
use regex::Regex;

pub const GREETING_REPLY: &str = "Сәлем! Қош келдіңіз. Қалай көмектесе аламын?";
pub const HELP_REPLY: &str = "Мен қазақ тілінде қысқа жауап беремін. Сұрағыңызды нақты жазыңыз.";
pub const HOURS_REPLY: &str = "Біздің жұмыс уақыты: дүйсенбі–жұма, 09:00–18:00 (GMT+6).";
pub const CONTACT_REPLY: &str = "Байланыс: +7 776 660 2006, n_argynbekov@kbtu.kz";
pub const THANKS_REPLY: &str = "Рақмет! Тағы сұрақ бар ма?";
pub const CLARIFY_REPLY: &str = "Сұрағыңызды нақтылай аласыз ба? Қысқаша, қарапайым тілмен жазыңыз.";

lazy_static! {
    // Checked in order; the first match wins.
    static ref RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"^салем|сәлем|hello|hi|привет").unwrap(), GREETING_REPLY),
        (Regex::new(r"көмек|help|қалай жұмыс істейді").unwrap(), HELP_REPLY),
        (Regex::new(r"жұмыс уақыты|режим|сағат").unwrap(), HOURS_REPLY),
        (Regex::new(r"байланыс|телефон|email|почта").unwrap(), CONTACT_REPLY),
        (Regex::new(r"рахмет|спасибо|thanks").unwrap(), THANKS_REPLY),
    ];
}

pub fn local_reply(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&lowered))
        .map(|(_, reply)| *reply)
        .unwrap_or(CLARIFY_REPLY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_topic_has_its_reply() {
        assert_eq!(local_reply("Сәлем!"), GREETING_REPLY);
        assert_eq!(local_reply("маған көмек керек"), HELP_REPLY);
        assert_eq!(local_reply("Жұмыс уақыты қандай?"), HOURS_REPLY);
        assert_eq!(local_reply("телефон нөміріңіз"), CONTACT_REPLY);
        assert_eq!(local_reply("Спасибо"), THANKS_REPLY);
    }

    #[test]
    fn earlier_pattern_wins() {
        assert_eq!(local_reply("сәлем, рахмет"), GREETING_REPLY);
        assert_eq!(local_reply("help, thanks"), HELP_REPLY);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(local_reply("HELLO there"), GREETING_REPLY);
        assert_eq!(local_reply("EMAIL"), CONTACT_REPLY);
    }

    #[test]
    fn anchored_salem_only_matches_at_start() {
        assert_eq!(local_reply("салем"), GREETING_REPLY);
        assert_eq!(local_reply("ну салем"), CLARIFY_REPLY);
    }

    #[test]
    fn anything_else_asks_for_clarification() {
        assert_eq!(local_reply(""), CLARIFY_REPLY);
        assert_eq!(local_reply("Қазақ хандығы қашан құрылды?"), CLARIFY_REPLY);
    }
}
