//! Persona and canned reply texts used by the proxy.

/// Built-in persona: answer only in Kazakh, briefly, and only about history.
pub const DEFAULT_PERSONA: &str = concat!(
    "Сен ТЕК қазақ тілінде жауап бересің. Жауаптарың қысқа, нақты және түсінікті болсын. ",
    "Егер пайдаланушы басқа тілде жазса да, әрдайым қазақ тілінде жауап бер.",
    "Сен тек тарихи сұрақтарға жауап бересің, тек тарихпен байланысты."
);

/// Sent with the upstream status code when the model call is refused.
pub const UPSTREAM_FAILURE_REPLY: &str = "Модельден жауап алу сәтсіз. Кейінірек қайталап көріңіз.";

/// Used when the upstream succeeded but carried no message content.
pub const EMPTY_COMPLETION_REPLY: &str = "Кешіріңіз, жауап табылмады.";

/// Sent with 500 when the upstream call could not be completed at all.
pub const SERVER_ERROR_REPLY: &str = "Сервер қателігі. Кейінірек қайталап көріңіз.";

#[derive(Debug, Clone)]
pub struct PromptConfig {
    persona: String,
}

impl PromptConfig {
    pub fn new(persona: Option<String>) -> Self {
        let persona = persona
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PERSONA.to_string());
        Self { persona }
    }

    /// Caller-supplied system text wins; otherwise the configured persona.
    pub fn resolve<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(s) if !s.is_empty() => s,
            _ => &self.persona,
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self::new(None)
    }
}
