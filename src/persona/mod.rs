// src/persona/mod.rs
// Persona overlays for the companion's voice.
// Currently only the supportive companion is implemented.

pub mod supportive;

pub use supportive::SUPPORTIVE_PERSONA_PROMPT;

/// Persona overlays define the companion's voice and boundaries.
/// Additional overlays can be added as variants if tone switching ever
/// becomes a product feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persona {
    #[default]
    Supportive,
}

impl Persona {
    /// Returns the base system prompt for this persona.
    pub fn prompt(&self) -> &'static str {
        match self {
            Persona::Supportive => SUPPORTIVE_PERSONA_PROMPT,
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Persona::Supportive => "supportive",
            }
        )
    }
}

impl std::str::FromStr for Persona {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supportive" => Ok(Persona::Supportive),
            _ => Err(()),
        }
    }
}
