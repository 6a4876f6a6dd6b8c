#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroqModel {
    #[default]
    Llama3_8b,          // "llama3-8b-8192"
    Llama3_70b,         // "llama3-70b-8192"
    Llama31_8bInstant,  // "llama-3.1-8b-instant"
    Llama33_70bVersatile, // "llama-3.3-70b-versatile"
    Override(String),
}

impl GroqModel {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Llama3_8b => "llama3-8b-8192",
            Self::Llama3_70b => "llama3-70b-8192",
            Self::Llama31_8bInstant => "llama-3.1-8b-instant",
            Self::Llama33_70bVersatile => "llama-3.3-70b-versatile",
            Self::Override(s) => s.as_str(),
        }
    }

    /// Map a model id back to a known variant, or keep it verbatim.
    pub fn from_id(id: &str) -> Self {
        match id {
            "llama3-8b-8192" => Self::Llama3_8b,
            "llama3-70b-8192" => Self::Llama3_70b,
            "llama-3.1-8b-instant" => Self::Llama31_8bInstant,
            "llama-3.3-70b-versatile" => Self::Llama33_70bVersatile,
            other => Self::Override(other.to_string()),
        }
    }
}
