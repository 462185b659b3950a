use serde::{Deserialize, Serialize};

/// Classification of a [`crate::ContextData`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextType {
    Quote,
    PersonaVoiceSample,
    Memory,
    Insight,
    CharacterProfile,
    Generic,
}

impl ContextType {
    /// Lower-cased type name, used as a fallback message header when an item
    /// has no `name` of its own.
    pub fn type_name_lower(self) -> &'static str {
        match self {
            ContextType::Quote => "quote",
            ContextType::PersonaVoiceSample => "persona voice sample",
            ContextType::Memory => "memory",
            ContextType::Insight => "insight",
            ContextType::CharacterProfile => "character profile",
            ContextType::Generic => "generic",
        }
    }
}

/// The activation rule that controls whether a context item is loaded on a
/// given turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    AlwaysOn,
    Manual,
    Semantic,
    Trigger,
    Archive,
}

/// The validity matrix: which (type, availability) pairs are permitted. An
/// implementation may reject writes that violate this.
pub fn is_valid_combination(ty: ContextType, availability: Availability) -> bool {
    use Availability::*;
    use ContextType::*;
    match (ty, availability) {
        (Quote, AlwaysOn | Manual | Semantic | Archive) => true,
        (Quote, Trigger) => false,

        (PersonaVoiceSample, AlwaysOn | Semantic | Archive) => true,
        (PersonaVoiceSample, Manual | Trigger) => false,

        (Memory, AlwaysOn | Manual | Semantic | Trigger | Archive) => true,

        (Insight, AlwaysOn | Manual | Semantic | Trigger | Archive) => true,

        (CharacterProfile, AlwaysOn | Manual | Trigger | Archive) => true,
        (CharacterProfile, Semantic) => false,

        (Generic, AlwaysOn | Manual | Trigger | Archive) => true,
        (Generic, Semantic) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_matrix_permits_documented_combinations() {
        assert!(is_valid_combination(ContextType::Quote, Availability::AlwaysOn));
        assert!(!is_valid_combination(ContextType::Quote, Availability::Trigger));
        assert!(is_valid_combination(
            ContextType::PersonaVoiceSample,
            Availability::Semantic
        ));
        assert!(!is_valid_combination(
            ContextType::PersonaVoiceSample,
            Availability::Manual
        ));
        assert!(is_valid_combination(ContextType::Memory, Availability::Trigger));
        assert!(is_valid_combination(
            ContextType::CharacterProfile,
            Availability::Trigger
        ));
        assert!(!is_valid_combination(
            ContextType::CharacterProfile,
            Availability::Semantic
        ));
        assert!(!is_valid_combination(ContextType::Generic, Availability::Semantic));
    }
}
