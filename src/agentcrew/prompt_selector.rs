//! Alternation between the primary and secondary chat prompts.
//!
//! The first question of a conversation is greeted with the primary prompt; after that the
//! two variants strictly alternate. The choice is remembered on the [`Session`].

use crate::session::Session;

/// The two configured system prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptVariant {
    Primary,
    Secondary,
}

impl PromptVariant {
    /// The variant that follows `last`. `None` (no question asked yet) yields the primary.
    pub fn next_after(last: Option<PromptVariant>) -> PromptVariant {
        match last {
            Some(PromptVariant::Primary) => PromptVariant::Secondary,
            _ => PromptVariant::Primary,
        }
    }
}

/// Holds the two prompt strings and picks one per question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSelector {
    primary: String,
    secondary: String,
}

impl PromptSelector {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> &str {
        &self.secondary
    }

    pub fn text(&self, variant: PromptVariant) -> &str {
        match variant {
            PromptVariant::Primary => &self.primary,
            PromptVariant::Secondary => &self.secondary,
        }
    }

    /// Pick the next prompt for `session` and record the choice on it.
    pub fn select(&self, session: &mut Session) -> &str {
        let variant = PromptVariant::next_after(session.get_last_prompt_variant());
        session.set_last_prompt_variant(variant);
        log::debug!("PromptSelector::select(): {:?}", variant);
        self.text(variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_rule() {
        assert_eq!(PromptVariant::next_after(None), PromptVariant::Primary);
        assert_eq!(
            PromptVariant::next_after(Some(PromptVariant::Primary)),
            PromptVariant::Secondary
        );
        assert_eq!(
            PromptVariant::next_after(Some(PromptVariant::Secondary)),
            PromptVariant::Primary
        );
    }

    #[test]
    fn identical_strings_still_alternate_variants() {
        let selector = PromptSelector::new("same", "same");
        let mut session = Session::default();
        selector.select(&mut session);
        selector.select(&mut session);
        assert_eq!(
            session.get_last_prompt_variant(),
            Some(PromptVariant::Secondary)
        );
    }
}
