// Which interaction the window is in. One state at a time; every change goes
// through `transition`, which has no side effects of its own.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiState {
    Idle,
    Drawing,
    AwaitingCredential,
    Submitting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEvent {
    PointerDown,
    /// Button released or pointer left the canvas.
    PointerUp,
    Submit { has_credential: bool },
    OpenSettings,
    CredentialSaved,
    DismissSettings { has_credential: bool },
    GenerationResolved,
}

/// What the caller has to do after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    BeginStroke,
    EndStroke,
    Dispatch,
    PromptCredential,
}

pub fn initial_state(has_credential: bool) -> UiState {
    if has_credential { UiState::Idle } else { UiState::AwaitingCredential }
}

pub fn transition(state: UiState, event: UiEvent) -> (UiState, Effect) {
    use UiEvent::*;
    use UiState::*;

    match (state, event) {
        (Idle, PointerDown) => (Drawing, Effect::BeginStroke),
        (Drawing, PointerUp) => (Idle, Effect::EndStroke),

        (Idle, Submit { has_credential: true }) => (Submitting, Effect::Dispatch),
        (Idle, Submit { has_credential: false }) => (AwaitingCredential, Effect::PromptCredential),
        (Idle, OpenSettings) => (AwaitingCredential, Effect::PromptCredential),

        (AwaitingCredential, CredentialSaved) => (Idle, Effect::None),
        (AwaitingCredential, DismissSettings { has_credential: true }) => (Idle, Effect::None),

        (Submitting, GenerationResolved) => (Idle, Effect::None),

        // Everything else (re-entrant submit, drawing under the modal, ...) is ignored.
        (state, _) => (state, Effect::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use UiEvent::*;
    use UiState::*;

    #[test]
    fn starts_in_credential_prompt_without_a_key() {
        assert_eq!(initial_state(false), AwaitingCredential);
        assert_eq!(initial_state(true), Idle);
    }

    #[test]
    fn drawing_round_trip() {
        assert_eq!(transition(Idle, PointerDown), (Drawing, Effect::BeginStroke));
        assert_eq!(transition(Drawing, PointerUp), (Idle, Effect::EndStroke));
    }

    #[test]
    fn submit_depends_on_credential() {
        assert_eq!(transition(Idle, Submit { has_credential: true }), (Submitting, Effect::Dispatch));
        assert_eq!(
            transition(Idle, Submit { has_credential: false }),
            (AwaitingCredential, Effect::PromptCredential)
        );
    }

    #[test]
    fn submitting_ignores_everything_but_resolution() {
        for event in [
            PointerDown,
            PointerUp,
            Submit { has_credential: true },
            OpenSettings,
            CredentialSaved,
        ] {
            assert_eq!(transition(Submitting, event), (Submitting, Effect::None), "{event:?}");
        }
        assert_eq!(transition(Submitting, GenerationResolved), (Idle, Effect::None));
    }

    #[test]
    fn modal_blocks_drawing_and_submission() {
        assert_eq!(transition(AwaitingCredential, PointerDown), (AwaitingCredential, Effect::None));
        assert_eq!(
            transition(AwaitingCredential, Submit { has_credential: true }),
            (AwaitingCredential, Effect::None)
        );
        assert_eq!(transition(AwaitingCredential, CredentialSaved), (Idle, Effect::None));
    }

    #[test]
    fn modal_can_only_be_dismissed_with_a_key_on_hand() {
        assert_eq!(
            transition(AwaitingCredential, DismissSettings { has_credential: false }),
            (AwaitingCredential, Effect::None)
        );
        assert_eq!(
            transition(AwaitingCredential, DismissSettings { has_credential: true }),
            (Idle, Effect::None)
        );
    }

    #[test]
    fn settings_open_from_idle_only() {
        assert_eq!(transition(Idle, OpenSettings), (AwaitingCredential, Effect::PromptCredential));
        assert_eq!(transition(Drawing, OpenSettings), (Drawing, Effect::None));
    }
}
