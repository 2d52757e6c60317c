use agentcrew::prompt_selector::{PromptSelector, PromptVariant};
use agentcrew::session::{Session, DEFAULT_MEMORY_WINDOW};

fn session_with_turns(n: usize) -> Session {
    let mut session = Session::new(DEFAULT_MEMORY_WINDOW).unwrap();
    for i in 0..n {
        session.append_turn(format!("pergunta {}", i), format!("resposta {}", i));
    }
    session
}

fn questions<'a>(turns: impl Iterator<Item = &'a agentcrew::Turn>) -> Vec<String> {
    turns.map(|t| t.question.clone()).collect()
}

#[test]
fn window_returns_most_recent_turns_oldest_first() {
    let session = session_with_turns(6);

    assert_eq!(
        questions(session.windowed_history(3)),
        vec!["pergunta 3", "pergunta 4", "pergunta 5"]
    );
    assert_eq!(session.windowed_history(3).count(), 3);
    assert_eq!(session.windowed_history(100).count(), 6);
    assert_eq!(session.memory().count(), DEFAULT_MEMORY_WINDOW);
}

#[test]
fn reading_the_window_is_restartable() {
    let session = session_with_turns(4);

    let first: Vec<_> = session.windowed_history(2).cloned().collect();
    let second: Vec<_> = session.windowed_history(2).cloned().collect();
    assert_eq!(first, second);

    let window = session.windowed_history(2);
    let replay = window.clone();
    assert_eq!(questions(window), questions(replay));
    assert_eq!(session.len(), 4);
}

#[test]
fn appended_turn_round_trips_verbatim() {
    let mut session = session_with_turns(2);
    let question = "Qual é o impacto do El Niño no clima?\n  (com espaços)  ";
    let answer = "Depende da região 🌧️";
    session.append_turn(question, answer);

    let last = session.windowed_history(1).next().unwrap();
    assert_eq!(last.question, question);
    assert_eq!(last.answer, answer);
}

#[test]
fn history_only_grows() {
    let mut session = Session::new(1).unwrap();
    for i in 0..60 {
        session.append_turn(i.to_string(), i.to_string());
    }
    assert_eq!(session.len(), 60);
    assert_eq!(session.turns()[0].question, "0");
    assert_eq!(questions(session.memory()), vec!["59"]);
}

#[test]
fn sessions_have_distinct_ids() {
    assert_ne!(Session::default().id(), Session::default().id());
}

#[test]
fn selector_alternates_prompts() {
    let selector = PromptSelector::new("Como posso ajudar?", "Algo mais?");
    let mut session = Session::default();

    assert_eq!(session.get_last_prompt_variant(), None);
    assert_eq!(selector.select(&mut session), "Como posso ajudar?");
    assert_eq!(selector.select(&mut session), "Algo mais?");
    assert_eq!(selector.select(&mut session), "Como posso ajudar?");
}

#[test]
fn selector_never_repeats_a_variant() {
    let selector = PromptSelector::new("primary", "secondary");
    let mut session = Session::default();
    let mut previous: Option<PromptVariant> = None;

    for _ in 0..25 {
        selector.select(&mut session);
        let current = session.get_last_prompt_variant();
        assert!(current.is_some());
        assert_ne!(current, previous);
        previous = current;
    }
}

#[test]
fn selector_honours_a_restored_variant() {
    let selector = PromptSelector::new("primary", "secondary");
    let mut session = Session::default();
    session.set_last_prompt_variant(PromptVariant::Secondary);
    assert_eq!(selector.select(&mut session), "primary");
}
