//! Integration Tests: Escalation Flow
//!
//! Drives a full session through the public handle.
//!
//! Coverage:
//! - Three warnings escalate to a ladder mute and reset the warning count
//! - An escalated warn honours the classifier's suggested duration
//! - Repeat mutes climb the ladder and stop at the top level
//! - Expired mutes are lifted with a system entry
//! - Muted users are blocked without touching the log
//! - Verdicts apply to the sender even if the active user changes meanwhile
//! - Events and stats reflect committed state

mod common;

use chat_moderation_service::models::{MUTE_EXPIRED_REASON, SYSTEM_UNMUTE_CONTENT};
use chat_moderation_service::services::{RawVerdict, TimeSource};
use chat_moderation_service::{
    ModerationAction, ModerationError, SessionEvent, Verdict, ViolationType,
};
use chrono::Duration as ChronoDuration;
use common::{spawn_session, test_clock, GatedClassifier, ScriptedClassifier};
use std::sync::Arc;

fn insult() -> Verdict {
    Verdict::warn(ViolationType::Toxicity, 4, "Insult")
}

#[tokio::test]
async fn test_three_warnings_then_escalated_mute() {
    let clock = test_clock();
    let backend = Arc::new(ScriptedClassifier::new(vec![insult(), insult(), insult(), insult()]));
    let session = spawn_session(backend, clock.clone());

    for expected in 1..=3 {
        let outcome = session.submit_message("user-1", "you idiot").await.unwrap();
        assert_eq!(outcome.final_action, ModerationAction::Warn);
        assert_eq!(outcome.standing.warning_count, expected);
    }

    let outcome = session.submit_message("user-1", "you idiot").await.unwrap();
    assert_eq!(outcome.final_action, ModerationAction::Mute);
    assert!(outcome.was_escalated());

    let standing = outcome.standing;
    assert!(standing.muted);
    assert_eq!(standing.warning_count, 0);
    assert_eq!(standing.mute_count, 1);
    assert_eq!(standing.muted_until, Some(clock.now() + ChronoDuration::minutes(5)));

    let log = session.audit_log().await.unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].final_action, ModerationAction::Mute);
    assert_eq!(log[0].mute_duration_minutes, Some(5));
    assert_eq!(log[0].reason, "Insult");
    assert!(log[1..].iter().all(|e| e.final_action == ModerationAction::Warn));
}

#[tokio::test]
async fn test_repeat_mutes_climb_ladder() {
    let clock = test_clock();
    let severe = || Verdict::mute(ViolationType::HateSpeech, 9, "Slur", None);
    let backend = Arc::new(ScriptedClassifier::new(vec![severe(), severe(), severe(), severe()]));
    let session = spawn_session(backend, clock.clone());

    let mut durations = Vec::new();
    for _ in 0..4 {
        let outcome = session.submit_message("user-2", "slur").await.unwrap();
        durations.push(outcome.audit_entry.unwrap().mute_duration_minutes.unwrap());

        clock.advance(ChronoDuration::days(2));
        assert_eq!(session.expire_mutes().await.unwrap().len(), 1);
    }

    assert_eq!(durations, vec![5, 30, 1440, 1440]);
    assert_eq!(session.standing("user-2").await.unwrap().mute_count, 4);
}

#[tokio::test]
async fn test_suggested_duration_overrides_ladder() {
    let clock = test_clock();
    let backend = Arc::new(ScriptedClassifier::new(vec![Verdict::mute(
        ViolationType::Spam,
        6,
        "Flood",
        Some(60),
    )]));
    let session = spawn_session(backend, clock.clone());

    let outcome = session.submit_message("user-3", "promo promo").await.unwrap();
    assert_eq!(outcome.audit_entry.unwrap().mute_duration_minutes, Some(60));
    assert_eq!(
        outcome.standing.muted_until,
        Some(clock.now() + ChronoDuration::minutes(60))
    );
}

#[tokio::test]
async fn test_escalated_warn_uses_classifier_suggestion() {
    let clock = test_clock();
    let payload = r#"{"action":"WARN","violationType":"TOXICITY","severity":5,
        "reason":"Insult","suggestedMuteDurationMinutes":60}"#;
    let verdicts = (0..3)
        .map(|_| RawVerdict::parse(payload).unwrap())
        .collect::<Vec<_>>();
    let session = spawn_session(Arc::new(ScriptedClassifier::new(verdicts)), clock.clone());

    session.submit_message("user-1", "idiot").await.unwrap();
    session.submit_message("user-1", "idiot").await.unwrap();
    let outcome = session.submit_message("user-1", "idiot").await.unwrap();

    assert!(outcome.was_escalated());
    assert_eq!(outcome.audit_entry.unwrap().mute_duration_minutes, Some(60));
    assert_eq!(
        outcome.standing.muted_until,
        Some(clock.now() + ChronoDuration::minutes(60))
    );
}

#[tokio::test]
async fn test_expiry_lifts_mute_with_system_entry() {
    let clock = test_clock();
    let backend = Arc::new(ScriptedClassifier::new(vec![Verdict::mute(
        ViolationType::Harassment,
        8,
        "Threat",
        None,
    )]));
    let session = spawn_session(backend, clock.clone());

    session.submit_message("user-1", "threat").await.unwrap();

    clock.advance(ChronoDuration::minutes(4));
    assert!(session.expire_mutes().await.unwrap().is_empty());
    assert!(session.standing("user-1").await.unwrap().muted);

    clock.advance(ChronoDuration::minutes(1));
    let lifted = session.expire_mutes().await.unwrap();
    assert_eq!(lifted.len(), 1);
    assert_eq!(lifted[0].final_action, ModerationAction::Nothing);
    assert_eq!(lifted[0].reason, MUTE_EXPIRED_REASON);
    assert_eq!(lifted[0].original_content, SYSTEM_UNMUTE_CONTENT);

    let log = session.audit_log().await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].reason, MUTE_EXPIRED_REASON);
    assert_eq!(log[0].final_action, ModerationAction::Nothing);
    assert!(log[0].is_system_unmute());

    let standing = session.standing("user-1").await.unwrap();
    assert!(!standing.muted);
    assert_eq!(standing.muted_until, None);
    assert_eq!(standing.mute_count, 1);

    // Posting works again once lifted
    let outcome = session.submit_message("user-1", "sorry").await.unwrap();
    assert_eq!(outcome.final_action, ModerationAction::Nothing);
}

#[tokio::test]
async fn test_blocked_send_leaves_no_trace() {
    let clock = test_clock();
    let backend = Arc::new(ScriptedClassifier::new(vec![Verdict::mute(
        ViolationType::Nsfw,
        7,
        "Explicit",
        None,
    )]));
    let session = spawn_session(backend.clone(), clock);

    session.submit_message("user-2", "nsfw").await.unwrap();
    let before = session.standing("user-2").await.unwrap();

    let err = session.submit_message("user-2", "again").await.unwrap_err();
    assert!(matches!(err, ModerationError::BlockedSend { .. }));
    assert!(err.user_message().starts_with("You are muted until"));

    assert_eq!(session.standing("user-2").await.unwrap(), before);
    assert_eq!(session.audit_log().await.unwrap().len(), 1);
    assert_eq!(session.messages().await.unwrap().len(), 1);
    assert_eq!(backend.seen(), vec!["nsfw".to_string()]);
}

#[tokio::test]
async fn test_verdict_applies_to_original_sender_after_switch() {
    let clock = test_clock();
    let backend = Arc::new(GatedClassifier::new(insult()));
    let session = spawn_session(backend.clone(), clock);

    let submitter = session.clone();
    let pending = tokio::spawn(async move { submitter.submit_as_active("you idiot").await });

    backend.entered.notified().await;
    let switched = session.switch_active_user().await.unwrap();
    assert_eq!(switched.user_id, "user-2");
    backend.release.notify_one();

    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome.standing.user_id, "user-1");
    assert_eq!(session.standing("user-1").await.unwrap().warning_count, 1);
    assert_eq!(session.standing("user-2").await.unwrap().warning_count, 0);
}

#[tokio::test]
async fn test_sweep_runs_while_classifier_is_busy() {
    let clock = test_clock();
    let backend = Arc::new(GatedClassifier::new(Verdict::clean()));
    let session = spawn_session(backend.clone(), clock);

    let submitter = session.clone();
    let pending = tokio::spawn(async move { submitter.submit_message("user-3", "hello").await });

    backend.entered.notified().await;
    assert!(session.expire_mutes().await.unwrap().is_empty());
    assert_eq!(session.stats().await.unwrap().active_mutes, 0);
    backend.release.notify_one();

    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome.final_action, ModerationAction::Nothing);
}

#[tokio::test]
async fn test_events_and_stats() {
    let clock = test_clock();
    let backend = Arc::new(ScriptedClassifier::new(vec![
        insult(),
        Verdict::mute(ViolationType::Spam, 6, "Flood", None),
    ]));
    let session = spawn_session(backend, clock);
    let mut events = session.subscribe();

    session.submit_message("user-1", "you idiot").await.unwrap();
    session.submit_message("user-2", "promo").await.unwrap();
    session.submit_message("user-3", "hi all").await.unwrap();

    let mut audit_events = 0;
    let mut moderated = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::AuditAppended(_) => audit_events += 1,
            SessionEvent::MessageModerated(message) => {
                assert!(message.is_flagged());
                moderated += 1;
            }
            _ => {}
        }
    }
    assert_eq!(audit_events, 2);
    assert_eq!(moderated, 2);

    let stats = session.stats().await.unwrap();
    assert_eq!(stats.total_warnings, 1);
    assert_eq!(stats.total_mutes, 1);
    assert_eq!(stats.active_mutes, 1);

    let messages = session.messages().await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages.iter().filter(|m| m.is_flagged()).count(), 2);

    let alex = session.audit_log_for("user-1").await.unwrap();
    assert_eq!(alex.len(), 1);
    assert_eq!(alex[0].username, "AlexPro");
}
