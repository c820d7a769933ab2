use chrono::{DateTime, Duration, Utc};
use recert_domain::{
    Campaign, CampaignId, CampaignStatus, DecisionOutcome, DecisionRequest, ItemId,
    ReviewSession,
};

use crate::CampaignHealthPolicy;
use crate::test_fixtures::{as_of, line, session};

use super::{CampaignAggregator, CampaignHealth};

fn due_at() -> DateTime<Utc> {
    as_of() + Duration::days(10)
}

fn campaign(session_ids: &[&ReviewSession], launch: bool) -> Campaign {
    let mut campaign = Campaign::new(
        CampaignId::new("C1").unwrap_or_else(|_| unreachable!()),
        "Q1 finance review",
        due_at(),
        true,
        as_of(),
    )
    .unwrap_or_else(|_| unreachable!());

    for session in session_ids {
        assert!(
            campaign
                .add_session(session.session_id().clone(), session.subject_id().clone())
                .is_ok()
        );
    }
    if launch {
        assert!(campaign.launch(as_of()).is_ok());
    }

    campaign
}

fn sessions() -> Vec<ReviewSession> {
    vec![
        session(
            "s1",
            "C1",
            "alice",
            vec![line("s1-ap", 81, true), line("s1-exp", 10, false)],
        ),
        session("s2", "C1", "bob", vec![line("s2-exp", 10, false)]),
        session("s3", "C1", "alice", vec![line("s3-pay", 92, true)]),
    ]
}

fn decide(session: &mut ReviewSession, item_id: &str) {
    let reviewer = session.reviewer_id().clone();
    let decided = session.record_decision(
        &ItemId::new(item_id).unwrap_or_else(|_| unreachable!()),
        DecisionRequest::new(DecisionOutcome::Keep),
        &reviewer,
        as_of(),
    );
    assert!(decided.is_ok());
}

#[test]
fn progress_sums_partial_sessions() {
    let mut sessions = sessions();
    let campaign = campaign(&sessions.iter().collect::<Vec<_>>(), true);
    let aggregator = CampaignAggregator::default();

    let progress = aggregator.progress(&campaign, &sessions);
    assert_eq!((progress.decided, progress.total, progress.pct), (0, 4, 0));

    decide(&mut sessions[1], "s2-exp");
    let progress = aggregator.progress(&campaign, &sessions);
    assert_eq!((progress.decided, progress.total, progress.pct), (1, 4, 25));
}

#[test]
fn health_counts_distinct_blocked_reviewers() {
    let sessions = sessions();
    let campaign = campaign(&sessions.iter().collect::<Vec<_>>(), true);
    let aggregator = CampaignAggregator::default();

    assert_eq!(
        aggregator.health(&campaign, &sessions, as_of()),
        CampaignHealth {
            blocked: 1,
            reminders: 0,
            escalations: 0,
        }
    );
}

#[test]
fn reminders_and_escalations_follow_due_date_windows() {
    let sessions = sessions();
    let campaign = campaign(&sessions.iter().collect::<Vec<_>>(), true);
    let aggregator = CampaignAggregator::new(CampaignHealthPolicy::default());

    let near_due = aggregator.health(&campaign, &sessions, due_at() - Duration::days(3));
    assert_eq!(near_due.reminders, 3);
    assert_eq!(near_due.escalations, 0);

    let within_grace = aggregator.health(&campaign, &sessions, due_at() + Duration::days(2));
    assert_eq!(within_grace.escalations, 0);

    let past_grace = aggregator.health(
        &campaign,
        &sessions,
        due_at() + Duration::days(2) + Duration::minutes(1),
    );
    assert_eq!(past_grace.escalations, 3);
    assert_eq!(
        aggregator.status(&campaign, &sessions, due_at() + Duration::days(1)),
        CampaignStatus::Overdue
    );
}

#[test]
fn submitted_campaign_is_completed_and_quiet() {
    let mut sessions = sessions();
    let campaign = campaign(&sessions.iter().collect::<Vec<_>>(), true);
    let aggregator = CampaignAggregator::default();

    decide(&mut sessions[0], "s1-ap");
    decide(&mut sessions[2], "s3-pay");
    for session in &mut sessions {
        assert!(session.submit(as_of()).is_ok());
    }

    let late = due_at() + Duration::days(30);
    let overview = aggregator.overview(&campaign, &sessions, late);
    assert_eq!(overview.status, CampaignStatus::Completed);
    assert_eq!(overview.health, CampaignHealth::default());
    assert_eq!(overview.submitted_sessions, 3);
    assert_eq!(overview.progress.decided, 3);
}

#[test]
fn draft_campaign_has_no_reminders() {
    let sessions = sessions();
    let campaign = campaign(&sessions.iter().collect::<Vec<_>>(), false);
    let aggregator = CampaignAggregator::default();
    let late = due_at() + Duration::days(30);

    assert_eq!(
        aggregator.status(&campaign, &sessions, late),
        CampaignStatus::Draft
    );
    let health = aggregator.health(&campaign, &sessions, late);
    assert_eq!((health.reminders, health.escalations), (0, 0));
}

#[test]
fn sessions_outside_the_campaign_are_ignored() {
    let mut sessions = sessions();
    let campaign = campaign(&sessions.iter().collect::<Vec<_>>(), true);
    sessions.push(session("s9", "C2", "carol", vec![line("s9-ap", 95, true)]));
    let aggregator = CampaignAggregator::default();

    assert_eq!(aggregator.progress(&campaign, &sessions).total, 4);
    let blocked = aggregator.health(&campaign, &sessions, as_of()).blocked;
    assert_eq!(blocked, 1);
}
