use crate::config::Config;
use crate::database::RecoveryRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::attempt::{AttemptFlow, AttemptStatus, attempt_reasons};
use crate::models::password_reset::ResetTokenPurpose;
use crate::models::security_question::SubmittedAnswer;
use crate::service::lockout::{self, LockoutStatus};
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Outcome of one recovery verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyDecision {
    /// Enough answers matched; the caller receives a single-use
    /// authorization for the reset-password step.
    Passed { reset_token: String },
    /// Not enough answers matched; `attempts_left` remain before lockout.
    Failed { attempts_left: i64 },
    /// The account is locked; answers were not evaluated.
    Locked { remaining_seconds: i64 },
}

/// Answers are compared after trimming and ASCII-lowercasing, so "  Spot "
/// matches a stored "spot".
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_ascii_lowercase()
}

/// Score submitted answers against the stored pairs. Matching is by paired
/// (question id, answer) equality, not positional, and each stored pair can
/// award at most one point, so repeating a correct pair does not inflate
/// the score.
pub fn score_answers(submitted: &[SubmittedAnswer], stored: &[(i32, &str)]) -> usize {
    stored
        .iter()
        .filter(|(question_id, answer)| {
            let normalized = normalize_answer(answer);
            submitted
                .iter()
                .any(|s| s.question_id == *question_id && normalize_answer(&s.answer) == normalized)
        })
        .count()
}

/// Run one recovery verification attempt for `email`.
///
/// Order matters: lockout is consulted before the vault, a locked account
/// never consumes an attempt, and an unknown account produces a response
/// indistinguishable from wrong answers.
pub async fn verify<R: RecoveryRepository>(repo: &R, config: &Config, email: &str, answers: &[SubmittedAnswer]) -> Result<VerifyDecision, AppError> {
    let now = Utc::now();
    let window_start = now - Duration::seconds(config.lockout.window_seconds);
    let failures = repo.recent_recovery_failures(email, window_start).await?;

    if let LockoutStatus::Locked { remaining_seconds } = lockout::evaluate(&config.lockout, &failures, now) {
        // Recorded for the audit trail, but flagged so it cannot extend
        // the window and keep the account locked forever.
        repo.record_attempt(None, email, AttemptFlow::Recovery, AttemptStatus::Failed, Some(attempt_reasons::LOCKED), false)
            .await?;
        return Ok(VerifyDecision::Locked { remaining_seconds });
    }

    let prior_failures = failures.len() as i64;

    let Some(user) = repo.get_user_by_email(email).await? else {
        tracing::info!(subject = email, "recovery verification for unknown account");
        return record_failure(repo, config, None, email, attempt_reasons::USER_NOT_FOUND, prior_failures).await;
    };

    let Some(questions) = repo.get_security_questions(&user.id).await? else {
        // Should not happen for a fully onboarded account.
        tracing::warn!(user_id = %user.id, "recovery verification without stored security questions");
        return record_failure(repo, config, Some(&user.id), email, attempt_reasons::MISSING_SECURITY_QUESTIONS, prior_failures).await;
    };

    let score = score_answers(answers, &questions.pairs());
    if score < config.lockout.answers_required {
        return record_failure(repo, config, Some(&user.id), email, attempt_reasons::INCORRECT_SECURITY_ANSWERS, prior_failures).await;
    }

    // Success restores the full allowance: the ledger's success row caps
    // every older failure out of future window scans.
    repo.record_attempt(Some(&user.id), email, AttemptFlow::Recovery, AttemptStatus::Success, None, false)
        .await?;

    let (token, token_hash) = PostgresRepository::generate_reset_token();
    let expires_at = Utc::now() + Duration::seconds(config.password_reset.authorization_ttl_seconds);
    repo.create_password_reset(&user.id, &token_hash, ResetTokenPurpose::RecoveryAuthorization, expires_at)
        .await?;

    Ok(VerifyDecision::Passed { reset_token: token })
}

/// Record a counted failure and derive the caller-facing decision. The
/// failure that exhausts the allowance reports the lockout immediately
/// rather than an `attemptsLeft: 0` response.
async fn record_failure<R: RecoveryRepository>(
    repo: &R,
    config: &Config,
    user_id: Option<&Uuid>,
    email: &str,
    reason: &str,
    prior_failures: i64,
) -> Result<VerifyDecision, AppError> {
    repo.record_attempt(user_id, email, AttemptFlow::Recovery, AttemptStatus::Failed, Some(reason), true)
        .await?;

    let failures_now = prior_failures + 1;
    if failures_now >= config.lockout.max_attempts {
        return Ok(VerifyDecision::Locked {
            remaining_seconds: config.lockout.window_seconds,
        });
    }

    Ok(VerifyDecision::Failed {
        attempts_left: config.lockout.max_attempts - failures_now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> [(i32, &'static str); 3] {
        [(1, "blue"), (4, "spot"), (7, "london")]
    }

    fn answer(question_id: i32, answer: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            answer: answer.to_string(),
        }
    }

    #[test]
    fn all_three_correct_scores_three() {
        let submitted = [answer(1, "blue"), answer(4, "spot"), answer(7, "london")];
        assert_eq!(score_answers(&submitted, &stored()), 3);
    }

    #[test]
    fn two_of_three_scores_two() {
        let submitted = [answer(1, "blue"), answer(4, "rex"), answer(7, "london")];
        assert_eq!(score_answers(&submitted, &stored()), 2);
    }

    #[test]
    fn matching_is_paired_not_positional() {
        // Correct answers submitted in a different order still score.
        let submitted = [answer(7, "london"), answer(1, "blue"), answer(4, "spot")];
        assert_eq!(score_answers(&submitted, &stored()), 3);

        // A right answer attached to the wrong question scores nothing.
        let submitted = [answer(1, "spot"), answer(4, "blue"), answer(7, "paris")];
        assert_eq!(score_answers(&submitted, &stored()), 0);
    }

    #[test]
    fn repeating_a_correct_pair_earns_one_point() {
        let submitted = [answer(1, "blue"), answer(1, "blue"), answer(1, "blue")];
        assert_eq!(score_answers(&submitted, &stored()), 1);
    }

    #[test]
    fn answers_are_normalized_before_comparison() {
        let submitted = [answer(1, "  Blue "), answer(4, "SPOT"), answer(7, "LoNdOn")];
        assert_eq!(score_answers(&submitted, &stored()), 3);
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_answer("  Fluffy Cat  "), "fluffy cat");
        assert_eq!(normalize_answer(""), "");
    }

    mod orchestration {
        use super::*;
        use crate::models::attempt::{AttemptFlow, AttemptStatus, attempt_reasons};
        use crate::models::password_reset::ResetTokenPurpose;
        use crate::test_utils::{MockRecoveryRepository, test_questions, test_user};
        use chrono::{Duration, Utc};

        const EMAIL: &str = "jane@example.com";

        fn config() -> Config {
            Config::default()
        }

        fn repo_with_account() -> MockRecoveryRepository {
            let user = test_user(EMAIL);
            let questions = test_questions(user.id);
            MockRecoveryRepository {
                user: Some(user),
                questions: Some(questions),
                ..MockRecoveryRepository::default()
            }
        }

        fn recent_failures(count: usize) -> Vec<chrono::DateTime<Utc>> {
            let now = Utc::now();
            (0..count).map(|i| now - Duration::seconds(10 * (i as i64 + 1))).collect()
        }

        #[tokio::test]
        async fn locked_account_is_rejected_without_touching_the_vault() {
            let repo = MockRecoveryRepository {
                failures: recent_failures(3),
                ..repo_with_account()
            };

            let decision = verify(&repo, &config(), EMAIL, &[answer(1, "blue"), answer(4, "spot")]).await.expect("verify runs");

            assert!(matches!(decision, VerifyDecision::Locked { remaining_seconds } if (1..=180).contains(&remaining_seconds)));
            // The answers were never evaluated.
            assert_eq!(repo.vault_reads(), 0);

            // The rejection is ledgered but must not extend the window.
            let recorded = repo.recorded();
            assert_eq!(recorded.len(), 1);
            assert_eq!(recorded[0].status, AttemptStatus::Failed);
            assert_eq!(recorded[0].reason.as_deref(), Some(attempt_reasons::LOCKED));
            assert!(!recorded[0].counts_against_lockout);
        }

        #[tokio::test]
        async fn unknown_email_is_indistinguishable_from_wrong_answers() {
            let unknown = MockRecoveryRepository::default();
            let known = repo_with_account();

            let unknown_decision = verify(&unknown, &config(), EMAIL, &[answer(1, "blue")]).await.expect("verify runs");
            let known_decision = verify(&known, &config(), EMAIL, &[answer(1, "wrong")]).await.expect("verify runs");

            // Same decision shape, same counted attempt.
            assert_eq!(unknown_decision, VerifyDecision::Failed { attempts_left: 2 });
            assert_eq!(known_decision, VerifyDecision::Failed { attempts_left: 2 });

            let recorded = unknown.recorded();
            assert_eq!(recorded.len(), 1);
            assert_eq!(recorded[0].reason.as_deref(), Some(attempt_reasons::USER_NOT_FOUND));
            assert!(recorded[0].counts_against_lockout);
        }

        #[tokio::test]
        async fn failure_that_exhausts_the_allowance_reports_locked() {
            let repo = MockRecoveryRepository {
                failures: recent_failures(2),
                ..repo_with_account()
            };

            let decision = verify(&repo, &config(), EMAIL, &[answer(1, "wrong"), answer(4, "wrong"), answer(7, "wrong")])
                .await
                .expect("verify runs");

            assert_eq!(decision, VerifyDecision::Locked { remaining_seconds: 180 });

            let recorded = repo.recorded();
            assert_eq!(recorded.len(), 1);
            assert_eq!(recorded[0].reason.as_deref(), Some(attempt_reasons::INCORRECT_SECURITY_ANSWERS));
            assert!(recorded[0].counts_against_lockout);
        }

        #[tokio::test]
        async fn one_correct_answer_is_not_enough() {
            let repo = repo_with_account();

            let decision = verify(&repo, &config(), EMAIL, &[answer(1, "blue"), answer(4, "wrong"), answer(7, "wrong")])
                .await
                .expect("verify runs");

            assert_eq!(decision, VerifyDecision::Failed { attempts_left: 2 });
        }

        #[tokio::test]
        async fn passing_verification_issues_a_single_use_authorization() {
            let repo = repo_with_account();
            let user_id = repo.user.as_ref().expect("account set up").id;

            let decision = verify(&repo, &config(), EMAIL, &[answer(1, "  Blue "), answer(4, "SPOT"), answer(7, "wrong")])
                .await
                .expect("verify runs");

            let VerifyDecision::Passed { reset_token } = decision else {
                panic!("expected a pass, got {decision:?}");
            };
            assert_eq!(reset_token.len(), 32);

            // Stored hashed, bound to the account, recovery-authorization purpose.
            let created = repo.created_resets();
            assert_eq!(created.len(), 1);
            assert_eq!(created[0].user_id, user_id);
            assert_eq!(created[0].purpose, ResetTokenPurpose::RecoveryAuthorization);
            assert_eq!(created[0].token_hash, PostgresRepository::hash_reset_token(&reset_token));

            // The success row never counts against the window.
            let recorded = repo.recorded();
            assert_eq!(recorded.len(), 1);
            assert_eq!(recorded[0].flow, AttemptFlow::Recovery);
            assert_eq!(recorded[0].status, AttemptStatus::Success);
            assert!(!recorded[0].counts_against_lockout);
        }

        #[tokio::test]
        async fn account_without_vault_consumes_a_counted_attempt() {
            let repo = MockRecoveryRepository {
                questions: None,
                ..repo_with_account()
            };

            let decision = verify(&repo, &config(), EMAIL, &[answer(1, "blue")]).await.expect("verify runs");

            assert_eq!(decision, VerifyDecision::Failed { attempts_left: 2 });
            let recorded = repo.recorded();
            assert_eq!(recorded[0].reason.as_deref(), Some(attempt_reasons::MISSING_SECURITY_QUESTIONS));
            assert!(recorded[0].counts_against_lockout);
        }
    }
}
