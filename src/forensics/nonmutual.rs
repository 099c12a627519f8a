use super::resolve_profiles;
use crate::model::{Identifier, Profile};
use crate::report::Reporter;
use crate::twitter::TwitterClient;
use anyhow::Context;
use std::collections::HashSet;

/// Accounts `account_id` follows that don't follow back. Read only, nothing is saved.
pub async fn find_non_mutuals(
    client: &dyn TwitterClient,
    account_id: Identifier,
    reporter: &dyn Reporter,
) -> anyhow::Result<Vec<Profile>> {
    let following = client
        .list_following_ids(account_id)
        .await
        .context("Unable to fetch followed accounts")?;
    let followers = client
        .list_follower_ids(account_id)
        .await
        .context("Unable to fetch followers")?;
    let ids = not_following_back(&following, &followers);
    log::info!(
        "{} of {} followed accounts don't follow back",
        ids.len(),
        following.len()
    );

    let profiles = if ids.is_empty() {
        Vec::new()
    } else {
        let mut resolved = resolve_profiles(client, &ids)
            .await
            .context("Unable to look up accounts")?;
        ids.iter()
            .filter_map(|id| resolved.remove(id))
            .collect()
    };
    reporter.non_mutuals(&profiles);
    Ok(profiles)
}

/// `following` minus `followers`, in the order `following` was returned
fn not_following_back(following: &[Identifier], followers: &[Identifier]) -> Vec<Identifier> {
    let followers: HashSet<_> = followers.iter().copied().collect();
    let mut seen = HashSet::new();
    following
        .iter()
        .copied()
        .filter(|id| !followers.contains(id) && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{profile, RecordingReporter, Reported, ScriptedClient};

    #[test]
    fn difference_is_one_sided() {
        assert_eq!(not_following_back(&[5, 1, 3, 4], &[3, 9, 1]), vec![5, 4]);
        assert_eq!(not_following_back(&[1, 2], &[1, 2, 3]), Vec::<Identifier>::new());
        assert_eq!(not_following_back(&[7, 7, 8], &[]), vec![7, 8]);
    }

    #[tokio::test]
    async fn reports_resolved_non_mutuals() {
        let client = ScriptedClient::default();
        client.set_following(vec![10, 11, 12]);
        client.push_followers(vec![11, 20]);
        client.known_user(profile(10));
        let reporter = RecordingReporter::default();

        let profiles = find_non_mutuals(&client, 1, &reporter).await.unwrap();
        // 12 can't be resolved and shows as the unknown user
        assert_eq!(profiles, vec![profile(10), Profile::unknown()]);
        assert_eq!(client.lookups(), vec![vec![10, 12]]);
        match reporter.single() {
            Reported::NonMutuals(reported) => assert_eq!(reported, profiles),
            other => panic!("Unexpected report: {:?}", other),
        }
    }

    #[tokio::test]
    async fn everyone_mutual_skips_lookup() {
        let client = ScriptedClient::default();
        client.set_following(vec![1, 2]);
        client.push_followers(vec![2, 1]);
        let reporter = RecordingReporter::default();

        let profiles = find_non_mutuals(&client, 1, &reporter).await.unwrap();
        assert!(profiles.is_empty());
        assert!(client.lookups().is_empty());
    }

    #[tokio::test]
    async fn follower_fetch_failure_is_fatal() {
        let client = ScriptedClient::default();
        client.set_following(vec![1, 2]);
        client.push_rate_limit();
        let reporter = RecordingReporter::default();

        assert!(find_non_mutuals(&client, 1, &reporter).await.is_err());
        assert!(reporter.events().is_empty());
    }
}
