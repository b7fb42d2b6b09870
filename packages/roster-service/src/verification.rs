use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinSet};

use roster_domain::models::MemberProfile;

use crate::{Error, Result, RosterService};

impl RosterService {
	/// Sets `verified` on every member, asking the verification service once per member with at
	/// most `search.verification_concurrency` requests in flight. Output order matches input.
	///
	/// A failed lookup fails the whole call. Members are never marked verified without a `true`
	/// answer.
	pub async fn annotate_verified(
		&self,
		mut members: Vec<MemberProfile>,
	) -> Result<Vec<MemberProfile>> {
		let permits = Arc::new(Semaphore::new(self.cfg.search.verification_concurrency as usize));
		let mut tasks = JoinSet::new();

		for (idx, member) in members.iter_mut().enumerate() {
			member.verified = Some(false);

			let Some(user_id) = member.user_id else {
				continue;
			};
			let provider = self.backends.verification.clone();
			let permits = permits.clone();

			tasks.spawn(async move {
				let _permit = permits.acquire_owned().await.map_err(|err| {
					Error::BackendUnavailable { message: format!("Verification pool closed: {err}") }
				})?;
				let verified = provider.is_verified(user_id).await;

				Ok::<_, Error>((idx, user_id, verified))
			});
		}

		while let Some(joined) = tasks.join_next().await {
			let (idx, user_id, verified) = joined??;

			match verified {
				Ok(verified) => members[idx].verified = Some(verified),
				Err(err) => {
					tracing::warn!(user_id, error = %err, "Verification lookup failed.");

					return Err(err);
				},
			}
		}

		Ok(members)
	}
}
