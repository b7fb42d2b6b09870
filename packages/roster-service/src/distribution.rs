use serde::Deserialize;

use roster_domain::{
	fields::{self, DistributionField, FieldSet},
	models::{self, DistributionRecord, DistributionSummary},
};
use roster_storage::documents::ScanCriterion;

use crate::{Error, Result, RosterService, search};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
	pub track: Option<String>,
	pub sub_track: Option<String>,
	pub fields: Option<String>,
}

impl RosterService {
	/// Sums rating distributions across every record whose track and sub-track contain the
	/// filters, ignoring case.
	pub async fn get_distribution(&self, req: DistributionRequest) -> Result<DistributionSummary> {
		let track = search::non_blank(req.track.as_deref());
		let sub_track = search::non_blank(req.sub_track.as_deref());
		let mut criteria = Vec::new();

		if let Some(track) = &track {
			criteria.push(ScanCriterion { field: "track".to_string(), contains: track.clone() });
		}
		if let Some(sub_track) = &sub_track {
			criteria.push(ScanCriterion {
				field: "subTrack".to_string(),
				contains: sub_track.clone(),
			});
		}

		let docs = self.backends.store.scan(&self.tables().distribution, &criteria).await?;

		if docs.is_empty() {
			return Err(Error::NotFound {
				message: "No distribution matches the given track and sub-track.".to_string(),
			});
		}

		let mut summary = DistributionSummary::new(track, sub_track);

		for doc in docs {
			let record: DistributionRecord = models::decode("distribution", doc)?;

			summary.accumulate(&record)?;
		}

		let fields = FieldSet::<DistributionField>::parse_requested(req.fields.as_deref());

		Ok(fields::project(summary, &fields))
	}
}
