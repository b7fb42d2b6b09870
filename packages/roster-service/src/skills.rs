use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use roster_domain::{
	fields::{self, FieldSet, SkillsField},
	identity::Caller,
	models::{self, MemberProfile, MemberSkills, MemberSkillsRecord},
	skills,
};

use crate::{Error, Lookup, Result, RosterService, member};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSkillsRequest {
	pub fields: Option<String>,
}

impl RosterService {
	pub async fn get_member_skills(
		&self,
		caller: Option<&Caller>,
		handle: &str,
		req: MemberSkillsRequest,
	) -> Result<MemberSkills> {
		let member = self.member_by_handle(handle).await?;

		self.member_skills_view(caller, &member, req.fields.as_deref()).await
	}

	/// Patches the member's entered skills tag by tag and returns the merged view. Concurrent
	/// patches for one member race; the later write wins.
	pub async fn update_member_skills_partial(
		&self,
		caller: Option<&Caller>,
		handle: &str,
		body: Value,
	) -> Result<MemberSkills> {
		let Some(actor) = caller else {
			return Err(Error::Unauthorized {
				message: "Updating skills requires an authenticated caller.".to_string(),
			});
		};
		let member = self.member_by_handle(handle).await?;
		let handle_lower = member.lower_handle();

		if !self.visibility.roles().can_manage_member(
			caller,
			member.user_id,
			handle_lower.as_deref(),
		) {
			return Err(Error::Forbidden {
				message: "Caller may not update this member's skills.".to_string(),
			});
		}

		let patch = skills::parse_patch(&body)?;
		let user_id = member::member_user_id(&member)?;
		let user_key = user_id.to_string();
		let table = &self.tables().entered_skills;
		let now = OffsetDateTime::now_utc();
		let audit_name = actor.audit_name();
		let mut record = match self.backends.store.get_by_key(table, &user_key).await {
			Lookup::Found(doc) => models::decode::<MemberSkillsRecord>("entered skills", doc)?,
			Lookup::NotFound => MemberSkillsRecord {
				user_id: Some(user_id),
				user_handle: member.handle.clone(),
				handle_lower: handle_lower.clone(),
				created_at: Some(now),
				created_by: Some(audit_name.clone()),
				..Default::default()
			},
			Lookup::Failure(err) => return Err(err),
		};
		let mut current = record.skill_map()?;

		skills::apply_patch(&mut current, &patch);

		record.skills = Some(encode("skills", &current)?);
		record.updated_at = Some(now);
		record.updated_by = Some(audit_name);

		self.backends.store.update(table, &user_key, None, encode("entered skills", &record)?).await?;

		self.member_skills_view(caller, &member, None).await
	}

	async fn member_skills_view(
		&self,
		caller: Option<&Caller>,
		member: &MemberProfile,
		requested: Option<&str>,
	) -> Result<MemberSkills> {
		let user_id = member::member_user_id(member)?;
		let user_key = user_id.to_string();
		let tables = self.tables();
		let (entered, aggregated) = tokio::join!(
			self.backends.store.get_by_key(&tables.entered_skills, &user_key),
			self.backends.store.get_by_key(&tables.aggregated_skills, &user_key),
		);
		let entered = match entered {
			Lookup::Found(doc) => models::decode::<MemberSkillsRecord>("entered skills", doc)?,
			Lookup::NotFound =>
				return Err(Error::NotFound {
					message: format!("Member {user_id} has no entered skills."),
				}),
			Lookup::Failure(err) => return Err(err),
		};
		let aggregated = aggregated
			.into_result()?
			.map(|doc| models::decode::<MemberSkillsRecord>("aggregated skills", doc))
			.transpose()?;
		let aggregated_map = match &aggregated {
			Some(record) => record.skill_map()?,
			None => Default::default(),
		};
		let mut merged = skills::merge(entered.skill_map()?, aggregated_map);
		let handle_lower = member.lower_handle();

		if !self.visibility.roles().can_manage_member(caller, Some(user_id), handle_lower.as_deref())
		{
			merged = skills::drop_hidden(merged);
		}

		let view = MemberSkills {
			user_id: Some(user_id),
			user_handle: member.handle.clone().or(entered.user_handle),
			handle_lower,
			skills: Some(merged),
			created_at: entered.created_at,
			created_by: entered.created_by,
			updated_at: entered.updated_at,
			updated_by: entered.updated_by,
		};

		Ok(fields::project(view, &FieldSet::<SkillsField>::parse_requested(requested)))
	}
}

fn encode<T>(entity: &str, value: &T) -> Result<Value>
where
	T: serde::Serialize,
{
	serde_json::to_value(value)
		.map_err(|err| Error::DataFormat { message: format!("Failed to encode {entity}: {err}") })
}
