//! Normalized identity profile and the per-generation mapping logic.
//!
//! Yahoo shipped three incompatible profile-endpoint shapes over the years; each is a
//! [`ProfileSource`](crate::config::ProfileSource) variant with its own mapping function.
//! Whatever the generation, the normalized [`Profile`] always carries `provider = "yahoo"`,
//! the verbatim subject/guid as `id`, and the exact raw + parsed response body.

// self
use crate::{
	_prelude::*,
	config::{GUID_PLACEHOLDER, ProfileSource},
	error::{ConfigError, ProfileError},
	oauth::ExchangeParams,
};

/// Provider name stamped on every profile produced by this strategy.
pub const PROVIDER: &str = "yahoo";

/// Structured name component of a [`Profile`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PersonName {
	/// Given (first) name.
	pub given_name: Option<String>,
	/// Family (last) name.
	pub family_name: Option<String>,
}

/// Email address attached to a [`Profile`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileEmail {
	/// Address value.
	pub value: String,
	/// Whether the provider marked the address primary, when known.
	pub primary: Option<bool>,
}

/// Photo attached to a [`Profile`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfilePhoto {
	/// Image URL.
	pub value: String,
}

/// Normalized identity record handed to the verifier.
#[derive(Clone, Debug, Serialize)]
pub struct Profile {
	/// Always [`PROVIDER`].
	pub provider: &'static str,
	/// Provider subject/guid, verbatim.
	pub id: String,
	/// Display name; given and family name joined by a space, absent parts skipped.
	pub display_name: String,
	/// Structured name.
	pub name: PersonName,
	/// Email addresses, when the shape provides them.
	pub emails: Option<Vec<ProfileEmail>>,
	/// Photos, when the shape provides them.
	pub photos: Option<Vec<ProfilePhoto>>,
	/// Exact response body as received.
	pub raw: String,
	/// Parsed response body.
	pub json: Json,
}

/// Maps provider profile payloads into [`Profile`] records for one configured generation.
#[derive(Clone, Debug)]
pub struct ProfileMapper {
	source: ProfileSource,
	profile_url: String,
}
impl ProfileMapper {
	/// Creates a mapper for the given generation and endpoint template.
	pub fn new(source: ProfileSource, profile_url: impl Into<String>) -> Self {
		Self { source, profile_url: profile_url.into() }
	}

	/// Builds the concrete profile request URL, substituting the account GUID into
	/// legacy templates.
	pub fn request_url(&self, exchange: &ExchangeParams) -> Result<Url> {
		let url = if self.profile_url.contains(GUID_PLACEHOLDER) {
			let guid =
				exchange.account_guid.as_deref().ok_or(ProfileError::MissingAccountGuid)?;

			self.profile_url.replace(GUID_PLACEHOLDER, guid)
		} else {
			self.profile_url.clone()
		};

		Url::parse(&url).map_err(|source| ConfigError::InvalidProfileUrl { url, source }.into())
	}

	/// Parses and maps a 200-response body into a normalized [`Profile`].
	pub fn map(&self, body: &str) -> Result<Profile, ProfileError> {
		let mut deserializer = serde_json::Deserializer::from_str(body);
		let json: Json = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ProfileError::Parse { source })?;
		let identity = match self.source {
			ProfileSource::OpenIdConnect => map_openid(&json)?,
			ProfileSource::LegacyFlat => map_legacy_flat(&json)?,
			ProfileSource::LegacyNested => map_legacy_nested(&json)?,
		};
		let display_name = identity.display_name();
		let id = identity.id.ok_or(ProfileError::MissingSubject)?;

		Ok(Profile {
			provider: PROVIDER,
			id,
			display_name,
			name: identity.name,
			emails: identity.emails,
			photos: identity.photos,
			raw: body.to_owned(),
			json,
		})
	}
}

struct MappedIdentity {
	id: Option<String>,
	name: PersonName,
	nickname: Option<String>,
	emails: Option<Vec<ProfileEmail>>,
	photos: Option<Vec<ProfilePhoto>>,
}
impl MappedIdentity {
	fn display_name(&self) -> String {
		let joined = [self.name.given_name.as_deref(), self.name.family_name.as_deref()]
			.into_iter()
			.flatten()
			.collect::<Vec<_>>()
			.join(" ");

		if joined.is_empty() {
			return self.nickname.clone().unwrap_or_default();
		}

		joined
	}
}

#[derive(Deserialize)]
struct OidcUserInfo {
	sub: Option<String>,
	given_name: Option<String>,
	family_name: Option<String>,
	nickname: Option<String>,
	email: Option<String>,
	picture: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyProfile {
	guid: Option<String>,
	given_name: Option<String>,
	family_name: Option<String>,
	nickname: Option<String>,
	emails: Option<Vec<LegacyEmail>>,
	image: Option<LegacyImage>,
}

#[derive(Deserialize)]
struct LegacyEmail {
	handle: Option<String>,
	primary: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyImage {
	image_url: Option<String>,
}

#[derive(Deserialize)]
struct LegacyEnvelope {
	profile: LegacyProfile,
}

fn map_openid(json: &Json) -> Result<MappedIdentity, ProfileError> {
	let info: OidcUserInfo = from_json(json, ProfileSource::OpenIdConnect)?;

	Ok(MappedIdentity {
		id: info.sub,
		name: PersonName { given_name: info.given_name, family_name: info.family_name },
		nickname: info.nickname,
		emails: info
			.email
			.map(|value| vec![ProfileEmail { value, primary: None }]),
		photos: info.picture.map(|value| vec![ProfilePhoto { value }]),
	})
}

fn map_legacy_flat(json: &Json) -> Result<MappedIdentity, ProfileError> {
	let profile: LegacyProfile = from_json(json, ProfileSource::LegacyFlat)?;

	Ok(map_legacy(profile))
}

fn map_legacy_nested(json: &Json) -> Result<MappedIdentity, ProfileError> {
	let envelope: LegacyEnvelope = from_json(json, ProfileSource::LegacyNested)?;

	Ok(map_legacy(envelope.profile))
}

fn map_legacy(profile: LegacyProfile) -> MappedIdentity {
	let emails = profile.emails.map(|entries| {
		entries
			.into_iter()
			.filter_map(|entry| {
				entry.handle.map(|value| ProfileEmail { value, primary: entry.primary })
			})
			.collect::<Vec<_>>()
	});
	let emails = emails.filter(|entries| !entries.is_empty());
	let photos = profile
		.image
		.and_then(|image| image.image_url)
		.map(|value| vec![ProfilePhoto { value }]);

	MappedIdentity {
		id: profile.guid,
		name: PersonName {
			given_name: profile.given_name,
			family_name: profile.family_name,
		},
		nickname: profile.nickname,
		emails,
		photos,
	}
}

fn from_json<T>(json: &Json, source: ProfileSource) -> Result<T, ProfileError>
where
	T: serde::de::DeserializeOwned,
{
	serde_json::from_value(json.clone())
		.map_err(|err| ProfileError::Mapping { shape: source.as_str(), source: err })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn mapper(source: ProfileSource) -> ProfileMapper {
		ProfileMapper::new(source, source.default_profile_url())
	}

	#[test]
	fn maps_openid_userinfo() {
		let body = r#"{"sub":"ID1","given_name":"A","family_name":"B"}"#;
		let profile = mapper(ProfileSource::OpenIdConnect)
			.map(body)
			.expect("OIDC fixture should map successfully.");

		assert_eq!(profile.provider, "yahoo");
		assert_eq!(profile.id, "ID1");
		assert_eq!(profile.display_name, "A B");
		assert_eq!(profile.name.given_name.as_deref(), Some("A"));
		assert_eq!(profile.name.family_name.as_deref(), Some("B"));
		assert_eq!(profile.raw, body);
		assert_eq!(profile.json["sub"], "ID1");
	}

	#[test]
	fn maps_openid_email_and_picture() {
		let body = r#"{
			"sub": "JEF4XR2CT55JPVEBVD7ZVT6A3A",
			"name": "Jasmine Smith",
			"given_name": "Jasmine",
			"family_name": "Smith",
			"email": "jasmine@yahoo.com",
			"picture": "https://ct.yimg.com/cy/1768/39361574426_98028a_192sq.jpg"
		}"#;
		let profile = mapper(ProfileSource::OpenIdConnect)
			.map(body)
			.expect("OIDC fixture should map successfully.");

		assert_eq!(profile.id, "JEF4XR2CT55JPVEBVD7ZVT6A3A");
		assert_eq!(profile.display_name, "Jasmine Smith");
		assert_eq!(
			profile.emails.as_deref(),
			Some(&[ProfileEmail { value: "jasmine@yahoo.com".into(), primary: None }][..])
		);
		assert_eq!(
			profile.photos.as_deref().and_then(|photos| photos.first()).map(|p| p.value.as_str()),
			Some("https://ct.yimg.com/cy/1768/39361574426_98028a_192sq.jpg")
		);
	}

	#[test]
	fn missing_subject_is_an_error() {
		let body = r#"{"given_name":"A","family_name":"B"}"#;
		let err = mapper(ProfileSource::OpenIdConnect)
			.map(body)
			.expect_err("A payload without a subject must not map.");

		assert!(matches!(err, ProfileError::MissingSubject));
	}

	#[test]
	fn maps_legacy_nested_profile() {
		let body = r#"{
			"profile": {
				"guid": "12345",
				"givenName": "Samantha",
				"familyName": "Edgerton",
				"emails": [{"handle": "samantha@yahoo.com", "primary": true}],
				"image": {"imageUrl": "https://example.com/samantha.jpg"}
			}
		}"#;
		let profile = mapper(ProfileSource::LegacyNested)
			.map(body)
			.expect("Nested legacy fixture should map successfully.");

		assert_eq!(profile.id, "12345");
		assert_eq!(profile.display_name, "Samantha Edgerton");
		assert_eq!(
			profile.emails.as_deref(),
			Some(
				&[ProfileEmail { value: "samantha@yahoo.com".into(), primary: Some(true) }][..]
			)
		);
		assert_eq!(
			profile.photos.as_deref().and_then(|photos| photos.first()).map(|p| p.value.as_str()),
			Some("https://example.com/samantha.jpg")
		);
	}

	#[test]
	fn maps_legacy_flat_profile() {
		let body = r#"{"guid":"67890","givenName":"Ada","familyName":"Lovelace"}"#;
		let profile = mapper(ProfileSource::LegacyFlat)
			.map(body)
			.expect("Flat legacy fixture should map successfully.");

		assert_eq!(profile.id, "67890");
		assert_eq!(profile.display_name, "Ada Lovelace");
		assert_eq!(profile.emails, None);
	}

	#[test]
	fn nested_shape_mismatch_is_a_mapping_error() {
		let body = r#"{"guid":"12345"}"#;
		let err = mapper(ProfileSource::LegacyNested)
			.map(body)
			.expect_err("A flat payload must not map against the nested shape.");

		assert!(matches!(err, ProfileError::Mapping { shape: "legacy_nested", .. }));
	}

	#[test]
	fn malformed_body_is_a_parse_error() {
		let err = mapper(ProfileSource::OpenIdConnect)
			.map("not json")
			.expect_err("Malformed body must not map.");

		assert!(matches!(err, ProfileError::Parse { .. }));
	}

	#[test]
	fn display_name_skips_absent_parts() {
		let only_given = mapper(ProfileSource::OpenIdConnect)
			.map(r#"{"sub":"ID1","given_name":"A"}"#)
			.expect("Partial name should map.");

		assert_eq!(only_given.display_name, "A");

		let nickname_fallback = mapper(ProfileSource::OpenIdConnect)
			.map(r#"{"sub":"ID1","nickname":"ada"}"#)
			.expect("Nickname-only payload should map.");

		assert_eq!(nickname_fallback.display_name, "ada");
	}

	#[test]
	fn substitutes_account_guid_into_legacy_urls() {
		let mapper = mapper(ProfileSource::LegacyNested);
		let exchange =
			ExchangeParams { account_guid: Some("12345".into()), ..Default::default() };
		let url = mapper.request_url(&exchange).expect("GUID substitution should succeed.");

		assert_eq!(
			url.as_str(),
			"https://social.yahooapis.com/v1/user/12345/profile?format=json"
		);

		let err = mapper
			.request_url(&ExchangeParams::default())
			.expect_err("A legacy URL without a GUID must not build.");

		assert!(matches!(err, Error::Profile(ProfileError::MissingAccountGuid)));
	}
}
