use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patterns::DOMAIN;
use super::validator::Validator;
use super::{FieldKind, FieldSpec, FormValues, Record, Schema};
use crate::constants::limits::{DOMAIN_MAX_LEN, NAME_MAX_LEN, TEXT_MAX_LEN};
use crate::constants::query_keys;
use crate::errors::FieldErrors;

choice_enum! {
    RecordType default A {
        A => "A",
        Aaaa => "AAAA",
        Cname => "CNAME",
        Mx => "MX",
        Txt => "TXT",
        Srv => "SRV",
    }
}

pub const DNS_RECORD_TYPES: &[&str] = RecordType::NAMES;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// ISO 3166 alpha-2, upper-case
    pub country: String,
    pub region: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoDnsRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub domain: String,
    pub record_type: RecordType,
    pub target: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub anycast: bool,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGeoDnsRecord {
    pub domain: String,
    pub record_type: RecordType,
    pub target: String,
    pub location: Location,
    pub anycast: bool,
    pub routes: Vec<String>,
    pub agents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGeoDnsRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anycast: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<String>>,
}

const DOMAIN_REQUIRED: &str = "Domain is required";
const DOMAIN_TOO_LONG: &str = "Domain must be less than 255 characters";
const DOMAIN_INVALID: &str = "Invalid domain format";
const RECORD_TYPE_INVALID: &str = "Record type must be one of: A, AAAA, CNAME, MX, TXT, SRV";
const TARGET_REQUIRED: &str = "Target is required";
const TARGET_TOO_LONG: &str = "Target must be less than 500 characters";
const COUNTRY_TOO_SHORT: &str = "Country code must be at least 2 characters";
const COUNTRY_TOO_LONG: &str = "Country code must be 2 characters";
const REGION_REQUIRED: &str = "Region is required";
const REGION_TOO_LONG: &str = "Region must be less than 100 characters";
const CITY_REQUIRED: &str = "City is required";
const CITY_TOO_LONG: &str = "City must be less than 100 characters";

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("domain", "Domain", FieldKind::Text)
        .required()
        .placeholder("example.com")
        .describe("Fully qualified domain name"),
    FieldSpec::new("recordType", "Record Type", FieldKind::Select(DNS_RECORD_TYPES)).required(),
    FieldSpec::new("target", "Target", FieldKind::Text)
        .required()
        .placeholder("192.0.2.1 or target.example.com")
        .describe("IP address or hostname"),
    FieldSpec::new("location.country", "Country Code", FieldKind::Text)
        .required()
        .placeholder("US")
        .describe("2-letter code"),
    FieldSpec::new("location.region", "Region", FieldKind::Text)
        .required()
        .placeholder("California"),
    FieldSpec::new("location.city", "City", FieldKind::Text)
        .required()
        .placeholder("San Francisco"),
    FieldSpec::new("anycast", "Enable Anycast", FieldKind::Checkbox)
        .describe("Route to nearest server automatically"),
    FieldSpec::new(
        "routes",
        "Routes",
        FieldKind::Reference {
            resource: query_keys::ROUTES,
            multiple: true,
        },
    ),
    FieldSpec::new(
        "agents",
        "Agents",
        FieldKind::Reference {
            resource: query_keys::AGENTS,
            multiple: true,
        },
    ),
];

pub struct GeoDnsSchema;

impl GeoDnsSchema {
    fn location(v: &mut Validator<'_>) -> Option<Location> {
        let country = v
            .text("location.country")
            .min_len(2, COUNTRY_TOO_SHORT)
            .max_len(2, COUNTRY_TOO_LONG)
            .uppercase()
            .finish();
        let region = v
            .text("location.region")
            .min_len(1, REGION_REQUIRED)
            .max_len(NAME_MAX_LEN, REGION_TOO_LONG)
            .finish();
        let city = v
            .text("location.city")
            .min_len(1, CITY_REQUIRED)
            .max_len(NAME_MAX_LEN, CITY_TOO_LONG)
            .finish();

        Some(Location {
            country: country?,
            region: region?,
            city: city?,
        })
    }
}

impl Schema for GeoDnsSchema {
    type Create = CreateGeoDnsRecord;
    type Update = UpdateGeoDnsRecord;

    const ENTITY: &'static str = "Record";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn defaults() -> FormValues {
        FormValues::new()
            .with_text("domain", "")
            .with_text("recordType", RecordType::A.to_string())
            .with_text("target", "")
            .with_text("location.country", "")
            .with_text("location.region", "")
            .with_text("location.city", "")
            .with_bool("anycast", false)
            .with_list("routes", Vec::<String>::new())
            .with_list("agents", Vec::<String>::new())
    }

    fn validate_create(values: &FormValues) -> Result<CreateGeoDnsRecord, FieldErrors> {
        let mut v = Validator::new(values);

        let domain = v
            .text("domain")
            .min_len(1, DOMAIN_REQUIRED)
            .max_len(DOMAIN_MAX_LEN, DOMAIN_TOO_LONG)
            .matches(&DOMAIN, DOMAIN_INVALID)
            .finish();
        let record_type = v.choice::<RecordType>("recordType", RECORD_TYPE_INVALID);
        let target = v
            .text("target")
            .min_len(1, TARGET_REQUIRED)
            .max_len(TEXT_MAX_LEN, TARGET_TOO_LONG)
            .finish();
        let location = Self::location(&mut v);
        let anycast = v.flag("anycast");
        let routes = v.list("routes").finish();
        let agents = v.list("agents").finish();

        v.finish(|| {
            Some(CreateGeoDnsRecord {
                domain: domain?,
                record_type: record_type?,
                target: target?,
                location: location?,
                anycast,
                routes: routes.unwrap_or_default(),
                agents: agents.unwrap_or_default(),
            })
        })
    }

    fn validate_update(values: &FormValues) -> Result<UpdateGeoDnsRecord, FieldErrors> {
        let mut v = Validator::new(values);

        let domain = v
            .optional_text("domain")
            .min_len(1, DOMAIN_REQUIRED)
            .max_len(DOMAIN_MAX_LEN, DOMAIN_TOO_LONG)
            .matches(&DOMAIN, DOMAIN_INVALID)
            .finish();
        let record_type = v.optional_choice::<RecordType>("recordType", RECORD_TYPE_INVALID);
        let target = v
            .optional_text("target")
            .min_len(1, TARGET_REQUIRED)
            .max_len(TEXT_MAX_LEN, TARGET_TOO_LONG)
            .finish();
        // A partial location is rejected: the object is replaced as a whole
        let location = if values.has_group("location") {
            Self::location(&mut v)
        } else {
            None
        };
        let anycast = v.optional_flag("anycast");
        let routes = v.optional_list("routes").finish();
        let agents = v.optional_list("agents").finish();

        v.finish(|| {
            Some(UpdateGeoDnsRecord {
                domain,
                record_type,
                target,
                location,
                anycast,
                routes,
                agents,
            })
        })
    }
}

impl Record for GeoDnsRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_form_values(&self) -> FormValues {
        FormValues::new()
            .with_text("domain", self.domain.clone())
            .with_text("recordType", self.record_type.to_string())
            .with_text("target", self.target.clone())
            .with_text("location.country", self.location.country.clone())
            .with_text("location.region", self.location.region.clone())
            .with_text("location.city", self.location.city.clone())
            .with_bool("anycast", self.anycast)
            .with_list("routes", self.routes.clone())
            .with_list("agents", self.agents.clone())
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_record() -> FormValues {
        GeoDnsSchema::defaults()
            .with_text("domain", "cdn.example.com")
            .with_text("target", "192.0.2.1")
            .with_text("location.country", "us")
            .with_text("location.region", "California")
            .with_text("location.city", "San Francisco")
    }

    #[test]
    fn test_country_is_upper_cased() {
        let record = GeoDnsSchema::validate_create(&valid_record()).unwrap();
        assert_eq!(record.location.country, "US");
        assert_eq!(record.record_type, RecordType::A);

        let body = serde_json::to_value(&record).unwrap();
        assert_eq!(body["recordType"], "A");
        assert_eq!(body["location"]["country"], "US");
        assert_eq!(body["anycast"], false);
    }

    #[rstest]
    #[case("location.country", "U", COUNTRY_TOO_SHORT)]
    #[case("location.country", "USA", COUNTRY_TOO_LONG)]
    #[case("domain", "not a domain", DOMAIN_INVALID)]
    #[case("domain", "localhost", DOMAIN_INVALID)]
    #[case("recordType", "PTR", RECORD_TYPE_INVALID)]
    #[case("location.city", "", CITY_REQUIRED)]
    fn test_create_rejects(#[case] path: &str, #[case] value: &str, #[case] message: &str) {
        let values = valid_record().with_text(path, value);
        let errors = GeoDnsSchema::validate_create(&values).unwrap_err();
        assert_eq!(errors.first(path), Some(message));
    }

    #[test]
    fn test_update_validates_location_as_a_whole() {
        let values = FormValues::new().with_text("location.country", "de");
        let errors = GeoDnsSchema::validate_update(&values).unwrap_err();
        assert!(errors.contains("location.region"));
        assert!(errors.contains("location.city"));

        let update = GeoDnsSchema::validate_update(&FormValues::new().with_bool("anycast", true))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"anycast": true})
        );
    }
}
