//! Typed records for Adjust API payloads.
//!
//! Every record is built through an explicit `from_json` constructor that
//! checks required fields and types and reports the first violation as a
//! [`ValidationError`] carrying the dotted path of the offending field.
//! Optional fields map both "missing" and `null` to `None`; unknown keys are
//! ignored.

use crate::error::{ValidationError, ValidationErrorKind};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

/// Key holding metric values in a KPI result leaf.
pub const VALUE_FIELD: &str = "kpi_values";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Currency {
    pub name: String,
    pub symbol: String,
    pub iso_code: String,
}

impl Currency {
    pub fn from_json(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let f = Fields::of(value, path)?;
        Ok(Self {
            name: f.string("name")?,
            symbol: f.string("symbol")?,
            iso_code: f.string("iso_code")?,
        })
    }
}

/// Capability flags of the token owner on an app. Absent flags stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub generate_report: Option<bool>,
    pub read_statistics: Option<bool>,
    pub create_tracker: Option<bool>,
    pub update_settings: Option<bool>,
    pub update_custom_twitter_permissions: Option<bool>,
}

impl Permissions {
    pub fn from_json(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let f = Fields::of(value, path)?;
        Ok(Self {
            generate_report: f.opt_bool("generate_report")?,
            read_statistics: f.opt_bool("read_statistics")?,
            create_tracker: f.opt_bool("create_tracker")?,
            update_settings: f.opt_bool("update_settings")?,
            update_custom_twitter_permissions: f.opt_bool("update_custom_twitter_permissions")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventParameter {
    pub name: String,
    pub token: String,
}

impl EventParameter {
    pub fn from_json(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let f = Fields::of(value, path)?;
        Ok(Self {
            name: f.string("name")?,
            token: f.string("token")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerResultParameters {
    pub token: Option<String>,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub has_subtrackers: bool,
}

impl TrackerResultParameters {
    pub fn from_json(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let f = Fields::of(value, path)?;
        Ok(Self {
            token: f.opt_string("token")?,
            name: f.opt_string("name")?,
            currency: f.opt_string("currency")?,
            has_subtrackers: f.bool("has_subtrackers")?,
        })
    }
}

/// Echo of the query that produced a [`KpiResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultParameters {
    pub kpis: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sandbox: bool,
    pub countries: Option<Vec<String>>,
    pub events: Option<Vec<EventParameter>>,
    pub trackers: Option<Vec<TrackerResultParameters>>,
    pub grouping: Vec<String>,
    pub period: Option<String>,
    pub attribution_type: String,
    pub utc_offset: String,
    pub cohort_period_filter: Option<Value>,
    pub day_def: Option<String>,
    pub attribution_source: String,
}

impl ResultParameters {
    pub fn from_json(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let f = Fields::of(value, path)?;
        Ok(Self {
            kpis: f.strings("kpis")?,
            start_date: f.date("start_date")?,
            end_date: f.date("end_date")?,
            sandbox: f.bool("sandbox")?,
            countries: f.opt_strings("countries")?,
            events: f.opt_list("events", EventParameter::from_json)?,
            trackers: f.opt_list("trackers", TrackerResultParameters::from_json)?,
            grouping: f.strings("grouping")?,
            period: f.opt_string("period")?,
            attribution_type: f.string("attribution_type")?,
            utc_offset: f.string("utc_offset")?,
            cohort_period_filter: f.get("cohort_period_filter").cloned(),
            day_def: f.opt_string("day_def")?,
            attribution_source: f.string("attribution_source")?,
        })
    }
}

/// A KPI service answer: the query echo plus the dynamically shaped result set.
///
/// The shape of `result_set` depends on the requested grouping; see
/// [`crate::shape`] for discovering it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiResult {
    pub result_parameters: ResultParameters,
    pub result_set: Map<String, Value>,
}

impl KpiResult {
    pub fn from_json(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let f = Fields::of(value, path)?;
        Ok(Self {
            result_parameters: f.nested("result_parameters", ResultParameters::from_json)?,
            result_set: f.object("result_set")?,
        })
    }

    /// Grouping dimensions found in `result_set`.
    pub fn grouping(&self) -> Vec<String> {
        crate::shape::infer_grouping_map(&self.result_set)
    }
}

/// A tracked mobile application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct App {
    pub id: i64,
    pub name: String,
    pub token: Option<String>,
    pub start_date: NaiveDate,
    pub default_store_app_id: Option<String>,
    pub integration_dates: Option<Map<String, Value>>,
    pub default_attribution_platform: String,
    pub app_token: String,
    pub platforms: Map<String, Value>,
    pub permissions: Permissions,
    pub currency: Currency,
    pub is_ctv: Option<bool>,
}

impl App {
    pub fn from_json(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let f = Fields::of(value, path)?;
        Ok(Self {
            id: f.int("id")?,
            name: f.string("name")?,
            token: f.opt_string("token")?,
            start_date: f.date("start_date")?,
            default_store_app_id: f.opt_string("default_store_app_id")?,
            integration_dates: f.opt_object("integration_dates")?,
            default_attribution_platform: f.string("default_attribution_platform")?,
            app_token: f.string("app_token")?,
            platforms: f.object("platforms")?,
            permissions: f.nested("permissions", Permissions::from_json)?,
            currency: f.nested("currency", Currency::from_json)?,
            is_ctv: f.opt_bool("is_ctv")?,
        })
    }
}

/// Body of `GET /dashboard/api/apps`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppsResponse {
    pub apps: Vec<App>,
    pub urls: Option<Map<String, Value>>,
    pub page: Option<Map<String, Value>>,
}

impl AppsResponse {
    pub fn from_json(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let f = Fields::of(value, path)?;
        Ok(Self {
            apps: f.list("apps", App::from_json)?,
            urls: f.opt_object("urls")?,
            page: f.opt_object("page")?,
        })
    }
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`). Surrounding whitespace
/// is rejected.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.trim() != s {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn join_path(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", base, key)
    }
}

/// Field accessor over one JSON object, tracking the path for error reporting.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    path: &'a str,
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value, path: &'a str) -> Result<Self, ValidationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::mismatch(path, "object", value))?;
        Ok(Self { obj, path })
    }

    fn at(&self, key: &str) -> String {
        join_path(self.path, key)
    }

    /// Present and non-null value.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> Result<&'a Value, ValidationError> {
        match self.obj.get(key) {
            None => Err(ValidationError::missing(&self.at(key))),
            Some(Value::Null) => Err(ValidationError::mismatch(&self.at(key), "a value", &Value::Null)),
            Some(v) => Ok(v),
        }
    }

    fn string(&self, key: &str) -> Result<String, ValidationError> {
        as_string(self.required(key)?, &self.at(key))
    }

    fn opt_string(&self, key: &str) -> Result<Option<String>, ValidationError> {
        self.get(key).map(|v| as_string(v, &self.at(key))).transpose()
    }

    fn bool(&self, key: &str) -> Result<bool, ValidationError> {
        as_bool(self.required(key)?, &self.at(key))
    }

    fn opt_bool(&self, key: &str) -> Result<Option<bool>, ValidationError> {
        self.get(key).map(|v| as_bool(v, &self.at(key))).transpose()
    }

    fn int(&self, key: &str) -> Result<i64, ValidationError> {
        let v = self.required(key)?;
        v.as_i64()
            .ok_or_else(|| ValidationError::mismatch(&self.at(key), "integer", v))
    }

    fn date(&self, key: &str) -> Result<NaiveDate, ValidationError> {
        let path = self.at(key);
        let s = as_string(self.required(key)?, &path)?;
        parse_date(&s).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::MalformedDate,
                path,
                format!("`{}` is not an ISO-8601 date (YYYY-MM-DD)", s),
            )
        })
    }

    fn object(&self, key: &str) -> Result<Map<String, Value>, ValidationError> {
        as_object(self.required(key)?, &self.at(key))
    }

    fn opt_object(&self, key: &str) -> Result<Option<Map<String, Value>>, ValidationError> {
        self.get(key).map(|v| as_object(v, &self.at(key))).transpose()
    }

    fn strings(&self, key: &str) -> Result<Vec<String>, ValidationError> {
        self.list(key, as_string)
    }

    fn opt_strings(&self, key: &str) -> Result<Option<Vec<String>>, ValidationError> {
        self.opt_list(key, as_string)
    }

    fn nested<T>(
        &self,
        key: &str,
        build: fn(&Value, &str) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        build(self.required(key)?, &self.at(key))
    }

    fn list<T>(
        &self,
        key: &str,
        build: fn(&Value, &str) -> Result<T, ValidationError>,
    ) -> Result<Vec<T>, ValidationError> {
        as_list(self.required(key)?, &self.at(key), build)
    }

    fn opt_list<T>(
        &self,
        key: &str,
        build: fn(&Value, &str) -> Result<T, ValidationError>,
    ) -> Result<Option<Vec<T>>, ValidationError> {
        self.get(key)
            .map(|v| as_list(v, &self.at(key), build))
            .transpose()
    }
}

fn as_string(v: &Value, path: &str) -> Result<String, ValidationError> {
    v.as_str()
        .map(String::from)
        .ok_or_else(|| ValidationError::mismatch(path, "string", v))
}

fn as_bool(v: &Value, path: &str) -> Result<bool, ValidationError> {
    v.as_bool()
        .ok_or_else(|| ValidationError::mismatch(path, "boolean", v))
}

fn as_object(v: &Value, path: &str) -> Result<Map<String, Value>, ValidationError> {
    v.as_object()
        .cloned()
        .ok_or_else(|| ValidationError::mismatch(path, "object", v))
}

fn as_list<T>(
    v: &Value,
    path: &str,
    build: fn(&Value, &str) -> Result<T, ValidationError>,
) -> Result<Vec<T>, ValidationError> {
    let arr = v
        .as_array()
        .ok_or_else(|| ValidationError::mismatch(path, "array", v))?;
    arr.iter()
        .enumerate()
        .map(|(i, item)| build(item, &format!("{}[{}]", path, i)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn app_json() -> Value {
        json!({
            "id": 42,
            "name": "Demo",
            "token": "tok",
            "start_date": "2020-05-01",
            "default_store_app_id": null,
            "default_attribution_platform": "ios",
            "app_token": "abc123",
            "platforms": {"ios": {"app_id": "123"}},
            "permissions": {"generate_report": true, "read_statistics": false},
            "currency": {"name": "US Dollar", "symbol": "$", "iso_code": "USD"}
        })
    }

    pub(crate) fn result_parameters_json() -> Value {
        json!({
            "kpis": ["installs", "sessions"],
            "start_date": "2020-05-01",
            "end_date": "2020-05-31",
            "sandbox": false,
            "countries": ["de", "gb"],
            "events": [{"name": "Purchase", "token": "ev1"}],
            "trackers": [{"token": "t1", "name": "Organic", "has_subtrackers": false}],
            "grouping": ["apps", "trackers"],
            "period": null,
            "attribution_type": "click",
            "utc_offset": "+00:00",
            "attribution_source": "dynamic"
        })
    }

    #[test]
    fn app_carries_present_fields_and_leaves_absent_ones_none() {
        let app = App::from_json(&app_json(), "").unwrap();
        assert_eq!(app.id, 42);
        assert_eq!(app.name, "Demo");
        assert_eq!(app.token.as_deref(), Some("tok"));
        assert_eq!(app.start_date, NaiveDate::from_ymd_opt(2020, 5, 1).unwrap());
        assert_eq!(app.default_store_app_id, None);
        assert_eq!(app.integration_dates, None);
        assert_eq!(app.is_ctv, None);
        assert_eq!(app.app_token, "abc123");
        assert_eq!(app.permissions.generate_report, Some(true));
        assert_eq!(app.permissions.read_statistics, Some(false));
        assert_eq!(app.permissions.create_tracker, None);
        assert_eq!(app.currency.iso_code, "USD");
        assert!(app.platforms.contains_key("ios"));
    }

    #[test]
    fn missing_required_field_reports_path() {
        let mut v = app_json();
        v["currency"].as_object_mut().unwrap().remove("iso_code");
        let err = App::from_json(&v, "apps[0]").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MissingField);
        assert_eq!(err.path, "apps[0].currency.iso_code");
    }

    #[test]
    fn wrong_type_is_mismatch() {
        let mut v = app_json();
        v["id"] = json!("42");
        let err = App::from_json(&v, "").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::TypeMismatch);
        assert_eq!(err.path, "id");
    }

    #[test]
    fn null_for_required_field_is_mismatch() {
        let mut v = app_json();
        v["name"] = Value::Null;
        let err = App::from_json(&v, "").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::TypeMismatch);
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut v = app_json();
        v["start_date"] = json!("05/01/2020");
        let err = App::from_json(&v, "").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MalformedDate);
        assert_eq!(err.path, "start_date");

        for bad in [" 2020-05-01 ", "2020-05-01\n", "2020-05-01T00:00:00"] {
            v["start_date"] = json!(bad);
            let err = App::from_json(&v, "").unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::MalformedDate, "{:?}", bad);
        }
    }

    #[test]
    fn app_carries_every_optional_field_when_present() {
        let mut v = app_json();
        v["default_store_app_id"] = json!("id1234567");
        v["integration_dates"] = json!({"facebook": "2021-03-04"});
        v["is_ctv"] = json!(true);
        v["permissions"] = json!({
            "generate_report": true,
            "read_statistics": false,
            "create_tracker": true,
            "update_settings": false,
            "update_custom_twitter_permissions": true
        });
        let app = App::from_json(&v, "").unwrap();
        assert_eq!(app.token.as_deref(), Some("tok"));
        assert_eq!(app.default_store_app_id.as_deref(), Some("id1234567"));
        assert_eq!(
            app.integration_dates.map(Value::Object),
            Some(json!({"facebook": "2021-03-04"}))
        );
        assert_eq!(app.is_ctv, Some(true));
        assert_eq!(
            app.permissions,
            Permissions {
                generate_report: Some(true),
                read_statistics: Some(false),
                create_tracker: Some(true),
                update_settings: Some(false),
                update_custom_twitter_permissions: Some(true),
            }
        );
    }

    #[test]
    fn present_optional_field_of_wrong_type_is_mismatch() {
        let mut v = app_json();
        v["is_ctv"] = json!("yes");
        let err = App::from_json(&v, "").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::TypeMismatch);
        assert_eq!(err.path, "is_ctv");
    }

    #[test]
    fn result_parameters_parse_nested_lists() {
        let rp = ResultParameters::from_json(&result_parameters_json(), "").unwrap();
        assert_eq!(rp.kpis, vec!["installs", "sessions"]);
        assert_eq!(rp.countries.as_deref(), Some(&["de".to_string(), "gb".to_string()][..]));
        assert_eq!(rp.events.as_ref().unwrap()[0].token, "ev1");
        let trackers = rp.trackers.unwrap();
        assert_eq!(trackers[0].name.as_deref(), Some("Organic"));
        assert_eq!(trackers[0].currency, None);
        assert!(!trackers[0].has_subtrackers);
        assert_eq!(rp.period, None);
        assert_eq!(rp.day_def, None);
        assert_eq!(rp.cohort_period_filter, None);
    }

    #[test]
    fn list_element_errors_carry_index() {
        let mut v = result_parameters_json();
        v["events"] = json!([{"name": "a", "token": "b"}, {"name": "c"}]);
        let err = ResultParameters::from_json(&v, "result_parameters").unwrap_err();
        assert_eq!(err.path, "result_parameters.events[1].token");
    }

    #[test]
    fn kpi_result_requires_object_result_set() {
        let v = json!({"result_parameters": result_parameters_json(), "result_set": []});
        let err = KpiResult::from_json(&v, "").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::TypeMismatch);
        assert_eq!(err.path, "result_set");
    }

    #[test]
    fn kpi_result_exposes_grouping() {
        let v = json!({
            "result_parameters": result_parameters_json(),
            "result_set": {"apps": [{"name": "A", "trackers": [{"name": "T", "kpi_values": [1]}]}]}
        });
        let kpi = KpiResult::from_json(&v, "").unwrap();
        assert_eq!(kpi.grouping(), vec!["apps", "trackers"]);
    }

    #[test]
    fn app_serializes_dates_as_iso() {
        let app = App::from_json(&app_json(), "").unwrap();
        let out = serde_json::to_value(&app).unwrap();
        assert_eq!(out["start_date"], json!("2020-05-01"));
        assert_eq!(out["default_store_app_id"], Value::Null);
    }
}
