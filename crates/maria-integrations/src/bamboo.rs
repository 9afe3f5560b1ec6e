//! BambooHR REST client — employees and time off.
//!
//! Thin parameter-to-request mapper over the BambooHR gateway API.
//! Authentication is HTTP Basic with the API key as username and a literal
//! `x` as password. Created resource ids come back in the `Location`
//! response header.

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use tracing::debug;

use maria_core::config::schema::BambooConfig;

/// Vacation policy assigned to every new employee.
/// See https://documentation.bamboohr.com/reference/get-time-off-policies
const VACATION_POLICY_ID: i64 = 3;

/// Time-off type id for vacation.
/// See https://documentation.bamboohr.com/reference/get-time-off-types
const VACATION_TIME_OFF_TYPE_ID: i64 = 78;

/// Annual vacation allowance in hours (25 days × 8h, per the HR policy).
const ANNUAL_VACATION_HOURS: i64 = 25 * 8;

/// Hours per working day (time-off amounts are given in hours).
const WORKDAY_HOURS: i64 = 8;

/// Employee profile fields fetched by default.
const DEFAULT_EMPLOYEE_FIELDS: &[&str] =
    &["firstName", "lastName", "homeEmail", "location", "hireDate"];

/// Optional fields when editing an employee. At least one must be set.
#[derive(Clone, Debug, Default)]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
}

impl EmployeeUpdate {
    /// Whether any field is set.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email_address.is_none()
    }
}

/// Client for the BambooHR gateway API.
pub struct BambooClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: String,
    default_location: String,
}

impl std::fmt::Debug for BambooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BambooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl BambooClient {
    /// Create a new client from config.
    pub fn new(config: &BambooConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        let auth_header = format!(
            "Basic {}",
            BASE64.encode(format!("{}:x", config.api_key))
        );

        Ok(BambooClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header,
            default_location: config.default_location.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(reqwest::header::AUTHORIZATION, self.auth_header.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Extract a created resource id from the `Location` response header.
    fn id_from_location(response: &reqwest::Response) -> Result<String> {
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .context("response has no Location header")?;
        let id = location
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .context("Location header has no id segment")?;
        Ok(id.to_string())
    }

    // ────────────── Employees ──────────────

    /// Get an employee profile with the default field set.
    pub async fn get_employee(&self, employee_id: &str) -> Result<serde_json::Value> {
        let fields = DEFAULT_EMPLOYEE_FIELDS.join(",");
        let res = self
            .request(
                reqwest::Method::GET,
                &format!("/employees/{employee_id}/"),
            )
            .query(&[("fields", fields.as_str())])
            .send()
            .await?;

        if res.status() != reqwest::StatusCode::OK {
            bail!("error getting employee {employee_id}: {}", res.status());
        }
        Ok(res.json().await?)
    }

    /// Add an employee. Returns the new employee id.
    pub async fn add_employee(
        &self,
        first_name: &str,
        last_name: &str,
        email_address: &str,
        hire_date: NaiveDate,
    ) -> Result<String> {
        let res = self
            .request(reqwest::Method::POST, "/employees")
            .json(&json!({
                "firstName": first_name,
                "lastName": last_name,
                "homeEmail": email_address,
                "location": self.default_location,
                "hireDate": hire_date.format("%Y-%m-%d").to_string(),
            }))
            .send()
            .await?;

        if res.status() != reqwest::StatusCode::CREATED {
            bail!("error creating employee: {}", res.status());
        }

        let id = Self::id_from_location(&res)?;
        debug!(employee_id = %id, "employee created");
        Ok(id)
    }

    /// Edit an employee. At least one field of `update` must be set.
    pub async fn edit_employee(&self, employee_id: &str, update: &EmployeeUpdate) -> Result<()> {
        if update.is_empty() {
            bail!("at least one field must be provided");
        }

        let mut data = serde_json::Map::new();
        if let Some(ref first) = update.first_name {
            data.insert("firstName".into(), json!(first));
        }
        if let Some(ref last) = update.last_name {
            data.insert("lastName".into(), json!(last));
        }
        if let Some(ref email) = update.email_address {
            data.insert("homeEmail".into(), json!(email));
        }

        let res = self
            .request(
                reqwest::Method::POST,
                &format!("/employees/{employee_id}/"),
            )
            .json(&data)
            .send()
            .await?;

        if res.status() != reqwest::StatusCode::OK {
            bail!("error editing employee {employee_id}: {}", res.status());
        }
        Ok(())
    }

    // ────────────── Time off setup ──────────────

    /// Assign the vacation policy to an employee.
    pub async fn add_time_off_policy(
        &self,
        employee_id: &str,
        accrual_start_date: NaiveDate,
    ) -> Result<()> {
        let res = self
            .request(
                reqwest::Method::PUT,
                &format!("/employees/{employee_id}/time_off/policies"),
            )
            .json(&json!([{
                "timeOffPolicyId": VACATION_POLICY_ID,
                "accrualStartDate": accrual_start_date.format("%Y-%m-%d").to_string(),
            }]))
            .send()
            .await?;

        if res.status() != reqwest::StatusCode::OK {
            bail!("error adding time off policy: {}", res.status());
        }
        Ok(())
    }

    /// Seed the initial vacation balance according to the HR policy.
    pub async fn add_time_off_balance(&self, employee_id: &str) -> Result<()> {
        let res = self
            .request(
                reqwest::Method::PUT,
                &format!("/employees/{employee_id}/time_off/balance_adjustment"),
            )
            .json(&json!({
                "timeOffTypeId": VACATION_TIME_OFF_TYPE_ID,
                "date": Utc::now().date_naive().format("%Y-%m-%d").to_string(),
                "amount": ANNUAL_VACATION_HOURS,
            }))
            .send()
            .await?;

        if res.status() != reqwest::StatusCode::CREATED {
            bail!("error adjusting time off balance: {}", res.status());
        }
        Ok(())
    }

    // ────────────── Time off requests ──────────────

    /// All time off requests for an employee within the coming year.
    pub async fn get_time_off_requests(&self, employee_id: &str) -> Result<serde_json::Value> {
        let start = Utc::now().date_naive();
        let end = start + Duration::days(365);

        let res = self
            .request(reqwest::Method::GET, "/time_off/requests/")
            .query(&[
                ("start", start.format("%Y-%m-%d").to_string()),
                ("end", end.format("%Y-%m-%d").to_string()),
                ("employeeId", employee_id.to_string()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            bail!("error listing time off requests: {}", res.status());
        }
        Ok(res.json().await?)
    }

    /// File a time off request. Returns the new request id.
    pub async fn add_time_off_request(
        &self,
        employee_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<String> {
        let days = (end_date - start_date).num_days();
        let res = self
            .request(
                reqwest::Method::PUT,
                &format!("/employees/{employee_id}/time_off/request"),
            )
            .json(&json!({
                "status": "requested",
                "start": start_date.format("%Y-%m-%d").to_string(),
                "end": end_date.format("%Y-%m-%d").to_string(),
                "amount": WORKDAY_HOURS * days,
                "timeOffTypeId": VACATION_TIME_OFF_TYPE_ID,
            }))
            .send()
            .await?;

        if res.status() != reqwest::StatusCode::CREATED {
            bail!("error creating time off request: {}", res.status());
        }

        let id = Self::id_from_location(&res)?;
        debug!(request_id = %id, "time off request created");
        Ok(id)
    }

    /// Cancel a time off request.
    pub async fn cancel_time_off_request(&self, request_id: &str) -> Result<()> {
        let res = self
            .request(
                reqwest::Method::PUT,
                &format!("/time_off/requests/{request_id}/status"),
            )
            .json(&json!({"status": "canceled"}))
            .send()
            .await?;

        if res.status() != reqwest::StatusCode::OK {
            bail!("error cancelling time off request {request_id}: {}", res.status());
        }
        Ok(())
    }

    /// Estimate an employee's vacation balance at a future date.
    pub async fn get_time_off_balance_estimate(
        &self,
        employee_id: &str,
        end_date: NaiveDate,
    ) -> Result<serde_json::Value> {
        let res = self
            .request(
                reqwest::Method::GET,
                &format!("/employees/{employee_id}/time_off/calculator/"),
            )
            .query(&[("end", end_date.format("%Y-%m-%d").to_string())])
            .send()
            .await?;

        if res.status() != reqwest::StatusCode::OK {
            bail!("error estimating time off balance: {}", res.status());
        }
        Ok(res.json().await?)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
