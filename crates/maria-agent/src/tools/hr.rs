//! HR system tools — employee records and time off, backed by BambooHR.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use maria_core::events::{EventSender, OnboardingEvent};
use maria_integrations::{BambooClient, EmployeeUpdate};

use super::base::{parse_json_input, Tool};

/// Parse a YYYY-MM-DD date, mapping failures to observation text.
fn parse_date(value: &str, field: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{value}' is not a valid {field} (expected YYYY-MM-DD)"))
}

/// Reject an empty plain-text id input with an explanatory observation.
fn require_id(input: &str, what: &str) -> Result<String, String> {
    let id = input.trim();
    if id.is_empty() {
        Err(format!("The input is empty; expected the {what}"))
    } else {
        Ok(id.to_string())
    }
}

// ─────────────────────────────────────────────
// AddEmployeeTool
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AddEmployeeInput {
    first_name: String,
    last_name: String,
    email_address: String,
}

/// Enrolls a new employee: creates the record, assigns the vacation policy,
/// and seeds the initial time-off balance.
pub struct AddEmployeeTool {
    bamboo: Arc<BambooClient>,
    events: Option<EventSender>,
}

impl AddEmployeeTool {
    pub fn new(bamboo: Arc<BambooClient>, events: Option<EventSender>) -> Self {
        Self { bamboo, events }
    }
}

#[async_trait]
impl Tool for AddEmployeeTool {
    fn name(&self) -> &str {
        "add_employee_to_hr_tool"
    }

    fn description(&self) -> &str {
        "useful to add a new employee to the HR system. The input to this tool is a JSON with the following format:
    {
        first_name: str,
        last_name: str,
        email_address: str,
    }"
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let employee: AddEmployeeInput = match parse_json_input(input) {
            Ok(employee) => employee,
            Err(observation) => return Ok(observation),
        };

        let hire_date = Utc::now().date_naive();
        let employee_id = self
            .bamboo
            .add_employee(
                &employee.first_name,
                &employee.last_name,
                &employee.email_address,
                hire_date,
            )
            .await
            .context("employee creation failed")?;

        self.bamboo
            .add_time_off_policy(&employee_id, hire_date)
            .await
            .context("vacation policy assignment failed")?;
        self.bamboo
            .add_time_off_balance(&employee_id)
            .await
            .context("initial balance adjustment failed")?;

        if let Some(ref events) = self.events {
            events.emit(OnboardingEvent::EmployeeEnrolled);
        }

        Ok(format!(
            "\nEmployee {} {} has been added to the HR system with employee_id {} (THIS NUMBER IS IMPORTANT!)\n",
            employee.first_name, employee.last_name, employee_id
        ))
    }
}

// ─────────────────────────────────────────────
// ModifyEmployeeTool
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ModifyEmployeeInput {
    employee_id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email_address: Option<String>,
}

/// Edits an existing employee record.
pub struct ModifyEmployeeTool {
    bamboo: Arc<BambooClient>,
}

impl ModifyEmployeeTool {
    pub fn new(bamboo: Arc<BambooClient>) -> Self {
        Self { bamboo }
    }
}

#[async_trait]
impl Tool for ModifyEmployeeTool {
    fn name(&self) -> &str {
        "modify_employee_tool"
    }

    fn description(&self) -> &str {
        "useful to modify an employee in the HR system. The input to this tool is a JSON with the following format:
    {
        employee_id: str,
        first_name: Optional[str],
        last_name: Optional[str],
        email_address: Optional[str],
    }"
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let change: ModifyEmployeeInput = match parse_json_input(input) {
            Ok(change) => change,
            Err(observation) => return Ok(observation),
        };

        let update = EmployeeUpdate {
            first_name: change.first_name,
            last_name: change.last_name,
            email_address: change.email_address,
        };
        if update.is_empty() {
            return Ok(
                "At least one of first_name, last_name, or email_address must be provided"
                    .to_string(),
            );
        }

        self.bamboo
            .edit_employee(&change.employee_id, &update)
            .await
            .context("employee edit failed")?;

        Ok(format!(
            "\nEmployee {} has been modified successfully\n",
            change.employee_id
        ))
    }
}

// ─────────────────────────────────────────────
// ViewTimeOffRequestsTool
// ─────────────────────────────────────────────

/// Lists an employee's upcoming time off requests.
pub struct ViewTimeOffRequestsTool {
    bamboo: Arc<BambooClient>,
}

impl ViewTimeOffRequestsTool {
    pub fn new(bamboo: Arc<BambooClient>) -> Self {
        Self { bamboo }
    }
}

#[async_trait]
impl Tool for ViewTimeOffRequestsTool {
    fn name(&self) -> &str {
        "view_time_off_requests_tool"
    }

    fn description(&self) -> &str {
        "useful to view all time off requests for an employee. The input to this tool is the employee_id of the employee to view."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let employee_id = match require_id(input, "employee_id") {
            Ok(id) => id,
            Err(observation) => return Ok(observation),
        };

        let requests = self
            .bamboo
            .get_time_off_requests(&employee_id)
            .await
            .context("time off request listing failed")?;

        Ok(format!(
            "\nTime off requests for employee {}:\n{}\n",
            employee_id,
            serde_json::to_string_pretty(&requests).unwrap_or_else(|_| requests.to_string())
        ))
    }
}

// ─────────────────────────────────────────────
// MakeTimeOffRequestTool
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MakeTimeOffRequestInput {
    employee_id: String,
    /// Format YYYY-MM-DD
    start_date: String,
    /// Format YYYY-MM-DD
    end_date: String,
}

/// Files a vacation request for an employee.
pub struct MakeTimeOffRequestTool {
    bamboo: Arc<BambooClient>,
}

impl MakeTimeOffRequestTool {
    pub fn new(bamboo: Arc<BambooClient>) -> Self {
        Self { bamboo }
    }
}

#[async_trait]
impl Tool for MakeTimeOffRequestTool {
    fn name(&self) -> &str {
        "make_time_off_request_tool"
    }

    fn description(&self) -> &str {
        "useful to make a time off request. The input to this tool is a JSON with the following format:
    {
        employee_id: str,
        start_date: str,  # Format YYYY-MM-DD
        end_date: str,  # Format YYYY-MM-DD
    }"
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let request: MakeTimeOffRequestInput = match parse_json_input(input) {
            Ok(request) => request,
            Err(observation) => return Ok(observation),
        };

        let start = match parse_date(&request.start_date, "start_date") {
            Ok(date) => date,
            Err(observation) => return Ok(observation),
        };
        let end = match parse_date(&request.end_date, "end_date") {
            Ok(date) => date,
            Err(observation) => return Ok(observation),
        };
        if end < start {
            return Ok("end_date must be on or after start_date".to_string());
        }

        let request_id = self
            .bamboo
            .add_time_off_request(&request.employee_id, start, end)
            .await
            .context("time off request creation failed")?;

        Ok(format!(
            "\nTime off request with id {} for employee {} has been made successfully\n",
            request_id, request.employee_id
        ))
    }
}

// ─────────────────────────────────────────────
// CancelTimeOffRequestTool
// ─────────────────────────────────────────────

/// Cancels a previously filed time off request.
pub struct CancelTimeOffRequestTool {
    bamboo: Arc<BambooClient>,
}

impl CancelTimeOffRequestTool {
    pub fn new(bamboo: Arc<BambooClient>) -> Self {
        Self { bamboo }
    }
}

#[async_trait]
impl Tool for CancelTimeOffRequestTool {
    fn name(&self) -> &str {
        "cancel_time_off_request_tool"
    }

    fn description(&self) -> &str {
        "useful to cancel a time off request. The input to this tool is the request_id of the request to cancel."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let request_id = match require_id(input, "request_id") {
            Ok(id) => id,
            Err(observation) => return Ok(observation),
        };

        self.bamboo
            .cancel_time_off_request(&request_id)
            .await
            .context("time off request cancellation failed")?;

        Ok(format!(
            "\nTime off request with id {request_id} has been cancelled successfully\n"
        ))
    }
}

// ─────────────────────────────────────────────
// EstimateTimeOffBalanceTool
// ─────────────────────────────────────────────

/// Estimates an employee's vacation balance one year out.
pub struct EstimateTimeOffBalanceTool {
    bamboo: Arc<BambooClient>,
}

impl EstimateTimeOffBalanceTool {
    pub fn new(bamboo: Arc<BambooClient>) -> Self {
        Self { bamboo }
    }
}

#[async_trait]
impl Tool for EstimateTimeOffBalanceTool {
    fn name(&self) -> &str {
        "estimate_time_off_balance_tool"
    }

    fn description(&self) -> &str {
        "useful to estimate the time off balance for an employee. The input to this tool is the employee_id of the employee to view."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let employee_id = match require_id(input, "employee_id") {
            Ok(id) => id,
            Err(observation) => return Ok(observation),
        };

        let end_date = Utc::now().date_naive() + Duration::days(365);
        let balance = self
            .bamboo
            .get_time_off_balance_estimate(&employee_id, end_date)
            .await
            .context("balance estimate failed")?;

        Ok(format!(
            "\nTime off balance for employee {}:\n{}\n",
            employee_id,
            serde_json::to_string_pretty(&balance).unwrap_or_else(|_| balance.to_string())
        ))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
